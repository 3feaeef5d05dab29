//! Stream builders that expose the latest state on an HTTP route.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bloc_core::{Bloc, ItemHandler};
use parking_lot::RwLock;

use crate::basic::kick_off;
use crate::error::BuilderError;
use crate::traits::StreamBuilder;

/// Body served before the first state has been produced.
pub const NO_STATE_YET: &str = "No state was created yet";

/// Produces the response for the current state. Called once per request.
pub type Reply = Arc<dyn Fn() -> Response + Send + Sync>;

type CurrentReply = Arc<RwLock<Reply>>;

// --- Advanced ---

/// Maps each new state to a reply; the route always serves the latest one.
pub struct AdvancedHttpStreamBuilder<E, S, BD> {
    bloc: Bloc<E, S, BD>,
    path: String,
    current: CurrentReply,
    on_state: Arc<dyn ItemHandler<S>>,
}

impl<E, S, BD> AdvancedHttpStreamBuilder<E, S, BD>
where
    E: Clone + Send + 'static,
    S: Clone + Send + 'static,
    BD: Send + 'static,
{
    pub fn new<F, R>(
        bloc: Bloc<E, S, BD>,
        path: impl Into<String>,
        build: F,
    ) -> Result<Self, BuilderError>
    where
        F: Fn(S) -> R + Send + Sync + 'static,
        R: Fn() -> Response + Send + Sync + 'static,
    {
        let path = validate_path(path.into())?;
        let placeholder: Reply = Arc::new(no_state_yet);
        let current: CurrentReply = Arc::new(RwLock::new(placeholder));

        let latest = Arc::clone(&current);
        let on_state = move |state: S| {
            let reply: Reply = Arc::new(build(state));
            *latest.write() = reply;
        };

        Ok(Self {
            bloc,
            path,
            current,
            on_state: Arc::new(on_state),
        })
    }

    pub fn bloc(&self) -> &Bloc<E, S, BD> {
        &self.bloc
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Router serving the latest reply at [`path`](Self::path).
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.path, get(serve_current))
            .with_state(Arc::clone(&self.current))
    }
}

#[async_trait]
impl<E, S, BD> StreamBuilder<E> for AdvancedHttpStreamBuilder<E, S, BD>
where
    E: Clone + Send + 'static,
    S: Clone + Send + 'static,
    BD: Send + 'static,
{
    async fn init(&self, initial_event: E) -> Result<(), BuilderError> {
        kick_off(&self.bloc, Arc::clone(&self.on_state), initial_event).await
    }

    fn dispose(&self) -> Result<(), BuilderError> {
        Ok(self.bloc.dispose()?)
    }
}

// --- Plain text ---

/// Renders each state to text and serves the latest rendering as
/// `text/plain`.
pub struct HttpStreamBuilder<E, S, BD> {
    inner: AdvancedHttpStreamBuilder<E, S, BD>,
}

impl<E, S, BD> HttpStreamBuilder<E, S, BD>
where
    E: Clone + Send + 'static,
    S: Clone + Send + 'static,
    BD: Send + 'static,
{
    pub fn new<F>(
        bloc: Bloc<E, S, BD>,
        path: impl Into<String>,
        render: F,
    ) -> Result<Self, BuilderError>
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
    {
        let inner = AdvancedHttpStreamBuilder::new(bloc, path, move |state: S| {
            let body = render(&state);
            move || text(body.clone())
        })?;
        Ok(Self { inner })
    }

    pub fn bloc(&self) -> &Bloc<E, S, BD> {
        self.inner.bloc()
    }

    pub fn path(&self) -> &str {
        self.inner.path()
    }

    pub fn router(&self) -> Router {
        self.inner.router()
    }
}

#[async_trait]
impl<E, S, BD> StreamBuilder<E> for HttpStreamBuilder<E, S, BD>
where
    E: Clone + Send + 'static,
    S: Clone + Send + 'static,
    BD: Send + 'static,
{
    async fn init(&self, initial_event: E) -> Result<(), BuilderError> {
        self.inner.init(initial_event).await
    }

    fn dispose(&self) -> Result<(), BuilderError> {
        self.inner.dispose()
    }
}

// --- Handlers ---

async fn serve_current(State(current): State<CurrentReply>) -> Response {
    let reply = current.read().clone();
    reply()
}

fn no_state_yet() -> Response {
    text(NO_STATE_YET.to_string())
}

fn text(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

fn validate_path(path: String) -> Result<String, BuilderError> {
    if path.starts_with('/') {
        Ok(path)
    } else {
        Err(BuilderError::InvalidPath(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_must_be_absolute() {
        assert_eq!(validate_path("/state".into()), Ok("/state".to_string()));
        assert_eq!(
            validate_path("state".into()),
            Err(BuilderError::InvalidPath("state".into()))
        );
    }

    #[test]
    fn placeholder_reply_is_plain_text() {
        let response = no_state_yet();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}
