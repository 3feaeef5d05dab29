use std::sync::Arc;

use async_trait::async_trait;
use bloc_core::{Bloc, ItemHandler};
use tracing::debug;

use crate::error::BuilderError;
use crate::traits::StreamBuilder;

/// Forwards every new state to a build function.
pub struct BasicStreamBuilder<E, S, BD> {
    bloc: Bloc<E, S, BD>,
    build: Arc<dyn ItemHandler<S>>,
}

impl<E, S, BD> BasicStreamBuilder<E, S, BD>
where
    E: Clone + Send + 'static,
    S: Clone + Send + 'static,
    BD: Send + 'static,
{
    pub fn new<F>(bloc: Bloc<E, S, BD>, build: F) -> Self
    where
        F: Fn(S) + Send + Sync + 'static,
    {
        Self {
            bloc,
            build: Arc::new(build),
        }
    }

    pub fn bloc(&self) -> &Bloc<E, S, BD> {
        &self.bloc
    }
}

#[async_trait]
impl<E, S, BD> StreamBuilder<E> for BasicStreamBuilder<E, S, BD>
where
    E: Clone + Send + 'static,
    S: Clone + Send + 'static,
    BD: Send + 'static,
{
    async fn init(&self, initial_event: E) -> Result<(), BuilderError> {
        kick_off(&self.bloc, Arc::clone(&self.build), initial_event).await
    }

    fn dispose(&self) -> Result<(), BuilderError> {
        Ok(self.bloc.dispose()?)
    }
}

/// Shared `init` sequence: events first, then states, then the first event.
pub(crate) async fn kick_off<E, S, BD>(
    bloc: &Bloc<E, S, BD>,
    on_state: Arc<dyn ItemHandler<S>>,
    initial_event: E,
) -> Result<(), BuilderError>
where
    E: Clone + Send + 'static,
    S: Clone + Send + 'static,
    BD: Send + 'static,
{
    bloc.start_listen_to_event_stream()?;
    bloc.listen_on_new_state_with(on_state)?;
    bloc.add_event(initial_event).await?;

    debug!("Stream builder initialised");
    Ok(())
}
