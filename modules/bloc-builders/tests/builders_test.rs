//! Stream builders wired to a real bloc; HTTP routes exercised in-process.

use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::IntoResponse,
    Router,
};
use bloc_builders::{
    AdvancedHttpStreamBuilder, BasicStreamBuilder, BuilderError, HttpStreamBuilder, StreamBuilder,
    NO_STATE_YET,
};
use bloc_core::{Bloc, BlocError, Event, StreamError};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Test domain: events carry a number, state echoes it, context counts events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Set(i32);

#[derive(Debug, Clone, PartialEq)]
struct Current(i32);

fn echo_bloc() -> Bloc<Set, Current, u32> {
    Bloc::new(0_u32, |event: &Event<Set>, count: &mut u32| {
        *count += 1;
        Current(event.payload().0)
    })
    .unwrap()
}

async fn get_body(router: Router, path: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

// =========================================================================
// Basic
// =========================================================================

#[tokio::test]
async fn basic_builder_delivers_initial_state() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let builder = BasicStreamBuilder::new(echo_bloc(), move |state: Current| {
        sink.lock().unwrap().push(state);
    });

    builder.init(Set(1)).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![Current(1)]);
    assert!(builder.bloc().is_listening_to_events());
    assert!(builder.bloc().is_listening_to_states());

    builder.bloc().add_event(Set(7)).await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![Current(1), Current(7)]);
    assert_eq!(builder.bloc().inspect_context(|count| *count), 2);

    builder.dispose().unwrap();
}

#[tokio::test]
async fn basic_builder_init_twice_fails() {
    let builder = BasicStreamBuilder::new(echo_bloc(), |_: Current| {});
    builder.init(Set(1)).await.unwrap();

    assert_eq!(
        builder.init(Set(2)).await,
        Err(BuilderError::Bloc(BlocError::EventStream(
            StreamError::AlreadyListening
        )))
    );
    builder.dispose().unwrap();
}

#[tokio::test]
async fn basic_builder_dispose_twice_surfaces_stream_errors() {
    let builder = BasicStreamBuilder::new(echo_bloc(), |_: Current| {});
    builder.init(Set(1)).await.unwrap();
    builder.dispose().unwrap();

    assert!(matches!(
        builder.dispose(),
        Err(BuilderError::Bloc(BlocError::Dispose { .. }))
    ));
}

#[tokio::test]
async fn builders_are_usable_as_trait_objects() {
    let builder: Box<dyn StreamBuilder<Set>> =
        Box::new(BasicStreamBuilder::new(echo_bloc(), |_: Current| {}));
    builder.init(Set(3)).await.unwrap();
    builder.dispose().unwrap();
}

// =========================================================================
// Plain text HTTP
// =========================================================================

#[tokio::test]
async fn http_builder_serves_placeholder_before_init() {
    let builder = HttpStreamBuilder::new(echo_bloc(), "/state", |s: &Current| s.0.to_string())
        .unwrap();

    let (status, body) = get_body(builder.router(), "/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, NO_STATE_YET);
}

#[tokio::test]
async fn http_builder_serves_latest_rendered_state() {
    let builder = HttpStreamBuilder::new(echo_bloc(), "/state", |s: &Current| {
        format!("value={}", s.0)
    })
    .unwrap();
    builder.init(Set(1)).await.unwrap();

    let (status, body) = get_body(builder.router(), "/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "value=1");

    builder.bloc().add_event(Set(42)).await.unwrap();
    let (_, body) = get_body(builder.router(), "/state").await;
    assert_eq!(body, "value=42");

    builder.dispose().unwrap();
}

#[tokio::test]
async fn http_builder_only_answers_its_path() {
    let builder =
        HttpStreamBuilder::new(echo_bloc(), "/state", |s: &Current| s.0.to_string()).unwrap();
    builder.init(Set(1)).await.unwrap();

    let (status, _) = get_body(builder.router(), "/elsewhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    builder.dispose().unwrap();
}

#[test]
fn http_builder_rejects_relative_path() {
    let result = HttpStreamBuilder::new(echo_bloc(), "state", |s: &Current| s.0.to_string());
    assert!(matches!(result, Err(BuilderError::InvalidPath(path)) if path == "state"));
}

// =========================================================================
// Advanced HTTP
// =========================================================================

#[tokio::test]
async fn advanced_builder_controls_status_and_body() {
    let builder = AdvancedHttpStreamBuilder::new(echo_bloc(), "/", |state: Current| {
        move || {
            if state.0 < 0 {
                (StatusCode::BAD_REQUEST, "negative").into_response()
            } else {
                (StatusCode::ACCEPTED, format!("ok {}", state.0)).into_response()
            }
        }
    })
    .unwrap();

    let (_, body) = get_body(builder.router(), "/").await;
    assert_eq!(body, NO_STATE_YET);

    builder.init(Set(5)).await.unwrap();
    let (status, body) = get_body(builder.router(), "/").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, "ok 5");

    builder.bloc().add_event(Set(-1)).await.unwrap();
    let (status, body) = get_body(builder.router(), "/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "negative");

    builder.dispose().unwrap();
}
