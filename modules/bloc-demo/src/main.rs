use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bloc_builders::{HttpStreamBuilder, StreamBuilder};

mod config;
mod counter;

use config::DemoConfig;
use counter::{counter_bloc, render, CounterEvent, CounterState, Tally};

type CounterBuilder = HttpStreamBuilder<CounterEvent, CounterState, Tally>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("bloc=info".parse()?))
        .init();

    let config = DemoConfig::from_env()?;
    info!(
        event_capacity = config.bloc.event_capacity,
        state_capacity = config.bloc.state_capacity,
        "Loaded config"
    );

    let bloc = counter_bloc(config.bloc)?;
    let builder = Arc::new(HttpStreamBuilder::new(bloc, config.path.clone(), render)?);
    builder.init(CounterEvent::Reset).await?;
    info!(path = builder.path(), "Counter initialised");

    let app = builder
        .router()
        .merge(control_routes(Arc::clone(&builder)))
        .layer(TraceLayer::new_for_http());

    let addr = config.addr();
    info!("Counter demo starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    builder.dispose()?;
    info!("Counter demo stopped");
    Ok(())
}

fn control_routes(builder: Arc<CounterBuilder>) -> Router {
    Router::new()
        .route("/events/{event}", post(push_event))
        .with_state(builder)
}

// --- Handlers ---

/// `POST /events/increment|decrement|reset`
async fn push_event(
    State(builder): State<Arc<CounterBuilder>>,
    Path(event): Path<CounterEvent>,
) -> StatusCode {
    match builder.bloc().add_event(event).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(e) => {
            warn!(error = %e, "Failed to add event");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
