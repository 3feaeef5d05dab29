//! The event → state pipeline.
//!
//! Event stream → map (against context data) → state stream → callback.
//! The mapping runs on the event stream's consumer, so states are produced
//! in event order and the context data has a single writer.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::config::BlocConfig;
use crate::error::{BlocError, StreamError};
use crate::event::Event;
use crate::handler::{ItemHandler, MapEventToState};
use crate::stream::Stream;

/// Business logic component: owns an event stream, a state stream, and the
/// context data the mapping function reads and writes.
pub struct Bloc<E, S, BD> {
    events: Stream<Event<E>>,
    states: Arc<Stream<S>>,
    forwarder: Arc<StateForwarder<S>>,
    context: Arc<Mutex<BD>>,
    /// Serializes callback installation against state stream listening.
    subscription: Mutex<()>,
}

impl<E, S, BD> Bloc<E, S, BD>
where
    E: Clone + Send + 'static,
    S: Clone + Send + 'static,
    BD: Send + 'static,
{
    /// Build with default capacities.
    pub fn new<F>(initial: BD, map_event_to_state: F) -> Result<Self, BlocError>
    where
        F: Fn(&Event<E>, &mut BD) -> S + Send + Sync + 'static,
    {
        Self::with_mapper(BlocConfig::default(), initial, map_event_to_state)
    }

    /// Build with capacities from `config`, e.g. [`BlocConfig::from_env`].
    pub fn with_config<F>(
        config: BlocConfig,
        initial: BD,
        map_event_to_state: F,
    ) -> Result<Self, BlocError>
    where
        F: Fn(&Event<E>, &mut BD) -> S + Send + Sync + 'static,
    {
        Self::with_mapper(config, initial, map_event_to_state)
    }

    pub fn with_mapper<M>(config: BlocConfig, initial: BD, mapper: M) -> Result<Self, BlocError>
    where
        M: MapEventToState<E, S, BD>,
    {
        let forwarder = Arc::new(StateForwarder {
            callback: RwLock::new(None),
        });
        let states = Arc::new(
            Stream::with_handler(config.state_capacity, forwarder.clone())
                .map_err(BlocError::StateStream)?,
        );
        let context = Arc::new(Mutex::new(initial));
        let map_to_state = MapToState {
            mapper,
            context: Arc::clone(&context),
            states: Arc::clone(&states),
            _events: PhantomData,
        };
        let events = Stream::with_handler(config.event_capacity, Arc::new(map_to_state))
            .map_err(BlocError::EventStream)?;

        Ok(Self {
            events,
            states,
            forwarder,
            context,
            subscription: Mutex::new(()),
        })
    }

    /// Wrap `payload` in a timestamped [`Event`] and push it into the event
    /// stream. Resolves once the resulting state has been handled when both
    /// streams are listening.
    pub async fn add_event(&self, payload: E) -> Result<(), BlocError> {
        self.events
            .add(Event::new(payload))
            .await
            .map_err(BlocError::EventStream)
    }

    pub fn start_listen_to_event_stream(&self) -> Result<(), BlocError> {
        self.events.listen().map_err(BlocError::EventStream)
    }

    pub fn stop_listen_to_event_stream(&self) -> Result<(), BlocError> {
        self.events.stop_listen().map_err(BlocError::EventStream)
    }

    /// Install `callback` for new states and start listening to the state
    /// stream. Fails, leaving the current callback alone, when the state
    /// stream is already listening or disposed.
    pub fn listen_on_new_state<F>(&self, callback: F) -> Result<(), BlocError>
    where
        F: Fn(S) + Send + Sync + 'static,
    {
        self.listen_on_new_state_with(Arc::new(callback))
    }

    pub fn listen_on_new_state_with(
        &self,
        callback: Arc<dyn ItemHandler<S>>,
    ) -> Result<(), BlocError> {
        let _subscription = self.subscription.lock();
        if self.states.is_listening() {
            return Err(BlocError::StateStream(StreamError::AlreadyListening));
        }
        if self.states.is_disposed() {
            return Err(BlocError::StateStream(StreamError::AlreadyDisposed));
        }

        let previous = self.forwarder.callback.write().replace(callback);
        if let Err(error) = self.states.listen() {
            *self.forwarder.callback.write() = previous;
            return Err(BlocError::StateStream(error));
        }
        Ok(())
    }

    pub fn stop_listen_to_state_stream(&self) -> Result<(), BlocError> {
        self.states.stop_listen().map_err(BlocError::StateStream)
    }

    /// Re-emit the state at `position` to the state callback and drop every
    /// later state from history.
    pub async fn replay_state(&self, position: usize) -> Result<(), BlocError> {
        self.states
            .resume_at_history_position(position)
            .await
            .map_err(BlocError::StateStream)
    }

    /// Dispose the event stream, then the state stream. Both are always
    /// attempted; failures are reported together.
    pub fn dispose(&self) -> Result<(), BlocError> {
        let event = self.events.dispose().err();
        let state = self.states.dispose().err();

        match (event, state) {
            (None, None) => {
                debug!("Bloc disposed");
                Ok(())
            }
            (event, state) => Err(BlocError::Dispose { event, state }),
        }
    }

    /// Read the context data. Blocks while the mapping function runs.
    pub fn inspect_context<R>(&self, inspect: impl FnOnce(&BD) -> R) -> R {
        inspect(&self.context.lock())
    }

    pub fn is_listening_to_events(&self) -> bool {
        self.events.is_listening()
    }

    pub fn is_listening_to_states(&self) -> bool {
        self.states.is_listening()
    }

    pub fn event_history_size(&self) -> usize {
        self.events.history_size()
    }

    pub fn state_history_size(&self) -> usize {
        self.states.history_size()
    }

    /// Snapshot of retained states, oldest first.
    pub fn state_history(&self) -> Vec<S> {
        self.states.history()
    }
}

/// Event stream handler: map under the context lock, then hand the state on.
struct MapToState<E, S, BD, M> {
    mapper: M,
    context: Arc<Mutex<BD>>,
    states: Arc<Stream<S>>,
    _events: PhantomData<fn(E)>,
}

#[async_trait]
impl<E, S, BD, M> ItemHandler<Event<E>> for MapToState<E, S, BD, M>
where
    E: Send + 'static,
    S: Clone + Send + 'static,
    BD: Send + 'static,
    M: MapEventToState<E, S, BD>,
{
    async fn on_item(&self, event: Event<E>) {
        let state = {
            let mut data = self.context.lock();
            self.mapper.map(&event, &mut data)
        };

        if let Err(error) = self.states.add(state).await {
            warn!(%error, "Dropping state, state stream unavailable");
        }
    }
}

/// State stream handler: forwards to whichever callback is installed.
struct StateForwarder<S> {
    callback: RwLock<Option<Arc<dyn ItemHandler<S>>>>,
}

#[async_trait]
impl<S> ItemHandler<S> for StateForwarder<S>
where
    S: Send + 'static,
{
    async fn on_item(&self, state: S) {
        let callback = self.callback.read().clone();
        if let Some(callback) = callback {
            callback.on_item(state).await;
        }
    }
}
