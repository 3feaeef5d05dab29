//! In-process event-to-state pipeline.
//!
//! A [`Stream`] is a single-consumer channel with a bounded, replayable
//! history. A [`Bloc`] joins two of them: events go in, a mapping function
//! turns each one into a state against shared context data, and states come
//! out to whoever listens.
//!
//! Consumers define their domain by supplying a mapping function (or a
//! [`MapEventToState`] impl) and a state callback (or an [`ItemHandler`]).

pub mod bloc;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
mod history;
pub mod stream;

pub use bloc::Bloc;
pub use config::{BlocConfig, DEFAULT_CAPACITY};
pub use error::{BlocError, StreamError};
pub use event::Event;
pub use handler::{ItemHandler, MapEventToState};
pub use stream::Stream;
