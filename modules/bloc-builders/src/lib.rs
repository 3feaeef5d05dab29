//! Stream builders: thin wrappers that own a [`Bloc`](bloc_core::Bloc),
//! kick it off with an initial event, and push every new state somewhere.
//!
//! - [`BasicStreamBuilder`] hands states to a closure.
//! - [`HttpStreamBuilder`] renders the latest state as plain text on a route.
//! - [`AdvancedHttpStreamBuilder`] turns each state into a full response.

pub mod basic;
pub mod error;
pub mod http;
pub mod traits;

pub use basic::BasicStreamBuilder;
pub use error::BuilderError;
pub use http::{AdvancedHttpStreamBuilder, HttpStreamBuilder, Reply, NO_STATE_YET};
pub use traits::StreamBuilder;
