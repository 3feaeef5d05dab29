use async_trait::async_trait;

use crate::error::BuilderError;

/// Common surface of every stream builder.
#[async_trait]
pub trait StreamBuilder<E>: Send + Sync {
    /// Start the event stream, listen for states with the builder's own
    /// callback, then push `initial_event`.
    async fn init(&self, initial_event: E) -> Result<(), BuilderError>;

    /// Dispose the wrapped bloc. The builder cannot be used afterwards.
    fn dispose(&self) -> Result<(), BuilderError>;
}
