//! Traits at the seams of a stream and a bloc.

use async_trait::async_trait;

use crate::event::Event;

/// Receives every item a listening [`Stream`](crate::Stream) delivers.
///
/// Invocations for one stream are strictly serialized and in arrival order.
/// Implemented for any `Fn(T) + Send + Sync` closure; implement it directly
/// when the handler itself needs to await.
#[async_trait]
pub trait ItemHandler<T>: Send + Sync + 'static {
    async fn on_item(&self, item: T);
}

#[async_trait]
impl<T, F> ItemHandler<T> for F
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    async fn on_item(&self, item: T) {
        self(item)
    }
}

/// Turns an event into a state. No I/O.
///
/// Runs on the event stream's consumer only, so it never races with itself
/// and is the sole writer of the context data.
pub trait MapEventToState<E, S, BD>: Send + Sync + 'static {
    fn map(&self, event: &Event<E>, data: &mut BD) -> S;
}

impl<E, S, BD, F> MapEventToState<E, S, BD> for F
where
    F: Fn(&Event<E>, &mut BD) -> S + Send + Sync + 'static,
{
    fn map(&self, event: &Event<E>, data: &mut BD) -> S {
        self(event, data)
    }
}
