//! Single-consumer stream with a bounded, replayable history.
//!
//! Lifecycle: not listening ⇄ listening → disposed (terminal, from either).
//! While listening, one tokio task owns the receiving end of a command
//! channel and is the only place `on_item` runs outside of a replay.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::StreamError;
use crate::handler::ItemHandler;
use crate::history::History;

enum Command<T> {
    Deliver {
        item: T,
        done: oneshot::Sender<()>,
    },
    Pause {
        paused: oneshot::Sender<()>,
    },
    Resume,
    Stop,
}

struct Inner<T> {
    history: History<T>,
    /// `Some` exactly while listening.
    commands: Option<mpsc::UnboundedSender<Command<T>>>,
    /// Most recent consumer task. The next consumer waits on it before
    /// taking items so handlers never overlap across listen cycles.
    consumer: Option<JoinHandle<()>>,
    disposed: bool,
}

/// A bounded, replayable, single-consumer stream.
///
/// Every [`add`](Stream::add) lands in the history. While listening, the item
/// is also handed to the consumer and `add` resolves once the handler has run
/// for it, so at most one item is in flight and delivery follows call order.
pub struct Stream<T> {
    inner: Mutex<Inner<T>>,
    handler: Arc<dyn ItemHandler<T>>,
    /// One `add` (or replay) at a time, so history order is delivery order.
    add_turn: AsyncMutex<()>,
    /// Serializes pause/replay/resume cycles.
    resume_gate: AsyncMutex<()>,
}

impl<T> Stream<T>
where
    T: Clone + Send + 'static,
{
    /// Create a stream whose items go to a plain closure.
    pub fn new<F>(capacity: usize, on_item: F) -> Result<Self, StreamError>
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self::with_handler(capacity, Arc::new(on_item))
    }

    /// Create a stream around an existing (possibly async) handler.
    pub fn with_handler(
        capacity: usize,
        handler: Arc<dyn ItemHandler<T>>,
    ) -> Result<Self, StreamError> {
        if capacity == 0 {
            return Err(StreamError::ZeroCapacity);
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                history: History::new(capacity),
                commands: None,
                consumer: None,
                disposed: false,
            }),
            handler,
            add_turn: AsyncMutex::new(()),
            resume_gate: AsyncMutex::new(()),
        })
    }

    /// Start the background consumer. Must be called inside a tokio runtime.
    pub fn listen(&self) -> Result<(), StreamError> {
        let mut inner = self.inner.lock();
        if inner.commands.is_some() {
            return Err(StreamError::AlreadyListening);
        }
        if inner.disposed {
            return Err(StreamError::AlreadyDisposed);
        }
        let runtime = Handle::try_current().map_err(|_| StreamError::NoRuntime)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let previous = inner.consumer.take();
        let handler = Arc::clone(&self.handler);
        inner.consumer = Some(runtime.spawn(consume(handler, rx, previous)));
        inner.commands = Some(tx);

        debug!(
            capacity = inner.history.capacity(),
            history = inner.history.len(),
            "Stream listening"
        );
        Ok(())
    }

    /// Signal the consumer to finish. Items already handed over are still
    /// processed; later items only go to history.
    pub fn stop_listen(&self) -> Result<(), StreamError> {
        let mut inner = self.inner.lock();
        let Some(commands) = inner.commands.take() else {
            return Err(StreamError::NotListening);
        };
        let _ = commands.send(Command::Stop);

        debug!("Stream stopped listening");
        Ok(())
    }

    /// Append `item` to history and, while listening, wait for the consumer
    /// to process it.
    pub async fn add(&self, item: T) -> Result<(), StreamError> {
        let _turn = self.add_turn.lock().await;

        let done = {
            let mut inner = self.inner.lock();
            if inner.disposed {
                return Err(StreamError::AlreadyDisposed);
            }
            inner.history.push(item.clone());

            match inner.commands.as_ref() {
                Some(commands) => {
                    let (done, processed) = oneshot::channel();
                    commands
                        .send(Command::Deliver { item, done })
                        .ok()
                        .map(|_| processed)
                }
                None => None,
            }
        };

        if let Some(processed) = done {
            if processed.await.is_err() {
                warn!("Stream consumer ended before processing the item");
            }
        }
        Ok(())
    }

    /// Rewind to `position`: pause the consumer, run the handler once for
    /// `history[position]` on the caller's task, drop every later entry, then
    /// resume. Concurrent calls queue behind each other; `add` waits too.
    pub async fn resume_at_history_position(&self, position: usize) -> Result<(), StreamError> {
        let _gate = self.resume_gate.lock().await;
        let _turn = self.add_turn.lock().await;

        let (item, pause) = {
            let inner = self.inner.lock();
            if inner.disposed {
                return Err(StreamError::AlreadyDisposed);
            }
            let len = inner.history.len();
            let Some(item) = inner.history.get(position).cloned() else {
                return Err(StreamError::PositionOutOfRange {
                    requested: position,
                    len,
                });
            };

            let pause = match inner.commands.as_ref() {
                Some(commands) => {
                    let (paused, ack) = oneshot::channel();
                    commands.send(Command::Pause { paused }).ok().map(|_| {
                        let resume = ResumeOnDrop {
                            commands: commands.clone(),
                        };
                        (ack, resume)
                    })
                }
                None => None,
            };
            (item, pause)
        };

        // Held until return; also fires if this future is dropped mid-replay.
        let _resume = match pause {
            Some((ack, resume)) => {
                let _ = ack.await;
                Some(resume)
            }
            None => None,
        };

        self.handler.on_item(item).await;

        let mut inner = self.inner.lock();
        if inner.disposed {
            return Err(StreamError::AlreadyDisposed);
        }
        inner.history.truncate(position + 1);

        debug!(
            position,
            history = inner.history.len(),
            "Stream resumed at history position"
        );
        Ok(())
    }

    /// Terminal. Stops listening first if needed.
    pub fn dispose(&self) -> Result<(), StreamError> {
        let mut inner = self.inner.lock();
        if inner.disposed {
            return Err(StreamError::AlreadyDisposed);
        }
        if let Some(commands) = inner.commands.take() {
            let _ = commands.send(Command::Stop);
        }
        inner.disposed = true;
        inner.consumer = None;

        debug!(history = inner.history.len(), "Stream disposed");
        Ok(())
    }

    /// Number of retained items, at most [`capacity`](Self::capacity).
    pub fn history_size(&self) -> usize {
        self.inner.lock().history.len()
    }

    /// `true` between a successful `listen` and the next `stop_listen` or
    /// `dispose`.
    pub fn is_listening(&self) -> bool {
        self.inner.lock().commands.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.lock().disposed
    }

    /// History size fixed at construction.
    pub fn capacity(&self) -> usize {
        self.inner.lock().history.capacity()
    }

    /// Snapshot of retained items, oldest first.
    pub fn history(&self) -> Vec<T> {
        self.inner.lock().history.iter().cloned().collect()
    }
}

/// Sends `Resume` to a consumer paused for a replay.
struct ResumeOnDrop<T> {
    commands: mpsc::UnboundedSender<Command<T>>,
}

impl<T> Drop for ResumeOnDrop<T> {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Resume);
    }
}

async fn consume<T>(
    handler: Arc<dyn ItemHandler<T>>,
    mut commands: mpsc::UnboundedReceiver<Command<T>>,
    previous: Option<JoinHandle<()>>,
) where
    T: Send + 'static,
{
    if let Some(previous) = previous {
        let _ = previous.await;
    }

    while let Some(command) = commands.recv().await {
        match command {
            Command::Deliver { item, done } => {
                handler.on_item(item).await;
                let _ = done.send(());
            }
            Command::Pause { paused } => {
                let _ = paused.send(());
                let Some(held) = wait_for_resume(&mut commands).await else {
                    break;
                };
                for (item, done) in held {
                    handler.on_item(item).await;
                    let _ = done.send(());
                }
            }
            Command::Resume => {}
            Command::Stop => break,
        }
    }

    debug!("Stream consumer finished");
}

/// Park until `Resume`. Deliveries that arrive meanwhile are held back and
/// returned in order. `None` means the consumer should terminate.
async fn wait_for_resume<T>(
    commands: &mut mpsc::UnboundedReceiver<Command<T>>,
) -> Option<VecDeque<(T, oneshot::Sender<()>)>> {
    let mut held = VecDeque::new();
    loop {
        match commands.recv().await? {
            Command::Resume => return Some(held),
            Command::Deliver { item, done } => held.push_back((item, done)),
            Command::Pause { paused } => {
                let _ = paused.send(());
            }
            Command::Stop => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_stream(capacity: usize) -> (Stream<i32>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let stream = Stream::new(capacity, move |_: i32| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        (stream, calls)
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result = Stream::new(0, |_: i32| {});
        assert_eq!(result.err(), Some(StreamError::ZeroCapacity));
    }

    #[test]
    fn new_stream_is_idle_and_empty() {
        let (stream, _) = counting_stream(10);
        assert_eq!(stream.capacity(), 10);
        assert_eq!(stream.history_size(), 0);
        assert!(!stream.is_listening());
        assert!(!stream.is_disposed());
    }

    #[test]
    fn listen_outside_runtime_fails_without_state_change() {
        let (stream, _) = counting_stream(1);
        assert_eq!(stream.listen(), Err(StreamError::NoRuntime));
        assert!(!stream.is_listening());
    }

    #[tokio::test]
    async fn paused_consumer_holds_deliveries_until_resume() {
        let (tx, rx) = mpsc::unbounded_channel();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let handler: Arc<dyn ItemHandler<i32>> = Arc::new(move |_: i32| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let (paused, ack) = oneshot::channel();
        tx.send(Command::Pause { paused }).unwrap();
        let (done, processed) = oneshot::channel();
        tx.send(Command::Deliver { item: 1, done }).unwrap();

        let consumer = tokio::spawn(consume(handler, rx, None));

        ack.await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        tx.send(Command::Resume).unwrap();
        processed.await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        tx.send(Command::Stop).unwrap();
        consumer.await.unwrap();
    }

    #[tokio::test]
    async fn stop_while_paused_terminates_consumer() {
        let (tx, rx) = mpsc::unbounded_channel::<Command<i32>>();
        let handler: Arc<dyn ItemHandler<i32>> = Arc::new(|_: i32| {});
        let consumer = tokio::spawn(consume(handler, rx, None));

        let (paused, ack) = oneshot::channel();
        tx.send(Command::Pause { paused }).unwrap();
        ack.await.unwrap();
        tx.send(Command::Stop).unwrap();

        consumer.await.unwrap();
    }
}
