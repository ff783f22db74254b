//! Hands events from background producers to the UI consumer.
//!
//! Every peripheral owns a [`Dispatcher`] clone and posts owned events into it from whatever
//! thread it runs on. The UI side holds the single [`DispatchQueue`] and takes ownership of each
//! event on receipt; the event is dropped as soon as the handler it was given to returns.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures::{SinkExt, StreamExt};
use iced::subscription::{self, Subscription};
use log::{debug, warn};

pub struct Dispatcher<T> {
    sender: UnboundedSender<T>,
}

// derive(Clone) would require T: Clone
impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Dispatcher { sender: self.sender.clone() }
    }
}

impl<T> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl<T> Dispatcher<T> {
    /// Queues `event` for the consumer. Never blocks.
    ///
    /// Returns false if the consumer is gone, in which case the event has already been dropped.
    pub fn post(&self, event: T) -> bool {
        match self.sender.unbounded_send(event) {
            Ok(()) => true,
            Err(err) => {
                debug!("Consumer has stopped, dropping event");
                drop(err.into_inner());
                false
            },
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

pub struct DispatchQueue<T> {
    receiver: UnboundedReceiver<T>,
}

impl<T> DispatchQueue<T> {
    /// Waits for the next event. Resolves to None once every [`Dispatcher`] has been dropped.
    pub async fn next(&mut self) -> Option<T> {
        self.receiver.next().await
    }

    /// Runs `handler` for every event that is queued right now, in posting order, and returns
    /// how many ran.
    pub fn run_pending(&mut self, mut handler: impl FnMut(T)) -> usize {
        let mut count = 0;
        while let Ok(Some(event)) = self.receiver.try_next() {
            handler(event);
            count += 1;
        }
        count
    }

    /// Stops accepting new events. Events that are already queued can still be drained.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

pub fn dispatch_channel<T>() -> (Dispatcher<T>, DispatchQueue<T>) {
    let (sender, receiver) = unbounded::<T>();
    (Dispatcher { sender }, DispatchQueue { receiver })
}

/// The queue is handed to the first subscription that asks for it. iced keeps that
/// subscription alive across `subscription()` calls because its id never changes.
pub type SharedDispatchQueue<T> = Arc<Mutex<Option<DispatchQueue<T>>>>;

pub fn shared_queue<T>(queue: DispatchQueue<T>) -> SharedDispatchQueue<T> {
    Arc::new(Mutex::new(Some(queue)))
}

pub fn dispatch_subscription<T>(queue: SharedDispatchQueue<T>) -> Subscription<T>
where
    T: Send + 'static,
{
    struct Dispatch;

    subscription::channel(
        std::any::TypeId::of::<Dispatch>(),
        64,
        move |mut subscription_sender| async move {
            let queue = queue.lock().ok().and_then(|mut guard| guard.take());

            match queue {
                Some(mut queue) => {
                    while let Some(event) = queue.next().await {
                        if subscription_sender.send(event).await.is_err() {
                            warn!("UI run loop has stopped, no longer forwarding events");
                            queue.close();
                            break;
                        }
                    }
                    debug!("All event producers have stopped");
                },
                None => warn!("Dispatch queue was already taken by another subscription"),
            }

            // note: subscription::channel expects the future to never resolve (Infallible)
            std::future::pending::<Infallible>().await
        },
    )
}
