//! Frame handoff queue between the capture/decode and presentation contexts
//!
//! Single-producer/single-consumer, FIFO, bounded. The producer side never
//! blocks: when the queue is full the oldest undelivered frame is dropped
//! to make room (drop-oldest policy), so a stalled consumer costs frames,
//! never capture latency. The consumer side blocks until a frame arrives,
//! the producer goes away, or the queue is stopped.
//!
//! Stopping is distinct from the producer ending the stream: once stopped,
//! `pop` returns `None` immediately even if frames are still queued — those
//! belong to the shutdown path, which releases them via `drain`. When the
//! producer is simply dropped (end of stream), queued frames are still
//! delivered before `pop` reports the end.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

/// Result of a producer-side push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The frame was queued.
    Queued,
    /// The frame was queued after evicting the oldest undelivered frame.
    DroppedOldest,
    /// The queue was stopped; the frame was released without being queued.
    Rejected,
}

struct Inner<T> {
    queue: VecDeque<T>,
    stopped: bool,
    producer_alive: bool,
}

struct Shared<T> {
    inner: Mutex<Inner<T>>,
    ready: Condvar,
    capacity: usize,
}

/// Create a bounded handoff queue, returning its two endpoint handles.
pub fn bounded<T>(capacity: usize) -> (FrameProducer<T>, FrameConsumer<T>) {
    assert!(capacity > 0, "handoff queue capacity must be at least 1");

    let shared = Arc::new(Shared {
        inner: Mutex::new(Inner {
            queue: VecDeque::with_capacity(capacity),
            stopped: false,
            producer_alive: true,
        }),
        ready: Condvar::new(),
        capacity,
    });

    (
        FrameProducer {
            shared: Arc::clone(&shared),
        },
        FrameConsumer { shared },
    )
}

/// Producer endpoint, owned by the decode stage on the capture context.
pub struct FrameProducer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> FrameProducer<T> {
    /// Enqueue a frame, transferring its ownership to the queue.
    /// Never blocks beyond the internal lock.
    pub fn push(&mut self, frame: T) -> PushOutcome {
        let evicted;
        let outcome;
        {
            let mut inner = self.shared.inner.lock().unwrap();
            if inner.stopped {
                return PushOutcome::Rejected;
            }
            evicted = if inner.queue.len() >= self.shared.capacity {
                inner.queue.pop_front()
            } else {
                None
            };
            outcome = if evicted.is_some() {
                PushOutcome::DroppedOldest
            } else {
                PushOutcome::Queued
            };
            inner.queue.push_back(frame);
        }
        drop(evicted);
        self.shared.ready.notify_one();
        outcome
    }
}

impl<T> Drop for FrameProducer<T> {
    fn drop(&mut self) {
        let mut inner = self.shared.inner.lock().unwrap();
        inner.producer_alive = false;
        drop(inner);
        self.shared.ready.notify_all();
    }
}

/// Consumer endpoint, owned by the presentation context.
pub struct FrameConsumer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> FrameConsumer<T> {
    /// Dequeue the next frame in FIFO order, taking ownership of it.
    ///
    /// Blocks until a frame is available. Returns `None` once the queue
    /// has been stopped, or once the producer is gone and every delivered
    /// frame has been consumed.
    pub fn pop(&mut self) -> Option<T> {
        let mut inner = self.shared.inner.lock().unwrap();
        loop {
            if inner.stopped {
                return None;
            }
            if let Some(frame) = inner.queue.pop_front() {
                return Some(frame);
            }
            if !inner.producer_alive {
                return None;
            }
            inner = self.shared.ready.wait(inner).unwrap();
        }
    }

    /// A clonable control handle for stopping and draining the queue.
    pub fn control(&self) -> HandoffControl<T> {
        HandoffControl {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Control handle used by the session coordinator (and signal handlers)
/// to stop the queue and release whatever it still holds.
pub struct HandoffControl<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for HandoffControl<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> HandoffControl<T> {
    /// Signal stop: wakes a blocked `pop` and makes further pushes fail.
    /// Idempotent.
    pub fn stop(&self) {
        let mut inner = self.shared.inner.lock().unwrap();
        inner.stopped = true;
        drop(inner);
        self.shared.ready.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.inner.lock().unwrap().stopped
    }

    /// Number of frames currently queued.
    pub fn queued(&self) -> usize {
        self.shared.inner.lock().unwrap().queue.len()
    }

    /// Remove and release every queued frame, returning how many there were.
    pub fn drain(&self) -> usize {
        let remaining: Vec<T> = {
            let mut inner = self.shared.inner.lock().unwrap();
            inner.queue.drain(..).collect()
        };
        remaining.len()
    }
}
