//! Change notifications for clients and scanners.
//!
//! Each subscriber owns a bounded queue. When a subscriber does not drain it
//! the oldest event is dropped to make room, so a client that polls forever
//! next to an idle listener does not grow without bound.

use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;

use crate::scanner::EndPoint;
use crate::vlc::{DirectoryItem, PlaylistNode, VlcStatus};

const EVENT_CAPACITY: usize = 64;

/// Events emitted by a [`VlcClient`](crate::VlcClient).
#[derive(Debug, Clone)]
pub enum VlcEvent {
  /// Connection flag flipped (`true` = reachable and authorized).
  ConnectionChanged(bool),
  /// A new status snapshot replaced the previous one.
  StatusUpdated(Arc<VlcStatus>),
  /// A directory listing was fetched.
  DirectoryUpdated(Vec<DirectoryItem>),
  /// A playlist was fetched.
  PlaylistUpdated(Vec<PlaylistNode>),
  /// Generic notification naming the property that changed.
  PropertyChanged(&'static str),
}

/// Events emitted by a [`VlcScanner`](crate::VlcScanner).
#[derive(Debug, Clone)]
pub enum ScannerEvent {
  /// A scan pass finished; carries the full list of found end points.
  EndPointsUpdated(Vec<EndPoint>),
  /// Generic notification naming the property that changed.
  PropertyChanged(&'static str),
}

/// Fan-out event channel. Every subscriber gets its own bounded, latest-wins
/// queue.
pub struct EventBus<E> {
  capacity: usize,
  subscribers: Mutex<Vec<Subscriber<E>>>,
}

struct Subscriber<E> {
  tx: Sender<E>,
  // Kept to evict the oldest event when the queue is full.
  rx: Receiver<E>,
}

impl<E: Clone> EventBus<E> {
  pub fn new() -> Self {
    Self::with_capacity(EVENT_CAPACITY)
  }

  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      capacity: capacity.max(1),
      subscribers: Mutex::new(Vec::new()),
    }
  }

  /// Publish an event to every subscriber. A full queue drops its oldest
  /// event to make room. Subscribers whose receivers are all gone are
  /// removed.
  pub fn emit(&self, event: E) {
    let mut subscribers = self.subscribers.lock();
    subscribers.retain(|subscriber| subscriber.tx.receiver_count() > 1);
    for subscriber in subscribers.iter() {
      subscriber.push(event.clone());
    }
  }

  /// New receiver that sees every event published from now on.
  ///
  /// Clones of the returned receiver share its queue.
  pub fn subscribe(&self) -> Receiver<E> {
    let (tx, rx) = async_channel::bounded(self.capacity);
    self.subscribers.lock().push(Subscriber {
      tx,
      rx: rx.clone(),
    });
    rx
  }

  /// Number of live subscribers.
  pub fn subscriber_count(&self) -> usize {
    let mut subscribers = self.subscribers.lock();
    subscribers.retain(|subscriber| subscriber.tx.receiver_count() > 1);
    subscribers.len()
  }
}

impl<E> Subscriber<E> {
  fn push(&self, event: E) {
    let mut event = event;
    loop {
      match self.tx.try_send(event) {
        Ok(()) => return,
        Err(TrySendError::Full(rejected)) => {
          let _ = self.rx.try_recv();
          event = rejected;
        }
        Err(TrySendError::Closed(_)) => return,
      }
    }
  }
}

impl<E: Clone> Default for EventBus<E> {
  fn default() -> Self {
    Self::new()
  }
}
