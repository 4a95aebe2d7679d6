//! Periodic polling shared by the status client and the network scanner.
//!
//! A [`Poller`] runs one [`Pollable::on_poll`] tick at a time: tick, sleep for
//! the configured interval, repeat until stopped. Failed or panicking ticks
//! are logged and counted, and the loop keeps going.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::vlc::VlcError;

/// Something that can be driven by a [`Poller`].
pub trait Pollable: Send + Sync + 'static {
  /// One tick of work.
  ///
  /// `cancel` fires when polling is stopped mid-tick. Implementations may use
  /// it to stop dispatching new work; the poller never aborts a tick itself.
  fn on_poll(
    &self,
    cancel: &CancellationToken,
  ) -> impl Future<Output = Result<(), VlcError>> + Send;
}

/// Snapshot of a poller's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollState {
  pub is_polling: bool,
  pub interval: Duration,
}

/// A running tick loop.
struct Run {
  id: u64,
  cancel: CancellationToken,
}

struct PollerInner {
  interval: Duration,
  run: Option<Run>,
  /// Fires once the most recently started loop has exited.
  last_exit: Option<CancellationToken>,
  next_run_id: u64,
  consecutive_failures: u32,
}

impl PollerInner {
  fn is_current(&self, id: u64) -> bool {
    self.run.as_ref().map(|run| run.id) == Some(id)
  }
}

/// Start/stop control over a background tick loop.
pub struct Poller {
  label: &'static str,
  inner: Arc<Mutex<PollerInner>>,
}

impl Poller {
  /// Create a stopped poller. `label` only shows up in log lines.
  pub fn new(label: &'static str, interval: Duration) -> Self {
    Self {
      label,
      inner: Arc::new(Mutex::new(PollerInner {
        interval,
        run: None,
        last_exit: None,
        next_run_id: 0,
        consecutive_failures: 0,
      })),
    }
  }

  pub fn is_polling(&self) -> bool {
    self.inner.lock().run.is_some()
  }

  pub fn interval(&self) -> Duration {
    self.inner.lock().interval
  }

  /// Change the delay between ticks. Applies from the next sleep on.
  pub fn set_interval(&self, interval: Duration) {
    self.inner.lock().interval = interval;
  }

  pub fn state(&self) -> PollState {
    let inner = self.inner.lock();
    PollState {
      is_polling: inner.run.is_some(),
      interval: inner.interval,
    }
  }

  /// Number of failed ticks since the last successful one.
  pub fn consecutive_failures(&self) -> u32 {
    self.inner.lock().consecutive_failures
  }

  /// Start the tick loop for `target` on the current tokio runtime.
  ///
  /// Returns `false` without doing anything if already polling. The loop only
  /// holds a weak reference and ends on its own once `target` is dropped.
  /// After a stop, the new loop waits for the old one's last tick to finish
  /// before ticking.
  pub fn start<T: Pollable>(&self, target: &Arc<T>) -> bool {
    let exit = CancellationToken::new();
    let (id, cancel, previous_exit) = {
      let mut inner = self.inner.lock();
      if inner.run.is_some() {
        return false;
      }
      let id = inner.next_run_id;
      inner.next_run_id += 1;
      inner.consecutive_failures = 0;
      let cancel = CancellationToken::new();
      inner.run = Some(Run {
        id,
        cancel: cancel.clone(),
      });
      let previous_exit = inner.last_exit.replace(exit.clone());
      (id, cancel, previous_exit)
    };

    log::info!("{}: polling started", self.label);
    tokio::spawn(Self::run_loop(
      self.label,
      id,
      Arc::downgrade(target),
      self.inner.clone(),
      cancel,
      previous_exit,
      exit,
    ));
    true
  }

  /// Stop polling. An in-flight tick runs to completion, no new tick starts.
  ///
  /// Returns `false` if the poller was not running.
  pub fn stop(&self) -> bool {
    let run = self.inner.lock().run.take();
    match run {
      Some(run) => {
        run.cancel.cancel();
        log::info!("{}: polling stopped", self.label);
        true
      }
      None => false,
    }
  }

  async fn run_loop<T: Pollable>(
    label: &'static str,
    id: u64,
    target: Weak<T>,
    inner: Arc<Mutex<PollerInner>>,
    cancel: CancellationToken,
    previous_exit: Option<CancellationToken>,
    exit: CancellationToken,
  ) {
    let _exit_guard = exit.drop_guard();

    // Not interruptible by `cancel`: a loop started after this one must not
    // see this one exit while an older tick is still running.
    if let Some(previous_exit) = previous_exit {
      previous_exit.cancelled().await;
    }

    loop {
      if cancel.is_cancelled() {
        break;
      }
      let Some(target) = target.upgrade() else {
        log::debug!("{}: poll target dropped, ending loop", label);
        break;
      };

      let outcome = AssertUnwindSafe(target.on_poll(&cancel))
        .catch_unwind()
        .await;
      drop(target);

      let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(panic) => {
          let message = panic_message(panic.as_ref());
          log::error!("{}: poll tick panicked: {}", label, message);
          Some(message)
        }
      };

      let interval = {
        let mut state = inner.lock();
        if state.is_current(id) {
          match failure {
            None => state.consecutive_failures = 0,
            Some(ref reason) => {
              state.consecutive_failures = state.consecutive_failures.saturating_add(1);
              if state.consecutive_failures == 1 {
                log::warn!("{}: poll tick failed: {}", label, reason);
              } else {
                log::debug!(
                  "{}: poll tick failed ({} in a row): {}",
                  label,
                  state.consecutive_failures,
                  reason
                );
              }
            }
          }
        }
        state.interval
      };

      tokio::select! {
        _ = cancel.cancelled() => break,
        _ = tokio::time::sleep(interval) => {}
      }
    }

    let mut state = inner.lock();
    if state.is_current(id) {
      state.run = None;
    }
  }
}

impl Drop for Poller {
  fn drop(&mut self) {
    self.stop();
  }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
  if let Some(message) = panic.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = panic.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}
