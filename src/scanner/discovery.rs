//! LAN discovery of VLC HTTP interfaces.
//!
//! A pass pings every subnet's broadcast address, then sends an HTTP request
//! to each host of the subnets that answered. Hosts whose auth challenge
//! carries VLC's realm are published as end points.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_channel::Receiver;
use futures_util::{future, stream, StreamExt};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use super::address::{subnets, EndPoint, Subnet};
use super::probe::{NetworkProber, PingOutcome, Prober};
use crate::config::ScannerConfig;
use crate::events::{EventBus, ScannerEvent};
use crate::poller::{Pollable, Poller};
use crate::vlc::VlcError;

/// Finds VLC instances on the local network.
pub struct VlcScanner<P: Prober = NetworkProber> {
  config: ScannerConfig,
  prober: P,
  end_points: RwLock<Vec<EndPoint>>,
  events: EventBus<ScannerEvent>,
  poller: Poller,
}

impl VlcScanner<NetworkProber> {
  /// Scanner that probes the real network.
  pub fn new(config: ScannerConfig) -> Result<Self, VlcError> {
    let prober = NetworkProber::new(&config)?;
    Self::with_prober(config, prober)
  }
}

impl<P: Prober> VlcScanner<P> {
  pub fn with_prober(config: ScannerConfig, prober: P) -> Result<Self, VlcError> {
    config.validate()?;
    let poller = Poller::new("vlc-scanner", config.scan_interval());
    Ok(Self {
      config,
      prober,
      end_points: RwLock::new(Vec::new()),
      events: EventBus::new(),
      poller,
    })
  }

  pub fn config(&self) -> &ScannerConfig {
    &self.config
  }

  pub fn prober(&self) -> &P {
    &self.prober
  }

  /// End points found by the last completed pass, sorted.
  pub fn end_points(&self) -> Vec<EndPoint> {
    self.end_points.read().clone()
  }

  pub fn events(&self) -> Receiver<ScannerEvent> {
    self.events.subscribe()
  }

  /// Run one pass now and publish its result.
  pub async fn scan(&self) -> Vec<EndPoint> {
    self
      .scan_with(&CancellationToken::new())
      .await
      .unwrap_or_default()
  }

  /// Run one pass, giving up once `cancel` fires.
  ///
  /// Returns `None` for a cancelled pass, whose partial result is discarded.
  pub async fn scan_with(&self, cancel: &CancellationToken) -> Option<Vec<EndPoint>> {
    let started = Instant::now();
    let limit = self.config.max_concurrent_probes;
    let port = self.config.port;
    let prober = &self.prober;

    let range = self.config.subnet_start..=self.config.subnet_end;
    let candidates: Vec<Subnet> = subnets(self.config.network_prefix, range).collect();
    let total_subnets = candidates.len();

    let live: Vec<Subnet> = if self.config.ping_prefilter {
      let pinged: Vec<(Subnet, PingOutcome)> = stream::iter(candidates)
        .map(|subnet| async move {
          if cancel.is_cancelled() {
            return None;
          }
          Some((subnet, prober.ping(subnet.broadcast()).await))
        })
        .buffer_unordered(limit)
        .filter_map(future::ready)
        .collect()
        .await;

      let unpingable = pinged
        .iter()
        .filter(|(_, outcome)| *outcome == PingOutcome::Unavailable)
        .count();
      if unpingable > 0 {
        log::warn!(
          "Broadcast ping could not be sent to {} of {} subnet(s), probing them directly",
          unpingable,
          total_subnets
        );
      }

      let mut live: Vec<Subnet> = pinged
        .into_iter()
        .filter(|(_, outcome)| outcome.keeps_subnet())
        .map(|(subnet, _)| subnet)
        .collect();
      live.sort_by_key(|subnet| subnet.octet());
      live
    } else {
      candidates
    };

    if cancel.is_cancelled() {
      log::debug!("Scan cancelled after subnet discovery");
      return None;
    }
    log::debug!("{} of {} subnet(s) kept for probing", live.len(), total_subnets);

    let hosts: Vec<Ipv4Addr> = live.iter().copied().flat_map(Subnet::hosts).collect();
    let mut found: Vec<EndPoint> = stream::iter(hosts)
      .map(|ip| async move {
        if cancel.is_cancelled() {
          return None;
        }
        prober
          .probe(ip, port)
          .await
          .then(|| EndPoint::new(ip, port))
      })
      .buffer_unordered(limit)
      .filter_map(future::ready)
      .collect()
      .await;

    if cancel.is_cancelled() {
      log::debug!("Scan cancelled, discarding {} partial result(s)", found.len());
      return None;
    }

    found.sort();
    found.dedup();

    *self.end_points.write() = found.clone();
    self.events.emit(ScannerEvent::EndPointsUpdated(found.clone()));
    self.events.emit(ScannerEvent::PropertyChanged("end_points"));

    log::info!(
      "Scan found {} VLC instance(s) across {} live subnet(s) in {:?}",
      found.len(),
      live.len(),
      started.elapsed()
    );
    Some(found)
  }

  // ==========================================================================
  // Polling
  // ==========================================================================

  /// Rescan periodically. No-op if already polling.
  pub fn start_polling(self: &Arc<Self>) -> bool {
    self.poller.start(self)
  }

  /// Stop polling. A pass in progress stops probing and is not published.
  pub fn stop_polling(&self) -> bool {
    self.poller.stop()
  }

  pub fn is_polling(&self) -> bool {
    self.poller.is_polling()
  }

  pub fn polling_interval(&self) -> Duration {
    self.poller.interval()
  }

  pub fn set_polling_interval(&self, interval: Duration) {
    self.poller.set_interval(interval);
  }
}

impl<P: Prober> Pollable for VlcScanner<P> {
  async fn on_poll(&self, cancel: &CancellationToken) -> Result<(), VlcError> {
    self.scan_with(cancel).await;
    Ok(())
  }
}
