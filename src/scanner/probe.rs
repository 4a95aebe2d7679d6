//! Host probing: ICMP ping for subnets, HTTP for the VLC interface.

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use reqwest::header::WWW_AUTHENTICATE;
use reqwest::Client;
use surge_ping::{PingIdentifier, PingSequence, SurgeError};
use tokio::sync::OnceCell;

use crate::config::ScannerConfig;
use crate::vlc::VlcError;

/// Realm VLC sends in its Basic auth challenge.
pub const VLC_REALM: &str = r#"realm="VLC stream""#;

const PING_PAYLOAD: [u8; 8] = [0; 8];

/// Result of pinging a subnet's broadcast address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingOutcome {
  /// An echo reply came back.
  Reply,
  /// The request went out and nothing answered in time.
  NoReply,
  /// The request could not be sent: no ICMP socket, or the OS refused the
  /// broadcast.
  Unavailable,
}

impl PingOutcome {
  /// Whether the subnet still gets probed host by host. Only a ping that was
  /// actually sent and went unanswered rules a subnet out.
  pub fn keeps_subnet(self) -> bool {
    self != Self::NoReply
  }
}

/// Checks a single address. Implemented by [`NetworkProber`] for real
/// networks; tests substitute a synthetic one.
pub trait Prober: Send + Sync + 'static {
  /// Ping `ip` (a subnet broadcast address) within the ping timeout.
  fn ping(&self, ip: Ipv4Addr) -> impl Future<Output = PingOutcome> + Send;

  /// Whether a VLC HTTP interface answers at `ip:port`.
  fn probe(&self, ip: Ipv4Addr, port: u16) -> impl Future<Output = bool> + Send;
}

/// [`Prober`] that talks to the network.
pub struct NetworkProber {
  http: Client,
  // Created on first ping: the ICMP client spawns its receive task.
  icmp: OnceCell<Option<surge_ping::Client>>,
  next_ident: AtomicU16,
  ping_timeout: Duration,
}

impl NetworkProber {
  pub fn new(config: &ScannerConfig) -> Result<Self, VlcError> {
    let http = Client::builder()
      .timeout(config.probe_timeout())
      .pool_max_idle_per_host(0)
      .build()?;

    Ok(Self {
      http,
      icmp: OnceCell::new(),
      next_ident: AtomicU16::new(0),
      ping_timeout: config.ping_timeout(),
    })
  }

  async fn icmp_client(&self) -> Option<&surge_ping::Client> {
    self
      .icmp
      .get_or_init(|| async {
        match surge_ping::Client::new(&surge_ping::Config::default()) {
          Ok(client) => Some(client),
          Err(e) => {
            log::warn!("ICMP unavailable, every subnet will be probed: {}", e);
            None
          }
        }
      })
      .await
      .as_ref()
  }
}

impl Prober for NetworkProber {
  async fn ping(&self, ip: Ipv4Addr) -> PingOutcome {
    let Some(client) = self.icmp_client().await else {
      return PingOutcome::Unavailable;
    };

    let ident = PingIdentifier(self.next_ident.fetch_add(1, Ordering::Relaxed));
    let mut pinger = client.pinger(IpAddr::V4(ip), ident).await;
    pinger.timeout(self.ping_timeout);

    match pinger.ping(PingSequence(0), &PING_PAYLOAD).await {
      Ok(_) => PingOutcome::Reply,
      Err(SurgeError::Timeout { .. }) => PingOutcome::NoReply,
      Err(e) => {
        log::debug!("Ping to {} could not be sent: {}", ip, e);
        PingOutcome::Unavailable
      }
    }
  }

  async fn probe(&self, ip: Ipv4Addr, port: u16) -> bool {
    let url = format!("http://{}:{}/requests/status.xml", ip, port);
    // Only the headers are needed; the body is never read.
    match self.http.get(&url).send().await {
      Ok(response) => {
        let challenge = response
          .headers()
          .get(WWW_AUTHENTICATE)
          .and_then(|value| value.to_str().ok());
        let found = is_vlc_challenge(challenge);
        if found {
          log::debug!("VLC answered at {}:{}", ip, port);
        }
        found
      }
      Err(_) => false,
    }
  }
}

/// Whether an auth challenge such as `Basic realm="VLC stream"` comes from VLC.
pub fn is_vlc_challenge(challenge: Option<&str>) -> bool {
  challenge
    .and_then(|value| value.trim().split_once(' '))
    .map(|(_, parameter)| parameter.trim() == VLC_REALM)
    .unwrap_or(false)
}
