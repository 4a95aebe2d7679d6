//! Client and scanner configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::vlc::VlcError;

/// Configuration for a single VLC HTTP interface connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
  /// Host name or IP address of the VLC instance.
  #[serde(default = "default_host")]
  pub host: String,

  /// HTTP interface port, VLC defaults to 8080.
  #[serde(default = "default_port")]
  pub port: u16,

  /// Lua HTTP password configured in VLC.
  #[serde(default)]
  pub password: String,

  /// Status polling interval in milliseconds.
  #[serde(default = "default_poll_interval_ms")]
  pub poll_interval_ms: u64,

  /// Per-request timeout in milliseconds.
  #[serde(default = "default_request_timeout_ms")]
  pub request_timeout_ms: u64,

  /// Start polling as soon as the client is spawned.
  #[serde(default = "default_start_polling")]
  pub start_polling: bool,
}

fn default_host() -> String {
  "127.0.0.1".to_string()
}

fn default_port() -> u16 {
  8080
}

fn default_poll_interval_ms() -> u64 {
  1_000
}

// Short on purpose: a dropped instance should flip the connection flag fast.
fn default_request_timeout_ms() -> u64 {
  500
}

fn default_start_polling() -> bool {
  true
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      host: default_host(),
      port: default_port(),
      password: String::new(),
      poll_interval_ms: default_poll_interval_ms(),
      request_timeout_ms: default_request_timeout_ms(),
      start_polling: default_start_polling(),
    }
  }
}

impl ClientConfig {
  /// Config for `host:port` with the given password and default timings.
  pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
    Self {
      host: host.into(),
      port,
      password: password.into(),
      ..Self::default()
    }
  }

  pub fn poll_interval(&self) -> Duration {
    Duration::from_millis(self.poll_interval_ms)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_millis(self.request_timeout_ms)
  }

  /// Validate configuration values.
  pub fn validate(&self) -> Result<(), VlcError> {
    if self.host.trim().is_empty() {
      return Err(VlcError::InvalidConfig("Host cannot be empty".to_string()));
    }
    if self.port == 0 {
      return Err(VlcError::InvalidConfig("Port cannot be 0".to_string()));
    }
    if self.poll_interval_ms == 0 {
      return Err(VlcError::InvalidConfig(
        "Poll interval must be greater than zero".to_string(),
      ));
    }
    if self.request_timeout_ms == 0 {
      return Err(VlcError::InvalidConfig(
        "Request timeout must be greater than zero".to_string(),
      ));
    }
    Ok(())
  }
}

/// Configuration for LAN discovery of VLC HTTP interfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerConfig {
  /// First two octets of the scanned network.
  #[serde(default = "default_network_prefix")]
  pub network_prefix: [u8; 2],

  /// First third-octet subnet to scan.
  #[serde(default)]
  pub subnet_start: u8,

  /// Last third-octet subnet to scan (inclusive).
  #[serde(default = "default_subnet_end")]
  pub subnet_end: u8,

  /// Port the VLC HTTP interface is expected on.
  #[serde(default = "default_port")]
  pub port: u16,

  /// Delay between scan passes in milliseconds.
  #[serde(default = "default_scan_interval_ms")]
  pub scan_interval_ms: u64,

  /// Broadcast ping timeout in milliseconds.
  #[serde(default = "default_ping_timeout_ms")]
  pub ping_timeout_ms: u64,

  /// Per-host HTTP probe timeout in milliseconds.
  #[serde(default = "default_probe_timeout_ms")]
  pub probe_timeout_ms: u64,

  /// Upper bound on probes in flight at once.
  #[serde(default = "default_max_concurrent_probes")]
  pub max_concurrent_probes: usize,

  /// Skip subnets whose broadcast address does not answer a ping.
  #[serde(default = "default_ping_prefilter")]
  pub ping_prefilter: bool,
}

fn default_network_prefix() -> [u8; 2] {
  [192, 168]
}

fn default_subnet_end() -> u8 {
  255
}

fn default_scan_interval_ms() -> u64 {
  10_000
}

fn default_ping_timeout_ms() -> u64 {
  500
}

fn default_probe_timeout_ms() -> u64 {
  5_000
}

fn default_max_concurrent_probes() -> usize {
  256
}

fn default_ping_prefilter() -> bool {
  true
}

impl Default for ScannerConfig {
  fn default() -> Self {
    Self {
      network_prefix: default_network_prefix(),
      subnet_start: 0,
      subnet_end: default_subnet_end(),
      port: default_port(),
      scan_interval_ms: default_scan_interval_ms(),
      ping_timeout_ms: default_ping_timeout_ms(),
      probe_timeout_ms: default_probe_timeout_ms(),
      max_concurrent_probes: default_max_concurrent_probes(),
      ping_prefilter: default_ping_prefilter(),
    }
  }
}

impl ScannerConfig {
  pub fn scan_interval(&self) -> Duration {
    Duration::from_millis(self.scan_interval_ms)
  }

  pub fn ping_timeout(&self) -> Duration {
    Duration::from_millis(self.ping_timeout_ms)
  }

  pub fn probe_timeout(&self) -> Duration {
    Duration::from_millis(self.probe_timeout_ms)
  }

  /// Validate configuration values.
  pub fn validate(&self) -> Result<(), VlcError> {
    if self.subnet_start > self.subnet_end {
      return Err(VlcError::InvalidConfig(format!(
        "Subnet range {}..={} is empty",
        self.subnet_start, self.subnet_end
      )));
    }
    if self.port == 0 {
      return Err(VlcError::InvalidConfig("Port cannot be 0".to_string()));
    }
    if self.max_concurrent_probes == 0 {
      return Err(VlcError::InvalidConfig(
        "At least one concurrent probe is required".to_string(),
      ));
    }
    if self.scan_interval_ms == 0 || self.ping_timeout_ms == 0 || self.probe_timeout_ms == 0 {
      return Err(VlcError::InvalidConfig(
        "Scan interval and timeouts must be greater than zero".to_string(),
      ));
    }
    Ok(())
  }
}
