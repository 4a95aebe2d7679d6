//! Remote control for VLC media player over its HTTP interface, plus LAN
//! discovery of VLC instances.
//!
//! ```no_run
//! # async fn demo() -> Result<(), vlc_remote::VlcError> {
//! use vlc_remote::{ClientConfig, VlcClient};
//!
//! let client = VlcClient::spawn(ClientConfig::new("192.168.1.20", 8080, "secret"))?;
//! client.set_volume(256).await;
//! println!("{:?}", client.status().state);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod events;
pub mod poller;
pub mod scanner;
pub mod vlc;

pub use config::{ClientConfig, ScannerConfig};
pub use events::{EventBus, ScannerEvent, VlcEvent};
pub use poller::{PollState, Pollable, Poller};
pub use scanner::{EndPoint, NetworkProber, PingOutcome, Prober, VlcScanner};
pub use vlc::{CommandOutcome, ConnectionState, VlcClient, VlcCommand, VlcError, VlcStatus};
