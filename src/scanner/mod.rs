//! Network scanner module - finds VLC HTTP interfaces on the LAN.
//!
//! - `address.rs` - end points and subnet enumeration
//! - `probe.rs` - ICMP and HTTP probing
//! - `discovery.rs` - scan passes and periodic rescans

mod address;
mod discovery;
mod probe;

pub use address::{subnets, EndPoint, Subnet};
pub use discovery::VlcScanner;
pub use probe::{is_vlc_challenge, NetworkProber, PingOutcome, Prober, VLC_REALM};
