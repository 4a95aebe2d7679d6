//! VLC HTTP interface client module.
//!
//! Sends commands to `requests/status.xml` and parses the status, playlist
//! and browse documents VLC returns.

mod client;
mod command;
mod error;
mod types;

pub use client::{CommandOutcome, ConnectionState, VlcClient, DEFAULT_BROWSE_LOCATION};
pub use command::{AddMode, Adjustment, SortKey, SortOrder, VlcCommand};
pub use error::VlcError;
pub use types::*;
