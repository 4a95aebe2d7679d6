//! VLC client error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to a VLC HTTP interface or scanning for one.
#[derive(Debug, Error)]
pub enum VlcError {
  #[error("HTTP request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("HTTP error: {0}")]
  HttpStatus(StatusCode),

  #[error("Authentication rejected by VLC")]
  Unauthorized,

  #[error("VLC host unreachable")]
  Unreachable,

  #[error("XML deserialization error: {0}")]
  Xml(#[from] quick_xml::de::DeError),

  #[error("Unexpected XML document: {0}")]
  UnexpectedDocument(String),

  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("Invalid header value: {0}")]
  InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}
