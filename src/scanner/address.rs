//! Scan address space.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Highest host octet probed in a subnet. `.255` is the broadcast address.
const LAST_HOST: u8 = 254;
const BROADCAST_HOST: u8 = 255;

/// An IP address and port where a VLC HTTP interface answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EndPoint {
  pub ip: Ipv4Addr,
  pub port: u16,
}

impl EndPoint {
  pub fn new(ip: Ipv4Addr, port: u16) -> Self {
    Self { ip, port }
  }
}

impl fmt::Display for EndPoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.ip, self.port)
  }
}

impl From<EndPoint> for SocketAddr {
  fn from(end_point: EndPoint) -> Self {
    SocketAddr::V4(SocketAddrV4::new(end_point.ip, end_point.port))
  }
}

impl From<SocketAddrV4> for EndPoint {
  fn from(addr: SocketAddrV4) -> Self {
    Self::new(*addr.ip(), addr.port())
  }
}

/// One `/24` of the scanned network, identified by its third octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet {
  prefix: [u8; 2],
  octet: u8,
}

impl Subnet {
  pub fn new(prefix: [u8; 2], octet: u8) -> Self {
    Self { prefix, octet }
  }

  pub fn octet(&self) -> u8 {
    self.octet
  }

  pub fn broadcast(&self) -> Ipv4Addr {
    self.host(BROADCAST_HOST)
  }

  /// Candidate hosts `.0` through `.254`.
  pub fn hosts(self) -> impl Iterator<Item = Ipv4Addr> {
    (0..=LAST_HOST).map(move |host| self.host(host))
  }

  fn host(&self, host: u8) -> Ipv4Addr {
    Ipv4Addr::new(self.prefix[0], self.prefix[1], self.octet, host)
  }
}

/// Subnets `prefix.X.0/24` for every `X` in `range`.
pub fn subnets(prefix: [u8; 2], range: RangeInclusive<u8>) -> impl Iterator<Item = Subnet> {
  range.map(move |octet| Subnet::new(prefix, octet))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_end_point_display_and_order() {
    let mut points = vec![
      EndPoint::new(Ipv4Addr::new(192, 168, 1, 20), 8080),
      EndPoint::new(Ipv4Addr::new(192, 168, 0, 99), 8080),
      EndPoint::new(Ipv4Addr::new(192, 168, 1, 3), 8080),
    ];
    points.sort();
    let shown: Vec<String> = points.iter().map(ToString::to_string).collect();
    assert_eq!(shown, ["192.168.0.99:8080", "192.168.1.3:8080", "192.168.1.20:8080"]);

    let addr: SocketAddr = points[0].into();
    assert_eq!(addr.to_string(), "192.168.0.99:8080");
  }

  #[test]
  fn test_subnet_hosts() {
    let subnet = Subnet::new([10, 0], 7);
    let hosts: Vec<Ipv4Addr> = subnet.hosts().collect();
    assert_eq!(hosts.len(), 255);
    assert_eq!(hosts[0], Ipv4Addr::new(10, 0, 7, 0));
    assert_eq!(hosts[254], Ipv4Addr::new(10, 0, 7, 254));
    assert_eq!(subnet.broadcast(), Ipv4Addr::new(10, 0, 7, 255));
  }

  #[test]
  fn test_full_range() {
    let all: Vec<Subnet> = subnets([192, 168], 0..=255).collect();
    assert_eq!(all.len(), 256);
    assert_eq!(all[255].octet(), 255);
  }
}
