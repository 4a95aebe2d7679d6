use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use vlc_remote::{EndPoint, PingOutcome, Prober, ScannerConfig, ScannerEvent, VlcScanner};

/// A fake LAN: a set of addresses answering pings, a set the OS refuses to
/// ping, and a set of VLC hosts.
struct FakeNetwork {
  pingable: HashSet<Ipv4Addr>,
  refused: HashSet<Ipv4Addr>,
  vlc_hosts: HashSet<(Ipv4Addr, u16)>,
  pings: AtomicUsize,
  probes: AtomicUsize,
}

impl FakeNetwork {
  fn new(pingable: &[Ipv4Addr], vlc_hosts: &[(Ipv4Addr, u16)]) -> Self {
    Self {
      pingable: pingable.iter().copied().collect(),
      refused: HashSet::new(),
      vlc_hosts: vlc_hosts.iter().copied().collect(),
      pings: AtomicUsize::new(0),
      probes: AtomicUsize::new(0),
    }
  }
}

impl Prober for FakeNetwork {
  async fn ping(&self, ip: Ipv4Addr) -> PingOutcome {
    self.pings.fetch_add(1, Ordering::SeqCst);
    if self.refused.contains(&ip) {
      PingOutcome::Unavailable
    } else if self.pingable.contains(&ip) {
      PingOutcome::Reply
    } else {
      PingOutcome::NoReply
    }
  }

  async fn probe(&self, ip: Ipv4Addr, port: u16) -> bool {
    self.probes.fetch_add(1, Ordering::SeqCst);
    tokio::task::yield_now().await;
    self.vlc_hosts.contains(&(ip, port))
  }
}

fn subnet_seven() -> FakeNetwork {
  FakeNetwork::new(
    &[Ipv4Addr::new(192, 168, 7, 255)],
    &[
      (Ipv4Addr::new(192, 168, 7, 42), 8080),
      // Wrong port, and a host in a subnet that never answers pings.
      (Ipv4Addr::new(192, 168, 7, 43), 9090),
      (Ipv4Addr::new(192, 168, 9, 1), 8080),
    ],
  )
}

#[tokio::test]
async fn test_scan_finds_only_vlc_in_live_subnet() {
  let scanner = VlcScanner::with_prober(ScannerConfig::default(), subnet_seven()).unwrap();
  let rx = scanner.events();

  let found = scanner.scan().await;
  assert_eq!(found, vec![EndPoint::new(Ipv4Addr::new(192, 168, 7, 42), 8080)]);
  assert_eq!(scanner.end_points(), found);

  match rx.try_recv().unwrap() {
    ScannerEvent::EndPointsUpdated(list) => assert_eq!(list, found),
    other => panic!("Expected EndPointsUpdated, got {:?}", other),
  }
  assert!(matches!(
    rx.try_recv().unwrap(),
    ScannerEvent::PropertyChanged("end_points")
  ));
}

#[tokio::test]
async fn test_only_responsive_subnets_are_probed() {
  let scanner = VlcScanner::with_prober(ScannerConfig::default(), subnet_seven()).unwrap();
  scanner.scan().await;
  // 256 broadcast pings, then hosts .0 to .254 of subnet 7 only.
  let network = scanner.prober();
  assert_eq!(network.pings.load(Ordering::SeqCst), 256);
  assert_eq!(network.probes.load(Ordering::SeqCst), 255);
}

#[tokio::test]
async fn test_without_prefilter_every_subnet_is_probed() {
  let config = ScannerConfig {
    subnet_start: 7,
    subnet_end: 9,
    ping_prefilter: false,
    ..ScannerConfig::default()
  };
  let scanner = VlcScanner::with_prober(config, subnet_seven()).unwrap();

  let found: Vec<String> = scanner.scan().await.iter().map(ToString::to_string).collect();
  assert_eq!(found, ["192.168.7.42:8080", "192.168.9.1:8080"]);
  let network = scanner.prober();
  assert_eq!(network.pings.load(Ordering::SeqCst), 0);
  assert_eq!(network.probes.load(Ordering::SeqCst), 3 * 255);
}

#[tokio::test]
async fn test_refused_ping_falls_back_to_probing() {
  let mut network = subnet_seven();
  network.refused.insert(Ipv4Addr::new(192, 168, 9, 255));
  let scanner = VlcScanner::with_prober(ScannerConfig::default(), network).unwrap();

  let found: Vec<String> = scanner.scan().await.iter().map(ToString::to_string).collect();
  assert_eq!(found, ["192.168.7.42:8080", "192.168.9.1:8080"]);
  assert_eq!(scanner.prober().probes.load(Ordering::SeqCst), 2 * 255);
}

#[tokio::test]
async fn test_no_icmp_at_all_probes_every_subnet() {
  let mut network = subnet_seven();
  network.pingable.clear();
  network.refused = (7..=9).map(|x| Ipv4Addr::new(192, 168, x, 255)).collect();
  let config = ScannerConfig {
    subnet_start: 7,
    subnet_end: 9,
    ..ScannerConfig::default()
  };
  let scanner = VlcScanner::with_prober(config, network).unwrap();

  let found = scanner.scan().await;
  assert_eq!(found.len(), 2);
  assert_eq!(scanner.prober().probes.load(Ordering::SeqCst), 3 * 255);
}

#[tokio::test]
async fn test_repeated_scans_publish_identical_lists() {
  let network = FakeNetwork::new(
    &[Ipv4Addr::new(192, 168, 7, 255), Ipv4Addr::new(192, 168, 1, 255)],
    &[
      (Ipv4Addr::new(192, 168, 7, 42), 8080),
      (Ipv4Addr::new(192, 168, 1, 200), 8080),
      (Ipv4Addr::new(192, 168, 1, 3), 8080),
    ],
  );
  let config = ScannerConfig {
    max_concurrent_probes: 7,
    ..ScannerConfig::default()
  };
  let scanner = VlcScanner::with_prober(config, network).unwrap();

  let first = scanner.scan().await;
  let second = scanner.scan().await;
  assert_eq!(first, second);
  assert_eq!(first.len(), 3);
  assert!(first.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn test_polling_rescans_until_stopped() {
  let config = ScannerConfig {
    subnet_start: 7,
    subnet_end: 7,
    scan_interval_ms: 20,
    ..ScannerConfig::default()
  };
  let scanner = Arc::new(VlcScanner::with_prober(config, subnet_seven()).unwrap());
  let rx = scanner.events();

  assert!(scanner.start_polling());
  assert!(!scanner.start_polling());
  tokio::time::sleep(Duration::from_millis(200)).await;
  assert!(scanner.stop_polling());
  assert!(!scanner.is_polling());

  let mut passes = 0;
  while let Ok(event) = rx.try_recv() {
    if let ScannerEvent::EndPointsUpdated(list) = event {
      assert_eq!(list.len(), 1);
      passes += 1;
    }
  }
  assert!(passes >= 2, "expected several passes, got {}", passes);
}
