use std::time::Duration;

use vlc_remote::vlc::{PlaybackState, SortKey, SortOrder};
use vlc_remote::{ClientConfig, CommandOutcome, ConnectionState, VlcClient, VlcError, VlcEvent};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLAYING: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes" ?>
<root>
  <fullscreen>false</fullscreen>
  <aspectratio>default</aspectratio>
  <audiodelay>0</audiodelay>
  <apiversion>3</apiversion>
  <currentplid>4</currentplid>
  <time>42</time>
  <volume>128</volume>
  <length>200</length>
  <random>false</random>
  <rate>1</rate>
  <state>playing</state>
  <loop>false</loop>
  <version>3.0.20 Vetinari</version>
  <position>0.21</position>
  <repeat>false</repeat>
  <subtitledelay>0</subtitledelay>
  <equalizer></equalizer>
  <information>
    <category name="meta">
      <info name="filename">first.mp3</info>
      <info name="title">First</info>
    </category>
  </information>
</root>"#;

fn config_for(server: &MockServer) -> ClientConfig {
  let addr = server.address();
  ClientConfig {
    start_polling: false,
    ..ClientConfig::new(addr.ip().to_string(), addr.port(), "secret")
  }
}

fn drain(rx: &async_channel::Receiver<VlcEvent>) -> Vec<VlcEvent> {
  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }
  events
}

fn status_updates(events: &[VlcEvent]) -> usize {
  events
    .iter()
    .filter(|event| matches!(event, VlcEvent::StatusUpdated(_)))
    .count()
}

#[tokio::test]
async fn test_status_update_replaces_snapshot() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/requests/status.xml"))
    .and(header("authorization", "Basic OnNlY3JldA=="))
    .respond_with(ResponseTemplate::new(200).set_body_string(PLAYING))
    .mount(&server)
    .await;

  let client = VlcClient::new(config_for(&server)).unwrap();
  let rx = client.events();

  assert_eq!(client.update_status().await, CommandOutcome::Updated);
  assert!(client.is_connected());

  let status = client.status();
  assert_eq!(status.state, PlaybackState::Playing);
  assert_eq!(status.volume, 128);
  assert_eq!(status.title(), Some("First"));

  let events = drain(&rx);
  assert_eq!(status_updates(&events), 1);
  assert!(events
    .iter()
    .any(|event| matches!(event, VlcEvent::ConnectionChanged(true))));
}

#[tokio::test]
async fn test_timeout_leaves_snapshot_untouched() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_string(PLAYING)
        .set_delay(Duration::from_millis(600)),
    )
    .mount(&server)
    .await;

  let client = VlcClient::new(config_for(&server)).unwrap();
  let rx = client.events();

  assert_eq!(client.update_status().await, CommandOutcome::Unreachable);
  assert_eq!(client.connection_state(), ConnectionState::Disconnected);
  assert_eq!(client.status().state, PlaybackState::Stopped);
  assert_eq!(client.status().volume, 0);
  assert_eq!(status_updates(&drain(&rx)), 0);
}

#[tokio::test]
async fn test_unauthorized_disconnects() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .respond_with(
      ResponseTemplate::new(401)
        .insert_header("WWW-Authenticate", r#"Basic realm="VLC stream""#)
        .set_body_string(PLAYING),
    )
    .mount(&server)
    .await;

  let client = VlcClient::new(config_for(&server)).unwrap();
  let rx = client.events();

  assert_eq!(client.play().await, CommandOutcome::Unauthorized);
  assert!(!client.is_connected());
  assert_eq!(client.status().volume, 0);
  assert_eq!(status_updates(&drain(&rx)), 0);
}

#[tokio::test]
async fn test_malformed_body_keeps_previous_snapshot() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(query_param("command", "pl_stop"))
    .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>nope</body></html>"))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .respond_with(ResponseTemplate::new(200).set_body_string(PLAYING))
    .mount(&server)
    .await;

  let client = VlcClient::new(config_for(&server)).unwrap();
  assert!(client.update_status().await.is_updated());
  let before = client.status();

  let rx = client.events();
  drain(&rx);

  assert_eq!(client.stop().await, CommandOutcome::MalformedResponse);
  assert!(client.is_connected());
  assert_eq!(*client.status(), *before);
  assert_eq!(status_updates(&drain(&rx)), 0);
}

#[tokio::test]
async fn test_unexpected_status_keeps_connection() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .respond_with(ResponseTemplate::new(500))
    .mount(&server)
    .await;

  let client = VlcClient::new(config_for(&server)).unwrap();
  let outcome = client.next().await;
  assert!(matches!(outcome, CommandOutcome::UnexpectedStatus(code) if code.as_u16() == 500));
  assert!(client.is_connected());
}

#[tokio::test]
async fn test_connection_event_fires_only_on_change() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .respond_with(ResponseTemplate::new(200).set_body_string(PLAYING))
    .mount(&server)
    .await;

  let client = VlcClient::new(config_for(&server)).unwrap();
  let rx = client.events();
  client.update_status().await;
  client.update_status().await;
  client.update_status().await;

  let events = drain(&rx);
  let changes = events
    .iter()
    .filter(|event| matches!(event, VlcEvent::ConnectionChanged(_)))
    .count();
  assert_eq!(changes, 1);
  assert_eq!(status_updates(&events), 3);
}

#[tokio::test]
async fn test_command_queries() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/requests/status.xml"))
    .and(query_param("command", "volume"))
    .and(query_param("val", "+10"))
    .respond_with(ResponseTemplate::new(200).set_body_string(PLAYING))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(query_param("command", "pl_sort"))
    .and(query_param("val", "title nodes first"))
    .and(query_param("id", "1"))
    .respond_with(ResponseTemplate::new(200).set_body_string(PLAYING))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(query_param("command", "in_enqueue"))
    .and(query_param("input", "file:///music/a b.mp3"))
    .respond_with(ResponseTemplate::new(200).set_body_string(PLAYING))
    .expect(1)
    .mount(&server)
    .await;

  let client = VlcClient::new(config_for(&server)).unwrap();
  assert!(client.set_relative_volume(10).await.is_updated());
  assert!(client
    .sort_playlist(SortKey::TitleNodesFirst, SortOrder::Descending)
    .await
    .is_updated());
  assert!(client
    .enqueue("file:///music/a b.mp3", None, Default::default())
    .await
    .is_updated());
}

#[tokio::test]
async fn test_browse_and_playlist() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/requests/browse.xml"))
    .and(query_param("dir", "file://~"))
    .respond_with(ResponseTemplate::new(200).set_body_string(
      r#"<root><element type="dir" path="/home/me/Videos" name="Videos" uri="file:///home/me/Videos" size="4096"/></root>"#,
    ))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/requests/playlist.xml"))
    .respond_with(ResponseTemplate::new(200).set_body_string(
      r#"<node ro="rw" name="Undefined" id="1"><node ro="ro" name="Playlist" id="2"><leaf ro="rw" name="a.mp3" id="4" duration="60" uri="file:///a.mp3" current="current"/></node></node>"#,
    ))
    .mount(&server)
    .await;

  let client = VlcClient::new(config_for(&server)).unwrap();
  let rx = client.events();

  let items = client.get_directory_contents(None).await.unwrap();
  assert_eq!(items.len(), 1);
  assert!(items[0].is_dir());
  assert_eq!(items[0].name, "Videos");

  let nodes = client.get_playlist(None).await.unwrap();
  assert_eq!(nodes[0].find_current().map(|leaf| leaf.id), Some(4));

  assert!(client.is_connected());

  let fetched: Vec<VlcEvent> = drain(&rx)
    .into_iter()
    .filter(|event| {
      matches!(
        event,
        VlcEvent::DirectoryUpdated(_) | VlcEvent::PlaylistUpdated(_)
      )
    })
    .collect();
  assert!(matches!(fetched[0], VlcEvent::DirectoryUpdated(ref items) if items.len() == 1));
  assert!(matches!(fetched[1], VlcEvent::PlaylistUpdated(ref nodes) if nodes.len() == 1));
}

#[tokio::test]
async fn test_browse_failure_is_an_error() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/requests/browse.xml"))
    .respond_with(ResponseTemplate::new(404))
    .mount(&server)
    .await;

  let client = VlcClient::new(config_for(&server)).unwrap();
  let result = client.get_directory_contents(Some("file:///nowhere")).await;
  assert!(matches!(result, Err(VlcError::HttpStatus(code)) if code.as_u16() == 404));
}

#[tokio::test]
async fn test_rejected_browse_disconnects() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/requests/status.xml"))
    .respond_with(ResponseTemplate::new(200).set_body_string(PLAYING))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/requests/playlist.xml"))
    .respond_with(ResponseTemplate::new(401))
    .mount(&server)
    .await;

  let client = VlcClient::new(config_for(&server)).unwrap();
  assert!(client.update_status().await.is_updated());
  assert!(client.is_connected());

  let rx = client.events();
  let result = client.get_playlist(Some("anything")).await;
  assert!(matches!(result, Err(VlcError::Unauthorized)));
  assert_eq!(client.connection_state(), ConnectionState::Disconnected);
  assert!(drain(&rx)
    .iter()
    .any(|event| matches!(event, VlcEvent::ConnectionChanged(false))));
}

#[tokio::test]
async fn test_unreachable_browse_disconnects() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/requests/browse.xml"))
    .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(600)))
    .mount(&server)
    .await;

  let client = VlcClient::new(config_for(&server)).unwrap();
  let result = client.get_directory_contents(None).await;
  assert!(matches!(result, Err(VlcError::Http(_))));
  assert_eq!(client.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_every_listener_sees_status_updates() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .respond_with(ResponseTemplate::new(200).set_body_string(PLAYING))
    .mount(&server)
    .await;

  let client = VlcClient::new(config_for(&server)).unwrap();
  let first = client.events();
  let second = client.events();
  assert!(client.update_status().await.is_updated());

  for rx in [&first, &second] {
    let events = drain(rx);
    assert_eq!(status_updates(&events), 1);
    assert!(events
      .iter()
      .any(|event| matches!(event, VlcEvent::ConnectionChanged(true))));
  }
}

#[tokio::test]
async fn test_spawn_starts_polling() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/requests/status.xml"))
    .respond_with(ResponseTemplate::new(200).set_body_string(PLAYING))
    .mount(&server)
    .await;

  let config = ClientConfig {
    start_polling: true,
    poll_interval_ms: 50,
    ..config_for(&server)
  };
  let client = VlcClient::spawn(config).unwrap();
  assert!(client.is_polling());

  tokio::time::sleep(Duration::from_millis(400)).await;
  assert!(client.stop_polling());
  assert!(client.is_connected());
  assert_eq!(client.status().state, PlaybackState::Playing);

  let requests = server.received_requests().await.unwrap_or_default();
  assert!(requests.len() >= 2, "expected repeated polls, got {}", requests.len());
}
