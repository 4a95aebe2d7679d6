//! VLC HTTP interface client.

use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use base64::prelude::*;
use parking_lot::RwLock;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;

use super::command::{encode, AddMode, Adjustment, SortKey, SortOrder, VlcCommand};
use super::error::VlcError;
use super::types::*;
use crate::config::ClientConfig;
use crate::events::{EventBus, VlcEvent};
use crate::poller::{Pollable, Poller};
use crate::scanner::EndPoint;

/// Directory listed when no location is given: the VLC user's home.
pub const DEFAULT_BROWSE_LOCATION: &str = "file://~";

/// Reachability of the VLC instance, as of the most recent request of any
/// kind (status, playlist or browse).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
  /// No request has completed yet.
  #[default]
  Unknown,
  Connected,
  /// Unreachable, or the password was rejected.
  Disconnected,
}

/// What happened to a status request.
///
/// Failures never surface as errors from the command methods; they show up
/// here and in [`VlcClient::connection_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
  /// A new status snapshot was stored.
  Updated,
  /// Timeout, refused connection or DNS failure.
  Unreachable,
  /// VLC rejected the password.
  Unauthorized,
  /// VLC answered with an unexpected HTTP status.
  UnexpectedStatus(StatusCode),
  /// The body was not a usable status document; the old snapshot was kept.
  MalformedResponse,
}

impl CommandOutcome {
  pub fn is_updated(&self) -> bool {
    matches!(self, Self::Updated)
  }

  pub fn into_result(self) -> Result<(), VlcError> {
    match self {
      Self::Updated => Ok(()),
      Self::Unreachable => Err(VlcError::Unreachable),
      Self::Unauthorized => Err(VlcError::Unauthorized),
      Self::UnexpectedStatus(status) => Err(VlcError::HttpStatus(status)),
      Self::MalformedResponse => Err(VlcError::UnexpectedDocument(
        "malformed status document".to_string(),
      )),
    }
  }
}

/// Client for one VLC instance's HTTP interface.
pub struct VlcClient {
  http: Client,
  base_url: String,
  status: RwLock<Arc<VlcStatus>>,
  connection: RwLock<ConnectionState>,
  events: EventBus<VlcEvent>,
  poller: Poller,
}

impl VlcClient {
  /// Create a client. Does not contact VLC or start polling.
  pub fn new(config: ClientConfig) -> Result<Self, VlcError> {
    config.validate()?;

    let credentials = BASE64_STANDARD.encode(format!(":{}", config.password));
    let mut auth = HeaderValue::from_str(&format!("Basic {}", credentials))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, auth);
    headers.insert(header::ACCEPT, HeaderValue::from_static("text/xml"));

    let http = Client::builder()
      .timeout(config.request_timeout())
      .default_headers(headers)
      .build()?;

    Ok(Self {
      http,
      base_url: format!("http://{}:{}/", config.host, config.port),
      status: RwLock::new(Arc::new(VlcStatus::default())),
      connection: RwLock::new(ConnectionState::Unknown),
      events: EventBus::new(),
      poller: Poller::new("vlc-client", config.poll_interval()),
    })
  }

  /// Client for `host:port` with default timings.
  pub fn connect(host: &str, port: u16, password: &str) -> Result<Self, VlcError> {
    Self::new(ClientConfig::new(host, port, password))
  }

  /// Client for an end point found by the scanner.
  pub fn for_end_point(end_point: EndPoint, password: &str) -> Result<Self, VlcError> {
    Self::connect(&end_point.ip.to_string(), end_point.port, password)
  }

  /// Create a shared client, polling right away if the config asks for it.
  ///
  /// Must be called from within a tokio runtime when polling is enabled.
  pub fn spawn(config: ClientConfig) -> Result<Arc<Self>, VlcError> {
    let start_polling = config.start_polling;
    let client = Arc::new(Self::new(config)?);
    if start_polling {
      client.start_polling();
    }
    Ok(client)
  }

  /// Base URL requests are made against, e.g. `http://127.0.0.1:8080/`.
  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Latest status snapshot.
  pub fn status(&self) -> Arc<VlcStatus> {
    self.status.read().clone()
  }

  pub fn connection_state(&self) -> ConnectionState {
    *self.connection.read()
  }

  pub fn is_connected(&self) -> bool {
    self.connection_state() == ConnectionState::Connected
  }

  /// Receiver for connection, status, playlist and directory events.
  pub fn events(&self) -> Receiver<VlcEvent> {
    self.events.subscribe()
  }

  // ==========================================================================
  // Polling
  // ==========================================================================

  /// Start refreshing the status periodically. No-op if already polling.
  pub fn start_polling(self: &Arc<Self>) -> bool {
    self.poller.start(self)
  }

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

  /// Failed refreshes since the last successful one.
  pub fn consecutive_poll_failures(&self) -> u32 {
    self.poller.consecutive_failures()
  }

  // ==========================================================================
  // Requests
  // ==========================================================================

  /// Request `status.xml` with an optional command query and store the
  /// returned status.
  pub async fn send_command(&self, query: Option<&str>) -> CommandOutcome {
    let url = match query {
      Some(query) => format!("{}requests/status.xml?{}", self.base_url, query),
      None => format!("{}requests/status.xml", self.base_url),
    };

    let response = match self.http.get(&url).send().await {
      Ok(response) => response,
      Err(e) => {
        log::debug!("VLC request to {} failed: {}", self.base_url, e);
        self.set_connected(false);
        return CommandOutcome::Unreachable;
      }
    };

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
      log::debug!("VLC at {} rejected the password", self.base_url);
      self.set_connected(false);
      return CommandOutcome::Unauthorized;
    }
    self.set_connected(true);

    if !status.is_success() {
      log::warn!("VLC status request failed with HTTP {}", status);
      return CommandOutcome::UnexpectedStatus(status);
    }

    let body = match response.text().await {
      Ok(body) => body,
      Err(e) => {
        log::warn!("Failed to read VLC status body: {}", e);
        return CommandOutcome::MalformedResponse;
      }
    };

    match VlcStatus::from_xml(&body) {
      Ok(snapshot) => {
        let snapshot = Arc::new(snapshot);
        let mut current = self.status.write();
        *current = snapshot.clone();
        self.events.emit(VlcEvent::StatusUpdated(snapshot));
        self.events.emit(VlcEvent::PropertyChanged("status"));
        CommandOutcome::Updated
      }
      Err(e) => {
        log::warn!("Failed to parse VLC status: {}", e);
        CommandOutcome::MalformedResponse
      }
    }
  }

  /// Send a command; VLC replies with the resulting status.
  pub async fn execute(&self, command: VlcCommand) -> CommandOutcome {
    log::debug!("VLC command: {:?}", command);
    self.send_command(Some(&command.to_query())).await
  }

  /// Refresh the status without sending a command.
  pub async fn update_status(&self) -> CommandOutcome {
    self.send_command(None).await
  }

  /// List a directory on the VLC host. `None` lists the user's home.
  pub async fn get_directory_contents(
    &self,
    location: Option<&str>,
  ) -> Result<Vec<DirectoryItem>, VlcError> {
    let location = location.unwrap_or(DEFAULT_BROWSE_LOCATION);
    let url = format!("{}requests/browse.xml?dir={}", self.base_url, encode(location));

    let body = self.fetch(&url).await?;
    let items = DirectoryItem::list_from_xml(&body)?;

    self.events.emit(VlcEvent::DirectoryUpdated(items.clone()));
    Ok(items)
  }

  /// Fetch the playlist tree, optionally filtered by a search term.
  pub async fn get_playlist(&self, search: Option<&str>) -> Result<Vec<PlaylistNode>, VlcError> {
    let mut url = format!("{}requests/playlist.xml?search=", self.base_url);
    if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
      url.push_str(&encode(term));
    }

    let body = self.fetch(&url).await?;
    let nodes = PlaylistNode::list_from_xml(&body)?;

    self.events.emit(VlcEvent::PlaylistUpdated(nodes.clone()));
    Ok(nodes)
  }

  /// GET a document body, failing on any non-success status.
  async fn fetch(&self, url: &str) -> Result<String, VlcError> {
    let response = match self.http.get(url).send().await {
      Ok(response) => response,
      Err(e) => {
        self.set_connected(false);
        return Err(e.into());
      }
    };

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
      self.set_connected(false);
      return Err(VlcError::Unauthorized);
    }
    self.set_connected(true);

    if !status.is_success() {
      log::warn!("GET {} failed with HTTP {}", url, status);
      return Err(VlcError::HttpStatus(status));
    }

    Ok(response.text().await?)
  }

  fn set_connected(&self, connected: bool) {
    let next = if connected {
      ConnectionState::Connected
    } else {
      ConnectionState::Disconnected
    };

    // Emit under the lock so listeners see flips in the order they happened.
    let mut state = self.connection.write();
    if *state == next {
      return;
    }
    *state = next;

    log::info!(
      "VLC at {} is now {}",
      self.base_url,
      if connected { "connected" } else { "disconnected" }
    );
    self.events.emit(VlcEvent::ConnectionChanged(connected));
    self.events.emit(VlcEvent::PropertyChanged("connection_state"));
  }

  // ==========================================================================
  // Playback
  // ==========================================================================

  /// Play the last active item, or the first one.
  pub async fn play(&self) -> CommandOutcome {
    self.execute(VlcCommand::Play(None)).await
  }

  /// Play a playlist item by id.
  pub async fn play_item(&self, id: u32) -> CommandOutcome {
    self.execute(VlcCommand::Play(Some(id))).await
  }

  /// Toggle pause.
  pub async fn pause(&self) -> CommandOutcome {
    self.execute(VlcCommand::Pause(None)).await
  }

  /// Toggle pause, starting `id` if stopped.
  pub async fn pause_item(&self, id: u32) -> CommandOutcome {
    self.execute(VlcCommand::Pause(Some(id))).await
  }

  pub async fn force_pause(&self) -> CommandOutcome {
    self.execute(VlcCommand::ForcePause).await
  }

  pub async fn force_resume(&self) -> CommandOutcome {
    self.execute(VlcCommand::ForceResume).await
  }

  pub async fn stop(&self) -> CommandOutcome {
    self.execute(VlcCommand::Stop).await
  }

  pub async fn next(&self) -> CommandOutcome {
    self.execute(VlcCommand::Next).await
  }

  pub async fn previous(&self) -> CommandOutcome {
    self.execute(VlcCommand::Previous).await
  }

  pub async fn toggle_fullscreen(&self) -> CommandOutcome {
    self.execute(VlcCommand::ToggleFullscreen).await
  }

  /// Save a snapshot of the current video frame on the VLC host.
  pub async fn take_snapshot(&self) -> CommandOutcome {
    self.execute(VlcCommand::Snapshot).await
  }

  /// Jump to a title of the current item.
  pub async fn play_title(&self, num: u32) -> CommandOutcome {
    self.execute(VlcCommand::Title(num)).await
  }

  /// Jump to a chapter of the current item.
  pub async fn play_chapter(&self, num: u32) -> CommandOutcome {
    self.execute(VlcCommand::Chapter(num)).await
  }

  // ==========================================================================
  // Playlist
  // ==========================================================================

  pub async fn delete(&self, id: u32) -> CommandOutcome {
    self.execute(VlcCommand::Delete(id)).await
  }

  pub async fn clear_playlist(&self) -> CommandOutcome {
    self.execute(VlcCommand::EmptyPlaylist).await
  }

  pub async fn toggle_random(&self) -> CommandOutcome {
    self.execute(VlcCommand::ToggleRandom).await
  }

  pub async fn toggle_loop(&self) -> CommandOutcome {
    self.execute(VlcCommand::ToggleLoop).await
  }

  pub async fn toggle_repeat(&self) -> CommandOutcome {
    self.execute(VlcCommand::ToggleRepeat).await
  }

  pub async fn sort_playlist(&self, key: SortKey, order: SortOrder) -> CommandOutcome {
    self.execute(VlcCommand::Sort { key, order }).await
  }

  /// Add `input` to the playlist and start it.
  pub async fn play_input(&self, input: &str, name: Option<&str>, mode: AddMode) -> CommandOutcome {
    self
      .execute(VlcCommand::play_input(input, name.map(str::to_string), mode))
      .await
  }

  /// Add `input` to the end of the playlist.
  pub async fn enqueue(&self, input: &str, name: Option<&str>, mode: AddMode) -> CommandOutcome {
    self
      .execute(VlcCommand::enqueue(input, name.map(str::to_string), mode))
      .await
  }

  // ==========================================================================
  // Volume and position
  // ==========================================================================

  /// Absolute volume, 0-300. Out-of-range values are left to VLC.
  pub async fn set_volume(&self, volume: i64) -> CommandOutcome {
    self.execute(VlcCommand::Volume(Adjustment::Absolute(volume))).await
  }

  pub async fn set_relative_volume(&self, delta: i64) -> CommandOutcome {
    self.execute(VlcCommand::Volume(Adjustment::Relative(delta))).await
  }

  pub async fn set_percentage_volume(&self, percent: i64) -> CommandOutcome {
    self.execute(VlcCommand::Volume(Adjustment::Percent(percent))).await
  }

  pub async fn set_relative_percentage_volume(&self, delta: i64) -> CommandOutcome {
    self
      .execute(VlcCommand::Volume(Adjustment::RelativePercent(delta)))
      .await
  }

  /// Seek to an absolute position in seconds.
  pub async fn set_position(&self, secs: i64) -> CommandOutcome {
    self.execute(VlcCommand::Seek(Adjustment::Absolute(secs))).await
  }

  pub async fn set_relative_position(&self, delta_secs: i64) -> CommandOutcome {
    self.execute(VlcCommand::Seek(Adjustment::Relative(delta_secs))).await
  }

  pub async fn set_percentage_position(&self, percent: i64) -> CommandOutcome {
    self.execute(VlcCommand::Seek(Adjustment::Percent(percent))).await
  }

  pub async fn set_relative_percentage_position(&self, delta: i64) -> CommandOutcome {
    self
      .execute(VlcCommand::Seek(Adjustment::RelativePercent(delta)))
      .await
  }

  pub async fn set_rate(&self, rate: f64) -> CommandOutcome {
    self.execute(VlcCommand::Rate(rate)).await
  }

  // ==========================================================================
  // Audio, video and subtitles
  // ==========================================================================

  pub async fn set_audio_delay(&self, secs: f64) -> CommandOutcome {
    self.execute(VlcCommand::AudioDelay(secs)).await
  }

  pub async fn set_subtitle_delay(&self, secs: f64) -> CommandOutcome {
    self.execute(VlcCommand::SubtitleDelay(secs)).await
  }

  pub async fn set_aspect_ratio(&self, ratio: AspectRatio) -> CommandOutcome {
    self.execute(VlcCommand::AspectRatio(ratio)).await
  }

  /// Pre-amp in dB, clamped to [-20, 20].
  pub async fn set_preamp(&self, db: i32) -> CommandOutcome {
    self.execute(VlcCommand::PreAmp(db)).await
  }

  pub async fn enable_equalizer(&self) -> CommandOutcome {
    self.execute(VlcCommand::EnableEqualizer(true)).await
  }

  pub async fn disable_equalizer(&self) -> CommandOutcome {
    self.execute(VlcCommand::EnableEqualizer(false)).await
  }

  pub async fn set_equalizer_preset(&self, preset_id: u32) -> CommandOutcome {
    self.execute(VlcCommand::EqualizerPreset(preset_id)).await
  }

  pub async fn set_equalizer_band(&self, band: u32, value: f64) -> CommandOutcome {
    self.execute(VlcCommand::EqualizerBand { band, value }).await
  }

  pub async fn set_audio_track(&self, stream_id: i64) -> CommandOutcome {
    self.execute(VlcCommand::AudioTrack(stream_id)).await
  }

  pub async fn set_video_track(&self, stream_id: i64) -> CommandOutcome {
    self.execute(VlcCommand::VideoTrack(stream_id)).await
  }

  pub async fn set_subtitle_track(&self, stream_id: i64) -> CommandOutcome {
    self.execute(VlcCommand::SubtitleTrack(stream_id)).await
  }

  /// Load a subtitle file (path on the VLC host) for the current item.
  pub async fn add_subtitle(&self, path: &str) -> CommandOutcome {
    self.execute(VlcCommand::AddSubtitle(path.to_string())).await
  }
}

impl Pollable for VlcClient {
  async fn on_poll(&self, _cancel: &CancellationToken) -> Result<(), VlcError> {
    self.update_status().await.into_result()
  }
}
