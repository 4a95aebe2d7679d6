//! Commands understood by `requests/status.xml`.
//!
//! Every command is a query string starting with `command=`. VLC answers each
//! one with a fresh status document.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::types::AspectRatio;

/// Everything except RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'-')
  .remove(b'_')
  .remove(b'.')
  .remove(b'~');

/// Percent-encode a query value.
pub(crate) fn encode(value: &str) -> String {
  utf8_percent_encode(value, COMPONENT).to_string()
}

/// How a volume or seek value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
  /// Absolute value (volume 0-300, seek in seconds).
  Absolute(i64),
  /// Added to the current value.
  Relative(i64),
  /// Percentage of the full range.
  Percent(i64),
  /// Percentage added to the current value.
  RelativePercent(i64),
}

impl Adjustment {
  fn to_query_value(self) -> String {
    match self {
      Self::Absolute(v) => v.to_string(),
      Self::Relative(v) => signed(v),
      Self::Percent(v) => format!("{}%25", v),
      Self::RelativePercent(v) => format!("{}%25", signed(v)),
    }
  }
}

/// `+` has to be escaped or VLC reads it as a space.
fn signed(v: i64) -> String {
  if v > 0 {
    format!("%2B{}", v)
  } else {
    v.to_string()
  }
}

/// Playlist sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
  Id,
  Title,
  TitleNodesFirst,
  Artist,
  Genre,
  Random,
  Duration,
  TitleNumeric,
  Album,
}

impl SortKey {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Id => "id",
      Self::Title => "title",
      Self::TitleNodesFirst => "title nodes first",
      Self::Artist => "artist",
      Self::Genre => "genre",
      Self::Random => "random",
      Self::Duration => "duration",
      Self::TitleNumeric => "title numeric",
      Self::Album => "album",
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
  #[default]
  Ascending,
  Descending,
}

impl SortOrder {
  fn id(self) -> u8 {
    match self {
      Self::Ascending => 0,
      Self::Descending => 1,
    }
  }
}

/// Which tracks of an enqueued item VLC should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddMode {
  #[default]
  Default,
  NoAudio,
  NoVideo,
}

/// A command for the VLC HTTP interface.
#[derive(Debug, Clone, PartialEq)]
pub enum VlcCommand {
  /// Play the given playlist item, or resume the last active one.
  Play(Option<u32>),
  /// Toggle pause, optionally starting the given item when stopped.
  Pause(Option<u32>),
  ForcePause,
  ForceResume,
  Stop,
  Next,
  Previous,
  /// Remove a playlist item.
  Delete(u32),
  /// Clear the playlist.
  EmptyPlaylist,
  ToggleRandom,
  ToggleLoop,
  ToggleRepeat,
  ToggleFullscreen,
  Snapshot,
  Volume(Adjustment),
  Sort { key: SortKey, order: SortOrder },
  Seek(Adjustment),
  /// Playback rate, 1.0 is normal speed.
  Rate(f64),
  /// Audio delay in seconds.
  AudioDelay(f64),
  /// Subtitle delay in seconds.
  SubtitleDelay(f64),
  AspectRatio(AspectRatio),
  /// Equalizer pre-amp in dB, clamped to [-20, 20].
  PreAmp(i32),
  EnableEqualizer(bool),
  /// Equalizer preset by id, as listed in the status document.
  EqualizerPreset(u32),
  /// Gain in dB for one equalizer band.
  EqualizerBand { band: u32, value: f64 },
  /// Stream ids come from the status document's stream categories.
  AudioTrack(i64),
  VideoTrack(i64),
  SubtitleTrack(i64),
  /// Load a subtitle file for the current item.
  AddSubtitle(String),
  /// Add an item to the playlist, starting it right away when `play` is set.
  Enqueue {
    input: String,
    name: Option<String>,
    mode: AddMode,
    play: bool,
  },
  Title(u32),
  Chapter(u32),
}

impl VlcCommand {
  /// Add an item and start playing it.
  pub fn play_input(input: impl Into<String>, name: Option<String>, mode: AddMode) -> Self {
    Self::Enqueue {
      input: input.into(),
      name,
      mode,
      play: true,
    }
  }

  /// Add an item without interrupting playback.
  pub fn enqueue(input: impl Into<String>, name: Option<String>, mode: AddMode) -> Self {
    Self::Enqueue {
      input: input.into(),
      name,
      mode,
      play: false,
    }
  }

  /// Query string for `requests/status.xml`.
  pub fn to_query(&self) -> String {
    match self {
      Self::Play(None) => "command=pl_play".to_string(),
      Self::Play(Some(id)) => format!("command=pl_play&id={}", id),
      Self::Pause(None) => "command=pl_pause".to_string(),
      Self::Pause(Some(id)) => format!("command=pl_pause&id={}", id),
      Self::ForcePause => "command=pl_forcepause".to_string(),
      Self::ForceResume => "command=pl_forceresume".to_string(),
      Self::Stop => "command=pl_stop".to_string(),
      Self::Next => "command=pl_next".to_string(),
      Self::Previous => "command=pl_previous".to_string(),
      Self::Delete(id) => format!("command=pl_delete&id={}", id),
      Self::EmptyPlaylist => "command=pl_empty".to_string(),
      Self::ToggleRandom => "command=pl_random".to_string(),
      Self::ToggleLoop => "command=pl_loop".to_string(),
      Self::ToggleRepeat => "command=pl_repeat".to_string(),
      Self::ToggleFullscreen => "command=fullscreen".to_string(),
      Self::Snapshot => "command=snapshot".to_string(),
      Self::Volume(adjustment) => format!("command=volume&val={}", adjustment.to_query_value()),
      Self::Sort { key, order } => format!(
        "command=pl_sort&val={}&id={}",
        encode(key.as_str()),
        order.id()
      ),
      Self::Seek(adjustment) => format!("command=seek&val={}", adjustment.to_query_value()),
      Self::Rate(rate) => format!("command=rate&val={}", rate),
      Self::AudioDelay(secs) => format!("command=audiodelay&val={}", secs),
      Self::SubtitleDelay(secs) => format!("command=subdelay&val={}", secs),
      Self::AspectRatio(ratio) => format!("command=aspectratio&val={}", encode(ratio.as_str())),
      Self::PreAmp(db) => format!("command=preamp&val={}", (*db).clamp(-20, 20)),
      Self::EnableEqualizer(true) => "command=enableeq".to_string(),
      Self::EnableEqualizer(false) => "command=enableeq&val=0".to_string(),
      Self::EqualizerPreset(id) => format!("command=setpreset&val={}", id),
      Self::EqualizerBand { band, value } => {
        format!("command=equalizer&band={}&val={}", band, value)
      }
      Self::AudioTrack(id) => format!("command=audio_track&val={}", id),
      Self::VideoTrack(id) => format!("command=video_track&val={}", id),
      Self::SubtitleTrack(id) => format!("command=subtitle_track&val={}", id),
      Self::AddSubtitle(path) => format!("command=addsubtitle&val={}", encode(path)),
      Self::Enqueue {
        input,
        name,
        mode,
        play,
      } => {
        let mut query = format!(
          "command={}&input={}",
          if *play { "in_play" } else { "in_enqueue" },
          encode(input)
        );
        if let Some(name) = name.as_deref().filter(|n| !n.is_empty()) {
          query.push_str("&name=");
          query.push_str(&encode(name));
        }
        match mode {
          AddMode::Default => {}
          AddMode::NoAudio => query.push_str("&option=noaudio"),
          AddMode::NoVideo => query.push_str("&option=novideo"),
        }
        query
      }
      Self::Title(num) => format!("command=title&val={}", num),
      Self::Chapter(num) => format!("command=chapter&val={}", num),
    }
  }
}
