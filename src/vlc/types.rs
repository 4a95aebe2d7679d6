//! VLC HTTP interface types.
//!
//! These types mirror the `status.xml`, `playlist.xml` and `browse.xml`
//! documents. XML names are only used when deserializing; serializing (for
//! handing snapshots to a UI, say) uses camelCase field names.

use std::fmt;
use std::str::FromStr;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::{Deserialize, Deserializer, Serialize};

use super::error::VlcError;

/// Scalars in VLC documents are often empty or oddly formatted. Anything that
/// does not parse falls back to the default instead of failing the document.
mod lenient {
  use std::str::FromStr;

  use serde::{Deserialize, Deserializer};

  pub fn parse<'de, D, T>(deserializer: D) -> Result<T, D::Error>
  where
    D: Deserializer<'de>,
    T: FromStr + Default,
  {
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().parse().unwrap_or_default())
  }

  pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
  where
    D: Deserializer<'de>,
  {
    let raw = String::deserialize(deserializer)?;
    Ok(matches!(
      raw.trim().to_ascii_lowercase().as_str(),
      "true" | "1" | "yes"
    ))
  }
}

/// Fail unless the document's root element is `expected`.
fn expect_root(xml: &str, expected: &str) -> Result<(), VlcError> {
  let mut reader = Reader::from_str(xml);
  loop {
    match reader.read_event() {
      Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        return if name == expected {
          Ok(())
        } else {
          Err(VlcError::UnexpectedDocument(format!(
            "expected <{}>, found <{}>",
            expected, name
          )))
        };
      }
      Ok(Event::Eof) => {
        return Err(VlcError::UnexpectedDocument(format!(
          "expected <{}>, found no element",
          expected
        )))
      }
      Ok(_) => {}
      Err(e) => {
        return Err(VlcError::UnexpectedDocument(format!("unreadable XML: {}", e)));
      }
    }
  }
}

// ============================================================================
// Status
// ============================================================================

/// Playback state reported by VLC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
  #[default]
  Stopped,
  Paused,
  Playing,
}

impl FromStr for PlaybackState {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "stopped" => Ok(Self::Stopped),
      "paused" => Ok(Self::Paused),
      "playing" => Ok(Self::Playing),
      _ => Err(()),
    }
  }
}

/// Video aspect ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
  #[default]
  #[serde(rename = "default")]
  Default,
  #[serde(rename = "1:1")]
  Ratio1x1,
  #[serde(rename = "4:3")]
  Ratio4x3,
  #[serde(rename = "5:4")]
  Ratio5x4,
  #[serde(rename = "16:9")]
  Ratio16x9,
  #[serde(rename = "16:10")]
  Ratio16x10,
  #[serde(rename = "221:100")]
  Ratio221x100,
  #[serde(rename = "235:100")]
  Ratio235x100,
  #[serde(rename = "239:100")]
  Ratio239x100,
}

impl AspectRatio {
  /// Value VLC uses for this ratio in queries and status documents.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Default => "default",
      Self::Ratio1x1 => "1:1",
      Self::Ratio4x3 => "4:3",
      Self::Ratio5x4 => "5:4",
      Self::Ratio16x9 => "16:9",
      Self::Ratio16x10 => "16:10",
      Self::Ratio221x100 => "221:100",
      Self::Ratio235x100 => "235:100",
      Self::Ratio239x100 => "239:100",
    }
  }
}

impl FromStr for AspectRatio {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "default" => Ok(Self::Default),
      "1:1" => Ok(Self::Ratio1x1),
      "4:3" => Ok(Self::Ratio4x3),
      "5:4" => Ok(Self::Ratio5x4),
      "16:9" => Ok(Self::Ratio16x9),
      "16:10" => Ok(Self::Ratio16x10),
      "221:100" => Ok(Self::Ratio221x100),
      "235:100" => Ok(Self::Ratio235x100),
      "239:100" => Ok(Self::Ratio239x100),
      _ => Err(()),
    }
  }
}

impl fmt::Display for AspectRatio {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Player and current item state, as returned by `requests/status.xml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct VlcStatus {
  /// VLC version string.
  #[serde(default)]
  pub version: String,

  #[serde(rename(deserialize = "apiversion"), default, deserialize_with = "lenient::parse")]
  pub api_version: u32,

  /// Playlist id of the current item, -1 when there is none.
  #[serde(rename(deserialize = "currentplid"), default, deserialize_with = "lenient::parse")]
  pub current_playlist_id: i64,

  /// Playback position in seconds.
  #[serde(default, deserialize_with = "lenient::parse")]
  pub time: i64,

  /// Length of the current item in seconds.
  #[serde(default, deserialize_with = "lenient::parse")]
  pub length: i64,

  #[serde(rename(deserialize = "aspectratio"), default, deserialize_with = "lenient::parse")]
  pub aspect_ratio: AspectRatio,

  #[serde(rename(deserialize = "fullscreen"), default, deserialize_with = "lenient::flag")]
  pub is_fullscreen: bool,

  /// Volume, 0-300 in the UI's terms (256 = 100%).
  #[serde(default, deserialize_with = "lenient::parse")]
  pub volume: i64,

  #[serde(default, deserialize_with = "lenient::parse")]
  pub state: PlaybackState,

  #[serde(default, deserialize_with = "lenient::parse")]
  pub rate: f64,

  /// Playback position as a fraction of the length.
  #[serde(default, deserialize_with = "lenient::parse")]
  pub position: f64,

  /// Whether the playlist loops.
  #[serde(rename(deserialize = "loop"), default, deserialize_with = "lenient::flag")]
  pub is_looping: bool,

  /// Whether the current item repeats.
  #[serde(rename(deserialize = "repeat"), default, deserialize_with = "lenient::flag")]
  pub is_repeating: bool,

  #[serde(rename(deserialize = "random"), default, deserialize_with = "lenient::flag")]
  pub is_random: bool,

  /// Audio delay in seconds.
  #[serde(rename(deserialize = "audiodelay"), default, deserialize_with = "lenient::parse")]
  pub audio_delay: f64,

  /// Subtitle delay in seconds.
  #[serde(rename(deserialize = "subtitledelay"), default, deserialize_with = "lenient::parse")]
  pub subtitle_delay: f64,

  #[serde(rename(deserialize = "videoeffects"), default)]
  pub video_effects: VideoEffects,

  #[serde(default)]
  pub equalizer: Equalizer,

  #[serde(rename(deserialize = "stats"), default)]
  pub statistics: Statistics,

  #[serde(default)]
  pub information: Information,
}

impl VlcStatus {
  /// Parse a `status.xml` document.
  pub fn from_xml(xml: &str) -> Result<Self, VlcError> {
    expect_root(xml, "root")?;
    Ok(quick_xml::de::from_str(xml)?)
  }

  /// Information category by name (e.g. `meta`, `Stream 0`).
  pub fn category(&self, name: &str) -> Option<&Category> {
    self.information.categories.iter().find(|c| c.name == name)
  }

  /// The `meta` category: title, artist, filename and so on.
  pub fn meta(&self) -> Option<&Category> {
    self.category("meta")
  }

  /// Display title of the current item.
  pub fn title(&self) -> Option<&str> {
    let meta = self.meta()?;
    meta.get("title").or_else(|| meta.get("filename"))
  }

  /// Per-stream categories (everything except `meta`).
  pub fn streams(&self) -> impl Iterator<Item = &Category> {
    self.information.categories.iter().filter(|c| c.name != "meta")
  }
}

/// Video adjustments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoEffects {
  /// 0-360.
  #[serde(default, deserialize_with = "lenient::parse")]
  pub hue: i64,
  #[serde(default, deserialize_with = "lenient::parse")]
  pub contrast: f64,
  #[serde(default, deserialize_with = "lenient::parse")]
  pub brightness: f64,
  #[serde(default, deserialize_with = "lenient::parse")]
  pub saturation: f64,
  #[serde(default, deserialize_with = "lenient::parse")]
  pub gamma: f64,
}

/// Audio equalizer, only populated while it is enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equalizer {
  /// Pre-amplification in dB.
  #[serde(default, deserialize_with = "lenient::parse")]
  pub preamp: f64,
  #[serde(default, deserialize_with = "unwrap_bands")]
  pub bands: Vec<EqualizerBand>,
  #[serde(default, deserialize_with = "unwrap_presets")]
  pub presets: Vec<EqualizerPreset>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EqualizerBand {
  #[serde(rename(deserialize = "@id"), default, deserialize_with = "lenient::parse")]
  pub id: u32,
  /// Gain in dB.
  #[serde(rename(deserialize = "$text"), default, deserialize_with = "lenient::parse")]
  pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EqualizerPreset {
  #[serde(rename(deserialize = "@id"), default, deserialize_with = "lenient::parse")]
  pub id: u32,
  #[serde(rename(deserialize = "$text"), default)]
  pub name: String,
}

fn unwrap_bands<'de, D>(deserializer: D) -> Result<Vec<EqualizerBand>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  struct Bands {
    #[serde(default)]
    band: Vec<EqualizerBand>,
  }
  Ok(Bands::deserialize(deserializer)?.band)
}

fn unwrap_presets<'de, D>(deserializer: D) -> Result<Vec<EqualizerPreset>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  struct Presets {
    #[serde(default)]
    preset: Vec<EqualizerPreset>,
  }
  Ok(Presets::deserialize(deserializer)?.preset)
}

/// Decoder and input counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Statistics {
  #[serde(rename(deserialize = "playedabuffers"), default, deserialize_with = "lenient::parse")]
  pub played_audio_buffers: i64,
  #[serde(rename(deserialize = "lostabuffers"), default, deserialize_with = "lenient::parse")]
  pub lost_audio_buffers: i64,
  #[serde(rename(deserialize = "displayedpictures"), default, deserialize_with = "lenient::parse")]
  pub displayed_pictures: i64,
  #[serde(rename(deserialize = "lostpictures"), default, deserialize_with = "lenient::parse")]
  pub lost_pictures: i64,
  #[serde(rename(deserialize = "readpackets"), default, deserialize_with = "lenient::parse")]
  pub read_packets: i64,
  #[serde(rename(deserialize = "demuxreadpackets"), default, deserialize_with = "lenient::parse")]
  pub demux_read_packets: i64,
  #[serde(rename(deserialize = "demuxreadbytes"), default, deserialize_with = "lenient::parse")]
  pub demux_read_bytes: i64,
  #[serde(rename(deserialize = "demuxbitrate"), default, deserialize_with = "lenient::parse")]
  pub demux_bitrate: f64,
  #[serde(rename(deserialize = "averagedemuxbitrate"), default, deserialize_with = "lenient::parse")]
  pub average_demux_bitrate: f64,
  #[serde(rename(deserialize = "demuxcorrupted"), default, deserialize_with = "lenient::parse")]
  pub demux_corrupted: i64,
  #[serde(rename(deserialize = "demuxdiscontinuity"), default, deserialize_with = "lenient::parse")]
  pub demux_discontinuity: i64,
  #[serde(rename(deserialize = "sendbitrate"), default, deserialize_with = "lenient::parse")]
  pub send_bitrate: f64,
  #[serde(rename(deserialize = "sentbytes"), default, deserialize_with = "lenient::parse")]
  pub sent_bytes: i64,
  #[serde(rename(deserialize = "readbytes"), default, deserialize_with = "lenient::parse")]
  pub read_bytes: i64,
  #[serde(rename(deserialize = "sentpackets"), default, deserialize_with = "lenient::parse")]
  pub sent_packets: i64,
  #[serde(rename(deserialize = "averageinputbitrate"), default, deserialize_with = "lenient::parse")]
  pub average_input_bitrate: f64,
  #[serde(rename(deserialize = "inputbitrate"), default, deserialize_with = "lenient::parse")]
  pub input_bitrate: f64,
  #[serde(rename(deserialize = "decodedvideo"), default, deserialize_with = "lenient::parse")]
  pub decoded_video: i64,
  #[serde(rename(deserialize = "decodedaudio"), default, deserialize_with = "lenient::parse")]
  pub decoded_audio: i64,
}

/// Metadata and stream descriptions for the current item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Information {
  #[serde(rename(deserialize = "category"), default)]
  pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
  #[serde(rename(deserialize = "@name"), default)]
  pub name: String,
  #[serde(rename(deserialize = "info"), default)]
  pub infos: Vec<Info>,
}

impl Category {
  /// Value of the named entry in this category.
  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .infos
      .iter()
      .find(|info| info.name == name)
      .map(|info| info.value.as_str())
  }
}

/// One key/value pair of a [`Category`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
  #[serde(rename(deserialize = "@name"), default)]
  pub name: String,
  #[serde(rename(deserialize = "$text"), default)]
  pub value: String,
}

// ============================================================================
// Playlist
// ============================================================================

/// Folder in the playlist tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistNode {
  #[serde(rename(deserialize = "@id"), default, deserialize_with = "lenient::parse")]
  pub id: u32,
  #[serde(rename(deserialize = "@name"), default)]
  pub name: String,
  /// `ro` for read-only nodes, `rw` otherwise.
  #[serde(rename(deserialize = "@ro"), default)]
  pub ro: String,
  #[serde(rename(deserialize = "node"), default)]
  pub nodes: Vec<PlaylistNode>,
  #[serde(rename(deserialize = "leaf"), default)]
  pub leaves: Vec<PlaylistLeaf>,
}

impl PlaylistNode {
  /// Parse a `playlist.xml` document into its top-level nodes.
  pub fn list_from_xml(xml: &str) -> Result<Vec<PlaylistNode>, VlcError> {
    expect_root(xml, "node")?;
    let root: PlaylistNode = quick_xml::de::from_str(xml)?;
    Ok(root.nodes)
  }

  /// All leaves under this node, depth first.
  pub fn iter_leaves(&self) -> Box<dyn Iterator<Item = &PlaylistLeaf> + '_> {
    Box::new(
      self
        .leaves
        .iter()
        .chain(self.nodes.iter().flat_map(|node| node.iter_leaves())),
    )
  }

  /// The leaf VLC marks as current, if it is under this node.
  pub fn find_current(&self) -> Option<&PlaylistLeaf> {
    self.iter_leaves().find(|leaf| leaf.is_current())
  }
}

/// Media item in the playlist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistLeaf {
  #[serde(rename(deserialize = "@id"), default, deserialize_with = "lenient::parse")]
  pub id: u32,
  #[serde(rename(deserialize = "@name"), default)]
  pub name: String,
  /// Media URI, usable with the enqueue commands.
  #[serde(rename(deserialize = "@uri"), default)]
  pub uri: String,
  /// Duration in seconds, -1 when unknown.
  #[serde(rename(deserialize = "@duration"), default, deserialize_with = "lenient::parse")]
  pub duration: i64,
  /// Set to `current` on the item being played.
  #[serde(rename(deserialize = "@current"), default)]
  pub current: Option<String>,
  #[serde(rename(deserialize = "@ro"), default)]
  pub ro: String,
}

impl PlaylistLeaf {
  pub fn is_current(&self) -> bool {
    self.current.as_deref() == Some("current")
  }
}

// ============================================================================
// Directory browsing
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryItemType {
  Dir,
  #[default]
  File,
}

impl FromStr for DirectoryItemType {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "dir" => Ok(Self::Dir),
      "file" => Ok(Self::File),
      _ => Err(()),
    }
  }
}

/// Entry of a `browse.xml` listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct DirectoryItem {
  #[serde(rename(deserialize = "@type"), default, deserialize_with = "lenient::parse")]
  pub item_type: DirectoryItemType,
  /// Path on the VLC host.
  #[serde(rename(deserialize = "@path"), default)]
  pub path: String,
  /// URI usable with the enqueue commands.
  #[serde(rename(deserialize = "@uri"), default)]
  pub uri: String,
  #[serde(rename(deserialize = "@name"), default)]
  pub name: String,
  /// Size in bytes.
  #[serde(rename(deserialize = "@size"), default, deserialize_with = "lenient::parse")]
  pub size: u64,
  #[serde(rename(deserialize = "@access_time"), default, deserialize_with = "lenient::parse")]
  pub access_time: i64,
  #[serde(rename(deserialize = "@creation_time"), default, deserialize_with = "lenient::parse")]
  pub creation_time: i64,
  #[serde(rename(deserialize = "@modification_time"), default, deserialize_with = "lenient::parse")]
  pub modification_time: i64,
  #[serde(rename(deserialize = "@uid"), default, deserialize_with = "lenient::parse")]
  pub uid: u32,
  #[serde(rename(deserialize = "@gid"), default, deserialize_with = "lenient::parse")]
  pub gid: u32,
  /// Unix permission bits.
  #[serde(rename(deserialize = "@mode"), default, deserialize_with = "lenient::parse")]
  pub mode: u32,
}

impl DirectoryItem {
  /// Parse a `browse.xml` document.
  pub fn list_from_xml(xml: &str) -> Result<Vec<DirectoryItem>, VlcError> {
    #[derive(Deserialize)]
    struct Listing {
      #[serde(default)]
      element: Vec<DirectoryItem>,
    }

    expect_root(xml, "root")?;
    let listing: Listing = quick_xml::de::from_str(xml)?;
    Ok(listing.element)
  }

  pub fn is_dir(&self) -> bool {
    self.item_type == DirectoryItemType::Dir
  }
}
