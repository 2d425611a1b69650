//! Data models for the Melo backend
//!
//! Two shapes exist for every resource: the wire shape (`wire` module),
//! matching the JSON the backend speaks field for field, and the internal
//! shape used by the rest of the client. `From` conversions go both ways.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Flexible deserializer for ids that may come as strings or integers
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(Error::custom("ID must be a string or number")),
    }
}

/// Missing, `null` and `""` all mean "no URL"
fn deserialize_optional_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|s| !s.is_empty()))
}

/// A track in the user's library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Music {
    pub id: String,
    pub title: String,
    /// Object key in the backing bucket
    pub storage_key: String,
    /// Short-lived pre-signed URL, opaque to the client
    pub presigned_url: Option<String>,
}

/// Account settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub email: String,
    pub username: String,
    /// Id of the track the user picked as favourite; empty when unset
    pub preferred_music_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headshot {
    pub image_url: String,
}

/// One processed upload, as listed on the history page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub storage_key: String,
    /// Raw timestamp as sent by the backend
    pub last_modified: String,
    pub presigned_url: Option<String>,
    /// Result document, passed through untouched
    pub results: Value,
}

impl HistoryEntry {
    /// Subject id of the user the result belongs to, when the payload names one
    pub fn subject_id(&self) -> Option<&str> {
        self.results
            .get("user_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Body of a music upload
///
/// No validation happens client side: an empty title is sent as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicUpload {
    /// File content, base64 encoded
    pub music: String,
    pub title: String,
    /// File extension without the dot (`mp3`, `flac`, ...)
    pub extension: String,
}

/// JSON shapes exchanged with the backend
pub mod wire {
    use super::*;

    /// Every response wraps its payload in `{ "data": ... }`
    #[derive(Debug, Deserialize, Serialize)]
    pub struct Envelope<T> {
        pub data: T,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MusicWire {
        #[serde(deserialize_with = "deserialize_id")]
        pub music_id: String,
        pub title: String,
        pub s3_key: String,
        #[serde(
            default,
            deserialize_with = "deserialize_optional_url",
            skip_serializing_if = "Option::is_none"
        )]
        pub presigned_url: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MusicListWire {
        pub music_list: Vec<MusicWire>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserSettingsWire {
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub username: String,
        #[serde(default)]
        pub music_id: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct HeadshotWire {
        pub image_url: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct HeadshotUploadWire {
        pub image: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct DecodedWire {
        pub s3_key: String,
        pub last_modified: String,
        #[serde(
            default,
            deserialize_with = "deserialize_optional_url",
            skip_serializing_if = "Option::is_none"
        )]
        pub presigned_url: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct HistoryEntryWire {
        pub decoded: DecodedWire,
        #[serde(default)]
        pub results: Value,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct HistoryListWire {
        pub history_list: Vec<HistoryEntryWire>,
    }
}

use wire::*;

impl From<MusicWire> for Music {
    fn from(w: MusicWire) -> Self {
        Self {
            id: w.music_id,
            title: w.title,
            storage_key: w.s3_key,
            presigned_url: w.presigned_url,
        }
    }
}

impl From<Music> for MusicWire {
    fn from(m: Music) -> Self {
        Self {
            music_id: m.id,
            title: m.title,
            s3_key: m.storage_key,
            presigned_url: m.presigned_url,
        }
    }
}

impl From<UserSettingsWire> for UserSettings {
    fn from(w: UserSettingsWire) -> Self {
        Self {
            email: w.email,
            username: w.username,
            preferred_music_id: w.music_id,
        }
    }
}

impl From<UserSettings> for UserSettingsWire {
    fn from(s: UserSettings) -> Self {
        Self {
            email: s.email,
            username: s.username,
            music_id: s.preferred_music_id,
        }
    }
}

impl From<HeadshotWire> for Headshot {
    fn from(w: HeadshotWire) -> Self {
        Self {
            image_url: w.image_url,
        }
    }
}

impl From<Headshot> for HeadshotWire {
    fn from(h: Headshot) -> Self {
        Self {
            image_url: h.image_url,
        }
    }
}

impl From<HistoryEntryWire> for HistoryEntry {
    fn from(w: HistoryEntryWire) -> Self {
        Self {
            storage_key: w.decoded.s3_key,
            last_modified: w.decoded.last_modified,
            presigned_url: w.decoded.presigned_url,
            results: w.results,
        }
    }
}

impl From<HistoryEntry> for HistoryEntryWire {
    fn from(h: HistoryEntry) -> Self {
        Self {
            decoded: DecodedWire {
                s3_key: h.storage_key,
                last_modified: h.last_modified,
                presigned_url: h.presigned_url,
            },
            results: h.results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire_roundtrip<W, I>(raw: Value)
    where
        W: serde::de::DeserializeOwned + Serialize + From<I>,
        I: From<W>,
    {
        let wire: W = serde_json::from_value(raw.clone()).unwrap();
        let internal = I::from(wire);
        let back = serde_json::to_value(W::from(internal)).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_music_without_presigned_url() {
        let wire: MusicWire =
            serde_json::from_value(json!({"music_id": "1", "title": "A", "s3_key": "a.mp3"}))
                .unwrap();
        assert_eq!(
            Music::from(wire),
            Music {
                id: "1".into(),
                title: "A".into(),
                storage_key: "a.mp3".into(),
                presigned_url: None,
            }
        );
    }

    #[test]
    fn test_empty_presigned_url_is_none() {
        let wire: MusicWire = serde_json::from_value(
            json!({"music_id": 12, "title": "B", "s3_key": "b.mp3", "presigned_url": ""}),
        )
        .unwrap();
        let music = Music::from(wire);
        assert_eq!(music.id, "12");
        assert_eq!(music.presigned_url, None);
    }

    #[test]
    fn test_music_roundtrip() {
        wire_roundtrip::<MusicWire, Music>(
            json!({"music_id": "1", "title": "A", "s3_key": "a.mp3"}),
        );
        wire_roundtrip::<MusicWire, Music>(json!({
            "music_id": "2", "title": "", "s3_key": "b.flac",
            "presigned_url": "https://bucket/b.flac?sig=x"
        }));
    }

    #[test]
    fn test_user_settings_roundtrip_and_rename() {
        let raw = json!({"email": "a@b.c", "username": "alice", "music_id": "7"});
        wire_roundtrip::<UserSettingsWire, UserSettings>(raw.clone());

        let settings = UserSettings::from(serde_json::from_value::<UserSettingsWire>(raw).unwrap());
        assert_eq!(settings.preferred_music_id, "7");
    }

    #[test]
    fn test_headshot_roundtrip() {
        wire_roundtrip::<HeadshotWire, Headshot>(json!({"image_url": "https://img/x.png"}));
    }

    #[test]
    fn test_history_roundtrip_and_flattening() {
        let raw = json!({
            "decoded": {
                "s3_key": "uploads/1.wav",
                "last_modified": "2024-05-01T10:00:00Z",
                "presigned_url": "https://bucket/1.wav"
            },
            "results": {"user_id": "sub-1", "label": "jazz"}
        });
        wire_roundtrip::<HistoryEntryWire, HistoryEntry>(raw.clone());

        let entry = HistoryEntry::from(serde_json::from_value::<HistoryEntryWire>(raw).unwrap());
        assert_eq!(entry.storage_key, "uploads/1.wav");
        assert_eq!(entry.subject_id(), Some("sub-1"));
    }

    #[test]
    fn test_history_without_url_or_subject() {
        let raw = json!({
            "decoded": {"s3_key": "k", "last_modified": "2024-01-01T00:00:00Z"},
            "results": null
        });
        wire_roundtrip::<HistoryEntryWire, HistoryEntry>(raw.clone());
        let entry = HistoryEntry::from(serde_json::from_value::<HistoryEntryWire>(raw).unwrap());
        assert_eq!(entry.presigned_url, None);
        assert_eq!(entry.subject_id(), None);
    }

    #[test]
    fn test_upload_keeps_empty_title() {
        let body = serde_json::to_value(MusicUpload {
            music: "AAAA".into(),
            title: String::new(),
            extension: "mp3".into(),
        })
        .unwrap();
        assert_eq!(body, json!({"music": "AAAA", "title": "", "extension": "mp3"}));
    }
}
