//! # meloview - Page controllers for the Melo client
//!
//! Each view owns the state one page renders, publishes it through a
//! `ValueCell` and turns user actions into accessor calls:
//!
//! - `HistoryView`: public history list, sorted, numbered and enriched with
//!   one user lookup per row; a newer load supersedes an older one
//! - `MusicView`: the user's tracks, upload/delete, preferred track and the
//!   player
//! - `SettingsView`: account settings and headshot, reloaded on sign-in
//!
//! Views never fail: accessor results come back as `Fetched` and the state
//! keeps the last good value, or an empty one.

pub mod config_ext;
pub mod history;
pub mod music;
pub mod settings;
pub mod upload;

pub use config_ext::{HistoryOrder, ViewConfigExt};
pub use history::{parse_timestamp, sort_entries, HistoryRow, HistoryState, HistoryView};
pub use music::{MusicState, MusicView};
pub use settings::{SettingsState, SettingsView};
pub use upload::{encode_file, music_upload_from_path, split_file_name};
