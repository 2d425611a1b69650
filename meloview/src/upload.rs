//! Building upload bodies from local files

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use meloapi::MusicUpload;
use std::path::Path;
use tracing::debug;

/// Split `name.ext` into its title and extension
///
/// Returns `None` for names without an extension. The title may be empty
/// (`.mp3`): the backend decides whether that is acceptable.
pub fn split_file_name(name: &str) -> Option<(String, String)> {
    let (title, extension) = name.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }
    Some((title.to_string(), extension.to_string()))
}

/// Read a file and return its content base64 encoded
pub async fn encode_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    debug!(path = %path.display(), size = bytes.len(), "Encoding file");
    Ok(STANDARD.encode(bytes))
}

/// Upload body for a music file: title and extension come from the file name
pub async fn music_upload_from_path(path: &Path) -> Result<MusicUpload> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid file name: {}", path.display()))?;
    let (title, extension) =
        split_file_name(name).ok_or_else(|| anyhow!("Invalid file name: {}", name))?;
    Ok(MusicUpload {
        music: encode_file(path).await?,
        title,
        extension,
    })
}
