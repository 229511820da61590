//! Spooling uploaded audio to disk and fixing up its MIME type

use std::path::Path;

use axum::extract::Multipart;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::vendor::AudioUpload;
use crate::{Error, Result};

/// MIME types the vendor accepts for batch transcription
pub const ALLOWED_AUDIO_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/mpeg3",
    "audio/x-mpeg-3",
    "audio/x-mp3",
    "audio/wav",
    "audio/x-wav",
    "audio/wave",
    "audio/aac",
    "audio/x-aac",
    "audio/aiff",
    "audio/x-aiff",
    "audio/ogg",
    "audio/opus",
    "audio/flac",
    "audio/x-flac",
    "audio/mp4",
    "audio/x-m4a",
    "audio/amr",
    "audio/x-ms-wma",
    "audio/webm",
    "video/webm",
];

/// Pick the MIME type to send upstream
///
/// Allowed types pass through. Otherwise the file extension decides; an
/// unknown extension is an error rather than a guess.
///
/// # Errors
///
/// Returns [`Error::Upload`] if no supported type can be determined
pub fn resolve_mime(reported: &str, file_name: &str) -> Result<String> {
    if ALLOWED_AUDIO_TYPES.contains(&reported) {
        return Ok(reported.to_string());
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let corrected = match extension.as_deref() {
        Some("wav") => "audio/wav",
        Some("webm") => "audio/webm",
        Some("mp3") => "audio/mp3",
        _ => return Err(Error::Upload(format!("unsupported audio type: {reported}"))),
    };

    tracing::warn!(reported, corrected, file_name, "correcting upload mimetype");
    Ok(corrected.to_string())
}

/// An uploaded file held in a temp file until the vendor call finishes
///
/// The temp file is removed when this value is dropped or [`remove`]d.
///
/// [`remove`]: SpooledUpload::remove
#[derive(Debug)]
pub struct SpooledUpload {
    file: NamedTempFile,
    file_name: String,
    mime: String,
    size: u64,
}

impl SpooledUpload {
    /// Vendor-facing description of the upload
    #[must_use]
    pub fn audio(&self) -> AudioUpload {
        AudioUpload {
            path: self.file.path().to_path_buf(),
            file_name: self.file_name.clone(),
            mime: self.mime.clone(),
        }
    }

    /// Bytes written to disk
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Delete the temp file now, logging rather than failing on error
    pub fn remove(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove temp upload");
        } else {
            tracing::debug!(path = %path.display(), "removed temp upload");
        }
    }
}

/// Spool the multipart field named `field` to a temp file
///
/// Returns `Ok(None)` when the form has no such field. Other fields are
/// skipped.
///
/// # Errors
///
/// Returns [`Error::Upload`] if the form is malformed or the file type is
/// unsupported, and [`Error::Io`] if the temp file cannot be written
pub async fn spool_field(multipart: &mut Multipart, field: &str) -> Result<Option<SpooledUpload>> {
    while let Some(mut part) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Upload(e.body_text()))?
    {
        if part.name() != Some(field) {
            continue;
        }

        let file_name = part.file_name().unwrap_or("audio").to_string();
        let reported = part
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let mime = resolve_mime(&reported, &file_name)?;

        let file = tempfile::Builder::new().prefix("debate-upload-").tempfile()?;
        let mut out = tokio::fs::File::from_std(file.reopen()?);
        let mut size = 0u64;
        while let Some(chunk) = part
            .chunk()
            .await
            .map_err(|e| Error::Upload(e.body_text()))?
        {
            out.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        out.flush().await?;

        tracing::debug!(file_name = %file_name, mime = %mime, size, "spooled upload");
        return Ok(Some(SpooledUpload {
            file,
            file_name,
            mime,
            size,
        }));
    }

    Ok(None)
}
