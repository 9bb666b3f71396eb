//! Media type detection for file attachments

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Coarse media type of a file, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Audio,
    Video,
    Pdf,
    Text,
    Other,
}

impl MediaType {
    /// Detect the media type from a filename or file slug
    pub fn from_filename(filename: &str) -> Self {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "avif" | "bmp" => MediaType::Image,
            "mp3" | "wav" | "flac" | "ogg" | "opus" | "m4a" | "aac" => MediaType::Audio,
            "mp4" | "webm" | "mkv" | "mov" | "avi" => MediaType::Video,
            "pdf" => MediaType::Pdf,
            "txt" | "md" | "subtext" | "csv" | "json" | "xml" | "html" | "js" | "ts" | "rs" => {
                MediaType::Text
            }
            _ => MediaType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Audio => "audio",
            MediaType::Video => "video",
            MediaType::Pdf => "pdf",
            MediaType::Text => "text",
            MediaType::Other => "other",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaType::Image),
            "audio" => Ok(MediaType::Audio),
            "video" => Ok(MediaType::Video),
            "pdf" => Ok(MediaType::Pdf),
            "text" => Ok(MediaType::Text),
            "other" => Ok(MediaType::Other),
            other => Err(format!("unknown media type: {other}")),
        }
    }
}
