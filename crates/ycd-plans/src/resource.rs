//! Countable quota categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A resource kind a plan puts a quota on.
///
/// The set is closed: adding a kind means touching the catalog and every
/// display table, which the exhaustive matches below enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Cleaned-up transcript downloads
    CleanTranscripts,
    /// Raw transcript downloads with timestamps
    UncleanTranscripts,
    /// Audio-only downloads
    AudioDownloads,
    /// Video downloads
    VideoDownloads,
}

impl ResourceKind {
    /// All resource kinds in display order.
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::CleanTranscripts,
        ResourceKind::UncleanTranscripts,
        ResourceKind::AudioDownloads,
        ResourceKind::VideoDownloads,
    ];

    /// Wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::CleanTranscripts => "clean_transcripts",
            ResourceKind::UncleanTranscripts => "unclean_transcripts",
            ResourceKind::AudioDownloads => "audio_downloads",
            ResourceKind::VideoDownloads => "video_downloads",
        }
    }

    /// Display name for the resource.
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::CleanTranscripts => "Clean Transcripts",
            ResourceKind::UncleanTranscripts => "Unclean Transcripts",
            ResourceKind::AudioDownloads => "Audio Downloads",
            ResourceKind::VideoDownloads => "Video Downloads",
        }
    }

    /// Short name for compact display.
    pub fn short_name(&self) -> &'static str {
        match self {
            ResourceKind::CleanTranscripts => "Clean",
            ResourceKind::UncleanTranscripts => "Unclean",
            ResourceKind::AudioDownloads => "Audio",
            ResourceKind::VideoDownloads => "Video",
        }
    }

    /// Parse a wire identifier. Accepts a few legacy spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "clean_transcripts" | "clean" => Some(ResourceKind::CleanTranscripts),
            "unclean_transcripts" | "unclean" => Some(ResourceKind::UncleanTranscripts),
            "audio_downloads" | "audio" => Some(ResourceKind::AudioDownloads),
            "video_downloads" | "video" => Some(ResourceKind::VideoDownloads),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
