//! Batch job items and the per-item result cell projection.
//!
//! A batch job turns a list of video URLs into transcripts and media files.
//! The batch service reports one [`BatchJobItem`] per video; this module
//! projects an item onto [`BatchCellView`], the view model a result cell
//! renders. The projection is stateless: a new item value yields a new view.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{PlanError, Result};

/// Placeholder shown for items with nothing useful to display.
pub const PLACEHOLDER: &str = "—";

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Processing state of one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BatchStatus {
    /// Waiting for a worker
    Queued,
    /// Being processed
    Processing,
    /// Finished, files available
    Completed,
    /// Finished with an error
    Failed,
    /// Anything the service sent that we do not recognise
    Unknown(String),
}

impl BatchStatus {
    /// Parse a wire status (case-insensitive).
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "queued" | "pending" => BatchStatus::Queued,
            "processing" | "running" => BatchStatus::Processing,
            "completed" | "complete" | "done" => BatchStatus::Completed,
            "failed" | "error" => BatchStatus::Failed,
            _ => BatchStatus::Unknown(s.to_string()),
        }
    }

    /// Wire identifier.
    pub fn as_str(&self) -> &str {
        match self {
            BatchStatus::Queued => "queued",
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
            BatchStatus::Unknown(raw) => raw,
        }
    }

    /// Completed and failed are final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Failed)
    }

    /// Icon for the status.
    pub fn icon(&self) -> &'static str {
        match self {
            BatchStatus::Queued => "⏳",
            BatchStatus::Processing => "⚙",
            BatchStatus::Completed => "✔",
            BatchStatus::Failed => "✖",
            BatchStatus::Unknown(_) => PLACEHOLDER,
        }
    }

    /// Label for the status.
    pub fn label(&self) -> &'static str {
        match self {
            BatchStatus::Queued => "Queued",
            BatchStatus::Processing => "Processing",
            BatchStatus::Completed => "Completed",
            BatchStatus::Failed => "Failed",
            BatchStatus::Unknown(_) => "Unknown",
        }
    }
}

impl Default for BatchStatus {
    fn default() -> Self {
        BatchStatus::Unknown(String::new())
    }
}

impl From<String> for BatchStatus {
    fn from(value: String) -> Self {
        BatchStatus::parse(&value)
    }
}

impl From<BatchStatus> for String {
    fn from(value: BatchStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of download link a completed item may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Transcript file
    Transcript,
    /// In-browser viewer
    View,
    /// Audio file
    Audio,
    /// Video file
    Video,
    /// Direct media URL
    Direct,
}

impl LinkKind {
    /// All link kinds in display order.
    pub const ALL: [LinkKind; 5] = [
        LinkKind::Transcript,
        LinkKind::View,
        LinkKind::Audio,
        LinkKind::Video,
        LinkKind::Direct,
    ];

    /// Parse a wire key.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "transcript" => Some(LinkKind::Transcript),
            "view" => Some(LinkKind::View),
            "audio" => Some(LinkKind::Audio),
            "video" => Some(LinkKind::Video),
            "direct" => Some(LinkKind::Direct),
            _ => None,
        }
    }

    /// Wire key.
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Transcript => "transcript",
            LinkKind::View => "view",
            LinkKind::Audio => "audio",
            LinkKind::Video => "video",
            LinkKind::Direct => "direct",
        }
    }

    /// Button label.
    pub fn label(&self) -> &'static str {
        match self {
            LinkKind::Transcript => "Transcript",
            LinkKind::View => "View",
            LinkKind::Audio => "Audio",
            LinkKind::Video => "Video",
            LinkKind::Direct => "Direct",
        }
    }

    /// Icon for the link.
    pub fn icon(&self) -> &'static str {
        match self {
            LinkKind::Transcript => "📄",
            LinkKind::View => "👁",
            LinkKind::Audio => "🎵",
            LinkKind::Video => "🎬",
            LinkKind::Direct => "🔗",
        }
    }
}

/// One item of a batch job as reported by the batch service.
///
/// Deserialization never fails: a field that is null or of the wrong type
/// reads as absent, and a missing or unreadable status becomes
/// [`BatchStatus::Unknown`], so the item still gets a row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BatchJobItem {
    /// Video identifier, if the service reports one
    pub video_id: Option<String>,
    /// Source URL submitted by the user
    pub url: Option<String>,
    /// Processing state
    pub status: BatchStatus,
    /// Progress or failure message
    pub message: Option<String>,
    /// Download links keyed by link kind; unknown keys are kept but not shown
    pub download_links: Option<BTreeMap<String, String>>,
    /// Size of the produced file in bytes
    pub file_size: Option<u64>,
    /// Title of the video
    pub video_title: Option<String>,
}

impl<'de> Deserialize<'de> for BatchJobItem {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(|value| BatchJobItem::from_value(&value))
    }
}

impl BatchJobItem {
    /// Item in a given state.
    pub fn new(status: BatchStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Set the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Add a download link.
    pub fn with_link(mut self, kind: LinkKind, url: impl Into<String>) -> Self {
        self.download_links
            .get_or_insert_with(BTreeMap::new)
            .insert(kind.as_str().to_string(), url.into());
        self
    }

    /// Set file size and title.
    pub fn with_file(mut self, file_size: u64, video_title: impl Into<String>) -> Self {
        self.file_size = Some(file_size);
        self.video_title = Some(video_title.into());
        self
    }

    /// Build an item from one entry of a batch snapshot.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            debug!(entry = %value, "batch entry is not an object");
            return Self::default();
        };

        Self {
            video_id: parse_text(object.get("video_id")),
            url: parse_text(object.get("url")),
            status: parse_status(object.get("status")),
            message: parse_text(object.get("message")),
            download_links: parse_links(object.get("download_links")),
            file_size: parse_file_size(object.get("file_size")),
            video_title: parse_text(object.get("video_title")),
        }
    }

    /// Recognised, non-empty links in display order.
    pub fn links(&self) -> Vec<DownloadLink> {
        let Some(links) = &self.download_links else {
            return Vec::new();
        };

        let mut typed: BTreeMap<LinkKind, String> = BTreeMap::new();
        for (key, url) in links {
            match LinkKind::parse(key) {
                Some(kind) if !url.trim().is_empty() => {
                    typed.insert(kind, url.clone());
                }
                Some(_) => {}
                None => debug!(key = key.as_str(), "ignoring unknown download link kind"),
            }
        }

        typed
            .into_iter()
            .map(|(kind, url)| DownloadLink { kind, url })
            .collect()
    }
}

/// Parse a batch snapshot: either a JSON array of items or `{"items": [...]}`.
///
/// Every entry yields an item; entries that cannot be read render as the
/// placeholder rather than disappearing from the batch.
pub fn parse_batch(content: &str) -> Result<Vec<BatchJobItem>> {
    let value: Value = serde_json::from_str(content)?;
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("items").or_else(|| object.remove("results")) {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(PlanError::InvalidSnapshot(
                    "batch object has no items array".to_string(),
                ));
            }
        },
        _ => {
            return Err(PlanError::InvalidSnapshot(
                "batch must be an array or an object with items".to_string(),
            ));
        }
    };

    Ok(entries.iter().map(BatchJobItem::from_value).collect())
}

fn parse_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => None,
        other => {
            debug!(value = %other, "ignoring non-text batch field");
            None
        }
    }
}

fn parse_status(value: Option<&Value>) -> BatchStatus {
    match value {
        Some(Value::String(s)) => BatchStatus::parse(s),
        None | Some(Value::Null) => BatchStatus::default(),
        Some(other) => BatchStatus::Unknown(other.to_string()),
    }
}

fn parse_links(value: Option<&Value>) -> Option<BTreeMap<String, String>> {
    let object = value?.as_object()?;
    Some(
        object
            .iter()
            .filter_map(|(key, url)| match url {
                Value::String(url) => Some((key.clone(), url.clone())),
                Value::Null => None,
                other => {
                    debug!(key = key.as_str(), value = %other, "ignoring non-string download link");
                    None
                }
            })
            .collect(),
    )
}

fn parse_file_size(value: Option<&Value>) -> Option<u64> {
    let bytes = match value? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_bytes)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_bytes))
        }
        _ => None,
    };
    if bytes.is_none() {
        debug!("unreadable file size");
    }
    bytes
}

fn whole_bytes(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0).then(|| f.round() as u64)
}

/// Load a batch snapshot file.
pub fn load_batch<P: AsRef<Path>>(path: P) -> Result<Vec<BatchJobItem>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_batch(&content)
}

/// Format a byte count: kilobytes below one megabyte, else megabytes to one decimal.
pub fn format_file_size(bytes: u64) -> String {
    let bytes = bytes as f64;
    if bytes < MIB {
        format!("{:.0}KB", bytes / KIB)
    } else {
        format!("{:.1}MB", bytes / MIB)
    }
}

/// Truncate to at most `max_chars` characters, ending in "..." when cut.
///
/// Limits too short to hold the ellipsis cut the text without one.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 3 {
        return text.chars().take(max_chars).collect();
    }
    let keep = max_chars.saturating_sub(3);
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str("...");
    truncated
}

/// A typed download link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadLink {
    /// Link kind
    pub kind: LinkKind,
    /// Target URL
    pub url: String,
}

/// Truncation lengths used when projecting items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLimits {
    /// Max characters of a video title
    pub title_max_len: usize,
    /// Max characters of a failure message
    pub message_max_len: usize,
}

impl Default for CellLimits {
    fn default() -> Self {
        Self {
            title_max_len: 40,
            message_max_len: 60,
        }
    }
}

/// What a result cell shows for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum BatchCellView {
    /// Queued or processing: icon, label, optional message
    Status {
        status: BatchStatus,
        icon: &'static str,
        label: &'static str,
        message: Option<String>,
    },
    /// Completed with at least one link
    Completed {
        links: Vec<DownloadLink>,
        file_size: Option<String>,
        title: Option<String>,
    },
    /// Failed: marker, optional message, retry affordance
    Failed {
        message: Option<String>,
        retryable: bool,
    },
    /// Nothing to show
    Placeholder,
}

impl BatchCellView {
    /// Project an item onto its cell view.
    pub fn project(item: &BatchJobItem, limits: CellLimits) -> Self {
        match &item.status {
            BatchStatus::Queued | BatchStatus::Processing => BatchCellView::Status {
                status: item.status.clone(),
                icon: item.status.icon(),
                label: item.status.label(),
                message: item.message.clone().filter(|m| !m.trim().is_empty()),
            },
            BatchStatus::Completed => {
                let links = item.links();
                if links.is_empty() {
                    return BatchCellView::Placeholder;
                }
                BatchCellView::Completed {
                    links,
                    file_size: item.file_size.map(format_file_size),
                    title: item
                        .video_title
                        .as_deref()
                        .filter(|t| !t.trim().is_empty())
                        .map(|t| truncate_text(t, limits.title_max_len)),
                }
            }
            BatchStatus::Failed => BatchCellView::Failed {
                message: item
                    .message
                    .as_deref()
                    .filter(|m| !m.trim().is_empty())
                    .map(|m| truncate_text(m, limits.message_max_len)),
                retryable: true,
            },
            BatchStatus::Unknown(raw) => {
                debug!(status = raw.as_str(), "unrecognised batch status");
                BatchCellView::Placeholder
            }
        }
    }

    /// Returns true for the placeholder view.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, BatchCellView::Placeholder)
    }
}

/// Per-status counts for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BatchSummary {
    /// Number of items
    pub total: usize,
    /// Waiting
    pub queued: usize,
    /// In progress
    pub processing: usize,
    /// Done
    pub completed: usize,
    /// Errored
    pub failed: usize,
    /// Unrecognised status
    pub unknown: usize,
}

impl BatchSummary {
    /// Count items per status.
    pub fn from_items(items: &[BatchJobItem]) -> Self {
        let mut summary = Self {
            total: items.len(),
            ..Default::default()
        };
        for item in items {
            match item.status {
                BatchStatus::Queued => summary.queued += 1,
                BatchStatus::Processing => summary.processing += 1,
                BatchStatus::Completed => summary.completed += 1,
                BatchStatus::Failed => summary.failed += 1,
                BatchStatus::Unknown(_) => summary.unknown += 1,
            }
        }
        summary
    }

    /// Every item is completed or failed.
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed + self.failed == self.total
    }

    /// Percent of items in a terminal state.
    pub fn percent_done(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (((self.completed + self.failed) as f64 / self.total as f64) * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(500 * 1024), "500KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2.0MB");
        assert_eq!(format_file_size(1024 * 1024 + 512 * 1024), "1.5MB");
        assert_eq!(format_file_size(0), "0KB");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("exactly ten", 11), "exactly ten");
        assert_eq!(truncate_text("A very long video title", 10), "A very ...");
        assert_eq!(truncate_text("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_truncate_below_ellipsis_width_stays_within_limit() {
        assert_eq!(truncate_text("abcdef", 3), "abc");
        assert_eq!(truncate_text("abcdef", 2), "ab");
        assert_eq!(truncate_text("abcdef", 0), "");
        assert_eq!(truncate_text("ab", 2), "ab");
    }

    #[test]
    fn test_null_and_odd_typed_fields_keep_every_item() {
        let items = parse_batch(
            r#"[
                {"status": "completed", "download_links": {"transcript": "https://t", "audio": null}},
                {"status": null},
                {"status": "completed", "file_size": 1536.0, "download_links": {"video": "https://v"}},
                {"status": "queued"}
            ]"#,
        )
        .unwrap();
        assert_eq!(items.len(), 4);

        let links = items[0].links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].kind, LinkKind::Transcript);

        assert_eq!(items[1].status, BatchStatus::default());
        assert!(BatchCellView::project(&items[1], CellLimits::default()).is_placeholder());

        assert_eq!(items[2].file_size, Some(1536));
        assert_eq!(items[3].status, BatchStatus::Queued);
    }

    #[test]
    fn test_odd_typed_fields_read_leniently() {
        let item: BatchJobItem = serde_json::from_str(
            r#"{"status": 3, "video_id": 42, "file_size": "2048", "message": ["x"], "download_links": "none"}"#,
        )
        .unwrap();
        assert_eq!(item.status, BatchStatus::Unknown("3".to_string()));
        assert_eq!(item.video_id.as_deref(), Some("42"));
        assert_eq!(item.file_size, Some(2048));
        assert_eq!(item.message, None);
        assert_eq!(item.download_links, None);

        let item: BatchJobItem = serde_json::from_str(r#"{"file_size": -5}"#).unwrap();
        assert_eq!(item.file_size, None);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(BatchStatus::parse("QUEUED"), BatchStatus::Queued);
        assert_eq!(BatchStatus::parse("done"), BatchStatus::Completed);
        assert_eq!(
            BatchStatus::parse("paused"),
            BatchStatus::Unknown("paused".to_string())
        );
        assert!(BatchStatus::Failed.is_terminal());
        assert!(!BatchStatus::Processing.is_terminal());
    }

    #[test]
    fn test_queued_and_processing_project_to_status_row() {
        let queued = BatchJobItem::new(BatchStatus::Queued).with_message("Waiting for worker");
        match BatchCellView::project(&queued, CellLimits::default()) {
            BatchCellView::Status { label, message, .. } => {
                assert_eq!(label, "Queued");
                assert_eq!(message.as_deref(), Some("Waiting for worker"));
            }
            other => panic!("unexpected view: {other:?}"),
        }

        let processing = BatchJobItem::new(BatchStatus::Processing);
        let view = BatchCellView::project(&processing, CellLimits::default());
        assert!(matches!(
            view,
            BatchCellView::Status { icon: "⚙", message: None, .. }
        ));
    }

    #[test]
    fn test_completed_projects_links_in_order() {
        let item = BatchJobItem::new(BatchStatus::Completed)
            .with_link(LinkKind::Video, "https://cdn/v.mp4")
            .with_link(LinkKind::Transcript, "https://cdn/t.txt")
            .with_file(3 * 1024 * 1024, "How to build a compiler in a weekend, part one");

        match BatchCellView::project(&item, CellLimits::default()) {
            BatchCellView::Completed {
                links,
                file_size,
                title,
            } => {
                let kinds: Vec<_> = links.iter().map(|l| l.kind).collect();
                assert_eq!(kinds, vec![LinkKind::Transcript, LinkKind::Video]);
                assert_eq!(file_size.as_deref(), Some("3.0MB"));
                assert_eq!(title.as_deref().map(|t| t.chars().count()), Some(40));
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_completed_without_links_is_placeholder() {
        let item: BatchJobItem = serde_json::from_str(r#"{"status": "completed"}"#).unwrap();
        assert!(BatchCellView::project(&item, CellLimits::default()).is_placeholder());

        let item: BatchJobItem = serde_json::from_str(
            r#"{"status": "completed", "download_links": {"torrent": "magnet:?", "audio": ""}}"#,
        )
        .unwrap();
        assert!(BatchCellView::project(&item, CellLimits::default()).is_placeholder());
    }

    #[test]
    fn test_failed_projects_retry() {
        let item = BatchJobItem::new(BatchStatus::Failed)
            .with_message("Video is private or has been removed by the uploader");
        let limits = CellLimits {
            title_max_len: 40,
            message_max_len: 20,
        };
        match BatchCellView::project(&item, limits) {
            BatchCellView::Failed { message, retryable } => {
                assert!(retryable);
                assert_eq!(message.as_deref(), Some("Video is private ..."));
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_status_is_placeholder() {
        let item: BatchJobItem = serde_json::from_str(r#"{"status": "exploded"}"#).unwrap();
        assert_eq!(item.status, BatchStatus::Unknown("exploded".to_string()));
        assert!(BatchCellView::project(&item, CellLimits::default()).is_placeholder());

        let item: BatchJobItem = serde_json::from_str("{}").unwrap();
        assert!(BatchCellView::project(&item, CellLimits::default()).is_placeholder());
    }

    #[test]
    fn test_parse_batch_shapes() {
        let items = parse_batch(r#"[{"status": "queued"}, {"status": "failed"}]"#).unwrap();
        assert_eq!(items.len(), 2);

        let items = parse_batch(r#"{"items": [{"status": "completed"}, 42]}"#).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1], BatchJobItem::default());

        assert!(parse_batch(r#"{"jobs": []}"#).is_err());
        assert!(parse_batch("\"nope\"").is_err());
    }

    #[test]
    fn test_summary() {
        let items = vec![
            BatchJobItem::new(BatchStatus::Completed),
            BatchJobItem::new(BatchStatus::Failed),
            BatchJobItem::new(BatchStatus::Processing),
            BatchJobItem::new(BatchStatus::parse("weird")),
        ];
        let summary = BatchSummary::from_items(&items);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.unknown, 1);
        assert!(!summary.is_finished());
        assert_eq!(summary.percent_done(), 50);

        let done = BatchSummary::from_items(&items[..2]);
        assert!(done.is_finished());
        assert!(!BatchSummary::default().is_finished());
    }
}
