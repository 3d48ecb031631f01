//! Video comments extraction
//!
//! Fetches comments through `--write-comments`, projects them into a stable schema,
//! keeps the serialized response under the configured character limit by dropping
//! trailing comments, and maps yt-dlp failures to actionable messages.

use std::fmt::Write;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{cookie_args, Configuration};
use crate::runner::YtdlpRunner;
use crate::tools::validate_url;
use crate::utils::{format_thousands, truncate_str};

/// Default cap for `ytdlp_get_video_comments`
pub const DEFAULT_MAX_COMMENTS: usize = 20;
/// Default cap for `ytdlp_get_video_comments_summary`
pub const DEFAULT_SUMMARY_COMMENTS: usize = 10;

/// Parent id of top-level comments
const ROOT_PARENT: &str = "root";
const SUMMARY_TEXT_LIMIT: usize = 300;

/// Comment ordering requested from the extractor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentSort {
    /// Most liked first
    #[default]
    Top,
    /// Newest first
    New,
}

impl CommentSort {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::New => "new",
        }
    }
}

/// Keep a field only when it has the expected JSON type
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// A single comment; absent or mistyped source fields stay absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub author_is_uploader: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub author_is_verified: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub like_count: Option<Number>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub is_favorited: Option<bool>,
    /// Parent comment id, or `"root"` for top-level comments
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Unix seconds
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Number>,
    /// Human readable age, e.g. "2 days ago"
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub time_text: Option<String>,
}

/// Response returned by `ytdlp_get_video_comments`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentsResponse {
    pub count: usize,
    pub has_more: bool,
    pub comments: Vec<Comment>,
    #[serde(
        rename = "_truncated",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub truncated: Option<bool>,
    #[serde(rename = "_message", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Only the part of the metadata document this module reads
#[derive(Debug, Deserialize)]
struct CommentsDocument {
    #[serde(default)]
    comments: Option<Vec<Comment>>,
}

/// User-facing comment extraction errors
#[derive(Debug, Error)]
pub enum CommentsError {
    #[error("Invalid or unsupported URL: {url}")]
    InvalidUrl { url: String },
    #[error("Video is unavailable or private: {url}. Check the URL and video privacy settings.")]
    Unavailable { url: String },
    #[error("Unsupported platform or video URL: {url}. Comments extraction is primarily supported for YouTube.")]
    UnsupportedPlatform { url: String },
    #[error("Network error while extracting comments. Check your internet connection and retry.")]
    Network,
    #[error("Comments are disabled for this video: {url}")]
    CommentsDisabled { url: String },
    #[error("This video requires authentication to view comments. Configure cookies in your settings.")]
    AuthenticationRequired,
    #[error("Failed to extract video comments: {message}. Verify the URL is correct.")]
    Extraction { message: String },
    #[error("Failed to extract video comments from {url}")]
    Unknown { url: String },
}

#[derive(Debug, Clone, Copy)]
enum FailureKind {
    Unavailable,
    UnsupportedPlatform,
    Network,
    CommentsDisabled,
    AuthenticationRequired,
}

/// Ordered substring rules, first match wins.
///
/// These are literal fragments of yt-dlp's English messages; a wording change
/// upstream silently falls through to the generic error.
const FAILURE_RULES: &[(&[&str], FailureKind)] = &[
    (&["Video unavailable", "private"], FailureKind::Unavailable),
    (&["Unsupported URL", "extractor"], FailureKind::UnsupportedPlatform),
    (&["network", "Connection"], FailureKind::Network),
    (
        &["comments are disabled", "Comments are turned off"],
        FailureKind::CommentsDisabled,
    ),
    (&["Sign in", "age"], FailureKind::AuthenticationRequired),
];

/// Map a yt-dlp diagnostic to a user-facing error
#[must_use]
pub fn classify_failure(url: &str, diagnostic: &str) -> CommentsError {
    if diagnostic.trim().is_empty() {
        return CommentsError::Unknown {
            url: url.to_string(),
        };
    }

    let kind = FAILURE_RULES.iter().find_map(|(needles, kind)| {
        needles
            .iter()
            .any(|needle| diagnostic.contains(needle))
            .then_some(*kind)
    });

    let url = url.to_string();
    match kind {
        Some(FailureKind::Unavailable) => CommentsError::Unavailable { url },
        Some(FailureKind::UnsupportedPlatform) => CommentsError::UnsupportedPlatform { url },
        Some(FailureKind::Network) => CommentsError::Network,
        Some(FailureKind::CommentsDisabled) => CommentsError::CommentsDisabled { url },
        Some(FailureKind::AuthenticationRequired) => CommentsError::AuthenticationRequired,
        None => CommentsError::Extraction {
            message: diagnostic.trim().to_string(),
        },
    }
}

/// yt-dlp arguments for a comments request
#[must_use]
pub fn comments_args(
    url: &str,
    max_comments: usize,
    sort: CommentSort,
    config: &Configuration,
) -> Vec<String> {
    let mut args: Vec<String> = [
        "--dump-json",
        "--no-warnings",
        "--no-check-certificate",
        "--write-comments",
        "--extractor-args",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    args.push(format!(
        "youtube:comment_sort={};max_comments={max_comments},all,all",
        sort.as_str()
    ));
    args.push("--skip-download".to_string());
    args.extend(cookie_args(config));
    args.push(url.to_string());
    args
}

/// Keep the first `max_comments` comments in source order
fn build_response(document: CommentsDocument, max_comments: usize) -> CommentsResponse {
    let mut comments = document.comments.unwrap_or_default();
    let has_more = comments.len() > max_comments;
    comments.truncate(max_comments);

    CommentsResponse {
        count: comments.len(),
        has_more,
        comments,
        truncated: None,
        message: None,
    }
}

/// Serialize `response`, dropping trailing comments until it fits `character_limit`.
///
/// Never drops the last remaining comment, so the loop runs at most
/// `comments.len() - 1` times and the result may still exceed the limit.
///
/// # Errors
///
/// Returns a `serde_json::Error` if serialization fails.
pub fn serialize_within_limit(
    response: &CommentsResponse,
    character_limit: usize,
) -> Result<String, serde_json::Error> {
    let mut serialized = serde_json::to_string_pretty(response)?;
    let mut kept = response.comments.len();

    while serialized.chars().count() > character_limit && kept > 1 {
        kept -= 1;
        let comments = response.comments[..kept].to_vec();
        let truncated = CommentsResponse {
            count: comments.len(),
            has_more: true,
            comments,
            truncated: Some(true),
            message: Some(format!(
                "Response truncated to {kept} comments due to size limits. \
                 Request fewer comments to see complete results."
            )),
        };
        serialized = serde_json::to_string_pretty(&truncated)?;
    }

    if kept < response.comments.len() {
        debug!(
            original = response.comments.len(),
            kept, "Comments response truncated to fit character limit"
        );
    }

    Ok(serialized)
}

/// Fetch up to `max_comments` comments for `url` as pretty JSON
///
/// # Errors
///
/// Returns `CommentsError::InvalidUrl` without invoking yt-dlp when the URL is
/// rejected; any yt-dlp or parsing failure is classified by [`classify_failure`].
pub async fn get_video_comments(
    runner: &dyn YtdlpRunner,
    config: &Configuration,
    url: &str,
    max_comments: usize,
    sort: CommentSort,
) -> Result<String, CommentsError> {
    if validate_url(url).is_err() {
        return Err(CommentsError::InvalidUrl {
            url: url.to_string(),
        });
    }

    let args = comments_args(url, max_comments, sort, config);
    info!(url = %url, max_comments, sort = sort.as_str(), "Extracting video comments");

    let stdout = runner.run(&args).await.map_err(|e| {
        warn!(url = %url, error = %e, "Comment extraction failed");
        classify_failure(url, &e.diagnostic())
    })?;

    let document: CommentsDocument =
        serde_json::from_str(&stdout).map_err(|e| classify_failure(url, &e.to_string()))?;

    let response = build_response(document, max_comments);
    serialize_within_limit(&response, config.limits.character_limit)
        .map_err(|e| classify_failure(url, &e.to_string()))
}

/// Fetch the top comments for `url` and render them as plain text
///
/// # Errors
///
/// Propagates the error from [`get_video_comments`] unchanged.
pub async fn get_video_comments_summary(
    runner: &dyn YtdlpRunner,
    config: &Configuration,
    url: &str,
    max_comments: usize,
) -> Result<String, CommentsError> {
    let json = get_video_comments(runner, config, url, max_comments, CommentSort::Top).await?;
    let response: CommentsResponse =
        serde_json::from_str(&json).map_err(|e| classify_failure(url, &e.to_string()))?;
    Ok(render_summary(&response))
}

fn author_line(comment: &Comment) -> String {
    let mut line = format!(
        "Author: {}",
        comment.author.as_deref().unwrap_or("Unknown")
    );
    for (flag, tag) in [
        (comment.author_is_uploader, "[UPLOADER]"),
        (comment.author_is_verified, "[VERIFIED]"),
        (comment.is_pinned, "[PINNED]"),
    ] {
        if flag == Some(true) {
            line.push(' ');
            line.push_str(tag);
        }
    }
    if let Some(time) = &comment.time_text {
        let _ = write!(line, " ({time})");
    }
    let likes = comment
        .like_count
        .as_ref()
        .and_then(|n| n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)));
    if let Some(likes) = likes.filter(|likes| *likes > 0) {
        let _ = write!(line, " - {} likes", format_thousands(likes));
    }
    line
}

/// Plain-text rendering of a comments response
#[must_use]
pub fn render_summary(response: &CommentsResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Video Comments ({} shown)", response.count);
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out);

    for comment in &response.comments {
        let _ = writeln!(out, "{}", author_line(comment));
        if let Some(text) = &comment.text {
            if text.chars().count() > SUMMARY_TEXT_LIMIT {
                let _ = writeln!(out, "{}...", truncate_str(text, SUMMARY_TEXT_LIMIT));
            } else {
                let _ = writeln!(out, "{text}");
            }
        }
        if let Some(parent) = comment.parent.as_deref().filter(|p| *p != ROOT_PARENT) {
            let _ = writeln!(out, "  (Reply to comment {parent})");
        }
        let _ = writeln!(out);
    }

    if response.has_more {
        let _ = writeln!(
            out,
            "... More comments available. Increase max_comments to see more."
        );
    }
    out
}
