//! YT-DLP Provider - video platform tools via a local yt-dlp binary
//!
//! Provides tools for video search, metadata extraction, subtitles and transcripts,
//! comments, and media download from YouTube and other platforms.
//!
//! Every call goes through a [`YtdlpRunner`] and carries the cookie arguments
//! derived from the shared [`Configuration`].

use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use super::comments::{self, CommentSort, DEFAULT_MAX_COMMENTS, DEFAULT_SUMMARY_COMMENTS};
use super::subtitles::{clean_transcript, download_subtitles, resolve_language};
use super::{validate_url, ToolDefinition, ToolProvider};
use crate::config::{cookie_args, AudioFormat, Configuration, Resolution};
use crate::runner::YtdlpRunner;
use crate::utils::{format_thousands, sanitize_filename, truncate_str, truncate_with_note};

/// Patterns indicating unrecoverable yt-dlp errors
const FATAL_ERROR_PATTERNS: &[&str] = &[
    "Video unavailable",
    "Private video",
    "This video is private",
    "Sign in to confirm your age",
    "members-only",
    "removed by the uploader",
    "blocked it in your country",
    "ERROR: Unsupported URL",
    "is not a valid URL",
    "HTTP Error 403",
    "HTTP Error 404",
];

/// Patterns indicating transient errors that might be resolved with retry
const RETRYABLE_ERROR_PATTERNS: &[&str] = &[
    "Connection reset",
    "Connection timed out",
    "Unable to download webpage",
    "HTTP Error 429", // Too Many Requests
    "HTTP Error 503", // Service Unavailable
    "Read timed out",
    "Temporary failure in name resolution",
];

fn is_fatal_ytdlp_error(error_msg: &str) -> bool {
    FATAL_ERROR_PATTERNS
        .iter()
        .any(|pattern| error_msg.contains(pattern))
}

fn is_retryable_ytdlp_error(error_msg: &str) -> bool {
    RETRYABLE_ERROR_PATTERNS
        .iter()
        .any(|pattern| error_msg.contains(pattern))
}

const MAX_SEARCH_RESULTS: usize = 50;
const DEFAULT_SEARCH_RESULTS: usize = 10;
const MAX_SEARCH_OFFSET: usize = 1_000;
const MAX_COMMENTS_CAP: usize = 100;
const DESCRIPTION_EXCERPT: usize = 500;
const SUMMARY_TAGS: usize = 10;

const TOOL_NAMES: &[&str] = &[
    "ytdlp_search_videos",
    "ytdlp_get_video_metadata",
    "ytdlp_get_video_metadata_summary",
    "ytdlp_list_subtitle_languages",
    "ytdlp_download_video_subtitles",
    "ytdlp_download_transcript",
    "ytdlp_download_video",
    "ytdlp_download_audio",
    "ytdlp_get_video_comments",
    "ytdlp_get_video_comments_summary",
];

/// Provider for yt-dlp video tools
pub struct YtdlpProvider {
    runner: Arc<dyn YtdlpRunner>,
    config: Arc<Configuration>,
}

impl YtdlpProvider {
    /// Create a provider sharing the process-wide configuration
    #[must_use]
    pub fn new(runner: Arc<dyn YtdlpRunner>, config: Arc<Configuration>) -> Self {
        Self { runner, config }
    }

    /// Execute yt-dlp and turn failures into actionable errors
    async fn exec_ytdlp(&self, args: &[String]) -> Result<String> {
        match self.runner.run(args).await {
            Ok(stdout) => Ok(stdout),
            Err(e) => {
                let error_msg = e.diagnostic();

                if is_fatal_ytdlp_error(&error_msg) {
                    warn!(error = %error_msg, "Fatal yt-dlp error detected");
                    bail!("yt-dlp fatal error: {error_msg}")
                }

                if is_retryable_ytdlp_error(&error_msg) {
                    warn!(error = %error_msg, "Retryable yt-dlp error detected");
                    bail!("Temporary yt-dlp error (a later retry may succeed): {error_msg}")
                }

                bail!("yt-dlp error: {error_msg}")
            }
        }
    }

    /// Build `base + cookie args + url`
    fn with_url(&self, base: &[&str], url: &str) -> Vec<String> {
        let mut args: Vec<String> = base.iter().map(ToString::to_string).collect();
        args.extend(cookie_args(&self.config));
        args.push(url.to_string());
        args
    }

    async fn fetch_metadata(&self, url: &str) -> Result<Value> {
        validate_url(url)?;
        let args = self.with_url(&["--dump-json", "--skip-download", "--no-warnings"], url);
        let output = self.exec_ytdlp(&args).await?;
        serde_json::from_str(&output).context("yt-dlp returned malformed metadata JSON")
    }

    /// Handle ytdlp_search_videos tool
    async fn handle_search_videos(&self, arguments: &str) -> Result<String> {
        let args: SearchVideosArgs = serde_json::from_str(arguments)?;

        let query = args.query.trim();
        if query.is_empty() {
            bail!("Search query must not be empty");
        }
        let max_results = args
            .max_results
            .unwrap_or(DEFAULT_SEARCH_RESULTS)
            .clamp(1, MAX_SEARCH_RESULTS);
        let offset = args.offset.unwrap_or(0);
        if offset > MAX_SEARCH_OFFSET {
            bail!("offset must be at most {MAX_SEARCH_OFFSET}, got {offset}");
        }
        let total = offset + max_results;

        let mut ytdlp_args: Vec<String> = vec![
            "--flat-playlist".into(),
            "--dump-json".into(),
            "--no-warnings".into(),
        ];
        ytdlp_args.extend(cookie_args(&self.config));
        ytdlp_args.push(format!("ytsearch{total}:{query}"));

        let output = self.exec_ytdlp(&ytdlp_args).await?;
        let videos: Vec<SearchResult> = output
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<Value>(line).ok())
            .skip(offset)
            .take(max_results)
            .map(|video| SearchResult::from_json(&video))
            .collect();

        if videos.is_empty() {
            return Ok(format!("No videos found for query: {query}"));
        }

        let rendered = match args.response_format.unwrap_or_default() {
            ResponseFormat::Json => serde_json::to_string_pretty(&json!({
                "query": query,
                "offset": offset,
                "count": videos.len(),
                "results": videos.iter().map(SearchResult::to_json).collect::<Vec<_>>(),
            }))?,
            ResponseFormat::Markdown => render_search_markdown(query, offset, &videos),
        };

        Ok(truncate_with_note(
            &rendered,
            self.config.limits.character_limit,
        ))
    }

    /// Handle ytdlp_get_video_metadata tool
    async fn handle_get_metadata(&self, arguments: &str) -> Result<String> {
        let args: GetMetadataArgs = serde_json::from_str(arguments)?;
        let metadata = self.fetch_metadata(&args.url).await?;

        let selected = match args.fields {
            Some(ref fields) if !fields.is_empty() => select_fields(&metadata, fields),
            _ => metadata,
        };

        let output = serde_json::to_string_pretty(&selected)?;
        let truncated = truncate_with_note(&output, self.config.limits.character_limit);
        Ok(format!("## Video Metadata\n\n```json\n{truncated}\n```"))
    }

    /// Handle ytdlp_get_video_metadata_summary tool
    async fn handle_get_metadata_summary(&self, arguments: &str) -> Result<String> {
        let args: UrlArgs = serde_json::from_str(arguments)?;
        let metadata = self.fetch_metadata(&args.url).await?;
        Ok(truncate_with_note(
            &render_metadata_summary(&metadata),
            self.config.limits.character_limit,
        ))
    }

    /// Handle ytdlp_list_subtitle_languages tool
    async fn handle_list_subtitles(&self, arguments: &str) -> Result<String> {
        let args: UrlArgs = serde_json::from_str(arguments)?;
        validate_url(&args.url)?;

        let ytdlp_args = self.with_url(&["--list-subs", "--skip-download", "--no-warnings"], &args.url);
        let output = self.exec_ytdlp(&ytdlp_args).await?;
        if output.trim().is_empty() {
            return Ok(format!("No subtitle information returned for {}", args.url));
        }
        Ok(truncate_with_note(
            output.trim(),
            self.config.limits.character_limit,
        ))
    }

    /// Handle ytdlp_download_video_subtitles tool
    async fn handle_download_subtitles(&self, arguments: &str) -> Result<String> {
        let args: SubtitleArgs = serde_json::from_str(arguments)?;
        validate_url(&args.url)?;
        let lang = resolve_language(args.language.as_deref(), &self.config)?;

        let subtitles = download_subtitles(self.runner.as_ref(), &self.config, &args.url, &lang).await?;
        Ok(truncate_with_note(
            &subtitles,
            self.config.limits.max_transcript_length,
        ))
    }

    /// Handle ytdlp_download_transcript tool
    async fn handle_download_transcript(&self, arguments: &str) -> Result<String> {
        let args: SubtitleArgs = serde_json::from_str(arguments)?;
        validate_url(&args.url)?;
        let lang = resolve_language(args.language.as_deref(), &self.config)?;

        let subtitles = download_subtitles(self.runner.as_ref(), &self.config, &args.url, &lang).await?;
        let transcript = clean_transcript(&subtitles);
        if transcript.is_empty() {
            return Ok("Transcript is empty or could not be extracted.".to_string());
        }

        let truncated = truncate_with_note(&transcript, self.config.limits.max_transcript_length);
        Ok(format!("## Transcript ({lang})\n\n{truncated}"))
    }

    /// Handle ytdlp_download_video tool
    async fn handle_download_video(&self, arguments: &str) -> Result<String> {
        let args: DownloadVideoArgs = serde_json::from_str(arguments)?;
        validate_url(&args.url)?;

        let resolution = args
            .resolution
            .unwrap_or(self.config.download.default_resolution);
        let mut ytdlp_args: Vec<String> = vec![
            "-f".into(),
            resolution.format_selector().into(),
            "--merge-output-format".into(),
            "mp4".into(),
        ];
        ytdlp_args.extend(self.output_args());
        ytdlp_args.extend(self.with_url(&[], &args.url));

        info!(url = %args.url, resolution = %resolution, "Downloading video");
        let output = self.download(&ytdlp_args).await?;
        let (path, size_bytes) = self.finalize_download(&output).await?;
        Ok(download_report("Video downloaded successfully!", &path, size_bytes))
    }

    /// Handle ytdlp_download_audio tool
    async fn handle_download_audio(&self, arguments: &str) -> Result<String> {
        let args: DownloadAudioArgs = serde_json::from_str(arguments)?;
        validate_url(&args.url)?;

        let format = args
            .format
            .unwrap_or(self.config.download.default_audio_format);
        let mut ytdlp_args: Vec<String> = match format {
            AudioFormat::M4a => vec!["-f".into(), "bestaudio[ext=m4a]/bestaudio".into()],
            AudioFormat::Mp3 => vec![
                "-x".into(),
                "--audio-format".into(),
                "mp3".into(),
                "--audio-quality".into(),
                "0".into(),
            ],
        };
        ytdlp_args.extend(self.output_args());
        ytdlp_args.extend(self.with_url(&[], &args.url));

        info!(url = %args.url, format = %format, "Downloading audio");
        let output = self.download(&ytdlp_args).await?;
        let (path, size_bytes) = self.finalize_download(&output).await?;
        Ok(download_report("Audio extracted successfully!", &path, size_bytes))
    }

    /// Handle ytdlp_get_video_comments tool
    async fn handle_get_comments(&self, arguments: &str) -> Result<String> {
        let args: CommentsArgs = serde_json::from_str(arguments)?;
        let max_comments = args
            .max_comments
            .unwrap_or(DEFAULT_MAX_COMMENTS)
            .clamp(1, MAX_COMMENTS_CAP);

        let json = comments::get_video_comments(
            self.runner.as_ref(),
            &self.config,
            &args.url,
            max_comments,
            args.sort_order.unwrap_or_default(),
        )
        .await?;
        Ok(json)
    }

    /// Handle ytdlp_get_video_comments_summary tool
    async fn handle_get_comments_summary(&self, arguments: &str) -> Result<String> {
        let args: CommentsSummaryArgs = serde_json::from_str(arguments)?;
        let max_comments = args
            .max_comments
            .unwrap_or(DEFAULT_SUMMARY_COMMENTS)
            .clamp(1, MAX_COMMENTS_CAP);

        let summary = comments::get_video_comments_summary(
            self.runner.as_ref(),
            &self.config,
            &args.url,
            max_comments,
        )
        .await?;
        Ok(summary)
    }

    /// Output template in the downloads dir, printing the final path
    fn output_args(&self) -> Vec<String> {
        vec![
            "-o".into(),
            format!(
                "{}/%(title)s [%(id)s].%(ext)s",
                self.config.file.downloads_dir.trim_end_matches('/')
            ),
            "--print".into(),
            "after_move:filepath".into(),
            "--no-progress".into(),
            "--no-warnings".into(),
        ]
    }

    async fn download(&self, args: &[String]) -> Result<String> {
        tokio::fs::create_dir_all(&self.config.file.downloads_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create downloads directory {}",
                    self.config.file.downloads_dir
                )
            })?;
        self.exec_ytdlp(args).await
    }

    /// Rename the file yt-dlp reported to a sanitized name and return its size
    async fn finalize_download(&self, output: &str) -> Result<(PathBuf, u64)> {
        let reported = output
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .context("yt-dlp did not report the downloaded file path")?;

        let path = PathBuf::from(reported);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .context("yt-dlp reported a path without a file name")?;

        let safe_name = sanitize_filename(&file_name, &self.config.file);
        let target = if safe_name == file_name {
            path
        } else {
            let target = path.with_file_name(&safe_name);
            tokio::fs::rename(&path, &target)
                .await
                .with_context(|| format!("Failed to rename {} to {safe_name}", path.display()))?;
            debug!(from = %file_name, to = %safe_name, "Renamed download to sanitized file name");
            target
        };

        let size_bytes = tokio::fs::metadata(&target)
            .await
            .with_context(|| format!("Downloaded file not found: {}", target.display()))?
            .len();
        Ok((target, size_bytes))
    }
}

// ============================================================================
// Output helpers
// ============================================================================

/// One entry of a flat-playlist search
#[derive(Debug, Clone)]
struct SearchResult {
    title: String,
    id: Option<String>,
    url: Option<String>,
    channel: String,
    duration: String,
}

impl SearchResult {
    fn from_json(video: &Value) -> Self {
        let id = video["id"].as_str().map(ToString::to_string);
        let url = video["webpage_url"]
            .as_str()
            .or_else(|| video["url"].as_str())
            .map(ToString::to_string)
            .or_else(|| {
                id.as_ref()
                    .map(|id| format!("https://www.youtube.com/watch?v={id}"))
            });
        let duration = video["duration_string"]
            .as_str()
            .map(ToString::to_string)
            .or_else(|| video["duration"].as_f64().map(format_duration))
            .unwrap_or_else(|| "N/A".to_string());

        Self {
            title: video["title"].as_str().unwrap_or("Unknown").to_string(),
            channel: video["channel"]
                .as_str()
                .or_else(|| video["uploader"].as_str())
                .unwrap_or("Unknown")
                .to_string(),
            id,
            url,
            duration,
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "title": self.title,
            "id": self.id,
            "url": self.url,
            "channel": self.channel,
            "duration": self.duration,
        })
    }
}

fn render_search_markdown(query: &str, offset: usize, videos: &[SearchResult]) -> String {
    let mut results = String::new();
    let _ = writeln!(results, "## Search Results for: {query}\n");

    for (i, video) in videos.iter().enumerate() {
        let _ = writeln!(results, "### {}. {}", offset + i + 1, video.title);
        let _ = writeln!(results, "- **Channel**: {}", video.channel);
        let _ = writeln!(results, "- **Duration**: {}", video.duration);
        if let Some(url) = &video.url {
            let _ = writeln!(results, "- **URL**: {url}");
        }
        let _ = writeln!(results);
    }
    results
}

/// `3725.0` → `1:02:05`, `65.0` → `1:05`
fn format_duration(seconds: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total = seconds.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// `20240131` → `2024-01-31`
fn format_upload_date(raw: &str) -> String {
    if raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..])
    } else {
        raw.to_string()
    }
}

fn select_fields(metadata: &Value, fields: &[String]) -> Value {
    let selected: Map<String, Value> = fields
        .iter()
        .filter_map(|field| {
            metadata
                .get(field)
                .map(|value| (field.clone(), value.clone()))
        })
        .collect();
    Value::Object(selected)
}

fn render_metadata_summary(metadata: &Value) -> String {
    let mut out = String::new();
    let text = |key: &str| metadata[key].as_str().map(ToString::to_string);

    let _ = writeln!(out, "## {}", text("title").unwrap_or_else(|| "Unknown title".into()));
    if let Some(channel) = text("channel").or_else(|| text("uploader")) {
        let _ = writeln!(out, "- **Channel**: {channel}");
    }
    if let Some(duration) = text("duration_string").or_else(|| metadata["duration"].as_f64().map(format_duration)) {
        let _ = writeln!(out, "- **Duration**: {duration}");
    }
    if let Some(views) = metadata["view_count"].as_i64() {
        let _ = writeln!(out, "- **Views**: {}", format_thousands(views));
    }
    if let Some(likes) = metadata["like_count"].as_i64() {
        let _ = writeln!(out, "- **Likes**: {}", format_thousands(likes));
    }
    if let Some(date) = text("upload_date") {
        let _ = writeln!(out, "- **Uploaded**: {}", format_upload_date(&date));
    }
    if let Some(url) = text("webpage_url") {
        let _ = writeln!(out, "- **URL**: {url}");
    }
    if let Some(tags) = metadata["tags"].as_array().filter(|t| !t.is_empty()) {
        let tags: Vec<&str> = tags.iter().filter_map(Value::as_str).take(SUMMARY_TAGS).collect();
        let _ = writeln!(out, "- **Tags**: {}", tags.join(", "));
    }
    if let Some(description) = text("description").filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(out, "\n### Description\n");
        if description.chars().count() > DESCRIPTION_EXCERPT {
            let _ = writeln!(out, "{}...", truncate_str(&description, DESCRIPTION_EXCERPT));
        } else {
            let _ = writeln!(out, "{description}");
        }
    }
    out
}

fn download_report(headline: &str, path: &std::path::Path, size_bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let size_mb = size_bytes as f64 / 1024.0 / 1024.0;
    let filename = path
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    format!(
        "{headline}\n\n\
         - **File**: {filename}\n\
         - **Path**: {}\n\
         - **Size**: {size_mb:.2} MB",
        path.display()
    )
}

// ============================================================================
// Argument structs
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ResponseFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Debug, Deserialize)]
struct SearchVideosArgs {
    query: String,
    #[serde(default)]
    max_results: Option<usize>,
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default)]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct UrlArgs {
    url: String,
}

#[derive(Debug, Deserialize)]
struct GetMetadataArgs {
    url: String,
    #[serde(default)]
    fields: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SubtitleArgs {
    url: String,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadVideoArgs {
    url: String,
    #[serde(default)]
    resolution: Option<Resolution>,
}

#[derive(Debug, Deserialize)]
struct DownloadAudioArgs {
    url: String,
    #[serde(default)]
    format: Option<AudioFormat>,
}

#[derive(Debug, Deserialize)]
struct CommentsArgs {
    url: String,
    #[serde(default)]
    max_comments: Option<usize>,
    #[serde(default)]
    sort_order: Option<CommentSort>,
}

#[derive(Debug, Deserialize)]
struct CommentsSummaryArgs {
    url: String,
    #[serde(default)]
    max_comments: Option<usize>,
}

// ============================================================================
// Tool Definitions - Split into multiple functions to satisfy clippy
// ============================================================================

fn url_only_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "url": { "type": "string", "description": description }
        },
        "required": ["url"]
    })
}

fn tool(name: &str, description: &str, parameters: Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

impl YtdlpProvider {
    fn get_search_tool() -> ToolDefinition {
        tool(
            "ytdlp_search_videos",
            "Search for videos on YouTube. Returns titles, channels, durations, and URLs. Use offset to page through results.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" },
                    "max_results": { "type": "integer", "description": "Number of results (1-50, default: 10)" },
                    "offset": { "type": "integer", "description": "Number of results to skip (0-1000, default: 0)" },
                    "response_format": {
                        "type": "string",
                        "enum": ["markdown", "json"],
                        "description": "Output format (default: markdown)"
                    }
                },
                "required": ["query"]
            }),
        )
    }

    fn get_metadata_tool() -> ToolDefinition {
        tool(
            "ytdlp_get_video_metadata",
            "Get full metadata for a video as JSON (title, channel, duration, views, upload date, description, tags, formats...). No download.",
            json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "Video URL (YouTube, Vimeo, etc.)" },
                    "fields": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Optional: only return these fields (e.g., ['title', 'channel', 'duration', 'view_count'])"
                    }
                },
                "required": ["url"]
            }),
        )
    }

    fn get_metadata_summary_tool() -> ToolDefinition {
        tool(
            "ytdlp_get_video_metadata_summary",
            "Get a short human-readable summary of a video: title, channel, duration, views, likes, upload date, tags, and a description excerpt.",
            url_only_schema("Video URL"),
        )
    }

    fn get_list_subtitles_tool() -> ToolDefinition {
        tool(
            "ytdlp_list_subtitle_languages",
            "List the manual and auto-generated subtitle languages available for a video.",
            url_only_schema("Video URL"),
        )
    }

    fn subtitle_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "Video URL" },
                "language": {
                    "type": "string",
                    "description": "Subtitle language code (default from configuration, usually 'en'). Examples: 'en', 'es', 'pt-BR', 'zh-Hans'"
                }
            },
            "required": ["url"]
        })
    }

    fn get_subtitles_tool() -> ToolDefinition {
        tool(
            "ytdlp_download_video_subtitles",
            "Download a video's subtitles (manual or auto-generated) as raw WebVTT with timestamps.",
            Self::subtitle_schema(),
        )
    }

    fn get_transcript_tool() -> ToolDefinition {
        tool(
            "ytdlp_download_transcript",
            "Download and extract a clean plain-text transcript from a video's subtitles, without timestamps or formatting.",
            Self::subtitle_schema(),
        )
    }

    fn get_download_video_tool() -> ToolDefinition {
        tool(
            "ytdlp_download_video",
            "Download a video as MP4 into the configured downloads directory. Returns the saved file path and size.",
            json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "Video URL" },
                    "resolution": {
                        "type": "string",
                        "enum": ["480p", "720p", "1080p", "best"],
                        "description": "Maximum resolution (default from configuration, usually '720p')"
                    }
                },
                "required": ["url"]
            }),
        )
    }

    fn get_download_audio_tool() -> ToolDefinition {
        tool(
            "ytdlp_download_audio",
            "Download only the audio track of a video into the configured downloads directory.",
            json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "Video URL" },
                    "format": {
                        "type": "string",
                        "enum": ["m4a", "mp3"],
                        "description": "Audio format (default from configuration, usually 'm4a')"
                    }
                },
                "required": ["url"]
            }),
        )
    }

    fn get_comments_tool() -> ToolDefinition {
        tool(
            "ytdlp_get_video_comments",
            "Get a video's comments as JSON (author, text, likes, pinned/uploader flags, reply parent, time). Primarily supported for YouTube.",
            json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "Video URL" },
                    "max_comments": { "type": "integer", "description": "Maximum comments to return (1-100, default: 20)" },
                    "sort_order": {
                        "type": "string",
                        "enum": ["top", "new"],
                        "description": "Comment ordering (default: top)"
                    }
                },
                "required": ["url"]
            }),
        )
    }

    fn get_comments_summary_tool() -> ToolDefinition {
        tool(
            "ytdlp_get_video_comments_summary",
            "Get a readable summary of a video's top comments with author, tags, likes, and text.",
            json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "Video URL" },
                    "max_comments": { "type": "integer", "description": "Maximum comments to include (1-100, default: 10)" }
                },
                "required": ["url"]
            }),
        )
    }
}

// ============================================================================
// ToolProvider implementation
// ============================================================================

#[async_trait]
impl ToolProvider for YtdlpProvider {
    fn name(&self) -> &'static str {
        "ytdlp"
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            Self::get_search_tool(),
            Self::get_metadata_tool(),
            Self::get_metadata_summary_tool(),
            Self::get_list_subtitles_tool(),
            Self::get_subtitles_tool(),
            Self::get_transcript_tool(),
            Self::get_download_video_tool(),
            Self::get_download_audio_tool(),
            Self::get_comments_tool(),
            Self::get_comments_summary_tool(),
        ]
    }

    fn can_handle(&self, tool_name: &str) -> bool {
        TOOL_NAMES.contains(&tool_name)
    }

    async fn execute(&self, tool_name: &str, arguments: &str) -> Result<String> {
        debug!(tool = tool_name, "Executing ytdlp tool");

        match tool_name {
            "ytdlp_search_videos" => self.handle_search_videos(arguments).await,
            "ytdlp_get_video_metadata" => self.handle_get_metadata(arguments).await,
            "ytdlp_get_video_metadata_summary" => self.handle_get_metadata_summary(arguments).await,
            "ytdlp_list_subtitle_languages" => self.handle_list_subtitles(arguments).await,
            "ytdlp_download_video_subtitles" => self.handle_download_subtitles(arguments).await,
            "ytdlp_download_transcript" => self.handle_download_transcript(arguments).await,
            "ytdlp_download_video" => self.handle_download_video(arguments).await,
            "ytdlp_download_audio" => self.handle_download_audio(arguments).await,
            "ytdlp_get_video_comments" => self.handle_get_comments(arguments).await,
            "ytdlp_get_video_comments_summary" => self.handle_get_comments_summary(arguments).await,
            _ => bail!("Unknown ytdlp tool: {tool_name}"),
        }
    }
}
