//! Subtitle download and transcript cleanup
//!
//! Subtitles are written by yt-dlp into a throwaway directory (named with the
//! configured temp prefix) and read back; the directory is removed on drop.

#![allow(clippy::non_std_lazy_statics)]

use std::path::Path;

use anyhow::{bail, Context, Result};
use lazy_regex::lazy_regex;
use tracing::debug;

use crate::config::{cookie_args, is_valid_language_tag, Configuration};
use crate::runner::YtdlpRunner;

/// Cue timing line: `00:00:01.000 --> 00:00:04.000 align:start`
static RE_CUE_TIMING: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"^(\d+:)?\d{2}:\d{2}[.,]\d{3}\s+-->");

/// Inline markup: `<c>`, `</c>`, `<00:00:01.520>`, `<i>`
static RE_INLINE_TAG: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"<[^>]*>");

/// Resolve the requested language, falling back to the configured default
///
/// # Errors
///
/// Returns an error if the language is not a valid language tag.
pub fn resolve_language(requested: Option<&str>, config: &Configuration) -> Result<String> {
    let lang = requested
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(&config.download.default_subtitle_language);
    if !is_valid_language_tag(lang) {
        bail!("Invalid language code '{lang}'. Use codes like 'en', 'es', 'pt-BR' or 'zh-Hans'.");
    }
    Ok(lang.to_string())
}

/// yt-dlp arguments writing manual or automatic subtitles as VTT into `dir`
#[must_use]
pub fn subtitle_args(url: &str, lang: &str, dir: &Path, config: &Configuration) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--skip-download".into(),
        "--write-subs".into(),
        "--write-auto-subs".into(),
        "--sub-langs".into(),
        lang.into(),
        "--sub-format".into(),
        "vtt".into(),
        "-o".into(),
        format!("{}/%(id)s.%(ext)s", dir.display()),
        "--no-warnings".into(),
    ];
    args.extend(cookie_args(config));
    args.push(url.to_string());
    args
}

/// Download subtitles for `url` in `lang` and return the raw VTT text
///
/// # Errors
///
/// Returns an error if the temp directory cannot be created, yt-dlp fails, or no
/// subtitle file was produced.
pub async fn download_subtitles(
    runner: &dyn YtdlpRunner,
    config: &Configuration,
    url: &str,
    lang: &str,
) -> Result<String> {
    let dir = tempfile::Builder::new()
        .prefix(&config.file.temp_dir_prefix)
        .tempdir()
        .context("Failed to create temporary directory for subtitles")?;

    runner
        .run(&subtitle_args(url, lang, dir.path(), config))
        .await
        .with_context(|| format!("Failed to download subtitles for {url}"))?;

    let mut entries = tokio::fs::read_dir(dir.path()).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "vtt") {
            debug!(path = %path.display(), "Reading subtitle file");
            return tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read subtitle file {}", path.display()));
        }
    }

    bail!(
        "No subtitles found for language '{lang}'. Use ytdlp_list_subtitle_languages to see what is available."
    )
}

fn decode_entities(line: &str) -> String {
    line.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Reduce a VTT/SRT document to its spoken text
///
/// Only the lines between a cue timing line and the next blank line are cue
/// text; headers, NOTE/STYLE/REGION blocks and cue identifiers never are.
/// Inline tags are stripped and the repeated lines that auto-generated captions
/// roll over between cues are collapsed.
#[must_use]
pub fn clean_transcript(subtitles: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_cue = false;

    for raw in subtitles.lines() {
        let line = raw.trim();
        if line.is_empty() {
            in_cue = false;
            continue;
        }
        if RE_CUE_TIMING.is_match(line) {
            in_cue = true;
            continue;
        }
        if !in_cue {
            continue;
        }

        let text = decode_entities(&RE_INLINE_TAG.replace_all(line, ""));
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() || lines.last() == Some(&text) {
            continue;
        }
        lines.push(text);
    }

    lines.join(" ")
}
