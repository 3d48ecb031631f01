use anyhow::Result;
use oxide_ytdlp::config::Configuration;
use oxide_ytdlp::runner::ProcessRunner;
use oxide_ytdlp::tools::{ToolProvider, YtdlpProvider};
use serde_json::{json, Value};
use std::sync::Arc;

const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[cfg(unix)]
fn stub_ytdlp(dir: &std::path::Path, script: &str) -> Result<std::path::PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("yt-dlp");
    std::fs::write(&path, format!("#!/bin/sh\n{script}\n"))?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

fn provider(binary: impl Into<std::path::PathBuf>) -> YtdlpProvider {
    YtdlpProvider::new(
        Arc::new(ProcessRunner::with_binary(binary)),
        Arc::new(Configuration::defaults(Some("/home/test"))),
    )
}

#[test]
fn lists_every_tool_once() {
    let provider = provider("yt-dlp");
    let tools = provider.tools();
    let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();

    assert_eq!(names.len(), tools.len());
    assert!(names.contains(&"ytdlp_get_video_comments"));
    assert!(names.contains(&"ytdlp_get_video_comments_summary"));
    assert!(names.iter().all(|name| provider.can_handle(name)));
}

#[cfg(unix)]
#[tokio::test]
async fn comments_through_real_process() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let comments = json!({
        "comments": [
            {"id": "a", "text": "first", "author": "@one", "like_count": 3, "parent": "root"},
            {"id": "b", "text": "second", "author": "@two", "parent": "a"},
            {"id": "c", "text": "third"}
        ]
    });
    let binary = stub_ytdlp(dir.path(), &format!("cat <<'JSON'\n{comments}\nJSON"))?;
    let provider = provider(binary);

    let out = provider
        .execute(
            "ytdlp_get_video_comments",
            &json!({"url": URL, "max_comments": 2}).to_string(),
        )
        .await?;
    let value: Value = serde_json::from_str(&out)?;
    assert_eq!(value["count"], 2);
    assert_eq!(value["has_more"], true);
    assert_eq!(value["comments"][1]["parent"], "a");
    assert!(value.get("_truncated").is_none());

    let summary = provider
        .execute(
            "ytdlp_get_video_comments_summary",
            &json!({"url": URL}).to_string(),
        )
        .await?;
    assert!(summary.contains("first"));
    assert!(summary.contains("third"));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn stderr_is_classified() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let binary = stub_ytdlp(
        dir.path(),
        "echo 'ERROR: [youtube] dQw4w9WgXcQ: Sign in to confirm your age' >&2\nexit 1",
    )?;
    let provider = provider(binary);

    let err = provider
        .execute("ytdlp_get_video_comments", &json!({"url": URL}).to_string())
        .await
        .err()
        .map(|e| e.to_string())
        .unwrap_or_default();
    assert_eq!(
        err,
        "This video requires authentication to view comments. Configure cookies in your settings."
    );
    Ok(())
}

#[tokio::test]
#[ignore = "Requires yt-dlp and network access"]
async fn real_metadata_summary() -> Result<()> {
    let provider = YtdlpProvider::new(
        Arc::new(ProcessRunner::new()?),
        Arc::new(Configuration::from_env()?),
    );
    let out = provider
        .execute(
            "ytdlp_get_video_metadata_summary",
            &json!({"url": URL}).to_string(),
        )
        .await?;
    assert!(out.starts_with("## "));
    Ok(())
}
