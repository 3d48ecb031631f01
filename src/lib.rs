//! Oxide yt-dlp tool adapter.
//!
//! Exposes video search, metadata, subtitles, comments, and downloads backed by a
//! local yt-dlp binary as tools an agent can call over a line-delimited JSON stream.

/// Configuration management.
pub mod config;
/// yt-dlp subprocess execution.
pub mod runner;
/// Line-delimited JSON transport.
pub mod server;
/// Tool definitions and the yt-dlp provider.
pub mod tools;
/// Utility functions.
pub mod utils;
