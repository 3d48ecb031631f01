//! Configuration and settings management
//!
//! Builds the process-wide [`Configuration`] from built-in defaults and `YTDLP_*`
//! environment overrides, then runs two validation passes: a structural one that
//! aborts loading, and a lenient cookie pass that only drops the offending field.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use config::{Config, Environment, Map};
use lazy_regex::regex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "YTDLP";

/// Browsers yt-dlp can extract cookies from
pub const VALID_BROWSERS: &[&str] = &[
    "brave", "chrome", "chromium", "edge", "firefox", "opera", "safari", "vivaldi", "whale",
];

const DEFAULT_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];
const DEFAULT_MAX_FILENAME_LENGTH: usize = 50;
const DEFAULT_TEMP_DIR_PREFIX: &str = "ytdlp-";
const DEFAULT_CHARACTER_LIMIT: usize = 25_000;
const DEFAULT_MAX_TRANSCRIPT_LENGTH: usize = 50_000;
const MIN_FILENAME_LENGTH: usize = 5;

/// Errors that abort configuration loading
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The environment could not be read or a value had the wrong type
    #[error("Failed to read environment overrides: {0}")]
    Source(#[from] config::ConfigError),
    /// Filename limit too small to hold a name and its truncation suffix
    #[error("maxFilenameLength must be at least {MIN_FILENAME_LENGTH}, got {0}")]
    FilenameLengthTooSmall(usize),
    /// Downloads directory is empty
    #[error("downloadsDir must be set")]
    MissingDownloadsDir,
    /// Temp directory prefix is empty
    #[error("tempDirPrefix must be set")]
    MissingTempDirPrefix,
    /// Unknown default resolution
    #[error("Invalid default resolution: {0} (expected 480p, 720p, 1080p or best)")]
    InvalidResolution(String),
    /// Unknown default audio format
    #[error("Invalid default audio format: {0} (expected m4a or mp3)")]
    InvalidAudioFormat(String),
    /// Subtitle language is not a language tag
    #[error("Invalid default subtitle language: {0}")]
    InvalidSubtitleLanguage(String),
    /// Illegal character pattern does not compile
    #[error("Invalid illegal character pattern: {0}")]
    InvalidIllegalChars(#[from] regex::Error),
}

/// Video resolution cap used for format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    /// Up to 480 lines
    #[serde(rename = "480p")]
    P480,
    /// Up to 720 lines
    #[default]
    #[serde(rename = "720p")]
    P720,
    /// Up to 1080 lines
    #[serde(rename = "1080p")]
    P1080,
    /// Best available
    #[serde(rename = "best")]
    Best,
}

impl Resolution {
    /// yt-dlp `-f` selector for this resolution
    #[must_use]
    pub const fn format_selector(self) -> &'static str {
        match self {
            Self::P480 => "bestvideo[height<=480]+bestaudio/best[height<=480]",
            Self::P720 => "bestvideo[height<=720]+bestaudio/best[height<=720]",
            Self::P1080 => "bestvideo[height<=1080]+bestaudio/best[height<=1080]",
            Self::Best => "bestvideo+bestaudio/best",
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
            Self::Best => "best",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "480p" => Ok(Self::P480),
            "720p" => Ok(Self::P720),
            "1080p" => Ok(Self::P1080),
            "best" => Ok(Self::Best),
            other => Err(ConfigurationError::InvalidResolution(other.to_string())),
        }
    }
}

/// Audio container for audio-only downloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// AAC in MP4 container, no re-encode
    #[default]
    M4a,
    /// Re-encoded MP3
    Mp3,
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::M4a => "m4a",
            Self::Mp3 => "mp3",
        })
    }
}

impl FromStr for AudioFormat {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m4a" => Ok(Self::M4a),
            "mp3" => Ok(Self::Mp3),
            other => Err(ConfigurationError::InvalidAudioFormat(other.to_string())),
        }
    }
}

/// Returns true for tags like `en`, `pt-BR`, `zh-Hans` or `zh-Hant-TW`
#[must_use]
pub fn is_valid_language_tag(lang: &str) -> bool {
    regex!(r"(?i)^[a-z]{2,3}(-[a-z][a-z]{3})?(-[a-z]{2})?$").is_match(lang)
}

/// Filename sanitization rules and download locations
#[derive(Debug, Clone)]
pub struct FileConfig {
    /// Characters replaced in file names
    pub illegal_chars: Regex,
    /// Replacement for each illegal character
    pub replace_char: String,
    /// Appended to a truncated base name
    pub truncate_suffix: String,
    /// Windows device names that cannot be used as a base name
    pub reserved_names: Vec<String>,
    /// Maximum file name length in characters, extension included
    pub max_filename_length: usize,
    /// Where downloaded media is written
    pub downloads_dir: String,
    /// Prefix for per-call temporary directories
    pub temp_dir_prefix: String,
}

/// Defaults for download tools
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub default_resolution: Resolution,
    pub default_audio_format: AudioFormat,
    pub default_subtitle_language: String,
}

/// Size ceilings for text handed back to the model
#[derive(Debug, Clone, Copy)]
pub struct LimitsConfig {
    pub character_limit: usize,
    pub max_transcript_length: usize,
}

/// Authentication source for yt-dlp; `file` takes precedence over `from_browser`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieConfig {
    pub file: Option<String>,
    pub from_browser: Option<String>,
}

/// Immutable process-wide configuration
#[derive(Debug, Clone)]
pub struct Configuration {
    pub file: FileConfig,
    pub download: DownloadConfig,
    pub limits: LimitsConfig,
    pub cookies: CookieConfig,
}

/// Raw `YTDLP_*` overrides, one per configuration leaf
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvOverrides {
    downloads_dir: Option<String>,
    default_resolution: Option<String>,
    default_audio_format: Option<String>,
    default_subtitle_lang: Option<String>,
    character_limit: Option<usize>,
    max_transcript_length: Option<usize>,
    sanitize_replace_char: Option<String>,
    sanitize_truncate_suffix: Option<String>,
    sanitize_illegal_chars: Option<String>,
    sanitize_reserved_names: Option<String>,
    cookies_file: Option<String>,
    cookies_from_browser: Option<String>,
}

impl Configuration {
    /// Built-in defaults; `home` locates the downloads directory
    #[must_use]
    pub fn defaults(home: Option<&str>) -> Self {
        let downloads_dir = home.map_or_else(
            || "Downloads".to_string(),
            |home| format!("{}/Downloads", home.trim_end_matches('/')),
        );

        Self {
            file: FileConfig {
                illegal_chars: Regex::clone(regex!(r#"[<>:"/\\|?*\x00-\x1F]"#)),
                replace_char: "_".to_string(),
                truncate_suffix: "...".to_string(),
                reserved_names: DEFAULT_RESERVED_NAMES
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                max_filename_length: DEFAULT_MAX_FILENAME_LENGTH,
                downloads_dir,
                temp_dir_prefix: DEFAULT_TEMP_DIR_PREFIX.to_string(),
            },
            download: DownloadConfig {
                default_resolution: Resolution::default(),
                default_audio_format: AudioFormat::default(),
                default_subtitle_language: "en".to_string(),
            },
            limits: LimitsConfig {
                character_limit: DEFAULT_CHARACTER_LIMIT,
                max_transcript_length: DEFAULT_MAX_TRANSCRIPT_LENGTH,
            },
            cookies: CookieConfig::default(),
        }
    }

    /// Load configuration from the current process environment
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` on structural misconfiguration. Cookie
    /// problems never fail; they are logged and the cookie field is dropped.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an environment snapshot
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` on structural misconfiguration.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: Map<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let home = vars
            .get("HOME")
            .or_else(|| vars.get("USERPROFILE"))
            .filter(|h| !h.is_empty())
            .cloned();

        let overrides: EnvOverrides = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .ignore_empty(true)
                    .source(Some(vars)),
            )
            .build()?
            .try_deserialize()?;

        let mut config = Self::defaults(home.as_deref());
        config.apply_overrides(overrides)?;
        config.validate()?;

        let (cookies, _warnings) = validate_cookies(config.cookies);
        config.cookies = cookies;

        debug!(
            downloads_dir = %config.file.downloads_dir,
            resolution = %config.download.default_resolution,
            audio_format = %config.download.default_audio_format,
            character_limit = config.limits.character_limit,
            cookies_file = config.cookies.file.is_some(),
            cookies_from_browser = config.cookies.from_browser.is_some(),
            "Configuration resolved"
        );

        Ok(config)
    }

    fn apply_overrides(&mut self, env: EnvOverrides) -> Result<(), ConfigurationError> {
        if let Some(dir) = env.downloads_dir {
            self.file.downloads_dir = dir;
        }
        if let Some(res) = env.default_resolution {
            self.download.default_resolution = res.parse()?;
        }
        if let Some(format) = env.default_audio_format {
            self.download.default_audio_format = format.parse()?;
        }
        if let Some(lang) = env.default_subtitle_lang {
            self.download.default_subtitle_language = lang;
        }
        if let Some(limit) = env.character_limit {
            self.limits.character_limit = limit;
        }
        if let Some(limit) = env.max_transcript_length {
            self.limits.max_transcript_length = limit;
        }
        if let Some(c) = env.sanitize_replace_char {
            self.file.replace_char = c;
        }
        if let Some(suffix) = env.sanitize_truncate_suffix {
            self.file.truncate_suffix = suffix;
        }
        if let Some(pattern) = env.sanitize_illegal_chars {
            self.file.illegal_chars = Regex::new(&pattern)?;
        }
        if let Some(names) = env.sanitize_reserved_names {
            self.file.reserved_names = names
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        self.cookies.file = env.cookies_file;
        self.cookies.from_browser = env.cookies_from_browser;
        Ok(())
    }

    /// Structural validation
    ///
    /// # Errors
    ///
    /// Returns the first rule the configuration breaks.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.file.max_filename_length < MIN_FILENAME_LENGTH {
            return Err(ConfigurationError::FilenameLengthTooSmall(
                self.file.max_filename_length,
            ));
        }
        if self.file.downloads_dir.trim().is_empty() {
            return Err(ConfigurationError::MissingDownloadsDir);
        }
        if self.file.temp_dir_prefix.is_empty() {
            return Err(ConfigurationError::MissingTempDirPrefix);
        }
        if !is_valid_language_tag(&self.download.default_subtitle_language) {
            return Err(ConfigurationError::InvalidSubtitleLanguage(
                self.download.default_subtitle_language.clone(),
            ));
        }
        Ok(())
    }
}

/// Lenient cookie validation
///
/// Drops a cookie file that does not exist and a browser specifier whose browser
/// name is unknown. Returns the cleaned config and the warnings that were logged.
#[must_use]
pub fn validate_cookies(mut cookies: CookieConfig) -> (CookieConfig, Vec<String>) {
    let mut warnings = Vec::new();

    if let Some(path) = cookies.file.take() {
        if Path::new(&path).exists() {
            cookies.file = Some(path);
        } else {
            warnings.push(format!(
                "Cookie file not found: {path}, continuing without cookies"
            ));
        }
    }

    if let Some(specifier) = cookies.from_browser.take() {
        let browser = specifier.split(':').next().unwrap_or_default().to_lowercase();
        if VALID_BROWSERS.contains(&browser.as_str()) {
            cookies.from_browser = Some(specifier);
        } else {
            warnings.push(format!(
                "Invalid browser name: {browser}. Valid browsers: {}",
                VALID_BROWSERS.join(", ")
            ));
        }
    }

    for warning in &warnings {
        warn!("{warning}");
    }

    (cookies, warnings)
}

/// yt-dlp authentication arguments; a cookie file wins over browser extraction
#[must_use]
pub fn cookie_args(config: &Configuration) -> Vec<String> {
    let cookies = &config.cookies;
    if let Some(file) = &cookies.file {
        return vec!["--cookies".to_string(), file.clone()];
    }
    if let Some(browser) = &cookies.from_browser {
        return vec!["--cookies-from-browser".to_string(), browser.clone()];
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_ILLEGAL_CHARS: &str = r#"[<>:"/\\|?*\x00-\x1F]"#;

    fn load(vars: &[(&str, &str)]) -> Result<Configuration, ConfigurationError> {
        Configuration::from_vars(vars.iter().map(|(k, v)| (*k, *v)))
    }

    fn existing_file() -> String {
        concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml").to_string()
    }

    #[test]
    fn test_defaults_without_overrides() -> Result<(), ConfigurationError> {
        let config = load(&[("HOME", "/home/alice")])?;
        assert_eq!(config.file.downloads_dir, "/home/alice/Downloads");
        assert_eq!(config.file.max_filename_length, 50);
        assert_eq!(config.file.temp_dir_prefix, "ytdlp-");
        assert_eq!(config.download.default_resolution, Resolution::P720);
        assert_eq!(config.download.default_audio_format, AudioFormat::M4a);
        assert_eq!(config.download.default_subtitle_language, "en");
        assert_eq!(config.limits.character_limit, 25_000);
        assert_eq!(config.limits.max_transcript_length, 50_000);
        assert_eq!(config.cookies, CookieConfig::default());
        assert!(config.file.illegal_chars.is_match("a:b"));
        assert_eq!(config.file.illegal_chars.as_str(), DEFAULT_ILLEGAL_CHARS);
        Ok(())
    }

    #[test]
    fn test_overrides_map_to_single_leaves() -> Result<(), ConfigurationError> {
        let config = load(&[
            ("YTDLP_DOWNLOADS_DIR", "/data/media"),
            ("YTDLP_DEFAULT_RESOLUTION", "1080p"),
            ("YTDLP_DEFAULT_AUDIO_FORMAT", "mp3"),
            ("YTDLP_DEFAULT_SUBTITLE_LANG", "zh-Hant-TW"),
            ("YTDLP_CHARACTER_LIMIT", "1000"),
            ("YTDLP_MAX_TRANSCRIPT_LENGTH", "2000"),
            ("YTDLP_SANITIZE_REPLACE_CHAR", "-"),
            ("YTDLP_SANITIZE_TRUNCATE_SUFFIX", "~"),
            ("YTDLP_SANITIZE_RESERVED_NAMES", "CON, NUL ,"),
        ])?;
        assert_eq!(config.file.downloads_dir, "/data/media");
        assert_eq!(config.download.default_resolution, Resolution::P1080);
        assert_eq!(config.download.default_audio_format, AudioFormat::Mp3);
        assert_eq!(config.download.default_subtitle_language, "zh-Hant-TW");
        assert_eq!(config.limits.character_limit, 1000);
        assert_eq!(config.limits.max_transcript_length, 2000);
        assert_eq!(config.file.replace_char, "-");
        assert_eq!(config.file.truncate_suffix, "~");
        assert_eq!(config.file.reserved_names, vec!["CON", "NUL"]);
        Ok(())
    }

    #[test]
    fn test_empty_env_values_are_ignored() -> Result<(), ConfigurationError> {
        let config = load(&[("HOME", "/h"), ("YTDLP_DOWNLOADS_DIR", "")])?;
        assert_eq!(config.file.downloads_dir, "/h/Downloads");
        Ok(())
    }

    #[test]
    fn test_structural_errors_abort_loading() {
        assert!(matches!(
            load(&[("YTDLP_DEFAULT_RESOLUTION", "4k")]),
            Err(ConfigurationError::InvalidResolution(r)) if r == "4k"
        ));
        assert!(matches!(
            load(&[("YTDLP_DEFAULT_AUDIO_FORMAT", "flac")]),
            Err(ConfigurationError::InvalidAudioFormat(_))
        ));
        assert!(matches!(
            load(&[("YTDLP_DEFAULT_SUBTITLE_LANG", "english")]),
            Err(ConfigurationError::InvalidSubtitleLanguage(_))
        ));
        assert!(matches!(
            load(&[("YTDLP_SANITIZE_ILLEGAL_CHARS", "[unclosed")]),
            Err(ConfigurationError::InvalidIllegalChars(_))
        ));
        assert!(matches!(
            load(&[("YTDLP_CHARACTER_LIMIT", "lots")]),
            Err(ConfigurationError::Source(_))
        ));
    }

    #[test]
    fn test_validate_file_rules() {
        let mut config = Configuration::defaults(Some("/h"));
        config.file.max_filename_length = 4;
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::FilenameLengthTooSmall(4))
        ));

        let mut config = Configuration::defaults(Some("/h"));
        config.file.downloads_dir = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingDownloadsDir)
        ));

        let mut config = Configuration::defaults(Some("/h"));
        config.file.temp_dir_prefix = String::new();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingTempDirPrefix)
        ));

        let mut config = Configuration::defaults(Some("/h"));
        config.file.max_filename_length = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_language_tags() {
        for lang in ["en", "pt-BR", "zh-Hans", "zh-Hant-TW", "EN", "yue"] {
            assert!(is_valid_language_tag(lang), "{lang} should be valid");
        }
        for lang in ["", "e", "english", "en_US", "en-", "zh-Hans-TWN"] {
            assert!(!is_valid_language_tag(lang), "{lang} should be invalid");
        }
    }

    #[test]
    fn test_valid_browsers_list() {
        assert_eq!(VALID_BROWSERS.len(), 9);
        for browser in ["chrome", "firefox", "edge", "safari"] {
            assert!(VALID_BROWSERS.contains(&browser));
        }
    }

    #[test]
    fn test_every_valid_browser_is_kept_verbatim() {
        for browser in VALID_BROWSERS {
            let (cookies, warnings) = validate_cookies(CookieConfig {
                file: None,
                from_browser: Some((*browser).to_string()),
            });
            assert_eq!(cookies.from_browser.as_deref(), Some(*browser));
            assert!(warnings.is_empty());
        }
    }

    #[test]
    fn test_browser_profile_forms_are_kept_verbatim() {
        for specifier in [
            "chrome:Profile 1",
            "firefox::work",
            "chrome:",
            "chrome:~/.var/app/com.google.Chrome/",
            "Chrome:Default",
        ] {
            let (cookies, warnings) = validate_cookies(CookieConfig {
                file: None,
                from_browser: Some(specifier.to_string()),
            });
            assert_eq!(cookies.from_browser.as_deref(), Some(specifier));
            assert!(warnings.is_empty(), "{specifier} produced {warnings:?}");
        }
    }

    #[test]
    fn test_unknown_browser_is_dropped_with_warning() {
        let (cookies, warnings) = validate_cookies(CookieConfig {
            file: None,
            from_browser: Some("netscape:Profile 1".to_string()),
        });
        assert_eq!(cookies.from_browser, None);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Invalid browser name"));
        assert!(warnings[0].contains("netscape"));
        assert!(warnings[0].contains("chrome"));
    }

    #[test]
    fn test_missing_cookie_file_is_dropped_with_warning() {
        let (cookies, warnings) = validate_cookies(CookieConfig {
            file: Some("/nonexistent/cookies.txt".to_string()),
            from_browser: None,
        });
        assert_eq!(cookies.file, None);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Cookie file not found"));
        assert!(warnings[0].contains("/nonexistent/cookies.txt"));
    }

    #[test]
    fn test_existing_cookie_file_is_kept() {
        let path = existing_file();
        let (cookies, warnings) = validate_cookies(CookieConfig {
            file: Some(path.clone()),
            from_browser: None,
        });
        assert_eq!(cookies.file, Some(path));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_cookie_validation_never_fails_loading() -> Result<(), ConfigurationError> {
        let config = load(&[
            ("YTDLP_COOKIES_FILE", "/nonexistent/cookies.txt"),
            ("YTDLP_COOKIES_FROM_BROWSER", "netscape"),
        ])?;
        assert_eq!(config.cookies, CookieConfig::default());
        assert!(cookie_args(&config).is_empty());
        Ok(())
    }

    #[test]
    fn test_cookie_args_precedence() {
        let mut config = Configuration::defaults(None);
        assert!(cookie_args(&config).is_empty());

        config.cookies.from_browser = Some("firefox::work".to_string());
        assert_eq!(
            cookie_args(&config),
            vec!["--cookies-from-browser", "firefox::work"]
        );

        config.cookies.file = Some("/tmp/cookies.txt".to_string());
        assert_eq!(cookie_args(&config), vec!["--cookies", "/tmp/cookies.txt"]);

        config.cookies.from_browser = None;
        assert_eq!(cookie_args(&config), vec!["--cookies", "/tmp/cookies.txt"]);
    }

    #[test]
    fn test_cookie_file_wins_after_loading() -> Result<(), ConfigurationError> {
        let path = existing_file();
        let config = load(&[
            ("YTDLP_COOKIES_FILE", path.as_str()),
            ("YTDLP_COOKIES_FROM_BROWSER", "chrome"),
        ])?;
        assert_eq!(config.cookies.from_browser.as_deref(), Some("chrome"));
        assert_eq!(cookie_args(&config), vec!["--cookies".to_string(), path]);
        Ok(())
    }
}
