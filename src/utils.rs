//! Text helpers shared by the tools: character-safe truncation, file name
//! sanitization, and number formatting.

use crate::config::FileConfig;

/// Safely truncates a string to a maximum character length (not bytes).
///
/// This is UTF-8 safe and will not panic on multi-byte characters.
///
/// # Examples
///
/// ```
/// use oxide_ytdlp::utils::truncate_str;
/// let s = "Привет, мир!";
/// assert_eq!(truncate_str(s, 6), "Привет");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Truncates `text` to `max_chars` and appends a note with the original size.
#[must_use]
pub fn truncate_with_note(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    format!(
        "{}...\n\n(truncated, {total} chars total)",
        truncate_str(text, max_chars)
    )
}

/// Splits a file name into base and extension (with its dot).
///
/// A leading dot does not start an extension, so `.bashrc` has none.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name.split_at(pos),
        _ => (name, ""),
    }
}

/// Makes a file name safe for every common filesystem.
///
/// Illegal characters are replaced first, then a reserved device name (checked
/// case-insensitively on the base name) gets an underscore prefix, and finally an
/// over-long name has its base cut so that `base + suffix + extension` is exactly
/// `max_filename_length` characters. The extension is kept intact unless it is
/// too long to fit next to the suffix, in which case the whole name is cut.
///
/// # Examples
///
/// ```
/// use oxide_ytdlp::config::Configuration;
/// use oxide_ytdlp::utils::sanitize_filename;
///
/// let config = Configuration::defaults(None);
/// assert_eq!(sanitize_filename("a:b?.mp4", &config.file), "a_b_.mp4");
/// assert_eq!(sanitize_filename("con.txt", &config.file), "_con.txt");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str, rules: &FileConfig) -> String {
    let mut sanitized = rules
        .illegal_chars
        .replace_all(name, rules.replace_char.as_str())
        .into_owned();

    let (base, _) = split_extension(&sanitized);
    let base_upper = base.to_uppercase();
    if rules
        .reserved_names
        .iter()
        .any(|reserved| reserved.to_uppercase() == base_upper)
    {
        sanitized.insert(0, '_');
    }

    let max = rules.max_filename_length;
    if sanitized.chars().count() > max {
        let (base, ext) = split_extension(&sanitized);
        let suffix = rules.truncate_suffix.as_str();
        let suffix_len = suffix.chars().count();
        let ext_len = ext.chars().count();

        sanitized = if ext_len + suffix_len <= max {
            let keep = max - ext_len - suffix_len;
            format!("{}{suffix}{ext}", truncate_str(base, keep))
        } else if suffix_len < max {
            // extension alone does not fit, cut the whole name
            format!("{}{suffix}", truncate_str(&sanitized, max - suffix_len))
        } else {
            truncate_str(&sanitized, max)
        };
    }

    sanitized
}

/// Formats an integer with `,` thousands separators (`1234567` → `1,234,567`).
#[must_use]
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;

    fn rules() -> FileConfig {
        Configuration::defaults(None).file
    }

    #[test]
    fn test_truncate_str_unicode() {
        let s = "Привет, мир!";
        assert_eq!(truncate_str(s, 6), "Привет");
        assert_eq!(truncate_str(s, 50), "Привет, мир!");
    }

    #[test]
    fn test_truncate_with_note() {
        assert_eq!(truncate_with_note("short", 10), "short");
        let out = truncate_with_note("abcdefghij", 4);
        assert!(out.starts_with("abcd..."));
        assert!(out.ends_with("(truncated, 10 chars total)"));
    }

    #[test]
    fn test_sanitize_replaces_illegal_chars() {
        assert_eq!(
            sanitize_filename("What? <Live> \"2024\" a/b\\c|d*e.mp4", &rules()),
            "What_ _Live_ _2024_ a_b_c_d_e.mp4"
        );
        assert_eq!(sanitize_filename("tab\there.txt", &rules()), "tab_here.txt");
    }

    #[test]
    fn test_sanitize_reserved_names() {
        assert_eq!(sanitize_filename("CON", &rules()), "_CON");
        assert_eq!(sanitize_filename("nul.mp3", &rules()), "_nul.mp3");
        assert_eq!(sanitize_filename("Lpt9.m4a", &rules()), "_Lpt9.m4a");
        assert_eq!(sanitize_filename("console.mp4", &rules()), "console.mp4");
    }

    #[test]
    fn test_sanitize_truncates_to_exact_length() {
        let rules = rules();
        let name = format!("{}.webm", "x".repeat(120));
        let out = sanitize_filename(&name, &rules);
        assert_eq!(out.chars().count(), rules.max_filename_length);
        assert!(out.ends_with("....webm"));
        assert!(out.starts_with("xxxx"));
    }

    #[test]
    fn test_sanitize_truncation_counts_characters() {
        let mut rules = rules();
        rules.max_filename_length = 10;
        let out = sanitize_filename("ééééééééééééé.mp3", &rules);
        assert_eq!(out, "ééé....mp3");
        assert_eq!(out.chars().count(), 10);
    }

    #[test]
    fn test_sanitize_order_replace_then_reserve_then_truncate() {
        let mut rules = rules();
        rules.max_filename_length = 8;
        // `:` becomes `_`, so the base is no longer a reserved name
        assert_eq!(sanitize_filename("CON:.txt", &rules), "CON_.txt");
        // the reserved prefix pushes the name over the limit and is truncated with it
        assert_eq!(sanitize_filename("COM1.mp4", &rules), "_....mp4");
    }

    #[test]
    fn test_sanitize_without_extension() {
        let mut rules = rules();
        rules.max_filename_length = 6;
        assert_eq!(sanitize_filename("abcdefghij", &rules), "abc...");
        assert_eq!(sanitize_filename(".bashrc_long", &rules), ".ba...");
    }

    #[test]
    fn test_sanitize_overlong_extension_still_fits() {
        let rules = rules();
        let name = format!("title.{}", "e".repeat(60));
        let out = sanitize_filename(&name, &rules);
        assert_eq!(out.chars().count(), rules.max_filename_length);
        assert_eq!(out, format!("title.{}...", "e".repeat(41)));

        let mut rules = rules;
        rules.max_filename_length = 5;
        rules.truncate_suffix = "[truncated]".to_string();
        assert_eq!(sanitize_filename("abcdefgh.mp4", &rules), "abcde");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1234), "1,234");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
        assert_eq!(format_thousands(-45_000), "-45,000");
    }
}
