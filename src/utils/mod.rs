//! Filesystem helpers: output file naming and host-OS file opening.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use chrono::Local;
use regex::Regex;

use crate::core::voices::FILE_EXT;

/// Characters of source text used for the file name excerpt.
const NAME_EXCERPT_CHARS: usize = 40;

/// Timestamp suffix appended to output file names to avoid collisions.
const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

fn invalid_chars_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s.-]").expect("filename pattern is valid"))
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Reduces arbitrary text to a safe file name fragment.
///
/// Strips everything but word characters, whitespace, dots and dashes, then
/// collapses whitespace runs to underscores. Falls back to `audio` when
/// nothing survives.
pub fn sanitize_filename(name: &str) -> String {
    let stripped = invalid_chars_regex().replace_all(name, "");
    let trimmed = stripped.trim();
    let joined = whitespace_regex().replace_all(trimmed, "_").into_owned();
    if joined.is_empty() {
        "audio".to_string()
    } else {
        joined
    }
}

/// Proposes an output path under `base`: a sanitized excerpt of the text
/// plus a timestamp, with the tool's audio extension. Creates `base` if it
/// does not exist yet.
pub fn default_output_path(base: &Path, text: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(base)?;
    let excerpt: String = text.chars().take(NAME_EXCERPT_CHARS).collect();
    let stamp = Local::now().format(FILE_TIMESTAMP_FORMAT);
    let name = format!("{}_{}{}", sanitize_filename(&excerpt), stamp, FILE_EXT);
    Ok(base.join(name))
}

/// Hands a file to the host OS default opener.
pub fn open_file(path: &Path) -> std::io::Result<()> {
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", ""]).arg(path);
        c
    };
    #[cfg(target_os = "macos")]
    let mut command = {
        let mut c = Command::new("open");
        c.arg(path);
        c
    };
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let mut command = {
        let mut c = Command::new("xdg-open");
        c.arg(path);
        c
    };

    command.spawn().map(|_| ())
}
