//! Run log location, ANSI stripping, and timestamps.
use std::fs;
use std::path::PathBuf;

/// Environment variable that redirects run logs away from the user cache.
pub(super) const LOG_DIR_ENV: &str = "WARDEN_LOG_DIR";

/// Timestamp pattern of the run log header.
pub(super) const HEADER_STAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp pattern in front of every run log line.
pub(super) const LINE_STAMP: &str = "%H:%M:%S";

/// Remove terminal escape sequences so run logs stay plain text.
///
/// CSI sequences (`ESC [` ... final byte in `@`..=`~`) are dropped whole;
/// any other escape drops only the byte that follows it.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        if chars.next() == Some('[') {
            for inner in chars.by_ref() {
                if ('@'..='~').contains(&inner) {
                    break;
                }
            }
        }
    }
    out
}

/// Directory run logs are written to: `$WARDEN_LOG_DIR`, else
/// `$XDG_CACHE_HOME/warden`, else `~/.cache/warden`.
fn log_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(LOG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    let cache = std::env::var_os("XDG_CACHE_HOME").map_or_else(
        || {
            std::env::var_os("HOME")
                .or_else(|| std::env::var_os("USERPROFILE"))
                .map_or_else(|| PathBuf::from("."), PathBuf::from)
                .join(".cache")
        },
        PathBuf::from,
    );
    cache.join("warden")
}

/// Run log path for `command`, creating its directory.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let dir = log_dir();
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// Current UTC time rendered with `pattern`.
pub(super) fn utc_stamp(pattern: &str) -> String {
    chrono::Utc::now().format(pattern).to_string()
}
