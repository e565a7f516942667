// src/version.rs

use std::process::Command;
use tracing::debug;

pub const UNKNOWN_BUILD: &str = "unknown build";

/// Short build/revision id for the page footer. Never fails.
pub fn build_id() -> String {
    lookup_build_id(option_env!("FORAGE_BUILD_ID"), git_short_rev)
}

fn git_short_rev() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .map_err(|e| debug!(error = %e, "git not runnable"))
        .ok()?;
    if !output.status.success() {
        debug!(status = %output.status, "git rev-parse failed");
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

fn lookup_build_id<F>(baked_in: Option<&str>, fallback: F) -> String
where
    F: FnOnce() -> Option<String>,
{
    baked_in
        .map(str::to_string)
        .or_else(fallback)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_BUILD.to_string())
}
