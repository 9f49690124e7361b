//! Stamps the binary with the values reported by `/api/buildinfo` and the
//! startup log line: `GIT_HASH`, `BUILD_TIMESTAMP`, `BUILD_PROFILE`.
//!
//! Source tarballs without a `.git` directory get `unknown` for the hash.

use std::env;
use std::process::Command;

const UNKNOWN: &str = "unknown";

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn emit(name: &str, value: &str) {
    println!("cargo:rustc-env={}={}", name, value);
}

fn main() {
    let hash = git_short_hash().unwrap_or_else(|| UNKNOWN.to_string());
    let built_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string());

    emit("GIT_HASH", &hash);
    emit("BUILD_TIMESTAMP", &built_at);
    emit("BUILD_PROFILE", &profile);

    // Left without rerun-if-changed so the timestamp and hash track every build
}
