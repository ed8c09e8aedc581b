//! Body dumps for building offline fixtures.
//! Compiled only when the `debug-dumps` feature is enabled.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) fn dump_dir() -> PathBuf {
    env::var("ESG_FIXDIR").map_or_else(
        |_| Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures"),
        PathBuf::from,
    )
}

/// `Apple Inc.` -> `apple_inc`
fn file_stem(company: &str) -> String {
    let mut stem: String = company
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    while stem.contains("__") {
        stem = stem.replace("__", "_");
    }
    stem.trim_matches('_').to_string()
}

pub(crate) fn record_body(
    endpoint: &str,
    company: &str,
    ext: &str,
    body: &str,
) -> Result<(), std::io::Error> {
    let dir = dump_dir();
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{endpoint}_{}.{ext}", file_stem(company)));
    fs::write(&path, body)?;
    tracing::debug!(path = %path.display(), "recorded response body");
    Ok(())
}
