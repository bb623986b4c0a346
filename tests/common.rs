//! Shared test utilities for integration tests.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Writes markdown fixture into a fresh temporary directory.
///
/// # Returns
///
/// Temporary directory guard and path of the written file
///
/// # Errors
///
/// Returns error if directory creation or write fails
pub fn write_fixture(name: &str, content: &str) -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let path = dir.path().join(name);
    fs::write(&path, content)?;
    Ok((dir, path))
}

/// Markdown exercising every default extension.
pub const SAMPLE: &str = r#"<a name="top"/>

# Release Notes :tada:

Thanks to everyone :+1: who tested this[^rc].

[^rc]: :smile:

See the [changelog](docs/CHANGELOG.md) or jump to [the top](#Top).
"#;
