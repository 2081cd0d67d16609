//! Sourcemap discovery under a build output directory.
//!
//! Two selection strategies:
//! - Pattern: scan for `*.map` files and keep those whose compiled file exists
//! - Manifest: trust the bundler's list of emitted files and derive map names
//!
//! Problems with individual candidates are reported as [`DiscoveryWarning`]s
//! and never fail the run.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use glob::{MatchOptions, Pattern};
use thiserror::Error;
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::domain::{BuildOutputSet, SourcemapArtifact};

/// Suffix appended to a compiled file's name to get its sourcemap
pub const SOURCEMAP_SUFFIX: &str = ".map";

/// Extensions treated as script files in a manifest
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs"];

/// How sourcemaps are selected
#[derive(Debug, Clone)]
pub enum Selection {
    /// Recursive `**/*.map` scan with a compiled-source existence check
    Pattern,

    /// Derive `<file>.map` for every script file the bundler emitted
    Manifest(BuildOutputSet),
}

/// Non-fatal problem with one sourcemap candidate
#[derive(Debug, Error)]
pub enum DiscoveryWarning {
    #[error("No corresponding source found for '{sourcemap}'")]
    MissingSource { sourcemap: String },

    #[error("Error reading sourcemap file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sourcemap file {} is empty", path.display())]
    Empty { path: PathBuf },

    #[error("Error scanning for sourcemaps: {0}")]
    Scan(String),
}

/// Finds and reads sourcemap artifacts
pub struct Locator {
    diagnostics: Arc<dyn Diagnostics>,
}

impl Locator {
    pub fn new(diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self { diagnostics }
    }

    /// Locate every uploadable sourcemap under `output_dir`.
    ///
    /// `base` is prepended verbatim to each relative compiled-file path.
    pub async fn locate(
        &self,
        output_dir: &Path,
        selection: &Selection,
        base: &str,
    ) -> Vec<SourcemapArtifact> {
        let root = absolute(output_dir);

        let candidates = match selection {
            Selection::Pattern => self.pattern_candidates(&root),
            Selection::Manifest(outputs) => manifest_candidates(outputs),
        };

        let mut artifacts = Vec::with_capacity(candidates.len());
        for source_path in candidates {
            let sourcemap_path = root.join(format!("{}{}", source_path, SOURCEMAP_SUFFIX));
            let original_file_path = format!("{}{}", base, source_path);

            if let Some(artifact) = self.read(sourcemap_path, original_file_path).await {
                artifacts.push(artifact);
            }
        }

        debug!(count = artifacts.len(), dir = %root.display(), "Sourcemap discovery finished");
        artifacts
    }

    /// Compiled-file paths (relative, `/`-separated) found by scanning
    fn pattern_candidates(&self, root: &Path) -> Vec<String> {
        let pattern = format!(
            "{}/**/*{}",
            Pattern::escape(&root.to_string_lossy()),
            SOURCEMAP_SUFFIX
        );
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };

        let paths = match glob::glob_with(&pattern, options) {
            Ok(paths) => paths,
            Err(e) => {
                self.report(DiscoveryWarning::Scan(e.to_string()));
                return Vec::new();
            }
        };

        let mut candidates = Vec::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    self.report(DiscoveryWarning::Scan(e.to_string()));
                    continue;
                }
            };

            if !path.is_file() {
                continue;
            }

            let Some(relative) = relative_slash_path(root, &path) else {
                continue;
            };
            let Some(source_path) = relative.strip_suffix(SOURCEMAP_SUFFIX) else {
                continue;
            };

            if !root.join(source_path).exists() {
                self.report(DiscoveryWarning::MissingSource {
                    sourcemap: relative.clone(),
                });
                continue;
            }

            candidates.push(source_path.to_string());
        }

        candidates
    }

    /// Read a sourcemap, reporting and dropping it on failure
    async fn read(
        &self,
        sourcemap_path: PathBuf,
        original_file_path: String,
    ) -> Option<SourcemapArtifact> {
        let content = match tokio::fs::read(&sourcemap_path).await {
            Ok(content) => content,
            Err(source) => {
                self.report(DiscoveryWarning::Unreadable {
                    path: sourcemap_path,
                    source,
                });
                return None;
            }
        };

        let artifact = SourcemapArtifact::new(sourcemap_path, original_file_path, content);
        if !artifact.is_uploadable() {
            self.report(DiscoveryWarning::Empty {
                path: artifact.sourcemap_path,
            });
            return None;
        }

        debug!(
            path = %artifact.sourcemap_path.display(),
            original = %artifact.original_file_path,
            digest = %artifact.content_digest(),
            "Located sourcemap"
        );
        Some(artifact)
    }

    fn report(&self, warning: DiscoveryWarning) {
        self.diagnostics.warn(&warning.to_string());
    }
}

/// Script files of a manifest
fn manifest_candidates(outputs: &BuildOutputSet) -> Vec<String> {
    outputs
        .iter()
        .filter(|file| is_script_file(file))
        .map(str::to_string)
        .collect()
}

/// Whether a file name has a script extension
pub fn is_script_file(file: &str) -> bool {
    Path::new(file)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// `path` relative to `root`, joined with `/` regardless of host separator
fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Level, RecordingDiagnostics};
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn locator() -> (Locator, Arc<RecordingDiagnostics>) {
        let sink = Arc::new(RecordingDiagnostics::new());
        (Locator::new(sink.clone()), sink)
    }

    #[tokio::test]
    async fn test_pattern_finds_nested_maps() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "app.js", "x");
        write(temp.path(), "app.js.map", "{\"version\":3}");
        write(temp.path(), "assets/vendor.js", "y");
        write(temp.path(), "assets/vendor.js.map", "{}");

        let (locator, sink) = locator();
        let artifacts = locator.locate(temp.path(), &Selection::Pattern, "/").await;

        let originals: Vec<&str> = artifacts
            .iter()
            .map(|a| a.original_file_path.as_str())
            .collect();
        assert_eq!(originals, vec!["/app.js", "/assets/vendor.js"]);
        assert_eq!(artifacts[0].content, b"{\"version\":3}");
        assert_eq!(artifacts[0].sourcemap_path, temp.path().join("app.js.map"));
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_pattern_skips_map_without_source() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "app.js", "x");
        write(temp.path(), "app.js.map", "{}");
        write(temp.path(), "orphan.js.map", "{}");

        let (locator, sink) = locator();
        let artifacts = locator.locate(temp.path(), &Selection::Pattern, "/").await;

        assert_eq!(artifacts.len(), 1);
        assert!(sink.contains(Level::Warn, "No corresponding source found for 'orphan.js.map'"));
    }

    #[tokio::test]
    async fn test_pattern_applies_base_prefix() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "js/app.js", "x");
        write(temp.path(), "js/app.js.map", "{}");

        let (locator, _sink) = locator();
        let artifacts = locator
            .locate(temp.path(), &Selection::Pattern, "/static/")
            .await;

        assert_eq!(artifacts[0].original_file_path, "/static/js/app.js");
    }

    #[tokio::test]
    async fn test_pattern_drops_empty_map() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "app.js", "x");
        write(temp.path(), "app.js.map", "");

        let (locator, sink) = locator();
        let artifacts = locator.locate(temp.path(), &Selection::Pattern, "/").await;

        assert!(artifacts.is_empty());
        assert!(sink.contains(Level::Warn, "is empty"));
    }

    #[tokio::test]
    async fn test_missing_output_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let (locator, _sink) = locator();

        let artifacts = locator
            .locate(&temp.path().join("dist"), &Selection::Pattern, "/")
            .await;

        assert!(artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_manifest_filters_scripts_and_trusts_sources() {
        let temp = TempDir::new().unwrap();
        // Compiled app.js is deliberately absent: the manifest is trusted
        write(temp.path(), "app.js.map", "{}");
        write(temp.path(), "chunk.mjs.map", "{}");
        write(temp.path(), "style.css.map", "{}");

        let outputs = BuildOutputSet::new(["app.js", "chunk.mjs", "style.css", "index.html"]);
        let (locator, sink) = locator();
        let artifacts = locator
            .locate(temp.path(), &Selection::Manifest(outputs), "/")
            .await;

        let originals: Vec<&str> = artifacts
            .iter()
            .map(|a| a.original_file_path.as_str())
            .collect();
        assert_eq!(originals, vec!["/app.js", "/chunk.mjs"]);
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_manifest_unreadable_map_is_reported() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.js.map", "{}");

        let outputs = BuildOutputSet::new(["a.js", "b.js"]);
        let (locator, sink) = locator();
        let artifacts = locator
            .locate(temp.path(), &Selection::Manifest(outputs), "/")
            .await;

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].original_file_path, "/a.js");

        let warnings = sink.messages(Level::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Error reading sourcemap file"));
        assert!(warnings[0].contains("b.js.map"));
    }

    #[test]
    fn test_is_script_file() {
        assert!(is_script_file("app.js"));
        assert!(is_script_file("assets/chunk.cjs"));
        assert!(!is_script_file("app.js.map"));
        assert!(!is_script_file("style.css"));
        assert!(!is_script_file("js"));
    }
}
