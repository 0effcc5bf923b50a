//! Line-oriented config document
//!
//! In-memory representation of the managed artifact as an ordered sequence
//! of lines. Patching replaces the value of exactly one `KEY=value` line and
//! leaves every other byte of the file alone, so an untouched document saves
//! back identically to what was loaded.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::ArtifactError;

/// Timestamp format used in patch annotations
pub const ANNOTATION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the human-readable annotation appended to a patched line
///
/// # Examples
/// ```
/// # use cutover_artifact::document::change_annotation;
/// # use chrono::{TimeZone, Utc};
/// let at = Utc.with_ymd_and_hms(2026, 8, 27, 12, 0, 0).unwrap();
/// assert_eq!(
///     change_annotation("alice", at),
///     "Updated by alice on 2026-08-27 12:00:00"
/// );
/// ```
#[inline]
#[must_use]
pub fn change_annotation(actor: &str, at: DateTime<Utc>) -> String {
    format!("Updated by {} on {}", actor, at.format(ANNOTATION_TIME_FORMAT))
}

/// Line-oriented config document
///
/// Identity is the file path it was loaded from. Loaded fresh at the start
/// of each mutation attempt, mutated in memory, persisted only once the
/// in-memory patch succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    /// Path the document was loaded from
    path: PathBuf,
    /// Ordered lines, without terminators
    lines: Vec<String>,
    /// Whether the source file ended with a newline
    trailing_newline: bool,
}

impl ConfigDocument {
    /// Load the artifact as a sequence of lines
    ///
    /// # Errors
    /// Returns `ArtifactError::Read` if the file cannot be read.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref().to_path_buf();
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ArtifactError::Read {
                path: path.clone(),
                source,
            })?;
        Ok(Self::from_contents(path, &raw))
    }

    /// Build a document from already-read contents
    #[must_use]
    pub fn from_contents(path: PathBuf, raw: &str) -> Self {
        let trailing_newline = raw.ends_with('\n');
        let mut lines: Vec<String> = raw.split('\n').map(str::to_string).collect();
        if trailing_newline {
            // split() leaves an empty tail after the final newline
            lines.pop();
        }
        Self {
            path,
            lines,
            trailing_newline,
        }
    }

    /// Replace the value of the first line carrying `key=`
    ///
    /// Scans lines in order for the first line whose content, ignoring
    /// leading whitespace and an optional `-` list-item marker, begins with
    /// `key=`. Only that line is rewritten; the captured prefix is kept
    /// verbatim and `annotation` is appended as a trailing comment. Later
    /// matches (commented-out duplicates and the like) are never touched.
    ///
    /// Returns `false` without modifying the document when no line matches.
    /// That is a non-fatal "key not found" signal, not an error.
    pub fn patch_key(&mut self, key: &str, new_value: &str, annotation: &str) -> bool {
        for line in &mut self.lines {
            if let Some(prefix_len) = match_key_prefix(line, key) {
                let prefix = &line[..prefix_len];
                *line = format!("{prefix}{key}={new_value}  # {annotation}");
                return true;
            }
        }
        false
    }

    /// Best-effort read of the managed key's current value
    ///
    /// Returns the value of the first matching line with any previously
    /// appended annotation comment stripped. Used for the audit record's
    /// old-value field; `None` simply means the key was not parsed.
    #[must_use]
    pub fn value_of(&self, key: &str) -> Option<&str> {
        for line in &self.lines {
            if let Some(prefix_len) = match_key_prefix(line, key) {
                let rest = &line[prefix_len + key.len() + 1..];
                let value = match rest.find("  #") {
                    Some(pos) => &rest[..pos],
                    None => rest,
                };
                return Some(value.trim_end());
            }
        }
        None
    }

    /// Write the full line sequence back over the artifact
    ///
    /// # Errors
    /// Returns `ArtifactError::Write` if the file cannot be written.
    pub async fn save(&self) -> Result<(), ArtifactError> {
        self.save_to(&self.path).await
    }

    /// Write the full line sequence to an arbitrary path
    ///
    /// # Errors
    /// Returns `ArtifactError::Write` if the file cannot be written.
    pub async fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        tokio::fs::write(path, self.render())
            .await
            .map_err(|source| ArtifactError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Render the document to its on-disk form
    ///
    /// Round-trips byte-identically with the loaded contents when no patch
    /// was applied.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }

    /// Path the document was loaded from
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Match a line against `[whitespace][-][whitespace]key=`
///
/// Returns the byte length of the prefix before `key` when the line carries
/// the managed key, mirroring the anchored capture the patch preserves.
fn match_key_prefix(line: &str, key: &str) -> Option<usize> {
    let after_ws = line.trim_start_matches([' ', '\t']);
    let rest = if let Some(after_dash) = after_ws.strip_prefix('-') {
        after_dash.trim_start_matches([' ', '\t'])
    } else {
        after_ws
    };
    rest.strip_prefix(key).and_then(|r| r.strip_prefix('='))?;
    Some(line.len() - rest.len())
}
