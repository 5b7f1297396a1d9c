use crate::bids::{desc_tag, session_label};
use crate::steps::PreprocStep;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One discoverable session: the label shown in the dropdown and the
/// figure filename it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEntry {
    pub label: String,
    pub filename: String,
}

/// Discovers subjects, sessions and preprocessing steps under a
/// derivatives tree. Nothing is cached; every call re-reads the
/// filesystem.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
}

impl Scanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn figures_dir(&self, subject: &str) -> PathBuf {
        self.root.join(format!("sub-{subject}")).join("figures")
    }

    /// Subject ids from `sub-<id>` directories, sorted. May be empty; the
    /// caller decides whether that is fatal.
    pub fn list_subjects(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("reading derivatives root {}", self.root.display()))?;
        let mut subjects = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(id) = name.strip_prefix("sub-") {
                subjects.push(id.to_string());
            }
        }
        subjects.sort();
        Ok(subjects)
    }

    /// Sessions that have a default-step figure for `subject`, sorted by
    /// filename.
    pub fn list_sessions(&self, subject: &str) -> Result<Vec<SessionEntry>> {
        let suffix = format!("desc-{}_bold.svg", PreprocStep::DEFAULT.tag());
        let mut filenames = self.figure_names(subject, |name| name.ends_with(&suffix))?;
        filenames.sort();
        Ok(filenames
            .into_iter()
            .map(|filename| SessionEntry {
                label: session_label(&filename),
                filename,
            })
            .collect())
    }

    /// Step tags found for one subject/session, filename-sorted, filtered
    /// to the known step table in discovery order.
    pub fn list_steps(&self, subject: &str, session_label: &str) -> Result<Vec<PreprocStep>> {
        let prefix = format!("sub-{subject}_{session_label}_");
        let mut filenames = self.figure_names(subject, |name| {
            name.starts_with(&prefix) && name.ends_with("_bold.svg")
        })?;
        filenames.sort();
        Ok(filenames
            .iter()
            .filter_map(|name| desc_tag(name))
            .filter_map(PreprocStep::from_tag)
            .collect())
    }

    fn figure_names(&self, subject: &str, keep: impl Fn(&str) -> bool) -> Result<Vec<String>> {
        let dir = self.figures_dir(subject);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            // a subject without a figures directory simply has no sessions
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err).with_context(|| format!("reading {}", dir.display())),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(name) = name.to_str() {
                if keep(name) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }
}
