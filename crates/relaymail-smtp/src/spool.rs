//! Message sources: spool files and spool directories.
//!
//! A spool file holds one message with its envelope:
//!
//! ```text
//! MAIL FROM:<sender@example.org>
//! RCPT TO:<one@example.net>
//! RCPT TO:<two@example.net>
//! DATA
//! Subject: hello
//!
//! Message text...
//! ```
//!
//! A spool directory contributes every regular file in it.

use std::io;
use std::path::{Path, PathBuf};

/// One entry of the message list given by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpoolEntry {
    /// A single message file.
    File(PathBuf),
    /// A directory whose regular files are all messages.
    Directory(PathBuf),
}

/// Ordered list of message sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSource {
    entries: Vec<SpoolEntry>,
}

impl MessageSource {
    /// Creates an empty source.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a message file.
    pub fn push_file(&mut self, path: impl Into<PathBuf>) {
        self.entries.push(SpoolEntry::File(path.into()));
    }

    /// Appends a spool directory.
    pub fn push_directory(&mut self, path: impl Into<PathBuf>) {
        self.entries.push(SpoolEntry::Directory(path.into()));
    }

    /// Returns the entries in order.
    #[must_use]
    pub fn entries(&self) -> &[SpoolEntry] {
        &self.entries
    }

    /// Returns true if no entry was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattens the source into message file paths.
    ///
    /// Files are kept in the order given; a directory expands to its regular
    /// files sorted by name. Unreadable directories are logged and skipped.
    pub async fn messages(&self) -> Vec<PathBuf> {
        let mut messages = Vec::new();
        for entry in &self.entries {
            match entry {
                SpoolEntry::File(path) => messages.push(path.clone()),
                SpoolEntry::Directory(dir) => match list_directory(dir).await {
                    Ok(files) => messages.extend(files),
                    Err(e) => {
                        tracing::error!(dir = %dir.display(), error = %e, "cannot read spool directory");
                    }
                },
            }
        }
        messages
    }
}

impl FromIterator<SpoolEntry> for MessageSource {
    fn from_iter<I: IntoIterator<Item = SpoolEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Returns true if the source holds at least one message.
///
/// Used to skip connecting when there is nothing to send.
pub async fn has_pending_work(source: &MessageSource) -> bool {
    for entry in source.entries() {
        let pending = match entry {
            SpoolEntry::File(path) => tokio::fs::try_exists(path).await.unwrap_or(false),
            SpoolEntry::Directory(dir) => list_directory(dir)
                .await
                .is_ok_and(|files| !files.is_empty()),
        };
        if pending {
            return true;
        }
    }
    false
}

async fn list_directory(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut reader = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = reader.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}
