//! Append-only line writer with size-based rotation.
//!
//! When the active file would grow past the policy's size limit, it becomes
//! `<name>.1`, older backups shift up by one, and anything beyond the
//! retention count is deleted.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Size limit and backup retention for a [`RotatingFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub max_backups: usize,
}

impl Default for RotationPolicy {
    /// 10 MB per file, three backups.
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            max_backups: 3,
        }
    }
}

/// Thread-safe rotating file. The handle is opened on first write.
pub struct RotatingFile {
    path: PathBuf,
    policy: RotationPolicy,
    file: Mutex<Option<File>>,
}

impl RotatingFile {
    pub const fn new(path: PathBuf, policy: RotationPolicy) -> Self {
        Self {
            path,
            policy,
            file: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of backup number `n`, where `1` is the newest.
    #[must_use]
    pub fn backup_path(&self, n: usize) -> PathBuf {
        let mut name: OsString = self.path.clone().into_os_string();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    /// Appends `line` plus a newline, rotating first if it would not fit.
    ///
    /// A single line larger than the limit is still written, alone, to a
    /// fresh file.
    ///
    /// # Errors
    ///
    /// Returns an error if rotation, opening, or writing fails.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("writer lock poisoned: {e}")))?;

        let incoming = u64::try_from(line.len()).unwrap_or(u64::MAX).saturating_add(1);
        let current = fs::metadata(&self.path).map_or(0, |m| m.len());
        if current > 0 && current.saturating_add(incoming) > self.policy.max_bytes {
            *guard = None;
            self.rotate()?;
        }

        if guard.is_none() {
            *guard = Some(OpenOptions::new().create(true).append(true).open(&self.path)?);
        }
        let file = guard
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "trace file unavailable"))?;

        writeln!(file, "{line}")?;
        file.flush()
    }

    fn rotate(&self) -> io::Result<()> {
        if self.policy.max_backups == 0 {
            return fs::remove_file(&self.path);
        }

        let oldest = self.backup_path(self.policy.max_backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.policy.max_backups).rev() {
            let from = self.backup_path(n);
            if from.exists() {
                fs::rename(&from, self.backup_path(n + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1))
    }
}

impl std::fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFile")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn small(dir: &TempDir, max_backups: usize) -> RotatingFile {
        RotatingFile::new(
            dir.path().join("trace.json"),
            RotationPolicy { max_bytes: 16, max_backups },
        )
    }

    #[test]
    fn appends_until_limit() {
        let dir = TempDir::new().unwrap();
        let writer = small(&dir, 3);
        writer.write_line("aaaa").unwrap();
        writer.write_line("bbbb").unwrap();

        assert_eq!(fs::read_to_string(writer.path()).unwrap(), "aaaa\nbbbb\n");
        assert!(!writer.backup_path(1).exists());
    }

    #[test]
    fn rotates_and_keeps_newest_backups() {
        let dir = TempDir::new().unwrap();
        let writer = small(&dir, 2);
        for line in ["0000000000", "1111111111", "2222222222", "3333333333"] {
            writer.write_line(line).unwrap();
        }

        assert_eq!(fs::read_to_string(writer.path()).unwrap(), "3333333333\n");
        assert_eq!(fs::read_to_string(writer.backup_path(1)).unwrap(), "2222222222\n");
        assert_eq!(fs::read_to_string(writer.backup_path(2)).unwrap(), "1111111111\n");
        assert!(!writer.backup_path(3).exists());
    }

    #[test]
    fn zero_backups_truncates() {
        let dir = TempDir::new().unwrap();
        let writer = small(&dir, 0);
        writer.write_line("0000000000").unwrap();
        writer.write_line("1111111111").unwrap();

        assert_eq!(fs::read_to_string(writer.path()).unwrap(), "1111111111\n");
        assert!(!writer.backup_path(1).exists());
    }

    #[test]
    fn oversized_line_is_written_alone() {
        let dir = TempDir::new().unwrap();
        let writer = small(&dir, 1);
        let long = "x".repeat(40);
        writer.write_line(&long).unwrap();
        writer.write_line("y").unwrap();

        assert_eq!(fs::read_to_string(writer.backup_path(1)).unwrap(), format!("{long}\n"));
        assert_eq!(fs::read_to_string(writer.path()).unwrap(), "y\n");
    }
}
