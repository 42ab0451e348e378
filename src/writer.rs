use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::RotationTrigger;

/// State of the active log file.
#[derive(Debug)]
struct FileState {
    file: File,
    /// Bytes in the file, including what was there when it was opened.
    size: u64,
    /// Period suffix the file was opened under (empty without time rotation).
    time_suffix: String,
}

/// A writer that rotates log files based on size and/or time.
///
/// Size rotation copies the active file to `<name>.1`, shifts older backups
/// up by one and truncates the active file in place, so a `tail -f` on the
/// active file keeps working. Time rotation switches to `<name>.<period>`.
#[derive(Debug)]
pub struct RotatingWriter {
    base_path: PathBuf,
    trigger: RotationTrigger,
    max_age: Option<Duration>,
    state: Option<FileState>,
}

impl RotatingWriter {
    /// Create a new rotating writer, creating parent directories as needed.
    pub fn new(base_path: &Path, trigger: RotationTrigger) -> io::Result<Self> {
        let mut writer = Self {
            base_path: base_path.to_path_buf(),
            trigger,
            max_age: None,
            state: None,
        };

        if let Some(parent) = writer.base_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // A leftover file from a previous run is appended to unless it is
        // already over the size limit.
        let active = writer.current_file_path();
        if let Some(max_size) = writer.trigger.max_size()
            && active.metadata().is_ok_and(|m| m.len() > max_size)
        {
            writer.rotate_by_size()?;
        }
        writer.state = Some(writer.open_active()?);

        Ok(writer)
    }

    /// Remove rotated siblings older than `max_age` whenever a rotation happens.
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Path of the file currently being written.
    pub fn current_file_path(&self) -> PathBuf {
        let suffix = self.current_time_suffix();
        if suffix.is_empty() {
            self.base_path.clone()
        } else {
            PathBuf::from(format!("{}.{}", self.base_path.display(), suffix))
        }
    }

    fn current_time_suffix(&self) -> String {
        self.trigger
            .period()
            .map(|period| period.current_suffix())
            .unwrap_or_default()
    }

    fn open_active(&self) -> io::Result<FileState> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.current_file_path())?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(FileState {
            file,
            size,
            time_suffix: self.current_time_suffix(),
        })
    }

    /// Shift `current.N-1 -> current.N`, copy the active file to `current.1`
    /// and truncate it. The oldest backup beyond `max_backups` is discarded.
    fn rotate_by_size(&self) -> io::Result<()> {
        let max_backups = self.trigger.max_backups().unwrap_or(1).max(1);
        let current = self.current_file_path();
        let backup = |n: usize| PathBuf::from(format!("{}.{}", current.display(), n));

        let oldest = backup(max_backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for i in (1..max_backups).rev() {
            let from = backup(i);
            if from.exists() {
                fs::rename(&from, backup(i + 1))?;
            }
        }

        if current.exists() {
            fs::copy(&current, backup(1))?;
            OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(&current)?;
        }

        Ok(())
    }

    /// Delete siblings named `<base>.*` last modified before `max_age`.
    fn prune_expired(&self) {
        let Some(max_age) = self.max_age else {
            return;
        };
        let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
            return;
        };
        let Some(file_name) = self.base_path.file_name() else {
            return;
        };
        let prefix = format!("{}.", file_name.to_string_lossy());
        let dir = match self.base_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let active = self.current_file_path();

        let Ok(entries) = fs::read_dir(&dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path == active || !entry.file_name().to_string_lossy().starts_with(&prefix) {
                continue;
            }
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .is_ok_and(|modified| modified < cutoff);
            if expired {
                let _ = fs::remove_file(&path);
            }
        }
    }

    /// Rotate if the period changed or `buf_len` more bytes would exceed the size limit.
    fn rotate_if_needed(&mut self, buf_len: usize) -> io::Result<()> {
        let (period_changed, size_exceeded) = match &self.state {
            None => (true, false),
            Some(state) => {
                let period_changed = state.time_suffix != self.current_time_suffix();
                let size_exceeded = self.trigger.max_size().is_some_and(|max_size| {
                    state.size > 0 && state.size + buf_len as u64 > max_size
                });
                (period_changed, size_exceeded)
            }
        };

        if !period_changed && !size_exceeded {
            return Ok(());
        }

        self.state = None;
        if size_exceeded && !period_changed {
            self.rotate_by_size()?;
        }
        self.prune_expired();
        self.state = Some(self.open_active()?);

        Ok(())
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.rotate_if_needed(buf.len())?;

        match self.state.as_mut() {
            Some(state) => {
                let written = state.file.write(buf)?;
                state.size += written as u64;
                Ok(written)
            }
            None => Err(io::Error::other("log file is not open")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.state.as_mut() {
            Some(state) => state.file.flush(),
            None => Ok(()),
        }
    }
}
