//! File-backed append log.
//!
//! Implements [`LogSinkPort`] with one `<day_key>.csv` file per day under a
//! root directory.  On device the root is the SD card VFS mount point
//! (`/sdcard`), so plain `std::fs` reaches FAT through ESP-IDF's VFS layer;
//! on host it is any directory.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::warn;

use crate::app::ports::{LogError, LogSinkPort};

/// Default SD card mount point on the device.
pub const SD_MOUNT_POINT: &str = "/sdcard";

pub struct FileLogSink {
    root: PathBuf,
}

impl FileLogSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn day_path(&self, day_key: &str) -> PathBuf {
        self.root.join(format!("{day_key}.csv"))
    }
}

impl LogSinkPort for FileLogSink {
    fn exists(&self, day_key: &str) -> bool {
        self.day_path(day_key).is_file()
    }

    fn append(&mut self, day_key: &str, row: &str) -> Result<(), LogError> {
        if !self.root.is_dir() {
            return Err(LogError::NoMedium);
        }
        let path = self.day_path(day_key);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                warn!("file_log: open {} failed: {}", path.display(), e);
                LogError::WriteFailed
            })?;
        writeln!(file, "{row}").map_err(|e| {
            warn!("file_log: write {} failed: {}", path.display(), e);
            LogError::WriteFailed
        })
    }
}
