//! Whole-file reads and crash-safe writes for the file entry points.

use crate::error::{Error, Result};
use getrandom::fill;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A file on disk that is read and written in one piece.
///
/// I/O failures are returned as [`Error::Io`] with the original
/// [`std::io::Error`] untouched.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the whole file into memory.
    pub fn load(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.path)?)
    }

    /// Writes `data` so that readers see either the old file or the complete
    /// new one, never a partial write.
    ///
    /// The bytes go to a randomly named sibling file first, which is synced and
    /// then moved over the target. The containing directory is synced last so
    /// the rename itself survives a crash. Missing parent directories are
    /// created.
    pub fn save(&self, data: &[u8]) -> Result<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let tmp_path = self.random_tmp_path()?;

        // create_new: never clobber a file we did not create
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;

        let written = tmp_file
            .write_all(data)
            .and_then(|_| tmp_file.sync_all());
        drop(tmp_file);

        let replaced = written
            .map_err(Error::from)
            .and_then(|_| self.replace_with(&tmp_path));

        if let Err(e) = replaced {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        sync_dir(dir)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    /// `<file name>.tmp.<16 hex chars>` next to the target.
    fn random_tmp_path(&self) -> Result<PathBuf> {
        let mut buf = [0u8; 8];
        fill(&mut buf).map_err(|_| Error::Rng)?;

        let file_name = self.path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file path", self.path.display()),
            )
        })?;

        let tmp_name = format!("{}.tmp.{}", file_name.to_string_lossy(), hex::encode(buf));
        Ok(self.path.with_file_name(tmp_name))
    }

    #[cfg(target_os = "windows")]
    fn replace_with(&self, tmp_path: &Path) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        // ReplaceFileW needs an existing target
        if !self.path.exists() {
            fs::rename(tmp_path, &self.path)?;
            return Ok(());
        }

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY: both buffers are NUL-terminated UTF-16 that outlive the call,
        // and Windows does not keep the pointers.
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            return Err(io::Error::last_os_error().into());
        }
        Ok(())
    }

    /// rename(2) is atomic within one filesystem, and the temp file is a sibling.
    #[cfg(not(target_os = "windows"))]
    fn replace_with(&self, tmp_path: &Path) -> Result<()> {
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}

#[cfg(not(target_os = "windows"))]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

// Directories cannot be opened as files on Windows; ReplaceFileW writes through.
#[cfg(target_os = "windows")]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
