use std::ffi::OsStr;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use qbatch_core::error::Result;

/// Output for one query file.
///
/// Lines go to a temporary file next to the target. [`OutputFile::commit`]
/// renames it over the target; dropping without committing removes it and
/// leaves any previous target untouched.
pub struct OutputFile {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl OutputFile {
    pub fn create(output_dir: &Path, name: &OsStr) -> Result<Self> {
        let tmp = NamedTempFile::new_in(output_dir)?;
        Ok(Self { target: output_dir.join(name), writer: BufWriter::new(tmp) })
    }

    /// Flush, sync and atomically replace the target file.
    pub fn commit(self) -> Result<PathBuf> {
        let tmp = self.writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.target).map_err(|e| e.error)?;
        debug!(path = %self.target.display(), "output persisted");
        Ok(self.target)
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.writer.write(buf) }

    fn flush(&mut self) -> io::Result<()> { self.writer.flush() }
}
