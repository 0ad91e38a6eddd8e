//! Pass-through file system calls that fail the transaction on error.
//!
//! Each wrapper performs the plain std call, and if it fails, logs the OS
//! reason into the error log and marks the transaction failed. The call's
//! own result is returned unchanged.

use super::transaction::Transaction;
use crate::tx_log;

use std::fs::{DirBuilder, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

impl<C> Transaction<C> {
    /// Creates a single directory with the given permission bits.
    ///
    /// `mode` is ignored on non-unix platforms.
    pub fn create_dir(&mut self, path: impl AsRef<Path>, mode: u32) -> io::Result<()> {
        let path = path.as_ref();
        let mut builder = DirBuilder::new();

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        builder.create(path).inspect_err(|e| {
            tx_log!(self, "error creating directory {}: {}", path.display(), e).mark_failed();
        })
    }

    /// Opens a file with `options`.
    pub fn open(&mut self, path: impl AsRef<Path>, options: &OpenOptions) -> io::Result<File> {
        let path = path.as_ref();

        options.open(path).inspect_err(|e| {
            tx_log!(self, "error opening {}: {}", path.display(), e).mark_failed();
        })
    }

    /// Reads into `buf` once.
    pub fn read<R: Read>(&mut self, reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
        reader.read(buf).inspect_err(|e| {
            tx_log!(self, "error reading (up to {} bytes): {}", buf.len(), e).mark_failed();
        })
    }

    /// Writes `buf` once. A short write also fails the transaction.
    pub fn write<W: Write>(&mut self, writer: &mut W, buf: &[u8]) -> io::Result<usize> {
        match writer.write(buf) {
            Ok(written) if written == buf.len() => Ok(written),
            Ok(written) => {
                tx_log!(
                    self,
                    "error writing ({} of {} bytes): short write",
                    written,
                    buf.len()
                )
                .mark_failed();
                Ok(written)
            }
            Err(e) => {
                tx_log!(self, "error writing (0 of {} bytes): {}", buf.len(), e).mark_failed();
                Err(e)
            }
        }
    }
}
