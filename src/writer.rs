use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};

use tracing::debug;

use crate::error::{EdfError, Result};
use crate::types::EdfFile;
use crate::EDF_HEADER_SIZE;

/// Commits a re-encoded base header into an existing EDF file.
///
/// The header occupies a fixed 256-byte range at offset 0, so the commit is
/// one contiguous `write_all` of exactly that range followed by `sync_data`.
/// Bytes at or after offset 256 are neither read nor written.
///
/// # Examples
///
/// ```rust
/// use edfdeid::{EdfFile, RecordWriter};
/// use edfdeid::doctest_utils::SampleEdf;
///
/// # let dir = tempfile::tempdir()?;
/// # let path = dir.path().join("recording.edf");
/// SampleEdf::default().patient_id("John Doe").write_to(&path)?;
///
/// let mut file = EdfFile::open(&path)?;
/// file.header.patient_id.clear();
/// let block = file.header.encode()?;
/// RecordWriter::commit(&file, &block)?;
///
/// assert_eq!(EdfFile::open(&path)?.header.patient_id, "");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct RecordWriter;

impl RecordWriter {
    /// Overwrites the base header of `file` with `block`.
    ///
    /// # Errors
    ///
    /// * `EdfError::InvalidField` - `block` is not exactly 256 bytes
    /// * `EdfError::HeaderChanged` - the header on disk no longer matches the
    ///   one `file` was loaded from, or the file length changed
    /// * `EdfError::Io` - any read, write or sync failure
    pub fn commit(file: &EdfFile, block: &[u8]) -> Result<()> {
        if block.len() != EDF_HEADER_SIZE {
            return Err(EdfError::invalid_field(
                "header",
                &format!("{} bytes", block.len()),
                format!("encoded header must be exactly {EDF_HEADER_SIZE} bytes"),
            ));
        }

        let mut handle = OpenOptions::new().read(true).write(true).open(&file.path)?;

        // 写入前确认磁盘上的头部与加载时一致
        let mut on_disk = vec![0u8; EDF_HEADER_SIZE];
        handle.read_exact(&mut on_disk)?;
        if on_disk != file.raw_header {
            return Err(EdfError::HeaderChanged(file.path.display().to_string()));
        }
        if handle.metadata()?.len() != file.byte_len {
            return Err(EdfError::HeaderChanged(file.path.display().to_string()));
        }

        handle.seek(SeekFrom::Start(0))?;
        handle.write_all(block)?;
        handle.flush()?;
        handle.sync_data()?;

        let len_after = handle.metadata()?.len();
        if len_after != file.byte_len {
            return Err(EdfError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!(
                    "{}: file length changed from {} to {}",
                    file.path.display(),
                    file.byte_len,
                    len_after
                ),
            )));
        }

        debug!(path = %file.path.display(), "header committed");
        Ok(())
    }
}
