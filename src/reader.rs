use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{EdfError, Result};
use crate::types::{EdfFile, EdfHeader, HeaderField};
use crate::EDF_HEADER_SIZE;

impl EdfFile {
    /// Loads a candidate file's base header.
    ///
    /// Only the first 256 bytes are read. The signal sub-headers and data
    /// records are never loaded, the file length is taken from metadata.
    ///
    /// # Errors
    ///
    /// * `EdfError::FileNotFound` - the file cannot be opened
    /// * `EdfError::HeaderTooShort` - the file is shorter than a base header
    /// * `EdfError::InvalidField` - the header does not decode, or the file
    ///   is shorter than its declared header size
    ///
    /// # Examples
    ///
    /// ```rust
    /// use edfdeid::EdfFile;
    /// use edfdeid::doctest_utils::SampleEdf;
    ///
    /// # let dir = tempfile::tempdir()?;
    /// # let path = dir.path().join("recording.edf");
    /// SampleEdf::default().start_date("15.06.20").write_to(&path)?;
    ///
    /// let file = EdfFile::open(&path)?;
    /// assert_eq!(file.header.start_date, "15.06.20");
    /// assert_eq!(file.raw_header.len(), 256);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| EdfError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        let byte_len = file.metadata()?.len();

        // 读取主头部（256字节）
        let mut raw_header = Vec::with_capacity(EDF_HEADER_SIZE);
        BufReader::new(file)
            .take(EDF_HEADER_SIZE as u64)
            .read_to_end(&mut raw_header)?;

        let header = EdfHeader::decode(&raw_header)?;

        if byte_len < header.header_byte_count.value() as u64 {
            return Err(EdfError::invalid_field(
                HeaderField::HeaderByteCount.name(),
                header.header_byte_count.raw(),
                format!("file is only {byte_len} bytes long"),
            ));
        }

        Ok(EdfFile {
            path: path.to_path_buf(),
            byte_len,
            raw_header,
            header,
        })
    }
}
