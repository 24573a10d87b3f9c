//! Direct access to the records of an open DAF file, and the handle table
//! that owns every open file of a kernel context.
//!
//! A DAF file is a sequence of 1024-byte records. Record 1 is the file
//! record ([`DAFHeader`]); records `2..FWARD` hold the comment area; the
//! rest interleaves summary/name record pairs and data records. Data are
//! addressed in **double precision words**, 1-based: word `addr` lives at byte
//! `(addr - 1) * 8`.
//!
//! [`DafFile`] never loads more than the requested record or word range in
//! memory. Every numeric value is decoded with the byte order detected when
//! the file was opened.
//!
//! [`DafHandles`] hands out opaque [`DafHandle`]s. A file stays open exactly
//! as long as its handle is in the table; [`DafHandles::len`] is the number
//! of currently open files, which must drop back to zero once every kernel has
//! been unloaded.

use std::{
    fmt,
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
};

use ahash::AHashMap;
use camino::{Utf8Path, Utf8PathBuf};
use nom::number::{complete::f64 as nom_f64, Endianness};

use crate::{
    constants::{DAF_RECORD_LEN, DAF_RECORD_WORDS},
    jpl_ephem::naif::daf_header::DAFHeader,
    kernel_errors::KernelError,
};

/// One open DAF file.
#[derive(Debug)]
pub struct DafFile {
    path: Utf8PathBuf,
    reader: BufReader<File>,
    header: DAFHeader,
    endian: Endianness,
    n_records: usize,
}

impl DafFile {
    /// Open and validate a DAF file.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: Location of the kernel.
    ///
    /// Return
    /// ----------
    /// * The open [`DafFile`], with its byte order detected and its file record validated.
    /// * [`KernelError::IoError`] if the file cannot be opened or read,
    ///   [`KernelError::Format`] if it is not a conforming DAF.
    pub fn open(path: &Utf8Path) -> Result<Self, KernelError> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len() as usize;
        if file_len < DAF_RECORD_LEN {
            return Err(KernelError::Format(format!(
                "{path}: file of {file_len} bytes is too small for a DAF file record"
            )));
        }
        let mut reader = BufReader::new(file);

        let mut record = [0u8; DAF_RECORD_LEN];
        reader.read_exact(&mut record)?;

        let endian = DAFHeader::detect_endianness(&record)?;
        let (_, header) = DAFHeader::parse(&record, endian)?;
        let n_records = file_len.div_ceil(DAF_RECORD_LEN);
        header
            .validate(&record, n_records)
            .map_err(|e| match e {
                KernelError::Format(msg) => KernelError::Format(format!("{path}: {msg}")),
                other => other,
            })?;

        Ok(DafFile {
            path: path.to_path_buf(),
            reader,
            header,
            endian,
            n_records,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn header(&self) -> &DAFHeader {
        &self.header
    }

    pub fn endian(&self) -> Endianness {
        self.endian
    }

    pub fn nd(&self) -> usize {
        self.header.nd as usize
    }

    pub fn ni(&self) -> usize {
        self.header.ni as usize
    }

    /// Number of double precision words addressable in the file.
    pub fn word_count(&self) -> usize {
        self.n_records * DAF_RECORD_WORDS
    }

    /// Read record `n` (1-based).
    ///
    /// A last record shorter than 1024 bytes is zero padded; any record
    /// starting beyond the end of the file is a [`KernelError::Format`].
    pub fn read_record(&mut self, n: usize) -> Result<[u8; DAF_RECORD_LEN], KernelError> {
        if n == 0 || n > self.n_records {
            return Err(KernelError::Format(format!(
                "{}: record {n} out of range 1..={}",
                self.path, self.n_records
            )));
        }
        let mut record = [0u8; DAF_RECORD_LEN];
        self.reader
            .seek(SeekFrom::Start(((n - 1) * DAF_RECORD_LEN) as u64))?;
        let mut filled = 0;
        while filled < DAF_RECORD_LEN {
            let read = self.reader.read(&mut record[filled..])?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        Ok(record)
    }

    /// Read `count` double precision words starting at DAF address `start` (1-based).
    pub fn read_doubles(&mut self, start: usize, count: usize) -> Result<Vec<f64>, KernelError> {
        if start == 0 {
            return Err(KernelError::Format("DAF addresses start at 1".into()));
        }
        let past_end = || {
            KernelError::Format(format!(
                "{}: {count} words from word {start} lie past the end of the file",
                self.path
            ))
        };
        if count > self.word_count().saturating_sub(start - 1) {
            return Err(past_end());
        }
        let mut buf = vec![0u8; count * 8];
        self.reader.seek(SeekFrom::Start(((start - 1) * 8) as u64))?;
        self.reader.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                past_end()
            } else {
                KernelError::IoError(e)
            }
        })?;
        decode_doubles(&buf, self.endian)
    }

    /// Text of the comment area (records `2..FWARD`), with NUL line ends mapped to newlines.
    pub fn comment_area(&mut self) -> Result<String, KernelError> {
        let mut text = Vec::new();
        for n in 2..self.header.fward as usize {
            let record = self.read_record(n)?;
            // the last 24 bytes of a comment record are unused
            text.extend_from_slice(&record[..1000]);
        }
        let text = String::from_utf8_lossy(&text)
            .replace('\0', "\n")
            .replace('\u{4}', "");
        Ok(text.trim_end().to_string())
    }
}

/// Decode a byte slice into double precision words of the given byte order.
pub(crate) fn decode_doubles(bytes: &[u8], endian: Endianness) -> Result<Vec<f64>, KernelError> {
    let mut words = Vec::with_capacity(bytes.len() / 8);
    let mut input = bytes;
    while !input.is_empty() {
        let (rest, word) = nom_f64::<_, nom::error::Error<&[u8]>>(endian)(input)?;
        words.push(word);
        input = rest;
    }
    Ok(words)
}

/// Opaque identifier of an open DAF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DafHandle(u32);

impl DafHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for DafHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DAF#{}", self.0)
    }
}

/// Table of the open DAF files of one context.
#[derive(Debug, Default)]
pub struct DafHandles {
    files: AHashMap<DafHandle, DafFile>,
    next_id: u32,
}

impl DafHandles {
    pub fn new() -> Self {
        DafHandles::default()
    }

    /// Open `path` and register it under a fresh handle.
    ///
    /// Nothing is registered when the open fails.
    pub fn open(&mut self, path: &Utf8Path) -> Result<DafHandle, KernelError> {
        let file = DafFile::open(path)?;
        self.next_id += 1;
        let handle = DafHandle(self.next_id);
        tracing::debug!(%handle, %path, endian = ?file.endian(), "opened DAF file");
        self.files.insert(handle, file);
        Ok(handle)
    }

    /// Close the file behind `handle`. Returns `false` if the handle was not open.
    pub fn close(&mut self, handle: DafHandle) -> bool {
        match self.files.remove(&handle) {
            Some(file) => {
                tracing::debug!(%handle, path = %file.path(), "closed DAF file");
                true
            }
            None => false,
        }
    }

    /// Handle of an open file whose path is `path`, if any.
    pub fn is_loaded(&self, path: &Utf8Path) -> Option<DafHandle> {
        self.files
            .iter()
            .filter(|(_, file)| file.path() == path)
            .map(|(handle, _)| *handle)
            .min()
    }

    pub fn get_mut(&mut self, handle: DafHandle) -> Result<&mut DafFile, KernelError> {
        self.files
            .get_mut(&handle)
            .ok_or(KernelError::UnknownHandle(handle.0))
    }

    /// Number of open files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Close every open file.
    pub fn close_all(&mut self) {
        let mut handles: Vec<DafHandle> = self.files.keys().copied().collect();
        handles.sort_unstable();
        for handle in handles {
            self.close(handle);
        }
    }
}
