//! DAF (Double Precision Array File) file record parsing utilities.
//!
//! This module provides a parser and a pretty-printer for the fixed-size DAF
//! file record (the first 1024 bytes of every SPK kernel). It extracts the
//! structural metadata (summary layout, directory pointers, first free
//! address, binary format tag) and exposes them through [`DAFHeader`].
//!
//! # What the file record contains
//!
//! * **`idword`**: Format identifier (e.g. `"DAF/SPK "`), eight ASCII bytes.
//!   Pre-1995 kernels use the legacy `"NAIF/DAF"` identifier.
//! * **`nd`** / **`ni`**: Number of double-precision / integer components
//!   in each array summary. For SPK this is `nd = 2`, `ni = 6`.
//! * **`fward`** / **`bward`**: Record numbers (1-based) of the first and last
//!   summary record of the doubly-linked array directory.
//! * **`free`**: Address (1-based, in double-precision words) of the first free
//!   location in the file.
//! * **`internal_filename`**: Kernel name (60 bytes, padded).
//! * **`locfmt`**: Binary platform tag (`"BIG-IEEE"` or `"LTL-IEEE"`).
//! * **`fptstr`**: NAIF FTP sentinel string used for transfer integrity checks.
//!
//! # Endianness
//!
//! Integers of the file record are written in the byte order of the machine
//! that produced the kernel. [`DAFHeader::detect_endianness`] reads the
//! `LOCFMT` tag when it is present and otherwise falls back to checking which
//! byte order yields plausible `ND`/`NI` values. The detected
//! [`Endianness`] is then used for every numeric read of the file.
//!
//! # Example
//!
//! ```rust, no_run
//! use std::fs::File;
//! use std::io::Read;
//! use naif_spk::jpl_ephem::naif::daf_header::DAFHeader;
//!
//! let mut buf = vec![0u8; 1024];
//! File::open("de440.bsp").unwrap().read_exact(&mut buf).unwrap();
//! let endian = DAFHeader::detect_endianness(&buf).unwrap();
//! let (_rest, header) = DAFHeader::parse(&buf, endian).unwrap();
//! println!("{header}");
//! assert_eq!(header.idword, "DAF/SPK");
//! ```

use std::fmt;

use nom::{
    bytes::complete::take,
    number::{complete::i32 as nom_i32, Endianness},
    IResult,
};

use crate::{
    constants::{DAF_RECORD_LEN, FTPSTR, FTPSTR_OFFSET, MAX_ND, MAX_SUMMARY_WORDS, MIN_NI},
    kernel_errors::KernelError,
};

/// Location of the `LOCFMT` tag inside the file record.
const LOCFMT_RANGE: std::ops::Range<usize> = 88..96;

/// In-memory representation of the DAF file record.
///
/// String fields are already trimmed of their trailing padding.
#[derive(Debug, PartialEq, Clone)]
pub struct DAFHeader {
    /// 8-byte identifier, typically `"DAF/SPK"`.
    pub idword: String,
    /// 60-byte, padded internal kernel name.
    pub internal_filename: String,
    /// Number of double-precision components in each summary (ND).
    pub nd: i32,
    /// Number of integer components in each summary (NI).
    pub ni: i32,
    /// Record index of the first summary record (forward pointer).
    pub fward: i32,
    /// Record index of the last summary record (backward pointer).
    pub bward: i32,
    /// First free address (in double-precision words, 1-based).
    pub free: i32,
    /// Platform tag describing numeric representation (e.g. `"LTL-IEEE"`).
    pub locfmt: String,
    /// NAIF FTP sentinel string.
    pub fptstr: String,
}

fn plausible_layout(record: &[u8], endian: Endianness) -> bool {
    let read = |range: std::ops::Range<usize>| -> Option<i32> {
        let bytes: [u8; 4] = record.get(range)?.try_into().ok()?;
        Some(match endian {
            Endianness::Big => i32::from_be_bytes(bytes),
            _ => i32::from_le_bytes(bytes),
        })
    };
    match (read(8..12), read(12..16)) {
        (Some(nd), Some(ni)) => {
            (0..=MAX_ND as i32).contains(&nd) && (MIN_NI as i32..=250).contains(&ni)
        }
        _ => false,
    }
}

impl DAFHeader {
    /// Determine the byte order of a DAF file from its first record.
    ///
    /// Arguments
    /// -----------------
    /// * `record`: The first 1024 bytes of the file.
    ///
    /// Return
    /// ----------
    /// * The [`Endianness`] announced by `LOCFMT`, or inferred from the
    ///   plausibility of `ND`/`NI` when the tag is absent.
    /// * [`KernelError::Format`] if neither byte order yields a valid layout.
    pub fn detect_endianness(record: &[u8]) -> Result<Endianness, KernelError> {
        if record.len() < DAF_RECORD_LEN {
            return Err(KernelError::Format(format!(
                "file record is {} bytes, expected {DAF_RECORD_LEN}",
                record.len()
            )));
        }

        match &record[LOCFMT_RANGE] {
            b"BIG-IEEE" => return Ok(Endianness::Big),
            b"LTL-IEEE" => return Ok(Endianness::Little),
            _ => {}
        }

        match (
            plausible_layout(record, Endianness::Little),
            plausible_layout(record, Endianness::Big),
        ) {
            (true, _) => Ok(Endianness::Little),
            (false, true) => Ok(Endianness::Big),
            (false, false) => Err(KernelError::Format(
                "cannot determine the byte order of the file record".into(),
            )),
        }
    }

    /// Parse the first 1024-byte DAF record into a [`DAFHeader`].
    ///
    /// Arguments
    /// -----------------
    /// * `input`: A byte slice starting at the beginning of the file, at least 1024 bytes long.
    /// * `endian`: Byte order of the integers of the record.
    ///
    /// Return
    /// ----------
    /// * An [`IResult`] whose value is `(remaining, header)`.
    pub fn parse(input: &[u8], endian: Endianness) -> IResult<&[u8], Self> {
        let (input, id_word) = take(8usize)(input)?; // "DAF/SPK "
        let (input, nd) = nom_i32(endian)(input)?; // ND
        let (input, ni) = nom_i32(endian)(input)?; // NI
        let (input, ifname) = take(60usize)(input)?; // internal file name
        let (input, fwd) = nom_i32(endian)(input)?; // forward ptr
        let (input, bwd) = nom_i32(endian)(input)?; // backward ptr
        let (input, free) = nom_i32(endian)(input)?; // first free address
        let (input, locfmt) = take(8usize)(input)?; // location format
        let (input, _) = take(603usize)(input)?; // reserved
        let (input, ftpstr) = take(28usize)(input)?; // ftp string
        let (input, _) = take(297usize)(input)?; // reserved
        Ok((
            input,
            DAFHeader {
                idword: String::from_utf8_lossy(id_word).trim().to_string(),
                internal_filename: String::from_utf8_lossy(ifname).trim().to_string(),
                nd,
                ni,
                fward: fwd,
                bward: bwd,
                free,
                locfmt: String::from_utf8_lossy(locfmt).trim().to_string(),
                fptstr: String::from_utf8_lossy(ftpstr).trim().to_string(),
            },
        ))
    }

    /// Check the structural consistency of the header.
    ///
    /// Arguments
    /// -----------------
    /// * `raw`: The raw file record the header was parsed from (needed for the FTP bytes).
    /// * `n_records`: Number of complete 1024-byte records in the file.
    ///
    /// Return
    /// ----------
    /// * `Ok(())` when the id word, the summary layout, the directory pointers
    ///   and the FTP string are all valid, [`KernelError::Format`] otherwise.
    pub fn validate(&self, raw: &[u8], n_records: usize) -> Result<(), KernelError> {
        if !(self.idword.starts_with("DAF/") || self.idword == "NAIF/DAF") {
            return Err(KernelError::Format(format!(
                "invalid DAF id word: {:?}",
                self.idword
            )));
        }

        if self.nd < 0 || self.nd as usize > MAX_ND || self.ni < MIN_NI as i32 {
            return Err(KernelError::Format(format!(
                "invalid summary layout ND={} NI={}",
                self.nd, self.ni
            )));
        }
        if self.summary_size() > MAX_SUMMARY_WORDS {
            return Err(KernelError::Format(format!(
                "summary of {} words does not fit in a summary record",
                self.summary_size()
            )));
        }

        let in_file = |ptr: i32| ptr >= 2 && ptr as usize <= n_records;
        if !in_file(self.fward) || !in_file(self.bward) {
            return Err(KernelError::Format(format!(
                "directory pointers out of range: FWARD={} BWARD={} for {n_records} records",
                self.fward, self.bward
            )));
        }

        let ftp = &raw[FTPSTR_OFFSET..FTPSTR_OFFSET + FTPSTR.len()];
        if ftp.starts_with(b"FTPSTR") && ftp != FTPSTR {
            return Err(KernelError::Format(
                "FTP validation string is corrupted".into(),
            ));
        }

        Ok(())
    }

    /// Size in double-precision words of one packed summary: `ND + ceil(NI / 2)`.
    pub fn summary_size(&self) -> usize {
        self.nd as usize + (self.ni as usize).div_ceil(2)
    }
}

impl fmt::Display for DAFHeader {
    /// Render a fixed-width table summarizing the DAF header fields.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LABEL_WIDTH: usize = 18;
        const VALUE_WIDTH: usize = 50;

        let border = format!(
            "+{:-<label$}+{:-<value$}+",
            "",
            "",
            label = LABEL_WIDTH + 1,
            value = VALUE_WIDTH + 1
        );

        let rows = [
            ("ID Word", format!("{} (Format ID)", self.idword)),
            ("Internal Name", self.internal_filename.clone()),
            (
                "ND (doubles)",
                format!("{} double precision summary components", self.nd),
            ),
            (
                "NI (integers)",
                format!("{} integer summary components", self.ni),
            ),
            (
                "Forward Ptr",
                format!("Record # of first summary: {}", self.fward),
            ),
            (
                "Backward Ptr",
                format!("Record # of last summary: {}", self.bward),
            ),
            ("Free Addr", format!("Next free address: {}", self.free)),
            (
                "Binary Format",
                format!("{} (e.g., BIG-IEEE or LTL-IEEE)", self.locfmt),
            ),
        ];

        writeln!(f, "{border}")?;
        writeln!(
            f,
            "| {:<label$}| {:<value$}|",
            "DAF File Header",
            "",
            label = LABEL_WIDTH,
            value = VALUE_WIDTH
        )?;
        writeln!(f, "{border}")?;
        for (label, value) in rows {
            writeln!(
                f,
                "| {:<label$}| {:<value$}|",
                label,
                value,
                label = LABEL_WIDTH,
                value = VALUE_WIDTH
            )?;
        }
        writeln!(f, "{border}")
    }
}
