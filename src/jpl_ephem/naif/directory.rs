//! Sequential traversal of the DAF array directory.
//!
//! The array summaries of a DAF file live in a doubly linked list of summary
//! records, starting at record `FWARD` of the file record. Each summary record
//! is followed by a name record and has the layout:
//!
//! ```text
//! word 1     NEXT   record number of the next summary record (0 = end of chain)
//! word 2     PREV   record number of the previous summary record (0 = start)
//! word 3     NSUM   number of summaries stored in this record
//! word 4..   NSUM packed summaries of SS = ND + ceil(NI / 2) words each
//! ```
//!
//! [`SegmentDirectory`] is a restartable cursor over that list. It keeps a
//! single summary record (and its name record) in memory, and can also be
//! consumed as an [`Iterator`] of [`DafArray`]s.
//!
//! The integer halves of a packed summary are stored in the byte order of the
//! file. The cursor decodes them with that order and repacks them with
//! [`pack_summary`], so the summaries it hands out have the same in-memory
//! representation whatever the origin of the file.
//!
//! # Example
//! ```rust, no_run
//! use camino::Utf8Path;
//! use naif_spk::jpl_ephem::naif::{daf_file::DafFile, directory::SegmentDirectory};
//!
//! let mut daf = DafFile::open(Utf8Path::new("de440.bsp")).unwrap();
//! for segment in SegmentDirectory::spk_segments(&mut daf).unwrap() {
//!     println!("{segment}");
//! }
//! ```

use ahash::AHashSet;
use nom::number::{complete::i32 as nom_i32, Endianness};

use crate::{
    constants::{DAF_RECORD_LEN, DAF_RECORD_WORDS, MAX_SUMMARY_WORDS},
    jpl_ephem::naif::{
        daf_file::{decode_doubles, DafFile},
        summary_record::{pack_summary, unpack_summary, SpkSegment},
    },
    kernel_errors::KernelError,
};

/// One array of a DAF file: its packed summary and its name.
#[derive(Debug, Clone, PartialEq)]
pub struct DafArray {
    pub summary: Vec<f64>,
    pub name: String,
}

/// Summary record currently held by the cursor.
#[derive(Debug)]
struct SummaryBuffer {
    record_number: usize,
    next: usize,
    nsum: usize,
    summaries: [u8; DAF_RECORD_LEN],
    names: [u8; DAF_RECORD_LEN],
}

/// Forward cursor over the array summaries of one DAF file.
#[derive(Debug)]
pub struct SegmentDirectory<'a> {
    daf: &'a mut DafFile,
    nd: usize,
    ni: usize,
    endian: Endianness,
    next_record: usize,
    current: Option<SummaryBuffer>,
    /// 1-based position of the current array inside `current` (0 = none yet).
    position: usize,
    visited: AHashSet<usize>,
}

/// Non-negative integer stored as a double, at most `max`.
fn record_pointer(word: f64, what: &str, max: usize) -> Result<usize, KernelError> {
    if !word.is_finite() || word < 0.0 || word.fract() != 0.0 || word > max as f64 {
        return Err(KernelError::Format(format!(
            "invalid {what} word {word} in summary record"
        )));
    }
    Ok(word as usize)
}

impl<'a> SegmentDirectory<'a> {
    /// Start a forward search: the cursor is positioned before the first array.
    pub fn begin_forward_search(daf: &'a mut DafFile) -> Self {
        let next_record = daf.header().fward as usize;
        SegmentDirectory {
            nd: daf.nd(),
            ni: daf.ni(),
            endian: daf.endian(),
            daf,
            next_record,
            current: None,
            position: 0,
            visited: AHashSet::new(),
        }
    }

    /// Reset the cursor before the first array.
    pub fn rewind(&mut self) {
        self.next_record = self.daf.header().fward as usize;
        self.current = None;
        self.position = 0;
        self.visited.clear();
    }

    fn summary_size(&self) -> usize {
        self.nd + self.ni.div_ceil(2)
    }

    fn load_summary_record(&mut self, record_number: usize) -> Result<(), KernelError> {
        if !self.visited.insert(record_number) {
            return Err(KernelError::Format(format!(
                "{}: cycle in the summary record chain at record {record_number}",
                self.daf.path()
            )));
        }

        let summaries = self.daf.read_record(record_number)?;
        let control = decode_doubles(&summaries[..24], self.endian)?;
        let next = record_pointer(control[0], "NEXT", self.daf.word_count() / DAF_RECORD_WORDS)?;
        let nsum = record_pointer(control[2], "NSUM", MAX_SUMMARY_WORDS)?;

        let used = nsum.checked_mul(self.summary_size());
        if used.is_none_or(|words| words > MAX_SUMMARY_WORDS) {
            return Err(KernelError::Format(format!(
                "{}: summary record {record_number} claims {nsum} summaries of {} words",
                self.daf.path(),
                self.summary_size()
            )));
        }

        let names = self.daf.read_record(record_number + 1)?;
        tracing::trace!(record_number, next, nsum, "summary record loaded");

        self.current = Some(SummaryBuffer {
            record_number,
            next,
            nsum,
            summaries,
            names,
        });
        self.position = 0;
        Ok(())
    }

    /// Move to the next array, following the `NEXT` pointers.
    ///
    /// Return
    /// ----------
    /// * `true` when the cursor points to an array, `false` at the end of the chain.
    /// * [`KernelError::Format`] on a corrupted directory (bad pointers, cycles, overfull records).
    pub fn find_next_array(&mut self) -> Result<bool, KernelError> {
        loop {
            if let Some(buffer) = &self.current {
                if self.position < buffer.nsum {
                    self.position += 1;
                    return Ok(true);
                }
                self.next_record = buffer.next;
            }

            if self.next_record == 0 {
                self.current = None;
                return Ok(false);
            }

            let record_number = self.next_record;
            if let Err(e) = self.load_summary_record(record_number) {
                self.current = None;
                self.next_record = 0;
                return Err(e);
            }
        }
    }

    fn current_slot(&self) -> Result<(&SummaryBuffer, usize), KernelError> {
        match &self.current {
            Some(buffer) if self.position > 0 => Ok((buffer, self.position - 1)),
            _ => Err(KernelError::Format(
                "no current array: call find_next_array first".into(),
            )),
        }
    }

    /// Packed summary of the current array.
    pub fn summary_of_array(&self) -> Result<Vec<f64>, KernelError> {
        let (buffer, index) = self.current_slot()?;
        let start = 24 + index * self.summary_size() * 8;
        let doubles_end = start + self.nd * 8;

        let dc = decode_doubles(&buffer.summaries[start..doubles_end], self.endian)?;

        let mut ic = Vec::with_capacity(self.ni);
        let mut input = &buffer.summaries[doubles_end..];
        for _ in 0..self.ni {
            let (rest, value) = nom_i32::<_, nom::error::Error<&[u8]>>(self.endian)(input)?;
            ic.push(value);
            input = rest;
        }

        pack_summary(&dc, &ic)
    }

    /// Name of the current array, with its trailing padding removed.
    pub fn name_of_array(&self) -> Result<String, KernelError> {
        let (buffer, index) = self.current_slot()?;
        let width = 8 * self.summary_size();
        let raw = &buffer.names[index * width..(index + 1) * width];
        Ok(String::from_utf8_lossy(raw)
            .trim_end_matches([' ', '\0'])
            .to_string())
    }

    /// Record number of the summary record holding the current array.
    pub fn current_record(&self) -> Option<usize> {
        self.current.as_ref().map(|buffer| buffer.record_number)
    }

    /// Decode every summary of an SPK file (`ND = 2`, `NI = 6`) in file order.
    pub fn spk_segments(daf: &mut DafFile) -> Result<Vec<SpkSegment>, KernelError> {
        SegmentDirectory::spk_segments_iter(daf)?.collect()
    }

    /// Lazy version of [`SegmentDirectory::spk_segments`]: summaries are
    /// decoded one at a time while the chain is walked.
    pub fn spk_segments_iter(
        daf: &'a mut DafFile,
    ) -> Result<impl Iterator<Item = Result<SpkSegment, KernelError>> + 'a, KernelError> {
        if daf.nd() != 2 || daf.ni() != 6 {
            return Err(KernelError::Format(format!(
                "{}: not an SPK file (ND={} NI={})",
                daf.path(),
                daf.nd(),
                daf.ni()
            )));
        }
        Ok(SegmentDirectory::begin_forward_search(daf).map(|array| {
            let array = array?;
            let (dc, ic) = unpack_summary(&array.summary, 2, 6)?;
            SpkSegment::from_components(&array.name, &dc, &ic)
        }))
    }
}

impl Iterator for SegmentDirectory<'_> {
    type Item = Result<DafArray, KernelError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.find_next_array() {
            Ok(true) => Some(self.summary_of_array().and_then(|summary| {
                Ok(DafArray {
                    summary,
                    name: self.name_of_array()?,
                })
            })),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
