#![allow(dead_code)]

//! Writer of small synthetic SPK kernels for the integration tests.

use approx::assert_relative_eq;
use camino::{Utf8Path, Utf8PathBuf};
use naif_spk::StateVector;
use tempfile::TempDir;

const RECORD_LEN: usize = 1024;
const WORDS_PER_RECORD: usize = 128;
const FTPSTR: &[u8] = b"FTPSTR:\r:\n:\r\n:\r\x00:\x81:\x10\xce:ENDFTP";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ByteOrder {
    Big,
    Little,
}

/// One type 2 or type 3 segment.
#[derive(Debug, Clone)]
pub struct SegmentSpec {
    pub name: String,
    pub target: i32,
    pub center: i32,
    pub frame: i32,
    pub data_type: i32,
    pub init: f64,
    pub intlen: f64,
    /// Record words without the size prefix: `[MID, RADIUS, coeffs...]`.
    pub records: Vec<Vec<f64>>,
    /// Summary window; defaults to the span of the records.
    pub window: Option<(f64, f64)>,
}

impl SegmentSpec {
    /// Type 2 segment keeping `target` at a fixed `position` over `[start, end]`.
    pub fn fixed(target: i32, center: i32, frame: i32, start: f64, end: f64, position: [f64; 3]) -> Self {
        Self::linear(target, center, frame, start, end, 1, position, [0.0; 3])
    }

    /// Type 2 segment with `position(t) = p0 + v * t`, split in `n_records` records.
    #[allow(clippy::too_many_arguments)]
    pub fn linear(
        target: i32,
        center: i32,
        frame: i32,
        start: f64,
        end: f64,
        n_records: usize,
        p0: [f64; 3],
        v: [f64; 3],
    ) -> Self {
        let intlen = (end - start) / n_records as f64;
        let radius = intlen / 2.0;
        let records = (0..n_records)
            .map(|i| {
                let mid = start + radius + i as f64 * intlen;
                let mut words = vec![mid, radius];
                for axis in 0..3 {
                    words.push(p0[axis] + v[axis] * mid);
                    words.push(v[axis] * radius);
                }
                words
            })
            .collect();
        SegmentSpec {
            name: format!("{target} WRT {center}"),
            target,
            center,
            frame,
            data_type: 2,
            init: start,
            intlen,
            records,
            window: None,
        }
    }

    /// Type 3 version of [`SegmentSpec::linear`], velocity blocks included.
    #[allow(clippy::too_many_arguments)]
    pub fn linear_type3(
        target: i32,
        center: i32,
        frame: i32,
        start: f64,
        end: f64,
        n_records: usize,
        p0: [f64; 3],
        v: [f64; 3],
    ) -> Self {
        let mut spec = Self::linear(target, center, frame, start, end, n_records, p0, v);
        spec.data_type = 3;
        for words in spec.records.iter_mut() {
            for axis in v {
                words.push(axis);
                words.push(0.0);
            }
        }
        spec
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_window(mut self, start: f64, end: f64) -> Self {
        self.window = Some((start, end));
        self
    }

    pub fn with_data_type(mut self, data_type: i32) -> Self {
        self.data_type = data_type;
        self
    }

    fn data_words(&self) -> Vec<f64> {
        let rsize = self.records.first().map_or(0, Vec::len);
        let mut words: Vec<f64> = self.records.iter().flatten().copied().collect();
        words.extend([self.init, self.intlen, rsize as f64, self.records.len() as f64]);
        words
    }

    fn summary_window(&self) -> (f64, f64) {
        self.window
            .unwrap_or((self.init, self.init + self.intlen * self.records.len() as f64))
    }
}

/// Builder of a complete SPK file.
#[derive(Debug, Clone)]
pub struct SpkWriter {
    pub order: ByteOrder,
    pub with_locfmt: bool,
    pub summaries_per_record: usize,
    pub segments: Vec<SegmentSpec>,
}

impl SpkWriter {
    pub fn new(order: ByteOrder) -> Self {
        SpkWriter {
            order,
            with_locfmt: true,
            summaries_per_record: 25,
            segments: Vec::new(),
        }
    }

    pub fn segment(mut self, segment: SegmentSpec) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn summaries_per_record(mut self, n: usize) -> Self {
        self.summaries_per_record = n.clamp(1, 25);
        self
    }

    pub fn without_locfmt(mut self) -> Self {
        self.with_locfmt = false;
        self
    }

    fn int(&self, v: i32) -> [u8; 4] {
        match self.order {
            ByteOrder::Big => v.to_be_bytes(),
            ByteOrder::Little => v.to_le_bytes(),
        }
    }

    fn dbl(&self, v: f64) -> [u8; 8] {
        match self.order {
            ByteOrder::Big => v.to_be_bytes(),
            ByteOrder::Little => v.to_le_bytes(),
        }
    }

    /// Initial and final word addresses of every segment, in file order.
    pub fn segment_addresses(&self) -> Vec<(usize, usize)> {
        let n_summary_records = self.segments.len().div_ceil(self.summaries_per_record).max(1);
        // record 1: file record, then summary/name pairs, then the data
        let first_data_record = 2 + 2 * n_summary_records;
        let mut address = (first_data_record - 1) * WORDS_PER_RECORD + 1;
        self.segments
            .iter()
            .map(|segment| {
                let len = segment.data_words().len();
                address += len;
                (address - len, address - 1)
            })
            .collect()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let chunks: Vec<&[SegmentSpec]> = if self.segments.is_empty() {
            vec![&self.segments[..]]
        } else {
            self.segments.chunks(self.summaries_per_record).collect()
        };
        let n_summary_records = chunks.len();

        let first_data_record = 2 + 2 * n_summary_records;
        let ranges = self.segment_addresses();
        let data: Vec<f64> = self.segments.iter().flat_map(SegmentSpec::data_words).collect();
        let free = ranges.last().map_or((first_data_record - 1) * WORDS_PER_RECORD + 1, |r| r.1 + 1);

        let n_records = first_data_record - 1 + data.len().div_ceil(WORDS_PER_RECORD);
        let mut bytes = vec![0u8; n_records * RECORD_LEN];

        bytes[0..8].copy_from_slice(b"DAF/SPK ");
        bytes[8..12].copy_from_slice(&self.int(2));
        bytes[12..16].copy_from_slice(&self.int(6));
        bytes[16..76].copy_from_slice(&[b' '; 60]);
        bytes[16..29].copy_from_slice(b"SYNTHETIC SPK");
        let last_summary = 2 + 2 * (n_summary_records - 1);
        bytes[76..80].copy_from_slice(&self.int(2));
        bytes[80..84].copy_from_slice(&self.int(last_summary as i32));
        bytes[84..88].copy_from_slice(&self.int(free as i32));
        if self.with_locfmt {
            let tag = match self.order {
                ByteOrder::Big => b"BIG-IEEE",
                ByteOrder::Little => b"LTL-IEEE",
            };
            bytes[88..96].copy_from_slice(tag);
        }
        bytes[699..699 + FTPSTR.len()].copy_from_slice(FTPSTR);

        let mut index = 0;
        for (k, chunk) in chunks.iter().enumerate() {
            let record = 2 + 2 * k;
            let base = (record - 1) * RECORD_LEN;
            let next = if k + 1 < n_summary_records { record + 2 } else { 0 };
            let prev = if k == 0 { 0 } else { record - 2 };
            bytes[base..base + 8].copy_from_slice(&self.dbl(next as f64));
            bytes[base + 8..base + 16].copy_from_slice(&self.dbl(prev as f64));
            bytes[base + 16..base + 24].copy_from_slice(&self.dbl(chunk.len() as f64));

            let names = record * RECORD_LEN;
            bytes[names..names + RECORD_LEN].fill(b' ');
            for (i, segment) in chunk.iter().enumerate() {
                let (begin, end) = ranges[index];
                let (start, stop) = segment.summary_window();
                let at = base + 24 + i * 40;
                bytes[at..at + 8].copy_from_slice(&self.dbl(start));
                bytes[at + 8..at + 16].copy_from_slice(&self.dbl(stop));
                let ints = [
                    segment.target,
                    segment.center,
                    segment.frame,
                    segment.data_type,
                    begin as i32,
                    end as i32,
                ];
                for (j, v) in ints.iter().enumerate() {
                    bytes[at + 16 + 4 * j..at + 20 + 4 * j].copy_from_slice(&self.int(*v));
                }
                let slot = names + i * 40;
                let name = segment.name.as_bytes();
                let len = name.len().min(40);
                bytes[slot..slot + len].copy_from_slice(&name[..len]);
                index += 1;
            }
        }

        let data_base = (first_data_record - 1) * RECORD_LEN;
        for (i, word) in data.iter().enumerate() {
            let at = data_base + 8 * i;
            bytes[at..at + 8].copy_from_slice(&self.dbl(*word));
        }
        bytes
    }

    pub fn write(&self, dir: &TempDir, file_name: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(file_name)).unwrap();
        std::fs::write(&path, self.to_bytes()).unwrap();
        path
    }
}

/// Byte offset of the 1-based DAF word `address`.
pub fn word_offset(address: usize) -> usize {
    (address - 1) * 8
}

/// Overwrite `bytes` at `offset` in the file at `path`.
pub fn patch_file(path: &Utf8Path, offset: usize, bytes: &[u8]) {
    let mut data = std::fs::read(path).unwrap();
    data[offset..offset + bytes.len()].copy_from_slice(bytes);
    std::fs::write(path, data).unwrap();
}

pub fn assert_state_close(actual: &StateVector, expected: &StateVector, epsilon: f64) {
    assert_eq!(actual.frame_id, expected.frame_id);
    assert_relative_eq!(actual.epoch, expected.epoch, epsilon = epsilon);
    assert_relative_eq!(actual.position, expected.position, epsilon = epsilon);
    assert_relative_eq!(actual.velocity, expected.velocity, epsilon = epsilon);
}
