//! Chebyshev segments (SPK types 2 and 3): footer, records and evaluation.
//!
//! A type 2 or type 3 segment is a sequence of `N` records of `RSIZE` words
//! each, covering consecutive intervals of `INTLEN` seconds starting at
//! `INIT`, followed by a four word footer:
//!
//! ```text
//! ... record 1 | record 2 | ... | record N | INIT | INTLEN | RSIZE | N
//! ```
//!
//! A record read from a segment is handled in its **packed** form, the
//! record words prefixed by their count:
//!
//! ```text
//! [RSIZE, MID, RADIUS, X coeffs, Y coeffs, Z coeffs (, VX, VY, VZ coeffs)]
//! ```
//!
//! with `RSIZE - 2` coefficients split evenly between 3 blocks (type 2) or 6
//! blocks (type 3). The normalized time is `s = (epoch - MID) / RADIUS` and
//! every block is evaluated with Clenshaw's recurrence.
//!
//! ## Units
//! * `MID`, `RADIUS`, `INIT` and `INTLEN` are ET seconds.
//! * Position is in kilometers, velocity in km/s. For type 2 the velocity is
//!   the derivative of the position series, `dP/ds / RADIUS`.

use std::fmt;

use hifitime::{Duration, Epoch};
use nalgebra::Vector3;

use crate::{
    jpl_ephem::naif::{
        daf_file::DafFile, naif_type::SpkDataType, summary_record::SpkSegment,
    },
    kernel_errors::KernelError,
};

/// Number of coefficient blocks of a type 2 record (X, Y, Z).
const TYPE2_BLOCKS: usize = 3;
/// Number of coefficient blocks of a type 3 record (X, Y, Z, VX, VY, VZ).
const TYPE3_BLOCKS: usize = 6;

/// Footer of a type 2/3 segment.
#[derive(Debug, PartialEq, Clone)]
pub struct SegmentFooter {
    /// Start epoch of the first record (ET seconds).
    pub init: f64,
    /// Length of the interval covered by each record (seconds).
    pub intlen: f64,
    /// Size of one record, in double precision words.
    pub rsize: usize,
    /// Number of records.
    pub n_records: usize,
}

/// Positive integer count stored as a double, at most `max`.
fn footer_count(word: f64, what: &str, max: usize) -> Result<usize, KernelError> {
    if !word.is_finite() || word < 1.0 || word.fract() != 0.0 || word > max as f64 {
        return Err(KernelError::Format(format!(
            "invalid {what} {word} in segment footer"
        )));
    }
    Ok(word as usize)
}

impl SegmentFooter {
    /// Read and check the footer of `segment`.
    ///
    /// Arguments
    /// -----------------
    /// * `daf`: File holding the segment.
    /// * `segment`: Descriptor whose `final_addr` points at the last footer word.
    /// * `blocks`: Number of coefficient blocks per record (3 for type 2, 6 for type 3).
    ///
    /// Return
    /// ----------
    /// * The footer, once checked that `INTLEN > 0`, that `RSIZE` splits into
    ///   `blocks` equal coefficient blocks and that the `N` records fit inside the segment.
    pub fn read(
        daf: &mut DafFile,
        segment: &SpkSegment,
        blocks: usize,
    ) -> Result<Self, KernelError> {
        let begin = segment.initial_addr as usize;
        let end = segment.final_addr as usize;
        if end < begin + 3 {
            return Err(KernelError::Format(format!(
                "segment {:?} is too short to hold a footer",
                segment.name
            )));
        }

        let words = daf.read_doubles(end - 3, 4)?;
        let (init, intlen) = (words[0], words[1]);
        let data_words = end - 3 - begin;
        let rsize = footer_count(words[2], "RSIZE", data_words)?;
        let n_records = footer_count(words[3], "record count", data_words)?;

        if !init.is_finite() || !intlen.is_finite() || intlen <= 0.0 {
            return Err(KernelError::Format(format!(
                "invalid time span INIT={init} INTLEN={intlen} in segment {:?}",
                segment.name
            )));
        }
        if rsize < 2 + blocks || (rsize - 2) % blocks != 0 {
            return Err(KernelError::Format(format!(
                "record size {rsize} does not split into {blocks} coefficient blocks"
            )));
        }
        let data_end = n_records
            .checked_mul(rsize)
            .and_then(|words| words.checked_add(begin));
        if data_end.is_none_or(|data_end| data_end > end - 3) {
            return Err(KernelError::Format(format!(
                "{n_records} records of {rsize} words overflow segment {:?}",
                segment.name
            )));
        }

        Ok(SegmentFooter {
            init,
            intlen,
            rsize,
            n_records,
        })
    }

    /// Last epoch covered by the segment data.
    pub fn end(&self) -> f64 {
        self.init + self.intlen * self.n_records as f64
    }

    /// Zero-based index of the record covering `epoch`.
    ///
    /// The right edge of the data belongs to the last record.
    ///
    /// Return
    /// ----------
    /// * [`KernelError::Coverage`] when `epoch` lies outside `[INIT, INIT + INTLEN * N]`.
    pub fn record_index(&self, epoch: f64, segment: &SpkSegment) -> Result<usize, KernelError> {
        if !(self.init..=self.end()).contains(&epoch) {
            return Err(KernelError::Coverage {
                body: segment.target,
                center: segment.center,
                epoch,
            });
        }
        let index = ((epoch - self.init) / self.intlen).floor() as usize;
        Ok(index.min(self.n_records - 1))
    }
}

impl fmt::Display for SegmentFooter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let epoch = Epoch::from_et_seconds(self.init);
        let record_length = Duration::from_seconds(self.intlen);

        writeln!(f, "+----------------+----------------------------+")?;
        writeln!(f, "| {:<14} | {:<26} |", "Field", "Value")?;
        writeln!(f, "+----------------+----------------------------+")?;
        writeln!(f, "| {:<14} | {:<26} |", "init (epoch)", epoch.to_string())?;
        writeln!(f, "| {:<14} | {:<26} |", "intlen", record_length.to_string())?;
        writeln!(f, "| {:<14} | {:<26} |", "rsize", self.rsize)?;
        writeln!(f, "| {:<14} | {:<26} |", "n_records", self.n_records)?;
        writeln!(f, "+----------------+----------------------------+")
    }
}

/// One Chebyshev record of a type 2 or type 3 segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ChebyshevRecord {
    /// Midpoint of the record interval (ET seconds).
    pub mid: f64,
    /// Half-width of the record interval (seconds).
    pub radius: f64,
    /// Position coefficients (km).
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    /// Velocity coefficients (km/s), type 3 only.
    pub velocity: Option<[Vec<f64>; 3]>,
}

impl ChebyshevRecord {
    /// Decode a record from its packed form `[RSIZE, MID, RADIUS, coeffs...]`.
    ///
    /// Arguments
    /// -----------------
    /// * `packed`: The packed record, `RSIZE + 1` words.
    /// * `blocks`: 3 for a type 2 record, 6 for a type 3 record.
    pub fn from_packed(packed: &[f64], blocks: usize) -> Result<Self, KernelError> {
        let (&rsize, words) = packed
            .split_first()
            .ok_or_else(|| KernelError::Format("empty Chebyshev record".into()))?;

        if rsize.fract() != 0.0 || rsize as usize != words.len() {
            return Err(KernelError::Format(format!(
                "record announces {rsize} words but holds {}",
                words.len()
            )));
        }
        if words.len() < 2 + blocks || (words.len() - 2) % blocks != 0 {
            return Err(KernelError::Format(format!(
                "record of {} words does not split into {blocks} coefficient blocks",
                words.len()
            )));
        }

        let (mid, radius) = (words[0], words[1]);
        if radius.is_nan() || radius <= 0.0 {
            return Err(KernelError::Format(format!(
                "non-positive record radius {radius}"
            )));
        }

        let ncoeff = (words.len() - 2) / blocks;
        let mut chunks = words[2..].chunks_exact(ncoeff).map(<[f64]>::to_vec);
        let mut next_block = || chunks.next().unwrap_or_default();

        let (x, y, z) = (next_block(), next_block(), next_block());
        let velocity = (blocks == TYPE3_BLOCKS).then(|| [next_block(), next_block(), next_block()]);

        Ok(ChebyshevRecord {
            mid,
            radius,
            x,
            y,
            z,
            velocity,
        })
    }

    /// Number of coefficients per block.
    pub fn ncoeff(&self) -> usize {
        self.x.len()
    }

    fn normalized_time(&self, epoch: f64) -> f64 {
        (epoch - self.mid) / self.radius
    }
}

/// Value and derivative (with respect to `s`) of a Chebyshev series at `s`.
///
/// Clenshaw's recurrence, `b_k = c_k + 2 s b_{k+1} - b_{k+2}`, differentiated
/// term by term for the derivative.
pub fn chebyshev_eval(coeffs: &[f64], s: f64) -> (f64, f64) {
    let (mut b1, mut b2) = (0.0, 0.0);
    let (mut d1, mut d2) = (0.0, 0.0);
    for &c in coeffs.iter().skip(1).rev() {
        let b = c + 2.0 * s * b1 - b2;
        let d = 2.0 * b1 + 2.0 * s * d1 - d2;
        (b2, b1) = (b1, b);
        (d2, d1) = (d1, d);
    }
    let c0 = coeffs.first().copied().unwrap_or(0.0);
    (c0 + s * b1 - b2, b1 + s * d1 - d2)
}

/// Position and velocity of a type 2 record at `epoch`.
pub fn evaluate_type2(epoch: f64, record: &ChebyshevRecord) -> (Vector3<f64>, Vector3<f64>) {
    let s = record.normalized_time(epoch);
    let (x, dx) = chebyshev_eval(&record.x, s);
    let (y, dy) = chebyshev_eval(&record.y, s);
    let (z, dz) = chebyshev_eval(&record.z, s);
    (
        Vector3::new(x, y, z),
        Vector3::new(dx, dy, dz) / record.radius,
    )
}

/// Position and velocity of a type 3 record at `epoch`.
///
/// A record without velocity blocks falls back to the type 2 derivative.
pub fn evaluate_type3(epoch: f64, record: &ChebyshevRecord) -> (Vector3<f64>, Vector3<f64>) {
    let Some([vx, vy, vz]) = &record.velocity else {
        return evaluate_type2(epoch, record);
    };
    let s = record.normalized_time(epoch);
    let value = |coeffs: &[f64]| chebyshev_eval(coeffs, s).0;
    (
        Vector3::new(value(&record.x), value(&record.y), value(&record.z)),
        Vector3::new(value(vx), value(vy), value(vz)),
    )
}

fn read_record(
    daf: &mut DafFile,
    segment: &SpkSegment,
    epoch: f64,
    blocks: usize,
) -> Result<ChebyshevRecord, KernelError> {
    let footer = SegmentFooter::read(daf, segment, blocks)?;
    let index = footer.record_index(epoch, segment)?;
    let start = segment.initial_addr as usize + index * footer.rsize;

    let mut packed = Vec::with_capacity(footer.rsize + 1);
    packed.push(footer.rsize as f64);
    packed.extend(daf.read_doubles(start, footer.rsize)?);

    tracing::trace!(segment = %segment.name, index, start, "reading Chebyshev record");
    ChebyshevRecord::from_packed(&packed, blocks)
}

/// Read the type 2 record of `segment` covering `epoch`.
pub fn read_type2(
    daf: &mut DafFile,
    segment: &SpkSegment,
    epoch: f64,
) -> Result<ChebyshevRecord, KernelError> {
    read_record(daf, segment, epoch, TYPE2_BLOCKS)
}

/// Read the type 3 record of `segment` covering `epoch`.
pub fn read_type3(
    daf: &mut DafFile,
    segment: &SpkSegment,
    epoch: f64,
) -> Result<ChebyshevRecord, KernelError> {
    read_record(daf, segment, epoch, TYPE3_BLOCKS)
}

/// Evaluation strategy of a segment, chosen once from its data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentEvaluator {
    Type2,
    Type3,
    Unsupported(i32),
}

impl SegmentEvaluator {
    pub fn for_segment(segment: &SpkSegment) -> Self {
        match SpkDataType::from_i32(segment.data_type) {
            Ok(SpkDataType::ChebyshevPositionOnly) => SegmentEvaluator::Type2,
            Ok(SpkDataType::ChebyshevPositionVelocity) => SegmentEvaluator::Type3,
            _ => SegmentEvaluator::Unsupported(segment.data_type),
        }
    }

    /// Position (km) and velocity (km/s) of `segment.target` relative to
    /// `segment.center` at `epoch`, in the segment frame.
    pub fn evaluate(
        &self,
        daf: &mut DafFile,
        segment: &SpkSegment,
        epoch: f64,
    ) -> Result<(Vector3<f64>, Vector3<f64>), KernelError> {
        match self {
            SegmentEvaluator::Type2 => {
                let record = read_type2(daf, segment, epoch)?;
                Ok(evaluate_type2(epoch, &record))
            }
            SegmentEvaluator::Type3 => {
                let record = read_type3(daf, segment, epoch)?;
                Ok(evaluate_type3(epoch, &record))
            }
            SegmentEvaluator::Unsupported(code) => {
                let kind = SpkDataType::from_i32(*code)
                    .map(|t| t.to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                Err(KernelError::Format(format!(
                    "unsupported SPK data type {code} ({kind}) in segment {:?}",
                    segment.name
                )))
            }
        }
    }
}

impl fmt::Display for ChebyshevRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mid = Epoch::from_et_seconds(self.mid);
        let radius = Duration::from_seconds(self.radius);

        let mid_str = format!("{mid}");
        let radius_str = format!("{radius}");

        let label_width = 16;
        let value_width = mid_str.len().max(radius_str.len()).max(55);

        let border = format!(
            "+{:-<label$}+{:-<value$}+",
            "",
            "",
            label = label_width + 2,
            value = value_width + 2
        );

        writeln!(
            f,
            "+{:^label$}+{:^value$}+",
            "Chebyshev Record",
            "",
            label = label_width + 2,
            value = value_width + 2
        )?;
        writeln!(f, "{border}")?;
        for (label, value) in [
            ("Midpoint", mid_str),
            ("Radius", radius_str),
            ("Degree", self.ncoeff().saturating_sub(1).to_string()),
        ] {
            writeln!(
                f,
                "| {label:<label_width$} | {value:<value_width$} |"
            )?;
        }
        writeln!(f, "{border}")?;
        writeln!(
            f,
            "| {:<label_width$} | {:<value_width$} |",
            "Axis", "Chebyshev Coefficients"
        )?;
        writeln!(f, "{border}")?;

        let mut blocks = vec![("X", &self.x), ("Y", &self.y), ("Z", &self.z)];
        if let Some([vx, vy, vz]) = &self.velocity {
            blocks.extend([("VX", vx), ("VY", vy), ("VZ", vz)]);
        }

        for (axis, coeffs) in blocks {
            writeln!(f, "| {axis:<label_width$} | {:value_width$} |", "")?;
            for chunk in coeffs.chunks(4) {
                let line = chunk
                    .iter()
                    .map(|c| format!("{c:>12.4e}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(f, "| {:<label_width$} | {line:<value_width$} |", "")?;
            }
            writeln!(f, "{border}")?;
        }

        Ok(())
    }
}
