//! Array summaries: packing codec and the SPK segment descriptor.
//!
//! A DAF summary stores `ND` double precision components followed by `NI`
//! integer components packed **two per double**, for a total of
//! `ND + ceil(NI / 2)` words. In memory, a packed integer word is kept as the
//! `f64` whose bit pattern carries the first integer in its low 32 bits and
//! the second integer in its high 32 bits. The segment directory normalises
//! both file byte orders to this convention, so [`unpack_summary`] never needs
//! to know where a summary came from.
//!
//! For SPK kernels `ND = 2` and `NI = 6`, decoded into [`SpkSegment`]:
//!
//! ```text
//! dc = [start_epoch, end_epoch]
//! ic = [target, center, frame_id, data_type, initial_addr, final_addr]
//! ```

use std::fmt;

use hifitime::Epoch;

use crate::{
    constants::{MAX_ND, MAX_SUMMARY_WORDS, MIN_NI},
    jpl_ephem::naif::naif_ids::{body_name, frame_name},
    jpl_ephem::naif::naif_type::SpkDataType,
    kernel_errors::KernelError,
};

fn check_layout(nd: usize, ni: usize) -> Result<(), KernelError> {
    if nd > MAX_ND || ni < MIN_NI || nd + ni.div_ceil(2) > MAX_SUMMARY_WORDS {
        return Err(KernelError::Format(format!(
            "invalid summary layout ND={nd} NI={ni}"
        )));
    }
    Ok(())
}

/// Pack two integers into one summary word.
pub(crate) fn pack_int_pair(first: i32, second: i32) -> f64 {
    f64::from_bits(((second as u32 as u64) << 32) | first as u32 as u64)
}

/// Split the double and integer components of a packed summary.
///
/// Arguments
/// -----------------
/// * `raw`: Packed summary, exactly `nd + ceil(ni / 2)` words.
/// * `nd`: Number of double precision components.
/// * `ni`: Number of integer components.
///
/// Return
/// ----------
/// * `(dc, ic)` with `dc.len() == nd` and `ic.len() == ni`; integer values are
///   recovered bit-exactly.
/// * [`KernelError::Format`] when the layout is invalid or `raw` has the wrong length.
///
/// See also
/// ------------
/// * [`pack_summary`] – Inverse operation.
pub fn unpack_summary(
    raw: &[f64],
    nd: usize,
    ni: usize,
) -> Result<(Vec<f64>, Vec<i32>), KernelError> {
    check_layout(nd, ni)?;
    let expected = nd + ni.div_ceil(2);
    if raw.len() != expected {
        return Err(KernelError::Format(format!(
            "summary has {} words, expected {expected} for ND={nd} NI={ni}",
            raw.len()
        )));
    }

    let dc = raw[..nd].to_vec();
    let ic = raw[nd..]
        .iter()
        .flat_map(|word| {
            let bits = word.to_bits();
            [bits as u32 as i32, (bits >> 32) as u32 as i32]
        })
        .take(ni)
        .collect();

    Ok((dc, ic))
}

/// Pack double and integer components into a summary.
///
/// An odd `NI` leaves the high half of the last word zeroed.
pub fn pack_summary(dc: &[f64], ic: &[i32]) -> Result<Vec<f64>, KernelError> {
    check_layout(dc.len(), ic.len())?;
    let mut raw = dc.to_vec();
    raw.extend(
        ic.chunks(2)
            .map(|pair| pack_int_pair(pair[0], pair.get(1).copied().unwrap_or(0))),
    );
    Ok(raw)
}

/// Descriptor of one SPK segment, decoded from an `ND = 2`, `NI = 6` summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SpkSegment {
    /// Segment name from the name record.
    pub name: String,
    /// First epoch covered, ET seconds past J2000.
    pub start_epoch: f64,
    /// Last epoch covered, ET seconds past J2000.
    pub end_epoch: f64,
    pub target: i32,
    pub center: i32,
    pub frame_id: i32,
    pub data_type: i32,
    /// First DAF address of the segment data (1-based word index).
    pub initial_addr: i32,
    /// Last DAF address of the segment data.
    pub final_addr: i32,
}

impl SpkSegment {
    /// Build a segment descriptor from unpacked summary components.
    ///
    /// Return
    /// ----------
    /// * [`KernelError::Format`] if fewer than 2 doubles or 6 integers are given,
    ///   or if the address range is empty.
    pub fn from_components(name: &str, dc: &[f64], ic: &[i32]) -> Result<Self, KernelError> {
        if dc.len() < 2 || ic.len() < 6 {
            return Err(KernelError::Format(format!(
                "incomplete SPK summary: {} doubles, {} integers",
                dc.len(),
                ic.len()
            )));
        }
        if ic[4] < 1 || ic[5] < ic[4] {
            return Err(KernelError::Format(format!(
                "invalid segment address range {}..{}",
                ic[4], ic[5]
            )));
        }
        Ok(SpkSegment {
            name: name.to_string(),
            start_epoch: dc[0],
            end_epoch: dc[1],
            target: ic[0],
            center: ic[1],
            frame_id: ic[2],
            data_type: ic[3],
            initial_addr: ic[4],
            final_addr: ic[5],
        })
    }

    /// Whether `epoch` lies within `[start_epoch, end_epoch]`.
    pub fn covers(&self, epoch: f64) -> bool {
        epoch >= self.start_epoch && epoch <= self.end_epoch
    }
}

impl fmt::Display for SpkSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = Epoch::from_et_seconds(self.start_epoch);
        let end = Epoch::from_et_seconds(self.end_epoch);

        let named = |id: i32, name: &str| {
            if name.is_empty() {
                id.to_string()
            } else {
                format!("{name} ({id})")
            }
        };

        let data_type = match SpkDataType::from_i32(self.data_type) {
            Ok(data_type) => data_type.to_string(),
            Err(_) => format!("Unknown ({})", self.data_type),
        };

        let fields = vec![
            ("name", self.name.clone()),
            ("start_epoch", format!("{start}")),
            ("end_epoch", format!("{end}")),
            ("target", named(self.target, body_name(self.target))),
            ("center", named(self.center, body_name(self.center))),
            ("frame_id", named(self.frame_id, frame_name(self.frame_id))),
            ("data_type", data_type),
            ("initial_addr", self.initial_addr.to_string()),
            ("final_addr", self.final_addr.to_string()),
        ];

        let label_width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(10);
        let value_width = fields.iter().map(|(_, v)| v.len()).max().unwrap_or(10);

        let border = format!(
            "+{:-<label$}+{:-<value$}+",
            "",
            "",
            label = label_width + 2,
            value = value_width + 2
        );

        writeln!(f, "{border}")?;
        writeln!(
            f,
            "| {:<label_width$} | {:<value_width$} |",
            "Field", "Value",
        )?;
        writeln!(f, "{border}")?;

        for (label, value) in fields {
            writeln!(f, "| {label:<label_width$} | {value:<value_width$} |")?;
        }

        writeln!(f, "{border}")
    }
}
