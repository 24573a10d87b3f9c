//! Queries over a set of loaded SPK kernels.
//!
//! A single SPK segment only gives the state of a target relative to its
//! *center of motion*. To relate two arbitrary bodies, both are walked up
//! their center-of-motion chains,
//!
//! ```text
//! 301 MOON ──▶ 3 EARTH BARYCENTER ──▶ 0 SOLAR SYSTEM BARYCENTER
//! 399 EARTH ─▶ 3 EARTH BARYCENTER
//! ```
//!
//! and the states are differenced at the first common ancestor, or at the
//! shared root when target and observer are taken at different epochs. At every
//! step the covering segment is looked up among the loaded kernels, the most
//! recently loaded file first and, inside a file, the last matching segment
//! first.
//!
//! States of different links are combined only when they share a frame or
//! when both frames are builtin inertial frames related by a fixed rotation.
//!
//! With [`Aberration::LightTime`] the target is re-evaluated at the emission
//! epoch `t_emit = t_recv - |r| / c` while the observer stays at `t_recv`.

use std::collections::BTreeSet;

use itertools::Itertools;

use crate::{
    constants::{EphemerisTime, FrameId, NaifId},
    env_state::{Aberration, KernelEnv},
    jpl_ephem::{
        naif::{
            daf_file::{DafFile, DafHandle, DafHandles},
            directory::SegmentDirectory,
            ephemeris_record::SegmentEvaluator,
            naif_ids::{frame_name, inertial_rotation, is_inertial},
            summary_record::SpkSegment,
        },
        state_vector::StateVector,
    },
    kernel_errors::KernelError,
};

/// Longest center-of-motion chain accepted before giving up.
pub const MAX_CHAIN_DEPTH: usize = 64;

/// Distinct target codes of an SPK file, in ascending order.
pub fn spk_objects(daf: &mut DafFile) -> Result<BTreeSet<NaifId>, KernelError> {
    SegmentDirectory::spk_segments_iter(daf)?
        .map_ok(|segment| segment.target)
        .collect()
}

/// Time windows during which `body` is covered by the file, merged and sorted.
///
/// Overlapping or touching segment windows are reported as one interval.
pub fn spk_coverage(
    daf: &mut DafFile,
    body: NaifId,
) -> Result<Vec<(EphemerisTime, EphemerisTime)>, KernelError> {
    let windows: Vec<_> = SegmentDirectory::spk_segments_iter(daf)?
        .filter_map_ok(|segment| {
            (segment.target == body).then_some((segment.start_epoch, segment.end_epoch))
        })
        .try_collect()?;
    Ok(windows
        .into_iter()
        .sorted_by(|a, b| a.0.total_cmp(&b.0))
        .coalesce(|a, b| {
            if b.0 <= a.1 {
                Ok((a.0, a.1.max(b.1)))
            } else {
                Err((a, b))
            }
        })
        .collect())
}

/// State of `segment.target` relative to `segment.center` at `epoch`.
///
/// Return
/// ----------
/// * `(state, frame_id, center)`, the state being expressed in the segment frame.
/// * [`KernelError::Format`] for data types other than 2 and 3,
///   [`KernelError::Coverage`] when the segment data do not cover `epoch`.
pub fn get_state_relative_to_center_of_motion(
    daf: &mut DafFile,
    segment: &SpkSegment,
    epoch: EphemerisTime,
) -> Result<(StateVector, FrameId, NaifId), KernelError> {
    let (position, velocity) = SegmentEvaluator::for_segment(segment).evaluate(daf, segment, epoch)?;
    Ok((
        StateVector::new(position, velocity, epoch, segment.frame_id),
        segment.frame_id,
        segment.center,
    ))
}

fn describe_frame(id: FrameId) -> String {
    match frame_name(id) {
        "" => id.to_string(),
        name => name.to_string(),
    }
}

/// Express `state` in `frame_id`, when the two frames are related by a builtin rotation.
fn align(state: StateVector, frame_id: FrameId) -> Result<StateVector, KernelError> {
    if state.frame_id == frame_id {
        return Ok(state);
    }
    inertial_rotation(state.frame_id, frame_id)
        .map(|rotation| state.rotated(&rotation, frame_id))
        .ok_or_else(|| {
            let reason = if is_inertial(state.frame_id) && is_inertial(frame_id) {
                "no builtin rotation between these inertial frames"
            } else {
                "non-inertial frames need an external frame provider"
            };
            KernelError::Frame(format!(
                "cannot transform from frame {} to frame {}: {reason}",
                describe_frame(state.frame_id),
                describe_frame(frame_id)
            ))
        })
}

/// One step of a center-of-motion chain: an ancestor and the segment giving
/// the previous body relative to it (`None` for the chain origin).
type ChainLink = (NaifId, Option<(DafHandle, SpkSegment)>);

/// Segment tables of the loaded kernels, snapshotted for one query.
pub struct KernelIndex<'a> {
    handles: &'a mut DafHandles,
    /// Newest kernel first.
    kernels: Vec<(DafHandle, Vec<SpkSegment>)>,
    env: KernelEnv,
}

impl<'a> KernelIndex<'a> {
    /// Read the segment tables of the given kernels.
    ///
    /// Arguments
    /// -----------------
    /// * `handles`: Table of the open files.
    /// * `loaded`: Handles of the loaded kernels, in load order.
    /// * `env`: Aberration and light-time settings.
    pub fn build(
        handles: &'a mut DafHandles,
        loaded: &[DafHandle],
        env: KernelEnv,
    ) -> Result<Self, KernelError> {
        let mut kernels = Vec::with_capacity(loaded.len());
        for &handle in loaded.iter().rev() {
            let segments = SegmentDirectory::spk_segments(handles.get_mut(handle)?)?;
            kernels.push((handle, segments));
        }
        Ok(KernelIndex {
            handles,
            kernels,
            env,
        })
    }

    fn find_segment(&self, body: NaifId, epoch: EphemerisTime) -> Option<(DafHandle, SpkSegment)> {
        self.kernels.iter().find_map(|(handle, segments)| {
            segments
                .iter()
                .rev()
                .find(|segment| segment.target == body && segment.covers(epoch))
                .map(|segment| (*handle, segment.clone()))
        })
    }

    /// Error for two chains without a common ancestor.
    ///
    /// A chain that stops at a body known to the kernels, but not at this
    /// epoch, is a coverage gap rather than a missing link.
    fn broken_chain_error(
        &self,
        chains: [(&[ChainLink], EphemerisTime); 2],
        query: (NaifId, NaifId),
    ) -> KernelError {
        for (links, epoch) in chains {
            let Some((body, _)) = links.last() else { continue };
            let known = self
                .kernels
                .iter()
                .flat_map(|(_, segments)| segments.iter())
                .find(|segment| segment.target == *body);
            if let Some(segment) = known {
                return KernelError::Coverage {
                    body: *body,
                    center: segment.center,
                    epoch,
                };
            }
        }
        KernelError::Chain {
            target: query.0,
            observer: query.1,
            epoch: chains[1].1,
        }
    }

    /// Walk `body` up its centers of motion at `epoch`.
    ///
    /// Only segment lookups happen here; nothing is evaluated.
    fn chain(
        &self,
        body: NaifId,
        epoch: EphemerisTime,
        query: (NaifId, NaifId),
    ) -> Result<Vec<ChainLink>, KernelError> {
        let chain_error = || KernelError::Chain {
            target: query.0,
            observer: query.1,
            epoch,
        };

        let mut links: Vec<ChainLink> = vec![(body, None)];
        let mut current = body;
        while let Some((handle, segment)) = self.find_segment(current, epoch) {
            if links.len() > MAX_CHAIN_DEPTH {
                tracing::warn!(body, depth = links.len(), "center-of-motion chain too deep");
                return Err(chain_error());
            }
            let center = segment.center;
            if links.iter().any(|(id, _)| *id == center) {
                tracing::warn!(body, center, "cycle in center-of-motion chain");
                return Err(chain_error());
            }
            tracing::trace!(body = current, center, %handle, segment = %segment.name, "chain link");
            links.push((center, Some((handle, segment))));
            current = center;
        }
        Ok(links)
    }

    /// State of the origin of `links` relative to their last ancestor, in the
    /// frame of the first link. `None` for a chain reduced to its origin.
    fn accumulate(
        &mut self,
        links: &[ChainLink],
        epoch: EphemerisTime,
    ) -> Result<Option<StateVector>, KernelError> {
        let mut accumulated: Option<StateVector> = None;
        for (handle, segment) in links.iter().filter_map(|(_, link)| link.as_ref()) {
            let daf = self.handles.get_mut(*handle)?;
            let (link, _, _) = get_state_relative_to_center_of_motion(daf, segment, epoch)?;
            accumulated = Some(match accumulated {
                None => link,
                Some(state) => {
                    let frame = state.frame_id;
                    state + align(link, frame)?
                }
            });
        }
        Ok(accumulated)
    }

    /// State of `target` at `target_epoch` relative to `observer` at `observer_epoch`.
    fn relative_state(
        &mut self,
        target: NaifId,
        target_epoch: EphemerisTime,
        observer: NaifId,
        observer_epoch: EphemerisTime,
        frame: FrameId,
    ) -> Result<StateVector, KernelError> {
        let query = (target, observer);
        let target_chain = self.chain(target, target_epoch, query)?;
        let observer_chain = self.chain(observer, observer_epoch, query)?;

        let Some((mut i, mut j)) = target_chain.iter().enumerate().find_map(|(i, (ancestor, _))| {
            observer_chain
                .iter()
                .position(|(id, _)| id == ancestor)
                .map(|j| (i, j))
        }) else {
            return Err(self.broken_chain_error(
                [(target_chain.as_slice(), target_epoch), (observer_chain.as_slice(), observer_epoch)],
                query,
            ));
        };

        // a common ancestor other than the root moves between two distinct epochs
        if target_epoch != observer_epoch {
            let roots = (target_chain.len() - 1, observer_chain.len() - 1);
            if target_chain[roots.0].0 == observer_chain[roots.1].0 {
                (i, j) = roots;
            }
        }
        tracing::trace!(target, observer, ancestor = target_chain[i].0, "common ancestor");

        let target_state = self.accumulate(&target_chain[..=i], target_epoch)?;
        let observer_state = self.accumulate(&observer_chain[..=j], observer_epoch)?;

        let relative = match (target_state, observer_state) {
            (None, None) => StateVector::zero(observer_epoch, frame),
            (Some(t), None) => t,
            (None, Some(o)) => &StateVector::zero(observer_epoch, o.frame_id) - &o,
            (Some(t), Some(o)) => {
                let frame = t.frame_id;
                t - align(o, frame)?
            }
        };
        Ok(StateVector {
            epoch: observer_epoch,
            ..relative
        })
    }

    /// State of `target` as seen from `observer` at `epoch`, in frame `frame`.
    ///
    /// Arguments
    /// -----------------
    /// * `target`, `observer`: NAIF body codes.
    /// * `epoch`: Reception epoch, ET seconds.
    /// * `frame`: Code of the frame of the result.
    ///
    /// Return
    /// ----------
    /// * The state (km, km/s) and the one-way light time in seconds. Geometric
    ///   queries report `|r| / c`.
    /// * [`KernelError::Chain`] when the bodies share no ancestor in the loaded
    ///   kernels, [`KernelError::Coverage`] when a body known to the kernels is
    ///   not covered at the epoch, [`KernelError::Frame`] when link frames
    ///   cannot be reconciled.
    pub fn state_relative_to_body(
        &mut self,
        target: NaifId,
        epoch: EphemerisTime,
        frame: FrameId,
        observer: NaifId,
    ) -> Result<(StateVector, f64), KernelError> {
        if target == observer {
            return Ok((StateVector::zero(epoch, frame).with_light_time(0.0), 0.0));
        }

        let mut state = self.relative_state(target, epoch, observer, epoch, frame)?;
        let mut light_time = state.range_light_time();

        if self.env.aberration == Aberration::LightTime {
            let config = self.env.light_time;
            for iteration in 0..config.max_iterations {
                state = self.relative_state(target, epoch - light_time, observer, epoch, frame)?;
                let updated = state.range_light_time();
                let change = (updated - light_time).abs();
                light_time = updated;
                tracing::trace!(iteration, light_time, change, "light-time iteration");
                if change <= config.tolerance {
                    break;
                }
            }
        }

        let state = align(state, frame)?.with_light_time(light_time);
        Ok((state, light_time))
    }
}
