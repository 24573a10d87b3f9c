//! # KernelContext: loaded kernels, open files and ephemeris queries
//!
//! This module defines [`KernelContext`], the caller-owned façade that ties
//! together:
//!
//! 1. **Environment state** ([`KernelEnv`]): aberration mode and light-time solver settings.
//! 2. **Open files** ([`DafHandles`]): every DAF file opened by this context
//!    and nothing else, so independent contexts never see each other's files.
//! 3. **Loaded kernels**: canonical path → handle, in load order. The order
//!    matters: when several kernels cover the same body, the last loaded wins.
//!
//! ## Kernel lifecycle
//!
//! ```text
//! Unloaded ──load_kernel──▶ Loaded ──unload_kernel / unload_all──▶ Unloaded
//! ```
//!
//! Loading an already loaded path (after canonicalisation) is a no-op that
//! returns the existing handle. A kernel is validated when it is loaded: its
//! file record and every segment descriptor are decoded once; on failure the
//! file is closed again and the context is left as it was.
//!
//! ## Typical usage
//!
//! ```rust, no_run
//! use naif_spk::kernel_context::KernelContext;
//!
//! let mut ctx = KernelContext::new();
//! ctx.load_kernel("de440.bsp").unwrap();
//!
//! // Mars barycenter seen from the Earth, light-time corrected
//! let (state, light_time) = ctx
//!     .get_state_relative_to_body("MARS BARYCENTER", 0.0, "J2000", "EARTH")
//!     .unwrap();
//! println!("{state}\none-way light time: {light_time} s");
//!
//! ctx.unload_all();
//! assert_eq!(ctx.open_handle_count(), 0);
//! ```
//!
//! ## Errors
//!
//! Every failure is reported as a [`KernelError`]; see its variants for the
//! meaning of each case.

use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};
use hifitime::Epoch;

use crate::{
    constants::{EphemerisTime, NaifId},
    env_state::KernelEnv,
    jpl_ephem::{
        kernel_index::{self, KernelIndex},
        naif::{
            daf_file::{DafFile, DafHandle, DafHandles},
            directory::SegmentDirectory,
            naif_ids::{resolve_body, resolve_frame},
            summary_record::SpkSegment,
        },
        state_vector::StateVector,
    },
    kernel_errors::KernelError,
};

/// A kernel registered in a context.
#[derive(Debug, Clone, PartialEq)]
struct LoadedKernel {
    path: Utf8PathBuf,
    handle: DafHandle,
}

#[derive(Debug, Default)]
pub struct KernelContext {
    env: KernelEnv,
    handles: DafHandles,
    kernels: Vec<LoadedKernel>,
}

fn canonical(path: &Utf8Path) -> Result<Utf8PathBuf, KernelError> {
    Ok(path.canonicalize_utf8()?)
}

/// Canonical form of a path whose file no longer exists, through its parent directory.
fn canonical_of_removed(path: &Utf8Path) -> Result<Utf8PathBuf, KernelError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| KernelError::Format(format!("{path}: not a file path")))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    Ok(canonical(parent)?.join(file_name))
}

impl KernelContext {
    /// Empty context with the default [`KernelEnv`].
    pub fn new() -> Self {
        KernelContext::default()
    }

    pub fn with_env(env: KernelEnv) -> Self {
        KernelContext {
            env,
            ..KernelContext::default()
        }
    }

    pub fn env(&self) -> &KernelEnv {
        &self.env
    }

    pub fn set_env(&mut self, env: KernelEnv) {
        self.env = env;
    }

    /// Load an SPK kernel.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: Location of the kernel; it is canonicalised before use.
    ///
    /// Return
    /// ----------
    /// * The handle of the kernel. A path that is already loaded returns its
    ///   existing handle without reopening the file.
    /// * [`KernelError::IoError`] if the file cannot be read,
    ///   [`KernelError::Format`] if it is not a valid SPK file. Nothing stays
    ///   open in either case.
    pub fn load_kernel(&mut self, path: impl AsRef<Utf8Path>) -> Result<DafHandle, KernelError> {
        let path = canonical(path.as_ref())?;
        if let Some(handle) = self.handle_of(&path) {
            tracing::debug!(%path, %handle, "kernel already loaded");
            return Ok(handle);
        }

        let handle = self.handles.open(&path)?;
        let scan = self.handles.get_mut(handle).and_then(validate_segments);

        match scan {
            Ok(count) => {
                tracing::debug!(%path, %handle, segments = count, "kernel loaded");
                self.kernels.push(LoadedKernel { path, handle });
                Ok(handle)
            }
            Err(e) => {
                self.handles.close(handle);
                tracing::warn!(%path, error = %e, "kernel rejected");
                Err(e)
            }
        }
    }

    /// Unload one kernel.
    ///
    /// A kernel whose file was removed since loading is still found by its path.
    ///
    /// Return
    /// ----------
    /// * `true` if the kernel was loaded and is now closed, `false` otherwise.
    pub fn unload_kernel(&mut self, path: impl AsRef<Utf8Path>) -> bool {
        let path = path.as_ref();
        let path = canonical(path)
            .or_else(|_| canonical_of_removed(path))
            .unwrap_or_else(|_| path.to_path_buf());
        match self.kernels.iter().position(|kernel| kernel.path == path) {
            Some(index) => {
                let kernel = self.kernels.remove(index);
                self.handles.close(kernel.handle);
                tracing::debug!(path = %kernel.path, handle = %kernel.handle, "kernel unloaded");
                true
            }
            None => false,
        }
    }

    /// Unload every kernel and close every file of the context.
    pub fn unload_all(&mut self) {
        tracing::debug!(kernels = self.kernels.len(), "unloading all kernels");
        self.kernels.clear();
        self.handles.close_all();
    }

    fn handle_of(&self, path: &Utf8Path) -> Option<DafHandle> {
        self.kernels
            .iter()
            .find(|kernel| kernel.path == path)
            .map(|kernel| kernel.handle)
    }

    /// Handle of `path` if it is loaded in this context.
    pub fn is_loaded(&self, path: impl AsRef<Utf8Path>) -> Option<DafHandle> {
        let path = canonical(path.as_ref()).ok()?;
        self.handle_of(&path)
    }

    /// Canonical paths of the loaded kernels, in load order.
    pub fn loaded_kernels(&self) -> impl Iterator<Item = &Utf8Path> + '_ {
        self.kernels.iter().map(|kernel| kernel.path.as_path())
    }

    /// Number of DAF files currently open in this context.
    pub fn open_handle_count(&self) -> usize {
        self.handles.len()
    }

    /// Run `f` on the DAF file at `path`.
    ///
    /// A loaded kernel is used in place; any other file is opened for the
    /// duration of the call and closed afterwards, whatever `f` returns.
    fn with_daf<T>(
        &mut self,
        path: &Utf8Path,
        f: impl FnOnce(&mut DafFile) -> Result<T, KernelError>,
    ) -> Result<T, KernelError> {
        let path = canonical(path)?;
        if let Some(handle) = self.handles.is_loaded(&path) {
            return f(self.handles.get_mut(handle)?);
        }

        let handle = self.handles.open(&path)?;
        let result = self.handles.get_mut(handle).and_then(f);
        self.handles.close(handle);
        result
    }

    /// Distinct target codes of the SPK file at `path`, ascending.
    ///
    /// The file does not need to be loaded.
    pub fn spk_objects(&mut self, path: impl AsRef<Utf8Path>) -> Result<BTreeSet<NaifId>, KernelError> {
        self.with_daf(path.as_ref(), kernel_index::spk_objects)
    }

    /// Merged coverage windows of `body` (name or code) in the SPK file at `path`.
    pub fn spk_coverage(
        &mut self,
        path: impl AsRef<Utf8Path>,
        body: &str,
    ) -> Result<Vec<(EphemerisTime, EphemerisTime)>, KernelError> {
        let body = resolve_body(body)?;
        self.with_daf(path.as_ref(), |daf| kernel_index::spk_coverage(daf, body))
    }

    /// Text of the comment area of the DAF file at `path`.
    pub fn comments(&mut self, path: impl AsRef<Utf8Path>) -> Result<String, KernelError> {
        self.with_daf(path.as_ref(), DafFile::comment_area)
    }

    /// Segment descriptors of the SPK file at `path`, in file order.
    pub fn segments(&mut self, path: impl AsRef<Utf8Path>) -> Result<Vec<SpkSegment>, KernelError> {
        self.with_daf(path.as_ref(), SegmentDirectory::spk_segments)
    }

    /// State of `target` relative to `observer` at `epoch`, in `frame`.
    ///
    /// Arguments
    /// -----------------
    /// * `target`: Body name or NAIF code as a string.
    /// * `epoch`: Reception epoch, ET seconds past J2000.
    /// * `frame`: Frame name or code of the result.
    /// * `observer`: Body name or NAIF code as a string.
    ///
    /// Return
    /// ----------
    /// * The state (km, km/s) and the one-way light time (s). The target is
    ///   light-time corrected when the context aberration is
    ///   [`LightTime`](crate::env_state::Aberration::LightTime).
    /// * [`KernelError::NameResolution`], [`KernelError::Chain`],
    ///   [`KernelError::Frame`], [`KernelError::Coverage`] or
    ///   [`KernelError::Format`] on failure.
    pub fn get_state_relative_to_body(
        &mut self,
        target: &str,
        epoch: EphemerisTime,
        frame: &str,
        observer: &str,
    ) -> Result<(StateVector, f64), KernelError> {
        let target = resolve_body(target)?;
        let observer = resolve_body(observer)?;
        let frame = resolve_frame(frame)?;

        let loaded: Vec<DafHandle> = self.kernels.iter().map(|kernel| kernel.handle).collect();
        KernelIndex::build(&mut self.handles, &loaded, self.env)?
            .state_relative_to_body(target, epoch, frame, observer)
    }

    /// Same as [`get_state_relative_to_body`](Self::get_state_relative_to_body)
    /// with a [`hifitime::Epoch`], converted to ET seconds.
    pub fn get_state_relative_to_body_at(
        &mut self,
        target: &str,
        epoch: Epoch,
        frame: &str,
        observer: &str,
    ) -> Result<(StateVector, f64), KernelError> {
        self.get_state_relative_to_body(target, epoch.to_et_seconds(), frame, observer)
    }
}

/// Decode every segment descriptor of a freshly opened kernel.
fn validate_segments(daf: &mut DafFile) -> Result<usize, KernelError> {
    let words = daf.word_count();
    let path = daf.path().to_owned();
    let mut count = 0;
    for segment in SegmentDirectory::spk_segments_iter(daf)? {
        let segment = segment?;
        if segment.final_addr as usize > words {
            return Err(KernelError::Format(format!(
                "{path}: segment {:?} ends at word {} past the end of the file",
                segment.name, segment.final_addr
            )));
        }
        count += 1;
    }
    Ok(count)
}
