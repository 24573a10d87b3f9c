//! Builtin NAIF name tables for bodies and reference frames.
//!
//! Each table is a bijection between an integer code and a **canonical**
//! upper-case name. A few lookup-only aliases (e.g. `SSB`, `EMB`) resolve to
//! the same codes but are never returned by the code → name direction.
//! Unknown codes map to an empty name instead of failing.
//!
//! Name → code resolution follows the NAIF conventions:
//!
//! 1. exact lookup of the given string (a decimal integer is taken as a code),
//! 2. on failure, a single retry after normalisation: surrounding whitespace
//!    trimmed, inner whitespace collapsed, upper-cased (and `_` read as a
//!    space for body names),
//! 3. [`KernelError::NameResolution`] if both attempts fail.

pub mod bodies;
pub mod frames;

use std::sync::LazyLock;

use ahash::AHashMap;

use crate::kernel_errors::KernelError;

pub use bodies::{BODY_ALIASES, BODY_NAMES};
pub use frames::{inertial_rotation, is_inertial, FRAME_NAMES};

struct NameTable {
    by_id: AHashMap<i32, &'static str>,
    by_name: AHashMap<&'static str, i32>,
}

impl NameTable {
    fn build(canonical: &[(i32, &'static str)], aliases: &[(&'static str, i32)]) -> Self {
        let by_id = canonical.iter().copied().collect();
        let by_name = canonical
            .iter()
            .map(|&(id, name)| (name, id))
            .chain(aliases.iter().copied())
            .collect();
        NameTable { by_id, by_name }
    }

    fn lookup(&self, name: &str) -> Option<i32> {
        self.by_name
            .get(name)
            .copied()
            .or_else(|| name.parse::<i32>().ok())
    }
}

static BODIES: LazyLock<NameTable> = LazyLock::new(|| NameTable::build(BODY_NAMES, BODY_ALIASES));

static FRAMES: LazyLock<NameTable> = LazyLock::new(|| NameTable::build(FRAME_NAMES, &[]));

/// Normalise a user supplied name before the second lookup attempt.
///
/// Arguments
/// -----------------
/// * `name`: Raw name as given by the caller.
/// * `underscore_is_space`: Read `_` as a word separator (body names only;
///   frame names such as `IAU_EARTH` keep their underscores).
///
/// Return
/// ----------
/// * The trimmed, whitespace-collapsed, upper-case form of `name`.
pub fn normalize_name(name: &str, underscore_is_space: bool) -> String {
    let spaced: String = if underscore_is_space {
        name.replace('_', " ")
    } else {
        name.to_string()
    };
    spaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

fn resolve(
    table: &NameTable,
    kind: &str,
    name: &str,
    underscore_is_space: bool,
) -> Result<i32, KernelError> {
    if let Some(id) = table.lookup(name) {
        return Ok(id);
    }
    let normalized = normalize_name(name, underscore_is_space);
    tracing::trace!(kind, raw = name, normalized = %normalized, "retrying name lookup");
    table
        .lookup(&normalized)
        .ok_or_else(|| KernelError::NameResolution(format!("unknown {kind} name {name:?}")))
}

/// Canonical name of a body code, empty when the code is not in the table.
pub fn body_name(id: i32) -> &'static str {
    BODIES.by_id.get(&id).copied().unwrap_or("")
}

/// Resolve a body name (or decimal code) to its NAIF code.
pub fn resolve_body(name: &str) -> Result<i32, KernelError> {
    resolve(&BODIES, "body", name, true)
}

/// Canonical name of a frame code, empty when the code is not in the table.
pub fn frame_name(id: i32) -> &'static str {
    FRAMES.by_id.get(&id).copied().unwrap_or("")
}

/// Resolve a frame name (or decimal code) to its NAIF frame code.
pub fn resolve_frame(name: &str) -> Result<i32, KernelError> {
    resolve(&FRAMES, "frame", name, false)
}
