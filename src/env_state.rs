//! # Kernel environment state
//!
//! This module defines [`KernelEnv`], the configuration object carried by a
//! [`KernelContext`](crate::kernel_context::KernelContext). It controls how
//! ephemeris queries are corrected:
//!
//! - The **aberration mode** ([`Aberration`]) selects geometric or light-time
//!   corrected states.
//! - The **light-time solver** parameters ([`LightTimeConfig`]) bound the fixed
//!   point iteration `t_emit = t_recv - |r(t_emit)| / c`.
//!
//! ## Defaults
//!
//! ```text
//! KernelEnv
//! ├── aberration  LightTime
//! └── light_time
//!     ├── tolerance       1e-10 s
//!     └── max_iterations  3
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use naif_spk::env_state::{Aberration, KernelEnv, LightTimeConfig};
//!
//! let env = KernelEnv::default()
//!     .with_aberration(Aberration::LightTime)
//!     .with_light_time(LightTimeConfig::new(1e-12, 5));
//! assert_eq!(env.light_time.max_iterations, 5);
//! ```

use std::fmt;

/// Correction applied to the target state of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aberration {
    /// Geometric state at the receive epoch.
    None,
    /// Target evaluated at the emission epoch found by the light-time iteration.
    #[default]
    LightTime,
}

/// Parameters of the light-time fixed point iteration.
///
/// The iteration stops as soon as two successive light-time estimates differ
/// by at most `tolerance` seconds, or after `max_iterations` re-evaluations of
/// the target state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightTimeConfig {
    /// Convergence threshold on successive light-time estimates, in seconds.
    pub tolerance: f64,
    /// Upper bound on the number of target re-evaluations.
    pub max_iterations: usize,
}

impl LightTimeConfig {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        LightTimeConfig {
            tolerance,
            max_iterations,
        }
    }
}

impl Default for LightTimeConfig {
    fn default() -> Self {
        LightTimeConfig {
            tolerance: 1e-10,
            max_iterations: 3,
        }
    }
}

/// Configuration shared by every query issued through a kernel context.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KernelEnv {
    pub aberration: Aberration,
    pub light_time: LightTimeConfig,
}

impl KernelEnv {
    pub fn new() -> Self {
        KernelEnv::default()
    }

    pub fn with_aberration(mut self, aberration: Aberration) -> Self {
        self.aberration = aberration;
        self
    }

    pub fn with_light_time(mut self, light_time: LightTimeConfig) -> Self {
        self.light_time = light_time;
        self
    }
}

impl fmt::Display for KernelEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "aberration={:?}, light-time tolerance={:e} s, max iterations={}",
            self.aberration, self.light_time.tolerance, self.light_time.max_iterations
        )
    }
}
