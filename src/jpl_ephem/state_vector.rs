//! Cartesian state returned by ephemeris queries.
//!
//! Overview
//! -----------------
//! [`StateVector`] carries the position and velocity of a body relative to
//! another, together with the epoch and the frame they are expressed in, and
//! the one-way light time when the query computed it.
//!
//! Units
//! -----------------
//! * `position`: kilometers (km)
//! * `velocity`: kilometers per second (km/s)
//! * `epoch`: ET seconds past J2000 TDB
//! * `light_time`: seconds
//!
//! Use [`StateVector::to_au`] for AU and AU/day.
//!
//! Arithmetic semantics
//! -----------------
//! `+` and `-` combine links of a center-of-motion chain. They act on
//! position and velocity and keep the epoch and frame of the left operand;
//! the light time is dropped, since it only makes sense for a finished query.

use std::{
    fmt,
    ops::{Add, Sub},
};

use hifitime::Epoch;
use nalgebra::{Matrix3, Vector3};

use crate::constants::{EphemerisTime, FrameId, Kilometer, AU, SECONDS_PER_DAY, VLIGHT};

/// Position and velocity of a body, with their epoch and frame.
#[derive(Debug, PartialEq, Clone)]
pub struct StateVector {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub epoch: EphemerisTime,
    pub frame_id: FrameId,
    pub light_time: Option<f64>,
}

impl StateVector {
    pub fn new(
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        epoch: EphemerisTime,
        frame_id: FrameId,
    ) -> Self {
        StateVector {
            position,
            velocity,
            epoch,
            frame_id,
            light_time: None,
        }
    }

    /// The null state, returned when a body is observed from itself.
    pub fn zero(epoch: EphemerisTime, frame_id: FrameId) -> Self {
        StateVector::new(Vector3::zeros(), Vector3::zeros(), epoch, frame_id)
    }

    #[must_use]
    pub fn with_light_time(mut self, light_time: f64) -> Self {
        self.light_time = Some(light_time);
        self
    }

    /// Express the state in another frame.
    ///
    /// Arguments
    /// -----------------
    /// * `rotation`: Matrix taking vectors of the current frame into `frame_id`.
    /// * `frame_id`: Code of the target frame.
    #[must_use]
    pub fn rotated(&self, rotation: &Matrix3<f64>, frame_id: FrameId) -> Self {
        StateVector {
            position: rotation * self.position,
            velocity: rotation * self.velocity,
            frame_id,
            ..self.clone()
        }
    }

    /// Distance between the two bodies (km).
    pub fn range(&self) -> Kilometer {
        self.position.norm()
    }

    /// Geometric one-way light time for the current position (s).
    pub fn range_light_time(&self) -> f64 {
        self.range() / VLIGHT
    }

    pub fn epoch_tdb(&self) -> Epoch {
        Epoch::from_et_seconds(self.epoch)
    }

    /// Convert position to AU and velocity to AU/day.
    #[must_use = "`.to_au()` returns a new StateVector; assign or use it"]
    pub fn to_au(&self) -> Self {
        StateVector {
            position: self.position / AU,
            velocity: self.velocity * SECONDS_PER_DAY / AU,
            ..self.clone()
        }
    }
}

impl Add for &StateVector {
    type Output = StateVector;

    fn add(self, other: Self) -> Self::Output {
        StateVector::new(
            self.position + other.position,
            self.velocity + other.velocity,
            self.epoch,
            self.frame_id,
        )
    }
}

impl Add for StateVector {
    type Output = StateVector;

    fn add(self, other: Self) -> Self::Output {
        &self + &other
    }
}

impl Sub for &StateVector {
    type Output = StateVector;

    fn sub(self, other: Self) -> Self::Output {
        StateVector::new(
            self.position - other.position,
            self.velocity - other.velocity,
            self.epoch,
            self.frame_id,
        )
    }
}

impl Sub for StateVector {
    type Output = StateVector;

    fn sub(self, other: Self) -> Self::Output {
        &self - &other
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "State at {} (frame {})", self.epoch_tdb(), self.frame_id)?;
        writeln!(
            f,
            "  position [km]   : [{:>20.6}, {:>20.6}, {:>20.6}]",
            self.position.x, self.position.y, self.position.z
        )?;
        write!(
            f,
            "  velocity [km/s] : [{:>20.9}, {:>20.9}, {:>20.9}]",
            self.velocity.x, self.velocity.y, self.velocity.z
        )?;
        if let Some(lt) = self.light_time {
            write!(f, "\n  light time [s]  : {lt:.9}")?;
        }
        Ok(())
    }
}
