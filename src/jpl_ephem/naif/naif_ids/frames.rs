//! Builtin reference frames and the constant rotations between inertial ones.
//!
//! Codes 1 to 21 are the inertial frames known to every NAIF toolkit; codes
//! 10001 to 10020 are the `IAU_*` body-fixed frames, whose orientation depends
//! on time and on PCK data and is therefore left to an external frame
//! provider.
//!
//! Only J2000 and ECLIPJ2000 carry a rotation here: the ecliptic frame is the
//! J2000 equator rotated about X by the IAU 1976 obliquity at J2000.

use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::OBLIQUITY_J2000;

/// Canonical `(code, name)` pairs.
pub const FRAME_NAMES: &[(i32, &str)] = &[
    (1, "J2000"),
    (2, "B1950"),
    (3, "FK4"),
    (4, "DE-118"),
    (5, "DE-96"),
    (6, "DE-102"),
    (7, "DE-108"),
    (8, "DE-111"),
    (9, "DE-114"),
    (10, "DE-122"),
    (11, "DE-125"),
    (12, "DE-130"),
    (13, "GALACTIC"),
    (14, "DE-200"),
    (15, "DE-202"),
    (16, "MARSIAU"),
    (17, "ECLIPJ2000"),
    (18, "ECLIPB1950"),
    (19, "DE-140"),
    (20, "DE-142"),
    (21, "DE-143"),
    (10001, "IAU_MERCURY_BARYCENTER"),
    (10002, "IAU_VENUS_BARYCENTER"),
    (10003, "IAU_EARTH_BARYCENTER"),
    (10004, "IAU_MARS_BARYCENTER"),
    (10005, "IAU_JUPITER_BARYCENTER"),
    (10006, "IAU_SATURN_BARYCENTER"),
    (10007, "IAU_URANUS_BARYCENTER"),
    (10008, "IAU_NEPTUNE_BARYCENTER"),
    (10009, "IAU_PLUTO_BARYCENTER"),
    (10010, "IAU_SUN"),
    (10011, "IAU_MERCURY"),
    (10012, "IAU_VENUS"),
    (10013, "IAU_EARTH"),
    (10014, "IAU_MARS"),
    (10015, "IAU_JUPITER"),
    (10016, "IAU_SATURN"),
    (10017, "IAU_URANUS"),
    (10018, "IAU_NEPTUNE"),
    (10019, "IAU_PLUTO"),
    (10020, "IAU_MOON"),
];

pub const J2000: i32 = 1;
pub const ECLIPJ2000: i32 = 17;

/// Whether `frame_id` is one of the builtin inertial frames.
pub fn is_inertial(frame_id: i32) -> bool {
    (1..=21).contains(&frame_id)
}

/// Rotation taking vectors expressed in `frame_id` into J2000, when it is known.
fn rotation_to_j2000(frame_id: i32) -> Option<Matrix3<f64>> {
    match frame_id {
        J2000 => Some(Matrix3::identity()),
        ECLIPJ2000 => Some(Rotation3::from_axis_angle(&Vector3::x_axis(), OBLIQUITY_J2000).into()),
        _ => None,
    }
}

/// Constant rotation from frame `from` to frame `to`.
///
/// Return
/// ----------
/// * `Some(R)` with `v_to = R * v_from` when both frames are identical or both
///   have a builtin rotation to J2000, `None` otherwise.
pub fn inertial_rotation(from: i32, to: i32) -> Option<Matrix3<f64>> {
    if from == to {
        return Some(Matrix3::identity());
    }
    let from_j2000 = rotation_to_j2000(from)?;
    let to_j2000 = rotation_to_j2000(to)?;
    Some(to_j2000.transpose() * from_j2000)
}
