//! # Constants and type definitions for `naif_spk`
//!
//! This module centralizes the **physical constants**, the **DAF layout
//! constants**, and the **type aliases** shared by the kernel reader.
//!
//! ## Overview
//!
//! - Physical constants (speed of light, astronomical unit, obliquity at J2000)
//! - DAF container geometry (record length, summary limits)
//! - Core type aliases used across the crate

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// Speed of light in km/s
pub const VLIGHT: f64 = 2.99792458e5;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Mean obliquity of the ecliptic at J2000 (IAU 1976), in radians
pub const OBLIQUITY_J2000: f64 = ((23.0 * 3600.0 + 26.0 * 60.0) + 21.448) * RADSEC;

// -------------------------------------------------------------------------------------------------
// DAF container geometry
// -------------------------------------------------------------------------------------------------

/// Length in bytes of every DAF record
pub const DAF_RECORD_LEN: usize = 1024;

/// Number of double precision words in a DAF record
pub const DAF_RECORD_WORDS: usize = DAF_RECORD_LEN / 8;

/// Maximum summary size (in double precision words) that fits in a summary record
/// next to the three control words
pub const MAX_SUMMARY_WORDS: usize = DAF_RECORD_WORDS - 3;

/// Maximum number of double precision components in a summary
pub const MAX_ND: usize = 124;

/// Minimum number of integer components in a summary
pub const MIN_NI: usize = 2;

/// FTP validation string written by NAIF toolkits at byte 699 of the file record
pub const FTPSTR: &[u8] = b"FTPSTR:\r:\n:\r\n:\r\x00:\x81:\x10\xce:ENDFTP";

/// Byte offset of [`FTPSTR`] inside the file record
pub const FTPSTR_OFFSET: usize = 699;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Ephemeris time, seconds past J2000 TDB
pub type EphemerisTime = f64;

/// Distance in kilometers
pub type Kilometer = f64;

/// NAIF integer code of a body
pub type NaifId = i32;

/// NAIF integer code of a reference frame
pub type FrameId = i32;
