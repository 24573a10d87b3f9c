//! SPK segment data types as declared in the fourth integer of a summary.
//!
//! Only types 2 and 3 are evaluated by this crate; the full table is kept so
//! that summaries of other types can still be listed and displayed.

use std::{convert::TryFrom, fmt};

use crate::kernel_errors::KernelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SpkDataType {
    ModifiedDifferenceArray = 1,
    ChebyshevPositionOnly = 2,
    ChebyshevPositionVelocity = 3,
    Reserved4 = 4,
    TwoBodyDiscreteStates = 5,
    Reserved6 = 6,
    Reserved7 = 7,
    EquallySpacedLagrange = 8,
    UnequallySpacedLagrange = 9,
    TwoLineElements = 10,
    Reserved11 = 11,
    HermiteUniform = 12,
    HermiteNonUniform = 13,
    ChebyshevNonUniform = 14,
    PrecessingConic = 15,
    Reserved16 = 16,
    EquinoctialElements = 17,
    ESAHermiteLagrange = 18,
    ESAPiecewiseInterpolation = 19,
    ChebyshevVelocityOnly = 20,
    ExtendedModifiedDifferenceArray = 21,
}

impl SpkDataType {
    pub fn from_i32(value: i32) -> Result<Self, KernelError> {
        SpkDataType::try_from(value)
    }
}

impl From<SpkDataType> for i32 {
    fn from(data_type: SpkDataType) -> Self {
        data_type as i32
    }
}

impl TryFrom<i32> for SpkDataType {
    type Error = KernelError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        use SpkDataType::*;
        match value {
            1 => Ok(ModifiedDifferenceArray),
            2 => Ok(ChebyshevPositionOnly),
            3 => Ok(ChebyshevPositionVelocity),
            4 => Ok(Reserved4),
            5 => Ok(TwoBodyDiscreteStates),
            6 => Ok(Reserved6),
            7 => Ok(Reserved7),
            8 => Ok(EquallySpacedLagrange),
            9 => Ok(UnequallySpacedLagrange),
            10 => Ok(TwoLineElements),
            11 => Ok(Reserved11),
            12 => Ok(HermiteUniform),
            13 => Ok(HermiteNonUniform),
            14 => Ok(ChebyshevNonUniform),
            15 => Ok(PrecessingConic),
            16 => Ok(Reserved16),
            17 => Ok(EquinoctialElements),
            18 => Ok(ESAHermiteLagrange),
            19 => Ok(ESAPiecewiseInterpolation),
            20 => Ok(ChebyshevVelocityOnly),
            21 => Ok(ExtendedModifiedDifferenceArray),
            _ => Err(KernelError::Format(format!("unknown SPK data type {value}"))),
        }
    }
}

impl fmt::Display for SpkDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpkDataType::ModifiedDifferenceArray => "Modified Difference Array",
            SpkDataType::ChebyshevPositionOnly => "Chebyshev Position Only",
            SpkDataType::ChebyshevPositionVelocity => "Chebyshev Position Velocity",
            SpkDataType::Reserved4 => "Reserved 4",
            SpkDataType::TwoBodyDiscreteStates => "Two Body Discrete States",
            SpkDataType::Reserved6 => "Reserved 6",
            SpkDataType::Reserved7 => "Reserved 7",
            SpkDataType::EquallySpacedLagrange => "Equally Spaced Lagrange",
            SpkDataType::UnequallySpacedLagrange => "Unequally Spaced Lagrange",
            SpkDataType::TwoLineElements => "Two Line Elements",
            SpkDataType::Reserved11 => "Reserved 11",
            SpkDataType::HermiteUniform => "Hermite Uniform",
            SpkDataType::HermiteNonUniform => "Hermite Non Uniform",
            SpkDataType::ChebyshevNonUniform => "Chebyshev Non Uniform",
            SpkDataType::PrecessingConic => "Precessing Conic",
            SpkDataType::Reserved16 => "Reserved 16",
            SpkDataType::EquinoctialElements => "Equinoctial Elements",
            SpkDataType::ESAHermiteLagrange => "ESA Hermite Lagrange",
            SpkDataType::ESAPiecewiseInterpolation => "ESA Piecewise Interpolation",
            SpkDataType::ChebyshevVelocityOnly => "Chebyshev Velocity Only",
            SpkDataType::ExtendedModifiedDifferenceArray => "Extended Modified Difference Array",
        };
        write!(f, "{s}")
    }
}
