//! Unit types for physical quantities.
//!
//! Provides type-safe representations of feed rates and accelerations at the
//! configuration and API boundary. The planner internals work on raw floats.

use core::ops::{Add, Mul, Sub};

use serde::Deserialize;

/// Linear velocity in millimeters per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct MmPerSec(pub f32);

impl MmPerSec {
    /// Create a new MmPerSec value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl Add for MmPerSec {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for MmPerSec {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f32> for MmPerSec {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self(self.0 * rhs)
    }
}

/// Linear acceleration in millimeters per second squared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct MmPerSecSq(pub f32);

impl MmPerSecSq {
    /// Create a new MmPerSecSq value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

impl Mul<f32> for MmPerSecSq {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self(self.0 * rhs)
    }
}

/// Extension trait for creating unit types from primitives.
pub trait UnitExt {
    /// Convert to MmPerSec.
    fn mm_per_sec(self) -> MmPerSec;
    /// Convert to MmPerSecSq.
    fn mm_per_sec_sq(self) -> MmPerSecSq;
}

impl UnitExt for f32 {
    #[inline]
    fn mm_per_sec(self) -> MmPerSec {
        MmPerSec(self)
    }

    #[inline]
    fn mm_per_sec_sq(self) -> MmPerSecSq {
        MmPerSecSq(self)
    }
}
