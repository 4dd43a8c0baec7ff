// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Pressure bands for the 0-100 pressure level.
//!
//! # Example
//!
//! ```
//! use lowmem_reclaim::PressureBand;
//!
//! assert_eq!(PressureBand::from_level(42), PressureBand::Relief);
//! assert_eq!(PressureBand::from_level(92), PressureBand::Moderate);
//! assert_eq!(PressureBand::from_level(96), PressureBand::Severe);
//! assert!(PressureBand::Severe.always_escalates());
//! ```

/// Pressure band derived from a 0-100 level.
///
/// - **Relief** (< 90): cancels any pending escalation
/// - **Moderate** (90-94): escalates only when file cache is also scarce
/// - **Severe** (>= 95): always escalates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PressureBand {
    Relief = 0,
    Moderate = 1,
    Severe = 2,
}

impl PressureBand {
    pub const MODERATE_LEVEL: u8 = 90;
    pub const SEVERE_LEVEL: u8 = 95;

    /// Classify a pressure level. Values above 100 are treated as 100.
    #[must_use]
    pub fn from_level(level: u8) -> Self {
        match level.min(100) {
            l if l < Self::MODERATE_LEVEL => Self::Relief,
            l if l < Self::SEVERE_LEVEL => Self::Moderate,
            _ => Self::Severe,
        }
    }

    #[must_use]
    pub fn always_escalates(&self) -> bool {
        matches!(self, Self::Severe)
    }

    #[must_use]
    pub fn cancels_escalation(&self) -> bool {
        matches!(self, Self::Relief)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Relief => "Relief - pending escalation cancelled",
            Self::Moderate => "Moderate - escalate if file cache is scarce",
            Self::Severe => "Severe - escalate unconditionally",
        }
    }
}

impl std::fmt::Display for PressureBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
