//! Severity scores and their labels.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// A severity score in `[1, 5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Severity(u8);

impl Severity {
    /// Lowest score.
    pub const MIN: Self = Self(1);
    /// Highest score.
    pub const MAX: Self = Self(5);

    /// Build a score, rejecting values outside `[1, 5]`.
    pub fn new(value: i32) -> Result<Self, AppError> {
        if (1..=5).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(AppError::Validation(format!(
                "severity must be between 1 and 5, got {value}"
            )))
        }
    }

    /// Raw score.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Label for this score.
    #[must_use]
    pub fn label(self) -> SeverityLabel {
        SeverityLabel::from_score(f64::from(self.0))
    }

    /// Expected impact on the surroundings.
    #[must_use]
    pub const fn impact_level(self) -> &'static str {
        match self.0 {
            1 => "Minimal",
            2 => "Minor",
            3 => "Moderate",
            4 => "Significant",
            _ => "Severe",
        }
    }

    /// Rough time for the site to recover.
    #[must_use]
    pub const fn recovery_time(self) -> &'static str {
        match self.0 {
            1 => "Days",
            2 => "Weeks",
            3 => "Months",
            4 => "Years",
            _ => "Decades",
        }
    }
}

impl TryFrom<i32> for Severity {
    type Error = AppError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Severity> for i32 {
    fn from(value: Severity) -> Self {
        Self::from(value.0)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Five-bucket severity label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeverityLabel {
    /// Score at most 1.
    Minor,
    /// Score at most 2.
    Moderate,
    /// Score at most 3.
    Significant,
    /// Score at most 4.
    Severe,
    /// Anything higher.
    Critical,
}

impl SeverityLabel {
    /// Bucket a raw score. Bounds are inclusive upper limits.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score <= 1.0 {
            Self::Minor
        } else if score <= 2.0 {
            Self::Moderate
        } else if score <= 3.0 {
            Self::Significant
        } else if score <= 4.0 {
            Self::Severe
        } else {
            Self::Critical
        }
    }

    /// Display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "Minor",
            Self::Moderate => "Moderate",
            Self::Significant => "Significant",
            Self::Severe => "Severe",
            Self::Critical => "Critical",
        }
    }
}

impl fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
