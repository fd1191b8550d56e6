use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Chart style used to present the tag frequency table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Vertical bars, value axis anchored at zero.
    #[default]
    Bar,
    /// Wedges with a legend.
    Pie,
}

impl ChartKind {
    /// Returns the other chart kind (the bar/pie toggle).
    pub fn toggled(self) -> Self {
        match self {
            Self::Bar => Self::Pie,
            Self::Pie => Self::Bar,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bar => write!(f, "bar"),
            Self::Pie => write!(f, "pie"),
        }
    }
}

/// Returned when a chart kind name is not `bar` or `pie`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown chart kind '{0}' (expected 'bar' or 'pie')")]
pub struct ParseChartKindError(String);

impl FromStr for ChartKind {
    type Err = ParseChartKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(Self::Bar),
            "pie" => Ok(Self::Pie),
            _ => Err(ParseChartKindError(s.to_string())),
        }
    }
}
