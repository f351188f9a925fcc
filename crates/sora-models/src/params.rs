//! Generation parameters accepted by the create endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::media::Dimensions;

/// Invalid generation parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("Invalid --seconds value: {0} (must be 4, 8, or 12)")]
    InvalidSeconds(String),
}

/// Model variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Model {
    #[default]
    #[serde(rename = "sora-2")]
    Sora2,
    /// Higher quality at the same resolution, higher cost
    #[serde(rename = "sora-2-pro")]
    Sora2Pro,
}

impl Model {
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Sora2 => "sora-2",
            Model::Sora2Pro => "sora-2-pro",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VideoSize {
    #[default]
    #[serde(rename = "1280x720")]
    Landscape,
    #[serde(rename = "720x1280")]
    Portrait,
}

impl VideoSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoSize::Landscape => "1280x720",
            VideoSize::Portrait => "720x1280",
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        match self {
            VideoSize::Landscape => Dimensions::new(1280, 720),
            VideoSize::Portrait => Dimensions::new(720, 1280),
        }
    }
}

impl fmt::Display for VideoSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Clip duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Seconds {
    #[serde(rename = "4")]
    Four,
    #[default]
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "12")]
    Twelve,
}

impl Seconds {
    pub fn as_str(&self) -> &'static str {
        match self {
            Seconds::Four => "4",
            Seconds::Eight => "8",
            Seconds::Twelve => "12",
        }
    }
}

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Seconds {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "4" => Ok(Seconds::Four),
            "8" => Ok(Seconds::Eight),
            "12" => Ok(Seconds::Twelve),
            other => Err(ParamError::InvalidSeconds(other.to_string())),
        }
    }
}
