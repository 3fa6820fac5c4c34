//! Vehicle profile, resolved once per session from vehicle identification.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkLocation {
    #[default]
    Gateway,
    FwdCamera,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandProfile {
    pub car_name: String,
    /// Below this speed (m/s) the EPS will not steer.
    pub min_steer_speed: f64,
    /// Below this speed (m/s) engagement is refused.
    pub min_enable_speed: f64,
    /// Engagement follows the native cruise module.
    pub pcm_cruise: bool,
    /// Longitudinal control is owned by us rather than the stock ACC.
    pub openpilot_longitudinal_control: bool,
    pub network_location: NetworkLocation,
}

impl Default for BrandProfile {
    fn default() -> Self {
        Self {
            car_name: String::new(),
            min_steer_speed: 0.0,
            min_enable_speed: -1.0,
            pcm_cruise: true,
            openpilot_longitudinal_control: false,
            network_location: NetworkLocation::Gateway,
        }
    }
}

impl BrandProfile {
    pub fn new(car_name: impl Into<String>) -> Self {
        Self {
            car_name: car_name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_steer_speed.is_finite() || self.min_steer_speed < 0.0 {
            return Err(ConfigError::InvalidConfig {
                field: "min_steer_speed",
                reason: format!("expected a finite speed >= 0, got {}", self.min_steer_speed),
            });
        }
        // Negative min_enable_speed means "no limit".
        if !self.min_enable_speed.is_finite() {
            return Err(ConfigError::InvalidConfig {
                field: "min_enable_speed",
                reason: format!("expected a finite speed, got {}", self.min_enable_speed),
            });
        }
        Ok(())
    }
}

/// Every platform the rule table knows how to evaluate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Body,
    Mock,
    Subaru,
    Ford,
    Nissan,
    Mazda,
    Chrysler,
    Honda,
    Toyota,
    Gm,
    Volkswagen,
    Hyundai,
}

impl Platform {
    pub const ALL: [Platform; 12] = [
        Platform::Body,
        Platform::Mock,
        Platform::Subaru,
        Platform::Ford,
        Platform::Nissan,
        Platform::Mazda,
        Platform::Chrysler,
        Platform::Honda,
        Platform::Toyota,
        Platform::Gm,
        Platform::Volkswagen,
        Platform::Hyundai,
    ];

    pub fn car_name(self) -> &'static str {
        match self {
            Platform::Body => "body",
            Platform::Mock => "mock",
            Platform::Subaru => "subaru",
            Platform::Ford => "ford",
            Platform::Nissan => "nissan",
            Platform::Mazda => "mazda",
            Platform::Chrysler => "chrysler",
            Platform::Honda => "honda",
            Platform::Toyota => "toyota",
            Platform::Gm => "gm",
            Platform::Volkswagen => "volkswagen",
            Platform::Hyundai => "hyundai",
        }
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.car_name() == s)
            .ok_or_else(|| ConfigError::UnsupportedPlatform(s.to_string()))
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.car_name())
    }
}
