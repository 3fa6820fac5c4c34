//! Fills in the smoothed speed of a freshly decoded snapshot.

use estimator::{EstimatorConfig, GpsSelector, GpsSubscription, VelocityEstimator};

use crate::car_state::VehicleState;
use crate::error::ConfigError;
use crate::profile::Platform;

#[derive(Debug)]
enum SpeedSource {
    Filter(VelocityEstimator),
    /// Simulated vehicles have no wheel speed: take GPS speed as-is.
    GpsBypass(GpsSelector),
}

#[derive(Debug)]
pub struct StateNormalizer {
    source: SpeedSource,
}

impl StateNormalizer {
    pub fn new(
        platform: Platform,
        cfg: EstimatorConfig,
        gps: Option<Box<dyn GpsSubscription + Send>>,
    ) -> Result<Self, ConfigError> {
        let source = match (platform, gps) {
            (Platform::Mock, Some(sub)) => SpeedSource::GpsBypass(GpsSelector::new(sub)),
            (Platform::Mock, None) => return Err(ConfigError::MissingGpsSource),
            (_, gps) => {
                if gps.is_some() {
                    tracing::debug!(
                        %platform,
                        "ignoring GPS subscription, platform has wheel speed"
                    );
                }
                SpeedSource::Filter(VelocityEstimator::new(cfg))
            }
        };
        Ok(Self { source })
    }

    pub fn is_gps_bypass(&self) -> bool {
        matches!(self.source, SpeedSource::GpsBypass(_))
    }

    pub fn normalize(&mut self, cs: &mut VehicleState) {
        match &mut self.source {
            SpeedSource::Filter(est) => {
                let x = est.update(cs.v_ego_raw);
                cs.v_ego = x.velocity;
                cs.a_ego = x.acceleration;
            }
            SpeedSource::GpsBypass(gps) => {
                let speed = gps.poll_speed();
                cs.v_ego = speed;
                cs.v_ego_raw = speed;
            }
        }
    }
}
