use estimator::{EstimatorConfig, GpsSubscription};

use crate::brand::BrandRuleTable;
use crate::car_state::{ControlOutput, VehicleState};
use crate::error::ConfigError;
use crate::events::Events;
use crate::latch::EngagementLatches;
use crate::normalize::StateNormalizer;
use crate::profile::{BrandProfile, Platform};

/// One vehicle session: resolved rule table, its latches and its speed normaliser.
///
/// Nothing here is shared between sessions, so independent engines can run side by
/// side (e.g. parallel simulated sessions in tests).
#[derive(Debug)]
pub struct SafetyEventEngine {
    table: BrandRuleTable,
    latches: EngagementLatches,
    normalizer: StateNormalizer,
}

impl SafetyEventEngine {
    /// Engine for a physical vehicle at the default 100 Hz cycle.
    pub fn new(profile: BrandProfile) -> Result<Self, ConfigError> {
        Self::with_config(profile, EstimatorConfig::default(), None)
    }

    /// Engine whose speed comes from GPS (`mock` platform).
    pub fn with_gps(
        profile: BrandProfile,
        gps: Box<dyn GpsSubscription + Send>,
    ) -> Result<Self, ConfigError> {
        Self::with_config(profile, EstimatorConfig::default(), Some(gps))
    }

    pub fn with_config(
        profile: BrandProfile,
        estimator: EstimatorConfig,
        gps: Option<Box<dyn GpsSubscription + Send>>,
    ) -> Result<Self, ConfigError> {
        let dt = estimator.cycle_period_s;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ConfigError::InvalidConfig {
                field: "cycle_period_s",
                reason: format!("expected a positive period, got {dt}"),
            });
        }

        let table = BrandRuleTable::new(profile)?;
        let normalizer = StateNormalizer::new(table.platform(), estimator, gps)?;

        let cp = table.profile();
        tracing::info!(
            platform = %table.platform(),
            pcm_cruise = cp.pcm_cruise,
            openpilot_long = cp.openpilot_longitudinal_control,
            min_enable_speed = cp.min_enable_speed,
            min_steer_speed = cp.min_steer_speed,
            gps_bypass = normalizer.is_gps_bypass(),
            "safety event engine ready"
        );

        Ok(Self {
            table,
            latches: EngagementLatches::new(dt),
            normalizer,
        })
    }

    pub fn platform(&self) -> Platform {
        self.table.platform()
    }

    pub fn profile(&self) -> &BrandProfile {
        self.table.profile()
    }

    pub fn latches(&self) -> &EngagementLatches {
        &self.latches
    }

    /// Write smoothed speed/acceleration into a freshly decoded snapshot.
    pub fn normalize(&mut self, cs: &mut VehicleState) {
        self.normalizer.normalize(cs);
    }

    /// Evaluate one control cycle.
    pub fn update(
        &mut self,
        cs: &VehicleState,
        cs_prev: &VehicleState,
        cc: &ControlOutput,
        cc_prev: &ControlOutput,
    ) -> Events {
        let events = self
            .table
            .evaluate(&mut self.latches, cs, cs_prev, cc, cc_prev);
        tracing::trace!(v_ego = cs.v_ego, events = ?events.names(), "cycle evaluated");
        events
    }
}
