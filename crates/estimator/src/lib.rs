//! Speed estimation for the per-cycle vehicle state.
//!
//! [`VelocityEstimator`] smooths the raw wheel speed with a fixed-gain two-state filter.
//! [`gps::GpsSelector`] replaces it on simulated vehicles that have no wheel-speed signal.

pub mod gain;
pub mod gps;

pub use gain::{steady_state_gain, KalmanGain};
pub use gps::{GpsFix, GpsSelector, GpsSubscription, GpsTopic};

use serde::{Deserialize, Serialize};

/// Control cycle period, seconds.
pub const DT_CTRL: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub cycle_period_s: f64,
    /// Acceleration process-noise intensity.
    pub process_noise: f64,
    /// Raw speed measurement variance.
    pub measurement_noise: f64,
    /// Deviation (m/s) between measurement and estimate that forces a hard reset.
    pub reset_threshold: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            cycle_period_s: DT_CTRL,
            process_noise: 100.0,
            measurement_noise: 0.3,
            reset_threshold: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct KinematicFilterState {
    pub velocity: f64,
    pub acceleration: f64,
}

#[derive(Clone, Debug)]
pub struct VelocityEstimator {
    cfg: EstimatorConfig,
    gain: KalmanGain,
    state: KinematicFilterState,
}

impl VelocityEstimator {
    pub fn new(cfg: EstimatorConfig) -> Self {
        let gain = steady_state_gain(cfg.cycle_period_s, cfg.process_noise, cfg.measurement_noise);
        tracing::debug!(
            dt = cfg.cycle_period_s,
            k_v = gain.velocity,
            k_a = gain.acceleration,
            "velocity estimator gain solved"
        );
        Self {
            cfg,
            gain,
            state: KinematicFilterState::default(),
        }
    }

    /// Default tuning at a custom cycle period.
    pub fn with_period(cycle_period_s: f64) -> Self {
        Self::new(EstimatorConfig {
            cycle_period_s,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.cfg
    }

    pub fn gain(&self) -> KalmanGain {
        self.gain
    }

    pub fn state(&self) -> KinematicFilterState {
        self.state
    }

    pub fn reset(&mut self, velocity: f64) {
        self.state = KinematicFilterState {
            velocity,
            acceleration: 0.0,
        };
    }

    /// Feed one raw speed sample and return the updated estimate.
    pub fn update(&mut self, raw_speed: f64) -> KinematicFilterState {
        // Car may already be moving when the estimator starts.
        if (raw_speed - self.state.velocity).abs() > self.cfg.reset_threshold {
            tracing::debug!(
                raw_speed,
                estimate = self.state.velocity,
                "speed estimate diverged, resetting"
            );
            self.reset(raw_speed);
        }

        let dt = self.cfg.cycle_period_s;
        let v_pred = self.state.velocity + self.state.acceleration * dt;
        let a_pred = self.state.acceleration;
        let innovation = raw_speed - v_pred;

        self.state = KinematicFilterState {
            velocity: v_pred + self.gain.velocity * innovation,
            acceleration: a_pred + self.gain.acceleration * innovation,
        };
        self.state
    }
}

impl Default for VelocityEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}
