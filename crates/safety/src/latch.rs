//! Session-scoped hysteresis state.

use serde::Serialize;

use crate::events::{EventName, Events};

/// Driver must have left the wheel alone this long before a temporary fault is loud.
const LOUD_FAULT_UNPRESSED_S: f64 = 1.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SteeringFaultInput {
    pub steering_pressed: bool,
    pub temp_fault: bool,
    pub permanent_fault: bool,
    pub standstill: bool,
    pub previous_temp_fault: bool,
}

/// Chooses between no alert, the silent alert and the loud alert for EPS faults.
///
/// A temporary fault raised while the driver is overriding is expected (the EPS trips
/// on high driver torque), so it is suppressed for as long as the override continues.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SteeringFaultLatch {
    pub steering_unpressed_cycles: u32,
    pub no_steer_warning: bool,
    pub silent_steer_warning: bool,
    #[serde(skip)]
    loud_after_cycles: u32,
}

impl SteeringFaultLatch {
    pub fn new(cycle_period_s: f64) -> Self {
        Self {
            steering_unpressed_cycles: 0,
            no_steer_warning: false,
            // A fault already present at session start gets the soft alert.
            silent_steer_warning: true,
            loud_after_cycles: (LOUD_FAULT_UNPRESSED_S / cycle_period_s).floor() as u32,
        }
    }

    /// Unpressed cycles required before a temporary fault is reported loudly.
    pub fn loud_after_cycles(&self) -> u32 {
        self.loud_after_cycles
    }

    pub fn update(&mut self, input: SteeringFaultInput, events: &mut Events) {
        self.steering_unpressed_cycles = if input.steering_pressed {
            0
        } else {
            self.steering_unpressed_cycles.saturating_add(1)
        };

        if input.temp_fault {
            if input.steering_pressed && (!input.previous_temp_fault || self.no_steer_warning) {
                self.no_steer_warning = true;
            } else {
                self.no_steer_warning = false;

                // recent override: softer alert
                if self.silent_steer_warning
                    || input.standstill
                    || self.steering_unpressed_cycles < self.loud_after_cycles
                {
                    self.silent_steer_warning = true;
                    events.add(EventName::SteerTempUnavailableSilent);
                } else {
                    events.add(EventName::SteerTempUnavailable);
                }
            }
        } else {
            self.no_steer_warning = false;
            self.silent_steer_warning = false;
        }

        if input.permanent_fault {
            events.add(EventName::SteerUnavailable);
        }
    }
}

/// All mutable hysteresis state of one vehicle session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EngagementLatches {
    pub low_speed_alert: bool,
    pub steering: SteeringFaultLatch,
}

impl EngagementLatches {
    pub fn new(cycle_period_s: f64) -> Self {
        Self {
            low_speed_alert: false,
            steering: SteeringFaultLatch::new(cycle_period_s),
        }
    }

    pub fn steering_unpressed_cycles(&self) -> u32 {
        self.steering.steering_unpressed_cycles
    }

    pub fn no_steer_warning(&self) -> bool {
        self.steering.no_steer_warning
    }

    pub fn silent_steer_warning(&self) -> bool {
        self.steering.silent_steer_warning
    }
}
