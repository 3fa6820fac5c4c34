//! Per-cycle snapshots consumed by the rule engine.
//!
//! Both are produced outside this crate (bus decoder, lateral/longitudinal controller)
//! and are read-only here, except for the smoothed speed the normaliser writes back.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GearShifter {
    #[default]
    Unknown,
    Park,
    Drive,
    Neutral,
    Reverse,
    Sport,
    Low,
    Brake,
    Eco,
    Manumatic,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ButtonType {
    #[default]
    Unknown,
    LeftBlinker,
    RightBlinker,
    AccelCruise,
    DecelCruise,
    Cancel,
    AltButton1,
    SetCruise,
    ResumeCruise,
    GapAdjustCruise,
}

/// One button transition this cycle. `pressed == false` is a release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub kind: ButtonType,
    pub pressed: bool,
}

impl ButtonEvent {
    pub fn press(kind: ButtonType) -> Self {
        Self {
            kind,
            pressed: true,
        }
    }

    pub fn release(kind: ButtonType) -> Self {
        Self {
            kind,
            pressed: false,
        }
    }
}

/// State of the vehicle's native cruise module (PCM).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CruiseState {
    pub enabled: bool,
    pub available: bool,
    pub standstill: bool,
    pub non_adaptive: bool,
}

/// Decoded signals only some platforms provide. Zero values mean "not reported".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSignals {
    /// Stock lane-keeping left on where it must be off.
    pub lkas_enabled: bool,
    /// Stock lane-keeping switched off where it must be on.
    pub lkas_disabled: bool,
    /// Low-speed alert computed by the platform's own decoder.
    pub low_speed_alert: bool,
    pub low_speed_lockout: bool,
    pub moving_backward: bool,
    /// Cruise buttons seen over the recent window, oldest first.
    pub recent_cruise_buttons: Vec<ButtonType>,
    /// Main-switch samples over the recent window.
    pub recent_main_buttons: Vec<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleState {
    /// Unfiltered wheel speed, m/s.
    pub v_ego_raw: f64,
    /// Smoothed speed, m/s. Filled in by the normaliser.
    pub v_ego: f64,
    /// Smoothed acceleration, m/s². Filled in by the normaliser.
    pub a_ego: f64,
    pub standstill: bool,

    pub gear_shifter: GearShifter,
    pub cruise_state: CruiseState,
    pub button_events: Vec<ButtonEvent>,

    pub steer_fault_temporary: bool,
    pub steer_fault_permanent: bool,
    pub esp_disabled: bool,
    pub esp_active: bool,
    pub stock_fcw: bool,
    pub stock_aeb: bool,
    pub vehicle_sensors_invalid: bool,

    pub door_open: bool,
    pub seatbelt_unlatched: bool,
    pub brake_pressed: bool,
    /// Brake pressure in platform units.
    pub brake: f64,
    pub brake_hold_active: bool,
    pub parking_brake: bool,
    pub acc_faulted: bool,
    pub steering_pressed: bool,
    pub gas_pressed: bool,

    pub platform: PlatformSignals,
}

impl VehicleState {
    /// A car in drive with cruise available and nothing wrong.
    pub fn ready(v_ego: f64) -> Self {
        Self {
            v_ego_raw: v_ego,
            v_ego,
            gear_shifter: GearShifter::Drive,
            cruise_state: CruiseState {
                available: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// What the controller commanded. The engine reads the current and the previous one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlOutput {
    pub enabled: bool,
    /// Longitudinal acceleration request, m/s².
    pub accel: f64,
    /// EPS continuous-steer timer is about to force a soft disable.
    pub eps_timer_soft_disable_alert: bool,
}
