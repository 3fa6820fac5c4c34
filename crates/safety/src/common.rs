//! Rules shared by every platform that is not silenced outright.

use crate::car_state::{ButtonType, GearShifter, VehicleState};
use crate::events::{EventName, Events};
use crate::latch::{SteeringFaultInput, SteeringFaultLatch};
use crate::profile::BrandProfile;

/// Highest set speed plus margin, converted from km/h.
pub const MAX_CTRL_SPEED: f64 = (145.0 + 4.0) / 3.6;

pub(crate) const DEFAULT_ENABLE_BUTTONS: &[ButtonType] =
    &[ButtonType::AccelCruise, ButtonType::DecelCruise];

/// Per-platform knobs of the common rule pass.
#[derive(Clone, Copy, Debug)]
pub struct CommonRuleArgs<'a> {
    /// Gears other than drive in which engagement is allowed.
    pub extra_gears: &'a [GearShifter],
    /// Emit pcmEnable/pcmDisable from the native cruise state.
    pub pcm_enable: bool,
    /// Platform veto over pcmEnable.
    pub allow_enable: bool,
    /// Buttons whose release engages when we own engagement.
    pub enable_buttons: &'a [ButtonType],
}

impl Default for CommonRuleArgs<'_> {
    fn default() -> Self {
        Self {
            extra_gears: &[],
            pcm_enable: true,
            allow_enable: true,
            enable_buttons: DEFAULT_ENABLE_BUTTONS,
        }
    }
}

pub struct CommonEventRules;

impl CommonEventRules {
    pub fn evaluate(
        profile: &BrandProfile,
        latch: &mut SteeringFaultLatch,
        cs: &VehicleState,
        cs_prev: &VehicleState,
        args: CommonRuleArgs<'_>,
    ) -> Events {
        let mut events = Events::new();

        if cs.door_open {
            events.add(EventName::DoorOpen);
        }
        if cs.seatbelt_unlatched {
            events.add(EventName::SeatbeltNotLatched);
        }
        if cs.gear_shifter != GearShifter::Drive && !args.extra_gears.contains(&cs.gear_shifter) {
            events.add(EventName::WrongGear);
        }
        if cs.gear_shifter == GearShifter::Reverse {
            events.add(EventName::ReverseGear);
        }
        if !cs.cruise_state.available {
            events.add(EventName::WrongCarMode);
        }
        if cs.esp_disabled {
            events.add(EventName::EspDisabled);
        }
        if cs.esp_active {
            events.add(EventName::EspActive);
        }
        if cs.stock_fcw {
            events.add(EventName::StockFcw);
        }
        if cs.stock_aeb {
            events.add(EventName::StockAeb);
        }
        if cs.v_ego > MAX_CTRL_SPEED {
            events.add(EventName::SpeedTooHigh);
        }
        if cs.cruise_state.non_adaptive {
            events.add(EventName::WrongCruiseMode);
        }
        if cs.brake_hold_active && profile.openpilot_longitudinal_control {
            events.add(EventName::BrakeHold);
        }
        if cs.parking_brake {
            events.add(EventName::ParkBrake);
        }
        if cs.acc_faulted {
            events.add(EventName::AccFaulted);
        }
        if cs.steering_pressed {
            events.add(EventName::SteerOverride);
        }
        if cs.brake_pressed && cs.standstill {
            events.add(EventName::PreEnableStandstill);
        }
        if cs.gas_pressed {
            events.add(EventName::GasPressedOverride);
        }
        if cs.vehicle_sensors_invalid {
            events.add(EventName::VehicleSensorsInvalid);
        }

        for b in &cs.button_events {
            // engage on release of an enable button
            if !profile.pcm_cruise && args.enable_buttons.contains(&b.kind) && !b.pressed {
                events.add(EventName::ButtonEnable);
            }
            // cancel disengages on either edge
            if b.kind == ButtonType::Cancel {
                events.add(EventName::ButtonCancel);
            }
        }

        latch.update(
            SteeringFaultInput {
                steering_pressed: cs.steering_pressed,
                temp_fault: cs.steer_fault_temporary,
                permanent_fault: cs.steer_fault_permanent,
                standstill: cs.standstill,
                previous_temp_fault: cs_prev.steer_fault_temporary,
            },
            &mut events,
        );

        if args.pcm_enable {
            let enabled = cs.cruise_state.enabled;
            let was_enabled = cs_prev.cruise_state.enabled;
            if enabled && !was_enabled && args.allow_enable {
                events.add(EventName::PcmEnable);
            } else if !enabled && was_enabled {
                events.add(EventName::PcmDisable);
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car_state::ButtonEvent;

    fn eval(
        profile: &BrandProfile,
        cs: &VehicleState,
        prev: &VehicleState,
        args: CommonRuleArgs<'_>,
    ) -> Events {
        let mut latch = SteeringFaultLatch::new(0.01);
        CommonEventRules::evaluate(profile, &mut latch, cs, prev, args)
    }

    #[test]
    fn healthy_car_raises_nothing() {
        let cs = VehicleState::ready(20.0);
        let ev = eval(&BrandProfile::new("subaru"), &cs, &cs, CommonRuleArgs::default());
        assert!(ev.is_empty(), "{ev:?}");
    }

    #[test]
    fn predicates_emit_in_fixed_order() {
        let cs = VehicleState {
            door_open: true,
            seatbelt_unlatched: true,
            gear_shifter: GearShifter::Reverse,
            esp_disabled: true,
            stock_aeb: true,
            v_ego: 45.0,
            parking_brake: true,
            gas_pressed: true,
            vehicle_sensors_invalid: true,
            ..Default::default()
        };
        let ev = eval(&BrandProfile::new("subaru"), &cs, &cs, CommonRuleArgs::default());
        assert_eq!(
            ev.names(),
            &[
                EventName::DoorOpen,
                EventName::SeatbeltNotLatched,
                EventName::WrongGear,
                EventName::ReverseGear,
                EventName::WrongCarMode,
                EventName::EspDisabled,
                EventName::StockAeb,
                EventName::SpeedTooHigh,
                EventName::ParkBrake,
                EventName::GasPressedOverride,
                EventName::VehicleSensorsInvalid,
            ]
        );
    }

    #[test]
    fn every_predicate_fires_in_fixed_order() {
        let cs = VehicleState {
            door_open: true,
            seatbelt_unlatched: true,
            gear_shifter: GearShifter::Reverse,
            esp_disabled: true,
            esp_active: true,
            stock_fcw: true,
            stock_aeb: true,
            v_ego: 45.0,
            brake_hold_active: true,
            parking_brake: true,
            acc_faulted: true,
            steering_pressed: true,
            brake_pressed: true,
            standstill: true,
            gas_pressed: true,
            vehicle_sensors_invalid: true,
            cruise_state: crate::car_state::CruiseState {
                non_adaptive: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let profile = BrandProfile {
            openpilot_longitudinal_control: true,
            ..BrandProfile::new("subaru")
        };
        let ev = eval(&profile, &cs, &cs, CommonRuleArgs::default());
        assert_eq!(
            ev.names(),
            &[
                EventName::DoorOpen,
                EventName::SeatbeltNotLatched,
                EventName::WrongGear,
                EventName::ReverseGear,
                EventName::WrongCarMode,
                EventName::EspDisabled,
                EventName::EspActive,
                EventName::StockFcw,
                EventName::StockAeb,
                EventName::SpeedTooHigh,
                EventName::WrongCruiseMode,
                EventName::BrakeHold,
                EventName::ParkBrake,
                EventName::AccFaulted,
                EventName::SteerOverride,
                EventName::PreEnableStandstill,
                EventName::GasPressedOverride,
                EventName::VehicleSensorsInvalid,
            ]
        );
    }

    #[test]
    fn steer_override_follows_steering_pressed() {
        let mut cs = VehicleState::ready(20.0);
        let profile = BrandProfile::new("toyota");
        let ev = eval(&profile, &cs, &cs, CommonRuleArgs::default());
        assert!(!ev.contains(EventName::SteerOverride));
        cs.steering_pressed = true;
        let ev = eval(&profile, &cs, &cs, CommonRuleArgs::default());
        assert_eq!(ev.names(), &[EventName::SteerOverride]);
    }

    #[test]
    fn extra_gears_are_accepted() {
        let cs = VehicleState {
            gear_shifter: GearShifter::Manumatic,
            ..VehicleState::ready(10.0)
        };
        let profile = BrandProfile::new("ford");
        assert!(eval(&profile, &cs, &cs, CommonRuleArgs::default()).contains(EventName::WrongGear));

        let args = CommonRuleArgs {
            extra_gears: &[GearShifter::Manumatic],
            ..Default::default()
        };
        assert!(!eval(&profile, &cs, &cs, args).contains(EventName::WrongGear));
    }

    #[test]
    fn brake_hold_needs_longitudinal_control() {
        let cs = VehicleState {
            brake_hold_active: true,
            ..VehicleState::ready(0.0)
        };
        let mut profile = BrandProfile::new("toyota");
        let ev = eval(&profile, &cs, &cs, CommonRuleArgs::default());
        assert!(!ev.contains(EventName::BrakeHold));
        profile.openpilot_longitudinal_control = true;
        let ev = eval(&profile, &cs, &cs, CommonRuleArgs::default());
        assert!(ev.contains(EventName::BrakeHold));
    }

    #[test]
    fn pre_enable_standstill_needs_brake_and_standstill() {
        let mut cs = VehicleState {
            brake_pressed: true,
            ..VehicleState::ready(0.0)
        };
        assert!(!eval(&BrandProfile::new("subaru"), &cs, &cs, CommonRuleArgs::default())
            .contains(EventName::PreEnableStandstill));
        cs.standstill = true;
        assert!(eval(&BrandProfile::new("subaru"), &cs, &cs, CommonRuleArgs::default())
            .contains(EventName::PreEnableStandstill));
    }

    #[test]
    fn enable_button_release_only_without_pcm_cruise() {
        let cs = VehicleState {
            button_events: vec![
                ButtonEvent::press(ButtonType::DecelCruise),
                ButtonEvent::release(ButtonType::DecelCruise),
                ButtonEvent::release(ButtonType::GapAdjustCruise),
            ],
            ..VehicleState::ready(20.0)
        };
        let mut profile = BrandProfile::new("honda");
        let ev = eval(&profile, &cs, &cs, CommonRuleArgs::default());
        assert!(!ev.contains(EventName::ButtonEnable));

        profile.pcm_cruise = false;
        let ev = eval(&profile, &cs, &cs, CommonRuleArgs::default());
        assert_eq!(ev.names(), &[EventName::ButtonEnable]);
    }

    #[test]
    fn cancel_fires_on_both_edges() {
        let cs = VehicleState {
            button_events: vec![
                ButtonEvent::press(ButtonType::Cancel),
                ButtonEvent::release(ButtonType::Cancel),
            ],
            ..VehicleState::ready(20.0)
        };
        let ev = eval(&BrandProfile::new("subaru"), &cs, &cs, CommonRuleArgs::default());
        assert_eq!(ev.names(), &[EventName::ButtonCancel, EventName::ButtonCancel]);
    }

    #[test]
    fn pcm_edges() {
        let off = VehicleState::ready(20.0);
        let mut on = off.clone();
        on.cruise_state.enabled = true;
        let profile = BrandProfile::new("subaru");

        let ev = eval(&profile, &on, &off, CommonRuleArgs::default());
        assert_eq!(ev.names(), &[EventName::PcmEnable]);

        let ev = eval(&profile, &off, &on, CommonRuleArgs::default());
        assert_eq!(ev.names(), &[EventName::PcmDisable]);

        // steady states raise nothing
        assert!(eval(&profile, &on, &on, CommonRuleArgs::default()).is_empty());
        assert!(eval(&profile, &off, &off, CommonRuleArgs::default()).is_empty());

        let vetoed = CommonRuleArgs {
            allow_enable: false,
            ..Default::default()
        };
        assert!(eval(&profile, &on, &off, vetoed).is_empty());

        let no_pcm = CommonRuleArgs {
            pcm_enable: false,
            ..Default::default()
        };
        assert!(eval(&profile, &off, &on, no_pcm).is_empty());
    }

    #[test]
    fn steering_fault_lands_after_buttons_and_before_pcm() {
        let prev = VehicleState::ready(20.0);
        let cs = VehicleState {
            steer_fault_permanent: true,
            button_events: vec![ButtonEvent::press(ButtonType::Cancel)],
            cruise_state: crate::car_state::CruiseState {
                enabled: true,
                available: true,
                ..Default::default()
            },
            ..VehicleState::ready(20.0)
        };
        let ev = eval(&BrandProfile::new("subaru"), &cs, &prev, CommonRuleArgs::default());
        assert_eq!(
            ev.names(),
            &[EventName::ButtonCancel, EventName::SteerUnavailable, EventName::PcmEnable]
        );
    }
}
