//! Per-platform rule composition.
//!
//! Each [`Platform`] resolves once to a [`RuleSet`]: the arguments of the common pass
//! plus an ordered list of extra rules that run after it. `body` and `mock` resolve to
//! no rules at all and always produce an empty event list.

use crate::car_state::{ButtonType, ControlOutput, GearShifter, VehicleState};
use crate::common::{CommonEventRules, CommonRuleArgs, DEFAULT_ENABLE_BUTTONS};
use crate::error::ConfigError;
use crate::events::{EventName, Events};
use crate::latch::EngagementLatches;
use crate::profile::{BrandProfile, NetworkLocation, Platform};

/// Everything an extra rule may look at, plus the latches and the events so far.
pub struct RuleContext<'a> {
    pub profile: &'a BrandProfile,
    pub cs: &'a VehicleState,
    pub cs_prev: &'a VehicleState,
    pub cc: &'a ControlOutput,
    pub cc_prev: &'a ControlOutput,
    pub latches: &'a mut EngagementLatches,
    pub events: &'a mut Events,
}

pub type ExtraRule = fn(&mut RuleContext<'_>);

#[derive(Clone, Copy)]
pub struct RuleSet {
    pub extra_gears: &'static [GearShifter],
    pub enable_buttons: &'static [ButtonType],
    pub pcm_enable: fn(&BrandProfile) -> bool,
    pub allow_enable: fn(&VehicleState) -> bool,
    pub extra_rules: &'static [ExtraRule],
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("extra_gears", &self.extra_gears)
            .field("enable_buttons", &self.enable_buttons)
            .field("extra_rules", &self.extra_rules.len())
            .finish()
    }
}

/// Raw buttons that count as a driver request to engage on hyundai.
const HYUNDAI_ENABLE_BUTTONS: &[ButtonType] =
    &[ButtonType::AccelCruise, ButtonType::DecelCruise, ButtonType::Cancel];

/// Newer VW racks fault below this speed anyway, so no low-speed alert for them.
const VW_DEFAULT_MIN_STEER_SPEED: f64 = 0.4;

/// Brake pressure that lets GM engage from a stop.
const GM_STANDSTILL_BRAKE_MIN: f64 = 20.0;

const STOPPED_SPEED: f64 = 0.001;

fn always(_: &BrandProfile) -> bool {
    true
}

fn never(_: &BrandProfile) -> bool {
    false
}

fn follows_pcm_cruise(cp: &BrandProfile) -> bool {
    cp.pcm_cruise
}

fn without_openpilot_long(cp: &BrandProfile) -> bool {
    !cp.openpilot_longitudinal_control
}

fn any_state(_: &VehicleState) -> bool {
    true
}

impl Platform {
    /// Rule composition for this platform, or `None` when it raises nothing.
    pub fn rule_set(self) -> Option<RuleSet> {
        let base = RuleSet {
            extra_gears: &[],
            enable_buttons: DEFAULT_ENABLE_BUTTONS,
            pcm_enable: always,
            allow_enable: any_state,
            extra_rules: &[],
        };

        let set = match self {
            Platform::Body | Platform::Mock => return None,
            Platform::Subaru => base,
            Platform::Ford => RuleSet {
                extra_gears: &[GearShifter::Manumatic],
                ..base
            },
            Platform::Nissan => RuleSet {
                extra_gears: &[GearShifter::Brake],
                extra_rules: NISSAN_RULES,
                ..base
            },
            Platform::Mazda => RuleSet {
                extra_rules: MAZDA_RULES,
                ..base
            },
            Platform::Chrysler => RuleSet {
                extra_gears: &[GearShifter::Low],
                extra_rules: CHRYSLER_RULES,
                ..base
            },
            Platform::Honda => RuleSet {
                pcm_enable: never,
                extra_rules: HONDA_RULES,
                ..base
            },
            Platform::Toyota => RuleSet {
                extra_rules: TOYOTA_RULES,
                ..base
            },
            // The ECM allows enabling on falling edge of set, but only rising edge of resume.
            Platform::Gm => RuleSet {
                extra_gears: &[
                    GearShifter::Sport,
                    GearShifter::Low,
                    GearShifter::Eco,
                    GearShifter::Manumatic,
                ],
                enable_buttons: &[ButtonType::DecelCruise],
                pcm_enable: follows_pcm_cruise,
                extra_rules: GM_RULES,
                ..base
            },
            Platform::Volkswagen => RuleSet {
                extra_gears: &[GearShifter::Eco, GearShifter::Sport, GearShifter::Manumatic],
                enable_buttons: &[ButtonType::SetCruise, ButtonType::ResumeCruise],
                pcm_enable: without_openpilot_long,
                extra_rules: VOLKSWAGEN_RULES,
                ..base
            },
            Platform::Hyundai => RuleSet {
                pcm_enable: follows_pcm_cruise,
                allow_enable: hyundai_driver_requested,
                extra_rules: HYUNDAI_RULES,
                ..base
            },
        };
        Some(set)
    }
}

/// Set/clear hysteresis on the low-speed steer alert. Set wins if both hold.
fn low_speed_hysteresis(ctx: &mut RuleContext<'_>, set: bool, clear: bool) {
    if set {
        ctx.latches.low_speed_alert = true;
    } else if clear {
        ctx.latches.low_speed_alert = false;
    }
    if ctx.latches.low_speed_alert {
        ctx.events.add(EventName::BelowSteerSpeed);
    }
}

// nissan

const NISSAN_RULES: &[ExtraRule] = &[nissan_lkas_setting];

fn nissan_lkas_setting(ctx: &mut RuleContext<'_>) {
    if ctx.cs.platform.lkas_enabled {
        ctx.events.add(EventName::InvalidLkasSetting);
    }
}

// mazda

const MAZDA_RULES: &[ExtraRule] = &[mazda_lkas];

fn mazda_lkas(ctx: &mut RuleContext<'_>) {
    if ctx.cs.platform.lkas_disabled {
        ctx.events.add(EventName::LkasDisabled);
    } else if ctx.cs.platform.low_speed_alert {
        ctx.events.add(EventName::BelowSteerSpeed);
    }
}

// chrysler

const CHRYSLER_RULES: &[ExtraRule] = &[chrysler_low_speed];

fn chrysler_low_speed(ctx: &mut RuleContext<'_>) {
    let min_steer = ctx.profile.min_steer_speed;
    let v = ctx.cs.v_ego;
    low_speed_hysteresis(ctx, min_steer > 0.0 && v < min_steer + 0.5, v > min_steer + 1.0);
}

// honda

const HONDA_RULES: &[ExtraRule] = &[honda_below_engage, honda_pcm_engagement, honda_manual_restart];

fn honda_below_engage(ctx: &mut RuleContext<'_>) {
    if ctx.profile.pcm_cruise && ctx.cs.v_ego < ctx.profile.min_enable_speed {
        ctx.events.add(EventName::BelowEngageSpeed);
    }
}

fn honda_pcm_engagement(ctx: &mut RuleContext<'_>) {
    let cp = ctx.profile;
    if !cp.pcm_cruise {
        return;
    }
    let enabled = ctx.cs.cruise_state.enabled;
    if enabled && !ctx.cs_prev.cruise_state.enabled {
        ctx.events.add(EventName::PcmEnable);
    } else if !enabled && (ctx.cc_prev.accel >= 0.0 || !cp.openpilot_longitudinal_control) {
        // Cruise can drop while we are still braking; below the stock cutoff that is expected.
        if ctx.cs.v_ego < cp.min_enable_speed + 2.0 {
            ctx.events.add(EventName::SpeedTooLow);
        } else {
            ctx.events.add(EventName::CruiseDisabled);
        }
    }
}

fn honda_manual_restart(ctx: &mut RuleContext<'_>) {
    if ctx.profile.min_enable_speed > 0.0 && ctx.cs.v_ego < STOPPED_SPEED {
        ctx.events.add(EventName::ManualRestart);
    }
}

// toyota

const TOYOTA_RULES: &[ExtraRule] = &[toyota_longitudinal];

fn toyota_longitudinal(ctx: &mut RuleContext<'_>) {
    if !ctx.profile.openpilot_longitudinal_control {
        return;
    }
    let cs = ctx.cs;
    if cs.cruise_state.standstill && !cs.brake_pressed {
        ctx.events.add(EventName::ResumeRequired);
    }
    if cs.platform.low_speed_lockout {
        ctx.events.add(EventName::LowSpeedLockout);
    }
    if cs.v_ego < ctx.profile.min_enable_speed {
        ctx.events.add(EventName::BelowEngageSpeed);
        // margin so a stop in progress does not read as a cancel
        if ctx.cc_prev.accel > 0.3 {
            ctx.events.add(EventName::SpeedTooLow);
        }
        if cs.v_ego < STOPPED_SPEED {
            ctx.events.add(EventName::ManualRestart);
        }
    }
}

// gm

const GM_RULES: &[ExtraRule] = &[
    gm_accel_enable,
    gm_below_engage,
    gm_resume_required,
    gm_below_steer,
];

fn gm_accel_enable(ctx: &mut RuleContext<'_>) {
    if ctx.profile.pcm_cruise {
        return;
    }
    let resume_pressed = ctx
        .cs
        .button_events
        .iter()
        .any(|b| b.kind == ButtonType::AccelCruise && b.pressed);
    if resume_pressed {
        ctx.events.add(EventName::ButtonEnable);
    }
}

fn gm_below_engage(ctx: &mut RuleContext<'_>) {
    let cs = ctx.cs;
    let below_min_enable = cs.v_ego < ctx.profile.min_enable_speed || cs.platform.moving_backward;
    let braked_at_standstill = cs.standstill
        && cs.brake >= GM_STANDSTILL_BRAKE_MIN
        && ctx.profile.network_location == NetworkLocation::FwdCamera;
    if below_min_enable && !braked_at_standstill {
        ctx.events.add(EventName::BelowEngageSpeed);
    }
}

fn gm_resume_required(ctx: &mut RuleContext<'_>) {
    if ctx.cs.cruise_state.standstill {
        ctx.events.add(EventName::ResumeRequired);
    }
}

fn gm_below_steer(ctx: &mut RuleContext<'_>) {
    if ctx.cs.v_ego < ctx.profile.min_steer_speed {
        ctx.events.add(EventName::BelowSteerSpeed);
    }
}

// volkswagen

const VOLKSWAGEN_RULES: &[ExtraRule] = &[vw_low_speed, vw_longitudinal, vw_steer_time_limit];

fn vw_low_speed(ctx: &mut RuleContext<'_>) {
    let min_steer = ctx.profile.min_steer_speed;
    let v = ctx.cs.v_ego;
    low_speed_hysteresis(
        ctx,
        (min_steer - 1e-3) > VW_DEFAULT_MIN_STEER_SPEED && v < min_steer + 1.0,
        v > min_steer + 2.0,
    );
}

fn vw_longitudinal(ctx: &mut RuleContext<'_>) {
    let cp = ctx.profile;
    if !cp.openpilot_longitudinal_control {
        return;
    }
    if ctx.cs.v_ego < cp.min_enable_speed + 0.5 {
        ctx.events.add(EventName::BelowEngageSpeed);
    }
    if ctx.cc_prev.enabled && ctx.cs.v_ego < cp.min_enable_speed {
        ctx.events.add(EventName::SpeedTooLow);
    }
}

fn vw_steer_time_limit(ctx: &mut RuleContext<'_>) {
    if ctx.cc.eps_timer_soft_disable_alert {
        ctx.events.add(EventName::SteerTimeLimit);
    }
}

// hyundai

const HYUNDAI_RULES: &[ExtraRule] = &[hyundai_low_speed];

/// CANCEL doubles as pause/resume on newer cars, so only engage on an actual driver press.
fn hyundai_driver_requested(cs: &VehicleState) -> bool {
    let signals = &cs.platform;
    signals
        .recent_cruise_buttons
        .iter()
        .any(|b| HYUNDAI_ENABLE_BUTTONS.contains(b))
        || signals.recent_main_buttons.iter().any(|&pressed| pressed)
}

// only for cars with steer cut off above 10 m/s
fn hyundai_low_speed(ctx: &mut RuleContext<'_>) {
    let min_steer = ctx.profile.min_steer_speed;
    let v = ctx.cs.v_ego;
    low_speed_hysteresis(ctx, v < min_steer + 2.0 && min_steer > 10.0, v > min_steer + 4.0);
}

/// Resolved platform plus its profile. Built once per session.
#[derive(Clone, Debug)]
pub struct BrandRuleTable {
    platform: Platform,
    profile: BrandProfile,
    rules: Option<RuleSet>,
}

impl BrandRuleTable {
    pub fn new(profile: BrandProfile) -> Result<Self, ConfigError> {
        profile.validate()?;
        let platform: Platform = profile.car_name.parse()?;
        let rules = platform.rule_set();
        tracing::debug!(%platform, ?rules, "resolved platform rule set");
        Ok(Self {
            platform,
            profile,
            rules,
        })
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn profile(&self) -> &BrandProfile {
        &self.profile
    }

    pub fn evaluate(
        &self,
        latches: &mut EngagementLatches,
        cs: &VehicleState,
        cs_prev: &VehicleState,
        cc: &ControlOutput,
        cc_prev: &ControlOutput,
    ) -> Events {
        let Some(rules) = &self.rules else {
            return Events::new();
        };

        let args = CommonRuleArgs {
            extra_gears: rules.extra_gears,
            pcm_enable: (rules.pcm_enable)(&self.profile),
            allow_enable: (rules.allow_enable)(cs),
            enable_buttons: rules.enable_buttons,
        };
        let mut events =
            CommonEventRules::evaluate(&self.profile, &mut latches.steering, cs, cs_prev, args);

        let mut ctx = RuleContext {
            profile: &self.profile,
            cs,
            cs_prev,
            cc,
            cc_prev,
            latches,
            events: &mut events,
        };
        for rule in rules.extra_rules {
            rule(&mut ctx);
        }
        events
    }
}
