//! Per-cycle safety event evaluation.
//!
//! Given the current and previous vehicle snapshots and control outputs, a
//! [`SafetyEventEngine`] emits the ordered list of events downstream arbitration uses to
//! allow, refuse or drop engagement. Platform behaviour is resolved once per session
//! from a [`BrandProfile`].

pub mod brand;
pub mod car_state;
pub mod common;
pub mod engine;
pub mod error;
pub mod events;
pub mod latch;
pub mod normalize;
pub mod profile;

pub use brand::{BrandRuleTable, RuleContext, RuleSet};
pub use car_state::{
    ButtonEvent, ButtonType, ControlOutput, CruiseState, GearShifter, PlatformSignals, VehicleState,
};
pub use common::{CommonEventRules, CommonRuleArgs, MAX_CTRL_SPEED};
pub use engine::SafetyEventEngine;
pub use error::ConfigError;
pub use events::{EventName, Events};
pub use latch::{EngagementLatches, SteeringFaultInput, SteeringFaultLatch};
pub use normalize::StateNormalizer;
pub use profile::{BrandProfile, NetworkLocation, Platform};
