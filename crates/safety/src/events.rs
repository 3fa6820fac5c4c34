use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventName {
    DoorOpen,
    SeatbeltNotLatched,
    WrongGear,
    ReverseGear,
    WrongCarMode,
    EspDisabled,
    EspActive,
    StockFcw,
    StockAeb,
    SpeedTooHigh,
    WrongCruiseMode,
    BrakeHold,
    ParkBrake,
    AccFaulted,
    SteerOverride,
    PreEnableStandstill,
    GasPressedOverride,
    VehicleSensorsInvalid,
    ButtonEnable,
    ButtonCancel,
    SteerTempUnavailable,
    SteerTempUnavailableSilent,
    SteerUnavailable,
    PcmEnable,
    PcmDisable,
    InvalidLkasSetting,
    LkasDisabled,
    BelowSteerSpeed,
    BelowEngageSpeed,
    SpeedTooLow,
    CruiseDisabled,
    ManualRestart,
    ResumeRequired,
    LowSpeedLockout,
    SteerTimeLimit,
}

impl EventName {
    pub fn as_str(self) -> &'static str {
        match self {
            EventName::DoorOpen => "doorOpen",
            EventName::SeatbeltNotLatched => "seatbeltNotLatched",
            EventName::WrongGear => "wrongGear",
            EventName::ReverseGear => "reverseGear",
            EventName::WrongCarMode => "wrongCarMode",
            EventName::EspDisabled => "espDisabled",
            EventName::EspActive => "espActive",
            EventName::StockFcw => "stockFcw",
            EventName::StockAeb => "stockAeb",
            EventName::SpeedTooHigh => "speedTooHigh",
            EventName::WrongCruiseMode => "wrongCruiseMode",
            EventName::BrakeHold => "brakeHold",
            EventName::ParkBrake => "parkBrake",
            EventName::AccFaulted => "accFaulted",
            EventName::SteerOverride => "steerOverride",
            EventName::PreEnableStandstill => "preEnableStandstill",
            EventName::GasPressedOverride => "gasPressedOverride",
            EventName::VehicleSensorsInvalid => "vehicleSensorsInvalid",
            EventName::ButtonEnable => "buttonEnable",
            EventName::ButtonCancel => "buttonCancel",
            EventName::SteerTempUnavailable => "steerTempUnavailable",
            EventName::SteerTempUnavailableSilent => "steerTempUnavailableSilent",
            EventName::SteerUnavailable => "steerUnavailable",
            EventName::PcmEnable => "pcmEnable",
            EventName::PcmDisable => "pcmDisable",
            EventName::InvalidLkasSetting => "invalidLkasSetting",
            EventName::LkasDisabled => "lkasDisabled",
            EventName::BelowSteerSpeed => "belowSteerSpeed",
            EventName::BelowEngageSpeed => "belowEngageSpeed",
            EventName::SpeedTooLow => "speedTooLow",
            EventName::CruiseDisabled => "cruiseDisabled",
            EventName::ManualRestart => "manualRestart",
            EventName::ResumeRequired => "resumeRequired",
            EventName::LowSpeedLockout => "lowSpeedLockout",
            EventName::SteerTimeLimit => "steerTimeLimit",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events raised in one cycle, in emission order.
///
/// Append-only. Duplicates are kept; consumers that only test membership use
/// [`Events::contains`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Events {
    names: Vec<EventName>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: EventName) {
        self.names.push(name);
    }

    pub fn contains(&self, name: EventName) -> bool {
        self.names.contains(&name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EventName> + '_ {
        self.names.iter().copied()
    }

    pub fn names(&self) -> &[EventName] {
        &self.names
    }
}

impl<'a> IntoIterator for &'a Events {
    type Item = &'a EventName;
    type IntoIter = std::slice::Iter<'a, EventName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_order_and_duplicates() {
        let mut ev = Events::new();
        ev.add(EventName::PcmDisable);
        ev.add(EventName::DoorOpen);
        ev.add(EventName::PcmDisable);
        assert_eq!(
            ev.names(),
            &[EventName::PcmDisable, EventName::DoorOpen, EventName::PcmDisable]
        );
        assert_eq!(ev.len(), 3);
        assert!(ev.contains(EventName::DoorOpen));
        assert!(!ev.contains(EventName::ButtonEnable));
    }

    #[test]
    fn serializes_as_camel_case_list() {
        let mut ev = Events::new();
        ev.add(EventName::SteerTempUnavailableSilent);
        ev.add(EventName::SeatbeltNotLatched);
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(json, r#"["steerTempUnavailableSilent","seatbeltNotLatched"]"#);
    }

    #[test]
    fn display_matches_wire_name() {
        for name in [
            EventName::StockAeb,
            EventName::PreEnableStandstill,
            EventName::SteerTimeLimit,
        ] {
            let json = serde_json::to_string(&name).unwrap();
            assert_eq!(json, format!("\"{name}\""));
        }
    }
}
