use engage_guard as eg;

fn no_control() -> eg::ControlOutput {
    eg::ControlOutput::default()
}

#[test]
fn small_speed_step_converges_without_reset() {
    let mut engine = eg::SafetyEventEngine::new(eg::BrandProfile::new("toyota")).unwrap();
    let mut sensor = eg::SpeedSensor::new(11);
    sensor.noise_std = 0.0;

    let mut cs = eg::VehicleState::ready(0.0);
    cs.v_ego_raw = sensor.read_speed(10.0);
    engine.normalize(&mut cs);
    assert_eq!(cs.v_ego, 10.0);

    // +1.5 m/s stays under the reset threshold
    cs.v_ego_raw = sensor.read_speed(11.5);
    engine.normalize(&mut cs);
    let first = cs.v_ego;
    assert!(first > 10.0 && first < 11.5, "expected a filtered step, got {first}");

    for _ in 0..600 {
        cs.v_ego_raw = sensor.read_speed(11.5);
        engine.normalize(&mut cs);
    }
    assert!((cs.v_ego - 11.5).abs() < 1e-3, "did not converge: {}", cs.v_ego);
}

#[test]
fn speed_spike_forces_reset() {
    let mut est = eg::VelocityEstimator::default();
    let mut sensor = eg::SpeedSensor::new(5);
    sensor.noise_std = 0.0;
    sensor.fault = eg::SensorFault::Spike {
        at_step: 50,
        delta: 3.0,
    };

    let mut out = est.state();
    for _ in 0..49 {
        out = est.update(sensor.read_speed(15.0));
    }
    assert!((out.velocity - 15.0).abs() < 1e-9);

    let raw = sensor.read_speed(15.0);
    assert_eq!(raw, 18.0);
    let out = est.update(raw);
    assert_eq!(out.velocity, 18.0);
    assert_eq!(out.acceleration, 0.0);
}

#[test]
fn gps_bypass_prefers_external_after_two_updates() {
    let gps = eg::SharedGps::new(eg::SimGps::new(9).with_noise(0.0));
    let mut engine =
        eg::SafetyEventEngine::with_gps(eg::BrandProfile::new("mock"), Box::new(gps.clone()))
            .unwrap();

    let mut cs = eg::VehicleState::default();
    let mut speeds = Vec::new();
    for k in 0..8 {
        gps.publish(eg::GpsTopic::GpsLocation, 10.0);
        if k >= 4 {
            gps.publish(eg::GpsTopic::GpsLocationExternal, 10.4);
        }
        engine.normalize(&mut cs);
        assert_eq!(cs.v_ego, cs.v_ego_raw);
        speeds.push(cs.v_ego);
    }
    assert_eq!(speeds, vec![10.0, 10.0, 10.0, 10.0, 10.0, 10.4, 10.4, 10.4]);

    // mock never raises events
    let events = engine.update(&cs, &cs, &no_control(), &no_control());
    assert!(events.is_empty());
}

#[test]
fn pcm_cruise_below_min_enable_speed() {
    let profile = eg::BrandProfile {
        min_enable_speed: 2.0,
        pcm_cruise: true,
        ..eg::BrandProfile::new("honda")
    };
    let mut engine = eg::SafetyEventEngine::new(profile).unwrap();
    let cs = eg::VehicleState::ready(1.0);
    let events = engine.update(&cs, &cs, &no_control(), &no_control());
    assert!(events.contains(eg::EventName::BelowEngageSpeed), "{events:?}");
}

#[test]
fn long_hands_off_temp_fault_is_loud() {
    let mut engine = eg::SafetyEventEngine::new(eg::BrandProfile::new("subaru")).unwrap();
    let cc = no_control();

    let clean = eg::VehicleState::ready(20.0);
    for _ in 0..200 {
        engine.update(&clean, &clean, &cc, &cc);
    }
    assert!(!engine.latches().silent_steer_warning());

    let faulted = eg::VehicleState {
        steer_fault_temporary: true,
        ..clean.clone()
    };
    let mut prev = clean;
    for _ in 0..150 {
        let events = engine.update(&faulted, &prev, &cc, &cc);
        assert!(events.contains(eg::EventName::SteerTempUnavailable), "{events:?}");
        assert!(!events.contains(eg::EventName::SteerTempUnavailableSilent));
        prev = faulted.clone();
    }
}

#[test]
fn gm_engages_braked_at_standstill_on_camera_harness() {
    let profile = eg::BrandProfile {
        min_enable_speed: 3.0,
        network_location: eg::NetworkLocation::FwdCamera,
        ..eg::BrandProfile::new("gm")
    };
    let mut engine = eg::SafetyEventEngine::new(profile).unwrap();
    let cs = eg::VehicleState {
        standstill: true,
        brake: 25.0,
        ..eg::VehicleState::ready(0.0)
    };
    let events = engine.update(&cs, &cs, &no_control(), &no_control());
    assert!(!events.contains(eg::EventName::BelowEngageSpeed), "{events:?}");
}

#[test]
fn unknown_platform_rejected_before_any_cycle() {
    let err = eg::SafetyEventEngine::new(eg::BrandProfile::new("tesla")).unwrap_err();
    assert!(matches!(err, eg::ConfigError::UnsupportedPlatform(ref name) if name == "tesla"));
}

#[test]
fn repeated_snapshot_does_not_retrigger_edges() {
    for car in ["subaru", "toyota", "gm", "volkswagen", "hyundai", "honda", "chrysler"] {
        let mut engine = eg::SafetyEventEngine::new(eg::BrandProfile::new(car)).unwrap();
        let mut cs = eg::VehicleState::ready(12.0);
        cs.cruise_state.enabled = true;
        cs.seatbelt_unlatched = true;
        let cc = no_control();

        let a = engine.update(&cs, &cs, &cc, &cc);
        let b = engine.update(&cs, &cs, &cc, &cc);
        assert_eq!(a, b, "{car}");
        assert!(!a.contains(eg::EventName::PcmEnable), "{car}");
        assert!(a.contains(eg::EventName::SeatbeltNotLatched), "{car}");
    }
}

#[test]
fn simulated_drive_engages_once_and_cancels() {
    let p = eg::VehicleParams::default();
    let mut x = eg::VehicleMotion::default();
    let mut sensor = eg::SpeedSensor::new(42);
    let mut engine = eg::SafetyEventEngine::new(eg::BrandProfile::new("toyota")).unwrap();

    let mut cs_prev = eg::VehicleState::ready(0.0);
    let cc = no_control();
    let mut enables = 0;
    let mut disables = 0;
    let mut cancels = 0;

    for k in 0..2000u32 {
        x.accel_cmd = if k < 800 { 1.5 } else { p.k_drag * x.speed * x.speed };

        let mut cs = eg::VehicleState::ready(x.speed);
        cs.cruise_state.enabled = (300..1500).contains(&k);
        if k == 1500 {
            cs.button_events.push(eg::ButtonEvent::press(eg::ButtonType::Cancel));
        }
        cs.v_ego_raw = sensor.read_speed(x.speed);
        engine.normalize(&mut cs);

        let events = engine.update(&cs, &cs_prev, &cc, &cc);
        enables += events.iter().filter(|&e| e == eg::EventName::PcmEnable).count();
        disables += events.iter().filter(|&e| e == eg::EventName::PcmDisable).count();
        cancels += events.iter().filter(|&e| e == eg::EventName::ButtonCancel).count();
        assert!(!events.contains(eg::EventName::SpeedTooHigh));

        x.step(&p, 0.01);
        cs_prev = cs;
    }

    assert_eq!(enables, 1);
    assert_eq!(disables, 1);
    assert_eq!(cancels, 1);
}
