use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use estimator::{EstimatorConfig, GpsTopic};
use safety::{
    BrandProfile, ButtonEvent, ButtonType, ControlOutput, CruiseState, Events, NetworkLocation,
    SafetyEventEngine, VehicleState,
};
use sim::{SensorFault, SharedGps, SimGps, SpeedSensor, VehicleMotion, VehicleParams};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Accelerate from rest, engage, cruise, cancel.
    Cruise,
    /// Cruise with a driver override, a temporary EPS fault, then a permanent one.
    SteerFault,
    /// Brake to a stop and hold on the brake.
    Standstill,
    /// Constant speed with a single large wheel-speed spike.
    SpeedJump,
    /// Simulated vehicle with GPS speed only (forces the `mock` platform).
    Gps,
}

#[derive(Parser, Debug)]
#[command(
    name = "engage-guard-sim",
    version,
    about = "Runs a simulated drive through the safety event engine and prints a JSONL trace"
)]
struct Args {
    #[arg(value_enum, long, default_value = "cruise")]
    scenario: Scenario,

    /// Platform car name (ignored when --profile is given)
    #[arg(long, default_value = "toyota")]
    platform: String,

    /// JSON file with a full vehicle profile
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Minimum engage speed, m/s
    #[arg(long)]
    min_enable_speed: Option<f64>,

    /// Minimum steer speed, m/s
    #[arg(long)]
    min_steer_speed: Option<f64>,

    /// We own longitudinal control instead of the stock ACC
    #[arg(long)]
    openpilot_long: bool,

    /// Simulated device has no external u-blox receiver (gps scenario)
    #[arg(long)]
    no_ublox: bool,

    /// Total simulation time in seconds
    #[arg(long, default_value_t = 30.0)]
    seconds: f64,

    /// Fixed time step in milliseconds
    #[arg(long, default_value_t = 10)]
    dt_ms: u64,

    /// RNG seed for deterministic runs
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Verbose logging (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(serde::Serialize)]
struct TraceRow {
    t_s: f64,
    true_speed: f64,
    raw_speed: f64,
    v_ego: f64,
    a_ego: f64,
    cruise_enabled: bool,
    events: Events,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("engage_guard_sim={level},safety={level},estimator={level}").into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_profile(args: &Args) -> Result<BrandProfile> {
    let mut profile = match &args.profile {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading profile {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing profile {}", path.display()))?
        }
        None => BrandProfile {
            openpilot_longitudinal_control: args.openpilot_long,
            pcm_cruise: !args.openpilot_long,
            network_location: NetworkLocation::FwdCamera,
            ..BrandProfile::new(args.platform.as_str())
        },
    };

    if let Some(v) = args.min_enable_speed {
        profile.min_enable_speed = v;
    }
    if let Some(v) = args.min_steer_speed {
        profile.min_steer_speed = v;
    }
    if args.scenario == Scenario::Gps && profile.car_name != "mock" {
        tracing::warn!(car = %profile.car_name, "gps scenario runs on the mock platform");
        profile.car_name = "mock".to_string();
    }
    Ok(profile)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let dt_s = (args.dt_ms as f64) / 1000.0;
    let steps = (args.seconds / dt_s).ceil() as u64;

    let profile = load_profile(&args)?;
    let estimator = EstimatorConfig {
        cycle_period_s: dt_s,
        ..Default::default()
    };

    let gps = SharedGps::new(SimGps::new(args.seed ^ 0x6B5));
    let gps_service = GpsTopic::preferred(!args.no_ublox);
    if args.scenario == Scenario::Gps {
        tracing::info!(service = gps_service.name(), "simulated GPS receiver");
    }
    let subscription = (args.scenario == Scenario::Gps)
        .then(|| Box::new(gps.clone()) as Box<dyn estimator::GpsSubscription + Send>);
    let mut engine = SafetyEventEngine::with_config(profile, estimator, subscription)
        .context("building safety event engine")?;

    // Vehicle & sensor
    let p = VehicleParams::default();
    let mut x = VehicleMotion::default();
    let mut sensor = SpeedSensor::new(args.seed ^ 0xA1);
    apply_scenario(args.scenario, &mut x, &mut sensor);

    let mut cs_prev = VehicleState::ready(x.speed);
    let mut cc_prev = ControlOutput::default();

    // Output JSONL trace to stdout (one object per line)
    for k in 0..steps {
        let t_s = (k as f64) * dt_s;
        let frac = (k as f64) / (steps as f64);

        let mut cs = drive(args.scenario, k, steps, &cs_prev, &p, &mut x);
        cs.v_ego_raw = sensor.read_speed(x.speed);
        if args.scenario == Scenario::Gps {
            gps.publish(GpsTopic::GpsLocation, x.speed);
            // external receiver comes up late, once it has a fix
            if gps_service == GpsTopic::GpsLocationExternal && frac > 0.3 {
                gps.publish(GpsTopic::GpsLocationExternal, x.speed);
            }
        }
        engine.normalize(&mut cs);

        let cc = ControlOutput {
            enabled: cs.cruise_state.enabled,
            accel: x.accel_cmd,
            ..Default::default()
        };
        let events = engine.update(&cs, &cs_prev, &cc, &cc_prev);

        x.step(&p, dt_s);

        let row = TraceRow {
            t_s,
            true_speed: x.speed,
            raw_speed: cs.v_ego_raw,
            v_ego: cs.v_ego,
            a_ego: cs.a_ego,
            cruise_enabled: cs.cruise_state.enabled,
            events,
        };
        println!("{}", serde_json::to_string(&row)?);

        cs_prev = cs;
        cc_prev = cc;
    }

    Ok(())
}

fn apply_scenario(s: Scenario, x: &mut VehicleMotion, sensor: &mut SpeedSensor) {
    match s {
        Scenario::Cruise => {
            x.speed = 0.0;
        }
        Scenario::SteerFault | Scenario::Gps => {
            x.speed = 20.0;
        }
        Scenario::Standstill => {
            x.speed = 12.0;
        }
        Scenario::SpeedJump => {
            x.speed = 15.0;
            sensor.fault = SensorFault::Spike {
                at_step: 200,
                delta: 4.0,
            };
        }
    }
}

/// Build the decoded snapshot for this cycle and set the commanded acceleration.
fn drive(
    s: Scenario,
    k: u64,
    steps: u64,
    prev: &VehicleState,
    p: &VehicleParams,
    x: &mut VehicleMotion,
) -> VehicleState {
    let frac = (k as f64) / (steps as f64);
    let mut cs = VehicleState::ready(x.speed);
    cs.standstill = x.standstill();
    cs.cruise_state = CruiseState {
        enabled: prev.cruise_state.enabled,
        available: true,
        ..Default::default()
    };
    // hold speed against drag unless the scenario says otherwise
    x.accel_cmd = p.k_drag * x.speed * x.speed;

    match s {
        Scenario::Cruise => {
            if frac < 0.3 {
                x.accel_cmd = 1.5;
            }
            let set_at = steps / 10;
            if k == set_at {
                cs.button_events.push(ButtonEvent::press(ButtonType::SetCruise));
            } else if k == set_at + 1 {
                cs.button_events.push(ButtonEvent::release(ButtonType::SetCruise));
                cs.cruise_state.enabled = true;
            }
            if k == steps * 7 / 10 {
                cs.button_events.push(ButtonEvent::press(ButtonType::Cancel));
                cs.cruise_state.enabled = false;
            }
        }
        Scenario::SteerFault => {
            cs.cruise_state.enabled = frac > 0.05;
            cs.steering_pressed = (0.25..0.28).contains(&frac);
            cs.steer_fault_temporary = (0.27..0.5).contains(&frac);
            cs.steer_fault_permanent = frac > 0.8;
        }
        Scenario::Standstill => {
            cs.cruise_state.enabled = frac < 0.5;
            if x.standstill() {
                x.accel_cmd = 0.0;
                cs.brake_pressed = true;
                cs.brake = 25.0;
                cs.cruise_state.standstill = cs.cruise_state.enabled;
            } else {
                x.accel_cmd = -2.0;
            }
        }
        Scenario::SpeedJump | Scenario::Gps => {
            cs.cruise_state.enabled = frac > 0.05;
        }
    }
    cs
}
