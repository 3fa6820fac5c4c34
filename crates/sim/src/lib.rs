use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use estimator::{GpsFix, GpsSubscription, GpsTopic};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

#[derive(Clone, Copy, Debug)]
pub struct VehicleParams {
    /// Longitudinal acceleration limits, m/s².
    pub max_accel: f64,
    pub max_decel: f64,
    /// Coast-down drag: decel = k_drag * v².
    pub k_drag: f64,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            max_accel: 2.0,
            max_decel: 3.5,
            k_drag: 0.0004,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct VehicleMotion {
    /// True speed, m/s. Never negative.
    pub speed: f64,
    /// Commanded acceleration, m/s².
    pub accel_cmd: f64,
}

impl VehicleMotion {
    /// Euler step of a point-mass longitudinal model with quadratic drag.
    pub fn step(&mut self, p: &VehicleParams, dt_s: f64) {
        let cmd = self.accel_cmd.clamp(-p.max_decel, p.max_accel);
        let accel = cmd - p.k_drag * self.speed * self.speed;
        self.speed = (self.speed + accel * dt_s).max(0.0);
    }

    pub fn standstill(&self) -> bool {
        self.speed < 0.01
    }
}

#[derive(Clone, Copy, Debug)]
pub enum SensorFault {
    None,
    Stuck { value: f64 },
    Bias { value: f64 },
    /// Single-sample spike of `delta` on read `at_step`.
    Spike { at_step: u64, delta: f64 },
    DropoutEvery { n: u64 },
}

/// Wheel-speed sensor with Gaussian noise and injectable faults.
#[derive(Clone, Debug)]
pub struct SpeedSensor {
    pub noise_std: f64,
    pub fault: SensorFault,
    rng: StdRng,
    step_count: u64,
    last: f64,
}

impl SpeedSensor {
    pub fn new(seed: u64) -> Self {
        Self {
            noise_std: 0.05,
            fault: SensorFault::None,
            rng: StdRng::seed_from_u64(seed),
            step_count: 0,
            last: 0.0,
        }
    }

    /// Read the sensor. Dropouts repeat the previous reading, as a bus decoder would.
    pub fn read_speed(&mut self, true_speed: f64) -> f64 {
        self.step_count += 1;

        let mut v = match self.fault {
            SensorFault::None => true_speed,
            SensorFault::Stuck { value } => value,
            SensorFault::Bias { value } => true_speed + value,
            SensorFault::Spike { at_step, delta } => {
                if self.step_count == at_step {
                    true_speed + delta
                } else {
                    true_speed
                }
            }
            SensorFault::DropoutEvery { n } => {
                if n > 0 && (self.step_count % n) == 0 {
                    return self.last;
                }
                true_speed
            }
        };

        if self.noise_std > 0.0 {
            if let Ok(normal) = Normal::new(0.0, self.noise_std) {
                v += normal.sample(&mut self.rng);
            }
        }

        v = v.max(0.0);
        self.last = v;
        v
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct TopicState {
    updates: u64,
    latest: Option<GpsFix>,
    pending: Option<GpsFix>,
}

/// In-process stand-in for the two GPS topics.
///
/// `publish` queues a message; the subscriber only sees it after its next `poll`.
#[derive(Clone, Debug)]
pub struct SimGps {
    generic: TopicState,
    external: TopicState,
    noise_std: f64,
    rng: StdRng,
}

impl SimGps {
    pub fn new(seed: u64) -> Self {
        Self {
            generic: TopicState::default(),
            external: TopicState::default(),
            noise_std: 0.1,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_noise(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std;
        self
    }

    fn topic_mut(&mut self, topic: GpsTopic) -> &mut TopicState {
        match topic {
            GpsTopic::GpsLocation => &mut self.generic,
            GpsTopic::GpsLocationExternal => &mut self.external,
        }
    }

    fn topic(&self, topic: GpsTopic) -> &TopicState {
        match topic {
            GpsTopic::GpsLocation => &self.generic,
            GpsTopic::GpsLocationExternal => &self.external,
        }
    }

    /// Queue a fix measured from `true_speed` on `topic`.
    pub fn publish(&mut self, topic: GpsTopic, true_speed: f64) {
        let mut speed = true_speed;
        if self.noise_std > 0.0 {
            if let Ok(normal) = Normal::new(0.0, self.noise_std) {
                speed += normal.sample(&mut self.rng);
            }
        }
        self.topic_mut(topic).pending = Some(GpsFix {
            speed: speed.max(0.0),
            ..Default::default()
        });
    }
}

impl GpsSubscription for SimGps {
    fn poll(&mut self) {
        for t in [&mut self.generic, &mut self.external] {
            if let Some(fix) = t.pending.take() {
                t.latest = Some(fix);
                t.updates += 1;
            }
        }
    }

    fn update_count(&self, topic: GpsTopic) -> u64 {
        self.topic(topic).updates
    }

    fn latest(&self, topic: GpsTopic) -> Option<GpsFix> {
        self.topic(topic).latest
    }
}

/// A cheaply clonable handle so the simulation can publish while the engine owns the
/// subscription.
///
/// A poisoned lock is recovered: topic state is whole between calls.
#[derive(Clone, Debug)]
pub struct SharedGps(Arc<Mutex<SimGps>>);

impl SharedGps {
    pub fn new(gps: SimGps) -> Self {
        Self(Arc::new(Mutex::new(gps)))
    }

    fn lock(&self) -> MutexGuard<'_, SimGps> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, topic: GpsTopic, true_speed: f64) {
        self.lock().publish(topic, true_speed);
    }
}

impl GpsSubscription for SharedGps {
    fn poll(&mut self) {
        self.lock().poll();
    }

    fn update_count(&self, topic: GpsTopic) -> u64 {
        self.lock().update_count(topic)
    }

    fn latest(&self, topic: GpsTopic) -> Option<GpsFix> {
        self.lock().latest(topic)
    }
}
