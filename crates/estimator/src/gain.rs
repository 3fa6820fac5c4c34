//! Steady-state gain for the constant-acceleration speed model.
//!
//! Model: `x = [v, a]`, `A = [[1, dt], [0, 1]]`, `C = [1, 0]`, process noise only on the
//! acceleration term (`Q = diag(0, q)`), scalar measurement noise `r`.

use serde::Serialize;

const MAX_ITERATIONS: usize = 10_000;
const CONVERGENCE_EPS: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct KalmanGain {
    /// Correction applied to the velocity estimate per unit innovation.
    pub velocity: f64,
    /// Correction applied to the acceleration estimate per unit innovation.
    pub acceleration: f64,
}

/// Symmetric 2x2 covariance, stored as its three distinct entries.
#[derive(Clone, Copy, Debug, Default)]
struct Covariance {
    p00: f64,
    p01: f64,
    p11: f64,
}

/// Solve for the steady-state gain by running the discrete Riccati recursion from
/// `P = 0` until the gain stops moving.
///
/// Runs once per estimator; the result is cached and never re-estimated online.
pub fn steady_state_gain(dt: f64, process_noise: f64, measurement_noise: f64) -> KalmanGain {
    let mut p = Covariance::default();
    let mut gain = KalmanGain {
        velocity: 0.0,
        acceleration: 0.0,
    };

    for _ in 0..MAX_ITERATIONS {
        // Predict: A P A^T + dt * Q
        let a00 = p.p00 + 2.0 * dt * p.p01 + dt * dt * p.p11;
        let a01 = p.p01 + dt * p.p11;
        let a11 = p.p11 + dt * process_noise;

        let s = a00 + measurement_noise;
        let next = KalmanGain {
            velocity: a00 / s,
            acceleration: a01 / s,
        };

        // (I - K C) P
        p = Covariance {
            p00: (1.0 - next.velocity) * a00,
            p01: (1.0 - next.velocity) * a01,
            p11: a11 - next.acceleration * a01,
        };

        let delta = (next.velocity - gain.velocity)
            .abs()
            .max((next.acceleration - gain.acceleration).abs());
        gain = next;
        if delta < CONVERGENCE_EPS {
            break;
        }
    }

    gain
}
