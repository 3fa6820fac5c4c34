//! GPS speed source for vehicles with no physical wheel-speed signal.
//!
//! Two topics are watched: the generic location service and an external high-precision
//! receiver. The external one wins as soon as it has delivered more than one message.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GpsTopic {
    /// Generic location service.
    GpsLocation,
    /// External high-precision receiver.
    GpsLocationExternal,
}

impl GpsTopic {
    /// Static service preference for a device, given whether it carries a u-blox receiver.
    pub fn preferred(ublox_available: bool) -> Self {
        if ublox_available {
            GpsTopic::GpsLocationExternal
        } else {
            GpsTopic::GpsLocation
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GpsTopic::GpsLocation => "gpsLocation",
            GpsTopic::GpsLocationExternal => "gpsLocationExternal",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    /// Ground speed, m/s.
    pub speed: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub bearing_deg: f64,
}

/// A pub/sub subscription to both GPS topics.
pub trait GpsSubscription {
    /// Zero-wait read of anything pending. Never blocks.
    fn poll(&mut self);

    /// Messages received on `topic` since the subscription started.
    fn update_count(&self, topic: GpsTopic) -> u64;

    /// Most recent message on `topic`, if any has arrived.
    fn latest(&self, topic: GpsTopic) -> Option<GpsFix>;
}

pub struct GpsSelector {
    subscription: Box<dyn GpsSubscription + Send>,
    last_speed: f64,
}

impl GpsSelector {
    pub fn new(subscription: Box<dyn GpsSubscription + Send>) -> Self {
        Self {
            subscription,
            last_speed: 0.0,
        }
    }

    /// Topic the selector would read from right now.
    pub fn active_topic(&self) -> GpsTopic {
        if self.subscription.update_count(GpsTopic::GpsLocationExternal) > 1 {
            GpsTopic::GpsLocationExternal
        } else {
            GpsTopic::GpsLocation
        }
    }

    /// Poll the subscription and return the raw speed from the preferred topic.
    ///
    /// If the chosen topic has nothing yet, the previously returned speed is reused.
    pub fn poll_speed(&mut self) -> f64 {
        self.subscription.poll();
        if let Some(fix) = self.subscription.latest(self.active_topic()) {
            self.last_speed = fix.speed;
        }
        self.last_speed
    }
}

impl std::fmt::Debug for GpsSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpsSelector")
            .field("active_topic", &self.active_topic())
            .field("last_speed", &self.last_speed)
            .finish()
    }
}
