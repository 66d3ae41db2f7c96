use chrono::Utc;
use rand::{Rng as _, SeedableRng as _, rngs::StdRng};

/// The three physical readings taken each cycle. The sensor id and the
/// timestamp are filled in by the transmitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub temperature: f32,

    pub pressure: f32,

    pub humidity: f32,
}

pub trait ReadingSource {
    fn sample(&mut self) -> Readings;
}

/// Pseudo-random readings for running without hardware.
///
/// Values fall on the same grid as the field units this protocol was built
/// around: temperature 20.00–24.95 in 0.05 steps, pressure 1010.0–1014.9 and
/// humidity 40.0–59.9 in 0.1 steps.
#[derive(Debug)]
pub struct SimulatedSource {
    rng: StdRng,
}

impl SimulatedSource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeds from the wall clock. Not suitable for anything but simulation.
    pub fn from_clock() -> Self {
        Self::from_seed(Utc::now().timestamp() as u64)
    }
}

impl ReadingSource for SimulatedSource {
    fn sample(&mut self) -> Readings {
        Readings {
            temperature: 20.0 + self.rng.gen_range(0..100) as f32 / 20.0,
            pressure: 1010.0 + self.rng.gen_range(0..50) as f32 / 10.0,
            humidity: 40.0 + self.rng.gen_range(0..200) as f32 / 10.0,
        }
    }
}
