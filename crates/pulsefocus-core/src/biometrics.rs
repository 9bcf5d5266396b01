//! Biometric source boundary.
//!
//! The real sensor lives outside this crate; the contract is periodic
//! [`VitalSigns`] samples with no acknowledgement. A deterministic
//! simulator is provided for development and tests, and
//! [`VitalsAggregate`] folds samples into the averages recorded on an
//! archived session.

use rand::Rng;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

/// Upper bound on the stored bpm series per session.
const SERIES_CAP: usize = 600;

/// One biometric sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    pub bpm: f64,
    pub hrv: f64,
    pub resting_hr: f64,
}

/// Deterministic stand-in for the platform health source.
///
/// Matches the distribution the device simulator uses: 65 bpm base with
/// -6..=12 jitter, hrv 40..=80, resting rate pinned at 64.
pub struct SimulatedVitals {
    rng: Pcg64Mcg,
}

impl SimulatedVitals {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64Mcg::new(seed as u128),
        }
    }

    pub fn sample(&mut self) -> VitalSigns {
        let jitter = self.rng.gen_range(-6i32..=12) as f64;
        VitalSigns {
            bpm: 65.0 + jitter,
            hrv: self.rng.gen_range(40i32..=80) as f64,
            resting_hr: 64.0,
        }
    }
}

/// Rolling aggregate of samples observed during a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VitalsAggregate {
    count: u64,
    bpm_sum: f64,
    hrv_sum: f64,
    last_resting_hr: f64,
    series: Vec<f64>,
}

impl VitalsAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, sample: &VitalSigns) {
        self.count += 1;
        self.bpm_sum += sample.bpm;
        self.hrv_sum += sample.hrv;
        self.last_resting_hr = sample.resting_hr;
        if self.series.len() < SERIES_CAP {
            self.series.push(sample.bpm);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn bpm_avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.bpm_sum / self.count as f64
        }
    }

    pub fn hrv_avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.hrv_sum / self.count as f64
        }
    }

    pub fn resting_hr(&self) -> f64 {
        self.last_resting_hr
    }

    pub fn sample_count(&self) -> u64 {
        self.count
    }

    pub fn bpm_series(&self) -> &[f64] {
        &self.series
    }
}
