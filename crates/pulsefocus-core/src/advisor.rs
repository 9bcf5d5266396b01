//! Adaptive advisor: derives focus/rest durations from biometrics.
//!
//! Pure and total -- all inputs are clamped before use, so there are no
//! error conditions. Higher cardiovascular pressure never lengthens focus
//! and never shortens rest.

use serde::{Deserialize, Serialize};

/// Lowest resting heart rate the advisor will believe, in bpm.
pub const RESTING_HR_FLOOR: f64 = 40.0;

/// Advisor output: adjusted durations plus a 0..100 readiness score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub focus_minutes: u32,
    pub rest_minutes: u32,
    pub score: f64,
}

/// Cardiovascular pressure: elevation of the current heart rate over the
/// resting baseline, damped by heart-rate variability.
pub fn pressure(resting_hr: f64, hrv: f64, avg_hr: f64) -> f64 {
    let rhr_safe = resting_hr.max(RESTING_HR_FLOOR);
    let delta = avg_hr - rhr_safe;
    let hrv_factor = hrv.max(1.0);
    delta.max(0.0) / hrv_factor
}

/// Compute adjusted focus/rest minutes and a readiness score.
///
/// Focus shrinks and rest grows with pressure; focus lands in 15..=45,
/// rest in 3..=10, score in 0..=100. Zero pressure returns the bases
/// unchanged with a score of 100.
pub fn advise(focus_base: u32, rest_base: u32, resting_hr: f64, hrv: f64, avg_hr: f64) -> Advice {
    let p = pressure(resting_hr, hrv, avg_hr);
    let focus = (focus_base as f64 - p.round()).clamp(15.0, 45.0) as u32;
    let rest = (rest_base as f64 + (p - 1.0).max(0.0).round()).clamp(3.0, 10.0) as u32;
    let score = (100.0 - p * 10.0).clamp(0.0, 100.0);
    Advice {
        focus_minutes: focus,
        rest_minutes: rest,
        score,
    }
}
