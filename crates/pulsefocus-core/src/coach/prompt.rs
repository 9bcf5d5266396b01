//! Prompt templates for the coaching service.

use crate::biometrics::VitalSigns;

/// Builds the prompts sent to the coach endpoint.
pub struct PromptFactory;

impl PromptFactory {
    /// Session recommendation from the current biometric picture.
    ///
    /// The reply contract is positional: first integer is focus minutes,
    /// second is rest minutes, the remainder is the encouragement phrase.
    pub fn coach(focus_base: u32, rest_base: u32, vitals: &VitalSigns) -> String {
        format!(
            "You are a focus coach for a work/rest timer. The user's baseline is \
             {focus_base} minutes of focus and {rest_base} minutes of rest. Current \
             biometrics: heart rate {:.0} bpm, HRV {:.0} ms, resting heart rate {:.0} bpm. \
             Reply with exactly two integers followed by one short encouraging sentence: \
             recommended focus minutes (15-45), recommended rest minutes (3-10), phrase. \
             Example: \"25 5 Steady pulse, settle in and go.\"",
            vitals.bpm, vitals.hrv, vitals.resting_hr
        )
    }

    /// End-of-session review of the aggregated numbers.
    pub fn review(
        focus_minutes: u32,
        avg_bpm: f64,
        avg_hrv: f64,
        pause_count: u32,
    ) -> String {
        format!(
            "Review this completed focus session in two sentences. Length: \
             {focus_minutes} minutes. Average heart rate: {avg_bpm:.0} bpm. Average \
             HRV: {avg_hrv:.0} ms. Pauses: {pause_count}. Be concrete and encouraging."
        )
    }

    /// Connectivity check message.
    pub fn ping() -> String {
        "Reply with the single word: ok".to_string()
    }
}
