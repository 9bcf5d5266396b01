//! Remote coaching service.
//!
//! Wraps an OpenAI-style chat-completions endpoint that turns the current
//! biometric picture into a session recommendation plus a short
//! encouragement phrase. The service is strictly optional: every caller
//! falls back to the local [`crate::advisor`] heuristic when the endpoint
//! is disabled, unreachable, or misconfigured.

pub mod client;
pub mod endpoint;
pub mod prompt;

pub use client::{CoachClient, CoachReply};
pub use endpoint::CoachEndpoint;
pub use prompt::PromptFactory;

use crate::advisor::{self, Advice};
use crate::biometrics::VitalSigns;
use crate::error::CoachError;
use crate::storage::CoachConfig;

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "pulsefocus";

    pub fn get(key: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn delete(key: &str) -> Result<(), Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Where a recommendation came from.
pub enum CoachProvider {
    /// Local heuristic only.
    Local,
    /// Remote endpoint with local fallback.
    Remote(CoachClient),
}

impl CoachProvider {
    /// Build a provider from config, loading the API key from the keyring.
    pub fn from_config(config: &CoachConfig) -> Result<Self, CoachError> {
        if !config.enabled {
            return Ok(Self::Local);
        }
        let api_key = keyring_store::get("coach_api_key").ok().flatten();
        if api_key.is_none() && config.require_key {
            return Err(CoachError::MissingCredentials);
        }
        Ok(Self::Remote(CoachClient::new(config, api_key)?))
    }

    /// A recommendation for the given vitals.
    ///
    /// Remote failures degrade silently to the local heuristic.
    pub async fn coach(
        &self,
        focus_base: u32,
        rest_base: u32,
        vitals: &VitalSigns,
    ) -> (Advice, Option<String>) {
        let local = advisor::advise(
            focus_base,
            rest_base,
            vitals.resting_hr,
            vitals.hrv,
            vitals.bpm,
        );
        match self {
            Self::Local => (local, None),
            Self::Remote(client) => match client.coach(focus_base, rest_base, vitals).await {
                Ok(reply) => (
                    Advice {
                        focus_minutes: reply.focus_minutes.clamp(15, 45),
                        rest_minutes: reply.rest_minutes.clamp(3, 10),
                        score: local.score,
                    },
                    Some(reply.phrase),
                ),
                Err(_) => (local, None),
            },
        }
    }
}
