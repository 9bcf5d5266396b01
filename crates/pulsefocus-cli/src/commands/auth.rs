use clap::Subcommand;
use pulsefocus_core::coach::keyring_store;

const KEY: &str = "coach_api_key";

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the coach API key in the OS keyring
    SetKey {
        /// The API key
        key: String,
    },
    /// Remove the stored coach API key
    ClearKey,
    /// Check whether a coach API key is stored
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::SetKey { key } => {
            keyring_store::set(KEY, &key)?;
            println!("coach API key stored");
        }
        AuthAction::ClearKey => {
            keyring_store::delete(KEY)?;
            println!("coach API key removed");
        }
        AuthAction::Status => {
            if keyring_store::get(KEY)?.is_some() {
                println!("coach API key: stored");
            } else {
                println!("coach API key: not set");
            }
        }
    }
    Ok(())
}
