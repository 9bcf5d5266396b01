use clap::Subcommand;
use pulsefocus_core::storage::Database;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List archived sessions as JSON, most recent first
    List,
    /// Delete an archived session by id
    Delete {
        /// Session id (UUID)
        id: String,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HistoryAction::List => {
            let sessions = db.query_all()?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        HistoryAction::Delete { id } => {
            let id: Uuid = id.parse()?;
            if db.delete_session(&id)? {
                println!("deleted {id}");
            } else {
                eprintln!("no session with id {id}");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
