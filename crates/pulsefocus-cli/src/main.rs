use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pulsefocus-cli", version, about = "PulseFocus CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Session timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Run the local advisor on explicit vitals
    Advise(commands::advise::AdviseArgs),
    /// Remote coaching service
    Coach {
        #[command(subcommand)]
        action: commands::coach::CoachAction,
    },
    /// Archived sessions
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Coach credential management
    Auth {
        #[command(subcommand)]
        action: commands::auth::AuthAction,
    },
    /// Demonstrations
    Demo {
        #[command(subcommand)]
        action: commands::demo::DemoAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Advise(args) => commands::advise::run(args),
        Commands::Coach { action } => commands::coach::run(action),
        Commands::History { action } => commands::history::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Auth { action } => commands::auth::run(action),
        Commands::Demo { action } => commands::demo::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
