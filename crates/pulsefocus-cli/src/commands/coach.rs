use clap::Subcommand;
use pulsefocus_core::biometrics::VitalSigns;
use pulsefocus_core::coach::CoachProvider;
use pulsefocus_core::storage::Config;

#[derive(Subcommand)]
pub enum CoachAction {
    /// Probe the configured endpoint
    Test,
    /// Ask the coach for a recommendation
    Advise {
        /// Average heart rate, bpm
        #[arg(long)]
        bpm: f64,
        /// Heart rate variability, ms
        #[arg(long)]
        hrv: f64,
        /// Resting heart rate, bpm
        #[arg(long)]
        resting_hr: f64,
    },
}

pub fn run(action: CoachAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let provider = CoachProvider::from_config(&config.coach)?;
    let runtime = tokio::runtime::Runtime::new()?;

    match action {
        CoachAction::Test => match &provider {
            CoachProvider::Local => {
                println!("coach disabled; the local advisor answers everything");
            }
            CoachProvider::Remote(client) => {
                let (ok, detail) = runtime.block_on(client.test_connectivity());
                if ok {
                    println!("ok: {detail}");
                } else {
                    eprintln!("unreachable: {detail}");
                    std::process::exit(1);
                }
            }
        },
        CoachAction::Advise {
            bpm,
            hrv,
            resting_hr,
        } => {
            let vitals = VitalSigns {
                bpm,
                hrv,
                resting_hr,
            };
            let (advice, phrase) = runtime.block_on(provider.coach(
                config.timer.focus_minutes,
                config.timer.rest_minutes,
                &vitals,
            ));
            println!("{}", serde_json::to_string_pretty(&advice)?);
            if let Some(phrase) = phrase {
                println!("{phrase}");
            }
        }
    }
    Ok(())
}
