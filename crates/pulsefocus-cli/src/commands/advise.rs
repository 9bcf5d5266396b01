use clap::Args;
use pulsefocus_core::advisor;

#[derive(Args)]
pub struct AdviseArgs {
    /// Baseline focus minutes
    #[arg(long, default_value = "25")]
    pub focus_base: u32,
    /// Baseline rest minutes
    #[arg(long, default_value = "5")]
    pub rest_base: u32,
    /// Average heart rate, bpm
    #[arg(long)]
    pub bpm: f64,
    /// Heart rate variability, ms
    #[arg(long)]
    pub hrv: f64,
    /// Resting heart rate, bpm
    #[arg(long)]
    pub resting_hr: f64,
}

pub fn run(args: AdviseArgs) -> Result<(), Box<dyn std::error::Error>> {
    let advice = advisor::advise(
        args.focus_base,
        args.rest_base,
        args.resting_hr,
        args.hrv,
        args.bpm,
    );
    println!("{}", serde_json::to_string_pretty(&advice)?);
    Ok(())
}
