use clap::Args;
use serde::Serialize;
use smartsaver_core::simulation::{SimulationLog, TimedEvent};
use smartsaver_core::{Settings, Simulation};

#[derive(Args)]
pub struct SimulateArgs {
    /// Press time in milliseconds from the start (repeatable)
    #[arg(long = "press", required = true)]
    presses: Vec<u64>,
    /// Gesture window in milliseconds (defaults to the configured value)
    #[arg(long)]
    threshold: Option<u32>,
    /// Countdown in seconds (defaults to the configured value)
    #[arg(long)]
    countdown: Option<u32>,
    /// Stop the clock here (defaults to after the last countdown could fire)
    #[arg(long)]
    until: Option<u64>,
}

#[derive(Serialize)]
struct Report<'a> {
    events: &'a [TimedEvent],
    log: &'a SimulationLog,
    ended_at_ms: u64,
}

/// Apply overrides on top of the configured settings.
fn scenario_settings(args: &SimulateArgs) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::load_or_default();
    if let Some(threshold) = args.threshold {
        settings = settings.with("delay-double-click", &threshold.to_string())?;
    }
    if let Some(countdown) = args.countdown {
        settings = settings.with("delay-off", &countdown.to_string())?;
    }
    Ok(settings)
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = scenario_settings(&args)?;
    let mut presses = args.presses.clone();
    presses.sort_unstable();

    let last = presses.last().copied().unwrap_or(0);
    let until = args.until.unwrap_or(
        last + u64::from(settings.delay_double_click) + u64::from(settings.delay_off) * 1_000,
    );

    let mut sim = Simulation::new(settings);
    for at in presses.into_iter().filter(|at| *at <= until) {
        sim.press_at(at);
    }
    sim.run_until(until);

    let log = sim.log().clone();
    let report = Report {
        events: sim.events(),
        log: &log,
        ended_at_ms: sim.now_ms(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
