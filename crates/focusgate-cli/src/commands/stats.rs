use chrono::Utc;
use clap::{Subcommand, ValueEnum};

use focusgate_core::{bucket, ChartPeriod};

use super::{CliError, Context};

#[derive(Clone, Copy, ValueEnum)]
pub enum Period {
    Day,
    Week,
}

#[derive(Subcommand)]
pub enum StatsAction {
    /// All-time recorded focus minutes
    Total,
    /// Bucketed chart data
    Chart {
        #[arg(long, value_enum, default_value_t = Period::Day)]
        period: Period,
    },
}

pub fn run(action: StatsAction) -> Result<(), CliError> {
    let mut ctx = Context::open()?;
    // Pick up anything the background writer staged since last run.
    ctx.ledger.refresh()?;

    match action {
        StatsAction::Total => {
            println!(
                "{} focus minutes across {} sessions",
                ctx.ledger.total_minutes(),
                ctx.ledger.sessions().len()
            );
        }
        StatsAction::Chart { period } => {
            let (period, label_fmt) = match period {
                Period::Day => (ChartPeriod::Day, "%H:%M"),
                Period::Week => (ChartPeriod::Week, "%a %d"),
            };
            let buckets = bucket(ctx.ledger.sessions(), period, Utc::now());
            let peak = buckets.iter().map(|b| b.minutes).max().unwrap_or(0).max(1);
            for slot in &buckets {
                let bar_len = (slot.minutes * 40 / peak) as usize;
                println!(
                    "{} {:>4} {}",
                    slot.starts_at.format(label_fmt),
                    slot.minutes,
                    "#".repeat(bar_len),
                );
            }
        }
    }
    Ok(())
}
