use clap::Subcommand;

use super::{CliError, Context};

#[derive(Subcommand)]
pub enum DataAction {
    /// Drain pending session outboxes into the confirmed ledger
    Refresh,
    /// Run refresh on the configured interval until interrupted
    Watch,
    /// Remove all schedules, sessions, and totals
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

pub fn run(action: DataAction) -> Result<(), CliError> {
    let mut ctx = Context::open()?;
    match action {
        DataAction::Refresh => {
            let outcome = ctx.ledger.refresh()?;
            println!(
                "merged {} session(s), discarded {} duplicate(s)",
                outcome.merged, outcome.discarded
            );
        }
        DataAction::Watch => {
            let interval = std::time::Duration::from_secs(ctx.config.refresh_interval_secs);
            println!(
                "refreshing every {}s, ctrl-c to stop",
                ctx.config.refresh_interval_secs
            );
            loop {
                match ctx.ledger.refresh() {
                    Ok(outcome) if outcome.merged > 0 || outcome.discarded > 0 => {
                        println!(
                            "merged {} session(s), discarded {} duplicate(s)",
                            outcome.merged, outcome.discarded
                        );
                    }
                    Ok(_) => {}
                    // Leave the outboxes staged and retry next tick.
                    Err(e) => tracing::warn!(error = %e, "refresh failed, will retry"),
                }
                std::thread::sleep(interval);
            }
        }
        DataAction::Clear { force } => {
            if !force {
                return Err("refusing to clear without --force".into());
            }
            let summary = ctx.ledger.clear_all()?;
            println!(
                "cleared {} key(s): {} confirmed and {} pending session(s) removed",
                summary.keys_removed,
                summary.confirmed_sessions_removed,
                summary.pending_sessions_removed
            );
        }
    }
    Ok(())
}
