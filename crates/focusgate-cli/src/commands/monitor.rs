use clap::Subcommand;
use uuid::Uuid;

use focusgate_core::Event;

use super::{CliError, Context};

#[derive(Subcommand)]
pub enum MonitorAction {
    /// Start enforcement for a schedule (deactivates any other first)
    Activate { id: Uuid },
    /// Stop enforcement and record the elapsed session
    Deactivate { id: Uuid },
    /// Show persisted enforcement status per schedule
    Status,
    /// Stop enforcement for every schedule
    StopAll,
    /// Re-activate schedules persisted as active (restart recovery)
    Restore,
}

pub fn run(action: MonitorAction) -> Result<(), CliError> {
    let mut ctx = Context::open()?;
    match action {
        MonitorAction::Activate { id } => {
            let events = ctx
                .controller
                .activate(id, &mut ctx.schedules, &mut ctx.ledger)?;
            print_events(&events);
        }
        MonitorAction::Deactivate { id } => {
            let events = ctx
                .controller
                .deactivate(id, &mut ctx.schedules, &mut ctx.ledger)?;
            print_events(&events);
        }
        MonitorAction::Status => {
            let states = ctx.controller.monitoring_state()?;
            if ctx.schedules.list().is_empty() {
                println!("no schedules");
            }
            for schedule in ctx.schedules.list() {
                let enforced = states
                    .get(&schedule.id.to_string())
                    .copied()
                    .unwrap_or(false);
                println!(
                    "{} {:24} flag={:5} enforcement={}",
                    schedule.id,
                    schedule.name,
                    schedule.is_active,
                    if enforced { "running" } else { "stopped" },
                );
            }
        }
        MonitorAction::StopAll => {
            let events = ctx
                .controller
                .stop_all(&mut ctx.schedules, &mut ctx.ledger)?;
            if events.is_empty() {
                println!("nothing was running");
            }
            print_events(&events);
        }
        MonitorAction::Restore => {
            let events = ctx
                .controller
                .restore_active_schedules(&mut ctx.schedules, &mut ctx.ledger);
            if events.is_empty() {
                println!("nothing to restore");
            }
            print_events(&events);
        }
    }
    Ok(())
}

fn print_events(events: &[Event]) {
    for event in events {
        match event {
            Event::MonitoringStarted { schedule_id, .. } => {
                println!("monitoring started for {schedule_id}");
            }
            Event::MonitoringStopped {
                schedule_id,
                recorded_minutes,
                ..
            } => {
                println!("monitoring stopped for {schedule_id} ({recorded_minutes} min recorded)");
            }
            Event::MonitoringRestored { schedule_id, .. } => {
                println!("restored {schedule_id}");
            }
            Event::MonitoringRestoreFailed {
                schedule_id,
                reason,
                ..
            } => {
                println!("could not restore {schedule_id}: {reason}");
            }
            Event::SessionRecorded {
                duration_minutes, ..
            } => {
                println!("recorded {duration_minutes} focus minutes");
            }
            _ => {}
        }
    }
}
