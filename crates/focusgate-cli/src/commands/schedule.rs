use clap::Subcommand;
use uuid::Uuid;

use focusgate_core::ScheduleConfig;

use super::{parse_days, parse_time, CliError, Context};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Create a blocking schedule
    Add {
        name: String,
        /// Window start, HH:MM
        #[arg(long)]
        start: String,
        /// Window end, HH:MM (at or before start means crossing midnight)
        #[arg(long)]
        end: String,
        /// Active weekdays, e.g. "mon,tue,wed" or "2,3,4"
        #[arg(long)]
        days: String,
    },
    /// List schedules
    List,
    /// Edit a schedule's window or days
    Edit {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        days: Option<String>,
    },
    /// Delete a schedule (stops its enforcement first if active)
    Delete { id: Uuid },
    /// Toggle a schedule's enforcement (debounced)
    Toggle { id: Uuid },
}

pub fn run(action: ScheduleAction) -> Result<(), CliError> {
    let mut ctx = Context::open()?;
    match action {
        ScheduleAction::Add {
            name,
            start,
            end,
            days,
        } => {
            let config =
                ScheduleConfig::new(name, parse_time(&start)?, parse_time(&end)?, parse_days(&days)?)?;
            let summary = format!(
                "created {} ({}, {}, {} min)",
                config.id,
                config.formatted_time_range(),
                config.formatted_days(),
                config.duration_minutes()
            );
            ctx.schedules.create(config)?;
            println!("{summary}");
        }
        ScheduleAction::List => {
            if ctx.schedules.list().is_empty() {
                println!("no schedules");
            }
            for schedule in ctx.schedules.list() {
                println!(
                    "{} {} {:12} {} [{}]{}",
                    schedule.id,
                    schedule.formatted_time_range(),
                    schedule.formatted_days(),
                    format_args!("{} min", schedule.duration_minutes()),
                    schedule.name,
                    if schedule.is_active { " (active)" } else { "" },
                );
            }
        }
        ScheduleAction::Edit {
            id,
            name,
            start,
            end,
            days,
        } => {
            let Some(existing) = ctx.schedules.get(id).cloned() else {
                return Err(format!("no schedule with id {id}").into());
            };
            let mut updated = existing;
            if let Some(name) = name {
                updated.name = name;
            }
            if let Some(start) = start {
                (updated.start_hour, updated.start_minute) = parse_time(&start)?;
            }
            if let Some(end) = end {
                (updated.end_hour, updated.end_minute) = parse_time(&end)?;
            }
            if let Some(days) = days {
                updated.days = parse_days(&days)?;
            }
            focusgate_core::validate_window(updated.start(), updated.end())?;
            ctx.schedules.update(updated)?;
            println!("updated {id}");
        }
        ScheduleAction::Delete { id } => {
            let events = ctx
                .controller
                .delete_schedule(id, &mut ctx.schedules, &mut ctx.ledger)?;
            if events.is_empty() {
                println!("no schedule with id {id}");
            } else {
                println!("deleted {id}");
            }
        }
        ScheduleAction::Toggle { id } => {
            let Some(schedule) = ctx.schedules.get(id) else {
                println!("no schedule with id {id}");
                return Ok(());
            };
            let desired = !schedule.is_active;
            ctx.controller.request_toggle(id, desired);
            // Let the debounce window elapse so the request settles.
            std::thread::sleep(std::time::Duration::from_millis(
                ctx.config.toggle_debounce_ms,
            ));
            ctx.controller
                .flush_debounced(&mut ctx.schedules, &mut ctx.ledger);
            println!(
                "{} is now {}",
                id,
                if desired { "active" } else { "inactive" }
            );
        }
    }
    Ok(())
}
