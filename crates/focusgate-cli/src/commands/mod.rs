pub mod data;
pub mod monitor;
pub mod schedule;
pub mod stats;

use focusgate_core::{
    Config, MonitoringController, NullEnforcement, ScheduleStore, SessionLedger, SharedStore,
};

pub type CliError = Box<dyn std::error::Error>;

/// Everything a command needs: the service objects constructed once per
/// invocation over the default shared store.
pub struct Context {
    pub config: Config,
    pub schedules: ScheduleStore,
    pub ledger: SessionLedger,
    pub controller: MonitoringController<NullEnforcement>,
}

impl Context {
    pub fn open() -> Result<Self, CliError> {
        let config = Config::load()?;
        let store = SharedStore::open_default()?;
        let schedules = ScheduleStore::open(store.clone())?;
        let ledger = SessionLedger::open(store.clone())?;
        let controller = MonitoringController::new(NullEnforcement, store.clone())
            .with_debounce_window(chrono::Duration::milliseconds(
                config.toggle_debounce_ms as i64,
            ));
        Ok(Self {
            config,
            schedules,
            ledger,
            controller,
        })
    }
}

/// Parse "HH:MM" into (hour, minute).
pub fn parse_time(value: &str) -> Result<(u8, u8), CliError> {
    let (hour, minute) = value
        .split_once(':')
        .ok_or_else(|| format!("expected HH:MM, got '{value}'"))?;
    Ok((hour.parse()?, minute.parse()?))
}

/// Parse a comma-separated weekday list, e.g. "sun,mon" or "1,2".
/// 1=Sunday .. 7=Saturday.
pub fn parse_days(value: &str) -> Result<Vec<u8>, CliError> {
    value
        .split(',')
        .map(|day| match day.trim().to_lowercase().as_str() {
            "sun" => Ok(1),
            "mon" => Ok(2),
            "tue" => Ok(3),
            "wed" => Ok(4),
            "thu" => Ok(5),
            "fri" => Ok(6),
            "sat" => Ok(7),
            other => other
                .parse::<u8>()
                .map_err(|_| format!("unknown weekday '{other}'").into()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_time_accepts_padded_and_bare() {
        assert_eq!(parse_time("09:05").unwrap(), (9, 5));
        assert_eq!(parse_time("23:59").unwrap(), (23, 59));
        assert!(parse_time("nine").is_err());
    }

    #[test]
    fn parse_days_accepts_names_and_numbers() {
        assert_eq!(parse_days("mon,tue,wed").unwrap(), vec![2, 3, 4]);
        assert_eq!(parse_days("1,7").unwrap(), vec![1, 7]);
        assert!(parse_days("someday").is_err());
    }
}
