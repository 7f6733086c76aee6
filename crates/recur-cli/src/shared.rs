use std::fs;
use std::io::{self, Read};

use anyhow::Context;
use recur_core::{CalendarValue, RecurrenceSpec, Zone, parse_calendar_value, parse_zone};

use crate::error::{CliError, CliResult};

pub fn parse_zone_or_input_error(name: &str) -> CliResult<Zone> {
    parse_zone(name).map_err(|e| CliError::input(format!("Invalid timezone '{}': {}", name, e)))
}

pub fn parse_rule_or_input_error(text: &str) -> CliResult<RecurrenceSpec> {
    text.parse()
        .map_err(|e| CliError::input(format!("Invalid rule '{}': {}", text, e)))
}

/// Parses a comma-separated value list, reporting whether every value
/// carried a `Z`.
pub fn parse_value_list(flag: &str, text: &str) -> CliResult<(Vec<CalendarValue>, bool)> {
    let mut values = Vec::new();
    let mut all_utc = true;
    for item in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (value, utc) = parse_calendar_value(item)
            .map_err(|e| CliError::input(format!("Invalid --{} '{}': {}", flag, item, e)))?;
        all_utc &= utc;
        values.push(value);
    }
    if values.is_empty() {
        return Err(CliError::input(format!("--{} needs at least one value", flag)));
    }
    Ok((values, all_utc))
}

/// Renders one occurrence of a set in `zone`.
///
/// Zoned sets yield UTC date-times, which get a `Z`. Floating sets hold
/// only wall-clock values (absolute RDATE/EXDATE entries are rejected when
/// the set is built), and whole days never carry a marker.
pub fn format_value(value: CalendarValue, zone: &Zone) -> String {
    match value {
        CalendarValue::DateTime(_) if !zone.is_floating() => format!("{value}Z"),
        _ => value.to_string(),
    }
}

pub fn read_input(path: &str) -> CliResult<String> {
    let read = || -> anyhow::Result<String> {
        if path == "-" {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        } else {
            fs::read_to_string(path).with_context(|| format!("Failed to read file '{path}'"))
        }
    };
    read().map_err(|e| CliError::runtime(format!("{e:#}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_list_tracks_utc() {
        let (values, utc) = parse_value_list("rdate", "19970903T090000Z, 19970904T090000Z").unwrap();
        assert_eq!(values.len(), 2);
        assert!(utc);

        let (_, utc) = parse_value_list("rdate", "19970903T090000Z,19970904T090000").unwrap();
        assert!(!utc);
    }

    #[test]
    fn value_list_rejects_garbage() {
        assert!(parse_value_list("exdate", "tomorrow").is_err());
        assert!(parse_value_list("exdate", " , ").is_err());
    }

    #[test]
    fn zoned_date_times_get_utc_marker() {
        let value: CalendarValue = "19970902T130000".parse().unwrap();
        assert_eq!(format_value(value, &Zone::Utc), "19970902T130000Z");
        assert_eq!(format_value(value, &Zone::Floating), "19970902T130000");

        let day: CalendarValue = "19970902".parse().unwrap();
        assert_eq!(format_value(day, &Zone::Utc), "19970902");
    }

    #[test]
    fn missing_file_is_runtime_error() {
        let err = read_input("/nonexistent/recur/input.txt").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_RUNTIME_ERROR);
    }
}
