use std::process::ExitCode;

use recur_core::tz;
use recur_core::{
    CalendarValue, DateLine, RecurrenceIterator, RecurrenceLines, Zone, from_lines,
    parse_calendar_value,
};
use serde::Serialize;
use tracing::debug;

use crate::cli::ExpandArgs;
use crate::error::{CliError, CliResult, EXIT_SUCCESS, OutputFormat};
use crate::shared::{
    format_value, parse_rule_or_input_error, parse_value_list, parse_zone_or_input_error,
    read_input,
};

pub fn run_expand(args: ExpandArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let lines = match &args.input {
        Some(path) => {
            let text = read_input(path)?;
            RecurrenceLines::parse(&text)
                .map_err(|e| CliError::input(format!("Invalid input '{}': {}", path, e)))?
        }
        None => lines_from_args(&args)?,
    };

    let mut set = from_lines(&lines);
    if let Some(after) = &args.after {
        let target = resolve_after(after, &lines.zone)?;
        debug!(%target, "advancing");
        set.advance_to(target);
    }

    let occurrences: Vec<String> = set
        .take(args.limit)
        .map(|value| format_value(value, &lines.zone))
        .collect();
    debug!(count = occurrences.len(), limit = args.limit, "expanded");

    let result = ExpandResult {
        dtstart: lines.dtstart.to_string(),
        tz: (!lines.zone.is_floating()).then(|| lines.zone.to_string()),
        occurrences,
    };

    match output_format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| CliError::runtime(format!("Failed to serialize JSON: {}", e)))?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for occurrence in &result.occurrences {
                println!("{}", occurrence);
            }
        }
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}

#[derive(Debug, Serialize)]
struct ExpandResult {
    dtstart: String,
    tz: Option<String>,
    occurrences: Vec<String>,
}

fn lines_from_args(args: &ExpandArgs) -> CliResult<RecurrenceLines> {
    let dtstart = args
        .dtstart
        .as_deref()
        .ok_or_else(|| CliError::input("--dtstart is required unless --input is given"))?;
    let (dtstart, utc) = parse_calendar_value(dtstart)
        .map_err(|e| CliError::input(format!("Invalid --dtstart '{}': {}", dtstart, e)))?;

    let zone = match (dtstart, utc, args.tz.as_deref()) {
        (CalendarValue::Date(_), _, _) => Zone::Floating,
        (_, true, _) => Zone::Utc,
        (_, false, Some(name)) => parse_zone_or_input_error(name)?,
        (_, false, None) => Zone::Floating,
    };

    let date_lines = |flag: &str, texts: &[String]| -> CliResult<Vec<DateLine>> {
        texts
            .iter()
            .map(|text| {
                let (values, utc) = parse_value_list(flag, text)?;
                Ok(DateLine {
                    values,
                    zone: if utc { Zone::Utc } else { zone },
                })
            })
            .collect()
    };

    let lines = RecurrenceLines {
        dtstart,
        zone,
        rrules: args
            .rrule
            .iter()
            .map(|r| parse_rule_or_input_error(r))
            .collect::<CliResult<_>>()?,
        exrules: args
            .exrule
            .iter()
            .map(|r| parse_rule_or_input_error(r))
            .collect::<CliResult<_>>()?,
        rdates: date_lines("rdate", &args.rdate)?,
        exdates: date_lines("exdate", &args.exdate)?,
    };
    lines.check_zones()?;
    Ok(lines)
}

/// Reads `--after` as wall-clock time in the set's zone unless it is UTC.
fn resolve_after(text: &str, zone: &Zone) -> CliResult<CalendarValue> {
    let (value, utc) = parse_calendar_value(text)
        .map_err(|e| CliError::input(format!("Invalid --after '{}': {}", text, e)))?;
    Ok(if utc { value } else { tz::to_utc(value, zone) })
}
