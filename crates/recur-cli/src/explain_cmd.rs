use std::process::ExitCode;

use recur_core::{ByPart, Frequency, RecurrenceSpec, partition, present_parts};
use serde::Serialize;

use crate::cli::ExplainArgs;
use crate::error::{CliError, CliResult, EXIT_SUCCESS, OutputFormat};
use crate::shared::parse_rule_or_input_error;

pub fn run_explain(args: ExplainArgs, output_format: OutputFormat) -> CliResult<ExitCode> {
    let spec = parse_rule_or_input_error(&args.rrule)?;
    let result = explain_rule(&spec);

    match output_format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| CliError::runtime(format!("Failed to serialize JSON: {}", e)))?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            println!("Rule: {}", result.rule);
            println!("Frequency: {}", result.frequency);
            println!("Generators: {}", join_parts(&result.generators));
            println!("Filters: {}", join_parts(&result.filters));
            println!("Bound: {}", result.bound);
        }
    }

    Ok(ExitCode::from(EXIT_SUCCESS))
}

#[derive(Debug, Serialize)]
struct ExplainResult {
    rule: String,
    frequency: Frequency,
    generators: Vec<ByPart>,
    filters: Vec<ByPart>,
    bound: String,
}

fn explain_rule(spec: &RecurrenceSpec) -> ExplainResult {
    let plan = partition(spec.frequency(), &present_parts(spec));
    let bound = match (spec.count(), spec.until()) {
        (Some(count), _) => format!("COUNT={count}"),
        (None, Some(until)) => format!("UNTIL={until}"),
        (None, None) => "unbounded".to_string(),
    };

    ExplainResult {
        rule: spec.to_string(),
        frequency: spec.frequency(),
        generators: plan.generators,
        filters: plan.filters,
        bound,
    }
}

fn join_parts(parts: &[ByPart]) -> String {
    if parts.is_empty() {
        return "(none)".to_string();
    }
    parts
        .iter()
        .map(ByPart::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_by_day_with_month_day_filter() {
        let spec: RecurrenceSpec = "FREQ=MONTHLY;BYDAY=FR;BYMONTHDAY=13".parse().unwrap();
        let result = explain_rule(&spec);
        assert_eq!(result.generators, vec![ByPart::ByMonthDay]);
        assert_eq!(result.filters, vec![ByPart::ByDay]);
        assert_eq!(result.bound, "unbounded");
    }

    #[test]
    fn count_is_reported_as_bound() {
        let spec: RecurrenceSpec = "FREQ=DAILY;BYMONTH=1;COUNT=5".parse().unwrap();
        let result = explain_rule(&spec);
        assert!(result.generators.is_empty());
        assert_eq!(result.filters, vec![ByPart::ByMonth]);
        assert_eq!(result.bound, "COUNT=5");
    }

    #[test]
    fn empty_part_list_text() {
        assert_eq!(join_parts(&[]), "(none)");
        assert_eq!(join_parts(&[ByPart::ByMonth, ByPart::ByDay]), "BYMONTH, BYDAY");
    }
}
