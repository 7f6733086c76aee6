use clap::{Parser, Subcommand};

/// RFC 5545 recurrence expansion tool
#[derive(Parser, Debug)]
#[command(name = "recur", version)]
#[command(about = "RFC 5545 recurrence expansion tool")]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Expand a recurrence set into occurrences
    Expand(ExpandArgs),
    /// Show how a rule's BYxxx parts are evaluated
    Explain(ExplainArgs),
}

#[derive(clap::Args, Debug)]
pub struct ExpandArgs {
    /// Start value (e.g., 19970902T090000, 19970902 or 19970902T130000Z)
    #[arg(long)]
    pub dtstart: Option<String>,

    /// IANA timezone or fixed offset of the start value (default: floating)
    #[arg(short, long)]
    pub tz: Option<String>,

    /// Inclusion rule (repeatable)
    #[arg(long)]
    pub rrule: Vec<String>,

    /// Exclusion rule (repeatable)
    #[arg(long)]
    pub exrule: Vec<String>,

    /// Comma-separated extra values (repeatable)
    #[arg(long)]
    pub rdate: Vec<String>,

    /// Comma-separated excluded values (repeatable)
    #[arg(long)]
    pub exdate: Vec<String>,

    /// Content-line file with DTSTART/RRULE/EXRULE/RDATE/EXDATE (use - for stdin)
    #[arg(long, conflicts_with_all = ["dtstart", "tz", "rrule", "exrule", "rdate", "exdate"])]
    pub input: Option<String>,

    /// Skip occurrences before this value
    #[arg(long)]
    pub after: Option<String>,

    /// Maximum number of occurrences to print
    #[arg(short = 'n', long, default_value_t = 100)]
    pub limit: usize,

    /// Output format: json, text
    #[arg(long, default_value = "text")]
    pub output_format: String,
}

#[derive(clap::Args, Debug)]
pub struct ExplainArgs {
    /// Rule to explain (e.g., FREQ=MONTHLY;BYDAY=1FR)
    #[arg(long)]
    pub rrule: String,

    /// Output format: json, text
    #[arg(long, default_value = "text")]
    pub output_format: String,
}
