//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Outcome and decision only
    #[default]
    Summary,
    /// Every memo, dispute, round and gate
    Full,
    /// The final snapshot as JSON
    Json,
}

/// CLI arguments for policy-council
#[derive(Parser, Debug)]
#[command(name = "policy-council")]
#[command(author, version, about = "Multi-agent policy council - departments deliberate, negotiate and decide")]
#[command(long_about = r#"
Policy Council runs a simulated government council over a policy issue.

A run moves through fixed stages:
1. Intake: the issue becomes a structured policy card
2. Department memos: six departments state a position concurrently
3. Dispute aggregation and negotiation rounds until every dispute settles
4. Legal and fiscal review gates
5. Final decision and, when approved, an implementation plan

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./council.toml      Project-level config
3. ~/.config/policy-council/config.toml   Global config
4. COUNCIL_* environment variables (e.g. COUNCIL_LLM__API_KEY)

Example:
  policy-council run issue.json
  policy-council run --title "Urban Greening" --description "Plant 10,000 trees" --seed 42
  policy-council negotiate issue.json
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the council on an issue
    Run(RunArgs),

    /// List stored runs, newest first
    Runs,

    /// Show a stored run
    Show {
        run_id: String,

        #[arg(short, long, value_enum, default_value = "full")]
        output: OutputFormat,

        /// Also print the trace log
        #[arg(long)]
        trace: bool,
    },

    /// Delete a stored run and its artifacts
    Delete { run_id: String },

    /// Settle an issue's dimensions offline, without the reasoning service
    Negotiate {
        /// Issue JSON file declaring `dimensions`
        issue: PathBuf,

        /// Concession rounds before the median is imposed
        #[arg(long, default_value_t = 3)]
        max_rounds: u32,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Issue JSON file (an issue, or `{"issue": ..., "constraints": ...}`)
    #[arg(value_name = "ISSUE_FILE", conflicts_with = "title")]
    pub issue: Option<PathBuf>,

    /// Issue title, when no issue file is given
    #[arg(long, requires = "description")]
    pub title: Option<String>,

    /// Issue description, when no issue file is given
    #[arg(long)]
    pub description: Option<String>,

    /// Constraints JSON file (overrides constraints in the issue file)
    #[arg(long, value_name = "PATH")]
    pub constraints: Option<PathBuf>,

    /// Budget ceiling for the fiscal gate
    #[arg(long)]
    pub budget_ceiling: Option<f64>,

    /// Seed for the dispute draws; makes a run reproducible
    #[arg(long)]
    pub seed: Option<u64>,

    /// Negotiation round cap
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Record gate failures without stopping the run
    #[arg(long)]
    pub advisory: bool,

    /// Explicit run id
    #[arg(long)]
    pub run_id: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    pub output: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_flags() {
        let cli = Cli::parse_from([
            "policy-council",
            "-vv",
            "run",
            "--title",
            "Urban Greening",
            "--description",
            "Plant trees",
            "--seed",
            "42",
            "--advisory",
            "-o",
            "json",
        ]);
        assert_eq!(cli.verbose, 2);
        let Some(Command::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.title.as_deref(), Some("Urban Greening"));
        assert_eq!(args.seed, Some(42));
        assert!(args.advisory);
        assert_eq!(args.output, OutputFormat::Json);
    }

    #[test]
    fn test_title_requires_description() {
        assert!(Cli::try_parse_from(["policy-council", "run", "--title", "x"]).is_err());
    }

    #[test]
    fn test_parse_show_and_negotiate() {
        let cli = Cli::parse_from(["policy-council", "show", "run_1", "--trace"]);
        assert!(matches!(
            cli.command,
            Some(Command::Show { ref run_id, trace: true, output: OutputFormat::Full }) if run_id == "run_1"
        ));

        let cli = Cli::parse_from(["policy-council", "negotiate", "issue.json"]);
        assert!(matches!(cli.command, Some(Command::Negotiate { max_rounds: 3, .. })));
    }
}
