use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use dlqr_core::Scope;

#[derive(Parser)]
#[command(name = "dlqr")]
#[command(about = "Design and preview redaction rules for dead-letter queues", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: user config directory)
    #[arg(long, global = true, env = "DLQR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Rule database (overrides config)
    #[arg(long, global = true, env = "DLQR_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply rules to a sample document
    Preview {
        /// Sample JSON file, or - for stdin
        #[arg(long)]
        sample: String,

        /// Rules JSON file instead of a stored rule set
        #[arg(long, conflicts_with_all = ["scope", "key"])]
        rules: Option<PathBuf>,

        /// Stored rule set scope (default from config)
        #[arg(long)]
        scope: Option<Scope>,

        /// Stored rule set key (topic name or pattern)
        #[arg(long)]
        key: Option<String>,

        /// Show what changed
        #[arg(long)]
        diff: bool,

        /// Print machine-readable output
        #[arg(long)]
        json: bool,
    },

    /// Manage stored rule sets
    #[command(subcommand)]
    Rules(RulesCommands),

    /// Check a path expression, or - to read expressions from stdin
    Validate {
        expression: String,

        /// Sample JSON file to count matches against
        #[arg(long)]
        sample: Option<String>,
    },

    /// Print a sample document from a DLQ dump directory
    Sample {
        #[arg(long)]
        topic: String,

        #[arg(long)]
        partition: Option<i32>,

        #[arg(long)]
        offset: Option<i64>,

        /// Dump directory (default from config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions { shell: Shell },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Show a stored rule set
    Show {
        #[arg(long)]
        scope: Option<Scope>,

        #[arg(long)]
        key: Option<String>,
    },

    /// Replace a stored rule set with rules from a file
    Save {
        #[arg(long)]
        scope: Option<Scope>,

        #[arg(long)]
        key: Option<String>,

        /// Rules JSON file
        #[arg(long)]
        file: PathBuf,

        /// Preview against this sample before saving
        #[arg(long)]
        sample: Option<String>,
    },

    /// List stored rule sets
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_preview_rules_conflict_with_scope() {
        let result = Cli::try_parse_from([
            "dlqr", "preview", "--sample", "s.json", "--rules", "r.json", "--scope", "topic",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_scope_parses_case_insensitively() {
        let cli = Cli::try_parse_from([
            "dlqr", "rules", "show", "--scope", "TOPIC", "--key", "orders-DLQ",
        ])
        .unwrap();

        match cli.command {
            Commands::Rules(RulesCommands::Show { scope, key }) => {
                assert_eq!(scope, Some(Scope::Topic));
                assert_eq!(key.as_deref(), Some("orders-DLQ"));
            }
            _ => panic!("expected rules show"),
        }
    }
}
