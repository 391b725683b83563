use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "poolshare")]
#[command(
    version,
    about = "Time-weighted ownership shares and ROI for a pooled account"
)]
#[command(
    long_about = "Replay a ledger of deposits and withdrawals against the account's valuation history to work out each investor's share of the pool per investment round, their final asset value and their return on investment."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Path to a TOML config file (default: ./poolshare.toml, then the user config dir)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show share, final asset value and ROI per investor and round
    Report {
        #[command(flatten)]
        inputs: InputArgs,
    },

    /// Show the date-level weights assigned to each deposit date
    Weights {
        #[command(flatten)]
        inputs: InputArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Transaction ledger CSV (id,name,code,date,amount)
    #[arg(short, long)]
    pub transactions: Option<PathBuf>,

    /// Account value CSV (date,usdt_balance,unrealized_pnl)
    #[arg(short, long)]
    pub valuations: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "poolshare",
            "report",
            "--json",
            "-t",
            "ledger.csv",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Report { inputs } => {
                assert_eq!(inputs.transactions, Some(PathBuf::from("ledger.csv")));
                assert_eq!(inputs.valuations, None);
            }
            _ => panic!("expected report"),
        }
    }
}
