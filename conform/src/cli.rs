// conform/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "conform")]
#[command(about = "Rule-driven conformance engine for tabular audit records", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs one or more analytics over an input file
    Run {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Analytic id (repeat to run several over the same input)
        #[arg(long = "analytic", short = 'a', required = true)]
        analytics: Vec<String>,

        /// Input CSV file
        #[arg(long, short)]
        input: PathBuf,

        /// Output directory (default: project output_dir)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Evaluation instant, RFC 3339 or YYYY-MM-DD (default: now)
        #[arg(long, value_parser = parse_as_of)]
        as_of: Option<DateTime<Utc>>,

        /// Also write one report per group
        #[arg(long, default_value = "false")]
        individual_reports: bool,

        /// Upper bound, in seconds, on loading one reference table
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// 📋 Lists configured analytics (or the rule library)
    List {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// List registered rules instead of analytics
        #[arg(long, default_value = "false")]
        rules: bool,
    },

    /// 📚 Shows the freshness of every declared reference table
    References {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        #[arg(long, value_parser = parse_as_of)]
        as_of: Option<DateTime<Utc>>,
    },

    /// 🔎 Validates every analytic against the rule registry and reference catalog
    Check {
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}

pub fn parse_as_of(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("'{raw}' is neither RFC 3339 nor YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use chrono::TimeZone;
    use clap::Parser;

    #[test]
    fn test_cli_parse_run_defaults() -> Result<()> {
        let args = Cli::parse_from(["conform", "run", "-a", "77", "--input", "data.csv"]);
        match args.command {
            Commands::Run {
                project_dir,
                analytics,
                input,
                output,
                as_of,
                individual_reports,
                timeout_secs,
            } => {
                assert_eq!(project_dir.to_string_lossy(), ".");
                assert_eq!(analytics, vec!["77".to_string()]);
                assert_eq!(input.to_string_lossy(), "data.csv");
                assert_eq!(output, None);
                assert_eq!(as_of, None);
                assert!(!individual_reports);
                assert_eq!(timeout_secs, None);
                Ok(())
            }
            _ => bail!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_batch() -> Result<()> {
        let args = Cli::parse_from([
            "conform",
            "run",
            "--analytic",
            "77",
            "--analytic",
            "78",
            "-i",
            "in.csv",
            "--as-of",
            "2024-06-30",
            "--individual-reports",
            "--project-dir",
            "/tmp",
        ]);
        match args.command {
            Commands::Run {
                project_dir,
                analytics,
                as_of,
                individual_reports,
                ..
            } => {
                assert_eq!(project_dir.to_string_lossy(), "/tmp");
                assert_eq!(analytics.len(), 2);
                assert_eq!(as_of, Some(Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap()));
                assert!(individual_reports);
                Ok(())
            }
            _ => bail!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_run_requires_analytic() {
        assert!(Cli::try_parse_from(["conform", "run", "--input", "x.csv"]).is_err());
    }

    #[test]
    fn test_cli_parse_list_rules() -> Result<()> {
        let args = Cli::parse_from(["conform", "list", "--rules"]);
        match args.command {
            Commands::List { rules, .. } => {
                assert!(rules);
                Ok(())
            }
            _ => bail!("Expected List command"),
        }
    }

    #[test]
    fn test_as_of_formats() {
        assert!(parse_as_of("2024-06-30T12:00:00Z").is_ok());
        assert!(parse_as_of("2024-06-30").is_ok());
        assert!(parse_as_of("30/06/2024").is_err());
    }
}
