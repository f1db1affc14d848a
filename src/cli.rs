use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::models::TargetConfig;

const OPTIONAL_SUFFIX: &str = ":optional";

#[derive(Parser, Debug)]
#[command(
    name = "deploy-verify",
    about = "Readiness and load-distribution verifier for a replicated service fleet",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Optionally (re)deploy the fleet, wait for readiness, probe the front door and report
    Run(RunArgs),
    /// Single sweep plus probe, never deploys
    Check(CommonArgs),
    /// Probe the front door only
    Probe(CommonArgs),
    /// Print the merged configuration
    ShowConfig(CommonArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    /// Tear the fleet down (volumes included) before bringing it up
    #[arg(long)]
    pub clean: bool,
    /// Bring the fleet up before checking
    #[arg(long)]
    pub deploy: bool,
    /// Do not rebuild images when bringing the fleet up
    #[arg(long)]
    pub skip_build: bool,
    /// Single sweep instead of waiting for readiness
    #[arg(long)]
    pub once: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// TOML or JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Comma separated name=url[:optional] entries
    #[arg(long)]
    pub targets: Option<String>,
    /// Repeatable name=url[:optional] entry
    #[arg(long = "target")]
    pub target: Vec<String>,
    #[arg(long)]
    pub front_door: Option<String>,
    #[arg(long)]
    pub instance_field: Option<String>,
    #[arg(long)]
    pub trials: Option<u32>,
    #[arg(long)]
    pub trial_delay_ms: Option<u64>,
    #[arg(long)]
    pub attempts: Option<u32>,
    #[arg(long)]
    pub backoff_step_secs: Option<u64>,
    #[arg(long)]
    pub backoff_cap_secs: Option<u64>,
    /// Per-call timeout for health checks
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    #[arg(long)]
    pub probe_timeout_secs: Option<u64>,
    /// Check targets concurrently within a sweep
    #[arg(long)]
    pub parallel: bool,
    #[arg(long, value_enum, default_value_t = FormatArg::Human)]
    pub format: FormatArg,
    /// Per-target details and debug logging
    #[arg(long, short)]
    pub verbose: bool,
    #[arg(long)]
    pub no_color: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    #[default]
    Human,
    Summary,
    Json,
}

pub fn parse_args() -> Result<Cli> {
    match Cli::try_parse() {
        Ok(cli) => Ok(cli),
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => Err(Error::Cli(err.to_string())),
    }
}

/// Collects `--targets` and `--target` entries. `None` means neither flag
/// was given and the configured targets stand.
pub fn collect_targets(csv: Option<&str>, entries: &[String]) -> Result<Option<Vec<TargetConfig>>> {
    let mut raw: Vec<&str> = Vec::new();

    if let Some(csv) = csv {
        if !csv.trim().is_empty() {
            raw.extend(csv.split(','));
        } else if entries.is_empty() {
            return Err(Error::EmptyTargets);
        }
    }
    raw.extend(entries.iter().map(String::as_str));

    if csv.is_none() && entries.is_empty() {
        return Ok(None);
    }
    parse_targets(&raw).map(Some)
}

pub fn parse_targets(entries: &[&str]) -> Result<Vec<TargetConfig>> {
    let mut targets = Vec::with_capacity(entries.len());
    let mut names = HashSet::new();

    for entry in entries {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyTargetEntry);
        }

        let (name, rest) = trimmed
            .split_once('=')
            .ok_or_else(|| Error::InvalidTargetEntry(trimmed.to_string()))?;
        let name = name.trim();
        let (url, critical) = match rest.trim().strip_suffix(OPTIONAL_SUFFIX) {
            Some(url) => (url.trim(), false),
            None => (rest.trim(), true),
        };
        if name.is_empty() || url.is_empty() {
            return Err(Error::InvalidTargetEntry(trimmed.to_string()));
        }
        if !names.insert(name.to_string()) {
            return Err(Error::DuplicateTargetName(name.to_string()));
        }

        targets.push(TargetConfig {
            name: name.to_string(),
            url: url.to_string(),
            critical,
        });
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_targets_accepts_valid_list() {
        let targets =
            parse_targets(&["api=http://api:8000/health", " lb = http://localhost/health "])
                .unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].name, "api");
        assert_eq!(targets[0].url, "http://api:8000/health");
        assert!(targets[0].critical);
        assert_eq!(targets[1].name, "lb");
        assert_eq!(targets[1].url, "http://localhost/health");
    }

    #[test]
    fn parse_targets_reads_optional_suffix() {
        let targets = parse_targets(&["docs=http://docs:9000/health:optional"]).unwrap();
        assert_eq!(targets[0].url, "http://docs:9000/health");
        assert!(!targets[0].critical);
    }

    #[test]
    fn parse_targets_rejects_invalid_format() {
        assert!(parse_targets(&["api"]).is_err());
        assert!(parse_targets(&["=http://api/health"]).is_err());
        assert!(parse_targets(&["api="]).is_err());
        assert!(parse_targets(&["api=:optional"]).is_err());
    }

    #[test]
    fn parse_targets_rejects_duplicate_names() {
        let err = parse_targets(&["api=http://a/health", "api=http://b/health"]).unwrap_err();
        assert_eq!(err.to_string(), "duplicate target name 'api'");
    }

    #[test]
    fn collect_targets_rejects_empty_segments() {
        let err = collect_targets(Some("a=http://a/health,,b=http://b/health"), &[]).unwrap_err();
        assert_eq!(err.to_string(), "targets must not contain empty entries");
    }

    #[test]
    fn collect_targets_rejects_whitespace_only_csv() {
        let err = collect_targets(Some(" "), &[]).unwrap_err();
        assert_eq!(err.to_string(), "targets must not be empty");
    }

    #[test]
    fn collect_targets_merges_csv_and_repeated_flags() {
        let targets = collect_targets(
            Some("a=http://a/health"),
            &["b=http://b/health".to_string()],
        )
        .unwrap()
        .unwrap();
        let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn collect_targets_allows_empty_csv_with_entries() {
        let targets = collect_targets(Some(""), &["web=http://web/health".to_string()])
            .unwrap()
            .unwrap();
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn collect_targets_without_flags_keeps_configuration() {
        assert!(collect_targets(None, &[]).unwrap().is_none());
    }
}
