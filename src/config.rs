use std::fs;
use std::path::Path;

use crate::cli::{collect_targets, CommonArgs};
use crate::error::{Error, Result};
use crate::models::{DeployConfig, VerifierConfig};

pub fn load_config(path: &Path) -> Result<VerifierConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "failed to read config '{}': {}",
            path.display(),
            err
        ))
    })?;
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .unwrap_or("");

    match ext {
        "toml" => toml::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse TOML: {}", err))),
        "json" => serde_json::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse JSON: {}", err))),
        "" => Err(Error::UnsupportedConfigFormat("unknown".to_string())),
        _ => Err(Error::UnsupportedConfigFormat(ext.to_string())),
    }
}

/// Defaults, then the config file, then command-line overrides.
pub fn build_config(args: &CommonArgs) -> Result<VerifierConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => VerifierConfig::default(),
    };

    if let Some(targets) = collect_targets(args.targets.as_deref(), &args.target)? {
        config.targets = targets;
    }
    if let Some(front_door) = &args.front_door {
        config.probe.front_door = front_door.clone();
    }
    if let Some(field) = &args.instance_field {
        config.probe.instance_field = field.clone();
    }
    if let Some(trials) = args.trials {
        config.probe.trials = trials;
    }
    if let Some(delay) = args.trial_delay_ms {
        config.probe.trial_delay_ms = delay;
    }
    if let Some(timeout) = args.probe_timeout_secs {
        config.probe.timeout_secs = timeout;
    }
    if let Some(attempts) = args.attempts {
        config.poll.attempts = attempts;
    }
    if let Some(step) = args.backoff_step_secs {
        config.poll.backoff_step_secs = step;
    }
    if let Some(cap) = args.backoff_cap_secs {
        config.poll.backoff_cap_secs = cap;
    }
    if let Some(timeout) = args.timeout_secs {
        config.poll.timeout_secs = timeout;
        config.poll.one_shot_timeout_secs = timeout;
    }
    if args.parallel {
        config.poll.parallel = true;
    }

    Ok(config)
}

/// Checks everything a probe needs.
pub fn validate_probe(config: &VerifierConfig) -> Result<()> {
    validate_url(&config.probe.front_door)?;
    if config.probe.instance_field.trim().is_empty() {
        return Err(Error::EmptyInstanceField);
    }
    if config.probe.trials == 0 {
        return Err(Error::TrialsZero);
    }
    if config.probe.timeout_secs == 0 {
        return Err(Error::TimeoutZero("probe"));
    }
    Ok(())
}

/// Checks everything a full verification needs.
pub fn validate_config(config: &VerifierConfig) -> Result<()> {
    if config.targets.is_empty() {
        return Err(Error::EmptyTargets);
    }

    let mut names = std::collections::HashSet::new();
    for target in &config.targets {
        if target.name.trim().is_empty() || target.url.trim().is_empty() {
            return Err(Error::InvalidTargetEntry(format!(
                "{}={}",
                target.name, target.url
            )));
        }
        if !names.insert(target.name.as_str()) {
            return Err(Error::DuplicateTargetName(target.name.clone()));
        }
        validate_url(&target.url)?;
    }
    if !config.targets.iter().any(|target| target.critical) {
        return Err(Error::NoCriticalTargets);
    }

    if config.poll.attempts == 0 {
        return Err(Error::AttemptsZero);
    }
    if config.poll.timeout_secs == 0 || config.poll.one_shot_timeout_secs == 0 {
        return Err(Error::TimeoutZero("health check"));
    }

    validate_probe(config)
}

pub fn validate_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(Error::InvalidUrl(url.to_string())),
    }
}

/// Required artifacts must be present before anything is deployed.
pub fn preflight(deploy: &DeployConfig) -> Result<()> {
    if deploy.compose_command.is_empty() {
        return Err(Error::EmptyComposeCommand);
    }
    std::iter::once(&deploy.compose_file)
        .chain(deploy.required_artifacts.iter())
        .try_for_each(|path| {
            if path.exists() {
                Ok(())
            } else {
                Err(Error::MissingArtifact(path.display().to_string()))
            }
        })
}
