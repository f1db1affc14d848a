use serde_json::json;
use std::fmt::Write;

use crate::error::{Error, Result};
use crate::models::VerifierConfig;
use crate::prober::{classify, ProbeRun};
use crate::report::{LbStatus, StatusTier, SystemReport};
use crate::state::{DistributionOutcome, HealthOutcome, HealthResult, ProbeSample};
use crate::verifier::{PollMode, Verification};

/// Presentation switches, passed explicitly to whoever renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub color: bool,
    pub verbose: bool,
}

pub trait Formatter {
    fn write(&self, verification: &Verification) -> Result<String>;
    fn write_probe(&self, front_door: &str, run: &ProbeRun) -> Result<String>;
}

pub struct HumanFormatter {
    options: OutputOptions,
    palette: Palette,
}

pub struct SummaryFormatter;

pub struct JsonFormatter;

#[derive(Clone, Copy)]
struct Palette {
    green: &'static str,
    red: &'static str,
    yellow: &'static str,
    bold: &'static str,
    reset: &'static str,
}

impl Palette {
    fn new(color: bool) -> Self {
        if color {
            Self {
                green: "\x1b[32m",
                red: "\x1b[31m",
                yellow: "\x1b[33m",
                bold: "\x1b[1m",
                reset: "\x1b[0m",
            }
        } else {
            Self {
                green: "",
                red: "",
                yellow: "",
                bold: "",
                reset: "",
            }
        }
    }

    fn tier(&self, tier: StatusTier) -> &'static str {
        match tier {
            StatusTier::Perfect | StatusTier::Excellent => self.green,
            StatusTier::Good => self.yellow,
            StatusTier::NeedsAttention => self.red,
        }
    }

    fn lb(&self, status: LbStatus) -> &'static str {
        match status {
            LbStatus::Working => self.green,
            LbStatus::Partial => self.yellow,
            LbStatus::NotWorking => self.red,
        }
    }
}

impl HumanFormatter {
    pub fn new(options: OutputOptions) -> Self {
        Self {
            options,
            palette: Palette::new(options.color),
        }
    }

    fn target_line(&self, out: &mut String, result: &HealthResult) {
        let p = self.palette;
        let (mark, color) = match result.outcome {
            HealthOutcome::Healthy if result.is_degraded() => ("!", p.yellow),
            HealthOutcome::Healthy => ("✔", p.green),
            HealthOutcome::Unhealthy | HealthOutcome::Timeout => ("✖", p.red),
        };
        let code = match (result.outcome, result.http_status) {
            (HealthOutcome::Timeout, _) => "timeout".to_string(),
            (_, Some(code)) => code.to_string(),
            (_, None) => "error".to_string(),
        };
        let _ = write!(
            out,
            "  {color}{mark}{reset} {:<24} {:>7} {:>6}ms",
            result.target.name,
            code,
            result.latency.as_millis(),
            reset = p.reset,
        );
        if result.is_degraded() {
            let _ = write!(out, "  {}(reports degraded){}", p.yellow, p.reset);
        }
        out.push('\n');

        if self.options.verbose {
            if let Some(error) = &result.error {
                let _ = writeln!(out, "      error: {}", error);
            }
            if let Some(details) = &result.details {
                let placeholder = "-";
                let _ = writeln!(
                    out,
                    "      status: {} | instance: {} | database: {}",
                    details.status.as_deref().unwrap_or(placeholder),
                    details.instance_id.as_deref().unwrap_or(placeholder),
                    details.database.as_deref().unwrap_or(placeholder),
                );
                if !details.services.is_empty() {
                    let services: Vec<String> =
                        details.services.iter().map(ToString::to_string).collect();
                    let _ = writeln!(out, "      services: {}", services.join(", "));
                }
                if !details.circuit_breakers.is_empty() {
                    let breakers: Vec<String> = details
                        .circuit_breakers
                        .iter()
                        .map(|(name, state)| format!("{}={}", name, state))
                        .collect();
                    let _ = writeln!(out, "      circuit breakers: {}", breakers.join(", "));
                }
            }
        }
    }

    fn probe_lines(
        &self,
        out: &mut String,
        front_door: &str,
        samples: &[ProbeSample],
        outcome: &DistributionOutcome,
    ) {
        let p = self.palette;
        let _ = writeln!(out, "{}Load distribution{} ({})", p.bold, p.reset, front_door);
        for sample in samples {
            let color = if sample.is_failed() { p.red } else { p.reset };
            let _ = writeln!(
                out,
                "  trial {} -> {}{}{}",
                sample.trial_index, color, sample.instance_id, p.reset
            );
        }
        let status = classify(outcome);
        let _ = writeln!(
            out,
            "  {}{}{} ({} distinct instances, {} failed trials)",
            p.lb(status),
            status,
            p.reset,
            outcome.distinct_instances.len(),
            outcome.failed_count
        );
    }

    fn suggestions(&self, verification: &Verification) -> Vec<String> {
        let report = &verification.report;
        let mut hints = Vec::new();
        for result in verification.failing_critical() {
            let hint = match result.outcome {
                HealthOutcome::Timeout => format!(
                    "{}: no answer within the timeout; check its startup time or raise --timeout-secs",
                    result.target.name
                ),
                _ => format!(
                    "{}: inspect its container logs and port mapping ({})",
                    result.target.name, result.target.url
                ),
            };
            hints.push(hint);
        }
        if !report.converged && verification.mode == PollMode::WaitForReady {
            hints.push(format!(
                "readiness not reached after {} attempts; raise --attempts if the fleet starts slowly",
                report.attempts
            ));
        }
        match report.lb_status {
            LbStatus::Working => {}
            LbStatus::Partial => hints.push(
                "traffic reaches a single instance; check the proxy upstream list and replica count"
                    .to_string(),
            ),
            LbStatus::NotWorking => hints.push(format!(
                "front door {} never answered; check the proxy container and its port mapping",
                verification.front_door
            )),
        }
        hints
    }
}

impl Formatter for HumanFormatter {
    fn write(&self, verification: &Verification) -> Result<String> {
        let p = self.palette;
        let report = &verification.report;
        let mut out = String::new();

        let _ = writeln!(out, "{}Deployment health verification{}", p.bold, p.reset);
        let mode = match verification.mode {
            PollMode::WaitForReady => "wait-for-ready",
            PollMode::OneShot => "one-shot",
        };
        let _ = writeln!(out, "Mode: {} ({} sweeps)", mode, report.attempts);

        let _ = writeln!(out, "{}Critical targets{}", p.bold, p.reset);
        for result in verification.targets.iter().filter(|r| r.target.critical) {
            self.target_line(&mut out, result);
        }
        if verification.targets.iter().any(|r| !r.target.critical) {
            let _ = writeln!(out, "{}Informational targets{}", p.bold, p.reset);
            for result in verification.targets.iter().filter(|r| !r.target.critical) {
                self.target_line(&mut out, result);
            }
        }

        self.probe_lines(
            &mut out,
            &verification.front_door,
            &verification.samples,
            &verification.distribution,
        );

        let _ = writeln!(out, "{}Summary{}", p.bold, p.reset);
        let _ = writeln!(
            out,
            "  healthy: {}/{} ({:.1}%)",
            report.healthy_count, report.total, report.health_percentage
        );
        let _ = writeln!(
            out,
            "  tier: {}{}{}",
            p.tier(report.status_tier),
            report.status_tier,
            p.reset
        );
        let _ = writeln!(
            out,
            "  load balancing: {}{}{}",
            p.lb(report.lb_status),
            report.lb_status,
            p.reset
        );
        let _ = writeln!(out, "  elapsed: {:.2}s", report.elapsed.as_secs_f64());

        let hints = self.suggestions(verification);
        if !hints.is_empty() {
            let _ = writeln!(out, "{}Suggestions{}", p.bold, p.reset);
            for hint in hints {
                let _ = writeln!(out, "  - {}", hint);
            }
        }

        let verdict = if report.success {
            format!("{}Verdict: all systems operational{}", p.green, p.reset)
        } else {
            format!("{}Verdict: deployment needs attention{}", p.red, p.reset)
        };
        let _ = writeln!(out, "{}", verdict);
        Ok(out)
    }

    fn write_probe(&self, front_door: &str, run: &ProbeRun) -> Result<String> {
        let mut out = String::new();
        self.probe_lines(&mut out, front_door, &run.samples, &run.outcome);
        Ok(out)
    }
}

impl Formatter for SummaryFormatter {
    fn write(&self, verification: &Verification) -> Result<String> {
        let report = &verification.report;
        let mut out = summary_lines(report);
        let failing: Vec<&str> = verification
            .failing_critical()
            .map(|result| result.target.name.as_str())
            .collect();
        if !failing.is_empty() {
            let _ = writeln!(out, "failing: {}", failing.join(","));
        }
        Ok(out)
    }

    fn write_probe(&self, _front_door: &str, run: &ProbeRun) -> Result<String> {
        let instances: Vec<&str> = run
            .outcome
            .distinct_instances
            .iter()
            .map(String::as_str)
            .collect();
        let mut out = String::new();
        let _ = writeln!(out, "lb_status: {}", run.lb_status());
        let _ = writeln!(out, "instances: {}", instances.join(","));
        let _ = writeln!(out, "failed_trials: {}", run.outcome.failed_count);
        Ok(out)
    }
}

fn summary_lines(report: &SystemReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "healthy: {}/{}", report.healthy_count, report.total);
    let _ = writeln!(out, "health_percentage: {:.1}", report.health_percentage);
    let _ = writeln!(out, "status_tier: {}", report.status_tier);
    let _ = writeln!(out, "lb_status: {}", report.lb_status);
    let _ = writeln!(out, "distinct_instances: {}", report.distinct_instances);
    let _ = writeln!(out, "failed_trials: {}", report.failed_trials);
    let _ = writeln!(out, "attempts: {}", report.attempts);
    let _ = writeln!(out, "converged: {}", report.converged);
    let _ = writeln!(out, "success: {}", report.success);
    out
}

impl Formatter for JsonFormatter {
    fn write(&self, verification: &Verification) -> Result<String> {
        to_json(verification)
    }

    fn write_probe(&self, front_door: &str, run: &ProbeRun) -> Result<String> {
        to_json(&json!({
            "front_door": front_door,
            "lb_status": run.lb_status(),
            "distribution": run.outcome,
            "samples": run.samples,
        }))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map(|mut text| {
            text.push('\n');
            text
        })
        .map_err(|err| Error::Serialize(err.to_string()))
}

/// Color only for a terminal, and never when `--no-color` or `NO_COLOR` is set.
pub fn color_enabled(no_color_flag: bool, no_color_env: bool, is_terminal: bool) -> bool {
    !no_color_flag && !no_color_env && is_terminal
}

pub fn write_config(config: &VerifierConfig, json: bool) -> Result<String> {
    if json {
        return to_json(config);
    }
    let mut out = String::new();
    let _ = writeln!(out, "Front door: {}", config.probe.front_door);
    let _ = writeln!(out, "Instance field: {}", config.probe.instance_field);
    let _ = writeln!(
        out,
        "Trials: {} (delay: {}ms, timeout: {}s)",
        config.probe.trials, config.probe.trial_delay_ms, config.probe.timeout_secs
    );
    let _ = writeln!(
        out,
        "Attempts: {} (backoff: {}s step, {}s cap, timeout: {}s)",
        config.poll.attempts,
        config.poll.backoff_step_secs,
        config.poll.backoff_cap_secs,
        config.poll.timeout_secs
    );
    let _ = writeln!(out, "Targets:");
    for target in &config.targets {
        let kind = if target.critical {
            "critical"
        } else {
            "optional"
        };
        let _ = writeln!(out, "- {} {} ({})", target.name, target.url, kind);
    }
    Ok(out)
}
