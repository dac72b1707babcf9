//! Human-readable run reports.

use std::fmt::Write;

use conductor::exec::RunReport;
use conductor::flow0::{Outcome, WiringReport};

/// Render a run as text: a status line, one line per attempt, the error
/// if any, then the final context as pretty JSON.
pub fn render_run(report: &RunReport) -> String {
    let mut out = String::new();
    let status = if report.is_completed() {
        "completed"
    } else {
        "failed"
    };
    let _ = writeln!(
        out,
        "run {} of {}: {status}",
        report.run_id, report.workflow
    );
    for entry in report.trace.entries() {
        let outcome = match &entry.outcome {
            Outcome::Success => "ok".to_string(),
            Outcome::Failure(f) => match &f.cause {
                Some(cause) => format!("failed ({}/{cause}): {}", f.kind, f.message),
                None => format!("failed ({}): {}", f.kind, f.message),
            },
        };
        let _ = writeln!(
            out,
            "  {}. {} [attempt {}] {} in {}",
            entry.index + 1,
            entry.step,
            entry.attempt,
            outcome,
            entry.latency
        );
    }
    if let Some(error) = &report.error {
        let _ = writeln!(out, "error: {error}");
    }
    let context = report.context.snapshot().to_value().to_json();
    let pretty = serde_json::to_string_pretty(&context).unwrap_or_else(|_| context.to_string());
    let _ = writeln!(out, "context:\n{pretty}");
    out
}

/// Render a wiring check.
pub fn render_check(workflow: &str, report: &WiringReport) -> String {
    if report.is_clean() {
        return format!("{workflow}: wiring ok\n");
    }
    let mut out = format!("{workflow}: {} wiring issue(s)\n", report.issues.len());
    for issue in &report.issues {
        let _ = writeln!(out, "  - {issue}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use conductor::flow0::{StepName, WiringIssue};

    #[test]
    fn clean_check() {
        assert_eq!(
            render_check("wf", &WiringReport::default()),
            "wf: wiring ok\n"
        );
    }

    #[test]
    fn issues_are_listed() {
        let report = WiringReport {
            issues: vec![WiringIssue::UnsatisfiedInput {
                step: StepName::new("summarize"),
                key: "metrics".into(),
            }],
        };
        assert_eq!(
            render_check("wf", &report),
            "wf: 1 wiring issue(s)\n  - summarize: input metrics is not available\n"
        );
    }
}
