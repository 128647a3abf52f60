//! Audit command handler.

use tabled::Tabled;
use unifly_audit::{AuditReport, Finding, Severity};

use crate::cli::AuditArgs;
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

/// Affected entities shown per row before collapsing to a count.
const AFFECTED_PREVIEW: usize = 3;

// ── Finding table row ───────────────────────────────────────────────

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Rule")]
    rule: String,
    #[tabled(rename = "Finding")]
    title: String,
    #[tabled(rename = "Affected")]
    affected: String,
}

impl FindingRow {
    fn new(f: &Finding, color: bool) -> Self {
        Self {
            severity: output::severity_label(f.severity, color),
            kind: f.kind.to_string(),
            rule: f.rule_id.clone(),
            title: f.title.clone(),
            affected: affected_summary(f),
        }
    }
}

fn affected_summary(f: &Finding) -> String {
    let mut shown: Vec<String> = f
        .affected
        .iter()
        .take(AFFECTED_PREVIEW)
        .map(ToString::to_string)
        .collect();
    if f.affected.len() > AFFECTED_PREVIEW {
        shown.push(format!("+{} more", f.affected.len() - AFFECTED_PREVIEW));
    }
    output::join_or_dash(shown)
}

fn report_detail(r: &AuditReport, color: bool) -> String {
    let mut lines = Vec::new();
    if r.findings.is_empty() {
        lines.push("No findings.".to_owned());
    } else {
        let rows: Vec<FindingRow> = r.findings.iter().map(|f| FindingRow::new(f, color)).collect();
        lines.push(output::render_table(&rows));
    }
    lines.push(String::new());
    lines.push(format!("Score:     {}", output::score_label(r.score, color)));
    lines.push(format!(
        "Findings:  {} ({} critical, {} recommended, {} informational)",
        r.findings.len(),
        r.count(Severity::Critical),
        r.count(Severity::Recommended),
        r.count(Severity::Informational),
    ));
    if !r.failed_rules.is_empty() {
        let failed: Vec<&str> = r.failed_rules.iter().map(|f| f.rule_id.as_str()).collect();
        lines.push(format!("Failed:    {}", failed.join(", ")));
    }
    lines.push(format!(
        "Generated: {}",
        r.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    lines.join("\n")
}

fn report_plain(r: &AuditReport) -> String {
    r.findings
        .iter()
        .map(|f| format!("{}\t{}\t{}", f.severity, f.rule_id, f.title))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &AuditArgs, settings: &Settings) -> Result<(), CliError> {
    let snapshot = util::read_snapshot(&args.input.snapshot)?;
    let auditor = util::auditor(settings, &args.disable)?;
    let mut report = auditor.run(&snapshot);

    // Threshold is checked before display filtering so hidden findings still count.
    let breach = args.fail_on.map(util::severity).and_then(|threshold| {
        let count = report
            .findings
            .iter()
            .filter(|f| f.severity >= threshold)
            .count();
        (count > 0).then_some((threshold, count))
    });

    if let Some(min) = args.min_severity.map(util::severity) {
        report.findings.retain(|f| f.severity >= min);
    }

    let color = output::should_color(settings.color);
    let out = output::render_single(
        settings.output,
        &report,
        |r| report_detail(r, color),
        report_plain,
    );
    output::print_output(&out, settings.quiet);

    match breach {
        Some((threshold, count)) => Err(CliError::FindingsThreshold {
            count,
            threshold: threshold.to_string(),
        }),
        None => Ok(()),
    }
}
