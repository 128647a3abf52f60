//! Built-in rule listing.

use serde::Serialize;
use tabled::Tabled;

use crate::config::Settings;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct RuleInfo {
    id: &'static str,
    description: &'static str,
    enabled: bool,
}

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Rule")]
    id: &'static str,
    #[tabled(rename = "Enabled")]
    enabled: &'static str,
    #[tabled(rename = "Description")]
    description: &'static str,
}

impl From<&RuleInfo> for RuleRow {
    fn from(r: &RuleInfo) -> Self {
        Self {
            id: r.id,
            enabled: if r.enabled { "yes" } else { "no" },
            description: r.description,
        }
    }
}

pub fn handle(settings: &Settings) -> Result<(), CliError> {
    let disabled = &settings.config.audit.disabled_rules;
    let rules: Vec<RuleInfo> = unifly_audit::default_rules()
        .describe()
        .into_iter()
        .map(|(id, description)| RuleInfo {
            id,
            description,
            enabled: !disabled.contains(id),
        })
        .collect();

    let out = output::render_list(settings.output, &rules, |r| RuleRow::from(r), |r| r.id.into());
    output::print_output(&out, settings.quiet);
    Ok(())
}
