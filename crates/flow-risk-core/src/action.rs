use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::analysis::analyzer::{Analysis, RiskAnalyzer};
use crate::config::ActionConfig;
use crate::llm::LlmClient;
use crate::report::{no_risks_message, render_markdown};
use crate::source::load_source;

/// Values published for later workflow steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutputs {
    pub has_risks: bool,
    /// Set only when a report file was written.
    pub report_path: Option<PathBuf>,
    pub report_content: String,
}

impl ActionOutputs {
    /// Output names and their string values, in publication order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("has_risks", self.has_risks.to_string())];
        if let Some(path) = &self.report_path {
            pairs.push(("report_path", path.display().to_string()));
        }
        pairs.push(("report_content", self.report_content.clone()));
        pairs
    }

    /// Outputs in the `GITHUB_OUTPUT` file format.
    pub fn render(&self) -> String {
        self.pairs()
            .into_iter()
            .map(|(name, value)| format_output(name, &value))
            .collect()
    }

    /// Append every output to the file named by `GITHUB_OUTPUT`.
    pub fn write_github_output(&self, path: &Path) -> Result<()> {
        append(path, &self.render())
            .with_context(|| format!("failed to write action outputs to {}", path.display()))
    }
}

/// Result of one complete run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub analysis: Analysis,
    pub outputs: ActionOutputs,
}

/// Load the configured flow, analyze it and write the report when risks exist.
///
/// Input problems fail before the model is contacted.
#[instrument(skip_all, fields(file = %config.file_path.display()))]
pub async fn run_action<C: LlmClient>(config: &ActionConfig, client: &C) -> Result<ActionOutcome> {
    let source = load_source(&config.file_path)?;
    let analysis = RiskAnalyzer::new(client, &config.prompt_template, config.debug_replies)
        .analyze(&source)
        .await?;

    let outputs = if analysis.has_risks() {
        let content = render_markdown(&analysis.file_name, &analysis.risks);
        write_report(&config.report_path, &content)?;
        info!(
            path = %config.report_path.display(),
            risks = analysis.risks.len(),
            "wrote risk report"
        );
        ActionOutputs {
            has_risks: true,
            report_path: Some(config.report_path.clone()),
            report_content: content,
        }
    } else {
        info!("no risks found");
        ActionOutputs {
            has_risks: false,
            report_path: None,
            report_content: no_risks_message(&analysis.file_name),
        }
    };

    Ok(ActionOutcome { analysis, outputs })
}

/// Append markdown to the job summary file named by `GITHUB_STEP_SUMMARY`.
pub fn append_step_summary(path: &Path, markdown: &str) -> Result<()> {
    append(path, &format!("{markdown}\n"))
        .with_context(|| format!("failed to append job summary to {}", path.display()))
}

/// Severity of a workflow command annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Notice,
}

impl Level {
    fn command(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
        }
    }
}

/// Workflow command line such as `::warning::message`.
pub fn annotation(level: Level, message: &str) -> String {
    format!("::{}::{}", level.command(), escape_command_data(message))
}

fn escape_command_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn format_output(name: &str, value: &str) -> String {
    if !value.contains('\n') && !value.contains('\r') {
        return format!("{name}={value}\n");
    }
    let mut delimiter = String::from("ghadelimiter_flow_risk");
    let mut attempt = 0u32;
    while value.contains(&delimiter) {
        attempt += 1;
        delimiter = format!("ghadelimiter_flow_risk_{attempt}");
    }
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create report directory {}", parent.display()))?;
    }
    fs::write(path, content)
        .with_context(|| format!("failed to write report to {}", path.display()))
}

fn append(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())
}
