use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use super::{normalize_reply, ReplyWarning, RiskRecord};
use crate::flow_xml::{to_prompt_json, xml_to_json};
use crate::llm::LlmClient;
use crate::prompt::build_prompt;
use crate::source::SourceFile;

/// Outcome of analyzing one flow file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub file_name: String,
    pub risks: Vec<RiskRecord>,
    pub warning: Option<ReplyWarning>,
}

impl Analysis {
    pub fn has_risks(&self) -> bool {
        !self.risks.is_empty()
    }
}

/// Sends a flow definition to a model and normalizes what comes back.
pub struct RiskAnalyzer<'a, C: LlmClient> {
    client: &'a C,
    template: &'a str,
    debug_replies: bool,
}

impl<'a, C: LlmClient> RiskAnalyzer<'a, C> {
    /// `debug_replies` logs each raw model reply at warn level.
    pub fn new(client: &'a C, template: &'a str, debug_replies: bool) -> Self {
        Self {
            client,
            template,
            debug_replies,
        }
    }

    pub fn render_prompt(&self, source: &SourceFile) -> Result<String> {
        render_prompt(self.template, source)
    }

    #[instrument(skip_all, fields(file = %source.name))]
    pub async fn analyze(&self, source: &SourceFile) -> Result<Analysis> {
        let prompt = self.render_prompt(source)?;
        debug!(prompt_chars = prompt.chars().count(), "sending prompt to model");

        let reply = self
            .client
            .complete(&prompt)
            .await
            .context("model request failed")?;
        if self.debug_replies {
            tracing::warn!("raw model reply: {}", reply);
        }

        let normalized = normalize_reply(&reply);
        info!(risks = normalized.risks.len(), "analysis complete");
        Ok(Analysis {
            file_name: source.name.clone(),
            risks: normalized.risks,
            warning: normalized.warning,
        })
    }
}

/// Build the prompt for `source` without contacting the model.
pub fn render_prompt(template: &str, source: &SourceFile) -> Result<String> {
    let structure = xml_to_json(&source.content)
        .with_context(|| format!("failed to convert {} for prompting", source.name))?;
    let flow_json = to_prompt_json(&structure)?;
    Ok(build_prompt(template, &flow_json))
}
