pub mod action;
pub mod analysis;
pub mod config;
pub mod flow_xml;
pub mod llm;
pub mod prompt;
pub mod report;
pub mod source;

pub use action::{annotation, run_action, ActionOutcome, ActionOutputs, Level};
pub use analysis::{
    analyzer::{Analysis, RiskAnalyzer},
    normalize_reply, AnalysisResult, Normalized, ReplyWarning, RiskRecord,
};
pub use config::{ActionConfig, ConfigError, FileConfig, DEFAULT_REPORT_PATH};
pub use llm::{AnthropicClient, LlmClient, LlmSettings};
pub use source::{load_source, LoadError, SourceFile};
