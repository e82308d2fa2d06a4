use std::{
    collections::HashMap,
    env,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flow_risk_core::{
    action::append_step_summary, analysis::analyzer::render_prompt, annotation,
    report::render_table, run_action, ActionConfig, ActionOutcome, AnthropicClient, FileConfig,
    Level,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "flow-risk",
    author,
    version,
    about = "Deployment risk analysis for Salesforce Flow XML"
)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON) supplying action inputs
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Flow XML file to analyze (overrides INPUT_FILE_PATH)
    #[arg(long, value_name = "PATH", global = true)]
    file: Option<PathBuf>,

    /// Where to write the markdown report (overrides INPUT_REPORT_PATH)
    #[arg(long = "report-path", value_name = "PATH", global = true)]
    report_path: Option<PathBuf>,

    /// Skip printing the console table
    #[arg(long, global = true)]
    no_table: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Commands {
    /// Send the flow to the model and publish the risk report
    Analyze,
    /// Print the prompt that would be sent, without calling the model
    Prompt,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{}", annotation(Level::Error, &format!("{err:#}")));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    match cli.command.unwrap_or(Commands::Analyze) {
        Commands::Analyze => analyze(&config, cli.no_table).await,
        Commands::Prompt => print_prompt(&config),
    }
}

fn load_config(cli: &Cli) -> Result<ActionConfig> {
    let file = load_file_config(cli.config.as_deref())?;
    let mut vars: HashMap<String, String> = env::vars().collect();
    if let Some(path) = &cli.file {
        vars.insert("INPUT_FILE_PATH".into(), path.display().to_string());
    }
    if let Some(path) = &cli.report_path {
        vars.insert("INPUT_REPORT_PATH".into(), path.display().to_string());
    }
    Ok(ActionConfig::from_map(vars, file)?)
}

fn load_file_config(path: Option<&Path>) -> Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .and_then(|settings| settings.try_deserialize::<FileConfig>())
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

async fn analyze(config: &ActionConfig, no_table: bool) -> Result<()> {
    let client = AnthropicClient::new(&config.llm)?;
    info!(model = client.model(), "analyzing {}", config.file_path.display());
    let outcome = run_action(config, &client).await?;

    if let Some(warning) = &outcome.analysis.warning {
        println!("{}", annotation(Level::Warning, &warning.to_string()));
    }
    if outcome.outputs.has_risks {
        if !no_table {
            println!("{}", render_table(&outcome.analysis.risks));
        }
    } else {
        println!(
            "{}",
            annotation(Level::Notice, &outcome.outputs.report_content)
        );
    }

    publish(&outcome)
}

fn publish(outcome: &ActionOutcome) -> Result<()> {
    match env_path("GITHUB_OUTPUT") {
        Some(path) => outcome.outputs.write_github_output(&path)?,
        None => print!("{}", outcome.outputs.render()),
    }
    if let Some(path) = env_path("GITHUB_STEP_SUMMARY") {
        append_step_summary(&path, &outcome.outputs.report_content)?;
    }
    Ok(())
}

fn print_prompt(config: &ActionConfig) -> Result<()> {
    let source = flow_risk_core::load_source(&config.file_path)?;
    println!("{}", render_prompt(&config.prompt_template, &source)?);
    Ok(())
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
