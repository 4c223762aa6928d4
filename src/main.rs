//! QueryGate - ask a SQLite database questions in plain language.

mod cli;
mod repl;

use cli::Cli;
use querygate::config::Config;
use querygate::error::Result;
use querygate::llm::factory::ollama_config;
use querygate::llm::{LlmProvider, OllamaClient};
use querygate::logging;
use querygate::pipeline::{Orchestrator, PipelineOutcome};
use repl::Repl;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Runs the session; returns false if a one-shot question failed.
async fn run(cli: Cli) -> Result<bool> {
    let config = load_config(&cli)?;

    if config.llm.provider()? == LlmProvider::Ollama {
        let probe = OllamaClient::new(ollama_config(&config.llm))?;
        if !probe.is_available().await {
            warn!(
                "Ollama is not reachable at {}; questions will fail until it is running",
                config.llm.base_url
            );
        }
    }

    let orchestrator = Orchestrator::connect(&config).await?;
    info!(
        "Connected to {} using model {}",
        config.store.path.display(),
        config.llm.model
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut repl = Repl::new(orchestrator, stdin, std::io::stdout());

    let succeeded = match cli.question.as_deref() {
        Some(question) => {
            let outcome = repl.ask(question).await?;
            !matches!(outcome, PipelineOutcome::Failed { .. })
        }
        None => {
            repl.run().await?;
            true
        }
    };

    let (orchestrator, _) = repl.into_parts();
    orchestrator.close().await?;

    Ok(succeeded)
}

/// Loads configuration with precedence: CLI flags, environment, config file, defaults.
fn load_config(cli: &Cli) -> Result<Config> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());

    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_overrides();
    cli.apply_to(&mut config);
    config.validate()?;

    Ok(config)
}
