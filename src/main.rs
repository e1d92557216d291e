use sv2_wizard::config::WizardConfig;
use sv2_wizard::deploy::DirectorySink;
use sv2_wizard::terminal::TerminalFrontEnd;
use sv2_wizard::wizard::{WizardEngine, flows};
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Prompts own stdout; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = WizardConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    eprintln!("⛏  SV2 Wizard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Flow: {}", config.flow);
    eprintln!("   Output: {}", config.output_dir.display());
    eprintln!("   Platform: {}", config.platform);
    eprintln!("   Type :back to return to the previous step, :quit to exit.\n");

    let graph = flows::for_flavor(config.flow);
    let engine = WizardEngine::new(graph, config.engine.clone())?.with_completion_handler(
        |step_id| tracing::info!(step_id = %step_id, "Deployment instructions delivered"),
    );
    let sink = DirectorySink::new(&config.output_dir);

    let mut terminal = TerminalFrontEnd::new(
        engine,
        Box::new(sink),
        config.platform,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    );
    terminal.run().await?;

    Ok(())
}
