//! rubyboot CLI
//!
//! Runs one command and is the single place where a failure is reported
//! and turned into an exit code.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use rubyboot::cli::{self, Cli, CliError, Commands, EXIT_OK, exit_code_for};
use rubyboot::commands;
use rubyboot::tracing::{self, TracingConfig, TracingFormat};
use rubyboot_core::{BootstrapConfig, RuntimeVersion};
use rubyboot_events::{ConsoleRenderer, JsonRenderer, Reporter};
use rubyboot_tools_http::HttpArchiveFetcher;

fn main() {
    // NOTE: tracing may be unusable during a panic, so write directly.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let tracing_config = TracingConfig {
        format: if cli.json {
            TracingFormat::Json
        } else {
            TracingFormat::Compact
        },
        level: cli.level.into(),
        ..Default::default()
    };
    // Ignore error if tracing already initialized
    let _ = tracing::init_tracing(tracing_config);

    let reporter: Box<dyn Reporter> = if cli.json {
        Box::new(JsonRenderer::stdout())
    } else {
        Box::new(ConsoleRenderer::stdout())
    };

    let exit_code = match run(&cli, reporter.as_ref()) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            ::tracing::debug!(error = ?err, "Command failed");
            reporter.fatal(&err.fatal_message());
            exit_code_for(&err)
        }
    };
    reporter.finish();
    std::process::exit(exit_code);
}

fn run(cli: &Cli, reporter: &dyn Reporter) -> Result<(), CliError> {
    match cli.command() {
        // Pure file read; no runtime needed.
        Commands::Version { config } => {
            let path = cli.config_path(config.as_ref())?;
            let resolved = commands::execute_version(&path, &cli.runtime());
            if cli.json {
                let json = serde_json::json!({
                    "version": resolved.version,
                    "default": resolved.is_default(),
                });
                println!("{json}");
            } else {
                println!("{}", resolved.version);
            }
            Ok(())
        }
        command => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|e| CliError::failed(format!("Failed to create tokio runtime: {e}")))?;
            runtime.block_on(run_async(cli, command, reporter))
        }
    }
}

async fn run_async(cli: &Cli, command: Commands, reporter: &dyn Reporter) -> Result<(), CliError> {
    match command {
        Commands::Bootstrap { config } => {
            let bootstrap_config = cli.bootstrap_config()?;
            let config_path = cli.config_path(config.as_ref())?;
            let fetcher = HttpArchiveFetcher::from_config(&bootstrap_config)?;
            commands::execute_bootstrap(&bootstrap_config, &config_path, &fetcher, reporter)
                .await?;
        }
        Commands::Vendor { version } => {
            let bootstrap_config = cli.bootstrap_config()?;
            let fetcher = HttpArchiveFetcher::from_config(&bootstrap_config)?;
            commands::execute_vendor(
                &bootstrap_config,
                &RuntimeVersion::new(version),
                &fetcher,
                reporter,
            )
            .await?;
        }
        Commands::Fetch { version, dir } => {
            let platform = cli.platform()?;
            let fetcher = HttpArchiveFetcher::new(
                cli.runtime(),
                cli.fetch_timeout()?,
                BootstrapConfig::DEFAULT_CONNECT_TIMEOUT,
            )?;
            commands::execute_fetch(
                &fetcher,
                &RuntimeVersion::new(version),
                &platform,
                &dir,
                reporter,
            )
            .await?;
        }
        Commands::Version { .. } => {}
    }
    Ok(())
}
