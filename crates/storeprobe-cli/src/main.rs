//! storeprobe: run the demoblaze storefront scenarios
//!
//! ## Usage
//!
//! ```bash
//! storeprobe list                  # List scenarios
//! storeprobe run                   # Run every scenario
//! storeprobe run --filter login    # Run the login scenarios
//! ```

use clap::Parser;
use std::process::ExitCode;
use storeprobe::{select, storefront, Scenario, SuiteConfig, SuiteReport};
use storeprobe_cli::{
    render_report_json, render_scenarios, resolve_suite_config, Cli, CliConfig, CliError,
    CliResult, ColorChoice, Commands, ListArgs, OutputFormat, RunArgs, ScenarioRunner, Verbosity,
};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    // Build configuration from CLI args
    let config = build_config(&cli);
    init_tracing(&config);

    match cli.command {
        Commands::Run(args) => run_scenarios(config, &args),
        Commands::List(args) => run_list(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(ColorChoice::from(cli.color.clone()))
}

fn init_tracing(config: &CliConfig) {
    let level = config.verbosity.log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("storeprobe={level},storeprobe_cli={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.verbosity.is_debug())
        .with_ansi(config.color.should_color())
        .try_init();
}

fn run_list(args: &ListArgs) -> CliResult<()> {
    let suite = match &args.config {
        Some(path) => SuiteConfig::from_file(path)?,
        None => SuiteConfig::default(),
    };
    let scenarios = storefront::all(&suite.data);
    let out = render_scenarios(&scenarios, OutputFormat::from(args.format), args.steps)?;
    print!("{out}");
    if !out.ends_with('\n') {
        println!();
    }
    Ok(())
}

fn run_scenarios(config: CliConfig, args: &RunArgs) -> CliResult<()> {
    let suite = resolve_suite_config(args)?;
    tracing::debug!(?suite, "resolved suite configuration");
    let scenarios = select(storefront::all(&suite.data), args.filter.as_deref());
    let mut runner = ScenarioRunner::new(config);

    if scenarios.is_empty() {
        runner.reporter().warning(&format!(
            "No scenarios match filter {:?}",
            args.filter.as_deref().unwrap_or_default()
        ));
        return Ok(());
    }

    let report = launch(&mut runner, &suite, &scenarios)?;

    if OutputFormat::from(args.format) == OutputFormat::Json {
        println!("{}", render_report_json(&report)?);
    }

    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::scenarios_failed(&report.failed_names()))
    }
}

#[cfg(feature = "browser")]
fn launch(
    runner: &mut ScenarioRunner,
    suite: &SuiteConfig,
    scenarios: &[Scenario],
) -> CliResult<SuiteReport> {
    let launcher = storeprobe::ChromiumLauncher::new(suite.browser.clone());
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    Ok(rt.block_on(runner.run(launcher, suite, scenarios)))
}

#[cfg(not(feature = "browser"))]
fn launch(
    _runner: &mut ScenarioRunner,
    _suite: &SuiteConfig,
    _scenarios: &[Scenario],
) -> CliResult<SuiteReport> {
    Err(CliError::config(
        "storeprobe was built without browser support. Rebuild with --features browser",
    ))
}
