use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rep_coach::config::AppConfig;
use rep_coach::fixtures::{ExpectationDiff, FixtureCatalog, FixtureProcessor, FixtureReport};
use rep_coach::profile::ThresholdPreset;

#[derive(Parser, Debug)]
#[command(
    name = "rep_cli",
    about = "Deterministic fixture harness for the rep counting engine"
)]
struct Cli {
    /// Override directory containing fixture assets (defaults to ./fixtures)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// JSON config file; a missing or malformed file is an error
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(long, short)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a fixture and compare the final counts against expectations
    Replay {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Stream one feedback record per fixture frame to stdout
    Stream {
        #[arg(long)]
        fixture: String,
    },
    /// Print the resolved exercise profile
    Profile {
        #[arg(long, default_value = "squat")]
        exercise: String,
        #[arg(long, default_value = "beginner")]
        preset: ThresholdPreset,
    },
    /// List available fixtures on disk
    DumpFixtures,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => AppConfig::try_load_from_file(path)?,
        None => AppConfig::default(),
    };
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_else(FixtureCatalog::default);

    match cli.command {
        Commands::Replay {
            fixture,
            expect,
            output,
        } => run_replay(&catalog, config, &fixture, expect, output),
        Commands::Stream { fixture } => run_stream(&catalog, config, &fixture),
        Commands::Profile { exercise, preset } => run_profile(&config, &exercise, preset),
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    // Logs go to stderr so stdout stays machine-readable
    rep_coach::init_logging(level);
}

fn run_replay(
    catalog: &FixtureCatalog,
    config: AppConfig,
    fixture: &str,
    override_expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let processor = FixtureProcessor::new(config);
    let data = catalog.load(fixture, override_expect)?;
    let run = processor
        .run(&data)
        .with_context(|| format!("processing fixture {}", fixture))?;

    emit_report(&run.report, output_path)?;

    if let Some(expectations) = data.expectations {
        match expectations.verify(&run.report) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_stream(catalog: &FixtureCatalog, config: AppConfig, fixture: &str) -> Result<ExitCode> {
    let processor = FixtureProcessor::new(config);
    let data = catalog.load(fixture, None)?;
    let run = processor
        .run(&data)
        .with_context(|| format!("processing fixture {}", fixture))?;

    for record in run.records {
        println!("{}", serde_json::to_string(&record)?);
    }

    Ok(ExitCode::from(0))
}

fn run_profile(config: &AppConfig, exercise: &str, preset: ThresholdPreset) -> Result<ExitCode> {
    let profile = config
        .resolve_profile(exercise, preset)
        .with_context(|| format!("resolving profile {}", exercise))?;
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn emit_report(report: &FixtureReport, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}
