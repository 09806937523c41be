// Scenario Runner - Load and execute scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner scenarios/baseline.yaml
//   cargo run --bin scenario_runner scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner scenarios/baseline.yaml --seed 0x1234...
//
// Results of each scenario go to results/<file stem>/ unless the file sets
// params.output_dir.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;

use fl_aitp::fl_config::ScenarioFile;
use fl_aitp::fl_params::parse_seed_hex;
use fl_aitp::{FlError, HarnessRunner, SimulationParams};

#[derive(Parser, Debug)]
#[command(name = "scenario_runner", about = "Run harness scenarios from YAML files")]
struct Args {
    /// Scenario file, or a directory of .yaml/.yml files
    path: PathBuf,

    /// Seed applied to every scenario, overriding the files
    #[arg(long)]
    seed: Option<String>,
}

fn main() -> ExitCode {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Info).env().init() {
        eprintln!("logger init failed: {}", e);
    }

    let args = Args::parse();

    let seed = match args.seed.as_deref().map(parse_seed_hex).transpose() {
        Ok(seed) => seed,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let scenarios = if args.path.is_file() {
        vec![args.path.clone()]
    } else if args.path.is_dir() {
        match find_scenarios(&args.path) {
            Ok(found) if !found.is_empty() => found,
            Ok(_) => {
                error!("No .yaml files found in {}", args.path.display());
                return ExitCode::FAILURE;
            }
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        error!("Path does not exist: {}", args.path.display());
        return ExitCode::FAILURE;
    };

    info!("Found {} scenario(s) to run", scenarios.len());

    let mut failed = 0;
    for (i, path) in scenarios.iter().enumerate() {
        info!("{}/{} Running: {}", i + 1, scenarios.len(), path.display());
        if let Err(e) = run_scenario_file(path, seed) {
            error!("{}: {}", path.display(), e);
            failed += 1;
        }
    }

    if failed > 0 {
        error!("{} of {} scenario(s) failed", failed, scenarios.len());
        ExitCode::FAILURE
    } else {
        info!("All scenarios complete!");
        ExitCode::SUCCESS
    }
}

fn find_scenarios(dir: &Path) -> Result<Vec<PathBuf>, FlError> {
    let entries = fs::read_dir(dir).map_err(|source| FlError::ConfigRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut scenarios: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    scenarios.sort();
    Ok(scenarios)
}

fn run_scenario_file(path: &Path, seed: Option<[u8; 32]>) -> Result<(), FlError> {
    let scenario = ScenarioFile::load(path)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scenario".to_string());
    let mut params = SimulationParams {
        output_dir: PathBuf::from("results").join(&stem),
        ..Default::default()
    };
    scenario.apply(&mut params)?;
    if seed.is_some() {
        params.seed = seed;
    }

    info!("=== {} ===", scenario.meta.name.as_deref().unwrap_or(&stem));
    if let Some(ref desc) = scenario.meta.description {
        info!("{}", desc.trim());
    }
    info!(
        "Configuration: nSta={} dpEpsilon={} simTime={}s output={}",
        params.n_sta,
        params.dp_epsilon,
        params.sim_time,
        params.output_dir.display()
    );

    let runner = HarnessRunner::new(params, scenario.scenario)?;
    let result = runner.run()?;
    result.print_summary();
    Ok(())
}
