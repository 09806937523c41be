//! Harness runner
//!
//! Builds the scenario once, writes the fifteen metric files (three modes,
//! five metrics each) and then runs the network simulation for the
//! configured duration. The simulation report is returned and logged but
//! never feeds the metric values.

use std::fs;
use std::path::PathBuf;

use log::{error, info};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::fl_csv::CsvLogger;
use crate::fl_error::{FlError, Result};
use crate::fl_event_sinks::LoggingEventSink;
use crate::fl_interface::{results_file_name, sweep_header, Metric, MetricSeries};
use crate::fl_metrics::{model_for, FailureRateSource, MetricContext};
use crate::fl_params::{seed_to_hex, SimulationParams};
use crate::fl_scenario::{ScenarioBuilder, ScenarioConfig};
use crate::fl_simulator::{SimReport, Simulator};

/// A results file that could not be written
#[derive(Debug, Clone, PartialEq)]
pub struct FailedWrite {
    pub file: String,
    pub error: String,
}

/// Outcome of the metric pass
#[derive(Debug, Clone, Default)]
pub struct MetricsOutcome {
    pub series: Vec<MetricSeries>,
    pub files_written: Vec<PathBuf>,
    pub failed_writes: Vec<FailedWrite>,
}

/// Simulation result
#[derive(Debug)]
pub struct RunResult {
    /// Seed used for the run
    pub seed_used: [u8; 32],
    pub metrics: MetricsOutcome,
    pub sim_report: SimReport,
}

impl RunResult {
    pub fn print_summary(&self) {
        info!("=== Run Results ===");
        info!("Seed used: {}", seed_to_hex(&self.seed_used));
        info!(
            "CSV files written: {} ({} failed)",
            self.metrics.files_written.len(),
            self.metrics.failed_writes.len()
        );
        for failed in &self.metrics.failed_writes {
            info!("  failed: {} ({})", failed.file, failed.error);
        }

        let r = &self.sim_report;
        info!(
            "Simulation: {:.1}s, {} events, {} beacons, {} associations, {} waypoints",
            r.stop_time.as_secs_f64(),
            r.events_processed,
            r.beacons_sent,
            r.associations,
            r.waypoints_reached
        );
        info!(
            "AP energy: {:.4} J consumed, {:.4} J remaining",
            r.ap_energy_consumed_j, r.ap_energy_remaining_j
        );
        if let Some(t) = r.ap_depleted_at {
            info!("AP energy source depleted at {:.3}s", t.as_secs_f64());
        }
    }
}

/// Per-run driver
pub struct HarnessRunner {
    params: SimulationParams,
    scenario: ScenarioConfig,
    seed: [u8; 32],
}

impl HarnessRunner {
    pub fn new(params: SimulationParams, scenario: ScenarioConfig) -> Result<Self> {
        params.validate()?;
        scenario.validate()?;
        let seed = params.resolve_seed();
        Ok(Self {
            params,
            scenario,
            seed,
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn seed(&self) -> [u8; 32] {
        self.seed
    }

    pub fn run(&self) -> Result<RunResult> {
        let p = &self.params;
        info!(
            "Running simulation with nSta={}, dpEpsilon={}",
            p.n_sta, p.dp_epsilon
        );
        info!("Seed: {}", seed_to_hex(&self.seed));

        // separate streams: robustness draws do not depend on topology size
        let mut master = StdRng::from_seed(self.seed);
        let mut failure_seed = [0u8; 32];
        let mut sim_seed = [0u8; 32];
        master.fill_bytes(&mut failure_seed);
        master.fill_bytes(&mut sim_seed);
        let mut failures = FailureRateSource::from_seed(failure_seed);
        let mut sim_rng = StdRng::from_seed(sim_seed);

        let scenario = ScenarioBuilder::new(&self.scenario).build(p.n_sta, &mut sim_rng)?;
        info!(
            "Topology: {} stations + 1 AP on {}/{}, ssid {}, {:?}/{:?}",
            scenario.num_stations(),
            scenario.network,
            scenario.prefix,
            self.scenario.wifi.ssid,
            self.scenario.wifi.standard,
            self.scenario.wifi.rate_manager
        );

        fs::create_dir_all(&p.output_dir).map_err(|source| FlError::Csv {
            path: p.output_dir.clone(),
            source,
        })?;
        let mut logger = CsvLogger::new(&p.output_dir);
        let metrics = self.synthesize_metrics(&mut logger, &mut failures);

        let mut sim = Simulator::new(scenario, sim_rng, LoggingEventSink);
        sim.stop(p.sim_duration());
        let sim_report = sim.run()?;

        Ok(RunResult {
            seed_used: self.seed,
            metrics,
            sim_report,
        })
    }

    /// Compute every metric for every mode and append one row per file.
    /// A failed file is logged and recorded; the rest are still written.
    pub fn synthesize_metrics(
        &self,
        logger: &mut CsvLogger,
        failures: &mut FailureRateSource,
    ) -> MetricsOutcome {
        let p = &self.params;
        let header = sweep_header(&p.n_sta_values);
        let mut outcome = MetricsOutcome::default();

        for &mode in &p.modes {
            let model = model_for(mode);
            let mut ctx = MetricContext {
                dp_epsilon: p.dp_epsilon,
                failures: &mut *failures,
            };

            for metric in Metric::ALL {
                let series = model.series(metric, &p.n_sta_values, &mut ctx);
                let file = results_file_name(mode, metric);
                match logger.log(&file, &header, &series.values) {
                    Ok(path) => outcome.files_written.push(path),
                    Err(e) => {
                        error!("{}", e);
                        outcome.failed_writes.push(FailedWrite {
                            file,
                            error: e.to_string(),
                        });
                    }
                }
                outcome.series.push(series);
            }

            info!("Metrics logged for mode={}", mode);
        }

        outcome
    }
}
