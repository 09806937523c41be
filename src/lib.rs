//! # fl_aitp - Comparative Protocol Metrics Harness
//!
//! Produces comparative CSV metrics (latency, throughput, energy efficiency,
//! privacy loss, robustness) for three protocol modes, AITP, CAIP and NAP,
//! over a fixed sweep of station counts, next to a simulated Wi-Fi cell of
//! one access point and N stations.
//!
//! ## Core Components
//!
//! - **HarnessRunner**: one run: scenario, fifteen CSV files, simulation
//! - **MetricModel**: per-mode strategy computing a metric at a station count
//! - **CsvLogger**: per-run file state, header once, one row per call
//! - **ScenarioBuilder / Simulator**: topology and discrete-event loop
//!
//! The metrics are closed-form in the station count and the privacy budget.
//! The simulated cell is run and reported on, but does not feed them.
//!
//! ```no_run
//! use fl_aitp::{HarnessRunner, ScenarioConfig, SimulationParams};
//!
//! let params = SimulationParams {
//!     n_sta: 100,
//!     ..Default::default()
//! };
//! let runner = HarnessRunner::new(params, ScenarioConfig::default())?;
//! let result = runner.run()?;
//! result.print_summary();
//! # Ok::<(), fl_aitp::FlError>(())
//! ```

// Metrics and output
pub mod fl_csv;
pub mod fl_interface;
pub mod fl_metrics;
pub mod fl_runner;

// Network simulation
pub mod fl_address;
pub mod fl_energy;
pub mod fl_event_sinks;
pub mod fl_mobility;
pub mod fl_scenario;
pub mod fl_simulator;

// Parameters, configuration, errors
pub mod fl_cli;
pub mod fl_config;
pub mod fl_error;
pub mod fl_params;

// Re-export commonly used types
pub use fl_csv::CsvLogger;
pub use fl_error::{FlError, Result};
pub use fl_interface::{
    results_file_name, sweep_header, Event, EventSink, Metric, MetricSeries, Mode, NoOpSink,
    NodeId, SimTime, StationCount, STATION_SWEEP,
};
pub use fl_metrics::{model_for, ConstantFactorModel, MetricModel, ModeFactors};
pub use fl_params::SimulationParams;
pub use fl_runner::{HarnessRunner, RunResult};
pub use fl_scenario::{ScenarioBuilder, ScenarioConfig};
pub use fl_simulator::{SimReport, Simulator};
