use std::fmt;
use std::time::Duration;

// all nodes (stations and the access point) share one index space
pub type NodeId = u32;
pub type StationCount = u32;

/// Simulated time since the start of the event loop
pub type SimTime = Duration;

/// Station counts every metric is evaluated over. Independent of `--nSta`,
/// which only sizes the simulated topology.
pub const STATION_SWEEP: [StationCount; 6] = [50, 100, 200, 300, 400, 500];

pub const RESULTS_PREFIX: &str = "results";

/// Longest span, in seconds, any configured duration may have
/// (run length, update period, pause, one waypoint leg)
pub const MAX_SPAN_SECS: f64 = 1.0e9;

/// Seconds to simulated time. Values too large for a `Duration` saturate,
/// negative and NaN values give zero.
pub fn secs_to_sim_time(secs: f64) -> SimTime {
    Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

// ============================================================================
// Protocol Modes
// ============================================================================

/// The three compared protocol modes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mode {
    Aitp,
    /// Unscaled baseline every other mode is compared against
    Caip,
    Nap,
}

impl Mode {
    /// Run order of the modes. Robustness draws are consumed in this order.
    pub const ALL: [Mode; 3] = [Mode::Aitp, Mode::Caip, Mode::Nap];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Aitp => "AITP",
            Mode::Caip => "CAIP",
            Mode::Nap => "NAP",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Metrics
// ============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Latency,
    Throughput,
    EnergyEfficiency,
    PrivacyLoss,
    Robustness,
}

impl Metric {
    /// Order in which the per-mode files are written
    pub const ALL: [Metric; 5] = [
        Metric::Latency,
        Metric::Throughput,
        Metric::EnergyEfficiency,
        Metric::PrivacyLoss,
        Metric::Robustness,
    ];

    /// Suffix used in the results file name
    pub fn file_stem(&self) -> &'static str {
        match self {
            Metric::Latency => "latency",
            Metric::Throughput => "throughput",
            Metric::EnergyEfficiency => "energy",
            Metric::PrivacyLoss => "privacy",
            Metric::Robustness => "robustness",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// `results_<MODE>_<metric>.csv`
pub fn results_file_name(mode: Mode, metric: Metric) -> String {
    format!("{}_{}_{}.csv", RESULTS_PREFIX, mode, metric.file_stem())
}

/// Header line shared by every results file: `nSta=50,nSta=100,...`
pub fn sweep_header(sweep: &[StationCount]) -> String {
    sweep
        .iter()
        .map(|n| format!("nSta={}", n))
        .collect::<Vec<_>>()
        .join(",")
}

/// One CSV row: the values of a metric for one mode over the sweep
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub mode: Mode,
    pub metric: Metric,
    pub values: Vec<f64>,
}

// ============================================================================
// Event Logging System
// ============================================================================

/// Events emitted by the network simulator for debugging and analysis
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Access point transmitted a beacon
    Beacon { ssid: String },
    /// Station associated with the access point after hearing a beacon
    Associated { ap: NodeId },
    /// Station arrived at its random waypoint and starts pausing
    WaypointReached { x: f64, y: f64 },
    /// Periodic energy source update
    EnergyUpdate { consumed_j: f64, remaining_j: f64 },
    /// Energy source ran dry, the node's radio is switched off
    EnergyDepleted,
    /// Stop time reached
    Stopped,
}

/// Trait for consuming events from the simulator
pub trait EventSink {
    fn log(&mut self, time: SimTime, node: NodeId, event: Event);
}

/// No-op event sink for plain runs
pub struct NoOpSink;

impl EventSink for NoOpSink {
    #[inline(always)]
    fn log(&mut self, _time: SimTime, _node: NodeId, _event: Event) {}
}
