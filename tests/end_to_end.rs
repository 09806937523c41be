use std::fs;
use std::path::Path;

use fl_aitp::fl_config::ScenarioFile;
use fl_aitp::{
    results_file_name, HarnessRunner, Metric, Mode, ScenarioConfig, SimulationParams,
    STATION_SWEEP,
};
use tempfile::TempDir;

const HEADER: &str = "nSta=50,nSta=100,nSta=200,nSta=300,nSta=400,nSta=500";

fn run_in(dir: &Path, n_sta: u32) -> fl_aitp::RunResult {
    let params = SimulationParams {
        n_sta,
        output_dir: dir.to_path_buf(),
        ..Default::default()
    };
    HarnessRunner::new(params, ScenarioConfig::default())
        .unwrap()
        .run()
        .unwrap()
}

#[test]
fn test_one_run_writes_fifteen_files_with_one_row() {
    let dir = TempDir::new().unwrap();
    let result = run_in(dir.path(), 100);

    assert!(result.metrics.failed_writes.is_empty());
    assert_eq!(result.metrics.files_written.len(), 15);

    let csv_files: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .flatten()
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("csv"))
        .collect();
    assert_eq!(csv_files.len(), 15);

    for mode in Mode::ALL {
        for metric in Metric::ALL {
            let name = results_file_name(mode, metric);
            let content = fs::read_to_string(dir.path().join(&name)).unwrap();
            let lines: Vec<&str> = content.lines().collect();
            assert_eq!(lines.len(), 2, "{}", name);
            assert_eq!(lines[0], HEADER);

            let row = lines[1];
            assert!(row.ends_with(','), "{} row not comma-terminated", name);
            let values: Vec<f64> = row
                .trim_end_matches(',')
                .split(',')
                .map(|v| v.parse::<f64>().unwrap())
                .collect();
            assert_eq!(values.len(), STATION_SWEEP.len(), "{}", name);
        }
    }
}

#[test]
fn test_caip_latency_file_contents() {
    let dir = TempDir::new().unwrap();
    run_in(dir.path(), 100);

    let content = fs::read_to_string(dir.path().join("results_CAIP_latency.csv")).unwrap();
    assert_eq!(content, format!("{}\n14,12,11,10.6667,10.5,10.4,\n", HEADER));

    let content = fs::read_to_string(dir.path().join("results_AITP_energy.csv")).unwrap();
    assert_eq!(content, format!("{}\n25.4,50.8,101.6,152.4,203.2,254,\n", HEADER));
}

#[test]
fn test_station_count_only_changes_the_simulation() {
    let small = TempDir::new().unwrap();
    let large = TempDir::new().unwrap();
    let a = run_in(small.path(), 10);
    let b = run_in(large.path(), 300);

    for metric in [Metric::Latency, Metric::Throughput, Metric::EnergyEfficiency] {
        let name = results_file_name(Mode::Nap, metric);
        assert_eq!(
            fs::read_to_string(small.path().join(&name)).unwrap(),
            fs::read_to_string(large.path().join(&name)).unwrap()
        );
    }
    assert_eq!(a.sim_report.associations, 10);
    assert_eq!(b.sim_report.associations, 300);
}

#[test]
fn test_shipped_scenarios_parse() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
    let mut count = 0;
    for entry in fs::read_dir(&dir).unwrap().flatten() {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("yaml") {
            continue;
        }
        let file = ScenarioFile::load(&path).unwrap();
        let mut params = SimulationParams::default();
        file.apply(&mut params).unwrap();
        params.validate().unwrap();
        file.scenario.validate().unwrap();
        count += 1;
    }
    assert!(count >= 3);
}
