#![cfg(not(tarpaulin_include))]

use algoviz::catalog::{self, Algorithm};
use algoviz::saving::{export_json, load_run, load_trace, run_from_bytes, run_to_bytes, save_run};
use algoviz::step::Run;
use std::fs;
use tempfile::tempdir;

fn sample_runs() -> Vec<Run> {
    [
        ("heap", "5 3 8 1 9 2"),
        ("bst", "50 30 70 20 40 | 30"),
        ("huffman", "abracadabra"),
        ("coins", "2 | 3"),
        ("convolution", "1 2 3; 4 5 6; 7 8 9 | 1 0; 0 -1"),
        ("fractional", "10:60, 20:100, 30:120 | 50"),
    ]
    .iter()
    .map(|(name, input)| catalog::generate(&catalog::parse_request(name, input).unwrap()).unwrap())
    .collect()
}

fn test_save_and_load_run() -> std::io::Result<()> {
    println!("\n====== Testing trace files ======");
    let dir = tempdir()?;
    for run in sample_runs() {
        let path = dir.path().join(format!("{}.trace.gz", run.algorithm.name()));
        let filename = path.to_string_lossy().to_string();

        save_run(&run, &filename)?;
        assert!(path.exists(), "trace file was not created");

        let loaded = load_run(&filename)?;
        assert_eq!(loaded, run);
        println!("✓ {} survives a save/load cycle ({} steps)", run.algorithm.name(), run.len());
    }

    let runs = sample_runs();
    let run = &runs[0];
    let filename = dir.path().join("stamped.trace.gz").to_string_lossy().to_string();
    let before = chrono::Utc::now();
    save_run(run, &filename)?;
    let trace = load_trace(&filename)?;
    assert!(trace.saved_at >= before);
    assert_eq!(trace.run.algorithm, Algorithm::HeapSort);
    println!("✓ the trace header records when it was saved");
    Ok(())
}

fn test_in_memory_traces() -> std::io::Result<()> {
    println!("\n====== Testing in-memory traces ======");
    let runs = sample_runs();
    let run = &runs[1];
    let bytes = run_to_bytes(run)?;
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    assert_eq!(&run_from_bytes(&bytes)?, run);
    println!("✓ bytes are gzip and decode to the same run");

    assert!(run_from_bytes(b"not a trace").is_err());
    println!("✓ garbage input is rejected");
    Ok(())
}

fn test_json_export() -> std::io::Result<()> {
    println!("\n====== Testing JSON export ======");
    let dir = tempdir()?;
    let runs = sample_runs();
    let run = &runs[0];
    let path = dir.path().join("heap.json");
    export_json(run, &path.to_string_lossy())?;

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(value["algorithm"], "HeapSort");
    assert_eq!(value["steps"].as_array().map(|s| s.len()), Some(run.len()));
    assert!(value.get("final").is_some());
    println!("✓ JSON carries the algorithm, every step and the final state");
    Ok(())
}

fn test_missing_file() {
    println!("\n====== Testing missing files ======");
    assert!(load_run("/nonexistent/dir/run.trace.gz").is_err());
    println!("✓ loading a missing file fails cleanly");
}

pub fn run_tests() -> std::io::Result<()> {
    println!("Starting trace file tests");
    test_save_and_load_run()?;
    test_in_memory_traces()?;
    test_json_export()?;
    test_missing_file();
    println!("All tests passed!");
    Ok(())
}

fn main() -> std::io::Result<()> {
    run_tests()
}

#[cfg(test)]
mod tests {
    #[test]
    fn save_and_load() {
        super::test_save_and_load_run().unwrap();
    }

    #[test]
    fn in_memory() {
        super::test_in_memory_traces().unwrap();
    }

    #[test]
    fn json_export() {
        super::test_json_export().unwrap();
    }

    #[test]
    fn missing_file() {
        super::test_missing_file();
    }
}
