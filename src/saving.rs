use bincode::{deserialize_from, serialize_into};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

use crate::step::Run;

/// What a trace file holds: the finished run and when it was written.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TraceFile {
    pub saved_at: DateTime<Utc>,
    pub run: Run,
}

impl TraceFile {
    pub fn new(run: Run) -> Self {
        TraceFile {
            saved_at: Utc::now(),
            run,
        }
    }
}

fn invalid_data(e: bincode::Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, e)
}

pub fn write_trace<W: Write>(trace: &TraceFile, out: W) -> std::io::Result<()> {
    let encoder = GzEncoder::new(out, Compression::default());
    let mut writer = BufWriter::new(encoder);

    serialize_into(&mut writer, trace).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let encoder = writer.into_inner().map_err(|e| e.into_error())?;
    encoder.finish()?;
    Ok(())
}

pub fn read_trace<R: Read>(input: R) -> std::io::Result<TraceFile> {
    let decoder = GzDecoder::new(input);
    let mut reader = BufReader::new(decoder);
    deserialize_from(&mut reader).map_err(invalid_data)
}

pub fn save_run(run: &Run, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    write_trace(&TraceFile::new(run.clone()), file)?;
    log::info!("saved {} ({} steps) to {}", run.algorithm.name(), run.len(), filename);
    Ok(())
}

pub fn load_trace(filename: &str) -> std::io::Result<TraceFile> {
    let file = File::open(filename)?;
    let trace = read_trace(file)?;
    log::info!(
        "loaded {} from {} (saved {})",
        trace.run.algorithm.name(),
        filename,
        trace.saved_at.to_rfc3339()
    );
    Ok(trace)
}

pub fn load_run(filename: &str) -> std::io::Result<Run> {
    Ok(load_trace(filename)?.run)
}

/// Compressed bytes of `run`, for callers that keep traces in memory.
pub fn run_to_bytes(run: &Run) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    write_trace(&TraceFile::new(run.clone()), &mut bytes)?;
    Ok(bytes)
}

pub fn run_from_bytes(bytes: &[u8]) -> std::io::Result<Run> {
    Ok(read_trace(bytes)?.run)
}

/// Pretty JSON for a renderer.
pub fn export_json(run: &Run, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, run)?;
    writer.flush()?;
    Ok(())
}
