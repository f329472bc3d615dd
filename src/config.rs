//! Boundary parsing for the plain configuration values the engines accept.
//!
//! Everything here turns user text into typed values or an
//! `InvalidConfig` error; no engine ever sees unparsed input.

use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::convolution::Matrix;
use crate::errors::{Result, VizError};
use crate::greedy::{Activity, Item};

pub const MAX_ARRAY_SIZE: usize = 100;
pub const MAX_MATRIX_DIM: usize = 32;
pub const RANDOM_VALUE_MAX: i64 = 99;

lazy_static! {
    static ref LIST_SPLIT: Regex = Regex::new(r"[,\s]+").unwrap();
    static ref SECTION_SPLIT: Regex = Regex::new(r"\s*\|\s*").unwrap();
    static ref ROW_SPLIT: Regex = Regex::new(r"\]\s*,?\s*\[|[;\n]").unwrap();
    static ref INTEGER: Regex = Regex::new(r"^[+-]?[0-9]+$").unwrap();
    static ref NUMBER: Regex = Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)$").unwrap();
    static ref ACTIVITY: Regex = Regex::new(r"^([0-9]+)\s*(?:-|:|to)\s*([0-9]+)$").unwrap();
    static ref ITEM: Regex =
        Regex::new(r"^([0-9]+\.?[0-9]*|\.[0-9]+)\s*[:/]\s*([0-9]+\.?[0-9]*|\.[0-9]+)$").unwrap();
    static ref SYMBOL: Regex = Regex::new(r"^(\S+?)\s*:\s*([0-9]+)$").unwrap();
    static ref RANDOM: Regex = Regex::new(r"^random\s+([0-9]+)(?:\s+([0-9]+))?$").unwrap();
}

/// Front-end defaults, overridable from positional CLI arguments.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Settings {
    pub array_size: usize,
    pub interval_ms: u64,
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            array_size: 10,
            interval_ms: 300,
            seed: None,
        }
    }
}

impl Settings {
    /// `[array_size] [interval_ms] [seed]`; unparsable values fall back to defaults.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let defaults = Settings::default();
        let array_size = args
            .get(1)
            .map(|a| a.parse().unwrap_or(defaults.array_size))
            .unwrap_or(defaults.array_size);
        let interval_ms = args
            .get(2)
            .map(|a| a.parse().unwrap_or(defaults.interval_ms))
            .unwrap_or(defaults.interval_ms);
        let seed = args.get(3).and_then(|a| a.parse().ok());

        if array_size < 1 || array_size > MAX_ARRAY_SIZE {
            return Err(VizError::invalid(format!(
                "array size must be between 1 and {}",
                MAX_ARRAY_SIZE
            )));
        }
        Ok(Settings {
            array_size,
            interval_ms,
            seed,
        })
    }
}

/// Every list the engines take is capped at `MAX_ARRAY_SIZE` entries.
pub fn check_len(len: usize, what: &str) -> Result<()> {
    if len > MAX_ARRAY_SIZE {
        return Err(VizError::invalid(format!(
            "{} has {} entries; at most {} are allowed",
            what, len, MAX_ARRAY_SIZE
        )));
    }
    Ok(())
}

/// Splits `input` on `|` into trimmed sections.
pub fn sections(input: &str) -> Vec<&str> {
    let input = input.trim();
    if input.is_empty() {
        return Vec::new();
    }
    SECTION_SPLIT.split(input).collect()
}

fn tokens(input: &str) -> impl Iterator<Item = &str> {
    LIST_SPLIT.split(input.trim()).filter(|t| !t.is_empty())
}

pub fn parse_int(input: &str, what: &str) -> Result<i64> {
    let t = input.trim();
    if !INTEGER.is_match(t) {
        return Err(VizError::invalid(format!("{} '{}' is not an integer", what, t)));
    }
    t.parse()
        .map_err(|_| VizError::invalid(format!("{} '{}' is out of range", what, t)))
}

pub fn parse_count(input: &str, what: &str) -> Result<usize> {
    let v = parse_int(input, what)?;
    usize::try_from(v).map_err(|_| VizError::invalid(format!("{} must not be negative", what)))
}

pub fn parse_number(input: &str, what: &str) -> Result<f64> {
    let t = input.trim();
    if !NUMBER.is_match(t) {
        return Err(VizError::invalid(format!("{} '{}' is not a number", what, t)));
    }
    t.parse()
        .map_err(|_| VizError::invalid(format!("{} '{}' is not a number", what, t)))
}

/// Comma- or whitespace-separated integers, at least one.
pub fn parse_int_list(input: &str) -> Result<Vec<i64>> {
    let values = tokens(input)
        .map(|t| parse_int(t, "value"))
        .collect::<Result<Vec<_>>>()?;
    if values.is_empty() {
        return Err(VizError::invalid("list is empty"));
    }
    check_len(values.len(), "list")?;
    Ok(values)
}

pub fn parse_count_list(input: &str, what: &str) -> Result<Vec<usize>> {
    let values = tokens(input)
        .map(|t| parse_count(t, what))
        .collect::<Result<Vec<_>>>()?;
    if values.is_empty() {
        return Err(VizError::invalid(format!("{} list is empty", what)));
    }
    check_len(values.len(), what)?;
    Ok(values)
}

/// Rows separated by `;` or newlines, or nested brackets like `[[1,0],[0,1]]`.
pub fn parse_matrix(input: &str) -> Result<Matrix> {
    let body = input.trim().trim_start_matches('[').trim_end_matches(']');
    let mut matrix = Vec::new();
    for row in ROW_SPLIT.split(body) {
        if row.trim().is_empty() {
            continue;
        }
        let values = tokens(row)
            .map(|t| parse_number(t, "matrix entry"))
            .collect::<Result<Vec<_>>>()?;
        matrix.push(values);
    }
    if matrix.is_empty() {
        return Err(VizError::invalid("matrix is empty"));
    }
    let cols = matrix[0].len();
    if matrix.iter().any(|r| r.len() != cols) {
        return Err(VizError::invalid("matrix rows have different lengths"));
    }
    if matrix.len() > MAX_MATRIX_DIM || cols > MAX_MATRIX_DIM {
        return Err(VizError::invalid(format!(
            "matrix dimensions must be at most {}x{}",
            MAX_MATRIX_DIM, MAX_MATRIX_DIM
        )));
    }
    Ok(matrix)
}

fn chunks(input: &str) -> impl Iterator<Item = &str> {
    input.split(',').map(str::trim).filter(|c| !c.is_empty())
}

/// `start-end` pairs, comma-separated: `1-4, 3-5, 0-6`.
pub fn parse_activities(input: &str) -> Result<Vec<Activity>> {
    let mut out = Vec::new();
    for chunk in chunks(input) {
        let caps = ACTIVITY
            .captures(chunk)
            .ok_or_else(|| VizError::invalid(format!("activity '{}' is not start-end", chunk)))?;
        out.push(Activity {
            start: parse_int(&caps[1], "start")?,
            end: parse_int(&caps[2], "end")?,
        });
    }
    if out.is_empty() {
        return Err(VizError::invalid("no activities given"));
    }
    check_len(out.len(), "activity list")?;
    Ok(out)
}

/// `weight:value` pairs, comma-separated.
pub fn parse_items(input: &str) -> Result<Vec<Item>> {
    let mut out = Vec::new();
    for chunk in chunks(input) {
        let caps = ITEM
            .captures(chunk)
            .ok_or_else(|| VizError::invalid(format!("item '{}' is not weight:value", chunk)))?;
        out.push(Item {
            weight: parse_number(&caps[1], "weight")?,
            value: parse_number(&caps[2], "value")?,
        });
    }
    if out.is_empty() {
        return Err(VizError::invalid("no items given"));
    }
    check_len(out.len(), "item list")?;
    Ok(out)
}

/// `symbol:frequency` pairs, or `None` when the input is not in that form.
pub fn parse_symbols(input: &str) -> Option<Vec<(String, u64)>> {
    let mut out = Vec::new();
    for chunk in chunks(input) {
        let caps = SYMBOL.captures(chunk)?;
        out.push((caps[1].to_string(), caps[2].parse().ok()?));
    }
    if out.is_empty() { None } else { Some(out) }
}

/// `random <size> [seed]` requests a generated array.
pub fn parse_random(input: &str) -> Option<Result<Vec<i64>>> {
    let caps = RANDOM.captures(input.trim())?;
    let size = match parse_count(&caps[1], "array size") {
        Ok(size) => size,
        Err(e) => return Some(Err(e)),
    };
    let seed = caps.get(2).and_then(|m| m.as_str().parse().ok());
    Some(random_array(size, seed))
}

/// Values in `1..=RANDOM_VALUE_MAX`; a seed makes the array reproducible.
pub fn random_array(size: usize, seed: Option<u64>) -> Result<Vec<i64>> {
    if size < 1 || size > MAX_ARRAY_SIZE {
        return Err(VizError::invalid(format!(
            "array size must be between 1 and {}",
            MAX_ARRAY_SIZE
        )));
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Ok((0..size).map(|_| rng.gen_range(1..=RANDOM_VALUE_MAX)).collect())
}
