use crate::catalog::Algorithm;
use crate::config;
use crate::errors::{Result, VizError};
use crate::recorder::StepRecorder;
use crate::step::{Outcome, Run, Step, StepKind, WorkingState};

fn finish(algorithm: Algorithm, input: &[i64], rec: &mut StepRecorder, outcome: Outcome) -> Run {
    let state = WorkingState::Array(input.to_vec());
    Run {
        algorithm,
        initial: state.clone(),
        steps: rec.take_steps(),
        final_state: state,
        outcome,
    }
}

pub fn linear_search(input: &[i64], target: i64) -> Result<Run> {
    linear_search_with(input, target, &mut StepRecorder::new())
}

pub fn linear_search_with(input: &[i64], target: i64, rec: &mut StepRecorder) -> Result<Run> {
    if input.is_empty() {
        return Err(VizError::invalid("array is empty"));
    }
    config::check_len(input.len(), "array")?;
    let state = WorkingState::Array(input.to_vec());
    for (i, &value) in input.iter().enumerate() {
        rec.checkpoint()?;
        let hit = value == target;
        rec.record(
            Step::new(StepKind::Compare, state.clone())
                .key(i)
                .value("value", value)
                .value("target", target)
                .value("result", hit)
                .note(format!("[{}] = {} vs {}", i, value, target)),
        );
        if hit {
            rec.record(
                Step::new(StepKind::Found, state)
                    .key(i)
                    .note(format!("found {} at {}", target, i)),
            );
            return Ok(finish(Algorithm::LinearSearch, input, rec, Outcome::Found(i)));
        }
    }
    rec.checkpoint()?;
    rec.record(Step::new(StepKind::NotFound, state).note(format!("{} not present", target)));
    Ok(finish(Algorithm::LinearSearch, input, rec, Outcome::NotFound))
}

pub fn binary_search(input: &[i64], target: i64) -> Result<Run> {
    binary_search_with(input, target, &mut StepRecorder::new())
}

/// Iterative binary search over a non-decreasing array.
///
/// Emits one compare per probe with keys `[low, mid, high]`, so a miss
/// costs at most `ceil(log2(n + 1))` compares.
pub fn binary_search_with(input: &[i64], target: i64, rec: &mut StepRecorder) -> Result<Run> {
    if input.is_empty() {
        return Err(VizError::invalid("array is empty"));
    }
    config::check_len(input.len(), "array")?;
    if input.windows(2).any(|w| w[0] > w[1]) {
        return Err(VizError::invalid("binary search requires a sorted array"));
    }
    let state = WorkingState::Array(input.to_vec());
    let (mut low, mut high) = (0i64, input.len() as i64 - 1);

    while low <= high {
        rec.checkpoint()?;
        let mid = low + (high - low) / 2;
        let value = input[mid as usize];
        rec.record(
            Step::new(StepKind::Compare, state.clone())
                .keys([low, mid, high])
                .value("low", low)
                .value("mid", mid)
                .value("high", high)
                .value("value", value)
                .value("target", target)
                .note(format!("[{}] = {} vs {}", mid, value, target)),
        );
        if value == target {
            rec.record(
                Step::new(StepKind::Found, state)
                    .key(mid)
                    .note(format!("found {} at {}", target, mid)),
            );
            let index = mid as usize;
            return Ok(finish(Algorithm::BinarySearch, input, rec, Outcome::Found(index)));
        }
        if value < target {
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }
    rec.checkpoint()?;
    rec.record(
        Step::new(StepKind::NotFound, state)
            .value("low", low)
            .value("high", high)
            .note(format!("{} not present", target)),
    );
    Ok(finish(Algorithm::BinarySearch, input, rec, Outcome::NotFound))
}
