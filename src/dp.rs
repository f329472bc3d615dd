use crate::catalog::Algorithm;
use crate::config;
use crate::errors::{Result, VizError};
use crate::recorder::StepRecorder;
use crate::step::{INFINITY, Outcome, Run, Step, StepKind, Value, WorkingState};

/// Largest n whose Fibonacci number fits in an i64.
pub const MAX_FIBONACCI: usize = 92;
/// Upper bound on knapsack capacity and coin-change amount.
pub const MAX_TABLE_WIDTH: usize = 500;
pub const MAX_LCS_LEN: usize = 64;
/// Every step carries a full table snapshot, so a run may hold at most this
/// many table cells summed over all of its steps.
pub const MAX_TRACE_CELLS: usize = 4_000_000;

fn check_trace_size(steps: usize, cells: usize) -> Result<()> {
    let total = steps.saturating_mul(cells);
    if total > MAX_TRACE_CELLS {
        return Err(VizError::invalid(format!(
            "about {} steps over a {}-cell table is too large to trace (limit {} cells)",
            steps, cells, MAX_TRACE_CELLS
        )));
    }
    Ok(())
}

fn row(dp: &[i64]) -> WorkingState {
    WorkingState::Table(vec![dp.to_vec()])
}

fn table(dp: &[Vec<i64>]) -> WorkingState {
    WorkingState::Table(dp.to_vec())
}

fn finish(algorithm: Algorithm, initial: WorkingState, final_state: WorkingState, rec: &mut StepRecorder, outcome: Outcome) -> Run {
    log::debug!("{:?}: {} steps", algorithm, rec.len());
    Run {
        algorithm,
        initial,
        steps: rec.take_steps(),
        final_state,
        outcome,
    }
}

pub fn fibonacci(n: usize) -> Result<Run> {
    fibonacci_with(n, &mut StepRecorder::new())
}

pub fn fibonacci_with(n: usize, rec: &mut StepRecorder) -> Result<Run> {
    if n > MAX_FIBONACCI {
        return Err(VizError::invalid(format!("fibonacci({}) overflows; n must be at most {}", n, MAX_FIBONACCI)));
    }
    let mut dp = vec![0i64; n + 1];
    let initial = row(&dp);

    rec.checkpoint()?;
    rec.record(Step::new(StepKind::Assign, row(&dp)).key(0usize).value("value", 0i64).note("dp[0] = 0"));
    if n >= 1 {
        rec.checkpoint()?;
        dp[1] = 1;
        rec.record(Step::new(StepKind::Assign, row(&dp)).key(1usize).value("value", 1i64).note("dp[1] = 1"));
    }
    for i in 2..=n {
        rec.checkpoint()?;
        dp[i] = dp[i - 1] + dp[i - 2];
        rec.record(
            Step::new(StepKind::Assign, row(&dp))
                .keys([i, i - 1, i - 2])
                .value("value", dp[i])
                .note(format!("dp[{}] = dp[{}] + dp[{}] = {} + {}", i, i - 1, i - 2, dp[i - 1], dp[i - 2])),
        );
    }
    let answer = dp[n];
    Ok(finish(Algorithm::Fibonacci, initial, row(&dp), rec, Outcome::Number(answer)))
}

pub fn lcs(a: &str, b: &str) -> Result<Run> {
    lcs_with(a, b, &mut StepRecorder::new())
}

pub fn lcs_with(a: &str, b: &str, rec: &mut StepRecorder) -> Result<Run> {
    if a.is_empty() || b.is_empty() {
        return Err(VizError::invalid("both strings must be non-empty"));
    }
    if a.chars().count() > MAX_LCS_LEN || b.chars().count() > MAX_LCS_LEN {
        return Err(VizError::invalid(format!("strings must be at most {} characters", MAX_LCS_LEN)));
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());
    check_trace_size(2 * m * n + m + n, (m + 1) * (n + 1))?;
    let mut dp = vec![vec![0i64; n + 1]; m + 1];
    let initial = table(&dp);

    for i in 1..=m {
        for j in 1..=n {
            rec.checkpoint()?;
            let matched = a[i - 1] == b[j - 1];
            rec.record(
                Step::new(StepKind::Compare, table(&dp))
                    .keys([i, j])
                    .value("left", a[i - 1].to_string())
                    .value("right", b[j - 1].to_string())
                    .value("result", matched)
                    .note(format!("'{}' vs '{}'", a[i - 1], b[j - 1])),
            );
            rec.checkpoint()?;
            let note = if matched {
                dp[i][j] = dp[i - 1][j - 1] + 1;
                format!("match: dp[{}][{}] = dp[{}][{}] + 1", i, j, i - 1, j - 1)
            } else {
                dp[i][j] = dp[i - 1][j].max(dp[i][j - 1]);
                format!("dp[{}][{}] = max(up {}, left {})", i, j, dp[i - 1][j], dp[i][j - 1])
            };
            rec.record(
                Step::new(StepKind::Assign, table(&dp))
                    .keys([i, j])
                    .value("value", dp[i][j])
                    .note(note),
            );
        }
    }

    let (mut i, mut j) = (m, n);
    let mut subsequence = Vec::new();
    while i > 0 && j > 0 {
        rec.checkpoint()?;
        rec.record(Step::new(StepKind::Visit, table(&dp)).keys([i, j]).note(format!("backtrack ({}, {})", i, j)));
        if a[i - 1] == b[j - 1] {
            subsequence.push(a[i - 1]);
            i -= 1;
            j -= 1;
        } else if dp[i - 1][j] >= dp[i][j - 1] {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    subsequence.reverse();

    let length = dp[m][n] as usize;
    let outcome = Outcome::Lcs {
        length,
        subsequence: subsequence.into_iter().collect(),
    };
    Ok(finish(Algorithm::Lcs, initial, table(&dp), rec, outcome))
}

pub fn knapsack(weights: &[usize], values: &[i64], capacity: usize) -> Result<Run> {
    knapsack_with(weights, values, capacity, &mut StepRecorder::new())
}

/// 0/1 knapsack over the standard `(items + 1) x (capacity + 1)` table.
pub fn knapsack_with(weights: &[usize], values: &[i64], capacity: usize, rec: &mut StepRecorder) -> Result<Run> {
    if weights.is_empty() {
        return Err(VizError::invalid("no items given"));
    }
    if weights.len() != values.len() {
        return Err(VizError::invalid(format!(
            "{} weights but {} values",
            weights.len(),
            values.len()
        )));
    }
    config::check_len(weights.len(), "item list")?;
    if weights.contains(&0) || values.iter().any(|&v| v < 0) {
        return Err(VizError::invalid("weights must be positive and values non-negative"));
    }
    // Every table cell is a sum of distinct item values.
    if values.iter().try_fold(0i64, |acc, &v| acc.checked_add(v)).is_none() {
        return Err(VizError::invalid("item values add up past the i64 range"));
    }
    if capacity > MAX_TABLE_WIDTH {
        return Err(VizError::invalid(format!("capacity must be at most {}", MAX_TABLE_WIDTH)));
    }
    if capacity == 0 {
        return Err(VizError::infeasible("knapsack capacity is zero"));
    }

    let n = weights.len();
    check_trace_size(2 * n * (capacity + 1), (n + 1) * (capacity + 1))?;
    let mut dp = vec![vec![0i64; capacity + 1]; n + 1];
    let initial = table(&dp);

    for i in 1..=n {
        let (wt, val) = (weights[i - 1], values[i - 1]);
        for w in 0..=capacity {
            rec.checkpoint()?;
            let exclude = dp[i - 1][w];
            if wt <= w {
                let include = dp[i - 1][w - wt] + val;
                rec.record(
                    Step::new(StepKind::Compare, table(&dp))
                        .keys([i, w])
                        .value("include", include)
                        .value("exclude", exclude)
                        .value("result", include > exclude)
                        .note(format!("include {} vs exclude {}", include, exclude)),
                );
                rec.checkpoint()?;
                dp[i][w] = include.max(exclude);
            } else {
                dp[i][w] = exclude;
            }
            rec.record(
                Step::new(StepKind::Assign, table(&dp))
                    .keys([i, w])
                    .value("value", dp[i][w])
                    .note(format!("dp[{}][{}] = {}", i, w, dp[i][w])),
            );
        }
    }

    let mut items = Vec::new();
    let mut w = capacity;
    for i in (1..=n).rev() {
        if dp[i][w] != dp[i - 1][w] {
            items.push(i - 1);
            w -= weights[i - 1];
        }
    }
    items.reverse();

    let outcome = Outcome::Knapsack {
        value: dp[n][capacity],
        items,
    };
    Ok(finish(Algorithm::Knapsack, initial, table(&dp), rec, outcome))
}

pub fn coin_change(coins: &[i64], amount: usize) -> Result<Run> {
    coin_change_with(coins, amount, &mut StepRecorder::new())
}

/// Minimum-coin change. An unreachable amount ends in a `notFound` step
/// with a count of -1; it is not an error.
pub fn coin_change_with(coins: &[i64], amount: usize, rec: &mut StepRecorder) -> Result<Run> {
    if coins.is_empty() {
        return Err(VizError::invalid("no coins given"));
    }
    config::check_len(coins.len(), "coin list")?;
    if coins.iter().any(|&c| c <= 0) {
        return Err(VizError::invalid("coin values must be positive"));
    }
    if amount > MAX_TABLE_WIDTH {
        return Err(VizError::invalid(format!("amount must be at most {}", MAX_TABLE_WIDTH)));
    }
    check_trace_size(2 * amount * coins.len() + 1, amount + 1)?;

    let mut dp = vec![INFINITY; amount + 1];
    let mut last_coin = vec![0i64; amount + 1];
    dp[0] = 0;
    let initial = row(&dp);

    for i in 1..=amount {
        for &coin in coins {
            let c = coin as usize;
            if c > i || dp[i - c] == INFINITY {
                continue;
            }
            rec.checkpoint()?;
            let candidate = dp[i - c] + 1;
            let better = candidate < dp[i];
            rec.record(
                Step::new(StepKind::Compare, row(&dp))
                    .keys([i, i - c])
                    .value("coin", coin)
                    .value("candidate", candidate)
                    .value("current", dp[i])
                    .value("result", better)
                    .note(format!("dp[{}] + 1 = {} vs dp[{}] = {}", i - c, candidate, i, Value::from(dp[i]))),
            );
            if better {
                rec.checkpoint()?;
                dp[i] = candidate;
                last_coin[i] = coin;
                rec.record(
                    Step::new(StepKind::Assign, row(&dp))
                        .key(i)
                        .value("value", candidate)
                        .value("coin", coin)
                        .note(format!("dp[{}] = {} using coin {}", i, candidate, coin)),
                );
            }
        }
    }

    rec.checkpoint()?;
    let outcome = if dp[amount] == INFINITY {
        rec.record(
            Step::new(StepKind::NotFound, row(&dp))
                .key(amount)
                .note(format!("amount {} cannot be made", amount)),
        );
        Outcome::CoinChange { count: -1, coins: Vec::new() }
    } else {
        let mut used = Vec::new();
        let mut rest = amount;
        while rest > 0 {
            used.push(last_coin[rest]);
            rest -= last_coin[rest] as usize;
        }
        rec.record(
            Step::new(StepKind::Found, row(&dp))
                .key(amount)
                .value("count", dp[amount])
                .note(format!("{} coins make {}", dp[amount], amount)),
        );
        Outcome::CoinChange { count: dp[amount], coins: used }
    };
    Ok(finish(Algorithm::CoinChange, initial, row(&dp), rec, outcome))
}
