use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

use crate::catalog::Algorithm;
use crate::config;
use crate::errors::{Result, VizError};
use crate::recorder::StepRecorder;
use crate::step::{Outcome, Run, Step, StepKind, WorkingState};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Activity {
    pub start: i64,
    pub end: i64,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Item {
    pub weight: f64,
    pub value: f64,
}

impl Item {
    pub fn ratio(&self) -> f64 {
        self.value / self.weight
    }
}

fn selection(chosen: &[usize], total: f64) -> WorkingState {
    WorkingState::Selection {
        chosen: chosen.to_vec(),
        total,
    }
}

pub fn activity_selection(activities: &[Activity]) -> Result<Run> {
    activity_selection_with(activities, &mut StepRecorder::new())
}

/// Earliest-finish-first selection; indices in the outcome refer to the input.
pub fn activity_selection_with(activities: &[Activity], rec: &mut StepRecorder) -> Result<Run> {
    if activities.is_empty() {
        return Err(VizError::invalid("no activities given"));
    }
    config::check_len(activities.len(), "activity list")?;
    if let Some((i, a)) = activities.iter().enumerate().find(|(_, a)| a.start > a.end) {
        return Err(VizError::invalid(format!(
            "activity {} starts at {} after it ends at {}",
            i, a.start, a.end
        )));
    }

    let mut order: Vec<usize> = (0..activities.len()).collect();
    // sort_by_key is stable, so equal end times keep input order.
    order.sort_by_key(|&i| activities[i].end);

    let mut chosen: Vec<usize> = Vec::new();
    let mut last_end: Option<i64> = None;
    for &i in &order {
        rec.checkpoint()?;
        let a = activities[i];
        let accept = last_end.is_none_or(|end| a.start >= end);
        let mut step = Step::new(StepKind::Compare, selection(&chosen, chosen.len() as f64))
            .key(i)
            .value("start", a.start)
            .value("end", a.end)
            .value("result", accept);
        if let Some(end) = last_end {
            step = step
                .value("last_end", end)
                .note(format!("start {} >= last end {}", a.start, end));
        } else {
            step = step.note("first activity by end time");
        }
        rec.record(step);

        if accept {
            chosen.push(i);
            last_end = Some(a.end);
            rec.checkpoint()?;
            rec.record(
                Step::new(StepKind::Assign, selection(&chosen, chosen.len() as f64))
                    .key(i)
                    .note(format!("select activity {} [{}, {})", i, a.start, a.end)),
            );
        }
    }

    let total = chosen.len() as f64;
    Ok(Run {
        algorithm: Algorithm::ActivitySelection,
        initial: selection(&[], 0.0),
        steps: rec.take_steps(),
        final_state: selection(&chosen, total),
        outcome: Outcome::Activities(chosen),
    })
}

pub fn fractional_knapsack(items: &[Item], capacity: f64) -> Result<Run> {
    fractional_knapsack_with(items, capacity, &mut StepRecorder::new())
}

pub fn fractional_knapsack_with(items: &[Item], capacity: f64, rec: &mut StepRecorder) -> Result<Run> {
    if items.is_empty() {
        return Err(VizError::invalid("no items given"));
    }
    config::check_len(items.len(), "item list")?;
    if !capacity.is_finite() || capacity < 0.0 {
        return Err(VizError::invalid(format!("capacity {} is not a non-negative number", capacity)));
    }
    if capacity == 0.0 {
        return Err(VizError::infeasible("knapsack capacity is zero"));
    }
    if let Some((i, _)) = items
        .iter()
        .enumerate()
        .find(|(_, it)| !(it.weight > 0.0) || !it.value.is_finite() || it.value < 0.0)
    {
        return Err(VizError::invalid(format!("item {} needs a positive weight and non-negative value", i)));
    }

    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        items[b]
            .ratio()
            .partial_cmp(&items[a].ratio())
            .unwrap_or(Ordering::Equal)
    });

    let mut remaining = capacity;
    let mut total = 0.0;
    let mut chosen = Vec::new();
    let mut taken = Vec::new();
    for &i in &order {
        if remaining <= 0.0 {
            break;
        }
        rec.checkpoint()?;
        let item = items[i];
        let fits = item.weight <= remaining;
        rec.record(
            Step::new(StepKind::Compare, selection(&chosen, total))
                .key(i)
                .value("weight", item.weight)
                .value("remaining", remaining)
                .value("ratio", item.ratio())
                .value("result", fits)
                .note(format!("weight {} vs remaining {}", item.weight, remaining)),
        );

        let fraction = if fits { 1.0 } else { remaining / item.weight };
        remaining -= item.weight * fraction;
        total += item.value * fraction;
        chosen.push(i);
        taken.push((i, fraction));
        rec.checkpoint()?;
        rec.record(
            Step::new(StepKind::Assign, selection(&chosen, total))
                .key(i)
                .value("fraction", fraction)
                .value("total", total)
                .note(format!("take {:.3} of item {}", fraction, i)),
        );
        if !fits {
            break;
        }
    }

    Ok(Run {
        algorithm: Algorithm::FractionalKnapsack,
        initial: selection(&[], 0.0),
        steps: rec.take_steps(),
        final_state: selection(&chosen, total),
        outcome: Outcome::FractionalKnapsack { total, taken },
    })
}

#[derive(Clone, Debug)]
struct HuffNode {
    label: String,
    freq: u64,
    left: Option<usize>,
    right: Option<usize>,
}

/// Huffman tree over an arena; node indices double as insertion order.
struct HuffmanTree {
    nodes: Vec<HuffNode>,
    root: usize,
}

impl HuffmanTree {
    fn codes(&self) -> BTreeMap<String, String> {
        let mut codes = BTreeMap::new();
        let root = &self.nodes[self.root];
        if root.left.is_none() && root.right.is_none() {
            codes.insert(root.label.clone(), "0".to_string());
            return codes;
        }
        let mut stack = vec![(self.root, String::new())];
        while let Some((id, prefix)) = stack.pop() {
            let node = &self.nodes[id];
            match (node.left, node.right) {
                (Some(l), Some(r)) => {
                    stack.push((r, format!("{}1", prefix)));
                    stack.push((l, format!("{}0", prefix)));
                }
                _ => {
                    codes.insert(node.label.clone(), prefix);
                }
            }
        }
        codes
    }
}

fn queue_state(nodes: &[HuffNode], heap: &BinaryHeap<Reverse<(u64, usize)>>) -> WorkingState {
    let mut pending: Vec<(u64, usize)> = heap.iter().map(|Reverse(k)| *k).collect();
    pending.sort();
    WorkingState::Queue(
        pending
            .into_iter()
            .map(|(_, id)| (nodes[id].label.clone(), nodes[id].freq))
            .collect(),
    )
}

fn build_huffman(symbols: &[(String, u64)], rec: &mut StepRecorder) -> Result<(HuffmanTree, WorkingState)> {
    if symbols.is_empty() {
        return Err(VizError::invalid("no symbols given"));
    }
    config::check_len(symbols.len(), "symbol table")?;
    let mut seen = std::collections::HashSet::new();
    for (label, freq) in symbols {
        if *freq == 0 {
            return Err(VizError::invalid(format!("symbol '{}' has zero frequency", label)));
        }
        if !seen.insert(label.as_str()) {
            return Err(VizError::invalid(format!("symbol '{}' listed twice", label)));
        }
    }
    // The root carries the total, so a total that fits bounds every merged node.
    if symbols.iter().try_fold(0u64, |acc, (_, f)| acc.checked_add(*f)).is_none() {
        return Err(VizError::invalid("symbol frequencies add up past the u64 range"));
    }

    let mut nodes: Vec<HuffNode> = symbols
        .iter()
        .map(|(label, freq)| HuffNode {
            label: label.clone(),
            freq: *freq,
            left: None,
            right: None,
        })
        .collect();
    // Min-heap on (frequency, insertion index).
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> =
        nodes.iter().enumerate().map(|(i, n)| Reverse((n.freq, i))).collect();
    let initial = queue_state(&nodes, &heap);

    while heap.len() > 1 {
        rec.checkpoint()?;
        let (Some(Reverse((lf, l))), Some(Reverse((rf, r)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        rec.record(
            Step::new(StepKind::Visit, queue_state(&nodes, &heap))
                .keys([nodes[l].label.clone(), nodes[r].label.clone()])
                .value("left", lf)
                .value("right", rf)
                .note(format!("extract {}:{} and {}:{}", nodes[l].label, lf, nodes[r].label, rf)),
        );

        let merged = HuffNode {
            label: format!("{}{}", nodes[l].label, nodes[r].label),
            freq: lf + rf,
            left: Some(l),
            right: Some(r),
        };
        let id = nodes.len();
        heap.push(Reverse((merged.freq, id)));
        nodes.push(merged);
        rec.checkpoint()?;
        rec.record(
            Step::new(StepKind::Assign, queue_state(&nodes, &heap))
                .key(nodes[id].label.clone())
                .value("freq", nodes[id].freq)
                .note(format!("merge into {}:{}", nodes[id].label, nodes[id].freq)),
        );
    }

    let root = match heap.pop() {
        Some(Reverse((_, id))) => id,
        None => return Err(VizError::invalid("no symbols given")),
    };
    Ok((HuffmanTree { nodes, root }, initial))
}

pub fn huffman(symbols: &[(String, u64)]) -> Result<Run> {
    huffman_with(symbols, None, &mut StepRecorder::new())
}

/// Counts symbol frequencies in `text` (first-occurrence order) and encodes it.
pub fn huffman_text(text: &str) -> Result<Run> {
    huffman_with(&frequencies(text), Some(text), &mut StepRecorder::new())
}

pub fn frequencies(text: &str) -> Vec<(String, u64)> {
    let mut freqs: Vec<(String, u64)> = Vec::new();
    for c in text.chars() {
        let label = c.to_string();
        match freqs.iter_mut().find(|(l, _)| *l == label) {
            Some((_, f)) => *f += 1,
            None => freqs.push((label, 1)),
        }
    }
    freqs
}

pub fn huffman_with(symbols: &[(String, u64)], text: Option<&str>, rec: &mut StepRecorder) -> Result<Run> {
    let (tree, initial) = build_huffman(symbols, rec)?;
    let codes = tree.codes();
    let root = &tree.nodes[tree.root];
    let final_state = WorkingState::Queue(vec![(root.label.clone(), root.freq)]);

    for (label, _) in symbols {
        rec.checkpoint()?;
        let code = codes.get(label).cloned().unwrap_or_default();
        rec.record(
            Step::new(StepKind::Assign, final_state.clone())
                .key(label.clone())
                .value("code", code.clone())
                .note(format!("{} -> {}", label, code)),
        );
    }

    let encoded = match text {
        Some(text) => {
            let mut bits = String::new();
            for c in text.chars() {
                match codes.get(&c.to_string()) {
                    Some(code) => bits.push_str(code),
                    None => return Err(VizError::invalid(format!("'{}' has no code", c))),
                }
            }
            Some(bits)
        }
        None => None,
    };

    log::debug!("huffman over {} symbols, {} steps", symbols.len(), rec.len());
    Ok(Run {
        algorithm: Algorithm::Huffman,
        initial,
        steps: rec.take_steps(),
        final_state,
        outcome: Outcome::Huffman { codes, encoded },
    })
}
