use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Algorithm;

/// Sentinel for DP cells that no recurrence has reached.
pub const INFINITY: i64 = i64::MAX;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum StepKind {
    Compare,
    Swap,
    Assign,
    MarkSorted,
    Found,
    NotFound,
    Visit,
}

impl StepKind {
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Compare => "compare",
            StepKind::Swap => "swap",
            StepKind::Assign => "assign",
            StepKind::MarkSorted => "markSorted",
            StepKind::Found => "found",
            StepKind::NotFound => "notFound",
            StepKind::Visit => "visit",
        }
    }
}

/// An index or a label highlighted by a step.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Key {
    Index(i64),
    Label(String),
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i as i64)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Index(i)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Label(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Label(s)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(v as i64)
    }
}

/// Frequencies past `i64::MAX` are kept exact as text.
impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Text(v.to_string()),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(INFINITY) => write!(f, "∞"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Preorder-flattened view of a binary tree. Child links index into `nodes`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct TreeSnapshot {
    pub root: Option<usize>,
    pub nodes: Vec<TreeNodeView>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct TreeNodeView {
    pub value: i64,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum WorkingState {
    Array(Vec<i64>),
    /// DP table; 1-D tables are stored as a single row.
    Table(Vec<Vec<i64>>),
    Matrix(Vec<Vec<f64>>),
    Tree(TreeSnapshot),
    Selection { chosen: Vec<usize>, total: f64 },
    /// Pending Huffman nodes in extraction order.
    Queue(Vec<(String, u64)>),
}

/// One atomic, displayable event in a run.
///
/// `state` is the working state right after the event took effect.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Step {
    pub kind: StepKind,
    pub keys: Vec<Key>,
    pub values: BTreeMap<String, Value>,
    pub annotation: String,
    pub state: WorkingState,
}

impl Step {
    pub fn new(kind: StepKind, state: WorkingState) -> Self {
        Step {
            kind,
            keys: Vec::new(),
            values: BTreeMap::new(),
            annotation: String::new(),
            state,
        }
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn keys<K: Into<Key>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn note(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = annotation.into();
        self
    }

    pub fn index_keys(&self) -> Vec<i64> {
        self.keys
            .iter()
            .filter_map(|k| match k {
                Key::Index(i) => Some(*i),
                Key::Label(_) => None,
            })
            .collect()
    }
}

/// The answer an engine arrived at, alongside its steps.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Outcome {
    Sorted(Vec<i64>),
    Found(usize),
    NotFound,
    Traversal(Vec<i64>),
    /// Inorder listing of the tree after all operations.
    Tree(Vec<i64>),
    Number(i64),
    Lcs {
        length: usize,
        subsequence: String,
    },
    Knapsack {
        value: i64,
        items: Vec<usize>,
    },
    /// `count` is -1 when the amount is unreachable.
    CoinChange {
        count: i64,
        coins: Vec<i64>,
    },
    Activities(Vec<usize>),
    FractionalKnapsack {
        total: f64,
        taken: Vec<(usize, f64)>,
    },
    Huffman {
        codes: BTreeMap<String, String>,
        encoded: Option<String>,
    },
    Matrix(Vec<Vec<f64>>),
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct RunStats {
    pub compares: usize,
    pub swaps: usize,
    pub assigns: usize,
    pub visits: usize,
}

/// One complete execution of a visualized algorithm.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Run {
    pub algorithm: Algorithm,
    pub initial: WorkingState,
    pub steps: Vec<Step>,
    #[serde(rename = "final")]
    pub final_state: WorkingState,
    pub outcome: Outcome,
}

impl Run {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    /// Working state visible at `index`; the initial state when the run has no steps.
    pub fn state_at(&self, index: usize) -> &WorkingState {
        self.steps
            .get(index)
            .map(|s| &s.state)
            .unwrap_or(&self.initial)
    }

    pub fn count(&self, kind: StepKind) -> usize {
        self.steps.iter().filter(|s| s.kind == kind).count()
    }

    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats::default();
        for step in &self.steps {
            match step.kind {
                StepKind::Compare => stats.compares += 1,
                StepKind::Swap => stats.swaps += 1,
                StepKind::Assign => stats.assigns += 1,
                StepKind::Visit => stats.visits += 1,
                _ => {}
            }
        }
        stats
    }
}
