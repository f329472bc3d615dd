//! Algorithm identifiers and the dispatch from raw input text to engines.
//!
//! Input sections are separated by `|`; see [`Algorithm::syntax`] for the
//! form each algorithm expects.

use serde::{Deserialize, Serialize};

use crate::bst::{self, TraversalOrder};
use crate::config;
use crate::convolution::{self, ConvolutionConfig};
use crate::dp;
use crate::errors::{Result, VizError};
use crate::greedy::{self, Activity, Item};
use crate::recorder::StepRecorder;
use crate::searching;
use crate::sorting::{self, SortKind};
use crate::step::Run;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    BubbleSort,
    SelectionSort,
    InsertionSort,
    MergeSort,
    QuickSort,
    HeapSort,
    LinearSearch,
    BinarySearch,
    BstBuild,
    BstSearch,
    BstSuccessor,
    Preorder,
    Inorder,
    Postorder,
    LevelOrder,
    ActivitySelection,
    FractionalKnapsack,
    Huffman,
    Fibonacci,
    Lcs,
    Knapsack,
    CoinChange,
    Convolution,
}

impl Algorithm {
    pub const ALL: [Algorithm; 23] = [
        Algorithm::BubbleSort,
        Algorithm::SelectionSort,
        Algorithm::InsertionSort,
        Algorithm::MergeSort,
        Algorithm::QuickSort,
        Algorithm::HeapSort,
        Algorithm::LinearSearch,
        Algorithm::BinarySearch,
        Algorithm::BstBuild,
        Algorithm::BstSearch,
        Algorithm::BstSuccessor,
        Algorithm::Preorder,
        Algorithm::Inorder,
        Algorithm::Postorder,
        Algorithm::LevelOrder,
        Algorithm::ActivitySelection,
        Algorithm::FractionalKnapsack,
        Algorithm::Huffman,
        Algorithm::Fibonacci,
        Algorithm::Lcs,
        Algorithm::Knapsack,
        Algorithm::CoinChange,
        Algorithm::Convolution,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::BubbleSort => "bubble",
            Algorithm::SelectionSort => "selection",
            Algorithm::InsertionSort => "insertion",
            Algorithm::MergeSort => "merge",
            Algorithm::QuickSort => "quick",
            Algorithm::HeapSort => "heap",
            Algorithm::LinearSearch => "linear",
            Algorithm::BinarySearch => "binary",
            Algorithm::BstBuild => "bst",
            Algorithm::BstSearch => "bst-search",
            Algorithm::BstSuccessor => "successor",
            Algorithm::Preorder => "preorder",
            Algorithm::Inorder => "inorder",
            Algorithm::Postorder => "postorder",
            Algorithm::LevelOrder => "levelorder",
            Algorithm::ActivitySelection => "activity",
            Algorithm::FractionalKnapsack => "fractional",
            Algorithm::Huffman => "huffman",
            Algorithm::Fibonacci => "fibonacci",
            Algorithm::Lcs => "lcs",
            Algorithm::Knapsack => "knapsack",
            Algorithm::CoinChange => "coins",
            Algorithm::Convolution => "convolution",
        }
    }

    /// Case-insensitive lookup; `_` and `-` are interchangeable.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_lowercase().replace('_', "-");
        let wanted = match wanted.as_str() {
            "fib" => "fibonacci",
            "coin-change" => "coins",
            "level-order" | "bfs" => "levelorder",
            "conv" => "convolution",
            other => other,
        }
        .to_string();
        Algorithm::ALL.iter().copied().find(|a| a.name() == wanted)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Algorithm::BubbleSort => "Naive bubble sort, every adjacent pair each pass",
            Algorithm::SelectionSort => "Selection sort, swap the minimum into place",
            Algorithm::InsertionSort => "Insertion sort by shifting",
            Algorithm::MergeSort => "Top-down stable merge sort",
            Algorithm::QuickSort => "Quick sort, Lomuto partition with last-element pivot",
            Algorithm::HeapSort => "Heap sort over a max-heap",
            Algorithm::LinearSearch => "Linear search",
            Algorithm::BinarySearch => "Binary search over a sorted array",
            Algorithm::BstBuild => "Build a binary search tree, then delete values",
            Algorithm::BstSearch => "Search a binary search tree",
            Algorithm::BstSuccessor => "In-order successor in a binary search tree",
            Algorithm::Preorder => "Preorder traversal",
            Algorithm::Inorder => "Inorder traversal",
            Algorithm::Postorder => "Postorder traversal",
            Algorithm::LevelOrder => "Level-order traversal",
            Algorithm::ActivitySelection => "Activity selection by earliest finish",
            Algorithm::FractionalKnapsack => "Fractional knapsack by value/weight ratio",
            Algorithm::Huffman => "Huffman coding",
            Algorithm::Fibonacci => "Bottom-up Fibonacci",
            Algorithm::Lcs => "Longest common subsequence",
            Algorithm::Knapsack => "0/1 knapsack",
            Algorithm::CoinChange => "Minimum-coin change",
            Algorithm::Convolution => "2-D convolution with stride and zero padding",
        }
    }

    pub fn syntax(&self) -> &'static str {
        match self {
            Algorithm::BubbleSort
            | Algorithm::SelectionSort
            | Algorithm::InsertionSort
            | Algorithm::MergeSort
            | Algorithm::QuickSort
            | Algorithm::HeapSort => "<values> | random <size> [seed]",
            Algorithm::LinearSearch | Algorithm::BinarySearch => "<values> | <target>",
            Algorithm::BstBuild => "<inserts> [| <deletes>]",
            Algorithm::BstSearch | Algorithm::BstSuccessor => "<inserts> | <value>",
            Algorithm::Preorder | Algorithm::Inorder | Algorithm::Postorder | Algorithm::LevelOrder => "<inserts>",
            Algorithm::ActivitySelection => "<start-end, ...>",
            Algorithm::FractionalKnapsack => "<weight:value, ...> | <capacity>",
            Algorithm::Huffman => "<symbol:freq, ...> | <text>",
            Algorithm::Fibonacci => "<n>",
            Algorithm::Lcs => "<a> | <b>",
            Algorithm::Knapsack => "<weights> | <values> | <capacity>",
            Algorithm::CoinChange => "<coins> | <amount>",
            Algorithm::Convolution => "<image rows ;> | <kernel rows ;> [| stride [| padding]]",
        }
    }
}

#[derive(Clone, Serialize, Debug)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub syntax: &'static str,
}

pub fn entries() -> Vec<CatalogEntry> {
    Algorithm::ALL
        .iter()
        .map(|a| CatalogEntry {
            name: a.name(),
            description: a.description(),
            syntax: a.syntax(),
        })
        .collect()
}

/// A validated engine configuration.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Request {
    Sort { kind: SortKind, values: Vec<i64> },
    LinearSearch { values: Vec<i64>, target: i64 },
    BinarySearch { values: Vec<i64>, target: i64 },
    BstBuild { inserts: Vec<i64>, deletes: Vec<i64> },
    BstSearch { inserts: Vec<i64>, target: i64 },
    BstSuccessor { inserts: Vec<i64>, value: i64 },
    Traversal { inserts: Vec<i64>, order: TraversalOrder },
    ActivitySelection(Vec<Activity>),
    FractionalKnapsack { items: Vec<Item>, capacity: f64 },
    Huffman { symbols: Vec<(String, u64)>, text: Option<String> },
    Fibonacci(usize),
    Lcs { a: String, b: String },
    Knapsack { weights: Vec<usize>, values: Vec<i64>, capacity: usize },
    CoinChange { coins: Vec<i64>, amount: usize },
    Convolution(ConvolutionConfig),
}

impl Request {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Request::Sort { kind, .. } => kind.algorithm(),
            Request::LinearSearch { .. } => Algorithm::LinearSearch,
            Request::BinarySearch { .. } => Algorithm::BinarySearch,
            Request::BstBuild { .. } => Algorithm::BstBuild,
            Request::BstSearch { .. } => Algorithm::BstSearch,
            Request::BstSuccessor { .. } => Algorithm::BstSuccessor,
            Request::Traversal { order, .. } => order.algorithm(),
            Request::ActivitySelection(_) => Algorithm::ActivitySelection,
            Request::FractionalKnapsack { .. } => Algorithm::FractionalKnapsack,
            Request::Huffman { .. } => Algorithm::Huffman,
            Request::Fibonacci(_) => Algorithm::Fibonacci,
            Request::Lcs { .. } => Algorithm::Lcs,
            Request::Knapsack { .. } => Algorithm::Knapsack,
            Request::CoinChange { .. } => Algorithm::CoinChange,
            Request::Convolution(_) => Algorithm::Convolution,
        }
    }
}

fn section<'s>(parts: &[&'s str], index: usize, what: &str) -> Result<&'s str> {
    parts
        .get(index)
        .copied()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| VizError::invalid(format!("missing {}", what)))
}

fn expect_sections(algorithm: Algorithm, parts: &[&str], max: usize) -> Result<()> {
    if parts.len() > max {
        return Err(VizError::invalid(format!(
            "too many sections for {}; expected {}",
            algorithm.name(),
            algorithm.syntax()
        )));
    }
    Ok(())
}

fn sort_values(input: &str) -> Result<Vec<i64>> {
    match config::parse_random(input) {
        Some(generated) => generated,
        None => config::parse_int_list(input),
    }
}

/// Parses `input` into the request for the algorithm called `name`.
pub fn parse_request(name: &str, input: &str) -> Result<Request> {
    let algorithm = Algorithm::from_name(name).ok_or_else(|| VizError::UnknownAlgorithm(name.to_string()))?;
    let parts = config::sections(input);

    let sort = |kind: SortKind| -> Result<Request> {
        expect_sections(algorithm, &parts, 1)?;
        Ok(Request::Sort {
            kind,
            values: sort_values(section(&parts, 0, "values")?)?,
        })
    };
    let traversal = |order: TraversalOrder| -> Result<Request> {
        expect_sections(algorithm, &parts, 1)?;
        Ok(Request::Traversal {
            inserts: config::parse_int_list(section(&parts, 0, "insert list")?)?,
            order,
        })
    };

    let request = match algorithm {
        Algorithm::BubbleSort => sort(SortKind::Bubble)?,
        Algorithm::SelectionSort => sort(SortKind::Selection)?,
        Algorithm::InsertionSort => sort(SortKind::Insertion)?,
        Algorithm::MergeSort => sort(SortKind::Merge)?,
        Algorithm::QuickSort => sort(SortKind::Quick)?,
        Algorithm::HeapSort => sort(SortKind::Heap)?,
        Algorithm::LinearSearch | Algorithm::BinarySearch => {
            expect_sections(algorithm, &parts, 2)?;
            let values = sort_values(section(&parts, 0, "values")?)?;
            let target = config::parse_int(section(&parts, 1, "target")?, "target")?;
            if algorithm == Algorithm::LinearSearch {
                Request::LinearSearch { values, target }
            } else {
                Request::BinarySearch { values, target }
            }
        }
        Algorithm::BstBuild => {
            expect_sections(algorithm, &parts, 2)?;
            let inserts = config::parse_int_list(section(&parts, 0, "insert list")?)?;
            let deletes = match parts.get(1) {
                Some(d) if !d.is_empty() => config::parse_int_list(d)?,
                _ => Vec::new(),
            };
            Request::BstBuild { inserts, deletes }
        }
        Algorithm::BstSearch => {
            expect_sections(algorithm, &parts, 2)?;
            Request::BstSearch {
                inserts: config::parse_int_list(section(&parts, 0, "insert list")?)?,
                target: config::parse_int(section(&parts, 1, "target")?, "target")?,
            }
        }
        Algorithm::BstSuccessor => {
            expect_sections(algorithm, &parts, 2)?;
            Request::BstSuccessor {
                inserts: config::parse_int_list(section(&parts, 0, "insert list")?)?,
                value: config::parse_int(section(&parts, 1, "value")?, "value")?,
            }
        }
        Algorithm::Preorder => traversal(TraversalOrder::Preorder)?,
        Algorithm::Inorder => traversal(TraversalOrder::Inorder)?,
        Algorithm::Postorder => traversal(TraversalOrder::Postorder)?,
        Algorithm::LevelOrder => traversal(TraversalOrder::LevelOrder)?,
        Algorithm::ActivitySelection => {
            expect_sections(algorithm, &parts, 1)?;
            Request::ActivitySelection(config::parse_activities(section(&parts, 0, "activities")?)?)
        }
        Algorithm::FractionalKnapsack => {
            expect_sections(algorithm, &parts, 2)?;
            Request::FractionalKnapsack {
                items: config::parse_items(section(&parts, 0, "items")?)?,
                capacity: config::parse_number(section(&parts, 1, "capacity")?, "capacity")?,
            }
        }
        Algorithm::Huffman => {
            // Symbol tables need no `|`, so the whole input is kept intact here.
            let raw = input.trim();
            if raw.is_empty() {
                return Err(VizError::invalid("missing symbols or text"));
            }
            match config::parse_symbols(raw) {
                Some(symbols) => Request::Huffman { symbols, text: None },
                None => Request::Huffman {
                    symbols: greedy::frequencies(raw),
                    text: Some(raw.to_string()),
                },
            }
        }
        Algorithm::Fibonacci => {
            expect_sections(algorithm, &parts, 1)?;
            Request::Fibonacci(config::parse_count(section(&parts, 0, "n")?, "n")?)
        }
        Algorithm::Lcs => {
            expect_sections(algorithm, &parts, 2)?;
            Request::Lcs {
                a: section(&parts, 0, "first string")?.to_string(),
                b: section(&parts, 1, "second string")?.to_string(),
            }
        }
        Algorithm::Knapsack => {
            expect_sections(algorithm, &parts, 3)?;
            Request::Knapsack {
                weights: config::parse_count_list(section(&parts, 0, "weights")?, "weight")?,
                values: config::parse_int_list(section(&parts, 1, "values")?)?,
                capacity: config::parse_count(section(&parts, 2, "capacity")?, "capacity")?,
            }
        }
        Algorithm::CoinChange => {
            expect_sections(algorithm, &parts, 2)?;
            Request::CoinChange {
                coins: config::parse_int_list(section(&parts, 0, "coins")?)?,
                amount: config::parse_count(section(&parts, 1, "amount")?, "amount")?,
            }
        }
        Algorithm::Convolution => {
            expect_sections(algorithm, &parts, 4)?;
            let stride = match parts.get(2) {
                Some(s) => config::parse_count(s, "stride")?,
                None => 1,
            };
            let padding = match parts.get(3) {
                Some(p) => config::parse_count(p, "padding")?,
                None => 0,
            };
            Request::Convolution(ConvolutionConfig {
                image: config::parse_matrix(section(&parts, 0, "image")?)?,
                kernel: config::parse_matrix(section(&parts, 1, "kernel")?)?,
                stride,
                padding,
            })
        }
    };
    Ok(request)
}

pub fn generate(request: &Request) -> Result<Run> {
    generate_with(request, &mut StepRecorder::new())
}

/// Runs the engine behind `request`, recording into `rec`.
pub fn generate_with(request: &Request, rec: &mut StepRecorder) -> Result<Run> {
    let result = match request {
        Request::Sort { kind, values } => sorting::sort_with(*kind, values, rec),
        Request::LinearSearch { values, target } => searching::linear_search_with(values, *target, rec),
        Request::BinarySearch { values, target } => searching::binary_search_with(values, *target, rec),
        Request::BstBuild { inserts, deletes } => bst::build_tree_with(inserts, deletes, rec),
        Request::BstSearch { inserts, target } => bst::search_tree_with(inserts, *target, rec),
        Request::BstSuccessor { inserts, value } => bst::successor_query_with(inserts, *value, rec),
        Request::Traversal { inserts, order } => bst::traversal_with(inserts, *order, rec),
        Request::ActivitySelection(activities) => greedy::activity_selection_with(activities, rec),
        Request::FractionalKnapsack { items, capacity } => greedy::fractional_knapsack_with(items, *capacity, rec),
        Request::Huffman { symbols, text } => greedy::huffman_with(symbols, text.as_deref(), rec),
        Request::Fibonacci(n) => dp::fibonacci_with(*n, rec),
        Request::Lcs { a, b } => dp::lcs_with(a, b, rec),
        Request::Knapsack {
            weights,
            values,
            capacity,
        } => dp::knapsack_with(weights, values, *capacity, rec),
        Request::CoinChange { coins, amount } => dp::coin_change_with(coins, *amount, rec),
        Request::Convolution(config) => convolution::convolve_with(config, rec),
    };
    if let Err(e) = &result {
        log::warn!("{} rejected: {}", request.algorithm().name(), e);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Outcome;

    #[test]
    fn names_round_trip() {
        for a in Algorithm::ALL {
            assert_eq!(Algorithm::from_name(a.name()), Some(a));
        }
        assert_eq!(Algorithm::from_name("Coin_Change"), Some(Algorithm::CoinChange));
        assert_eq!(Algorithm::from_name("bogo"), None);
    }

    #[test]
    fn unknown_algorithm_is_reported() {
        assert_eq!(
            parse_request("bogo", "1 2 3"),
            Err(VizError::UnknownAlgorithm("bogo".to_string()))
        );
    }

    #[test]
    fn search_needs_a_target() {
        assert!(matches!(parse_request("binary", "1 2 3"), Err(VizError::InvalidConfig(_))));
        let req = parse_request("binary", "1, 3, 5, 7 | 5").unwrap();
        assert_eq!(
            req,
            Request::BinarySearch {
                values: vec![1, 3, 5, 7],
                target: 5
            }
        );
        assert_eq!(generate(&req).unwrap().outcome, Outcome::Found(2));
    }

    #[test]
    fn huffman_accepts_table_or_text() {
        let table = parse_request("huffman", "a:5, b:9, c:12").unwrap();
        assert!(matches!(table, Request::Huffman { text: None, .. }));
        let text = parse_request("huffman", "abracadabra").unwrap();
        match text {
            Request::Huffman { symbols, text } => {
                assert_eq!(symbols[0], ("a".to_string(), 5));
                assert_eq!(text.as_deref(), Some("abracadabra"));
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn convolution_defaults_stride_and_padding() {
        let req = parse_request("convolution", "1 2; 3 4 | 1").unwrap();
        match req {
            Request::Convolution(c) => {
                assert_eq!((c.stride, c.padding), (1, 0));
                assert_eq!(c.kernel, vec![vec![1.0]]);
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn every_algorithm_dispatches() {
        let inputs = [
            ("bubble", "3 1 2"),
            ("bst", "50 30 70 | 30"),
            ("successor", "50 30 70 | 30"),
            ("levelorder", "2 1 3"),
            ("activity", "1-4, 3-5, 5-7"),
            ("fractional", "10:60, 20:100, 30:120 | 50"),
            ("fibonacci", "10"),
            ("lcs", "ABCBDAB | BDCABA"),
            ("knapsack", "1 3 4 5 | 1 4 5 7 | 7"),
            ("coins", "1 2 5 | 11"),
        ];
        for (name, input) in inputs {
            let req = parse_request(name, input).unwrap();
            let run = generate(&req).unwrap();
            assert_eq!(run.algorithm, req.algorithm());
            assert!(!run.is_empty(), "{} produced no steps", name);
        }
    }
}
