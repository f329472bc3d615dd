#![cfg(not(tarpaulin_include))]

use algoviz::catalog;
use algoviz::config::MAX_ARRAY_SIZE;
use algoviz::errors::VizError;
use algoviz::greedy::{Activity, Item, activity_selection, fractional_knapsack, huffman, huffman_text};
use algoviz::step::{Outcome, StepKind};
use std::collections::BTreeMap;

fn symbols(pairs: &[(&str, u64)]) -> Vec<(String, u64)> {
    pairs.iter().map(|(s, f)| (s.to_string(), *f)).collect()
}

fn codes_of(outcome: &Outcome) -> &BTreeMap<String, String> {
    match outcome {
        Outcome::Huffman { codes, .. } => codes,
        other => panic!("unexpected outcome {:?}", other),
    }
}

fn test_activity_selection() {
    println!("\n====== Testing activity selection ======");
    let activities: Vec<Activity> = [
        (1, 4),
        (3, 5),
        (0, 6),
        (5, 7),
        (3, 9),
        (5, 9),
        (6, 10),
        (8, 11),
        (8, 12),
        (2, 14),
        (12, 16),
    ]
    .iter()
    .map(|&(start, end)| Activity { start, end })
    .collect();
    let run = activity_selection(&activities).unwrap();
    assert_eq!(run.outcome, Outcome::Activities(vec![0, 3, 7, 10]));
    assert_eq!(run.count(StepKind::Compare), activities.len());
    assert_eq!(run.count(StepKind::Assign), 4);
    println!("✓ earliest finish picks activities 0, 3, 7, 10");

    // equal end times keep input order
    let tied = [Activity { start: 0, end: 2 }, Activity { start: 1, end: 2 }];
    let run = activity_selection(&tied).unwrap();
    assert_eq!(run.outcome, Outcome::Activities(vec![0]));

    let backwards = [Activity { start: 5, end: 1 }];
    assert!(matches!(activity_selection(&backwards), Err(VizError::InvalidConfig(_))));
    println!("✓ ties are stable and reversed intervals are rejected");
}

fn test_fractional_knapsack() {
    println!("\n====== Testing fractional knapsack ======");
    let items = [
        Item { weight: 10.0, value: 60.0 },
        Item { weight: 20.0, value: 100.0 },
        Item { weight: 30.0, value: 120.0 },
    ];
    let run = fractional_knapsack(&items, 50.0).unwrap();
    let Outcome::FractionalKnapsack { total, taken } = &run.outcome else {
        panic!("unexpected outcome {:?}", run.outcome);
    };
    assert!((total - 240.0).abs() < 1e-9);
    assert_eq!(taken.len(), 3);
    assert_eq!((taken[0].0, taken[1].0, taken[2].0), (0, 1, 2));
    assert!((taken[2].1 - 2.0 / 3.0).abs() < 1e-9);
    println!("✓ whole items by ratio, then two thirds of the last: {}", total);

    assert!(matches!(fractional_knapsack(&items, 0.0), Err(VizError::Infeasible(_))));
    println!("✓ zero capacity is infeasible");
}

fn test_huffman_codes() {
    println!("\n====== Testing Huffman coding ======");
    let run = huffman(&symbols(&[("a", 5), ("b", 9), ("c", 12), ("d", 13), ("e", 16), ("f", 45)])).unwrap();
    let codes = codes_of(&run.outcome);
    let expected = [("a", "1100"), ("b", "1101"), ("c", "100"), ("d", "101"), ("e", "111"), ("f", "0")];
    for (symbol, code) in expected {
        assert_eq!(codes.get(symbol).map(String::as_str), Some(code), "code for {}", symbol);
    }
    println!("✓ frequencies 5, 9, 12, 13, 16, 45 give the textbook codes");

    for (a, ca) in codes {
        for (b, cb) in codes {
            assert!(a == b || !cb.starts_with(ca.as_str()), "{} is a prefix of {}", ca, cb);
        }
    }
    println!("✓ codes are prefix-free");

    let run = huffman(&symbols(&[("x", 1), ("y", 1), ("z", 1)])).unwrap();
    let codes = codes_of(&run.outcome);
    assert_eq!(codes["z"], "0");
    assert_eq!(codes["x"], "10");
    assert_eq!(codes["y"], "11");
    println!("✓ ties break by insertion order");
}

fn test_huffman_edges() {
    println!("\n====== Testing Huffman edge cases ======");
    let run = huffman_text("aaa").unwrap();
    assert_eq!(
        run.outcome,
        Outcome::Huffman {
            codes: BTreeMap::from([("a".to_string(), "0".to_string())]),
            encoded: Some("000".to_string()),
        }
    );
    println!("✓ a single symbol gets code 0");

    let run = huffman_text("abracadabra").unwrap();
    let Outcome::Huffman { codes, encoded } = &run.outcome else {
        panic!("unexpected outcome {:?}", run.outcome);
    };
    let bits = encoded.as_ref().unwrap();
    let expected_len: usize = "abracadabra".chars().map(|c| codes[&c.to_string()].len()).sum();
    assert_eq!(bits.len(), expected_len);
    assert_eq!(codes["a"].len(), 1);
    println!("✓ text is encoded with its own table: {}", bits);

    assert!(matches!(huffman(&symbols(&[("a", 0)])), Err(VizError::InvalidConfig(_))));
    assert!(matches!(huffman(&symbols(&[("a", 1), ("a", 2)])), Err(VizError::InvalidConfig(_))));
    assert!(matches!(huffman(&[]), Err(VizError::InvalidConfig(_))));
    println!("✓ zero frequencies, duplicates and empty tables are rejected");
}

fn test_oversized_inputs() {
    println!("\n====== Testing oversized inputs ======");
    let request = catalog::parse_request("huffman", "a:18446744073709551615, b:1").unwrap();
    assert!(matches!(catalog::generate(&request), Err(VizError::InvalidConfig(_))));
    let run = huffman(&symbols(&[("a", u64::MAX - 1), ("b", 1)])).unwrap();
    assert_eq!(codes_of(&run.outcome).len(), 2);
    println!("✓ frequencies are accepted up to a total of u64::MAX");

    let table: Vec<(String, u64)> = (0..=MAX_ARRAY_SIZE).map(|i| (format!("s{}", i), 1)).collect();
    assert!(matches!(huffman(&table), Err(VizError::InvalidConfig(_))));
    let activities: Vec<Activity> = (0..=MAX_ARRAY_SIZE as i64).map(|i| Activity { start: i, end: i + 1 }).collect();
    assert!(matches!(activity_selection(&activities), Err(VizError::InvalidConfig(_))));
    let items = vec![Item { weight: 1.0, value: 1.0 }; MAX_ARRAY_SIZE + 1];
    assert!(matches!(fractional_knapsack(&items, 10.0), Err(VizError::InvalidConfig(_))));
    println!("✓ over-long symbol, activity and item lists are rejected");
}

pub fn run_tests() {
    println!("Starting greedy algorithm tests");
    test_activity_selection();
    test_fractional_knapsack();
    test_huffman_codes();
    test_huffman_edges();
    test_oversized_inputs();
    println!("All tests passed!");
}

fn main() {
    run_tests();
}

#[cfg(test)]
mod tests {
    #[test]
    fn activity_selection() {
        super::test_activity_selection();
    }

    #[test]
    fn fractional_knapsack() {
        super::test_fractional_knapsack();
    }

    #[test]
    fn huffman_codes() {
        super::test_huffman_codes();
    }

    #[test]
    fn huffman_edges() {
        super::test_huffman_edges();
    }

    #[test]
    fn oversized_inputs() {
        super::test_oversized_inputs();
    }
}
