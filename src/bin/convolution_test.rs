#![cfg(not(tarpaulin_include))]

use algoviz::convolution::{ConvolutionConfig, Matrix, convolve};
use algoviz::errors::VizError;
use algoviz::step::{Outcome, StepKind, Value, WorkingState};

fn ramp(rows: usize, cols: usize) -> Matrix {
    (0..rows)
        .map(|r| (0..cols).map(|c| (r * cols + c + 1) as f64).collect())
        .collect()
}

fn vertical_edge() -> Matrix {
    vec![vec![1.0, 0.0, -1.0]; 3]
}

fn test_vertical_edge_kernel() {
    println!("\n====== Testing 5x5 ramp with an edge kernel ======");
    let config = ConvolutionConfig {
        image: ramp(5, 5),
        kernel: vertical_edge(),
        stride: 1,
        padding: 0,
    };
    let run = convolve(&config).unwrap();
    let Outcome::Matrix(out) = &run.outcome else {
        panic!("unexpected outcome {:?}", run.outcome);
    };
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|row| row.len() == 3));
    assert_eq!(out[0][0], -6.0);
    assert!(out.iter().flatten().all(|&v| v == -6.0));
    println!("✓ output is 3x3 and cell (0,0) = -6");

    assert_eq!(run.count(StepKind::Assign), 9);
    assert_eq!(run.len(), 9);
    let last = run.steps.last().unwrap();
    assert_eq!(last.index_keys(), vec![2, 2]);
    assert_eq!(last.values.get("top"), Some(&Value::Int(2)));
    assert_eq!(last.state, WorkingState::Matrix(out.clone()));
    println!("✓ one assign per output cell with its receptive field origin");
}

fn test_stride_and_padding() {
    println!("\n====== Testing stride and padding ======");
    let config = ConvolutionConfig {
        image: ramp(5, 5),
        kernel: vertical_edge(),
        stride: 2,
        padding: 1,
    };
    let run = convolve(&config).unwrap();
    let Outcome::Matrix(out) = &run.outcome else {
        panic!("unexpected outcome {:?}", run.outcome);
    };
    assert_eq!((out.len(), out[0].len()), (3, 3));
    // top-left window: the +1 column is all padding, the -1 column reads 2 and 7
    assert_eq!(out[0][0], -9.0);
    println!("✓ stride 2, padding 1 gives 3x3 with zero borders");
}

fn test_rejections() {
    println!("\n====== Testing invalid configurations ======");
    let too_big = ConvolutionConfig {
        image: ramp(2, 2),
        kernel: vertical_edge(),
        stride: 1,
        padding: 0,
    };
    assert!(matches!(convolve(&too_big), Err(VizError::Infeasible(_))));
    println!("✓ a kernel larger than the padded image is infeasible");

    let ragged = ConvolutionConfig {
        image: vec![vec![1.0, 2.0], vec![3.0]],
        kernel: vec![vec![1.0]],
        stride: 1,
        padding: 0,
    };
    assert!(matches!(convolve(&ragged), Err(VizError::InvalidConfig(_))));

    let no_stride = ConvolutionConfig {
        image: ramp(3, 3),
        kernel: vec![vec![1.0]],
        stride: 0,
        padding: 0,
    };
    assert!(matches!(convolve(&no_stride), Err(VizError::InvalidConfig(_))));
    println!("✓ ragged matrices and zero stride are invalid");
}

pub fn run_tests() {
    println!("Starting convolution tests");
    test_vertical_edge_kernel();
    test_stride_and_padding();
    test_rejections();
    println!("All tests passed!");
}

fn main() {
    run_tests();
}

#[cfg(test)]
mod tests {
    #[test]
    fn vertical_edge_kernel() {
        super::test_vertical_edge_kernel();
    }

    #[test]
    fn stride_and_padding() {
        super::test_stride_and_padding();
    }

    #[test]
    fn rejections() {
        super::test_rejections();
    }
}
