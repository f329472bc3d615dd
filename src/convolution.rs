use serde::{Deserialize, Serialize};

use crate::catalog::Algorithm;
use crate::errors::{Result, VizError};
use crate::recorder::StepRecorder;
use crate::step::{Outcome, Run, Step, StepKind, WorkingState};

pub type Matrix = Vec<Vec<f64>>;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ConvolutionConfig {
    pub image: Matrix,
    pub kernel: Matrix,
    pub stride: usize,
    pub padding: usize,
}

fn dims(name: &str, m: &Matrix) -> Result<(usize, usize)> {
    let rows = m.len();
    let cols = m.first().map_or(0, |r| r.len());
    if rows == 0 || cols == 0 {
        return Err(VizError::invalid(format!("{} is empty", name)));
    }
    if m.iter().any(|r| r.len() != cols) {
        return Err(VizError::invalid(format!("{} rows have different lengths", name)));
    }
    if m.iter().flatten().any(|v| !v.is_finite()) {
        return Err(VizError::invalid(format!("{} holds a non-numeric value", name)));
    }
    Ok((rows, cols))
}

/// `floor((dim + 2 * padding - kernel) / stride) + 1` for one axis; `None` when not positive.
pub fn output_dim(dim: usize, kernel: usize, stride: usize, padding: usize) -> Option<usize> {
    let padded = dim + 2 * padding;
    if stride == 0 || padded < kernel {
        return None;
    }
    Some((padded - kernel) / stride + 1)
}

pub fn pad(image: &Matrix, padding: usize) -> Matrix {
    let cols = image.first().map_or(0, |r| r.len()) + 2 * padding;
    let mut out = vec![vec![0.0; cols]; padding];
    for row in image {
        let mut padded = vec![0.0; padding];
        padded.extend_from_slice(row);
        padded.resize(cols, 0.0);
        out.push(padded);
    }
    out.extend(std::iter::repeat_n(vec![0.0; cols], padding));
    out
}

pub fn convolve(config: &ConvolutionConfig) -> Result<Run> {
    convolve_with(config, &mut StepRecorder::new())
}

pub fn convolve_with(config: &ConvolutionConfig, rec: &mut StepRecorder) -> Result<Run> {
    let (rows, cols) = dims("image", &config.image)?;
    let (kr, kc) = dims("kernel", &config.kernel)?;
    if config.stride == 0 {
        return Err(VizError::invalid("stride must be at least 1"));
    }
    let (Some(out_rows), Some(out_cols)) = (
        output_dim(rows, kr, config.stride, config.padding),
        output_dim(cols, kc, config.stride, config.padding),
    ) else {
        return Err(VizError::infeasible(format!(
            "a {}x{} kernel does not fit a {}x{} image with padding {}",
            kr, kc, rows, cols, config.padding
        )));
    };

    let padded = pad(&config.image, config.padding);
    let mut output = vec![vec![0.0; out_cols]; out_rows];
    let initial = WorkingState::Matrix(output.clone());

    for r in 0..out_rows {
        for c in 0..out_cols {
            rec.checkpoint()?;
            let (top, left) = (r * config.stride, c * config.stride);
            let mut sum = 0.0;
            for (i, krow) in config.kernel.iter().enumerate() {
                for (j, k) in krow.iter().enumerate() {
                    sum += padded[top + i][left + j] * k;
                }
            }
            output[r][c] = sum;
            rec.record(
                Step::new(StepKind::Assign, WorkingState::Matrix(output.clone()))
                    .keys([r, c])
                    .value("top", top)
                    .value("left", left)
                    .value("value", sum)
                    .note(format!("out[{}][{}] = {}", r, c, sum)),
            );
        }
    }

    log::debug!("convolution {}x{} -> {}x{}", rows, cols, out_rows, out_cols);
    Ok(Run {
        algorithm: Algorithm::Convolution,
        initial,
        steps: rec.take_steps(),
        final_state: WorkingState::Matrix(output.clone()),
        outcome: Outcome::Matrix(output),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_surrounds_with_zeros() {
        let padded = pad(&vec![vec![1.0, 2.0]], 1);
        assert_eq!(
            padded,
            vec![
                vec![0.0, 0.0, 0.0, 0.0],
                vec![0.0, 1.0, 2.0, 0.0],
                vec![0.0, 0.0, 0.0, 0.0],
            ]
        );
    }

    #[test]
    fn output_dim_floors() {
        assert_eq!(output_dim(5, 3, 2, 0), Some(2));
        assert_eq!(output_dim(5, 3, 1, 1), Some(5));
        assert_eq!(output_dim(2, 3, 1, 0), None);
    }
}
