use std::fs;
use std::path::Path;

use crate::error::{OptimizerError, Result, ResultExt};
use crate::problem::Matrix;
use crate::rng::RandomNumberGenerator;

/// Parses a QAPLIB `.dat` file: `n`, then the distance matrix, then the flow
/// matrix, all as whitespace-separated numbers.
///
/// Trailing tokens after the second matrix are ignored.
pub fn parse_qaplib(text: &str) -> Result<(Matrix, Matrix)> {
    let mut tokens = text.split_whitespace();
    let n: usize = tokens
        .next()
        .ok_or_else(|| OptimizerError::Parse("empty instance file".to_string()))?
        .parse()
        .map_err(|e| OptimizerError::Parse(format!("invalid dimension: {}", e)))?;
    if n == 0 {
        return Err(OptimizerError::Parse("dimension must be at least 1".to_string()));
    }
    let len = n
        .checked_mul(n)
        .ok_or_else(|| OptimizerError::Parse(format!("dimension {} is too large", n)))?;

    let mut read_matrix = |label: &str| -> Result<Matrix> {
        let values = tokens
            .by_ref()
            .take(len)
            .map(|token| {
                token.parse::<f64>().map_err(|e| {
                    OptimizerError::Parse(format!("invalid {} entry {:?}: {}", label, token, e))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        if values.len() != len {
            return Err(OptimizerError::Parse(format!(
                "{} matrix has {} entries, expected {}",
                label,
                values.len(),
                len
            )));
        }
        Matrix::square(n, values)
    };

    let distance = read_matrix("distance")?;
    let flow = read_matrix("flow")?;
    Ok((distance, flow))
}

/// Reads and parses a QAPLIB file from disk.
pub fn load_qaplib(path: &Path) -> Result<(Matrix, Matrix)> {
    let text = fs::read_to_string(path).context(format!("reading {}", path.display()))?;
    parse_qaplib(&text)
}

/// Derives a stable 64-bit seed from an instance name.
pub fn seed_from_name(name: &str) -> u64 {
    let hash = blake3::hash(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Generates a reproducible instance of size `n` for `name`.
///
/// Facilities sit on a square grid with Manhattan distances; flows are
/// symmetric integers in `0..10`. Both diagonals are zero.
pub fn synthetic(name: &str, n: usize) -> (Matrix, Matrix) {
    let mut rng = RandomNumberGenerator::from_seed(seed_from_name(name));
    let width = (n as f64).sqrt().ceil().max(1.0) as usize;

    let mut distance = Matrix::zeros(n, n);
    let mut flow = Matrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = ((i % width).abs_diff(j % width) + (i / width).abs_diff(j / width)) as f64;
            distance.set(i, j, d);
            distance.set(j, i, d);

            let f = rng.int_in(0, 10) as f64;
            flow.set(i, j, f);
            flow.set(j, i, f);
        }
    }
    (distance, flow)
}
