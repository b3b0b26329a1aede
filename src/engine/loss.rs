use ndarray::Array1;

use crate::kernel;

/// Applies a max-subtracted softmax to every row.
pub fn softmax_rows(ys: &[Array1<f32>]) -> Vec<Array1<f32>> {
    ys.iter().map(|y| kernel::softmax(y.view())).collect()
}

/// The cross entropy of a window, `-Σ ln(ps[t] · targets[t])`.
///
/// Targets are expected to be one-hot, so each term is the log probability the network gave to
/// the right symbol. A zero probability yields an infinite loss.
pub fn cross_entropy(ps: &[Array1<f32>], targets: &[Array1<f32>]) -> f32 {
    assert_eq!(ps.len(), targets.len(), "cross_entropy: window length mismatch");

    ps.iter()
        .zip(targets)
        .map(|(p, target)| -p.dot(target).ln())
        .sum()
}
