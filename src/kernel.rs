//! Dense vector and matrix primitives used by the forward and backward passes.
//!
//! Every function returns a freshly allocated result. Mismatched dimensions are programming
//! errors and panic.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Multiplies the matrix `m` by the column vector `v`.
pub fn mat_vec(m: ArrayView2<'_, f32>, v: ArrayView1<'_, f32>) -> Array1<f32> {
    assert_eq!(
        m.ncols(),
        v.len(),
        "mat_vec: matrix has {} columns, vector has {} elements",
        m.ncols(),
        v.len()
    );
    m.dot(&v)
}

pub fn tanh(v: ArrayView1<'_, f32>) -> Array1<f32> {
    v.mapv(f32::tanh)
}

pub fn exp(v: ArrayView1<'_, f32>) -> Array1<f32> {
    v.mapv(f32::exp)
}

pub fn sum(v: ArrayView1<'_, f32>) -> f32 {
    v.sum()
}

pub fn div_scalar(v: ArrayView1<'_, f32>, s: f32) -> Array1<f32> {
    &v / s
}

/// Adds element-wise every vector in `vs`.
pub fn add_all(vs: &[ArrayView1<'_, f32>]) -> Array1<f32> {
    let Some(first) = vs.first() else {
        panic!("add_all: nothing to add");
    };

    let mut out = first.to_owned();
    for v in &vs[1..] {
        assert_eq!(out.len(), v.len(), "add_all: vector length mismatch");
        out += v;
    }
    out
}

/// Computes `a · bᵀ`, an `a.len() × b.len()` matrix.
pub fn outer(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> Array2<f32> {
    let col = a.insert_axis(Axis(1));
    let row = b.insert_axis(Axis(0));
    col.dot(&row)
}

/// Normalizes `v` into a probability vector, subtracting the max before exponentiating.
pub fn softmax(v: ArrayView1<'_, f32>) -> Array1<f32> {
    let max = v.fold(f32::NEG_INFINITY, |acc, &x| acc.max(x));
    let e = exp((&v - max).view());
    let total = sum(e.view());
    div_scalar(e.view(), total)
}

/// Returns the index of the largest element, the first one on ties.
pub fn argmax(v: ArrayView1<'_, f32>) -> usize {
    v.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, max), (i, &x)| {
            if x > max { (i, x) } else { (best, max) }
        })
        .0
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};

    use super::*;

    #[test]
    fn mat_vec_product() {
        let m = arr2(&[[1., 2., 3.], [4., 5., 6.]]);
        let v = arr1(&[1., 0., -1.]);
        assert_eq!(mat_vec(m.view(), v.view()), arr1(&[-2., -2.]));
    }

    #[test]
    #[should_panic]
    fn mat_vec_mismatch() {
        let m = arr2(&[[1., 2.], [3., 4.]]);
        let v = arr1(&[1., 2., 3.]);
        mat_vec(m.view(), v.view());
    }

    #[test]
    fn add_all_three() {
        let a = arr1(&[1., 2.]);
        let b = arr1(&[10., 20.]);
        let c = arr1(&[100., 200.]);
        assert_eq!(
            add_all(&[a.view(), b.view(), c.view()]),
            arr1(&[111., 222.])
        );
    }

    #[test]
    fn outer_shape() {
        let a = arr1(&[1., 2.]);
        let b = arr1(&[3., 4., 5.]);
        assert_eq!(
            outer(a.view(), b.view()),
            arr2(&[[3., 4., 5.], [6., 8., 10.]])
        );
    }

    #[test]
    fn softmax_sums_to_one() {
        let v = arr1(&[1., 2., 3., 4.]);
        let p = softmax(v.view());
        assert!((p.sum() - 1.).abs() < 1e-6);
        assert!(p[0] < p[1] && p[1] < p[2] && p[2] < p[3]);
    }

    #[test]
    fn softmax_large_logits() {
        let v = arr1(&[1000., 1000., 990.]);
        let p = softmax(v.view());
        assert!(p.iter().all(|x| x.is_finite()));
        assert!((p[0] - p[1]).abs() < 1e-6);
        assert!((p.sum() - 1.).abs() < 1e-6);
    }

    #[test]
    fn argmax_ties_pick_first() {
        let v = arr1(&[0.1, 0.4, 0.4, 0.1]);
        assert_eq!(argmax(v.view()), 1);
    }
}
