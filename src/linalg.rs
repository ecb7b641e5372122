//! Truncated singular value decompositions and related helpers
//!
//! The decompositions are computed from the symmetric eigendecomposition of the smaller Gram
//! matrix (`X X^T` or `X^T X`), and the randomized variant first projects the data onto an
//! orthonormal basis of its approximate range. Dense kernels come from `linfa-linalg`, so no
//! system LAPACK is required.
use linfa_linalg::{eigh::Eigh, qr::QRInto};
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_rand::{rand::Rng, rand_distr::StandardNormal, RandomExt};

use crate::error::Result;
use crate::Float;

/// Truncated singular value decomposition `X ~ U diag(s) V^T`
#[derive(Debug, Clone, PartialEq)]
pub struct Svd<F> {
    /// Left singular vectors as columns, `(n_rows, k)`
    pub u: Array2<F>,
    /// Singular values in descending order
    pub s: Array1<F>,
    /// Right singular vectors as rows, `(k, n_cols)`
    pub vt: Array2<F>,
}

/// Eigenpairs of a symmetric matrix, sorted by descending eigenvalue
fn eigh_desc<F: Float>(gram: &Array2<F>) -> Result<(Array1<F>, Array2<F>)> {
    let (vals, vecs) = gram.eigh()?;

    let mut order = (0..vals.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        vals[b]
            .partial_cmp(&vals[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok((vals.select(Axis(0), &order), vecs.select(Axis(1), &order)))
}

/// Exact truncated SVD with the `k` largest singular values
///
/// Singular values below `sqrt(max(n, p) * eps) * s_max` are considered zero and their singular
/// vectors are set to zero, as they cannot be recovered from the Gram matrix.
pub fn thin_svd<F: Float, S: Data<Elem = F>>(x: &ArrayBase<S, Ix2>, k: usize) -> Result<Svd<F>> {
    let (n, p) = x.dim();
    let k = k.min(n).min(p);

    let small_rows = n <= p;
    let gram = if small_rows { x.dot(&x.t()) } else { x.t().dot(x) };
    let (vals, vecs) = eigh_desc(&gram)?;

    let s = vals
        .slice(s![..k])
        .mapv(|v| if v > F::zero() { v.sqrt() } else { F::zero() });
    let vecs = vecs.slice(s![.., ..k]).to_owned();

    let largest = s.get(0).copied().unwrap_or_else(F::zero);
    let cutoff = rank_cutoff((n, p), largest);
    let inv_s = s.mapv(|v| if v > cutoff { v.recip() } else { F::zero() });

    let (u, vt) = if small_rows {
        // V^T = diag(1/s) U^T X
        let vt = (&vecs * &inv_s.view().insert_axis(Axis(0))).t().dot(x);
        (vecs, vt)
    } else {
        // U = X V diag(1/s)
        let u = x.dot(&vecs) * &inv_s.view().insert_axis(Axis(0));
        (u, vecs.reversed_axes())
    };

    Ok(Svd { u, s, vt })
}

// Squaring in the Gram matrix halves the attainable precision of the singular values
fn rank_cutoff<F: Float>(shape: (usize, usize), largest: F) -> F {
    (F::cast(shape.0.max(shape.1)) * F::epsilon()).sqrt() * largest
}

/// Number of singular values of a `shape` matrix that [`thin_svd`] treats as non-zero
pub fn effective_rank<F: Float>(s: &Array1<F>, shape: (usize, usize)) -> usize {
    let largest = s.iter().copied().fold(F::zero(), F::max);
    if !(largest > F::zero()) {
        return 0;
    }
    let cutoff = rank_cutoff(shape, largest);
    s.iter().filter(|&&v| v > cutoff).count()
}

/// Orthonormal basis of the column space of `y`, which must have at least as many rows as
/// columns
fn orthonormalize<F: Float>(y: Array2<F>) -> Result<Array2<F>> {
    Ok(y.qr_into()?.generate_q())
}

/// Randomized truncated SVD
///
/// Follows the range finder of Halko, Martinsson & Tropp: a Gaussian test matrix with
/// `k + n_oversamples` columns is multiplied with `X`, refined with `n_iter` QR-normalized power
/// iterations and the exact decomposition is computed in the reduced space. When the sketch is
/// not smaller than the matrix the exact decomposition is returned directly.
pub fn randomized_svd<F: Float, S: Data<Elem = F>, R: Rng>(
    x: &ArrayBase<S, Ix2>,
    k: usize,
    n_oversamples: usize,
    n_iter: usize,
    rng: &mut R,
) -> Result<Svd<F>> {
    let (n, p) = x.dim();
    let l = k + n_oversamples;
    if l >= n.min(p) {
        return thin_svd(x, k);
    }

    let omega = Array2::<f64>::random_using((p, l), StandardNormal, rng).mapv(F::cast);
    let mut q = orthonormalize(x.dot(&omega))?;

    for _ in 0..n_iter {
        let z = orthonormalize(x.t().dot(&q))?;
        q = orthonormalize(x.dot(&z))?;
    }

    let b = q.t().dot(x);
    let Svd { u, s, vt } = thin_svd(&b, k)?;

    Ok(Svd {
        u: q.dot(&u),
        s,
        vt,
    })
}

/// Flip the signs of singular vector pairs so that the largest absolute entry of every row of
/// `vt` is positive
pub fn flip_signs<F: Float>(u: &mut Array2<F>, vt: &mut Array2<F>) {
    for (mut row, mut col) in vt.outer_iter_mut().zip(u.axis_iter_mut(Axis(1))) {
        let largest = row
            .iter()
            .fold(F::zero(), |acc, &v| if v.abs() > acc.abs() { v } else { acc });

        if largest < F::zero() {
            row.mapv_inplace(|v| -v);
            col.mapv_inplace(|v| -v);
        }
    }
}

/// Pseudo-inverse `C^T (C C^T)^+` of a matrix with linearly independent rows
///
/// The result has shape `(n_cols, n_rows)`. Directions with vanishing eigenvalue of `C C^T` are
/// dropped, which gives the Moore-Penrose inverse for rank deficient inputs as well.
pub fn pinv_rows<F: Float, S: Data<Elem = F>>(c: &ArrayBase<S, Ix2>) -> Result<Array2<F>> {
    let gram = c.dot(&c.t());
    let (vals, vecs) = eigh_desc(&gram)?;

    let largest = vals.get(0).copied().unwrap_or_else(F::zero);
    let cutoff = F::cast(gram.nrows().max(1)) * F::epsilon() * largest;
    let inv = vals.mapv(|v| if v > cutoff { v.recip() } else { F::zero() });

    let gram_inv = (&vecs * &inv.insert_axis(Axis(0))).dot(&vecs.t());

    Ok(c.t().dot(&gram_inv))
}
