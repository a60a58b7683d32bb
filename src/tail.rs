//! High-frequency tail fitting.
//!
//! A function on a Matsubara mesh is approximated far from the origin by the
//! truncated Laurent series
//!
//! ```text
//! F(iω) ≈ Σ_{m=0}^{order-1} c_m (iω)^{-m}
//! ```
//!
//! where `c_0` is the constant (0th) moment. The fit uses the points with
//! `|ω| ≥ (1 - tail_fraction) ω_max` on both half-axes. Columns are scaled by
//! `ω_max^m` so that every basis function is of order one on the fit window, and
//! the least-squares problem is solved with a complex SVD.
//!
//! Fitting is exposed through the [`TailFitter`] trait so that callers can swap in
//! their own routine; [`LeastSquaresTailFitter`] is the default.

use log::{debug, warn};
use nalgebra::{Complex, DMatrix, Normed};
use serde::{Deserialize, Serialize};

use crate::error::{CheckError, Result};
use crate::gf::{is_finite_block, Block, GreensFunction};

/// Controls the fit window and the expansion order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailFitOptions {
    /// Fraction of each half-axis, counted from `ω_max` inwards, used for the fit.
    pub tail_fraction: f64,
    /// Upper bound on the number of coefficients when the order is chosen automatically.
    pub max_order: usize,
    /// Fixed number of coefficients; `None` selects it from `ω_max`.
    pub expansion_order: Option<usize>,
    /// Smallest `ω_max^{-m}` that is still resolved in double precision.
    pub order_threshold: f64,
}

impl Default for TailFitOptions {
    fn default() -> Self {
        Self {
            tail_fraction: 0.2,
            max_order: 30,
            expansion_order: None,
            order_threshold: 1e-16,
        }
    }
}

impl TailFitOptions {
    /// Override the fraction of the mesh used for fitting.
    pub fn with_tail_fraction(mut self, tail_fraction: f64) -> Self {
        self.tail_fraction = tail_fraction;
        self
    }

    /// Fix the number of fitted coefficients.
    pub fn with_expansion_order(mut self, order: usize) -> Self {
        self.expansion_order = Some(order);
        self
    }

    /// Cap the automatically selected order.
    pub fn with_max_order(mut self, max_order: usize) -> Self {
        self.max_order = max_order;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tail_fraction > 0.0 && self.tail_fraction <= 1.0) {
            return Err(CheckError::invalid_option("tail_fraction", self.tail_fraction));
        }
        if self.max_order == 0 {
            return Err(CheckError::invalid_option("max_order", 0.0));
        }
        if self.expansion_order == Some(0) {
            return Err(CheckError::invalid_option("expansion_order", 0.0));
        }
        if !(self.order_threshold > 0.0 && self.order_threshold < 1.0) {
            return Err(CheckError::invalid_option(
                "order_threshold",
                self.order_threshold,
            ));
        }
        Ok(())
    }
}

/// Coefficients of a fitted tail together with the fit quality.
#[derive(Clone, Debug)]
pub struct TailFit {
    coefficients: Vec<Block>,
    residual: f64,
    fit_points: usize,
}

impl TailFit {
    /// Assembles a fit result, e.g. from an external fitting routine. At least the
    /// constant moment must be present.
    pub fn new(coefficients: Vec<Block>, residual: f64, fit_points: usize) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(CheckError::FitFailed {
                context: "a tail fit needs at least the constant moment",
            });
        }
        Ok(Self {
            coefficients,
            residual,
            fit_points,
        })
    }

    /// Moments `c_0, c_1, ...` in increasing inverse power.
    pub fn coefficients(&self) -> &[Block] {
        &self.coefficients
    }

    /// Number of coefficients, i.e. the expansion order.
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// The constant moment `c_0`.
    pub fn leading(&self) -> &Block {
        &self.coefficients[0]
    }

    /// Largest absolute deviation between the series and the data on the fit window.
    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// Number of mesh points inside the fit window.
    pub fn fit_points(&self) -> usize {
        self.fit_points
    }

    /// Sums the series at `z` (Horner scheme in `1/z`).
    pub fn evaluate(&self, z: Complex<f64>) -> Block {
        let w = z.inv();
        let mut coefficients = self.coefficients.iter().rev();
        let mut value = coefficients.next().cloned().unwrap_or_else(|| Block::zeros(0, 0));
        for c in coefficients {
            value = value * w + c;
        }
        value
    }
}

/// A routine that extracts high-frequency moments from tabulated data.
pub trait TailFitter {
    /// Fits the tail of `gf`. The leading `known_moments` are held fixed and returned
    /// unchanged as the first coefficients.
    fn fit_tail(&self, gf: &GreensFunction, known_moments: &[Block]) -> Result<TailFit>;
}

/// Least-squares fit of the truncated Laurent series on the outer part of the mesh.
#[derive(Clone, Debug, Default)]
pub struct LeastSquaresTailFitter {
    options: TailFitOptions,
}

impl LeastSquaresTailFitter {
    /// Fitter with the given window and order settings.
    pub fn new(options: TailFitOptions) -> Self {
        Self { options }
    }

    /// Settings applied on every call to [`fit_tail`](TailFitter::fit_tail).
    pub fn options(&self) -> &TailFitOptions {
        &self.options
    }
}

impl TailFitter for LeastSquaresTailFitter {
    fn fit_tail(&self, gf: &GreensFunction, known_moments: &[Block]) -> Result<TailFit> {
        self.options.validate()?;
        let dim = gf.target_dim();
        for moment in known_moments {
            if moment.nrows() != dim || moment.ncols() != dim {
                return Err(CheckError::dimension_mismatch(
                    "known moment shape",
                    dim,
                    moment.nrows().max(moment.ncols()),
                ));
            }
        }

        let mesh = gf.mesh();
        let omega_max = mesh.omega_max();
        let cutoff = (1.0 - self.options.tail_fraction) * omega_max;
        let window: Vec<usize> = (0..mesh.len())
            .filter(|&i| mesh.frequency(i).abs() >= cutoff)
            .collect();

        let known = known_moments.len();
        let order = match self.options.expansion_order {
            Some(order) => {
                let order = order.max(known);
                if order - known > window.len() {
                    return Err(CheckError::InsufficientTailPoints {
                        available: window.len(),
                        required: order - known,
                    });
                }
                order
            }
            None => {
                let automatic = expansion_order(
                    omega_max,
                    self.options.max_order,
                    self.options.order_threshold,
                )
                .max(known);
                if automatic - known > window.len() {
                    warn!(
                        "tail order {automatic} exceeds the {} points in the fit window; clamping",
                        window.len()
                    );
                    known + window.len()
                } else {
                    automatic
                }
            }
        };
        let free = order - known;
        debug!(
            "tail fit: {} window points with |w| >= {cutoff:.4}, order {order} ({known} known)",
            window.len()
        );

        let mut coefficients: Vec<Block> = known_moments.to_vec();
        if free > 0 {
            let scale = Complex::new(omega_max, 0.0);
            let design = DMatrix::from_fn(window.len(), free, |row, col| {
                (scale / mesh.point(window[row])).powi((known + col) as i32)
            });
            let rhs = DMatrix::from_fn(window.len(), dim * dim, |row, col| {
                let index = window[row];
                let z = mesh.point(index);
                let (a, b) = (col / dim, col % dim);
                let fixed: Complex<f64> = known_moments
                    .iter()
                    .enumerate()
                    .map(|(m, c)| c[(a, b)] * z.powi(-(m as i32)))
                    .sum();
                gf.value(index)[(a, b)] - fixed
            });

            let svd = design.svd(true, true);
            let eps = svd.singular_values.max() * f64::EPSILON;
            let rank = svd.rank(eps);
            if rank < free {
                warn!("tail design matrix is rank deficient: rank {rank} of {free}");
            }
            let solution = svd.solve(&rhs, eps).map_err(|_| CheckError::FitFailed {
                context: "singular value decomposition did not provide U and V",
            })?;

            for col in 0..free {
                let power = omega_max.powi((known + col) as i32);
                coefficients.push(Block::from_fn(dim, dim, |a, b| {
                    solution[(col, a * dim + b)] * power
                }));
            }
        }

        if !coefficients.iter().all(is_finite_block) {
            return Err(CheckError::NumericalError {
                context: "tail coefficients",
            });
        }

        let mut fit = TailFit::new(coefficients, 0.0, window.len())?;
        let residual = window
            .iter()
            .flat_map(|&index| {
                let model = fit.evaluate(mesh.point(index));
                let data = gf.value(index);
                model
                    .iter()
                    .zip(data.iter())
                    .map(|(m, d)| (m - d).norm())
                    .collect::<Vec<_>>()
            })
            .fold(0.0, f64::max);
        fit.residual = residual;
        Ok(fit)
    }
}

/// Number of tail coefficients resolvable on a mesh extending to `omega_max`.
///
/// Returns the largest `n ≤ max_order` with `omega_max^{-(n-1)} > threshold`, or
/// `max_order` when `omega_max ≤ 1` and the powers never decay.
pub fn expansion_order(omega_max: f64, max_order: usize, threshold: f64) -> usize {
    if omega_max <= 1.0 {
        return max_order.max(1);
    }
    (1..=max_order)
        .rev()
        .find(|&n| omega_max.powi(1 - n as i32) > threshold)
        .unwrap_or(1)
}

/// Analytic truncation error `(r_inf / (fit_fraction · omega_max))^order` of a tail
/// fit whose series converges for `|z| > r_inf`.
pub fn truncation_error(r_inf: f64, fit_fraction: f64, omega_max: f64, order: usize) -> f64 {
    (r_inf / (fit_fraction * omega_max)).powi(order as i32)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::gf::scalar_block;
    use crate::mesh::MatsubaraMesh;

    fn series(coefficients: &[f64]) -> impl Fn(Complex<f64>) -> Complex<f64> + '_ {
        move |z| {
            coefficients
                .iter()
                .enumerate()
                .map(|(m, c)| z.powi(-(m as i32)) * *c)
                .sum()
        }
    }

    fn tabulate(mesh: &MatsubaraMesh, coefficients: &[f64]) -> GreensFunction {
        let f = series(coefficients);
        GreensFunction::from_fn(mesh.clone(), 1, |z| scalar_block(1, f(z))).unwrap()
    }

    #[test]
    fn recovers_polynomial_tail_with_fixed_order() {
        let mesh = MatsubaraMesh::fermionic(100.0, 200).unwrap();
        let gf = tabulate(&mesh, &[0.3, 0.5, -0.2, 0.1]);
        let fitter = LeastSquaresTailFitter::new(TailFitOptions::default().with_expansion_order(4));
        let fit = fitter.fit_tail(&gf, &[]).unwrap();

        assert_eq!(fit.order(), 4);
        assert_eq!(fit.fit_points(), 2 * 40);
        for (c, expected) in fit.coefficients().iter().zip([0.3, 0.5, -0.2, 0.1]) {
            assert_relative_eq!(c[(0, 0)].re, expected, epsilon = 1e-6);
            assert!(c[(0, 0)].im.abs() < 1e-6);
        }
        assert!(fit.residual() < 1e-12);
    }

    #[test]
    fn automatic_order_extracts_leading_moment() {
        let mesh = MatsubaraMesh::fermionic(500.0, 1000).unwrap();
        let gf = GreensFunction::from_fn(mesh.clone(), 1, |z| {
            // Single pole at 0.8 with weight 1.5, shifted by a constant.
            scalar_block(1, Complex::new(-0.25, 0.0) + (z - 0.8).inv() * 1.5)
        })
        .unwrap();
        let fit = LeastSquaresTailFitter::default().fit_tail(&gf, &[]).unwrap();

        assert_eq!(fit.order(), 15);
        assert_relative_eq!(fit.leading()[(0, 0)].re, -0.25, epsilon = 1e-9);
        assert_relative_eq!(fit.coefficients()[1][(0, 0)].re, 1.5, epsilon = 1e-7);
        let z = mesh.point(mesh.len() - 1);
        let value = fit.evaluate(z)[(0, 0)];
        assert_relative_eq!(value.re, gf.value(mesh.len() - 1)[(0, 0)].re, epsilon = 1e-12);
    }

    #[test]
    fn known_moments_are_kept_fixed() {
        let mesh = MatsubaraMesh::fermionic(100.0, 200).unwrap();
        let gf = tabulate(&mesh, &[0.3, 0.5, -0.2]);
        let known = [scalar_block(1, Complex::new(0.3, 0.0))];
        let fitter = LeastSquaresTailFitter::new(TailFitOptions::default().with_expansion_order(3));
        let fit = fitter.fit_tail(&gf, &known).unwrap();

        assert_eq!(fit.order(), 3);
        assert_eq!(fit.leading(), &known[0]);
        assert_relative_eq!(fit.coefficients()[1][(0, 0)].re, 0.5, epsilon = 1e-8);
        assert_relative_eq!(fit.coefficients()[2][(0, 0)].re, -0.2, epsilon = 1e-6);
    }

    #[test]
    fn fits_each_matrix_element() {
        let mesh = MatsubaraMesh::fermionic(50.0, 100).unwrap();
        let gf = GreensFunction::from_fn(mesh, 2, |z| {
            let w = z.inv();
            DMatrix::from_row_slice(
                2,
                2,
                &[
                    Complex::new(1.0, 0.0) + w,
                    w * w * 0.5,
                    w * w * 0.5,
                    Complex::new(-2.0, 0.0) + w * 3.0,
                ],
            )
        })
        .unwrap();
        let fitter = LeastSquaresTailFitter::new(TailFitOptions::default().with_expansion_order(3));
        let fit = fitter.fit_tail(&gf, &[]).unwrap();

        let c0 = fit.leading();
        assert_relative_eq!(c0[(0, 0)].re, 1.0, epsilon = 1e-9);
        assert_relative_eq!(c0[(1, 1)].re, -2.0, epsilon = 1e-9);
        assert!(c0[(0, 1)].norm() < 1e-9);
        assert_relative_eq!(fit.coefficients()[2][(1, 0)].re, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn order_is_clamped_to_the_fit_window() {
        let mesh = MatsubaraMesh::fermionic(500.0, 1).unwrap();
        let gf = tabulate(&mesh, &[0.1, 1.0]);
        let fit = LeastSquaresTailFitter::default().fit_tail(&gf, &[]).unwrap();
        assert_eq!(fit.order(), 2);
        assert_eq!(fit.fit_points(), 2);

        let fixed = LeastSquaresTailFitter::new(TailFitOptions::default().with_expansion_order(5));
        assert!(matches!(
            fixed.fit_tail(&gf, &[]),
            Err(CheckError::InsufficientTailPoints {
                available: 2,
                required: 5
            })
        ));
    }

    #[test]
    fn rejects_invalid_options() {
        let mesh = MatsubaraMesh::fermionic(10.0, 10).unwrap();
        let gf = tabulate(&mesh, &[1.0]);
        let fitter = LeastSquaresTailFitter::new(TailFitOptions::default().with_tail_fraction(0.0));
        assert!(matches!(
            fitter.fit_tail(&gf, &[]),
            Err(CheckError::InvalidOption {
                name: "tail_fraction",
                ..
            })
        ));
    }

    #[test]
    fn expansion_order_follows_double_precision() {
        let reference = std::f64::consts::PI * 1999.0 / 500.0;
        assert_eq!(expansion_order(reference, 30, 1e-16), 15);
        assert_eq!(expansion_order(0.5, 30, 1e-16), 30);
        assert_eq!(expansion_order(1e20, 30, 1e-16), 1);
        assert!(expansion_order(100.0, 30, 1e-16) < expansion_order(10.0, 30, 1e-16));
    }

    #[test]
    fn truncation_error_shrinks_with_bandwidth_and_order() {
        let r_inf = 2.337;
        for order in 1..20 {
            let mut previous = f64::INFINITY;
            for omega_max in [3.0, 6.0, 12.0, 100.0, 1e4] {
                let err = truncation_error(r_inf, 0.8, omega_max, order);
                assert!(err < previous);
                previous = err;
            }
        }
        let omega_max = 12.56;
        assert!(
            truncation_error(r_inf, 0.8, omega_max, 15) < truncation_error(r_inf, 0.8, omega_max, 14)
        );
        assert_relative_eq!(truncation_error(2.0, 0.8, 10.0, 2), 0.0625, epsilon = 1e-15);
    }
}
