//! Per-temperature moment check: build the lattice Green's function, extract the
//! hybridization, fit its tail and compare `c_0` with `-mean(e)`.

use std::fmt;

use log::info;
use nalgebra::{Complex, Normed};
use rand::Rng;
use serde::Serialize;

use crate::dispersion::DispersionSamples;
use crate::error::{CheckError, Result};
use crate::hybridization::extract_hybridization;
use crate::lattice::average_propagator;
use crate::mesh::MatsubaraMesh;
use crate::options::{CheckOptions, REFERENCE_BETA};
use crate::tail::{truncation_error, LeastSquaresTailFitter, TailFit, TailFitter};

/// The full pipeline for one inverse temperature, parameterized by the tail fitter.
#[derive(Clone, Debug)]
pub struct MomentCheck<F = LeastSquaresTailFitter> {
    options: CheckOptions,
    fitter: F,
}

impl MomentCheck<LeastSquaresTailFitter> {
    /// Validates `options` and pairs them with the default least-squares fitter.
    pub fn new(options: CheckOptions) -> Result<Self> {
        let fitter = LeastSquaresTailFitter::new(options.tail.clone());
        Self::with_fitter(options, fitter)
    }
}

impl<F: TailFitter> MomentCheck<F> {
    /// Uses a caller-supplied tail fitter; `options.tail` is then ignored.
    pub fn with_fitter(options: CheckOptions, fitter: F) -> Result<Self> {
        options.validate()?;
        Ok(Self { options, fitter })
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    pub fn fitter(&self) -> &F {
        &self.fitter
    }

    /// Draws a fresh dispersion ensemble from `rng` and runs the check at `beta`.
    pub fn run<R: Rng + ?Sized>(&self, beta: f64, rng: &mut R) -> Result<MomentReport> {
        let sampling = &self.options.sampling;
        let samples = DispersionSamples::uniform(sampling.count, sampling.half_bandwidth, rng)?;
        self.run_with_samples(beta, &samples)
    }

    /// Runs the check at `beta` for a given dispersion ensemble.
    pub fn run_with_samples(&self, beta: f64, samples: &DispersionSamples) -> Result<MomentReport> {
        let mesh = MatsubaraMesh::fermionic(beta, self.options.n_iw)?;
        let sigma = self.options.self_energy.on_mesh(&mesh, 1)?;
        let g = average_propagator(&sigma, samples)?;
        let delta = extract_hybridization(&g, &sigma)?;
        let fit = self.fitter.fit_tail(&delta, &[])?;

        let omega_max = mesh.omega_max();
        let r_inf = self
            .options
            .self_energy
            .tail_radius(self.options.sampling.half_bandwidth);
        let truncation = truncation_error(
            r_inf,
            self.options.fit_radius_fraction,
            omega_max,
            fit.order(),
        );

        let report = MomentReport::from_fit(&mesh, &fit, truncation, -samples.mean())?;
        info!(
            "beta {beta}: tail order {}, residual {:e}, diff {:e}",
            report.fit_order, report.fit_residual, report.diff
        );
        Ok(report)
    }

    /// The regression gate: runs at [`REFERENCE_BETA`] and fails with
    /// [`ToleranceExceeded`](CheckError::ToleranceExceeded) unless the discrepancy is
    /// below the configured tolerance.
    pub fn run_reference<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<MomentReport> {
        let report = self.run(REFERENCE_BETA, rng)?;
        report.validate(self.options.tolerance)?;
        Ok(report)
    }
}

/// Diagnostics of a single moment check.
#[derive(Clone, Debug, Serialize)]
pub struct MomentReport {
    pub beta: f64,
    pub n_iw: usize,
    /// Largest Matsubara frequency on the mesh.
    pub omega_max: f64,
    pub fit_order: usize,
    pub fit_residual: f64,
    pub fit_points: usize,
    /// Up to three leading tail coefficients of channel `(0, 0)`.
    pub leading_coefficients: Vec<Complex<f64>>,
    /// Analytic truncation estimate `(R_∞ / (f ω_max))^order`.
    pub truncation_error: f64,
    /// `-mean(e)`, the exact 0th moment of the hybridization.
    pub expected_moment: f64,
    /// `c_0 / (-mean(e))` for channel `(0, 0)`.
    pub ratio: Complex<f64>,
    /// Largest `|1 - ratio|` over the diagonal channels.
    pub diff: f64,
}

impl MomentReport {
    /// Fails with [`NumericalError`](CheckError::NumericalError) when the ensemble mean
    /// is zero, since the ratio `c_0 / (-mean(e))` is then undefined.
    fn from_fit(
        mesh: &MatsubaraMesh,
        fit: &TailFit,
        truncation: f64,
        expected: f64,
    ) -> Result<Self> {
        if expected == 0.0 {
            return Err(CheckError::NumericalError {
                context: "moment ratio against a zero ensemble mean",
            });
        }
        let leading = fit.leading();
        let diff = (0..leading.nrows())
            .map(|a| (Complex::new(1.0, 0.0) - leading[(a, a)] / expected).norm())
            .fold(0.0, f64::max);
        Ok(Self {
            beta: mesh.beta(),
            n_iw: mesh.n_iw(),
            omega_max: mesh.omega_max(),
            fit_order: fit.order(),
            fit_residual: fit.residual(),
            fit_points: fit.fit_points(),
            leading_coefficients: fit
                .coefficients()
                .iter()
                .take(3)
                .map(|c| c[(0, 0)])
                .collect(),
            truncation_error: truncation,
            expected_moment: expected,
            ratio: leading[(0, 0)] / expected,
            diff,
        })
    }

    /// Whether the discrepancy is strictly below `tolerance`.
    pub fn passes(&self, tolerance: f64) -> bool {
        self.diff < tolerance
    }

    pub fn validate(&self, tolerance: f64) -> Result<()> {
        if self.passes(tolerance) {
            Ok(())
        } else {
            Err(CheckError::ToleranceExceeded {
                diff: self.diff,
                tolerance,
            })
        }
    }
}

impl fmt::Display for MomentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "-".repeat(72))?;
        writeln!(f, "beta = {}", self.beta)?;
        writeln!(f, "n_iw = {}", self.n_iw)?;
        writeln!(f, "omega_max = {}", self.omega_max)?;
        writeln!(f, "tail fit order = {}", self.fit_order)?;
        writeln!(f, "tail fit residual = {:e}", self.fit_residual)?;
        let coefficients: Vec<String> = self
            .leading_coefficients
            .iter()
            .map(|c| format!("{:.10e}{:+.3e}i", c.re, c.im))
            .collect();
        writeln!(f, "tail[:3] = [{}]", coefficients.join(", "))?;
        writeln!(f, "truncation error (analytic) = {:e}", self.truncation_error)?;
        writeln!(f, "ratio = {}{:+e}i", self.ratio.re, self.ratio.im)?;
        write!(f, "diff = {:e}", self.diff)
    }
}
