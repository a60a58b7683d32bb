//! Diagnostic sweep of the moment check over several inverse temperatures.
//!
//! No tolerance is enforced here; the sweep only records how the discrepancy
//! evolves with `beta` at fixed mesh half-count.

use log::debug;
use rand::Rng;
use serde::Serialize;

use crate::check::{MomentCheck, MomentReport};
use crate::error::Result;
use crate::plot::render_semilogy;
use crate::tail::TailFitter;

/// One `(beta, diff)` sample of the sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SweepPoint {
    pub beta: f64,
    pub diff: f64,
    pub truncation_error: f64,
    pub fit_order: usize,
}

/// Reports collected in sweep order.
#[derive(Clone, Debug, Serialize)]
pub struct Sweep {
    reports: Vec<MomentReport>,
}

impl Sweep {
    pub fn reports(&self) -> &[MomentReport] {
        &self.reports
    }

    pub fn points(&self) -> Vec<SweepPoint> {
        self.reports
            .iter()
            .map(|r| SweepPoint {
                beta: r.beta,
                diff: r.diff,
                truncation_error: r.truncation_error,
                fit_order: r.fit_order,
            })
            .collect()
    }

    /// Plots diff against beta on a logarithmic diff axis.
    pub fn render_plot(&self, width: usize, height: usize) -> String {
        let pairs: Vec<(f64, f64)> = self.reports.iter().map(|r| (r.beta, r.diff)).collect();
        render_semilogy(&pairs, width, height)
    }
}

/// Runs `check` once per entry of `betas`, drawing every ensemble from the shared `rng`.
///
/// The first failing stage aborts the sweep.
pub fn run_sweep<F, R>(check: &MomentCheck<F>, betas: &[f64], rng: &mut R) -> Result<Sweep>
where
    F: TailFitter,
    R: Rng + ?Sized,
{
    let mut reports = Vec::with_capacity(betas.len());
    for &beta in betas {
        let report = check.run(beta, rng)?;
        debug!("sweep point beta {beta}: diff {:e}", report.diff);
        reports.push(report);
    }
    Ok(Sweep { reports })
}
