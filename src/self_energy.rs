//! Model self-energy `Σ(z) = Σ₀ + Σ₁ / z`.

use nalgebra::Complex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gf::{scalar_block, GreensFunction};
use crate::mesh::MatsubaraMesh;

/// Self-energy with a static shift and a single `1/z` moment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfEnergyModel {
    /// Static (Hartree-like) part `Σ₀`.
    pub sigma0: f64,
    /// Coefficient `Σ₁` of the `1/z` term.
    pub sigma1: f64,
}

impl Default for SelfEnergyModel {
    fn default() -> Self {
        Self {
            sigma0: 1.337,
            sigma1: 3.5235,
        }
    }
}

impl SelfEnergyModel {
    pub fn new(sigma0: f64, sigma1: f64) -> Self {
        Self { sigma0, sigma1 }
    }

    /// Scalar value at complex frequency `z`. The `1/z` term is dropped when `Σ₁ = 0`.
    pub fn evaluate(&self, z: Complex<f64>) -> Complex<f64> {
        let static_part = Complex::new(self.sigma0, 0.0);
        if self.sigma1 == 0.0 {
            static_part
        } else {
            static_part + z.inv() * self.sigma1
        }
    }

    /// Tabulates `Σ(iω_n) · 1` on `mesh`.
    ///
    /// A nonzero `Σ₁` diverges at the bosonic point `iω_0 = 0`, which is reported as
    /// [`NumericalError`](crate::error::CheckError::NumericalError).
    pub fn on_mesh(&self, mesh: &MatsubaraMesh, target_dim: usize) -> Result<GreensFunction> {
        GreensFunction::from_fn(mesh.clone(), target_dim, |z| {
            scalar_block(target_dim, self.evaluate(z))
        })
    }

    /// Convergence radius `R_∞ = |Σ₀| + W` used by the analytic truncation bound,
    /// where `W` is the half-width of the dispersion band.
    pub fn tail_radius(&self, half_bandwidth: f64) -> f64 {
        self.sigma0.abs() + half_bandwidth
    }
}
