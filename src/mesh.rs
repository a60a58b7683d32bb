//! Matsubara frequency meshes.
//!
//! A mesh is fully described by the inverse temperature `beta`, the particle
//! statistic and a half-count `n_iw`. Frequencies are generated on demand, so two
//! meshes built from the same parameters yield bit-identical values.

use std::f64::consts::PI;

use nalgebra::Complex;

use crate::error::{CheckError, Result};

/// Particle statistic selecting odd (fermionic) or even (bosonic) Matsubara indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Statistic {
    Fermion,
    Boson,
}

/// Ordered, symmetric set of imaginary Matsubara frequencies.
#[derive(Clone, Debug, PartialEq)]
pub struct MatsubaraMesh {
    beta: f64,
    statistic: Statistic,
    n_iw: usize,
}

impl MatsubaraMesh {
    /// Builds a mesh, validating the inverse temperature and half-count.
    ///
    /// Fermionic meshes hold `n = -n_iw, ..., n_iw - 1` (`2 n_iw` points); bosonic
    /// meshes hold `n = -(n_iw - 1), ..., n_iw - 1` (`2 n_iw - 1` points).
    pub fn new(beta: f64, statistic: Statistic, n_iw: usize) -> Result<Self> {
        if !(beta.is_finite() && beta > 0.0) {
            return Err(CheckError::InvalidTemperature { beta });
        }
        if n_iw == 0 {
            return Err(CheckError::EmptyMesh);
        }
        Ok(Self {
            beta,
            statistic,
            n_iw,
        })
    }

    /// Shorthand for a fermionic mesh, the only kind the moment check uses.
    pub fn fermionic(beta: f64, n_iw: usize) -> Result<Self> {
        Self::new(beta, Statistic::Fermion, n_iw)
    }

    /// Inverse temperature.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Whether the mesh holds fermionic or bosonic frequencies.
    pub fn statistic(&self) -> Statistic {
        self.statistic
    }

    /// Number of frequencies on the positive half-axis.
    pub fn n_iw(&self) -> usize {
        self.n_iw
    }

    /// Total number of mesh points.
    pub fn len(&self) -> usize {
        match self.statistic {
            Statistic::Fermion => 2 * self.n_iw,
            Statistic::Boson => 2 * self.n_iw - 1,
        }
    }

    /// Always false: construction rejects empty meshes.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Matsubara index `n` of the first mesh point.
    pub fn first_index(&self) -> i64 {
        match self.statistic {
            Statistic::Fermion => -(self.n_iw as i64),
            Statistic::Boson => -(self.n_iw as i64 - 1),
        }
    }

    /// Matsubara index `n` stored at linear position `i`.
    pub fn matsubara_index(&self, i: usize) -> i64 {
        self.first_index() + i as i64
    }

    /// Real frequency `ω_n` at linear position `i`.
    pub fn frequency(&self, i: usize) -> f64 {
        let n = self.matsubara_index(i) as f64;
        match self.statistic {
            Statistic::Fermion => PI * (2.0 * n + 1.0) / self.beta,
            Statistic::Boson => 2.0 * PI * n / self.beta,
        }
    }

    /// Purely imaginary mesh point `iω_n` at linear position `i`.
    pub fn point(&self, i: usize) -> Complex<f64> {
        Complex::new(0.0, self.frequency(i))
    }

    /// Largest `|ω_n|` on the mesh.
    pub fn omega_max(&self) -> f64 {
        self.frequency(self.len() - 1).abs()
    }

    /// Distance between neighbouring frequencies, `2π/β` for either statistic.
    pub fn spacing(&self) -> f64 {
        2.0 * PI / self.beta
    }

    /// Iterates over `(linear index, iω_n)` pairs in increasing frequency.
    pub fn points(&self) -> impl Iterator<Item = (usize, Complex<f64>)> + '_ {
        (0..self.len()).map(move |i| (i, self.point(i)))
    }
}
