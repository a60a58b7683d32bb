//! Synthetic dispersion ensembles standing in for a Brillouin-zone sum.

use nalgebra::DVector;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};

use crate::error::{CheckError, Result};

/// Finite set of band energies `e_k`, immutable once drawn.
#[derive(Clone, Debug)]
pub struct DispersionSamples {
    energies: DVector<f64>,
}

impl DispersionSamples {
    /// Wraps a fixed set of energies.
    pub fn new(energies: DVector<f64>) -> Result<Self> {
        if energies.is_empty() {
            return Err(CheckError::EmptySampleSet);
        }
        if energies.iter().any(|e| !e.is_finite()) {
            return Err(CheckError::NumericalError {
                context: "dispersion sample validation",
            });
        }
        Ok(Self { energies })
    }

    /// Draws `count` energies uniformly from `[-half_bandwidth, half_bandwidth)` using
    /// the caller's random source.
    pub fn uniform<R: Rng + ?Sized>(count: usize, half_bandwidth: f64, rng: &mut R) -> Result<Self> {
        if count == 0 {
            return Err(CheckError::EmptySampleSet);
        }
        if !(half_bandwidth.is_finite() && half_bandwidth > 0.0) {
            return Err(CheckError::InvalidBandwidth { half_bandwidth });
        }
        let distribution = Uniform::new(-half_bandwidth, half_bandwidth);
        let values: Vec<f64> = (0..count).map(|_| distribution.sample(rng)).collect();
        Self::new(DVector::from_vec(values))
    }

    /// Reproducible draws on `[-1, 1)` from a seeded [`SmallRng`].
    pub fn seeded(count: usize, seed: u64) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self::uniform(count, 1.0, &mut rng)
    }

    /// Number of sampled energies.
    pub fn len(&self) -> usize {
        self.energies.len()
    }

    /// Always false: construction rejects empty sets.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn energies(&self) -> &DVector<f64> {
        &self.energies
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.energies.iter().copied()
    }

    /// Arithmetic mean of the energies, the analytic 0th moment up to sign.
    pub fn mean(&self) -> f64 {
        self.energies.mean()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn uniform_draws_stay_inside_the_band() {
        let mut rng = SmallRng::seed_from_u64(3);
        let samples = DispersionSamples::uniform(1_000, 0.5, &mut rng).unwrap();
        assert_eq!(samples.len(), 1_000);
        assert!(samples.iter().all(|e| (-0.5..0.5).contains(&e)));
        assert!(samples.mean().abs() < 0.05);
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let a = DispersionSamples::seeded(100, 7).unwrap();
        let b = DispersionSamples::seeded(100, 7).unwrap();
        let c = DispersionSamples::seeded(100, 8).unwrap();
        assert_eq!(a.energies(), b.energies());
        assert_ne!(a.energies(), c.energies());
    }

    #[test]
    fn mean_of_fixed_samples() {
        let samples = DispersionSamples::new(DVector::from_vec(vec![-0.5, 0.25, 0.75])).unwrap();
        assert_relative_eq!(samples.mean(), 0.5 / 3.0, epsilon = 1e-15);
    }

    #[test]
    fn rejects_empty_or_degenerate_input() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(matches!(
            DispersionSamples::uniform(0, 1.0, &mut rng),
            Err(CheckError::EmptySampleSet)
        ));
        assert!(matches!(
            DispersionSamples::uniform(4, 0.0, &mut rng),
            Err(CheckError::InvalidBandwidth { .. })
        ));
        assert!(matches!(
            DispersionSamples::new(DVector::from_vec(vec![])),
            Err(CheckError::EmptySampleSet)
        ));
    }
}
