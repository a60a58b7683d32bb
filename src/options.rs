//! Configuration structures for the moment check, with the reference setup as defaults.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CheckError, Result};
use crate::self_energy::SelfEnergyModel;
use crate::tail::TailFitOptions;

/// Inverse temperature of the reference regression case.
pub const REFERENCE_BETA: f64 = 500.0;
/// Mesh half-count of the reference regression case.
pub const REFERENCE_N_IW: usize = 1000;
/// Largest accepted `|1 - c_0 / (-mean(e))|` at the reference case.
pub const DEFAULT_TOLERANCE: f64 = 2e-6;
/// Inverse temperatures of the diagnostic sweep.
pub const DEFAULT_SWEEP_BETAS: [f64; 4] = [1.0, 10.0, 100.0, 1000.0];

/// Controls the dispersion ensemble.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingOptions {
    /// Number of band energies `k`.
    pub count: usize,
    /// Energies are drawn uniformly from `[-half_bandwidth, half_bandwidth)`.
    pub half_bandwidth: f64,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            count: 100,
            half_bandwidth: 1.0,
        }
    }
}

/// Aggregated configuration used by [`MomentCheck`](crate::MomentCheck).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    /// Frequencies per half-axis of the Matsubara mesh.
    pub n_iw: usize,
    /// Model self-energy dressing every band propagator.
    pub self_energy: SelfEnergyModel,
    /// Dispersion ensemble settings.
    pub sampling: SamplingOptions,
    /// Tail fit window and order.
    pub tail: TailFitOptions,
    /// Fraction `f` of `ω_max` taken as the effective fit radius in the truncation bound.
    pub fit_radius_fraction: f64,
    /// Regression gate on the relative moment error.
    pub tolerance: f64,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            n_iw: REFERENCE_N_IW,
            self_energy: SelfEnergyModel::default(),
            sampling: SamplingOptions::default(),
            tail: TailFitOptions::default(),
            fit_radius_fraction: 0.8,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl CheckOptions {
    /// Reads a JSON file; missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let options: CheckOptions = serde_json::from_reader(reader)?;
        options.validate()?;
        Ok(options)
    }

    /// Override the mesh half-count.
    pub fn with_n_iw(mut self, n_iw: usize) -> Self {
        self.n_iw = n_iw;
        self
    }

    /// Override the self-energy constants.
    pub fn with_self_energy(mut self, self_energy: SelfEnergyModel) -> Self {
        self.self_energy = self_energy;
        self
    }

    /// Set the number of dispersion samples.
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sampling.count = count;
        self
    }

    /// Override the tail fit configuration while preserving other defaults.
    pub fn with_tail(mut self, tail: TailFitOptions) -> Self {
        self.tail = tail;
        self
    }

    /// Set the regression tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_iw == 0 {
            return Err(CheckError::EmptyMesh);
        }
        if self.sampling.count == 0 {
            return Err(CheckError::EmptySampleSet);
        }
        let half_bandwidth = self.sampling.half_bandwidth;
        if !(half_bandwidth.is_finite() && half_bandwidth > 0.0) {
            return Err(CheckError::InvalidBandwidth { half_bandwidth });
        }
        if !(self.fit_radius_fraction > 0.0 && self.fit_radius_fraction <= 1.0) {
            return Err(CheckError::invalid_option(
                "fit_radius_fraction",
                self.fit_radius_fraction,
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(CheckError::invalid_option("tolerance", self.tolerance));
        }
        self.tail.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_reference_case() {
        let options = CheckOptions::default();
        assert_eq!(options.n_iw, 1000);
        assert_eq!(options.sampling.count, 100);
        assert_eq!(options.self_energy, SelfEnergyModel::new(1.337, 3.5235));
        assert_eq!(options.tolerance, 2e-6);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let options: CheckOptions =
            serde_json::from_str(r#"{"n_iw": 64, "sampling": {"count": 5}}"#).unwrap();
        assert_eq!(options.n_iw, 64);
        assert_eq!(options.sampling.count, 5);
        assert_eq!(options.sampling.half_bandwidth, 1.0);
        assert_eq!(options.tail, TailFitOptions::default());
    }

    #[test]
    fn reads_overrides_from_file() {
        let path = std::env::temp_dir().join("sigma_cancellation_options_test.json");
        std::fs::write(&path, r#"{"tolerance": 1e-3, "self_energy": {"sigma0": 0.5, "sigma1": 0.0}}"#)
            .unwrap();
        let options = CheckOptions::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(options.tolerance, 1e-3);
        assert_eq!(options.self_energy, SelfEnergyModel::new(0.5, 0.0));
    }

    #[test]
    fn validation_rejects_degenerate_settings() {
        assert!(matches!(
            CheckOptions::default().with_sample_count(0).validate(),
            Err(CheckError::EmptySampleSet)
        ));
        assert!(matches!(
            CheckOptions::default().with_tolerance(-1.0).validate(),
            Err(CheckError::InvalidOption {
                name: "tolerance",
                ..
            })
        ));
    }
}
