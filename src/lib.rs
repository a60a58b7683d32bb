//! Regression check for the high-frequency moment of a DMFT hybridization function.
//!
//! In a dynamical mean-field theory self-consistency the lattice Green's function
//!
//! ```text
//! G(iω_n) = 1/k Σ_e [iω_n - e - Σ(iω_n)]⁻¹
//! ```
//!
//! is inverted to obtain the hybridization `Δ = G⁻¹ - iω_n + Σ`. Its constant
//! high-frequency moment is known exactly: `-mean(e)`, whatever the self-energy.
//! This crate rebuilds that pipeline numerically and measures how well a tail fit
//! of `Δ` preserves the moment. It offers tools to
//!
//! - build fermionic or bosonic Matsubara meshes (`mesh` module),
//! - draw dispersion ensembles from an explicit random source (`dispersion` module),
//! - average band propagators and extract `Δ` (`lattice` and `hybridization` modules),
//! - fit high-frequency tails with an injectable fitter (`tail` module), and
//! - run the reference gate and the diagnostic sweep (`check` and `sweep` modules).
//!
//! # Quick start
//!
//! ```no_run
//! use rand::rngs::SmallRng;
//! use rand::SeedableRng;
//! use sigma_cancellation::{CheckOptions, MomentCheck};
//!
//! let check = MomentCheck::new(CheckOptions::default()).expect("valid options");
//! let mut rng = SmallRng::seed_from_u64(7);
//!
//! // beta = 500, n_iw = 1000, 100 samples; fails unless diff < 2e-6.
//! let report = check.run_reference(&mut rng).expect("moment preserved");
//! println!("{report}");
//! ```

pub mod check;
pub mod dispersion;
pub mod error;
pub mod gf;
pub mod hybridization;
pub mod lattice;
pub mod mesh;
pub mod options;
pub mod plot;
pub mod self_energy;
pub mod sweep;
pub mod tail;

pub use check::{MomentCheck, MomentReport};
pub use error::{CheckError, Result};
pub use options::{CheckOptions, SamplingOptions};
pub use sweep::{run_sweep, Sweep, SweepPoint};
pub use tail::{LeastSquaresTailFitter, TailFit, TailFitOptions, TailFitter};
