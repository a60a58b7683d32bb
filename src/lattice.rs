//! Lattice Green's function averaged over a dispersion ensemble.
//!
//! ```text
//! G(iω_n) = 1/k Σ_e [iω_n - e - Σ(iω_n)]⁻¹
//! ```

use log::debug;

use crate::dispersion::DispersionSamples;
use crate::error::Result;
use crate::gf::{invert_block, scalar_block, GreensFunction};

/// Propagator `[iω_n - e - Σ(iω_n)]⁻¹` for a single band energy `e`.
pub fn band_propagator(sigma: &GreensFunction, energy: f64) -> Result<GreensFunction> {
    let dim = sigma.target_dim();
    GreensFunction::try_from_fn(sigma.mesh().clone(), dim, |index, z| {
        let resolvent = scalar_block(dim, z - energy) - sigma.value(index);
        invert_block(&resolvent, "band propagator", index)
    })
}

/// Sample average of [`band_propagator`] over every energy in `samples`.
///
/// The accumulation is a fold over immutable per-sample propagators, followed by a
/// single division by the sample count.
pub fn average_propagator(
    sigma: &GreensFunction,
    samples: &DispersionSamples,
) -> Result<GreensFunction> {
    let zero = GreensFunction::zeros(sigma.mesh().clone(), sigma.target_dim());
    let total = samples.iter().try_fold(zero, |acc, energy| {
        let contribution = band_propagator(sigma, energy)?;
        acc.checked_add(&contribution)
    })?;
    debug!(
        "averaged {} band propagators on {} mesh points",
        samples.len(),
        sigma.mesh().len()
    );
    Ok(total / samples.len() as f64)
}
