//! Hybridization function of the DMFT self-consistency.
//!
//! `Δ(iω_n) = G(iω_n)⁻¹ - iω_n + Σ(iω_n)`, and back again
//! `G(iω_n) = [iω_n + Δ(iω_n) - Σ(iω_n)]⁻¹`.

use crate::error::Result;
use crate::gf::{invert_block, scalar_block, GreensFunction};

/// Extracts `Δ` from a lattice Green's function and the self-energy on the same mesh.
pub fn extract_hybridization(g: &GreensFunction, sigma: &GreensFunction) -> Result<GreensFunction> {
    let dim = g.target_dim();
    g.inverse()?
        .zip_map(sigma, |z, g_inv, s| g_inv - scalar_block(dim, z) + s)
}

/// Rebuilds the Green's function that [`extract_hybridization`] started from.
pub fn reconstruct_propagator(
    delta: &GreensFunction,
    sigma: &GreensFunction,
) -> Result<GreensFunction> {
    let dim = delta.target_dim();
    let resolvent = delta.zip_map(sigma, |z, d, s| scalar_block(dim, z) + d - s)?;
    GreensFunction::try_from_fn(delta.mesh().clone(), dim, |index, _| {
        invert_block(resolvent.value(index), "propagator reconstruction", index)
    })
}
