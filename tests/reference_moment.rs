use approx::assert_relative_eq;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use sigma_cancellation::dispersion::DispersionSamples;
use sigma_cancellation::hybridization::{extract_hybridization, reconstruct_propagator};
use sigma_cancellation::lattice::average_propagator;
use sigma_cancellation::mesh::MatsubaraMesh;
use sigma_cancellation::options::{REFERENCE_BETA, REFERENCE_N_IW};
use sigma_cancellation::self_energy::SelfEnergyModel;
use sigma_cancellation::{CheckError, CheckOptions, MomentCheck};

/// The gated configuration: beta = 500, 1000 frequencies per half-axis, 100 samples.
#[test]
fn reference_gate_preserves_the_zeroth_moment() {
    let check = MomentCheck::new(CheckOptions::default()).unwrap();
    let mut rng = SmallRng::seed_from_u64(7);
    let report = check.run_reference(&mut rng).unwrap();

    assert_eq!(report.beta, REFERENCE_BETA);
    assert_eq!(report.n_iw, REFERENCE_N_IW);
    assert!(report.diff < 2e-6, "diff = {:e}", report.diff);
    assert_relative_eq!(report.ratio.re, 1.0, epsilon = 2e-6);
    assert!(report.ratio.im.abs() < 2e-6);
    assert_relative_eq!(
        report.leading_coefficients[0].re,
        report.expected_moment,
        epsilon = 1e-6
    );
}

/// The moment does not depend on the self-energy, so the gate holds for other models too.
#[test]
fn moment_is_independent_of_the_self_energy() {
    let samples = DispersionSamples::seeded(100, 7).unwrap();
    for (sigma0, sigma1) in [(0.0, 0.0), (-0.5, 1.0), (2.0, 0.25)] {
        let options =
            CheckOptions::default().with_self_energy(SelfEnergyModel::new(sigma0, sigma1));
        let check = MomentCheck::new(options).unwrap();
        let report = check.run_with_samples(REFERENCE_BETA, &samples).unwrap();
        assert!(
            report.diff < 2e-6,
            "sigma = ({sigma0}, {sigma1}): diff = {:e}",
            report.diff
        );
        assert_relative_eq!(report.expected_moment, -samples.mean(), epsilon = 1e-15);
    }
}

/// A single band gives a frequency-independent hybridization equal to `-e`.
#[test]
fn single_sample_ensemble_passes() {
    let check = MomentCheck::new(CheckOptions::default().with_sample_count(1)).unwrap();
    let mut rng = SmallRng::seed_from_u64(3);
    let report = check.run_reference(&mut rng).unwrap();
    assert!(report.diff < 2e-6, "diff = {:e}", report.diff);
}

#[test]
fn hybridization_round_trips_at_the_reference_mesh() {
    let mesh = MatsubaraMesh::fermionic(REFERENCE_BETA, REFERENCE_N_IW).unwrap();
    let sigma = SelfEnergyModel::default().on_mesh(&mesh, 1).unwrap();
    let samples = DispersionSamples::seeded(100, 11).unwrap();
    let g = average_propagator(&sigma, &samples).unwrap();
    let delta = extract_hybridization(&g, &sigma).unwrap();
    let rebuilt = reconstruct_propagator(&delta, &sigma).unwrap();
    assert!(rebuilt.max_abs_difference(&g).unwrap() < 1e-12);
}

#[test]
fn rebuilding_a_mesh_is_bit_identical() {
    let a = MatsubaraMesh::fermionic(REFERENCE_BETA, REFERENCE_N_IW).unwrap();
    let b = MatsubaraMesh::fermionic(REFERENCE_BETA, REFERENCE_N_IW).unwrap();
    assert_eq!(a, b);
    for ((_, za), (_, zb)) in a.points().zip(b.points()) {
        assert_eq!(za.im.to_bits(), zb.im.to_bits());
    }
}

#[test]
fn tight_tolerance_reports_the_discrepancy() {
    let check = MomentCheck::new(CheckOptions::default().with_tolerance(1e-15)).unwrap();
    let mut rng = SmallRng::seed_from_u64(7);
    match check.run_reference(&mut rng) {
        Err(CheckError::ToleranceExceeded { diff, tolerance }) => {
            assert_eq!(tolerance, 1e-15);
            assert!(diff >= 1e-15);
        }
        other => panic!("expected ToleranceExceeded, got {other:?}"),
    }
}
