//! Whole-domain group rebalance of the flux after a sweep

// crate modules
use crate::problem::SweepProblem;

// moctools modules
use moctools_geometry::Material;

// external crates
use itertools::izip;
use nalgebra::{DMatrix, DVector};

/// Factor per group that puts the whole domain back in neutron balance
///
/// For every group the volume integrated removal plus the leakage through
/// vacuum ends has to match the in-scatter from other groups plus the
/// `emission` source (fission and fixed sources) the sweep was driven with.
/// Only the level of each group changes, the spatial and angular shape
/// found by the sweep is kept. A converged flux already balances, so the
/// factors are then all 1 and the solution is unchanged.
///
/// Returns `None` when the balance has no solution with positive factors.
pub(crate) fn group_factors(
    problem: &SweepProblem,
    materials: &[&Material],
    emission: &[f64],
    flux: &[f64],
    outgoing: &[f64],
) -> Option<Vec<f64>> {
    let groups = problem.num_groups;
    let mut balance = DMatrix::<f64>::zeros(groups, groups);
    let mut source = DVector::<f64>::zeros(groups);

    for (material, phi, emission, volume) in izip!(
        materials,
        flux.chunks(groups),
        emission.chunks(groups),
        &problem.volumes
    ) {
        for to in 0..groups {
            source[to] += volume * emission[to];
            balance[(to, to)] += volume * material.sigma_t[to] * phi[to];
            for (from, phi) in phi.iter().enumerate() {
                balance[(to, from)] -= volume * material.scatter(from, to) * phi;
            }
        }
    }

    for (g, leakage) in vacuum_leakage(problem, outgoing).into_iter().enumerate() {
        balance[(g, g)] += leakage;
    }

    // a group with nothing to remove keeps its level
    for g in 0..groups {
        if balance[(g, g)] <= 0.0 {
            balance.row_mut(g).fill(0.0);
            balance[(g, g)] = 1.0;
            source[g] = 1.0;
        }
    }

    let factors = balance.lu().solve(&source)?;
    match factors.iter().all(|f| f.is_finite() && *f > 0.0) {
        true => Some(factors.iter().copied().collect()),
        false => None,
    }
}

/// Multiply every group of a group-fastest array by its factor
pub(crate) fn scale_groups(values: &mut [f64], factors: &[f64]) {
    values
        .chunks_mut(factors.len())
        .for_each(|chunk| chunk.iter_mut().zip(factors).for_each(|(v, f)| *v *= f));
}

/// Weighted angular flux leaving through track ends with nowhere to go
fn vacuum_leakage(problem: &SweepProblem, outgoing: &[f64]) -> Vec<f64> {
    let groups = problem.num_groups;
    let mut leakage = vec![0.0; groups];

    for (t, (track, links)) in problem.tracks.iter().zip(&problem.links).enumerate() {
        for dir in (0..2).filter(|dir| links[*dir].is_none()) {
            let offset = problem.boundary_offset(t, dir);
            for (p, factor) in problem.polar_factors().iter().enumerate() {
                let start = offset + p * groups;
                for (leak, psi) in leakage.iter_mut().zip(&outgoing[start..start + groups]) {
                    *leak += track.weight * factor * psi;
                }
            }
        }
    }

    leakage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_follows_the_group_index() {
        let mut values = vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
        scale_groups(&mut values, &[2.0, 0.5]);
        assert_eq!(values, vec![2.0, 0.5, 4.0, 1.0, 6.0, 1.5]);
    }
}
