//! Cascaded clustering driver.
pub mod gvc;
pub mod recluster;

use log::info;

use crate::config::{Config, Sensitivity};
use crate::sequence::OId;

/// One self-alignment edge emitted by the pipeline when run in clustering
/// mode; wire format is a 24-byte little-endian record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub query: OId,
    pub target: OId,
    pub qcovhsp: f32,
    pub scovhsp: f32,
    pub evalue: f64,
}

impl Edge {
    pub const WIRE_SIZE: usize = 24;

    pub fn to_bytes(&self) -> [u8; Self::WIRE_SIZE] {
        let mut out = [0u8; Self::WIRE_SIZE];
        out[0..4].copy_from_slice(&self.query.to_le_bytes());
        out[4..8].copy_from_slice(&self.target.to_le_bytes());
        out[8..12].copy_from_slice(&self.qcovhsp.to_le_bytes());
        out[12..16].copy_from_slice(&self.scovhsp.to_le_bytes());
        out[16..24].copy_from_slice(&self.evalue.to_le_bytes());
        out
    }

    pub fn from_bytes(b: &[u8; Self::WIRE_SIZE]) -> Edge {
        Edge {
            query: u32::from_le_bytes(b[0..4].try_into().unwrap()),
            target: u32::from_le_bytes(b[4..8].try_into().unwrap()),
            qcovhsp: f32::from_le_bytes(b[8..12].try_into().unwrap()),
            scovhsp: f32::from_le_bytes(b[12..16].try_into().unwrap()),
            evalue: f64::from_le_bytes(b[16..24].try_into().unwrap()),
        }
    }
}

/// Fixed-point cluster mapping: `mapping[i]` is the `OId` of `i`'s centroid;
/// `mapping[mapping[i]] == mapping[i]` for every `i`.
pub type Mapping = Vec<OId>;

/// Runs one cascaded-clustering round: filters edges by `coverage`, sorts by
/// source, and hands the adjacency to the greedy vertex cover. Returns a
/// mapping from this round's vertex ids to centroid ids.
pub fn round(
    n: usize,
    edges: &[Edge],
    coverage: f64,
    weights: Option<&[u32]>,
    ccd: u32,
) -> Mapping {
    let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); n];
    for e in edges {
        if (e.qcovhsp as f64) < coverage || (e.scovhsp as f64) < coverage {
            continue;
        }
        adjacency[e.query as usize].push(e.target);
        adjacency[e.target as usize].push(e.query);
    }
    gvc::cover(&adjacency, weights, ccd)
}

/// Composes mappings across rounds: `new[i] = prev[round_result[i]]`.
pub fn compose(prev: &Mapping, round_result: &Mapping) -> Mapping {
    round_result.iter().map(|&r| prev[r as usize]).collect()
}

/// Runs the full cascaded schedule: sensitivities tried weakest to strongest,
/// composing the centroid mapping after each round, with coverage and
/// approx-identity cutoffs per round.
///
/// `edges_for_round` is the search collaborator: given the sensitivity and
/// the current set of still-active original ids, it returns the self-
/// alignment edges for that round. This keeps the clustering driver
/// independent of how the pipeline is actually invoked.
pub fn cascaded<F>(n: usize, config: &Config, mut edges_for_round: F) -> Mapping
where
    F: FnMut(Sensitivity, &[bool]) -> Vec<Edge>,
{
    let mut mapping: Mapping = (0..n as u32).collect();
    let mut active = vec![true; n];

    for (round_idx, &sensitivity) in config.cluster_steps.iter().enumerate() {
        let coverage = config
            .round_coverage
            .get(round_idx)
            .copied()
            .unwrap_or(config.member_cover)
            .max(config.member_cover);
        let edges = edges_for_round(sensitivity, &active);
        let round_result = round(n, &edges, coverage, None, config.connected_component_depth);
        mapping = compose(&mapping, &round_result);

        for (i, is_active) in active.iter_mut().enumerate() {
            if round_result[i] != i as u32 {
                *is_active = false;
            }
        }
        let cluster_count = mapping.iter().collect::<std::collections::HashSet<_>>().len();
        info!(
            "cascaded clustering round {round_idx} ({sensitivity:?}): {cluster_count} clusters"
        );
    }

    mapping
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn edge_round_trips_through_wire_bytes() {
        let e = Edge {
            query: 1,
            target: 2,
            qcovhsp: 95.5,
            scovhsp: 91.2,
            evalue: 1e-20,
        };
        let bytes = e.to_bytes();
        assert_eq!(Edge::from_bytes(&bytes), e);
    }

    #[test]
    fn compose_chains_centroids_across_rounds() {
        let prev = vec![0, 0, 2, 2];
        let round_result = vec![0, 0, 0, 0]; // round 2 merges everything into vertex 0
        let composed = compose(&prev, &round_result);
        assert_eq!(composed, vec![0, 0, 0, 0]);
    }

    #[test]
    fn three_sequence_smoke_cluster() {
        // A and B are edge-connected, C is isolated: expect {A,B} + {C}.
        let edges = vec![Edge {
            query: 0,
            target: 1,
            qcovhsp: 90.0,
            scovhsp: 90.0,
            evalue: 1e-30,
        }];
        let mapping = round(3, &edges, 80.0, None, 0);
        assert_eq!(mapping[0], mapping[1]);
        assert_eq!(mapping[2], 2);
    }
}
