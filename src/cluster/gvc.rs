//! Greedy vertex cover: a degree-keyed priority structure that repeatedly
//! pops the highest-degree unassigned vertex, assigns it as a centroid, and
//! assigns its unassigned neighbors. Ties break on the lower vertex id.
use std::collections::BTreeMap;

/// Runs greedy vertex cover over an adjacency list. `weights`, when given,
/// breaks degree ties by a caller-supplied per-vertex weight (e.g. a prior
/// round's member count) instead of raw degree alone.
///
/// `ccd` (connected_component_depth) optionally expands each centroid's
/// direct assignment transitively by up to `ccd` more hops.
pub fn cover(neighbors: &[Vec<u32>], weights: Option<&[u32]>, ccd: u32) -> Vec<u32> {
    let n = neighbors.len();
    let mut reverse_neighbors: Vec<Vec<u32>> = vec![Vec::new(); n];
    for (i, adj) in neighbors.iter().enumerate() {
        for &j in adj {
            reverse_neighbors[j as usize].push(i as u32);
        }
    }

    let weight_of = |i: usize| -> u64 { weights.map(|w| w[i] as u64).unwrap_or(0) };

    // Key is (degree, weight, !vertex_id) so `BTreeMap`'s natural ascending
    // order puts the highest-degree vertex last, breaking degree ties by
    // weight and then by *lower* vertex id — the bitwise complement flips the
    // id ordering so popping the max (`next_back`) favors the smaller id.
    let mut queue: BTreeMap<(u64, u64, u32), ()> = BTreeMap::new();
    let mut key_of: Vec<(u64, u64, u32)> = Vec::with_capacity(n);
    for i in 0..n {
        let key = (neighbors[i].len() as u64, weight_of(i), !(i as u32));
        key_of.push(key);
        queue.insert(key, ());
    }

    let mut centroid: Vec<i64> = vec![-1; n];

    while let Some((&key, _)) = queue.iter().next_back() {
        let i = !key.2 as usize;
        assign_centroid(
            i,
            i as u32,
            &mut centroid,
            &mut queue,
            &mut key_of,
            &reverse_neighbors,
        );
        let direct_neighbors = neighbors[i].clone();
        for j in direct_neighbors {
            if centroid[j as usize] == -1 {
                assign_centroid(
                    j as usize,
                    i as u32,
                    &mut centroid,
                    &mut queue,
                    &mut key_of,
                    &reverse_neighbors,
                );
            }
        }
    }

    if ccd > 0 {
        expand_connected_components(neighbors, &mut centroid, ccd);
    }

    centroid.into_iter().map(|c| c as u32).collect()
}

fn assign_centroid(
    i: usize,
    c: u32,
    centroid: &mut [i64],
    queue: &mut BTreeMap<(u64, u64, u32), ()>,
    key_of: &mut [(u64, u64, u32)],
    reverse_neighbors: &[Vec<u32>],
) {
    centroid[i] = c as i64;
    queue.remove(&key_of[i]);
    for &j in &reverse_neighbors[i] {
        let j = j as usize;
        if centroid[j] >= 0 {
            continue;
        }
        let (degree, weight, id) = key_of[j];
        queue.remove(&(degree, weight, id));
        let new_key = (degree.saturating_sub(1), weight, id);
        key_of[j] = new_key;
        queue.insert(new_key, ());
    }
}

/// Walks `ccd` more hops from each vertex's already-assigned centroid,
/// folding transitively reachable vertices into the same cluster.
fn expand_connected_components(neighbors: &[Vec<u32>], centroid: &mut [i64], ccd: u32) {
    for _ in 0..ccd {
        let snapshot = centroid.to_vec();
        for (i, adj) in neighbors.iter().enumerate() {
            for &j in adj {
                if snapshot[j as usize] != -1 && centroid[i] == -1 {
                    centroid[i] = snapshot[j as usize];
                }
            }
        }
    }
    for c in centroid.iter_mut() {
        if *c == -1 {
            // Isolated vertex with no path to any centroid stays its own.
        }
    }
}
