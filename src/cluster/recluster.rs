//! Optional reclustering pass: members that no longer realign against their
//! assigned centroid are pulled out in two stages — first re-tested against
//! every centroid, then (for whoever still doesn't map) clustered among
//! themselves and merged back in.
use crate::cluster::Mapping;
use crate::sequence::OId;
use log::info;

fn centroids_of(mapping: &Mapping) -> Vec<OId> {
    mapping
        .iter()
        .enumerate()
        .filter(|&(i, &c)| c as usize == i)
        .map(|(i, _)| i as OId)
        .collect()
}

/// Runs one recluster pass over `mapping`. The three closures are the
/// collaborators the original delegates to the aligner and to a further
/// recursive `recluster()` call:
///
/// - `realigns_own_centroid(member, centroid)` repeats the coverage/
///   approx-identity test against the member's existing assignment.
/// - `search_best_centroid(unaligned, centroids)` searches each unaligned
///   member against every centroid and reports its best match, if any.
/// - `recluster_subset(unmapped)` clusters the members that matched no
///   centroid at all among themselves (by further search and, if the caller
///   wants the full original recursion, a nested call back into this
///   function) and returns a mapping local to that subset's indices.
pub fn recluster<R, S, C>(
    mapping: &Mapping,
    iteration: u32,
    mut realigns_own_centroid: R,
    mut search_best_centroid: S,
    mut recluster_subset: C,
) -> Mapping
where
    R: FnMut(OId, OId) -> bool,
    S: FnMut(&[OId], &[OId]) -> Vec<Option<OId>>,
    C: FnMut(&[OId]) -> Mapping,
{
    info!("initializing recluster iteration {}", iteration + 1);
    let centroids = centroids_of(mapping);

    let unal_members: Vec<OId> = (0..mapping.len() as u32)
        .filter(|&i| {
            let c = mapping[i as usize];
            c != i && !realigns_own_centroid(i, c)
        })
        .collect();

    if unal_members.is_empty() {
        return mapping.clone();
    }
    info!(
        "{} sequences failed to align against their assigned centroid",
        unal_members.len()
    );

    let remapped = search_best_centroid(&unal_members, &centroids);
    let mut out = mapping.clone();
    let mut unmapped_members = Vec::new();
    for (&member, new_centroid) in unal_members.iter().zip(remapped.iter()) {
        match *new_centroid {
            Some(c) => out[member as usize] = c,
            None => unmapped_members.push(member),
        }
    }
    info!(
        "{} sequences failed to align against any centroid",
        unmapped_members.len()
    );

    if unmapped_members.is_empty() {
        return out;
    }

    let sub_mapping = recluster_subset(&unmapped_members);
    for (local, &global) in unmapped_members.iter().enumerate() {
        let local_centroid = sub_mapping[local] as usize;
        out[global as usize] = unmapped_members[local_centroid];
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn untouched_when_every_member_still_realigns() {
        let mapping = vec![0, 0, 2, 2];
        let out = recluster(&mapping, 0, |_, _| true, |_, _| vec![], |_| vec![]);
        assert_eq!(out, mapping);
    }

    #[test]
    fn reassigns_to_a_better_centroid_found_on_search() {
        // Member 1 fails its own centroid (0) but the search finds centroid 2.
        let mapping = vec![0, 0, 2, 2];
        let out = recluster(
            &mapping,
            0,
            |member, _centroid| member != 1,
            |unaligned, _centroids| {
                assert_eq!(unaligned, &[1]);
                vec![Some(2)]
            },
            |_| vec![],
        );
        assert_eq!(out[1], 2);
        assert_eq!(out[0], 0);
        assert_eq!(out[2], 2);
        assert_eq!(out[3], 2);
    }

    #[test]
    fn unmapped_members_fall_back_to_subset_reclustering() {
        // Members 1 and 3 fail realignment and match no centroid at all, so
        // they get clustered against each other and merged back in.
        let mapping = vec![0, 0, 2, 2];
        let out = recluster(
            &mapping,
            0,
            |member, _centroid| member == 0 || member == 2,
            |unaligned, _centroids| vec![None; unaligned.len()],
            |unmapped| {
                assert_eq!(unmapped, &[1, 3]);
                // Member 3 becomes the centroid of the unmapped subset.
                vec![1, 1]
            },
        );
        assert_eq!(out[1], 3);
        assert_eq!(out[3], 3);
    }
}
