//! The round/block pipeline driver.
//!
//! Schedules stage 1/2 screening over query/target block pairs on `rayon`'s
//! work-stealing pool, buffering surviving hits in a bounded
//! `crossbeam-channel`, then drives each query's candidates through the DP
//! engine and chains the resulting HSPs.
use std::sync::Mutex;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info};
use rayon::prelude::*;

use crate::config::Config;
use crate::dp::anchored::{self, Anchor, AnchoredResult};
use crate::dp::hsp::{chain, Hsp, Range};
use crate::dp::traceback;
use crate::dp::traits::Bin;
use crate::dp::Saturation;
use crate::error::{SearchError, SearchResult};
use crate::filter::fingerprint::{run_tiled, Fingerprint, FingerprintMode};
use crate::filter::ungapped::{ungapped_cutoff, UngappedExtender};
use crate::scoring::{KarlinAltschul, LongScoreProfile, Matrix};
use crate::seed::{SeedIndex, SeedJoinIterator, Shape};
use crate::sequence::Block;
use crate::stats::Stats;

/// A hit surviving stage 2, queued for DP extension.
#[derive(Debug, Clone, Copy)]
pub struct Hit {
    pub query_id: usize,
    pub target_id: usize,
    pub target_global_offset: usize,
    pub score: i32,
    /// Local query position of the ungapped extension's best-scoring peak.
    pub query_offset: i32,
    /// Local target position (within the target sequence) of that same peak.
    pub target_offset: i32,
    /// The seed's diagonal, `query_offset - target_offset`.
    pub seed_offset: i32,
}

/// Bounded multi-producer, single-consumer buffer: every worker thread in
/// [`search_block_pair`]'s `rayon` pool holds a cloned [`Sender`], the
/// caller drains everything queued so far with [`AsyncBuffer::drain`] once
/// the round's screening is done.
pub struct AsyncBuffer {
    sender: Sender<Hit>,
    receiver: Receiver<Hit>,
}

impl AsyncBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        AsyncBuffer { sender, receiver }
    }

    pub fn sender(&self) -> Sender<Hit> {
        self.sender.clone()
    }

    pub fn drain(&self) -> Vec<Hit> {
        self.receiver.try_iter().collect()
    }
}

/// Runs stages 1-2 for one (query block, target block) pair under one shape,
/// filling an [`AsyncBuffer`] with surviving hits.
pub fn search_block_pair(
    query: &Block,
    target: &Block,
    shape: &Shape,
    config: &Config,
    buffer: &AsyncBuffer,
    stats: &Mutex<Stats>,
) {
    let query_index = SeedIndex::build(query, shape, 64, 0, None);
    let target_index = SeedIndex::build(target, shape, 64, 0, None);

    let buckets: Vec<_> = SeedJoinIterator::new(&query_index, &target_index).collect();

    buckets.into_par_iter().for_each(|(_, q_locs, t_locs)| {
        let sender = buffer.sender();
        let q_fps: Vec<Fingerprint> = q_locs
            .iter()
            .map(|l| Fingerprint::extract(&query.seqs, l.global_offset as usize))
            .collect();
        let t_fps: Vec<Fingerprint> = t_locs
            .iter()
            .map(|l| Fingerprint::extract(&target.seqs, l.global_offset as usize))
            .collect();

        let mut local_stats = Stats::new();
        local_stats.inc(crate::stats::Counter::SeedHits, (q_fps.len() * t_fps.len()) as u64);

        let survivors = run_tiled(
            FingerprintMode::Full,
            &q_fps,
            &t_fps,
            config.tile_size as usize,
            config.hamming_filter_id,
        );

        let matrix = Matrix::blosum62(config.gap_open, config.gap_extend);
        let extender = UngappedExtender::new(&matrix, config.ungapped_window);

        for (qi, ti) in survivors {
            let q_loc = q_locs[qi];
            let t_loc = t_locs[ti];
            let qlen = query.seqs.get(q_loc.seq_id as usize).len() as i32;
            let cutoff = ungapped_cutoff(qlen, 20);
            let query_offset =
                (q_loc.global_offset - query.seqs.offset_of(q_loc.seq_id as usize) as u64) as i32;
            let hit = extender.extend(
                &query.seqs,
                q_loc.seq_id as usize,
                query_offset,
                &target.seqs,
                t_loc.global_offset as usize,
            );
            if hit.score >= cutoff {
                local_stats.inc(crate::stats::Counter::TentativeMatches0, 1);
                let _ = sender.send(Hit {
                    query_id: q_loc.seq_id as usize,
                    target_id: t_loc.seq_id as usize,
                    target_global_offset: t_loc.global_offset as usize,
                    score: hit.score,
                    query_offset: hit.query_offset,
                    target_offset: hit.target_offset,
                    seed_offset: hit.query_offset - hit.target_offset,
                });
            }
        }

        stats.lock().unwrap().merge(&local_stats);
    });
}

/// Tries the anchored extension at progressively wider score bins, starting
/// from the cheapest bin that should safely hold `start_score`, widening on
/// saturation.
fn extend_anchor_with_widening(
    anchor: &Anchor,
    profile: &LongScoreProfile,
    profile_rev: &LongScoreProfile,
    t_seq: &[u8],
    config: &Config,
    start_score: i32,
) -> Option<AnchoredResult> {
    let sens_band = config.band.unwrap_or(32);
    let mut bin = Bin::predict(start_score);
    loop {
        let outcome: Result<AnchoredResult, Saturation> = match bin {
            Bin::Narrow => anchored::extend::<i8>(
                anchor, profile, profile_rev, t_seq, config.gap_open, config.gap_extend, None,
                sens_band,
            ),
            Bin::Medium => anchored::extend::<i16>(
                anchor, profile, profile_rev, t_seq, config.gap_open, config.gap_extend, None,
                sens_band,
            ),
            Bin::Wide => anchored::extend::<i32>(
                anchor, profile, profile_rev, t_seq, config.gap_open, config.gap_extend, None,
                sens_band,
            ),
        };
        match outcome {
            Ok(result) => return Some(result),
            Err(Saturation { target_idx }) => {
                debug!("target {target_idx} saturated bin {bin:?}, widening");
                match bin.widen() {
                    Some(next) => bin = next,
                    None => return None,
                }
            }
        }
    }
}

/// Extends the buffered hits for one query against their target candidates
/// through the DP engine, chains the resulting HSPs, and filters by
/// `max_evalue`.
///
/// Each hit first runs through a fast, seed-anchored banded score scan
/// (narrowest-bin-first, widening on saturation) so cheap rejects never pay
/// for an exact alignment. Survivors are re-aligned with a full (unbanded)
/// traceback pass that recovers identities, mismatches, gap opens, length and
/// an edit transcript; the transcript is replayed against the scoring matrix
/// and checked against the DP's own score before being trusted.
pub fn extend_hits(
    query_letters: &[u8],
    hits: &[Hit],
    target: &Block,
    config: &Config,
) -> SearchResult<Vec<Hsp>> {
    let matrix = Matrix::blosum62(config.gap_open, config.gap_extend);
    let profile = matrix.build_profile(query_letters);
    let profile_rev = profile.reversed();
    let ka = KarlinAltschul::BLOSUM62_GAPPED;
    let qlen = query_letters.len() as u32;

    let mut ranked: Vec<&Hit> = hits.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    if let Some(top_k) = config.top_k_targets {
        ranked.truncate(top_k);
    }

    let mut hsps = Vec::new();
    for hit in ranked {
        let (t_lo, t_hi) = target.seqs.bounds_of(hit.target_global_offset);
        let t_seq: Vec<u8> = (t_lo..t_hi).map(|g| target.seqs.letter_at(g)).collect();
        let tlen = t_seq.len() as u32;

        let anchor = Anchor {
            query_begin: hit.query_offset,
            query_end: hit.query_offset,
            subject_begin: hit.target_offset,
            subject_end: hit.target_offset,
            score: 0,
            d_min_left: 0,
            d_max_left: 0,
            d_min_right: 0,
            d_max_right: 0,
            prefix_score: 0,
        };

        let Some(fast) =
            extend_anchor_with_widening(&anchor, &profile, &profile_rev, &t_seq, config, hit.score)
        else {
            continue;
        };
        if ka.evalue(fast.score, qlen, tlen) > config.max_evalue {
            continue;
        }

        let Some(traced) =
            traceback::align_and_trace(query_letters, &t_seq, &matrix, config.gap_open, config.gap_extend)
        else {
            continue;
        };

        let q_slice = &query_letters[traced.query_begin as usize..traced.query_end as usize];
        let t_slice = &t_seq[traced.subject_begin as usize..traced.subject_end as usize];
        let recomputed = traceback::rescore(
            &traced.transcript,
            q_slice,
            t_slice,
            &matrix,
            config.gap_open,
            config.gap_extend,
        );
        if recomputed != traced.score {
            return Err(SearchError::TracebackInconsistency {
                target: hit.target_id as u32,
                stored: traced.score,
                recomputed,
            });
        }

        let mut hsp = Hsp::new(
            hit.target_id as u32,
            Range {
                begin: traced.query_begin,
                end: traced.query_end,
            },
            Range {
                begin: traced.subject_begin,
                end: traced.subject_end,
            },
            traced.score,
            &ka,
            qlen,
            tlen,
        );
        hsp.identities = Some(traced.identities);
        hsp.length = Some(traced.length);
        hsp.mismatches = Some(traced.mismatches);
        hsp.gap_opens = Some(traced.gap_opens);
        hsp.transcript = Some(traced.transcript);

        if hsp.evalue <= config.max_evalue {
            hsps.push(hsp);
        }
    }

    Ok(chain(hsps, config.chaining_stacked_hsp_ratio))
}

/// One sensitivity round over every query/target block pair.
/// Queries that already have an accepted HSP are skipped in later rounds.
pub fn run_round(
    query: &Block,
    target: &Block,
    shape: &Shape,
    config: &Config,
    satisfied: &mut [bool],
) -> SearchResult<Vec<(usize, Vec<Hsp>)>> {
    let buffer = AsyncBuffer::new(config.chunk_size / 64 + 1);
    let stats = Mutex::new(Stats::new());
    info!("starting round over {} queries, {} targets", query.len(), target.len());
    search_block_pair(query, target, shape, config, &buffer, &stats);
    let hits = buffer.drain();

    let mut by_query: std::collections::HashMap<usize, Vec<Hit>> = std::collections::HashMap::new();
    for hit in hits {
        if !satisfied.get(hit.query_id).copied().unwrap_or(false) {
            by_query.entry(hit.query_id).or_default().push(hit);
        }
    }

    let mut results = Vec::new();
    for (query_id, query_hits) in by_query {
        let query_letters = query.seqs.get(query_id).to_vec();
        let hsps = extend_hits(&query_letters, &query_hits, target, config)?;
        if !hsps.is_empty() {
            if let Some(slot) = satisfied.get_mut(query_id) {
                *slot = true;
            }
            results.push((query_id, hsps));
        }
    }
    Ok(results)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sequence::Sequence;

    fn block_of(seqs: &[&[u8]]) -> Block {
        let mut b = Block::new();
        for (i, s) in seqs.iter().enumerate() {
            b.push(&Sequence::from_ascii(s), i as u32);
        }
        b
    }

    #[test]
    fn round_finds_identical_sequence_pair() {
        let query = block_of(&[b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRVGDGTQDNLSGAEKAVQVKV"]);
        let target = block_of(&[b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRVGDGTQDNLSGAEKAVQVKV"]);
        let shape = Shape::contiguous(6);
        let config = Config {
            hamming_filter_id: 40,
            ..Config::default()
        };
        let mut satisfied = vec![false];
        let results = run_round(&query, &target, &shape, &config, &mut satisfied).unwrap();
        assert!(!results.is_empty());
        let (_, hsps) = &results[0];
        // A perfect self-hit must carry real traceback stats, not `None`.
        assert_eq!(hsps[0].identities, Some(hsps[0].length.unwrap()));
        assert_eq!(hsps[0].mismatches, Some(0));
    }

    #[test]
    fn async_buffer_drains_sent_hits() {
        let buf = AsyncBuffer::new(4);
        buf.sender()
            .send(Hit {
                query_id: 0,
                target_id: 0,
                target_global_offset: 0,
                score: 10,
                query_offset: 0,
                target_offset: 0,
                seed_offset: 0,
            })
            .unwrap();
        assert_eq!(buf.drain().len(), 1);
    }

    #[test]
    fn top_k_keeps_only_the_highest_scoring_targets() {
        let query = block_of(&[b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRVGDGTQDNLSGAEKAVQVKV"]);
        let mut target = Block::new();
        for i in 0..5u32 {
            target.push(
                &Sequence::from_ascii(b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRVGDGTQDNLSGAEKAVQVKV"),
                i,
            );
        }
        let shape = Shape::contiguous(6);
        let config = Config {
            hamming_filter_id: 40,
            top_k_targets: Some(2),
            ..Config::default()
        };
        let mut satisfied = vec![false];
        let results = run_round(&query, &target, &shape, &config, &mut satisfied).unwrap();
        let (_, hsps) = &results[0];
        assert!(hsps.len() <= 2);
    }
}
