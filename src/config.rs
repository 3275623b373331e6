//! Typed configuration consumed by the core. Binaries populate this from
//! `clap` argument structs; the core itself never parses argv.
use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult};

/// Sensitivity presets select the shape set, seed frequency cut and band width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sensitivity {
    Fast,
    Default,
    Sensitive,
    VerySensitive,
    UltraSensitive,
}

impl Sensitivity {
    /// Number of active spaced-seed shapes at this sensitivity.
    pub fn shape_count(self) -> usize {
        match self {
            Sensitivity::Fast => 1,
            Sensitivity::Default => 2,
            Sensitivity::Sensitive => 4,
            Sensitivity::VerySensitive => 6,
            Sensitivity::UltraSensitive => 8,
        }
    }
}

/// Every tunable search/cluster knob, as concrete typed fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub sensitivity: Sensitivity,
    pub max_evalue: f64,
    pub member_cover: f64,
    pub mutual_cover: f64,
    pub approx_min_id: f64,
    pub min_length_ratio: f64,
    pub hamming_filter_id: u32,
    pub ungapped_window: i32,
    pub ungapped_evalue: f64,
    pub xdrop: i32,
    pub band: Option<i32>,
    /// Keeps only the top `N` stage-2 survivors per query, ranked by stage-2
    /// score, before they reach the DP engine. `None` keeps every survivor.
    pub top_k_targets: Option<usize>,
    pub swipe_task_size: usize,
    pub tile_size: i32,
    pub cbs_matrix_scale: i32,
    pub chunk_size: usize,
    pub chaining_stacked_hsp_ratio: f64,
    pub cluster_steps: Vec<Sensitivity>,
    pub round_coverage: Vec<f64>,
    pub round_approx_id: Vec<f64>,
    pub connected_component_depth: u32,
    pub num_threads: usize,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sensitivity: Sensitivity::Default,
            max_evalue: 0.001,
            member_cover: 80.0,
            mutual_cover: 0.0,
            approx_min_id: 0.0,
            min_length_ratio: 0.9,
            hamming_filter_id: 40,
            ungapped_window: 64,
            ungapped_evalue: 10.0,
            xdrop: 20,
            band: None,
            top_k_targets: Some(25),
            swipe_task_size: 4096,
            tile_size: 256,
            cbs_matrix_scale: 100,
            chunk_size: 4 * 1024 * 1024,
            chaining_stacked_hsp_ratio: 0.5,
            cluster_steps: vec![Sensitivity::Fast, Sensitivity::Default, Sensitivity::Sensitive],
            round_coverage: vec![80.0, 80.0, 80.0],
            round_approx_id: vec![0.0, 0.0, 0.0],
            connected_component_depth: 0,
            num_threads: num_cpus::get(),
            gap_open: 11,
            gap_extend: 1,
        }
    }
}

impl Config {
    /// Validates cross-field constraints, surfacing `SearchError::Configuration`
    /// before any block is loaded.
    pub fn validate(&self) -> SearchResult<()> {
        if self.max_evalue <= 0.0 {
            return Err(SearchError::Configuration(
                "max_evalue must be positive".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.member_cover) {
            return Err(SearchError::Configuration(
                "member_cover must be a percentage in [0, 100]".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.approx_min_id) {
            return Err(SearchError::Configuration(
                "approx_min_id must be a percentage in [0, 100]".into(),
            ));
        }
        if self.min_length_ratio <= 0.0 || self.min_length_ratio > 1.0 {
            return Err(SearchError::Configuration(
                "min_length_ratio must be in (0, 1]".into(),
            ));
        }
        if self.hamming_filter_id > 48 {
            return Err(SearchError::Configuration(
                "hamming_filter_id cannot exceed the 48-letter fingerprint width".into(),
            ));
        }
        if self.cluster_steps.len() != self.round_coverage.len()
            || self.cluster_steps.len() != self.round_approx_id.len()
        {
            return Err(SearchError::Configuration(
                "cluster_steps, round_coverage and round_approx_id must have equal length".into(),
            ));
        }
        if self.num_threads == 0 {
            return Err(SearchError::Configuration(
                "num_threads must be at least 1".into(),
            ));
        }
        if self.gap_extend <= 0 || self.gap_open < 0 {
            return Err(SearchError::Configuration(
                "gap_open must be >= 0 and gap_extend must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_mismatched_round_schedules() {
        let mut c = Config::default();
        c.round_coverage.push(50.0);
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_hamming_filter() {
        let mut c = Config::default();
        c.hamming_filter_id = 200;
        assert!(c.validate().is_err());
    }
}
