//! The promoted output of a run: the best candidate with its metrics,
//! ready for JSON emission toward the export/UI layer.

use crate::candidate::Candidate;
use crate::config::LayoutConfig;
use crate::corridor::Corridor;
use crate::fitness::{evaluate, Metrics};
use crate::floor_plan::FloorPlan;
use crate::ilot::Ilot;
use serde::{Deserialize, Serialize};

/// Why the run stopped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Termination {
    /// Best fitness exceeded the convergence threshold.
    Converged,
    /// Best fitness stopped improving for 20 consecutive generations.
    Stagnated,
    /// The generation budget ran out.
    Exhausted,
    /// The caller's budget requested a stop; this is the best-so-far layout.
    Cancelled,
}

/// The optimization output. Îlot positions are lower-left corners,
/// corridor paths are ordered polylines, lengths and areas are meters and
/// square meters, ids are ordinal strings stable for a given seed.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    pub ilots: Vec<Ilot>,
    pub corridors: Vec<Corridor>,
    pub metrics: Metrics,
    pub fitness: f64,
    /// Index of the generation at which the run terminated.
    pub generation: usize,
    pub termination: Termination,
    /// The seed actually used (either configured or time-derived).
    pub seed: u64,
}

impl LayoutResult {
    pub(crate) fn from_candidate(
        candidate: Candidate,
        generation: usize,
        termination: Termination,
        seed: u64,
    ) -> Self {
        LayoutResult {
            ilots: candidate.ilots,
            corridors: candidate.corridors,
            metrics: candidate.metrics,
            fitness: candidate.fitness,
            generation,
            termination,
            seed,
        }
    }

    /// Serialize for the downstream renderer contract.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Re-run the metric evaluation over the emitted layout. Downstream
    /// consumers can use this as an integrity check: the returned values
    /// match the stored `metrics` and `fitness` exactly, up to float
    /// round-off.
    pub fn recompute(&self, plan: &FloorPlan, config: &LayoutConfig) -> (Metrics, f64) {
        evaluate(plan, &self.ilots, &self.corridors, config)
    }
}
