//! One individual of the evolutionary population: a full îlot-plus-corridor
//! layout with its metrics and fitness, exclusively owning its contents.

use crate::corridor::Corridor;
use crate::fitness::Metrics;
use crate::ilot::Ilot;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

/// Mints the ordinal string ids used inside one candidate. Ids are assigned
/// in creation order, which is what keeps serialized results byte-identical
/// across runs with the same seed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IdGen {
    ilots: usize,
    corridors: usize,
}

impl IdGen {
    pub fn next_ilot(&mut self) -> String {
        let id = format!("ilot-{:02}", self.ilots);
        self.ilots += 1;
        id
    }

    pub fn next_corridor(&mut self) -> String {
        let id = format!("corridor-{:02}", self.corridors);
        self.corridors += 1;
        id
    }

    /// Corridors are resynthesized from scratch at every scoring pass; the
    /// corridor counter restarts so ids stay dense.
    pub fn reset_corridors(&mut self) {
        self.corridors = 0;
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub ilots: Vec<Ilot>,
    pub corridors: Vec<Corridor>,
    pub metrics: Metrics,
    pub fitness: f64,
    pub(crate) ids: IdGen,
}

impl Candidate {
    pub fn new(ilots: Vec<Ilot>, ids: IdGen) -> Self {
        Candidate {
            ilots,
            corridors: Vec::new(),
            metrics: Metrics::default(),
            fitness: 0.0,
            ids,
        }
    }

    /// Structural deep copy: fresh ids minted in the original creation
    /// order, corridor references remapped, nothing shared with `self`.
    pub fn duplicate(&self) -> Candidate {
        let mut ids = IdGen::default();
        let mut id_map: FnvHashMap<&str, String> = FnvHashMap::default();

        let mut ilots = Vec::with_capacity(self.ilots.len());
        for ilot in &self.ilots {
            let mut copy = ilot.clone();
            let new_id = ids.next_ilot();
            id_map.insert(ilot.id.as_str(), new_id.clone());
            copy.id = new_id;
            ilots.push(copy);
        }

        let mut corridor_map: FnvHashMap<&str, String> = FnvHashMap::default();
        let mut corridors = Vec::with_capacity(self.corridors.len());
        for corridor in &self.corridors {
            let mut copy = corridor.clone();
            let new_id = ids.next_corridor();
            corridor_map.insert(corridor.id.as_str(), new_id.clone());
            copy.id = new_id;
            copy.connected_ilots = corridor
                .connected_ilots
                .iter()
                .map(|id| id_map.get(id.as_str()).cloned().unwrap_or_else(|| id.clone()))
                .collect();
            corridors.push(copy);
        }

        for (ilot, original) in ilots.iter_mut().zip(&self.ilots) {
            ilot.corridor_connections = original
                .corridor_connections
                .iter()
                .map(|id| {
                    corridor_map
                        .get(id.as_str())
                        .cloned()
                        .unwrap_or_else(|| id.clone())
                })
                .collect();
        }

        Candidate {
            ilots,
            corridors,
            metrics: self.metrics.clone(),
            fitness: self.fitness,
            ids,
        }
    }
}
