//! The evolutionary placement engine: population initialization, tournament
//! selection, spatial crossover, mutation, elitism and the termination
//! logic, driving corridor synthesis and fitness evaluation each
//! generation.
//!
//! The engine is single-threaded and deterministic: every stochastic choice
//! draws from one seeded PRNG, so identical (floor plan, config, seed)
//! triples produce identical results.

use crate::candidate::{Candidate, IdGen};
use crate::config::LayoutConfig;
use crate::corridor;
use crate::error::LayoutError;
use crate::fitness::{ada_flag_consistent, evaluate, Metrics};
use crate::floor_plan::FloorPlan;
use crate::geometry::Rect;
use crate::ilot::{target_counts, Ilot, Rotation, SizeBucket};
use crate::obstacle::ObstacleIndex;
use crate::result::{LayoutResult, Termination};
use fnv::FnvHashSet;
use itertools::Itertools;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

/// Attempts to find a valid position before an îlot is dropped.
const PLACEMENT_ATTEMPTS: usize = 50;
/// Generations without meaningful improvement before the run stagnates.
const STAGNATION_WINDOW: usize = 20;
/// Minimum best-fitness improvement that resets the stagnation counter.
const STAGNATION_EPS: f64 = 0.001;
/// Maximum per-axis shift applied by the jitter mutation, in meters.
const JITTER_RANGE: f64 = 5.0;
const TOURNAMENT_SIZE: usize = 3;
/// Utilization targets of the initial population span this range so early
/// generations cover a broad density spectrum.
const INIT_DENSITY_LO: f64 = 0.30;
const INIT_DENSITY_HI: f64 = 0.70;

/// Per-generation progress hook. Implementations may no-op.
pub trait ProgressSink {
    fn report(&mut self, generation: usize, best_fitness: f64, best_metrics: &Metrics);
}

/// The default sink: ignores every report.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&mut self, _generation: usize, _best_fitness: f64, _best_metrics: &Metrics) {}
}

/// Cooperative cancellation, checked at generation boundaries. The engine
/// keeps working while the closure returns true and otherwise returns the
/// best layout found so far.
pub struct RunBudget {
    should_continue: Box<dyn Fn() -> bool>,
}

impl RunBudget {
    pub fn new<F: Fn() -> bool + 'static>(should_continue: F) -> Self {
        RunBudget {
            should_continue: Box::new(should_continue),
        }
    }

    /// Budget that never cancels.
    pub fn unlimited() -> Self {
        RunBudget {
            should_continue: Box::new(|| true),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        !(self.should_continue)()
    }
}

/// Run one optimization with default progress reporting and no
/// cancellation. See [`Optimizer`] for the hook-enabled form.
pub fn optimize(plan: &FloorPlan, config: &LayoutConfig) -> Result<LayoutResult, LayoutError> {
    Optimizer::new(plan, config)?.run()
}

/// One optimization run over an immutable floor plan.
pub struct Optimizer<'a> {
    plan: &'a FloorPlan,
    config: LayoutConfig,
    index: ObstacleIndex,
    rng: StdRng,
    seed: u64,
}

impl<'a> Optimizer<'a> {
    /// Validate the config and build the obstacle index. The plan itself
    /// was validated by [`FloorPlan::new`].
    pub fn new(plan: &'a FloorPlan, config: &LayoutConfig) -> Result<Self, LayoutError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(time_seed);
        let index = ObstacleIndex::build(plan, config);
        Ok(Optimizer {
            plan,
            config: config.clone(),
            index,
            rng: StdRng::seed_from_u64(seed),
            seed,
        })
    }

    pub fn run(&mut self) -> Result<LayoutResult, LayoutError> {
        self.run_with(&mut NullProgress, &RunBudget::unlimited())
    }

    /// Run to termination, reporting after each generation and honoring the
    /// cancellation budget at generation boundaries.
    pub fn run_with(
        &mut self,
        progress: &mut dyn ProgressSink,
        budget: &RunBudget,
    ) -> Result<LayoutResult, LayoutError> {
        let mut population = self.initial_population();
        if population.iter().all(|c| c.ilots.is_empty()) {
            return Err(LayoutError::NoFeasiblePlacement {
                obstacle_fraction: self.plan.obstacle_fraction(),
            });
        }
        debug!(
            "starting run: seed {}, population {}, up to {} generations",
            self.seed,
            population.len(),
            self.config.generations
        );

        let mut best: Option<Candidate> = None;
        let mut best_index = 0usize;
        let mut baseline = f64::NEG_INFINITY;
        let mut stagnant = 0usize;
        let mut termination = Termination::Exhausted;
        let mut final_generation = 0usize;

        for generation in 0..self.config.generations {
            final_generation = generation;
            for candidate in population.iter_mut() {
                self.score(candidate);
            }

            let mut gen_best = 0;
            for i in 1..population.len() {
                if population[i].fitness > population[gen_best].fitness {
                    gen_best = i;
                }
            }
            if best
                .as_ref()
                .map_or(true, |b| population[gen_best].fitness > b.fitness)
            {
                best = Some(population[gen_best].duplicate());
                best_index = gen_best;
            }
            let (best_fitness, best_metrics) = match &best {
                Some(b) => (b.fitness, b.metrics.clone()),
                None => (0.0, Metrics::default()),
            };
            progress.report(generation, best_fitness, &best_metrics);
            trace!("generation {generation}: best fitness {best_fitness:.4}");

            if best_fitness - baseline > STAGNATION_EPS {
                baseline = best_fitness;
                stagnant = 0;
            } else {
                stagnant += 1;
            }

            if best_fitness > self.config.convergence_fitness {
                termination = Termination::Converged;
                break;
            }
            if stagnant >= STAGNATION_WINDOW {
                termination = Termination::Stagnated;
                break;
            }
            if budget.is_cancelled() {
                termination = Termination::Cancelled;
                break;
            }
            if generation + 1 == self.config.generations {
                termination = Termination::Exhausted;
                break;
            }

            population = self.breed(&population);
        }

        let best = best.ok_or_else(|| LayoutError::InternalInvariant {
            generation: final_generation,
            candidate: 0,
            message: "no generation was evaluated".to_string(),
        })?;
        self.verify(&best, final_generation, best_index)?;
        debug!(
            "run finished at generation {final_generation} ({termination:?}): fitness {:.4}, {} îlots, {} corridors",
            best.fitness,
            best.ilots.len(),
            best.corridors.len()
        );
        Ok(LayoutResult::from_candidate(
            best,
            final_generation,
            termination,
            self.seed,
        ))
    }

    /// The k-th initial candidate targets a utilization ratio interpolated
    /// across [0.30, 0.70], capped by the configured density.
    fn initial_population(&mut self) -> Vec<Candidate> {
        let usable = self.plan.usable_area();
        let n = self.config.population_size;
        let cap = self.config.max_density / 100.0;
        (0..n)
            .map(|k| {
                let t = if n > 1 { k as f64 / (n - 1) as f64 } else { 0.0 };
                let density =
                    (INIT_DENSITY_LO + (INIT_DENSITY_HI - INIT_DENSITY_LO) * t).min(cap);
                let counts = target_counts(&self.config.size_mix, usable, density);
                self.random_candidate(counts)
            })
            .collect()
    }

    /// Fill a candidate bucket by bucket, largest îlots first while the
    /// plan is emptiest. Îlots that fail placement are dropped.
    fn random_candidate(&mut self, counts: [usize; 3]) -> Candidate {
        let mut ids = IdGen::default();
        let mut ilots: Vec<Ilot> = Vec::new();
        for (bucket, count) in [
            (SizeBucket::Large, counts[2]),
            (SizeBucket::Medium, counts[1]),
            (SizeBucket::Small, counts[0]),
        ] {
            for _ in 0..count {
                match self.random_ilot(bucket, &ilots, &mut ids) {
                    Some(ilot) => ilots.push(ilot),
                    None => trace!("dropping unplaceable {bucket:?} îlot"),
                }
            }
        }
        Candidate::new(ilots, ids)
    }

    /// Sample dimensions, position and rotation until the îlot is valid:
    /// inside bounds, clear of obstacles, and at least `min_clearance` from
    /// every already-accepted îlot.
    fn random_ilot(
        &mut self,
        bucket: SizeBucket,
        accepted: &[Ilot],
        ids: &mut IdGen,
    ) -> Option<Ilot> {
        let (lo, hi) = bucket.side_range();
        let bounds = *self.plan.bounds();
        for _ in 0..PLACEMENT_ATTEMPTS {
            let width = self.rng.gen_range(lo..=hi);
            let height = self.rng.gen_range(lo..=hi);
            let rotation = Rotation::ALL[self.rng.gen_range(0..Rotation::ALL.len())];
            let (w, h) = if rotation.swaps_axes() {
                (height, width)
            } else {
                (width, height)
            };
            if w > bounds.width || h > bounds.height {
                continue;
            }
            let x = bounds.x + self.rng.gen_range(0.0..=(bounds.width - w));
            let y = bounds.y + self.rng.gen_range(0.0..=(bounds.height - h));
            let rect = Rect::new(x, y, w, h);
            if !self.placement_ok(&rect, accepted) {
                continue;
            }
            return Some(Ilot::new(ids.next_ilot(), x, y, width, height, rotation, bucket));
        }
        None
    }

    fn placement_ok(&self, rect: &Rect, accepted: &[Ilot]) -> bool {
        self.index
            .is_valid_placement(rect, self.config.min_clearance)
            && !accepted.iter().any(|other| {
                other
                    .rect()
                    .overlaps_with_clearance(rect, self.config.min_clearance)
            })
    }

    /// Synthesize corridors and evaluate metrics for one candidate.
    fn score(&self, candidate: &mut Candidate) {
        let Candidate { ilots, ids, .. } = candidate;
        ids.reset_corridors();
        let corridors = corridor::synthesize(&self.index, &self.config, ilots, ids);
        let (metrics, fitness) = evaluate(self.plan, &candidate.ilots, &corridors, &self.config);
        candidate.corridors = corridors;
        candidate.metrics = metrics;
        candidate.fitness = fitness;
    }

    /// Elites survive verbatim; the rest of the next generation is bred by
    /// tournament selection, crossover and mutation.
    fn breed(&mut self, population: &[Candidate]) -> Vec<Candidate> {
        let order: Vec<usize> = (0..population.len())
            .sorted_by(|&a, &b| {
                population[b]
                    .fitness
                    .total_cmp(&population[a].fitness)
                    .then(a.cmp(&b))
            })
            .collect();

        let mut next = Vec::with_capacity(population.len());
        for &i in order.iter().take(self.config.elite_size) {
            next.push(population[i].duplicate());
        }
        while next.len() < population.len() {
            let a = self.tournament(population);
            let b = self.tournament(population);
            let mut child = if self.rng.gen_range(0.0..1.0) < self.config.crossover_rate {
                self.crossover(&population[a], &population[b])
            } else {
                population[a].duplicate()
            };
            if self.rng.gen_range(0.0..1.0) < self.config.mutation_rate {
                self.mutate(&mut child);
            }
            next.push(child);
        }
        next
    }

    /// Tournament of three distinct candidates; highest fitness wins.
    fn tournament(&mut self, population: &[Candidate]) -> usize {
        let k = TOURNAMENT_SIZE.min(population.len());
        let picks = sample(&mut self.rng, population.len(), k);
        let mut winner: Option<usize> = None;
        for i in picks.iter() {
            winner = match winner {
                Some(j) if population[j].fitness >= population[i].fitness => Some(j),
                _ => Some(i),
            };
        }
        winner.unwrap_or(0)
    }

    /// Spatial crossover: split the drawing at the vertical midline,
    /// inherit the left side from the first parent, then the right side
    /// from the second wherever it stays valid against the inherited set.
    fn crossover(&mut self, p1: &Candidate, p2: &Candidate) -> Candidate {
        let bounds = *self.plan.bounds();
        let mid = bounds.x + bounds.width / 2.0;
        let mut ids = IdGen::default();
        let mut ilots: Vec<Ilot> = Vec::new();

        for ilot in &p1.ilots {
            if ilot.center().x < mid {
                ilots.push(reissue(ilot, &mut ids));
            }
        }
        for ilot in &p2.ilots {
            if ilot.center().x >= mid && self.placement_ok(&ilot.rect(), &ilots) {
                ilots.push(reissue(ilot, &mut ids));
            }
        }
        Candidate::new(ilots, ids)
    }

    /// One of three operations by a biased draw: jitter an îlot, add a new
    /// one, or remove one. The list is re-filtered for validity afterwards.
    fn mutate(&mut self, candidate: &mut Candidate) {
        let draw = self.rng.gen_range(0.0..1.0);
        if draw < 0.5 {
            self.jitter(candidate);
        } else if draw < 0.75 {
            self.add_ilot(candidate);
        } else {
            self.remove_ilot(candidate);
        }
        self.refilter(candidate);
    }

    fn jitter(&mut self, candidate: &mut Candidate) {
        if candidate.ilots.is_empty() {
            return;
        }
        let idx = self.rng.gen_range(0..candidate.ilots.len());
        let dx = self.rng.gen_range(-JITTER_RANGE..=JITTER_RANGE);
        let dy = self.rng.gen_range(-JITTER_RANGE..=JITTER_RANGE);
        let bounds = *self.plan.bounds();
        let ilot = &mut candidate.ilots[idx];
        let rect = ilot.rect();
        ilot.x = (ilot.x + dx).clamp(bounds.x, (bounds.x_max() - rect.width).max(bounds.x));
        ilot.y = (ilot.y + dy).clamp(bounds.y, (bounds.y_max() - rect.height).max(bounds.y));
    }

    fn add_ilot(&mut self, candidate: &mut Candidate) {
        let bucket = SizeBucket::ALL[self.rng.gen_range(0..SizeBucket::ALL.len())];
        let Candidate { ilots, ids, .. } = candidate;
        if let Some(ilot) = self.random_ilot(bucket, ilots, ids) {
            ilots.push(ilot);
        }
    }

    fn remove_ilot(&mut self, candidate: &mut Candidate) {
        if candidate.ilots.len() > 1 {
            let idx = self.rng.gen_range(0..candidate.ilots.len());
            candidate.ilots.remove(idx);
        }
    }

    /// Walk the îlot list in order, dropping any entry that no longer
    /// satisfies validity against the kept prefix.
    fn refilter(&self, candidate: &mut Candidate) {
        let mut kept: Vec<Ilot> = Vec::with_capacity(candidate.ilots.len());
        for ilot in candidate.ilots.drain(..) {
            if self.placement_ok(&ilot.rect(), &kept) {
                kept.push(ilot);
            } else {
                trace!("dropping îlot {} after mutation", ilot.id);
            }
        }
        candidate.ilots = kept;
    }

    /// Final integrity check on the promoted candidate.
    fn verify(
        &self,
        best: &Candidate,
        generation: usize,
        candidate: usize,
    ) -> Result<(), LayoutError> {
        let fail = |message: String| LayoutError::InternalInvariant {
            generation,
            candidate,
            message,
        };

        if !(0.0..=1.0).contains(&best.fitness) {
            return Err(fail(format!("fitness {} outside [0, 1]", best.fitness)));
        }
        for (name, value) in [
            ("spaceUtilization", best.metrics.space_utilization),
            ("accessibility", best.metrics.accessibility),
            ("corridorEfficiency", best.metrics.corridor_efficiency),
            ("adaCompliance", best.metrics.ada_compliance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(fail(format!("metric {name} = {value} outside [0, 1]")));
            }
        }

        let ids: FnvHashSet<&str> = best.ilots.iter().map(|i| i.id.as_str()).collect();
        for corridor in &best.corridors {
            for id in &corridor.connected_ilots {
                if !ids.contains(id.as_str()) {
                    return Err(fail(format!(
                        "corridor {} references missing îlot {id}",
                        corridor.id
                    )));
                }
            }
            if !ada_flag_consistent(corridor) {
                return Err(fail(format!(
                    "corridor {} marked accessible below the ADA width",
                    corridor.id
                )));
            }
        }
        Ok(())
    }
}

fn reissue(ilot: &Ilot, ids: &mut IdGen) -> Ilot {
    let mut copy = ilot.clone();
    copy.id = ids.next_ilot();
    copy.corridor_connections.clear();
    copy
}

fn time_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
