//! Genetic Algorithm based strip nesting.
//!
//! A genome is the placement order of all parts with one rotation angle per
//! part. It is decoded by the [`Packer`] and scored as
//!
//! ```text
//! fitness = -total_length - order_weight * order_penalty - roughness_weight * roughness
//! ```
//!
//! where `order_penalty = sum(area(part at i) * i)` favours big parts first
//! and `roughness` is the sum of height steps along the final skyline.

use crate::geometry::{angle_key, Part};
use crate::nfp::NfpCache;
use crate::packer::{Layout, Packer};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::seq::index;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use strip_nesting_core::ga::{GaProblem, GaProgress, GaRunner};
use strip_nesting_core::{Config, Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One placement instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Gene {
    /// Part identifier.
    pub part_id: usize,
    /// Rotation angle in degrees.
    pub angle: f64,
}

impl Gene {
    /// Creates a gene.
    pub fn new(part_id: usize, angle: f64) -> Self {
        Self { part_id, angle }
    }

    /// Hashable form with the angle in millidegrees.
    pub fn key(&self) -> (usize, i32) {
        (self.part_id, angle_key(self.angle))
    }
}

/// Ordered placement sequence covering every part exactly once.
pub type Genome = Vec<Gene>;

/// Problem definition for GA-based strip nesting.
pub struct NestingProblem {
    parts: Vec<Part>,
    /// Part id -> position in `parts`.
    slots: HashMap<usize, usize>,
    /// Angles each part may take, indexed like `parts`.
    feasible_angles: Vec<Vec<f64>>,
    /// Part ids sorted by descending area.
    big_first: Vec<usize>,
    config: Config,
    nfp_cache: NfpCache,
}

impl NestingProblem {
    /// Creates a nesting problem, validating the configuration and parts.
    pub fn new(parts: Vec<Part>, config: Config) -> Result<Self> {
        config.validate()?;
        if parts.is_empty() {
            return Err(Error::ConfigError("no parts to nest".into()));
        }

        let mut slots = HashMap::with_capacity(parts.len());
        let mut feasible_angles = Vec::with_capacity(parts.len());
        for (slot, part) in parts.iter().enumerate() {
            if slots.insert(part.id(), slot).is_some() {
                return Err(Error::ConfigError(format!(
                    "duplicate part id {}",
                    part.id()
                )));
            }

            let angles: Vec<f64> = config
                .allowed_angles
                .iter()
                .copied()
                .filter(|&angle| {
                    part.profile(angle)
                        .map_or(false, |p| p.width <= config.bin_width + 1e-9)
                })
                .collect();
            if angles.is_empty() {
                return Err(Error::PlacementExhausted {
                    part_id: part.id(),
                    width: part.min_width(),
                    bin_width: config.bin_width,
                });
            }
            if angles.len() < config.allowed_angles.len() {
                log::debug!("part {} restricted to angles {:?}", part.id(), angles);
            }
            feasible_angles.push(angles);
        }

        let mut big_first: Vec<usize> = parts.iter().map(Part::id).collect();
        big_first.sort_by(|a, b| {
            let area = |id: &usize| parts[slots[id]].area();
            area(b)
                .partial_cmp(&area(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(Self {
            parts,
            slots,
            feasible_angles,
            big_first,
            config,
            nfp_cache: NfpCache::new(),
        })
    }

    /// Input parts.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Part with the given id.
    pub fn part(&self, id: usize) -> Option<&Part> {
        self.slots.get(&id).map(|&slot| &self.parts[slot])
    }

    /// Run configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared NFP cache.
    pub fn nfp_cache(&self) -> &NfpCache {
        &self.nfp_cache
    }

    /// Angles a part may take.
    pub fn feasible_angles(&self, part_id: usize) -> &[f64] {
        match self.slots.get(&part_id) {
            Some(&slot) => &self.feasible_angles[slot],
            None => &[],
        }
    }

    /// Part ids ordered big-first.
    pub fn big_first_order(&self) -> &[usize] {
        &self.big_first
    }

    /// Returns true if the genome holds every part id exactly once.
    pub fn is_permutation(&self, genome: &[Gene]) -> bool {
        let mut seen = HashSet::with_capacity(genome.len());
        genome.len() == self.parts.len()
            && genome
                .iter()
                .all(|g| self.slots.contains_key(&g.part_id) && seen.insert(g.part_id))
    }

    /// Decodes a genome into a layout.
    pub fn layout(&self, genome: &[Gene]) -> Result<Layout> {
        let sequence = genome
            .iter()
            .map(|gene| {
                self.part(gene.part_id)
                    .map(|part| (part, gene.angle))
                    .ok_or_else(|| Error::Internal(format!("unknown part id {}", gene.part_id)))
            })
            .collect::<Result<Vec<_>>>()?;
        Packer::pack(&self.config, &self.nfp_cache, sequence)
    }

    /// Sum of part area times position.
    pub fn order_penalty(&self, genome: &[Gene]) -> f64 {
        genome
            .iter()
            .enumerate()
            .map(|(i, gene)| self.part(gene.part_id).map_or(0.0, Part::area) * i as f64)
            .sum()
    }

    /// Fitness of an already decoded genome.
    pub fn score(&self, genome: &[Gene], layout: &Layout) -> f64 {
        -layout.total_length
            - self.config.order_weight * self.order_penalty(genome)
            - self.config.roughness_weight * layout.roughness()
    }

    fn random_angle<R: Rng>(&self, part_id: usize, rng: &mut R) -> f64 {
        self.feasible_angles(part_id)
            .choose(rng)
            .copied()
            .unwrap_or(0.0)
    }

    fn genome_from_order<R: Rng>(&self, order: &[usize], rng: &mut R) -> Genome {
        order
            .iter()
            .map(|&id| Gene::new(id, self.random_angle(id, rng)))
            .collect()
    }
}

impl GaProblem for NestingProblem {
    type Individual = Genome;
    type Key = Vec<(usize, i32)>;

    fn key(&self, genome: &Genome) -> Self::Key {
        genome.iter().map(Gene::key).collect()
    }

    fn evaluate(&self, genome: &Genome) -> Result<f64> {
        let layout = self.layout(genome)?;
        Ok(self.score(genome, &layout))
    }

    fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Genome> {
        let n = self.big_first.len();
        let elite_end = size as f64 * self.config.elite_band;
        let perturbed_end = size as f64 * (self.config.elite_band + self.config.perturbed_band);

        (0..size)
            .map(|i| {
                let mut order = self.big_first.clone();
                if (i as f64) < elite_end {
                    // strictly big-first
                } else if (i as f64) < perturbed_end {
                    if n >= 2 {
                        for _ in 0..rng.gen_range(2..=5) {
                            let picks = index::sample(rng, n, 2);
                            order.swap(picks.index(0), picks.index(1));
                        }
                    }
                } else {
                    order.shuffle(rng);
                }
                self.genome_from_order(&order, rng)
            })
            .collect()
    }

    fn crossover<R: Rng>(&self, parent1: &Genome, parent2: &Genome, rng: &mut R) -> Genome {
        let n = parent1.len();
        if n < 2 {
            return parent1.clone();
        }

        let picks = index::sample(rng, n, 2);
        let (start, end) = {
            let (a, b) = (picks.index(0), picks.index(1));
            (a.min(b), a.max(b))
        };

        let mut child: Vec<Option<Gene>> = vec![None; n];
        let mut used = HashSet::with_capacity(n);
        for i in start..end {
            child[i] = Some(parent1[i]);
            used.insert(parent1[i].part_id);
        }

        let mut donors = parent2.iter().filter(|g| !used.contains(&g.part_id));
        let child: Genome = child
            .into_iter()
            .filter_map(|slot| slot.or_else(|| donors.next().copied()))
            .collect();

        debug_assert!(self.is_permutation(&child), "crossover broke the permutation");
        child
    }

    fn mutate<R: Rng>(&self, genome: &mut Genome, rng: &mut R) {
        let n = genome.len();

        if rng.gen::<f64>() < self.config.swap_mutation_rate {
            let start = (n as f64 * self.config.protected_prefix) as usize;
            if n.saturating_sub(start) >= 2 {
                let picks = index::sample(rng, n - start, 2);
                genome.swap(start + picks.index(0), start + picks.index(1));
            }
        }

        if n > 0 && rng.gen::<f64>() < self.config.angle_mutation_rate {
            let idx = rng.gen_range(0..n);
            genome[idx].angle = self.random_angle(genome[idx].part_id, rng);
        }
    }
}

/// Read-only view handed to the observer.
#[derive(Debug)]
pub struct GenerationSnapshot<'a> {
    /// Generation index (0-based).
    pub generation: u32,
    /// Best genome of the generation.
    pub best: &'a [Gene],
    /// Its fitness.
    pub best_fitness: f64,
    /// Its layout.
    pub layout: &'a Layout,
}

/// Result of a nesting run.
#[derive(Debug, Clone)]
pub struct NestingResult {
    /// Best genome found.
    pub best: Genome,
    /// Layout of the best genome.
    pub layout: Layout,
    /// Fitness of the best genome.
    pub best_fitness: f64,
    /// Final population, ranked best first.
    pub population: Vec<Genome>,
    /// Best fitness per generation.
    pub history: Vec<f64>,
    /// Generations run.
    pub generations: u32,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
    /// Placement passes performed for scoring.
    pub evaluations: usize,
    /// Fitness lookups answered from the cache.
    pub cache_hits: usize,
}

impl NestingResult {
    /// Consumed strip length of the best layout.
    pub fn total_length(&self) -> f64 {
        self.layout.total_length
    }

    /// Utilization of the best layout.
    pub fn utilization(&self) -> f64 {
        self.layout.utilization()
    }
}

/// Fixed-width strip nester driven by a genetic algorithm.
pub struct StripNester {
    runner: GaRunner<NestingProblem>,
}

impl StripNester {
    /// Creates a nester. Fails on invalid settings, an empty or invalid part
    /// set, or a part wider than the strip at every allowed angle.
    pub fn new(parts: Vec<Part>, config: Config) -> Result<Self> {
        let ga_config = config.ga_config();
        let problem = NestingProblem::new(parts, config)?;
        Ok(Self {
            runner: GaRunner::new(ga_config, problem),
        })
    }

    /// Problem definition.
    pub fn problem(&self) -> &NestingProblem {
        self.runner.problem()
    }

    /// Memoized fitness of a genome.
    pub fn fitness(&self, genome: &[Gene]) -> Result<f64> {
        self.runner.fitness(&genome.to_vec())
    }

    /// Number of placement passes performed for scoring so far.
    pub fn evaluations(&self) -> usize {
        self.runner.evaluations()
    }

    /// Recomputes the layout of any genome.
    pub fn layout(&self, genome: &[Gene]) -> Result<Layout> {
        self.problem().layout(genome)
    }

    /// Runs the optimizer.
    pub fn run(&self) -> Result<NestingResult> {
        self.run_with_observer(|_: &GenerationSnapshot<'_>| {})
    }

    /// Runs the optimizer, reporting the best genome at the observer cadence.
    pub fn run_with_observer<F>(&self, observer: F) -> Result<NestingResult>
    where
        F: Fn(&GenerationSnapshot<'_>) + Sync,
    {
        let config = self.problem().config();
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        if config.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build()
                .map_err(|e| Error::Internal(format!("Failed to build thread pool: {}", e)))?;
            pool.install(|| self.run_with_rng(&mut rng, &observer))
        } else {
            self.run_with_rng(&mut rng, &observer)
        }
    }

    /// Runs the optimizer from an explicit population and random source.
    pub fn run_from_population<R, F>(
        &self,
        population: Vec<Genome>,
        rng: &mut R,
        observer: F,
    ) -> Result<NestingResult>
    where
        R: Rng,
        F: Fn(&GenerationSnapshot<'_>),
    {
        if let Some(bad) = population.iter().position(|g| !self.problem().is_permutation(g)) {
            return Err(Error::ConfigError(format!(
                "genome {} is not a permutation of the part ids",
                bad
            )));
        }
        self.drive(Some(population), rng, &observer)
    }

    fn run_with_rng<F>(&self, rng: &mut StdRng, observer: &F) -> Result<NestingResult>
    where
        F: Fn(&GenerationSnapshot<'_>),
    {
        self.drive(None, rng, observer)
    }

    fn drive<R, F>(&self, population: Option<Vec<Genome>>, rng: &mut R, observer: &F) -> Result<NestingResult>
    where
        R: Rng,
        F: Fn(&GenerationSnapshot<'_>),
    {
        let problem = self.problem();
        log::info!(
            "Nesting {} parts: width={}, population={}, generations={}",
            problem.parts().len(),
            problem.config().bin_width,
            problem.config().population_size,
            problem.config().generations
        );

        let report = |progress: &GaProgress<'_, Genome>| match problem.layout(progress.best) {
            Ok(layout) => observer(&GenerationSnapshot {
                generation: progress.generation,
                best: progress.best,
                best_fitness: progress.best_fitness,
                layout: &layout,
            }),
            Err(e) => log::warn!("Observer layout failed at generation {}: {}", progress.generation, e),
        };

        let result = match population {
            Some(population) => self.runner.run_from_population(population, rng, Some(report))?,
            None => self.runner.run_with_observer(rng, Some(report))?,
        };
        let layout = problem.layout(&result.best)?;

        log::info!(
            "Nesting finished: length={:.3}, utilization={:.1}%, evaluations={}, cache hits={}, elapsed={:?}",
            layout.total_length,
            layout.utilization() * 100.0,
            result.evaluations,
            result.cache_hits,
            result.elapsed
        );

        Ok(NestingResult {
            best: result.best,
            layout,
            best_fitness: result.best_fitness,
            population: result.population,
            history: result.history,
            generations: result.generations,
            elapsed: result.elapsed,
            evaluations: result.evaluations,
            cache_hits: result.cache_hits,
        })
    }
}
