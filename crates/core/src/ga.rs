//! Generational genetic algorithm framework.
//!
//! The runner owns the evolutionary loop (scoring, ranking, elitism,
//! tournament selection) while the problem supplies the representation:
//! population seeding, crossover, mutation and the fitness function.
//!
//! Fitness is memoized by a canonical key ([`GaProblem::key`]). Within one
//! generation every distinct key that is not cached yet is evaluated exactly
//! once, in parallel with rayon; duplicates in the population wait for that
//! single computation.

use crate::cache::FitnessCache;
use crate::{Error, Result};
use rand::prelude::*;
use rand::seq::index;
use rayon::prelude::*;
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the genetic algorithm.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GaConfig {
    /// Population size.
    pub population_size: usize,
    /// Number of generations to run.
    pub generations: u32,
    /// Tournament size for selection.
    pub tournament_size: usize,
    /// Fraction of the ranked population kept unchanged.
    pub elite_fraction: f64,
    /// Lower bound on the elite count.
    pub min_elites: usize,
    /// The observer is called every `observer_interval` generations and on the last one.
    pub observer_interval: u32,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 40,
            generations: 100,
            tournament_size: 3,
            elite_fraction: 0.1,
            min_elites: 2,
            observer_interval: 10,
        }
    }
}

impl GaConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size.max(2);
        self
    }

    /// Sets the number of generations.
    pub fn with_generations(mut self, generations: u32) -> Self {
        self.generations = generations;
        self
    }

    /// Number of elites carried into the next generation.
    pub fn elite_count(&self) -> usize {
        let by_fraction =
            (self.elite_fraction * self.population_size as f64 - 1e-9).ceil().max(0.0) as usize;
        by_fraction
            .max(self.min_elites)
            .min(self.population_size)
    }

    fn should_observe(&self, generation: u32) -> bool {
        generation % self.observer_interval.max(1) == 0 || generation + 1 == self.generations
    }
}

/// Problem-specific GA operations.
pub trait GaProblem: Send + Sync {
    /// Candidate solution.
    type Individual: Clone + Send + Sync;
    /// Canonical form used to memoize fitness.
    type Key: Hash + Eq + Clone + Send + Sync;

    /// Canonical cache key of an individual.
    fn key(&self, individual: &Self::Individual) -> Self::Key;

    /// Computes the fitness of an individual (higher is better).
    fn evaluate(&self, individual: &Self::Individual) -> Result<f64>;

    /// Creates the initial population.
    fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<Self::Individual>;

    /// Produces one child from two parents.
    fn crossover<R: Rng>(
        &self,
        parent1: &Self::Individual,
        parent2: &Self::Individual,
        rng: &mut R,
    ) -> Self::Individual;

    /// Mutates an offspring in place.
    fn mutate<R: Rng>(&self, individual: &mut Self::Individual, rng: &mut R);
}

/// Read-only view of the search handed to observers.
#[derive(Debug, Clone)]
pub struct GaProgress<'a, I> {
    /// Current generation index (0-based).
    pub generation: u32,
    /// Configured number of generations.
    pub generations: u32,
    /// Best individual of this generation's ranking.
    pub best: &'a I,
    /// Its fitness.
    pub best_fitness: f64,
    /// Mean fitness of the population.
    pub avg_fitness: f64,
    /// Distinct individuals scored so far.
    pub cache_size: usize,
    /// Elapsed time since start.
    pub elapsed: Duration,
}

/// Result of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult<I> {
    /// The best individual of the final ranking.
    pub best: I,
    /// Its fitness.
    pub best_fitness: f64,
    /// Final population, ranked best first.
    pub population: Vec<I>,
    /// Best fitness per generation.
    pub history: Vec<f64>,
    /// Generations run.
    pub generations: u32,
    /// Fitness computations performed (cache misses that were evaluated).
    pub evaluations: usize,
    /// Fitness lookups answered from the cache.
    pub cache_hits: usize,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Genetic algorithm runner.
pub struct GaRunner<P: GaProblem> {
    config: GaConfig,
    problem: P,
    cache: FitnessCache<P::Key>,
    evaluations: AtomicUsize,
}

impl<P: GaProblem> GaRunner<P> {
    /// Creates a new GA runner.
    pub fn new(config: GaConfig, problem: P) -> Self {
        Self {
            config,
            problem,
            cache: FitnessCache::new(),
            evaluations: AtomicUsize::new(0),
        }
    }

    /// Returns the problem definition.
    pub fn problem(&self) -> &P {
        &self.problem
    }

    /// Returns the runner configuration.
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Number of fitness computations performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Returns the fitness table.
    pub fn cache(&self) -> &FitnessCache<P::Key> {
        &self.cache
    }

    /// Memoized fitness of a single individual.
    pub fn fitness(&self, individual: &P::Individual) -> Result<f64> {
        let key = self.problem.key(individual);
        self.cache.get_or_compute(&key, || {
            self.evaluations.fetch_add(1, Ordering::Relaxed);
            self.problem.evaluate(individual)
        })
    }

    /// Scores a whole population, evaluating each uncached key once.
    pub fn evaluate_population(&self, population: &[P::Individual]) -> Result<Vec<f64>> {
        let mut scores = vec![f64::NEG_INFINITY; population.len()];
        let mut pending: HashMap<P::Key, Vec<usize>> = HashMap::new();
        let mut order: Vec<(P::Key, usize)> = Vec::new();

        for (idx, individual) in population.iter().enumerate() {
            let key = self.problem.key(individual);
            if let Some(slots) = pending.get_mut(&key) {
                slots.push(idx);
                continue;
            }
            match self.cache.get(&key)? {
                Some(score) => scores[idx] = score,
                None => {
                    pending.insert(key.clone(), vec![idx]);
                    order.push((key, idx));
                }
            }
        }

        let computed: Vec<(P::Key, f64)> = order
            .into_par_iter()
            .map(|(key, idx)| {
                self.evaluations.fetch_add(1, Ordering::Relaxed);
                self.problem
                    .evaluate(&population[idx])
                    .map(|score| (key, score))
            })
            .collect::<Result<Vec<_>>>()?;

        for (key, score) in computed {
            let stored = self.cache.insert(key.clone(), score)?;
            if let Some(slots) = pending.get(&key) {
                for &slot in slots {
                    scores[slot] = stored;
                }
            }
        }

        Ok(scores)
    }

    /// Runs the GA from a problem-seeded population.
    pub fn run<R: Rng>(&self, rng: &mut R) -> Result<GaResult<P::Individual>> {
        self.run_with_observer(rng, None::<fn(&GaProgress<'_, P::Individual>)>)
    }

    /// Runs the GA, calling `observer` at the configured cadence.
    pub fn run_with_observer<R: Rng, F>(
        &self,
        rng: &mut R,
        observer: Option<F>,
    ) -> Result<GaResult<P::Individual>>
    where
        F: Fn(&GaProgress<'_, P::Individual>),
    {
        let population = self
            .problem
            .initialize_population(self.config.population_size, rng);
        self.run_from_population(population, rng, observer)
    }

    /// Runs the GA starting from the given population.
    pub fn run_from_population<R: Rng, F>(
        &self,
        initial: Vec<P::Individual>,
        rng: &mut R,
        observer: Option<F>,
    ) -> Result<GaResult<P::Individual>>
    where
        F: Fn(&GaProgress<'_, P::Individual>),
    {
        if initial.len() < 2 {
            return Err(Error::ConfigError(format!(
                "population must hold at least 2 individuals, got {}",
                initial.len()
            )));
        }

        let start = Instant::now();
        let mut history = Vec::with_capacity(self.config.generations as usize);
        let mut population = initial;

        for generation in 0..self.config.generations {
            let ranked = self.rank(population)?;
            let (best, best_fitness) = (&ranked[0].0, ranked[0].1);
            history.push(best_fitness);

            log::debug!(
                "GA generation {}: best={:.4}, cache size={}",
                generation,
                best_fitness,
                self.cache.len()
            );

            if let Some(ref callback) = observer {
                if self.config.should_observe(generation) {
                    let avg_fitness =
                        ranked.iter().map(|(_, f)| f).sum::<f64>() / ranked.len() as f64;
                    callback(&GaProgress {
                        generation,
                        generations: self.config.generations,
                        best,
                        best_fitness,
                        avg_fitness,
                        cache_size: self.cache.len(),
                        elapsed: start.elapsed(),
                    });
                }
            }

            population = self.next_generation(&ranked, rng);
        }

        let ranked = self.rank(population)?;
        let best_fitness = ranked[0].1;
        let population: Vec<P::Individual> = ranked.into_iter().map(|(ind, _)| ind).collect();

        Ok(GaResult {
            best: population[0].clone(),
            best_fitness,
            population,
            history,
            generations: self.config.generations,
            evaluations: self.evaluations(),
            cache_hits: self.cache.hits(),
            elapsed: start.elapsed(),
        })
    }

    /// Scores and sorts a population, best first. Ties keep their order.
    fn rank(&self, population: Vec<P::Individual>) -> Result<Vec<(P::Individual, f64)>> {
        let scores = self.evaluate_population(&population)?;
        let mut ranked: Vec<(P::Individual, f64)> = population.into_iter().zip(scores).collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(CmpOrdering::Equal));
        Ok(ranked)
    }

    /// Elites first, then tournament-selected offspring.
    fn next_generation<R: Rng>(
        &self,
        ranked: &[(P::Individual, f64)],
        rng: &mut R,
    ) -> Vec<P::Individual> {
        let size = self.config.population_size;
        let mut next: Vec<P::Individual> = ranked
            .iter()
            .take(self.config.elite_count())
            .map(|(ind, _)| ind.clone())
            .collect();

        while next.len() < size {
            let parent1 = &ranked[self.tournament_select(ranked.len(), rng)].0;
            let parent2 = &ranked[self.tournament_select(ranked.len(), rng)].0;
            let mut child = self.problem.crossover(parent1, parent2, rng);
            self.problem.mutate(&mut child, rng);
            next.push(child);
        }

        next
    }

    /// Draws contestants without replacement; on a ranked slice the winner is
    /// the contestant with the lowest index.
    fn tournament_select<R: Rng>(&self, len: usize, rng: &mut R) -> usize {
        let amount = self.config.tournament_size.clamp(1, len);
        index::sample(rng, len, amount)
            .iter()
            .min()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    /// Maximizes -(x - 42)^2 over integers.
    struct TargetProblem {
        evaluated: AtomicUsize,
    }

    impl GaProblem for TargetProblem {
        type Individual = i64;
        type Key = i64;

        fn key(&self, individual: &i64) -> i64 {
            *individual
        }

        fn evaluate(&self, individual: &i64) -> Result<f64> {
            self.evaluated.fetch_add(1, Ordering::SeqCst);
            let d = (*individual - 42) as f64;
            Ok(-d * d)
        }

        fn initialize_population<R: Rng>(&self, size: usize, rng: &mut R) -> Vec<i64> {
            (0..size).map(|_| rng.gen_range(-500..500)).collect()
        }

        fn crossover<R: Rng>(&self, a: &i64, b: &i64, rng: &mut R) -> i64 {
            if rng.gen() {
                (a + b) / 2
            } else {
                *a
            }
        }

        fn mutate<R: Rng>(&self, individual: &mut i64, rng: &mut R) {
            *individual += rng.gen_range(-5..=5);
        }
    }

    fn problem() -> TargetProblem {
        TargetProblem {
            evaluated: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_elite_count() {
        let config = GaConfig::default().with_population_size(40);
        assert_eq!(config.elite_count(), 4);
        let config = GaConfig::default().with_population_size(8);
        assert_eq!(config.elite_count(), 2);
        let config = GaConfig::default().with_population_size(45);
        assert_eq!(config.elite_count(), 5);
    }

    #[test]
    fn test_ga_converges() {
        let config = GaConfig::default()
            .with_population_size(30)
            .with_generations(60);
        let runner = GaRunner::new(config, problem());
        let mut rng = StdRng::seed_from_u64(7);
        let result = runner.run(&mut rng).unwrap();

        assert!((result.best - 42).abs() <= 5, "best = {}", result.best);
        assert_eq!(result.history.len(), 60);
        assert_eq!(result.population.len(), 30);
    }

    #[test]
    fn test_history_is_monotone_with_elitism() {
        let config = GaConfig::default()
            .with_population_size(20)
            .with_generations(25);
        let runner = GaRunner::new(config, problem());
        let mut rng = StdRng::seed_from_u64(11);
        let result = runner.run(&mut rng).unwrap();

        for pair in result.history.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_duplicates_evaluated_once() {
        let runner = GaRunner::new(GaConfig::default(), problem());
        let population = vec![5, 5, 5, 9, 9];
        let scores = runner.evaluate_population(&population).unwrap();

        assert_eq!(scores[0], scores[2]);
        assert_eq!(runner.problem().evaluated.load(Ordering::SeqCst), 2);
        assert_eq!(runner.evaluations(), 2);

        runner.evaluate_population(&population).unwrap();
        assert_eq!(runner.problem().evaluated.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let config = GaConfig::default()
            .with_population_size(16)
            .with_generations(10);
        let a = GaRunner::new(config.clone(), problem())
            .run(&mut StdRng::seed_from_u64(3))
            .unwrap();
        let b = GaRunner::new(config, problem())
            .run(&mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(a.population, b.population);
    }

    #[test]
    fn test_same_population_and_draws_same_final_population() {
        let config = GaConfig::default()
            .with_population_size(12)
            .with_generations(8);
        let initial: Vec<i64> = (0..12).map(|i| i * 37 - 200).collect();
        let none = None::<fn(&GaProgress<'_, i64>)>;

        let a = GaRunner::new(config.clone(), problem())
            .run_from_population(initial.clone(), &mut StdRng::seed_from_u64(5), none)
            .unwrap();
        let b = GaRunner::new(config, problem())
            .run_from_population(initial, &mut StdRng::seed_from_u64(5), none)
            .unwrap();
        assert_eq!(a.population, b.population);
        assert_eq!(a.history, b.history);
    }

    #[test]
    fn test_observer_cadence() {
        let config = GaConfig {
            observer_interval: 4,
            ..GaConfig::default()
                .with_population_size(8)
                .with_generations(10)
        };
        let runner = GaRunner::new(config, problem());
        let seen = std::sync::Mutex::new(Vec::new());
        runner
            .run_with_observer(
                &mut StdRng::seed_from_u64(1),
                Some(|p: &GaProgress<'_, i64>| seen.lock().unwrap().push(p.generation)),
            )
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0, 4, 8, 9]);
    }
}
