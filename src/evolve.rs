//! The evolution loop, its builder, and the public [optimize] entry point.
//!
//! A generational, elitist loop with fitness-uniqueness tracking for adaptive mutation, and
//! cooperative between-generation cancellation via an [Arc<AtomicBool>] abort signal.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::chromosome::Chromosome;
use crate::crossover;
use crate::diversity;
use crate::error::OptimizeError;
use crate::evolve_stats::EvolveStats;
use crate::fitness::{self, FitnessCache};
use crate::initialize;
use crate::model::{Agent, CompetitionConfig, Task};
use crate::mutate;
use crate::population::{Individual, Population};
use crate::select;
use crate::trace::FitnessTrace;

/// One assignment line in a reported plan.
#[derive(Clone, Debug)]
pub struct AssignmentDetail {
    pub task_id: u32,
    pub task_name: String,
    pub agent_id: u32,
    pub agent_name: String,
    pub compatibility: f64,
    pub estimated_time: f64,
    pub expected_score: f64,
}

/// Summary statistics over one plan's assignments.
#[derive(Clone, Debug, Default)]
pub struct PlanSummary {
    pub total_expected_score: f64,
    pub parallel_time: f64,
    pub mean_compatibility: f64,
    pub agents_used: usize,
}

/// One ranked, fully-detailed assignment plan.
#[derive(Clone, Debug)]
pub struct Plan {
    pub rank: usize,
    pub strategy_label: String,
    pub assignments: Vec<AssignmentDetail>,
    pub summary: PlanSummary,
    pub fitness: f64,
}

/// Final aggregate statistics over the whole run.
#[derive(Clone, Debug, Default)]
pub struct FinalStats {
    pub generations_executed: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub valid_individuals: usize,
    pub unique_fitness_count: usize,
}

/// The public output of [optimize]/[Evolve::call].
#[derive(Clone, Debug)]
pub struct OptimizationResult {
    pub plans: Vec<Plan>,
    pub trace: Vec<crate::trace::TracePoint>,
    pub final_stats: FinalStats,
    pub success: bool,
    pub error: Option<String>,
}

impl OptimizationResult {
    fn failed(reason: impl Into<String>) -> Self {
        Self {
            plans: Vec::new(),
            trace: Vec::new(),
            final_stats: FinalStats::default(),
            success: false,
            error: Some(reason.into()),
        }
    }
}

/// Whatever had been produced at the moment an abort signal fired; attached to
/// [OptimizeError::Aborted].
#[derive(Clone, Debug)]
pub struct PartialOutcome {
    pub plans: Vec<Plan>,
    pub trace: Vec<crate::trace::TracePoint>,
    pub generations_executed: usize,
}

fn build_plan(
    rank: usize,
    strategy_label: &str,
    chromosome: &Chromosome,
    tasks: &[Task],
    agents: &[Agent],
) -> Plan {
    let (assignment_details, summary) = {
        // Recompute for the report so assignment-level detail (per-row compatibility/time) is
        // available without threading it through the cache.
        let mut components = Vec::new();
        let mut total_expected_score = 0.0;
        let mut total_compatibility = 0.0;
        let mut per_agent_time: std::collections::HashMap<usize, f64> = std::collections::HashMap::new();

        for (task_idx, agent_idx, _) in chromosome.assignments() {
            let task = &tasks[task_idx];
            let agent = &agents[agent_idx];
            let compat = crate::scoring::compatibility(task, agent);
            let time = crate::scoring::estimated_solve_time(task, agent);
            let expected = crate::scoring::expected_score(task, agent);
            total_expected_score += expected;
            total_compatibility += compat;
            *per_agent_time.entry(agent_idx).or_insert(0.0) += time;

            components.push(AssignmentDetail {
                task_id: task.id,
                task_name: task.name.clone(),
                agent_id: agent.id,
                agent_name: agent.name.clone(),
                compatibility: compat,
                estimated_time: time,
                expected_score: expected,
            });
        }

        let agents_used = per_agent_time.len();
        let parallel_time = per_agent_time.values().cloned().fold(0.0_f64, f64::max);
        let mean_compatibility = if components.is_empty() {
            0.0
        } else {
            total_compatibility / components.len() as f64
        };

        (
            components,
            PlanSummary {
                total_expected_score,
                parallel_time,
                mean_compatibility,
                agents_used,
            },
        )
    };

    Plan {
        rank,
        strategy_label: strategy_label.to_string(),
        assignments: assignment_details,
        summary,
        fitness: chromosome.fitness_score.unwrap_or(0.0),
    }
}

/// Tuning knobs the evolve loop reads; all have documented, sensible defaults.
#[derive(Clone, Debug)]
pub struct EvolveTuning {
    pub population_size: Option<usize>,
    pub max_generations: usize,
    pub max_stale_generations: usize,
    pub stale_improvement_threshold: f64,
    pub target_fitness: f64,
    pub crossover_probability: f64,
    pub mutation_probability: f64,
    pub trace_cadence: usize,
}

impl Default for EvolveTuning {
    fn default() -> Self {
        Self {
            population_size: None,
            max_generations: 150,
            max_stale_generations: 30,
            stale_improvement_threshold: 1e-5,
            target_fitness: 0.98,
            crossover_probability: crossover::DEFAULT_CROSSOVER_PROBABILITY,
            mutation_probability: mutate::DEFAULT_MUTATION_PROBABILITY,
            trace_cadence: crate::trace::DEFAULT_SAMPLE_CADENCE,
        }
    }
}

/// The evolve invocation: owns its RNG, population, cache and trace for the duration of one
/// [call](Evolve::call). Nothing here is shared across invocations.
pub struct Evolve {
    tasks: Vec<Task>,
    agents: Vec<Agent>,
    config: CompetitionConfig,
    tuning: EvolveTuning,
    rng: StdRng,
    abort_signal: Option<Arc<AtomicBool>>,
    stats: EvolveStats,
}

impl std::fmt::Display for Evolve {
    /// Diagnostic summary of the run's per-generation pacing; not part of [OptimizationResult].
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Evolve: {}", self.stats)
    }
}

/// Population sizes above this threshold evaluate their generation's fitness in parallel via
/// rayon; smaller populations evaluate sequentially, since thread dispatch overhead would
/// dominate at that scale.
const PARALLEL_EVAL_THRESHOLD: usize = 64;

impl Evolve {
    /// Runs the full evolution loop to completion (or abort) and produces the final result.
    pub fn call(mut self) -> Result<OptimizationResult, OptimizeError> {
        let size = self
            .tuning
            .population_size
            .unwrap_or_else(|| initialize::population_size(self.tasks.len(), self.agents.len()));

        let mut cache = FitnessCache::new();
        let chromosomes = initialize::seed_population(&self.tasks, &self.agents, &self.config, size, &mut self.rng);
        let mut population = self.evaluate_all(chromosomes, &mut cache);

        if population.fitness_score_count() == 0 {
            return Err(OptimizeError::NoFeasibleStart);
        }

        let mut trace = FitnessTrace::new();
        let mut best_fitness = population.fitness_max().unwrap_or(0.0);
        let mut best_generation = 0usize;
        let mut generation = 0usize;
        let max_generations = self.scaled_max_generations(size);
        let elite_count = 5usize.max((0.08 * size as f64).ceil() as usize);

        loop {
            let generation_started_at = Instant::now();

            if self.is_aborted() {
                let partial = self.build_partial_outcome(&population, &trace, generation);
                return Err(OptimizeError::Aborted(partial));
            }

            self.sort_by_fitness_desc(&mut population);

            if generation % self.tuning.trace_cadence == 0 {
                self.record_trace_point(&mut trace, generation, &population);
            }

            if generation >= max_generations
                || best_fitness >= self.tuning.target_fitness
                || generation - best_generation >= self.tuning.max_stale_generations
            {
                break;
            }

            let distinct = population.distinct_fitness_count();
            let mutation_probability = mutate::effective_probability(self.tuning.mutation_probability, distinct);

            let elite: Vec<Individual> = population
                .individuals
                .iter()
                .take(elite_count.min(population.size()))
                .cloned()
                .collect();

            let mut offspring_chromosomes = Vec::with_capacity(size - elite.len());
            while elite.len() + offspring_chromosomes.len() < size {
                let (parent_a, parent_b) = select::select_two_parents(&population, &mut self.rng);
                let mut child = crossover::cross_or_clone(
                    &parent_a.chromosome,
                    &parent_b.chromosome,
                    &self.tasks,
                    &self.agents,
                    &self.config,
                    self.tuning.crossover_probability,
                    &mut self.rng,
                );
                mutate::maybe_mutate(
                    &mut child,
                    &self.tasks,
                    &self.agents,
                    &self.config,
                    mutation_probability,
                    &mut self.rng,
                );
                offspring_chromosomes.push(child);
            }

            let mut next_individuals = elite;
            next_individuals.extend(self.evaluate_all(offspring_chromosomes, &mut cache).individuals);
            population = Population::new(next_individuals);

            generation += 1;
            if let Some(current_best) = population.fitness_max() {
                if current_best - best_fitness > self.tuning.stale_improvement_threshold {
                    best_fitness = current_best;
                    best_generation = generation;
                    self.stats.record_new_best(generation, current_best);
                }
            }
            self.stats.record_generation(generation_started_at.elapsed());

            log::debug!(
                "generation {generation}: best={:.4} mean={:.4} distinct={}",
                population.fitness_max().unwrap_or(0.0),
                population.fitness_mean().unwrap_or(0.0),
                population.distinct_fitness_count(),
            );
        }

        self.sort_by_fitness_desc(&mut population);
        self.record_trace_point(&mut trace, generation, &population);

        let dense_trace = trace.densify(&mut self.rng);
        let top_k = diversity::select_top_k(
            &population.individuals,
            &self.tasks,
            &self.agents,
            &self.config,
            &mut self.rng,
        );

        let mut plans: Vec<Plan> = Vec::with_capacity(top_k.len());
        for (idx, chromosome) in top_k.iter().enumerate() {
            let mut chromosome = chromosome.clone();
            let evaluation = cache.get_or_evaluate(&chromosome, &self.tasks, &self.agents, &self.config);
            chromosome.fitness_score = Some(evaluation.fitness);
            plans.push(build_plan(idx + 1, "evolved", &chromosome, &self.tasks, &self.agents));
        }

        let final_stats = FinalStats {
            generations_executed: generation,
            best_fitness: population.fitness_max().unwrap_or(0.0),
            mean_fitness: population.fitness_mean().unwrap_or(0.0),
            valid_individuals: population.fitness_score_count(),
            unique_fitness_count: population.distinct_fitness_count(),
        };

        Ok(OptimizationResult {
            plans,
            trace: dense_trace,
            final_stats,
            success: true,
            error: None,
        })
    }

    /// Per-generation timing/bookkeeping ledger accumulated so far; diagnostic only.
    pub fn stats(&self) -> &EvolveStats {
        &self.stats
    }

    fn is_aborted(&self) -> bool {
        self.abort_signal
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    fn scaled_max_generations(&self, population_size: usize) -> usize {
        // Pace-scaled with population size: a larger population converges in fewer generations.
        let baseline = initialize::population_size(self.tasks.len(), self.agents.len()).max(1);
        let scale = (population_size as f64 / baseline as f64).clamp(0.5, 1.5);
        ((self.tuning.max_generations as f64) * scale).round() as usize
    }

    fn sort_by_fitness_desc(&self, population: &mut Population) {
        population.individuals.sort_by(|a, b| {
            let fa = a.fitness_score().unwrap_or(-1.0);
            let fb = b.fitness_score().unwrap_or(-1.0);
            fb.partial_cmp(&fa).unwrap()
        });
    }

    fn record_trace_point(&self, trace: &mut FitnessTrace, generation: usize, population: &Population) {
        let best = population.fitness_max().unwrap_or(0.0);
        let mean = population.fitness_mean().unwrap_or(0.0);
        let worst = population.fitness_min().unwrap_or(0.0);
        trace.push(generation, best, mean, worst);
    }

    fn build_partial_outcome(
        &mut self,
        population: &Population,
        trace: &FitnessTrace,
        generation: usize,
    ) -> PartialOutcome {
        let mut sorted = population.clone();
        self.sort_by_fitness_desc(&mut sorted);
        let mut cache = FitnessCache::new();
        let top_k = diversity::select_top_k(&sorted.individuals, &self.tasks, &self.agents, &self.config, &mut self.rng);
        let plans = top_k
            .iter()
            .enumerate()
            .map(|(idx, chromosome)| {
                let mut chromosome = chromosome.clone();
                let evaluation = cache.get_or_evaluate(&chromosome, &self.tasks, &self.agents, &self.config);
                chromosome.fitness_score = Some(evaluation.fitness);
                build_plan(idx + 1, "evolved", &chromosome, &self.tasks, &self.agents)
            })
            .collect();
        PartialOutcome {
            plans,
            trace: trace.densify(&mut self.rng),
            generations_executed: generation,
        }
    }

    /// Evaluates every distinct chromosome in `chromosomes`, in parallel when the batch is large
    /// enough. Per-chromosome work only reads the immutable task/agent tables, so no per-thread
    /// RNG partitioning is required.
    fn evaluate_all(&self, chromosomes: Vec<Chromosome>, cache: &mut FitnessCache) -> Population {
        let evaluations: Vec<(Chromosome, fitness::Evaluation)> = if chromosomes.len() >= PARALLEL_EVAL_THRESHOLD {
            chromosomes
                .into_par_iter()
                .map(|c| {
                    let evaluation = fitness::evaluate(&c, &self.tasks, &self.agents, &self.config);
                    (c, evaluation)
                })
                .collect()
        } else {
            chromosomes
                .into_iter()
                .map(|c| {
                    let evaluation = cache.get_or_evaluate(&c, &self.tasks, &self.agents, &self.config);
                    (c, evaluation)
                })
                .collect()
        };

        let individuals = evaluations
            .into_iter()
            .map(|(mut chromosome, evaluation)| {
                chromosome.fitness_score = if evaluation.components.valid {
                    Some(evaluation.fitness)
                } else {
                    None
                };
                Individual::new(chromosome)
            })
            .collect();
        Population::new(individuals)
    }
}

/// Builder for [Evolve]: chain `with_x()` calls then `build()`.
#[derive(Default)]
pub struct EvolveBuilder {
    tasks: Option<Vec<Task>>,
    agents: Option<Vec<Agent>>,
    config: Option<CompetitionConfig>,
    seed: Option<u64>,
    abort_signal: Option<Arc<AtomicBool>>,
    tuning: EvolveTuning,
}

impl EvolveBuilder {
    pub fn new() -> Self {
        Self {
            tuning: EvolveTuning::default(),
            ..Default::default()
        }
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = Some(tasks);
        self
    }
    pub fn with_agents(mut self, agents: Vec<Agent>) -> Self {
        self.agents = Some(agents);
        self
    }
    pub fn with_config(mut self, config: CompetitionConfig) -> Self {
        self.config = Some(config);
        self
    }
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn with_abort_signal(mut self, abort_signal: Arc<AtomicBool>) -> Self {
        self.abort_signal = Some(abort_signal);
        self
    }
    pub fn with_population_size(mut self, population_size: usize) -> Self {
        self.tuning.population_size = Some(population_size);
        self
    }
    pub fn with_tuning(mut self, tuning: EvolveTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn build(self) -> Result<Evolve, OptimizeError> {
        let tasks = self.tasks.unwrap_or_default();
        let agents = self.agents.unwrap_or_default();
        let config = self.config.unwrap_or_else(|| CompetitionConfig::new(120.0, 1));

        if tasks.is_empty() || agents.is_empty() {
            return Err(OptimizeError::EmptyInput);
        }
        if config.team_size > agents.len() {
            return Err(OptimizeError::TeamTooLarge {
                team_size: config.team_size,
                available_agents: agents.len(),
            });
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Evolve {
            tasks,
            agents,
            config,
            tuning: self.tuning,
            rng,
            abort_signal: self.abort_signal,
            stats: EvolveStats::new(),
        })
    }
}

/// Convenience entry point: validates inputs, runs the evolve loop to completion, and collapses
/// any error into a failed [OptimizationResult] rather than propagating.
pub fn optimize(
    tasks: Vec<Task>,
    agents: Vec<Agent>,
    config: CompetitionConfig,
    seed: Option<u64>,
) -> OptimizationResult {
    let mut builder = EvolveBuilder::new().with_tasks(tasks).with_agents(agents).with_config(config);
    if let Some(seed) = seed {
        builder = builder.with_seed(seed);
    }
    match builder.build() {
        Ok(evolve) => match evolve.call() {
            Ok(result) => result,
            Err(OptimizeError::Aborted(partial)) => OptimizationResult {
                plans: partial.plans,
                trace: partial.trace,
                final_stats: FinalStats {
                    generations_executed: partial.generations_executed,
                    ..Default::default()
                },
                success: false,
                error: Some("aborted".to_string()),
            },
            Err(err) => OptimizationResult::failed(err.to_string()),
        },
        Err(err) => OptimizationResult::failed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DifficultyLevel;
    use std::collections::BTreeMap;

    fn sample_tasks_and_agents() -> (Vec<Task>, Vec<Agent>) {
        let mut skills_a = BTreeMap::new();
        skills_a.insert("algorithms".to_string(), 0.6);
        let t1 = Task::new(1, "T1", "algorithms", DifficultyLevel::Medium, 100, 1.2, skills_a, 45, 0.5);

        let mut skills_b = BTreeMap::new();
        skills_b.insert("data_structures".to_string(), 0.8);
        let t2 = Task::new(2, "T2", "data_structures", DifficultyLevel::Medium, 200, 1.5, skills_b, 75, 0.5);

        let mut agent_a_skills = BTreeMap::new();
        agent_a_skills.insert("algorithms".to_string(), 0.9);
        agent_a_skills.insert("python".to_string(), 0.9);
        let agent_a = Agent::new(1, "A", agent_a_skills, 0.75, 2.0, 3, 20, true);

        let mut agent_b_skills = BTreeMap::new();
        agent_b_skills.insert("data_structures".to_string(), 0.85);
        agent_b_skills.insert("java".to_string(), 0.8);
        let agent_b = Agent::new(2, "B", agent_b_skills, 0.68, 2.0, 3, 20, true);

        (vec![t1, t2], vec![agent_a, agent_b])
    }

    #[test]
    fn optimize_produces_a_feasible_plan_for_s1() {
        let (tasks, agents) = sample_tasks_and_agents();
        let config = CompetitionConfig::new(300.0, 2);
        let result = optimize(tasks, agents, config, Some(42));
        assert!(result.success);
        assert!(!result.plans.is_empty());
        let best = &result.plans[0];
        assert!(best.summary.parallel_time <= 300.0);
    }

    #[test]
    fn team_too_large_fails_cleanly() {
        let (tasks, agents) = sample_tasks_and_agents();
        let config = CompetitionConfig::new(300.0, 6);
        let result = optimize(tasks, agents, config, Some(1));
        assert!(!result.success);
    }

    #[test]
    fn empty_input_fails_cleanly() {
        let config = CompetitionConfig::new(300.0, 1);
        let result = optimize(Vec::new(), Vec::new(), config, None);
        assert!(!result.success);
    }

    #[test]
    fn same_seed_produces_identical_results() {
        let (tasks1, agents1) = sample_tasks_and_agents();
        let (tasks2, agents2) = sample_tasks_and_agents();
        let config1 = CompetitionConfig::new(300.0, 2);
        let config2 = CompetitionConfig::new(300.0, 2);
        let result1 = optimize(tasks1, agents1, config1, Some(7));
        let result2 = optimize(tasks2, agents2, config2, Some(7));
        assert_eq!(result1.final_stats.best_fitness, result2.final_stats.best_fitness);
        assert_eq!(result1.plans.len(), result2.plans.len());
    }
}
