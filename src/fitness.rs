//! The multi-component fitness evaluator: consumes a chromosome plus the task/agent
//! tables and emits a scalar fitness in `[0,1]` together with per-component metrics.
use rustc_hash::FxHashMap;

use crate::chromosome::Chromosome;
use crate::model::{Agent, CompetitionConfig, StrategyWeights};
use crate::scoring;

/// Per-component metrics computed alongside the scalar fitness, kept on the [Individual]
/// produced for a plan so the caller doesn't have to re-derive them from the chromosome.
#[derive(Clone, Debug, Default)]
pub struct FitnessComponents {
    pub score_term: f64,
    pub compatibility_term: f64,
    pub quantity_term: f64,
    pub time_term: f64,
    pub parallel_time: f64,
    pub agents_used: usize,
    pub mean_compatibility: f64,
    pub total_expected_score: f64,
    pub valid: bool,
}

/// Outcome of evaluating one chromosome: a scalar fitness plus the components above.
#[derive(Clone, Debug)]
pub struct Evaluation {
    pub fitness: f64,
    pub components: FitnessComponents,
}

impl Evaluation {
    fn invalid() -> Self {
        Self {
            fitness: 0.0,
            components: FitnessComponents {
                valid: false,
                ..Default::default()
            },
        }
    }
}

/// Weight nudge ceiling from data characteristics: keeps the adaptive adjustment below a
/// documented ±20% of the base weight so it can never flip which term dominates.
const ADAPTIVE_WEIGHT_BOUND: f64 = 0.2;

const TEAM_UTILIZATION_BONUS: f64 = 0.1;
const LOAD_BALANCE_BONUS: f64 = 0.05;

/// Weights actually used for one evaluation, after the optional override and the optional
/// adaptive nudge have both been applied and renormalized to sum to 1.0.
#[derive(Copy, Clone, Debug)]
struct EffectiveWeights {
    score: f64,
    compatibility: f64,
    quantity: f64,
    time: f64,
}

impl EffectiveWeights {
    fn from_config(weights: StrategyWeights) -> Self {
        let sum = weights.score + weights.compatibility + weights.quantity + weights.time;
        let sum = if sum > 0.0 { sum } else { 1.0 };
        Self {
            score: weights.score / sum,
            compatibility: weights.compatibility / sum,
            quantity: weights.quantity / sum,
            time: weights.time / sum,
        }
    }
}

/// Nudges the score/compatibility balance based on how spread out task difficulty and agent
/// experience are: wide spreads mean compatibility is a noisier signal, so the evaluator leans
/// slightly more on raw score. Bounded to ±[ADAPTIVE_WEIGHT_BOUND] of the base weight.
fn adapt_weights(base: EffectiveWeights, difficulty_diversity: f64, experience_spread: f64) -> EffectiveWeights {
    let nudge = ((difficulty_diversity + experience_spread) / 2.0 - 0.5) * ADAPTIVE_WEIGHT_BOUND;
    let score = base.score * (1.0 + nudge);
    let compatibility = base.compatibility * (1.0 - nudge);
    let sum = score + compatibility + base.quantity + base.time;
    EffectiveWeights {
        score: score / sum,
        compatibility: compatibility / sum,
        quantity: base.quantity / sum,
        time: base.time / sum,
    }
}

fn difficulty_diversity(tasks: &[crate::model::Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let mut factors: Vec<f64> = tasks.iter().map(|t| t.difficulty.success_factor()).collect();
    factors.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let spread = factors.last().unwrap() - factors.first().unwrap();
    (spread / 0.4).clamp(0.0, 1.0)
}

fn experience_spread(agents: &[Agent]) -> f64 {
    if agents.is_empty() {
        return 0.0;
    }
    let years: Vec<f64> = agents.iter().map(|a| a.years_experience).collect();
    let mean = years.iter().sum::<f64>() / years.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = years.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / years.len() as f64;
    (variance.sqrt() / mean).clamp(0.0, 1.0)
}

fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt() / mean
}

/// Evaluates one chromosome. Never panics: a malformed chromosome (invariant violation, no
/// assignments, or parallel time over budget) degrades to [Evaluation::invalid] rather than
/// propagating an error — a single individual's evaluation failure is not exposed as an error
/// type, since the population at large tolerates some invalid individuals.
pub fn evaluate(
    chromosome: &Chromosome,
    tasks: &[crate::model::Task],
    agents: &[Agent],
    config: &CompetitionConfig,
) -> Evaluation {
    let assignments: Vec<(usize, usize)> = chromosome.assignments().map(|(t, a, _)| (t, a)).collect();
    if assignments.is_empty() {
        return Evaluation::invalid();
    }

    // §3 invariant check: duplicate rows/columns mean the caller passed an unrepaired matrix.
    let mut seen_tasks = std::collections::HashSet::new();
    let mut seen_agents = std::collections::HashSet::new();
    for &(task, agent) in &assignments {
        if !seen_tasks.insert(task) || !seen_agents.insert(agent) {
            return Evaluation::invalid();
        }
    }
    if assignments.len() > tasks.len().min(config.team_size) {
        return Evaluation::invalid();
    }

    let mut per_agent_time: FxHashMap<usize, f64> = FxHashMap::default();
    let mut total_expected_score = 0.0;
    let mut total_compatibility = 0.0;
    let mut total_success_probability = 0.0;

    for &(task_idx, agent_idx) in &assignments {
        let task = &tasks[task_idx];
        let agent = &agents[agent_idx];
        let compat = scoring::compatibility(task, agent);
        let success = scoring::success_probability(task, agent);
        let time = scoring::estimated_solve_time(task, agent);
        let expected = scoring::expected_score(task, agent);

        total_compatibility += compat;
        total_success_probability += success;
        total_expected_score += expected;
        *per_agent_time.entry(agent_idx).or_insert(0.0) += time;
    }

    let parallel_time = per_agent_time.values().cloned().fold(0.0_f64, f64::max);
    if parallel_time > config.total_time_minutes {
        return Evaluation::invalid();
    }

    let points_total: f64 = tasks.iter().map(|t| t.points_total()).sum();
    let score_term = if points_total > 0.0 {
        (total_expected_score / points_total).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let compatibility_term = (total_compatibility / assignments.len() as f64).clamp(0.0, 1.0);
    let quantity_term = (total_success_probability / tasks.len() as f64).clamp(0.0, 1.0);
    let time_term = (1.0 - parallel_time / config.total_time_minutes).max(0.0);

    let base_weights = config.strategy_weights.unwrap_or_default();
    let weights = adapt_weights(
        EffectiveWeights::from_config(base_weights),
        difficulty_diversity(tasks),
        experience_spread(agents),
    );

    let mut fitness = weights.score * score_term
        + weights.compatibility * compatibility_term
        + weights.quantity * quantity_term
        + weights.time * time_term;

    let agents_used = per_agent_time.len();
    if agents_used < config.team_size {
        fitness += TEAM_UTILIZATION_BONUS * (agents_used as f64 / config.team_size as f64);
    }
    if agents_used > 1 {
        let times: Vec<f64> = per_agent_time.values().cloned().collect();
        let cv = coefficient_of_variation(&times);
        fitness += LOAD_BALANCE_BONUS * (1.0 - cv).max(0.0);
    }

    Evaluation {
        fitness: fitness.clamp(0.0, 1.0),
        components: FitnessComponents {
            score_term,
            compatibility_term,
            quantity_term,
            time_term,
            parallel_time,
            agents_used,
            mean_compatibility: compatibility_term,
            total_expected_score,
            valid: true,
        },
    }
}

/// A per-invocation fitness cache keyed by the chromosome's structural hash, scoped to a single
/// evolution run. An unbounded `FxHashMap` is enough: the search space here is one run's worth
/// of chromosomes, not a long-lived cross-run cache, so no eviction policy is needed.
#[derive(Debug, Default)]
pub struct FitnessCache {
    entries: FxHashMap<u64, Evaluation>,
    hits: usize,
    misses: usize,
}

impl FitnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_evaluate(
        &mut self,
        chromosome: &Chromosome,
        tasks: &[crate::model::Task],
        agents: &[Agent],
        config: &CompetitionConfig,
    ) -> Evaluation {
        let key = chromosome.structural_hash();
        if let Some(cached) = self.entries.get(&key) {
            self.hits += 1;
            return cached.clone();
        }
        self.misses += 1;
        let evaluation = evaluate(chromosome, tasks, agents, config);
        self.entries.insert(key, evaluation.clone());
        evaluation
    }

    pub fn hit_miss_stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}
