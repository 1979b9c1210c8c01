//! Four mutation modes chosen uniformly per mutated chromosome, each followed by repair.
use rand::distributions::{Bernoulli, Distribution};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::chromosome::{self, Chromosome};
use crate::model::{Agent, CompetitionConfig, Task};

pub const DEFAULT_MUTATION_PROBABILITY: f64 = 0.15;
/// Adaptive boost applied when the population's distinct-fitness count drops below 10.
pub const ADAPTIVE_MUTATION_BOOST: f64 = 1.5;
const LOW_DIVERSITY_THRESHOLD: usize = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum MutationMode {
    Swap,
    Reassign,
    Add,
    Drop,
}

const MODES: [MutationMode; 4] = [
    MutationMode::Swap,
    MutationMode::Reassign,
    MutationMode::Add,
    MutationMode::Drop,
];

/// Effective mutation probability for this generation, boosted when diversity is low.
pub fn effective_probability(base_probability: f64, distinct_fitness_count: usize) -> f64 {
    if distinct_fitness_count < LOW_DIVERSITY_THRESHOLD {
        (base_probability * ADAPTIVE_MUTATION_BOOST).min(1.0)
    } else {
        base_probability
    }
}

/// Exchanges the agents of two existing assignments. Exposed beyond this module for the
/// diversity filter's forced-perturbation fallback (§4.7.5), which needs exactly this operator
/// rather than the full mutation dispatcher.
pub(crate) fn swap(chromosome: &mut Chromosome, rng: &mut impl Rng) -> bool {
    let assignments: Vec<(usize, usize)> = chromosome.assignments().map(|(t, a, _)| (t, a)).collect();
    if assignments.len() < 2 {
        return false;
    }
    let mut picked = assignments.choose_multiple(rng, 2);
    let (t1, a1) = *picked.next().unwrap();
    let (t2, a2) = *picked.next().unwrap();
    let p1 = chromosome.get(t1, a1);
    let p2 = chromosome.get(t2, a2);
    chromosome.set(t1, a2, p1);
    chromosome.set(t2, a1, p2);
    chromosome.clear(t1, a1);
    chromosome.clear(t2, a2);
    true
}

fn reassign(chromosome: &mut Chromosome, rng: &mut impl Rng) -> bool {
    let assignments: Vec<(usize, usize, u8)> = chromosome.assignments().collect();
    if assignments.is_empty() {
        return false;
    }
    let &(task, old_agent, priority) = assignments.choose(rng).unwrap();
    let cols = chromosome.cols();
    if cols <= 1 {
        return false;
    }
    let new_agent = loop {
        let candidate = rng.gen_range(0..cols);
        if candidate != old_agent {
            break candidate;
        }
    };
    chromosome.clear(task, old_agent);
    // Occasionally re-roll priority too, not just the agent.
    let new_priority = if rng.gen_bool(0.5) { priority } else { rng.gen_range(1..=3) };
    chromosome.set(task, new_agent, new_priority);
    true
}

fn add(chromosome: &mut Chromosome, cap: usize, rng: &mut impl Rng) -> bool {
    if chromosome.assignment_count() >= cap {
        return false;
    }
    let free_tasks: Vec<usize> = (0..chromosome.rows())
        .filter(|&t| chromosome.agent_for_task(t).is_none())
        .collect();
    let free_agents: Vec<usize> = (0..chromosome.cols())
        .filter(|&a| chromosome.task_for_agent(a).is_none())
        .collect();
    if free_tasks.is_empty() || free_agents.is_empty() {
        return false;
    }
    let task = *free_tasks.choose(rng).unwrap();
    let agent = *free_agents.choose(rng).unwrap();
    chromosome.set(task, agent, rng.gen_range(1..=3));
    true
}

fn drop_one(chromosome: &mut Chromosome, rng: &mut impl Rng) -> bool {
    let assignments: Vec<(usize, usize)> = chromosome.assignments().map(|(t, a, _)| (t, a)).collect();
    if assignments.len() < 2 {
        return false;
    }
    let &(task, agent) = assignments.choose(rng).unwrap();
    chromosome.clear(task, agent);
    true
}

/// Possibly mutates `chromosome` in place (gated by `probability`), then always repairs. Picks
/// one of [MODES] uniformly; if the picked mode can't apply (e.g. swap with <2 assignments) the
/// chromosome is left unchanged for that call.
pub fn maybe_mutate(
    chromosome: &mut Chromosome,
    tasks: &[Task],
    agents: &[Agent],
    config: &CompetitionConfig,
    probability: f64,
    rng: &mut impl Rng,
) {
    let sampler = Bernoulli::new(probability.clamp(0.0, 1.0)).unwrap();
    if !sampler.sample(rng) {
        return;
    }
    let cap = tasks.len().min(config.team_size);
    let mode = *MODES.choose(rng).unwrap();
    let changed = match mode {
        MutationMode::Swap => swap(chromosome, rng),
        MutationMode::Reassign => reassign(chromosome, rng),
        MutationMode::Add => add(chromosome, cap, rng),
        MutationMode::Drop => drop_one(chromosome, rng),
    };
    if changed {
        log::trace!("mutation applied: {:?}", mode);
        chromosome::repair(chromosome, cap, tasks, agents, rng);
    }
}
