//! Population seeding: four strategies cycled round-robin, each producing a repaired chromosome.
//! "Load-balanced" here means least-loaded-agent-first, not a point-bucketed variant.
use rand::seq::SliceRandom;
use rand::Rng;

use crate::chromosome::{self, Chromosome};
use crate::model::{Agent, CompetitionConfig, Task};
use crate::scoring;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SeedStrategy {
    Random,
    ExperienceRanked,
    LoadBalanced,
    CompatibilityGreedy,
}

const STRATEGY_CYCLE: [SeedStrategy; 4] = [
    SeedStrategy::Random,
    SeedStrategy::ExperienceRanked,
    SeedStrategy::LoadBalanced,
    SeedStrategy::CompatibilityGreedy,
];

/// Default population size: `3·|tasks|·|agents|`, clamped to `[80, 200]`.
pub fn population_size(num_tasks: usize, num_agents: usize) -> usize {
    (3 * num_tasks * num_agents).clamp(80, 200)
}

fn task_subset(num_tasks: usize, rng: &mut impl Rng) -> Vec<usize> {
    let low = (num_tasks / 2).max(3).min(num_tasks).max(1);
    let high = ((3 * num_tasks) / 4).min(num_tasks).max(low);
    let count = if low >= high { low } else { rng.gen_range(low..=high) };
    let mut indices: Vec<usize> = (0..num_tasks).collect();
    indices.shuffle(rng);
    indices.truncate(count.min(num_tasks));
    indices
}

fn cap(tasks: &[Task], config: &CompetitionConfig) -> usize {
    tasks.len().min(config.team_size)
}

fn seed_random(tasks: &[Task], agents: &[Agent], config: &CompetitionConfig, rng: &mut impl Rng) -> Chromosome {
    let mut chromosome = Chromosome::new_empty(tasks.len(), agents.len());
    for task in task_subset(tasks.len(), rng) {
        let agent = rng.gen_range(0..agents.len());
        chromosome.set(task, agent, rng.gen_range(1..=3));
    }
    chromosome::repair(&mut chromosome, cap(tasks, config), tasks, agents, rng);
    chromosome
}

fn seed_experience_ranked(
    tasks: &[Task],
    agents: &[Agent],
    config: &CompetitionConfig,
    rng: &mut impl Rng,
) -> Chromosome {
    let mut ranked_agents: Vec<usize> = (0..agents.len()).collect();
    ranked_agents.sort_by(|&a, &b| {
        let score_a = agents[a].years_experience + agents[a].competitions_participated as f64;
        let score_b = agents[b].years_experience + agents[b].competitions_participated as f64;
        score_b.partial_cmp(&score_a).unwrap()
    });

    let mut chromosome = Chromosome::new_empty(tasks.len(), agents.len());
    for (i, task) in task_subset(tasks.len(), rng).into_iter().enumerate() {
        let agent = ranked_agents[i % ranked_agents.len()];
        chromosome.set(task, agent, rng.gen_range(1..=3));
    }
    chromosome::repair(&mut chromosome, cap(tasks, config), tasks, agents, rng);
    chromosome
}

fn seed_load_balanced(
    tasks: &[Task],
    agents: &[Agent],
    config: &CompetitionConfig,
    rng: &mut impl Rng,
) -> Chromosome {
    let mut loads = vec![0u32; agents.len()];
    let mut chromosome = Chromosome::new_empty(tasks.len(), agents.len());
    for task in task_subset(tasks.len(), rng) {
        let min_load = *loads.iter().min().unwrap();
        let candidates: Vec<usize> = loads
            .iter()
            .enumerate()
            .filter(|(_, &load)| load == min_load)
            .map(|(idx, _)| idx)
            .collect();
        let agent = *candidates.choose(rng).unwrap();
        loads[agent] += 1;
        chromosome.set(task, agent, rng.gen_range(1..=3));
    }
    chromosome::repair(&mut chromosome, cap(tasks, config), tasks, agents, rng);
    chromosome
}

const FORCED_BREADTH_TARGET: usize = 6;

fn seed_compatibility_greedy(
    tasks: &[Task],
    agents: &[Agent],
    config: &CompetitionConfig,
    rng: &mut impl Rng,
) -> Chromosome {
    let mut chromosome = Chromosome::new_empty(tasks.len(), agents.len());
    let mut used_agents = std::collections::HashSet::new();
    let breadth_target = FORCED_BREADTH_TARGET.min(agents.len());

    for task in task_subset(tasks.len(), rng) {
        let mut by_compat: Vec<(usize, f64)> = (0..agents.len())
            .map(|agent| (agent, scoring::compatibility(&tasks[task], &agents[agent])))
            .collect();
        by_compat.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        let top_half = (by_compat.len() / 2).max(1);
        let candidates = &by_compat[..top_half];

        let chosen = if used_agents.len() < breadth_target {
            candidates
                .iter()
                .find(|(agent, _)| !used_agents.contains(agent))
                .or_else(|| candidates.first())
                .map(|(agent, _)| *agent)
        } else {
            candidates.choose(rng).map(|(agent, _)| *agent)
        };

        if let Some(agent) = chosen {
            used_agents.insert(agent);
            chromosome.set(task, agent, rng.gen_range(1..=3));
        }
    }
    chromosome::repair(&mut chromosome, cap(tasks, config), tasks, agents, rng);
    chromosome
}

/// Seeds a population of `size` chromosomes, cycling the four strategies round-robin.
pub fn seed_population(
    tasks: &[Task],
    agents: &[Agent],
    config: &CompetitionConfig,
    size: usize,
    rng: &mut impl Rng,
) -> Vec<Chromosome> {
    (0..size)
        .map(|i| {
            let strategy = STRATEGY_CYCLE[i % STRATEGY_CYCLE.len()];
            match strategy {
                SeedStrategy::Random => seed_random(tasks, agents, config, rng),
                SeedStrategy::ExperienceRanked => seed_experience_ranked(tasks, agents, config, rng),
                SeedStrategy::LoadBalanced => seed_load_balanced(tasks, agents, config, rng),
                SeedStrategy::CompatibilityGreedy => seed_compatibility_greedy(tasks, agents, config, rng),
            }
        })
        .collect()
}
