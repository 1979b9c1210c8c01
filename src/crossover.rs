//! Per-gene uniform crossover followed by repair: each cell is copied from one parent or the
//! other by coin flip, and the resulting child is always repaired afterwards.
use rand::Rng;

use crate::chromosome::{self, Chromosome};
use crate::model::{Agent, CompetitionConfig, Task};

/// Crossover is attempted with a probability configurable in the 0.5-0.9 range; the evolve loop
/// picks a fixed point in that range by default.
pub const DEFAULT_CROSSOVER_PROBABILITY: f64 = 0.8;

/// Produces one child by copying each cell from `parent_a` or `parent_b` with equal
/// probability, then repairing. Both parents must share shape.
pub fn uniform_crossover(
    parent_a: &Chromosome,
    parent_b: &Chromosome,
    tasks: &[Task],
    agents: &[Agent],
    config: &CompetitionConfig,
    rng: &mut impl Rng,
) -> Chromosome {
    debug_assert_eq!(parent_a.rows(), parent_b.rows());
    debug_assert_eq!(parent_a.cols(), parent_b.cols());

    let mut child = Chromosome::new_empty(parent_a.rows(), parent_a.cols());
    for task in 0..parent_a.rows() {
        for agent in 0..parent_a.cols() {
            let value = if rng.gen_bool(0.5) {
                parent_a.get(task, agent)
            } else {
                parent_b.get(task, agent)
            };
            if value > 0 {
                child.set(task, agent, value);
            }
        }
    }
    let cap = tasks.len().min(config.team_size);
    chromosome::repair(&mut child, cap, tasks, agents, rng);
    child
}

/// Either crosses `parent_a`/`parent_b` (with probability `crossover_probability`) or clones
/// `parent_a` unchanged.
pub fn cross_or_clone(
    parent_a: &Chromosome,
    parent_b: &Chromosome,
    tasks: &[Task],
    agents: &[Agent],
    config: &CompetitionConfig,
    crossover_probability: f64,
    rng: &mut impl Rng,
) -> Chromosome {
    if rng.gen_bool(crossover_probability) {
        uniform_crossover(parent_a, parent_b, tasks, agents, config, rng)
    } else {
        parent_a.clone()
    }
}
