//! The assignment matrix: a fixed-shape `|tasks| x |agents|` grid of small non-negative
//! integers, plus the repair operation that restores its structural invariants.
use itertools::Itertools;
use rustc_hash::FxHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{Agent, Task};
use crate::scoring;

/// `M[task][agent] > 0` marks an assignment. The value itself (1-3) is an opaque mutation-bias
/// priority; only `>0` carries meaning to repair, fitness and diversity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chromosome {
    rows: usize,
    cols: usize,
    cells: Vec<u8>,
    pub fitness_score: Option<f64>,
    pub age: usize,
}

impl Chromosome {
    pub fn new_empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0; rows * cols],
            fitness_score: None,
            age: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn index(&self, task: usize, agent: usize) -> usize {
        task * self.cols + agent
    }

    #[inline]
    pub fn get(&self, task: usize, agent: usize) -> u8 {
        self.cells[self.index(task, agent)]
    }

    #[inline]
    pub fn set(&mut self, task: usize, agent: usize, priority: u8) {
        let idx = self.index(task, agent);
        self.cells[idx] = priority;
        self.taint();
    }

    #[inline]
    pub fn clear(&mut self, task: usize, agent: usize) {
        self.set(task, agent, 0);
    }

    /// Invalidates the cached fitness score; called by any mutating accessor.
    pub fn taint(&mut self) {
        self.fitness_score = None;
        self.age = 0;
    }

    pub fn reset_age(&mut self) {
        self.age = 0;
    }
    pub fn increment_age(&mut self) {
        self.age += 1;
    }

    /// All `(task, agent, priority)` triples with `priority > 0`.
    pub fn assignments(&self) -> impl Iterator<Item = (usize, usize, u8)> + '_ {
        (0..self.rows).flat_map(move |task| {
            (0..self.cols).filter_map(move |agent| {
                let p = self.get(task, agent);
                (p > 0).then_some((task, agent, p))
            })
        })
    }

    pub fn assignment_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c > 0).count()
    }

    pub fn agent_for_task(&self, task: usize) -> Option<usize> {
        (0..self.cols).find(|&agent| self.get(task, agent) > 0)
    }

    pub fn task_for_agent(&self, agent: usize) -> Option<usize> {
        (0..self.rows).find(|&task| self.get(task, agent) > 0)
    }

    /// Structural hash used to key the per-invocation fitness cache.
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.cells.hash(&mut hasher);
        hasher.finish()
    }

    /// Fraction of cells equal between `self` and `other`, used by the diversity filter.
    /// Both chromosomes must share shape.
    pub fn hamming_similarity(&self, other: &Chromosome) -> f64 {
        debug_assert_eq!(self.cells.len(), other.cells.len());
        let equal = self
            .cells
            .iter()
            .zip(other.cells.iter())
            .filter(|(a, b)| a == b)
            .count();
        equal as f64 / self.cells.len() as f64
    }

    /// Number of `(task, agent)` assignment pairs present in exactly one of the two
    /// chromosomes.
    pub fn differing_assignment_count(&self, other: &Chromosome) -> usize {
        let mine: std::collections::HashSet<(usize, usize)> =
            self.assignments().map(|(t, a, _)| (t, a)).collect();
        let theirs: std::collections::HashSet<(usize, usize)> =
            other.assignments().map(|(t, a, _)| (t, a)).collect();
        mine.symmetric_difference(&theirs).count()
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chromosome:\n")?;
        write!(f, "  shape: {}x{}\n", self.rows, self.cols)?;
        write!(
            f,
            "  assignments: {}\n",
            self.assignments()
                .map(|(task, agent, priority)| format!("{task}->{agent}@{priority}"))
                .join(",")
        )?;
        write!(f, "  fitness_score: {:?}", self.fitness_score)
    }
}

/// Restores the structural invariants on a chromosome that may violate any of them: at most one
/// assignment per task, at most one per agent, and no more than `cap = min(|tasks|, team_size)`
/// assignments total.
///
/// Idempotent: each pass only clears conflicting cells and never sets a new one, so a second
/// call finds nothing left to repair.
pub fn repair(
    chromosome: &mut Chromosome,
    cap: usize,
    tasks: &[Task],
    agents: &[Agent],
    rng: &mut impl Rng,
) {
    let rows = chromosome.rows();
    let cols = chromosome.cols();

    // One agent per task: for rows with >1 non-zero cell, keep one at random, zero the rest.
    for task in 0..rows {
        let occupied: Vec<usize> = (0..cols).filter(|&a| chromosome.get(task, a) > 0).collect();
        if occupied.len() > 1 {
            let keep = *occupied.choose(rng).unwrap();
            for agent in occupied {
                if agent != keep {
                    chromosome.clear(task, agent);
                }
            }
        }
    }

    // One task per agent: for columns with >1 non-zero cell, keep the earliest row.
    for agent in 0..cols {
        let occupied: Vec<usize> = (0..rows).filter(|&t| chromosome.get(t, agent) > 0).collect();
        if occupied.len() > 1 {
            let keep = occupied[0];
            for task in occupied {
                if task != keep {
                    chromosome.clear(task, agent);
                }
            }
        }
    }

    // Enforce the assignment cap, dropping the lowest-compatibility assignments first.
    let mut current: Vec<(usize, usize)> =
        chromosome.assignments().map(|(t, a, _)| (t, a)).collect();
    if current.len() > cap {
        current.sort_by(|&(t1, a1), &(t2, a2)| {
            let c1 = scoring::compatibility(&tasks[t1], &agents[a1]);
            let c2 = scoring::compatibility(&tasks[t2], &agents[a2]);
            c1.partial_cmp(&c2).unwrap()
        });
        let excess = current.len() - cap;
        for (task, agent) in current.into_iter().take(excess) {
            chromosome.clear(task, agent);
        }
    }
    chromosome.fitness_score = None;
}
