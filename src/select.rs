//! Tournament selection with a diversification escape hatch: competitors are drawn into a
//! tournament and the fittest usually wins, but a uniformly random pick occasionally wins
//! instead to keep weaker chromosomes in circulation.
use rand::seq::SliceRandom;
use rand::Rng;

use crate::population::{Individual, Population};

/// Tournament size: `max(3, 0.05 * population_size)`.
pub fn tournament_size(population_size: usize) -> usize {
    (0.05 * population_size as f64).ceil().max(3.0) as usize
}

const FITTEST_PROBABILITY: f64 = 0.9;

/// Runs one tournament and returns the index (into `population.individuals`) of the winner.
///
/// With probability [FITTEST_PROBABILITY] returns the fittest competitor; otherwise returns a
/// uniformly random competitor, which keeps weak chromosomes occasionally in the gene pool.
pub fn select_one(population: &Population, rng: &mut impl Rng) -> usize {
    let size = tournament_size(population.size()).min(population.size());
    let mut indices: Vec<usize> = (0..population.size()).collect();
    indices.shuffle(rng);
    let competitors = &indices[..size];

    if rng.gen_bool(FITTEST_PROBABILITY) {
        *competitors
            .iter()
            .max_by(|&&a, &&b| {
                let fa = population.individuals[a].fitness_score().unwrap_or(0.0);
                let fb = population.individuals[b].fitness_score().unwrap_or(0.0);
                fa.partial_cmp(&fb).unwrap()
            })
            .unwrap()
    } else {
        *competitors.choose(rng).unwrap()
    }
}

/// Selects two parents, retrying a handful of times if they land on the same individual. A
/// handful of duplicate draws in a small population is expected and not itself an error.
pub fn select_two_parents<'a>(
    population: &'a Population,
    rng: &mut impl Rng,
) -> (&'a Individual, &'a Individual) {
    let first = select_one(population, rng);
    let mut second = select_one(population, rng);
    for _ in 0..5 {
        if second != first {
            break;
        }
        second = select_one(population, rng);
    }
    (&population.individuals[first], &population.individuals[second])
}
