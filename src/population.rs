//! A population is an ordered collection of [Individual]s evolved together for one generation.
use rand::seq::SliceRandom;
use rand::Rng;

use crate::chromosome::Chromosome;

/// A chromosome paired with the agent name strings is not stored here; `Individual` only
/// wraps the matrix itself plus bookkeeping the evolve loop needs (age, provenance).
#[derive(Clone, Debug)]
pub struct Individual {
    pub chromosome: Chromosome,
}

impl Individual {
    pub fn new(chromosome: Chromosome) -> Self {
        Self { chromosome }
    }

    pub fn fitness_score(&self) -> Option<f64> {
        self.chromosome.fitness_score
    }
}

/// Ordered `Vec<Individual>` wrapper providing size, shuffle, and best-chromosome lookups.
#[derive(Clone, Debug)]
pub struct Population {
    pub individuals: Vec<Individual>,
}

impl Population {
    pub fn new(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    pub fn size(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.individuals.shuffle(rng);
    }

    pub fn best_index(&self) -> Option<usize> {
        self.individuals
            .iter()
            .enumerate()
            .filter_map(|(idx, ind)| ind.fitness_score().map(|score| (idx, score)))
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(idx, _)| idx)
    }

    pub fn best(&self) -> Option<&Individual> {
        self.best_index().map(|idx| &self.individuals[idx])
    }

    pub fn fitness_score_count(&self) -> usize {
        self.individuals
            .iter()
            .filter(|i| i.fitness_score().is_some())
            .count()
    }

    pub fn fitness_min(&self) -> Option<f64> {
        self.individuals
            .iter()
            .filter_map(|i| i.fitness_score())
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
    }

    pub fn fitness_max(&self) -> Option<f64> {
        self.individuals
            .iter()
            .filter_map(|i| i.fitness_score())
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }

    pub fn fitness_mean(&self) -> Option<f64> {
        let scores: Vec<f64> = self.individuals.iter().filter_map(|i| i.fitness_score()).collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        }
    }

    /// Count of distinct fitness scores, rounded to 6 decimals, used by the evolve loop to
    /// decide when to boost mutation probability.
    pub fn distinct_fitness_count(&self) -> usize {
        let mut rounded: Vec<i64> = self
            .individuals
            .iter()
            .filter_map(|i| i.fitness_score())
            .map(|v| (v * 1_000_000.0).round() as i64)
            .collect();
        rounded.sort_unstable();
        rounded.dedup();
        rounded.len()
    }

    pub fn reset_age(&mut self) {
        for ind in &mut self.individuals {
            ind.chromosome.reset_age();
        }
    }

    pub fn increment_age(&mut self) {
        for ind in &mut self.individuals {
            ind.chromosome.increment_age();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn individual_with_fitness(score: f64) -> Individual {
        let mut chromosome = Chromosome::new_empty(2, 2);
        chromosome.fitness_score = Some(score);
        Individual::new(chromosome)
    }

    #[test]
    fn best_index_picks_highest_fitness() {
        let pop = Population::new(vec![
            individual_with_fitness(0.1),
            individual_with_fitness(0.9),
            individual_with_fitness(0.5),
        ]);
        assert_eq!(pop.best_index(), Some(1));
    }

    #[test]
    fn distinct_fitness_count_dedupes_near_equal_scores() {
        let pop = Population::new(vec![
            individual_with_fitness(0.123_456_7),
            individual_with_fitness(0.123_456_8),
            individual_with_fitness(0.9),
        ]);
        assert_eq!(pop.distinct_fitness_count(), 2);
    }

    #[test]
    fn empty_population_has_no_best() {
        let pop = Population::new(vec![]);
        assert_eq!(pop.best_index(), None);
        assert_eq!(pop.fitness_mean(), None);
    }
}
