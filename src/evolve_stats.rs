//! Diagnostic-only per-generation timing/bookkeeping ledger, used by `Evolve`'s `Display` impl.
//! Not part of [crate::evolve::OptimizationResult]; purely for local debugging of a run.
use std::time::Duration;

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn stddev(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let m = mean(values.clone());
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[derive(Default)]
pub struct EvolveStats {
    pub durations: Vec<Duration>,
    pub best_generations: Vec<usize>,
    pub best_fitness_scores: Vec<f64>,
}

impl EvolveStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_generation(&mut self, duration: Duration) {
        self.durations.push(duration);
    }

    pub fn record_new_best(&mut self, generation: usize, fitness: f64) {
        self.best_generations.push(generation);
        self.best_fitness_scores.push(fitness);
    }

    fn duration_mean_micros(&self) -> f64 {
        mean(self.durations.iter().map(|d| d.as_secs_f64() * 1_000_000.0))
    }
    fn duration_stddev_micros(&self) -> f64 {
        stddev(self.durations.iter().map(|d| d.as_secs_f64() * 1_000_000.0))
    }
}

impl std::fmt::Display for EvolveStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "generation duration - count: {}, mean: {:.1}us, stddev: {:.1}us",
            self.durations.len(),
            self.duration_mean_micros(),
            self.duration_stddev_micros(),
        )?;
        write!(f, " | ")?;
        write!(
            f,
            "best_generation - count: {}, mean: {:.1}, stddev: {:.1}",
            self.best_generations.len(),
            mean(self.best_generations.iter().map(|&g| g as f64)),
            stddev(self.best_generations.iter().map(|&g| g as f64)),
        )?;
        write!(f, " | ")?;
        write!(
            f,
            "best_fitness_score - count: {}, mean: {:.3}, stddev: {:.3}",
            self.best_fitness_scores.len(),
            mean(self.best_fitness_scores.iter().copied()),
            stddev(self.best_fitness_scores.iter().copied()),
        )
    }
}
