use std::{collections::HashMap, hash::BuildHasher};

use crate::{
    filter::{filter, Filtered},
    solver::{Solution, SolveError, Solver},
    Observation,
};

/// Rule for picking the round's reported max delta out of all parameter
/// deltas.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum MaxDeltaTracking {
    /// The first nonzero delta seeds the running value. Later deltas replace
    /// it only when they are larger while it is positive, or smaller while it
    /// is negative. The result is an extreme in the direction of the seed, not
    /// necessarily the largest magnitude.
    #[default]
    SignBiased,
    /// Keep the delta with the largest magnitude.
    Absolute,
}

#[derive(Debug, Clone)]
pub struct EstimatorBuilder {
    tolerance: f64,

    warmup_rounds: u64,
    warmup_eta: f64,

    alpha_growth_slow: f64,
    alpha_growth_fast: f64,
    alpha_growth_threshold: f64,

    max_rounds: Option<u64>,
    detect_stall: bool,
    max_delta_tracking: MaxDeltaTracking,
}

impl Default for EstimatorBuilder {
    fn default() -> EstimatorBuilder {
        EstimatorBuilder::new()
    }
}

impl EstimatorBuilder {
    pub fn new() -> EstimatorBuilder {
        EstimatorBuilder {
            tolerance: 0.001,

            warmup_rounds: 20,
            warmup_eta: 0.5,

            alpha_growth_slow: 1.02,
            alpha_growth_fast: 1.005,
            alpha_growth_threshold: 5.0,

            max_rounds: None,
            detect_stall: false,
            max_delta_tracking: MaxDeltaTracking::SignBiased,
        }
    }

    /// Stop once the absolute max delta of a round is at most this value.
    pub fn tolerance(&mut self, tolerance: f64) -> &mut Self {
        assert!(tolerance > 0.0);
        self.tolerance = tolerance;
        self
    }

    /// Number of initial rounds that use the fixed [`warmup_eta`](Self::warmup_eta)
    /// instead of `alpha / 16`.
    pub fn warmup_rounds(&mut self, warmup_rounds: u64) -> &mut Self {
        self.warmup_rounds = warmup_rounds;
        self
    }

    pub fn warmup_eta(&mut self, warmup_eta: f64) -> &mut Self {
        assert!(warmup_eta > 0.0);
        self.warmup_eta = warmup_eta;
        self
    }

    /// Growth factor of alpha while alpha is at most
    /// [`alpha_growth_threshold`](Self::alpha_growth_threshold).
    ///
    /// Despite the name this is the larger of the two factors by default
    /// (`1.02` against `1.005`). The names follow the established option
    /// names, not the rates.
    pub fn alpha_growth_slow(&mut self, alpha_growth_slow: f64) -> &mut Self {
        assert!(alpha_growth_slow >= 1.0);
        self.alpha_growth_slow = alpha_growth_slow;
        self
    }

    /// Growth factor of alpha once alpha exceeds
    /// [`alpha_growth_threshold`](Self::alpha_growth_threshold).
    ///
    /// Despite the name this is the smaller of the two factors by default
    /// (`1.005` against `1.02`), so growth slows down once alpha is large.
    pub fn alpha_growth_fast(&mut self, alpha_growth_fast: f64) -> &mut Self {
        assert!(alpha_growth_fast >= 1.0);
        self.alpha_growth_fast = alpha_growth_fast;
        self
    }

    pub fn alpha_growth_threshold(&mut self, alpha_growth_threshold: f64) -> &mut Self {
        assert!(!alpha_growth_threshold.is_nan());
        self.alpha_growth_threshold = alpha_growth_threshold;
        self
    }

    /// Give up after this many rounds. `None` keeps going until the tolerance
    /// is reached, which may be never.
    pub fn max_rounds(&mut self, max_rounds: Option<u64>) -> &mut Self {
        assert!(max_rounds != Some(0));
        self.max_rounds = max_rounds;
        self
    }

    /// Give up when two consecutive rounds report the exact same max delta.
    pub fn detect_stall(&mut self, detect_stall: bool) -> &mut Self {
        self.detect_stall = detect_stall;
        self
    }

    pub fn max_delta_tracking(&mut self, max_delta_tracking: MaxDeltaTracking) -> &mut Self {
        self.max_delta_tracking = max_delta_tracking;
        self
    }

    pub fn build(&self) -> Estimator {
        Estimator {
            tolerance: self.tolerance,

            warmup_rounds: self.warmup_rounds,
            warmup_eta: self.warmup_eta,

            alpha_growth_slow: self.alpha_growth_slow,
            alpha_growth_fast: self.alpha_growth_fast,
            alpha_growth_threshold: self.alpha_growth_threshold,

            max_rounds: self.max_rounds,
            detect_stall: self.detect_stall,
            max_delta_tracking: self.max_delta_tracking,
        }
    }
}

/// Joint difficulty/skill estimator. Holds configuration only; every solve
/// starts from scratch.
#[derive(Debug, Clone)]
pub struct Estimator {
    tolerance: f64,

    warmup_rounds: u64,
    warmup_eta: f64,

    alpha_growth_slow: f64,
    alpha_growth_fast: f64,
    alpha_growth_threshold: f64,

    max_rounds: Option<u64>,
    detect_stall: bool,
    max_delta_tracking: MaxDeltaTracking,
}

impl Default for Estimator {
    fn default() -> Estimator {
        Estimator::new()
    }
}

impl Estimator {
    pub fn builder() -> EstimatorBuilder {
        EstimatorBuilder::default()
    }

    pub fn new() -> Estimator {
        Estimator::builder().build()
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn warmup_rounds(&self) -> u64 {
        self.warmup_rounds
    }

    pub fn warmup_eta(&self) -> f64 {
        self.warmup_eta
    }

    /// Growth factor below the threshold. The larger one by default.
    pub fn alpha_growth_slow(&self) -> f64 {
        self.alpha_growth_slow
    }

    /// Growth factor above the threshold. The smaller one by default.
    pub fn alpha_growth_fast(&self) -> f64 {
        self.alpha_growth_fast
    }

    pub fn alpha_growth_threshold(&self) -> f64 {
        self.alpha_growth_threshold
    }

    pub fn max_rounds(&self) -> Option<u64> {
        self.max_rounds
    }

    pub fn detect_stall(&self) -> bool {
        self.detect_stall
    }

    pub fn max_delta_tracking(&self) -> MaxDeltaTracking {
        self.max_delta_tracking
    }

    /// Damping factor applied to the deltas of round `round` (counting from
    /// zero).
    pub(crate) fn eta(&self, round: u64, alpha: f64) -> f64 {
        if round < self.warmup_rounds {
            self.warmup_eta
        } else {
            alpha / 16.0
        }
    }

    /// Next alpha given the signed max deltas of the previous and the current
    /// round.
    pub(crate) fn next_alpha(&self, alpha: f64, last_max_delta: f64, max_delta: f64) -> f64 {
        if (last_max_delta > 0.0) == (max_delta > 0.0) {
            if alpha > self.alpha_growth_threshold {
                alpha * self.alpha_growth_fast
            } else {
                alpha * self.alpha_growth_slow
            }
        } else {
            1.0
        }
    }

    /// Fits difficulties to observations that have already been filtered,
    /// using the supplied observation counts for normalization. The count
    /// maps may use any hasher.
    pub fn solve<SI: BuildHasher, SA: BuildHasher>(
        &self,
        observations: &[Observation],
        observations_per_item: &HashMap<String, u64, SI>,
        observations_per_actor: &HashMap<String, u64, SA>,
    ) -> Result<Solution, SolveError> {
        Solver::new(
            self,
            observations,
            observations_per_item,
            observations_per_actor,
        )?
        .run()
    }

    pub fn solve_filtered(&self, filtered: &Filtered) -> Result<Solution, SolveError> {
        self.solve(
            &filtered.observations,
            filtered.observations_per_item(),
            filtered.observations_per_actor(),
        )
    }

    /// Filters raw observations and fits difficulties to what is left.
    pub fn fit(&self, observations: Vec<Observation>) -> Result<Solution, SolveError> {
        self.solve_filtered(&filter(observations))
    }
}
