use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    hash::BuildHasher,
};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    index::{ActorId, ById, Ids, ItemId},
    link::{d_sigmoid, sigmoid},
    Difficulty, Estimator, MaxDeltaTracking, Observation, Skill,
};

/// Which kind of parameter an error refers to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Side {
    Actor,
    Item,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Side::Actor => "actor",
            Side::Item => "item",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("{side} {id:?} has no observation count to normalize by")]
    MissingCount { side: Side, id: String },
    #[error("{side} {id:?} became non-finite in round {round}")]
    NonFinite { side: Side, id: String, round: u64 },
}

/// Why a solve stopped.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Termination {
    /// The absolute max delta dropped to the tolerance.
    Converged,
    /// The configured round cap was hit first.
    RoundLimit,
    /// Two consecutive rounds reported the exact same max delta.
    Stalled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Fitted difficulty per item.
    pub difficulties: BTreeMap<String, Difficulty>,
    /// Number of rounds executed.
    pub rounds: u64,
    /// Absolute max delta of the last round.
    pub max_delta: f64,
    /// Step size multiplier after the last round.
    pub alpha: f64,
    pub termination: Termination,
}

impl Solution {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    pub fn difficulty(&self, item: &str) -> Option<Difficulty> {
        self.difficulties.get(item).copied()
    }
}

/// Running extreme over the deltas of one round.
///
/// With [`MaxDeltaTracking::SignBiased`] the first nonzero delta seeds the
/// value, and later deltas only replace it by moving further in the seed's
/// direction. A large delta of the opposite sign is never reported.
#[derive(Debug, Copy, Clone)]
pub struct MaxDelta {
    value: f64,
    tracking: MaxDeltaTracking,
}

impl MaxDelta {
    pub fn new(tracking: MaxDeltaTracking) -> MaxDelta {
        MaxDelta {
            value: 0.0,
            tracking,
        }
    }

    pub fn observe(&mut self, delta: f64) {
        let replace = match self.tracking {
            MaxDeltaTracking::SignBiased => {
                self.value == 0.0
                    || (self.value > 0.0 && delta > self.value)
                    || (self.value < 0.0 && delta < self.value)
            }
            MaxDeltaTracking::Absolute => delta.abs() > self.value.abs(),
        };
        if replace {
            self.value = delta;
        }
    }

    /// Signed value of the tracked delta.
    pub fn value(&self) -> f64 {
        self.value
    }
}

#[derive(Debug, Copy, Clone)]
struct Encounter {
    actor: ActorId,
    item: ItemId,
    target: f64,
}

/// State of a single solve. Parameters are stored densely, in order of first
/// appearance of each actor and item.
pub(crate) struct Solver<'a> {
    estimator: &'a Estimator,

    actors: Ids<'a, ActorId>,
    items: Ids<'a, ItemId>,
    encounters: Vec<Encounter>,

    observations_per_actor: ById<ActorId, f64>,
    observations_per_item: ById<ItemId, f64>,

    skills: ById<ActorId, Skill>,
    difficulties: ById<ItemId, Difficulty>,

    delta_skills: ById<ActorId, f64>,
    delta_difficulties: ById<ItemId, f64>,
}

fn lookup_count<S: BuildHasher>(
    counts: &HashMap<String, u64, S>,
    side: Side,
    id: &str,
) -> Result<f64, SolveError> {
    match counts.get(id) {
        Some(&count) if count > 0 => Ok(count as f64),
        _ => Err(SolveError::MissingCount {
            side,
            id: id.to_owned(),
        }),
    }
}

impl<'a> Solver<'a> {
    pub fn new<SI: BuildHasher, SA: BuildHasher>(
        estimator: &'a Estimator,
        observations: &'a [Observation],
        observations_per_item: &HashMap<String, u64, SI>,
        observations_per_actor: &HashMap<String, u64, SA>,
    ) -> Result<Solver<'a>, SolveError> {
        let mut actors = Ids::default();
        let mut items = Ids::default();

        let encounters: Vec<Encounter> = observations
            .iter()
            .map(|observation| Encounter {
                actor: actors.get_or_insert(&observation.actor),
                item: items.get_or_insert(&observation.item),
                target: observation.outcome.target(),
            })
            .collect();

        let observations_per_actor: ById<ActorId, f64> = actors
            .iter()
            .map(|(_, name)| lookup_count(observations_per_actor, Side::Actor, name))
            .collect::<Result<_, _>>()?;
        let observations_per_item: ById<ItemId, f64> = items
            .iter()
            .map(|(_, name)| lookup_count(observations_per_item, Side::Item, name))
            .collect::<Result<_, _>>()?;

        Ok(Solver {
            estimator,

            skills: ById::filled(actors.len(), Skill(0.0)),
            difficulties: ById::filled(items.len(), Difficulty(0.0)),

            delta_skills: ById::filled(actors.len(), 0.0),
            delta_difficulties: ById::filled(items.len(), 0.0),

            actors,
            items,
            encounters,

            observations_per_actor,
            observations_per_item,
        })
    }

    /// Executes one gradient round damped by `eta` and returns the signed,
    /// unscaled max delta.
    fn step(&mut self, eta: f64, round: u64) -> Result<f64, SolveError> {
        self.delta_skills.fill(0.0);
        self.delta_difficulties.fill(0.0);

        for encounter in &self.encounters {
            let potential =
                *self.skills.get(encounter.actor) - *self.difficulties.get(encounter.item);
            let gradient = (sigmoid(potential) - encounter.target) * d_sigmoid(potential);

            *self.delta_difficulties.get_mut(encounter.item) +=
                gradient / *self.observations_per_item.get(encounter.item);
            *self.delta_skills.get_mut(encounter.actor) -=
                gradient / *self.observations_per_actor.get(encounter.actor);
        }

        let mut max_delta = MaxDelta::new(self.estimator.max_delta_tracking());

        for (item, difficulty) in self.difficulties.iter_mut() {
            let delta = *self.delta_difficulties.get(item);
            *difficulty += delta * eta;
            if !difficulty.is_finite() {
                return Err(SolveError::NonFinite {
                    side: Side::Item,
                    id: self.items.name(item).to_owned(),
                    round,
                });
            }
            max_delta.observe(delta);
        }

        for (actor, skill) in self.skills.iter_mut() {
            let delta = *self.delta_skills.get(actor);
            *skill += delta * eta;
            if !skill.is_finite() {
                return Err(SolveError::NonFinite {
                    side: Side::Actor,
                    id: self.actors.name(actor).to_owned(),
                    round,
                });
            }
            max_delta.observe(delta);
        }

        Ok(max_delta.value())
    }

    pub fn run(mut self) -> Result<Solution, SolveError> {
        let mut alpha = 1.0;
        let mut last_max_delta = 0.0;
        let mut round = 0;

        if self.encounters.is_empty() {
            return Ok(self.into_solution(round, 0.0, alpha, Termination::Converged));
        }

        info!(
            observations = self.encounters.len(),
            items = self.items.len(),
            actors = self.actors.len(),
            "fitting difficulties"
        );

        loop {
            let eta = self.estimator.eta(round, alpha);
            let max_delta = self.step(eta, round)? / f64::sqrt(alpha);

            alpha = self.estimator.next_alpha(alpha, last_max_delta, max_delta);

            let stalled = self.estimator.detect_stall() && max_delta == last_max_delta;
            last_max_delta = max_delta;

            let max_delta = max_delta.abs();
            if alpha * max_delta > 1.0 {
                alpha = 1.0 / max_delta;
            }

            round += 1;

            debug!(round, alpha, max_delta, "executed one step");

            if max_delta <= self.estimator.tolerance() {
                info!(round, max_delta, "difficulties converged");
                return Ok(self.into_solution(round, max_delta, alpha, Termination::Converged));
            }

            if stalled {
                warn!(round, max_delta, "not converging: stuck in a one-cycle loop");
                return Ok(self.into_solution(round, max_delta, alpha, Termination::Stalled));
            }

            if self.estimator.max_rounds().is_some_and(|max_rounds| round >= max_rounds) {
                warn!(round, max_delta, "not converging: round limit reached");
                return Ok(self.into_solution(round, max_delta, alpha, Termination::RoundLimit));
            }
        }
    }

    fn into_solution(
        self,
        rounds: u64,
        max_delta: f64,
        alpha: f64,
        termination: Termination,
    ) -> Solution {
        Solution {
            difficulties: self
                .items
                .iter()
                .map(|(item, name)| (name.to_owned(), *self.difficulties.get(item)))
                .collect(),
            rounds,
            max_delta,
            alpha,
            termination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{filter, Outcome};

    fn obs(actor: &str, item: &str, passed: bool) -> Observation {
        Observation::new(actor, item, passed)
    }

    /// Five actors by five items. `1` is a pass.
    const GRID: [&str; 5] = ["11100", "10110", "10100", "11110", "01100"];

    fn grid(table: &[&str]) -> Vec<Observation> {
        let mut observations = Vec::new();
        for (actor, row) in table.iter().enumerate() {
            for (item, cell) in row.chars().enumerate() {
                observations.push(obs(
                    &format!("u{}", actor + 1),
                    &format!("i{}", item + 1),
                    cell == '1',
                ));
            }
        }
        observations
    }

    fn value(solution: &Solution, item: &str) -> f64 {
        f64::from(solution.difficulty(item).expect("item present"))
    }

    #[test]
    fn test_max_delta_sign_biased() {
        let mut max_delta = MaxDelta::new(MaxDeltaTracking::SignBiased);
        for delta in [0.0, 0.2, -5.0, 0.1, 0.3, -0.4] {
            max_delta.observe(delta);
        }
        assert_eq!(max_delta.value(), 0.3);

        let mut max_delta = MaxDelta::new(MaxDeltaTracking::SignBiased);
        for delta in [-0.2, 7.0, -0.1, -0.6] {
            max_delta.observe(delta);
        }
        assert_eq!(max_delta.value(), -0.6);
    }

    #[test]
    fn test_max_delta_absolute() {
        let mut max_delta = MaxDelta::new(MaxDeltaTracking::Absolute);
        for delta in [0.0, 0.2, -5.0, 0.1, 0.3, 5.0] {
            max_delta.observe(delta);
        }
        assert_eq!(max_delta.value(), -5.0);
    }

    #[test]
    fn test_two_items_scenario() {
        // u2 only passes and u3 only fails, so both are dropped and only u1
        // is left to separate the two items.
        let observations = vec![
            obs("u1", "i1", true),
            obs("u1", "i2", false),
            obs("u2", "i1", true),
            obs("u2", "i2", true),
            obs("u3", "i1", false),
            obs("u3", "i2", false),
        ];

        let filtered = filter(observations);
        assert_eq!(filtered.observations.len(), 2);
        assert_eq!(filtered.ignored, 4);

        let solution = Estimator::new().solve_filtered(&filtered).unwrap();
        assert!(solution.converged());
        assert!(solution.max_delta <= 0.001);
        assert_eq!(solution.difficulties.len(), 2);
        assert!(value(&solution, "i1") < value(&solution, "i2"));
        assert!((value(&solution, "i1") + value(&solution, "i2")).abs() < 1e-9);
    }

    #[test]
    fn test_converges_on_small_grid() {
        let solution = Estimator::new().fit(grid(&GRID)).unwrap();

        assert_eq!(solution.termination, Termination::Converged);
        assert!(solution.rounds > 20);
        assert!(solution.rounds < 500, "took {} rounds", solution.rounds);
        assert!(solution.max_delta <= 0.001);
        assert_eq!(solution.difficulties.len(), 5);
        assert!(solution
            .difficulties
            .values()
            .all(|difficulty| difficulty.is_finite()));
    }

    #[test]
    fn test_easier_item_gets_lower_difficulty() {
        // Everyone who passes i1 also passes i3, and u5 passes i3 after
        // failing i1.
        let solution = Estimator::new().fit(grid(&GRID)).unwrap();
        assert!(value(&solution, "i3") < value(&solution, "i1"));
        // Nobody passes i5.
        for item in ["i1", "i2", "i3", "i4"] {
            assert!(value(&solution, item) < value(&solution, "i5"), "{item}");
        }
    }

    #[test]
    fn test_relabeling() {
        let estimator = Estimator::new();
        let original = estimator.fit(grid(&GRID)).unwrap();

        let relabeled: Vec<Observation> = grid(&GRID)
            .into_iter()
            .map(|o| {
                Observation::new(
                    format!("player-{}", o.actor),
                    format!("chart-{}", o.item),
                    o.outcome,
                )
            })
            .collect();
        let relabeled = estimator.fit(relabeled).unwrap();

        assert_eq!(relabeled.rounds, original.rounds);
        for (item, difficulty) in &original.difficulties {
            assert_eq!(relabeled.difficulties[&format!("chart-{item}")], *difficulty);
        }
    }

    #[test]
    fn test_flipped_outcomes_mirror_difficulties() {
        let estimator = Estimator::new();
        let original = estimator.fit(grid(&GRID)).unwrap();

        let flipped: Vec<Observation> = grid(&GRID)
            .into_iter()
            .map(|o| Observation {
                outcome: o.outcome.opposite(),
                ..o
            })
            .collect();
        let flipped = estimator.fit(flipped).unwrap();

        assert!(flipped.converged());
        for (item, difficulty) in &original.difficulties {
            let mirrored = -f64::from(flipped.difficulties[item]);
            assert!(
                (f64::from(*difficulty) - mirrored).abs() < 0.01,
                "{item}: {difficulty:?} vs {mirrored}"
            );
        }
    }

    #[test]
    fn test_stall_detection_leaves_converging_solve_alone() {
        let plain = Estimator::new().fit(grid(&GRID)).unwrap();
        let detecting = Estimator::builder()
            .detect_stall(true)
            .build()
            .fit(grid(&GRID))
            .unwrap();
        assert_eq!(detecting, plain);
    }

    #[test]
    fn test_absolute_tracking_converges() {
        let solution = Estimator::builder()
            .max_delta_tracking(MaxDeltaTracking::Absolute)
            .build()
            .fit(grid(&GRID))
            .unwrap();
        assert!(solution.converged());
        assert!(value(&solution, "i3") < value(&solution, "i1"));
    }

    #[test]
    fn test_round_limit() {
        let solution = Estimator::builder()
            .max_rounds(Some(10))
            .build()
            .fit(grid(&GRID))
            .unwrap();

        assert_eq!(solution.termination, Termination::RoundLimit);
        assert!(!solution.converged());
        assert_eq!(solution.rounds, 10);
        assert!(solution.max_delta > 0.001);
        assert_eq!(solution.difficulties.len(), 5);
    }

    /// Every actor has a pass and a fail, but sign-biased tracking settles
    /// on a max delta of about 0.0288 and never reaches the tolerance.
    fn sign_biased_holdout() -> Vec<Observation> {
        vec![
            Observation::new("u0", "i1", Outcome::Fail),
            Observation::new("u4", "i3", Outcome::Fail),
            Observation::new("u4", "i0", Outcome::Fail),
            Observation::new("u4", "i1", Outcome::Pass),
            Observation::new("u2", "i3", Outcome::Fail),
            Observation::new("u2", "i3", Outcome::Pass),
            Observation::new("u0", "i2", Outcome::Pass),
        ]
    }

    #[test]
    fn test_sign_biased_tracking_can_miss_tolerance() {
        let filtered = filter(sign_biased_holdout());
        assert_eq!(filtered.ignored, 0);

        let solution = Estimator::builder()
            .max_rounds(Some(2000))
            .build()
            .solve_filtered(&filtered)
            .unwrap();

        assert_eq!(solution.termination, Termination::RoundLimit);
        assert_eq!(solution.rounds, 2000);
        assert!(solution.max_delta > 0.01, "max delta {}", solution.max_delta);
        assert!(solution
            .difficulties
            .values()
            .all(|difficulty| difficulty.is_finite()));
    }

    #[test]
    fn test_absolute_tracking_converges_where_sign_biased_does_not() {
        let solution = Estimator::builder()
            .max_delta_tracking(MaxDeltaTracking::Absolute)
            .build()
            .fit(sign_biased_holdout())
            .unwrap();

        assert_eq!(solution.termination, Termination::Converged);
        assert!(solution.max_delta <= 0.001);
        assert_eq!(solution.difficulties.len(), 4);
    }

    #[test]
    fn test_stall_detection_stops_one_cycle_loop() {
        // With alpha pinned at 1 and a negligible step, every round reports
        // the same signed max delta of -1.
        let observations = vec![obs("u1", "i1", true), obs("u1", "i2", false)];

        let solution = Estimator::builder()
            .alpha_growth_slow(1.0)
            .warmup_eta(1e-300)
            .detect_stall(true)
            .build()
            .fit(observations.clone())
            .unwrap();

        assert_eq!(solution.termination, Termination::Stalled);
        assert!(!solution.converged());
        assert_eq!(solution.rounds, 2);
        assert_eq!(solution.max_delta, 1.0);
        assert_eq!(solution.alpha, 1.0);

        let solution = Estimator::builder()
            .alpha_growth_slow(1.0)
            .warmup_eta(1e-300)
            .max_rounds(Some(5))
            .build()
            .fit(observations)
            .unwrap();
        assert_eq!(solution.termination, Termination::RoundLimit);
        assert_eq!(solution.rounds, 5);
    }

    #[test]
    fn test_nothing_to_fit() {
        let all_degenerate = vec![
            obs("u1", "i1", true),
            obs("u1", "i2", true),
            obs("u2", "i2", false),
        ];
        let solution = Estimator::new().fit(all_degenerate).unwrap();
        assert!(solution.difficulties.is_empty());
        assert_eq!(solution.rounds, 0);
        assert!(solution.converged());

        let solution = Estimator::new().fit(Vec::new()).unwrap();
        assert!(solution.difficulties.is_empty());
    }

    #[test]
    fn test_missing_count() {
        let observations = vec![obs("u1", "i1", true), obs("u1", "i2", false)];
        let mut per_item = HashMap::new();
        per_item.insert("i1".to_owned(), 1);
        per_item.insert("i2".to_owned(), 0);
        let mut per_actor = HashMap::new();
        per_actor.insert("u1".to_owned(), 2);

        assert_eq!(
            Estimator::new().solve(&observations, &per_item, &per_actor),
            Err(SolveError::MissingCount {
                side: Side::Item,
                id: "i2".to_owned()
            })
        );

        per_item.insert("i2".to_owned(), 1);
        per_actor.clear();
        assert_eq!(
            Estimator::new().solve(&observations, &per_item, &per_actor),
            Err(SolveError::MissingCount {
                side: Side::Actor,
                id: "u1".to_owned()
            })
        );
    }

    #[test]
    fn test_solve_with_std_hash_maps() {
        let filtered = filter(grid(&GRID));
        let mut per_item: HashMap<String, u64> = HashMap::new();
        let mut per_actor: HashMap<String, u64> = HashMap::new();
        for observation in &filtered.observations {
            *per_item.entry(observation.item.clone()).or_insert(0) += 1;
            *per_actor.entry(observation.actor.clone()).or_insert(0) += 1;
        }

        let estimator = Estimator::new();
        assert_eq!(
            estimator.solve(&filtered.observations, &per_item, &per_actor),
            estimator.solve_filtered(&filtered)
        );
    }

    #[test]
    fn test_non_finite_aborts() {
        let observations = vec![
            Observation::new("u1", "i1", Outcome::Pass),
            Observation::new("u1", "i2", Outcome::Fail),
        ];
        let result = Estimator::builder()
            .warmup_eta(f64::INFINITY)
            .build()
            .fit(observations);

        assert_eq!(
            result,
            Err(SolveError::NonFinite {
                side: Side::Item,
                id: "i1".to_owned(),
                round: 0
            })
        );
    }

    #[test]
    fn test_error_messages() {
        let err = SolveError::MissingCount {
            side: Side::Actor,
            id: "u1".to_owned(),
        };
        assert_eq!(err.to_string(), "actor \"u1\" has no observation count to normalize by");
    }
}
