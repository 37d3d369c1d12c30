#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sieglinde::{filter, Estimator, Observation};

#[derive(Arbitrary, Debug)]
struct ArbitraryObservation {
    actor: u8,
    item: u8,
    passed: bool,
}

impl ArbitraryObservation {
    fn into_observation(self) -> Observation {
        // Few distinct ids, so that actors and items actually overlap.
        Observation::new(
            format!("u{}", self.actor % 16),
            format!("i{}", self.item % 16),
            self.passed,
        )
    }
}

fuzz_target!(|observations: Vec<ArbitraryObservation>| {
    let observations: Vec<Observation> = observations
        .into_iter()
        .map(ArbitraryObservation::into_observation)
        .collect();

    let filtered = filter(observations);
    let len = filtered.observations.len() as u64;
    assert_eq!(filtered.observations_per_item().values().sum::<u64>(), len);
    assert_eq!(filtered.observations_per_actor().values().sum::<u64>(), len);

    let solution = Estimator::builder()
        .max_rounds(Some(2000))
        .build()
        .solve_filtered(&filtered)
        .expect("counts are consistent and steps are bounded");

    assert_eq!(solution.difficulties.len(), filtered.observations_per_item().len());
    for difficulty in solution.difficulties.values() {
        assert!(difficulty.is_finite());
    }
});
