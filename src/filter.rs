use std::{collections::HashMap, hash::BuildHasher};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

use crate::Observation;

/// Observations left after dropping degenerate actors, with the counts used
/// to normalize gradients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filtered {
    /// Retained observations, in their original relative order.
    pub observations: Vec<Observation>,
    observations_per_item: FxHashMap<String, u64>,
    observations_per_actor: FxHashMap<String, u64>,
    /// Number of raw observations that were dropped. Diagnostic only.
    pub ignored: usize,
}

impl Filtered {
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of retained observations per item.
    pub fn observations_per_item(&self) -> &HashMap<String, u64, impl BuildHasher> {
        &self.observations_per_item
    }

    /// Number of retained observations per actor.
    pub fn observations_per_actor(&self) -> &HashMap<String, u64, impl BuildHasher> {
        &self.observations_per_actor
    }
}

#[derive(Debug, Default, Copy, Clone)]
struct Seen {
    has_pass: bool,
    has_fail: bool,
}

impl Seen {
    fn is_degenerate(self) -> bool {
        !(self.has_pass && self.has_fail)
    }
}

/// Drops every observation of actors that only ever passed or only ever
/// failed. Such actors carry no signal about where their skill lies relative
/// to the items they attempted.
pub fn filter(mut observations: Vec<Observation>) -> Filtered {
    let mut seen: FxHashMap<&str, Seen> = FxHashMap::default();
    for observation in &observations {
        let entry = seen.entry(observation.actor.as_str()).or_default();
        if observation.outcome.is_pass() {
            entry.has_pass = true;
        } else {
            entry.has_fail = true;
        }
    }

    let degenerate: FxHashSet<String> = seen
        .into_iter()
        .filter(|(_, seen)| seen.is_degenerate())
        .map(|(actor, _)| actor.to_owned())
        .collect();

    let raw_len = observations.len();
    observations.retain(|observation| !degenerate.contains(&observation.actor));

    let mut observations_per_item: FxHashMap<String, u64> = FxHashMap::default();
    let mut observations_per_actor: FxHashMap<String, u64> = FxHashMap::default();
    for observation in &observations {
        *observations_per_item
            .entry(observation.item.clone())
            .or_insert(0) += 1;
        *observations_per_actor
            .entry(observation.actor.clone())
            .or_insert(0) += 1;
    }

    let ignored = raw_len - observations.len();

    info!(
        ignored_observations = ignored,
        ignored_actors = degenerate.len(),
        observations = observations.len(),
        items = observations_per_item.len(),
        actors = observations_per_actor.len(),
        "ignored actors with 100% or 0% pass rates"
    );

    Filtered {
        observations,
        observations_per_item,
        observations_per_actor,
        ignored,
    }
}
