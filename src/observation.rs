/// Whether an actor passed an item, under whatever threshold the caller
/// applied when building the observation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Outcome {
    Pass,
    Fail,
}

impl From<bool> for Outcome {
    #[inline]
    fn from(passed: bool) -> Outcome {
        if passed {
            Outcome::Pass
        } else {
            Outcome::Fail
        }
    }
}

impl From<Outcome> for bool {
    #[inline]
    fn from(outcome: Outcome) -> bool {
        outcome.is_pass()
    }
}

impl Outcome {
    #[inline]
    pub fn is_pass(self) -> bool {
        matches!(self, Outcome::Pass)
    }

    /// Signed target for the link function: `1.0` for a pass, `-1.0` for a
    /// fail.
    #[inline]
    pub fn target(self) -> f64 {
        match self {
            Outcome::Pass => 1.0,
            Outcome::Fail => -1.0,
        }
    }

    #[must_use]
    #[inline]
    pub fn opposite(self) -> Outcome {
        match self {
            Outcome::Pass => Outcome::Fail,
            Outcome::Fail => Outcome::Pass,
        }
    }
}

/// One pass/fail outcome linking one actor to one item.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Observation {
    pub actor: String,
    pub item: String,
    pub outcome: Outcome,
}

impl Observation {
    pub fn new<A, I, O>(actor: A, item: I, outcome: O) -> Observation
    where
        A: Into<String>,
        I: Into<String>,
        O: Into<Outcome>,
    {
        Observation {
            actor: actor.into(),
            item: item.into(),
            outcome: outcome.into(),
        }
    }
}
