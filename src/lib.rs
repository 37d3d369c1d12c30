//! Joint estimation of item difficulty and actor skill from pass/fail
//! outcomes.
//!
//! The probability of a pass is modelled as a monotone function of
//! `skill - difficulty`. Both are fitted together by coordinate-wise gradient
//! descent with an adaptive step size, in the spirit of one-parameter
//! (Rasch) item response models.
//!
//! ```
//! use sieglinde::{Estimator, Observation};
//!
//! let observations = vec![
//!     Observation::new("alice", "easy", true),
//!     Observation::new("alice", "hard", false),
//!     Observation::new("bob", "easy", true),
//!     Observation::new("bob", "hard", true),
//! ];
//!
//! // bob never failed, so only alice is used for the fit.
//! let solution = Estimator::new().fit(observations).unwrap();
//! assert!(solution.converged());
//! assert!(solution.difficulty("easy") < solution.difficulty("hard"));
//! ```

mod estimator;
mod filter;
mod index;
mod link;
mod observation;
mod parameter;
mod solver;

pub use estimator::{Estimator, EstimatorBuilder, MaxDeltaTracking};
pub use filter::{filter, Filtered};
pub use link::{d_sigmoid, sigmoid};
pub use observation::{Observation, Outcome};
pub use parameter::{Difficulty, Potential, Skill};
pub use solver::{MaxDelta, Side, Solution, SolveError, Termination};
