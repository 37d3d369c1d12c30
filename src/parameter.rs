use std::ops::{Add, AddAssign, Sub};

/// Latent ability of an actor. Higher is better. Only the difference to a
/// [`Difficulty`] carries meaning.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default)]
pub struct Skill(pub f64);

impl From<Skill> for f64 {
    #[inline]
    fn from(Skill(skill): Skill) -> f64 {
        skill
    }
}

impl From<f64> for Skill {
    #[inline]
    fn from(skill: f64) -> Skill {
        Skill(skill)
    }
}

impl Skill {
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl AddAssign<f64> for Skill {
    #[inline]
    fn add_assign(&mut self, step: f64) {
        self.0 += step;
    }
}

impl Sub<Difficulty> for Skill {
    type Output = Potential;

    #[inline]
    fn sub(self, Difficulty(difficulty): Difficulty) -> Potential {
        Potential(self.0 - difficulty)
    }
}

/// Latent difficulty of an item, on the same scale as [`Skill`]. Higher is
/// harder.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default)]
pub struct Difficulty(pub f64);

impl From<Difficulty> for f64 {
    #[inline]
    fn from(Difficulty(difficulty): Difficulty) -> f64 {
        difficulty
    }
}

impl From<f64> for Difficulty {
    #[inline]
    fn from(difficulty: f64) -> Difficulty {
        Difficulty(difficulty)
    }
}

impl Difficulty {
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl AddAssign<f64> for Difficulty {
    #[inline]
    fn add_assign(&mut self, step: f64) {
        self.0 += step;
    }
}

/// Skill minus difficulty. Positive values favour a pass.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Default)]
pub struct Potential(pub f64);

impl From<Potential> for f64 {
    #[inline]
    fn from(Potential(potential): Potential) -> f64 {
        potential
    }
}

impl From<f64> for Potential {
    #[inline]
    fn from(potential: f64) -> Potential {
        Potential(potential)
    }
}

impl Add<Difficulty> for Potential {
    type Output = Skill;

    #[inline]
    fn add(self, Difficulty(difficulty): Difficulty) -> Skill {
        Skill(self.0 + difficulty)
    }
}
