use std::f64::consts::{FRAC_PI_2, PI};

use crate::Potential;

/// Arctangent S-curve mapping a potential into `(-1.0, 1.0)`.
///
/// `0.0` maps to `0.0`, so a pass (target `1.0`) and a fail (target `-1.0`)
/// are symmetric around an even match between skill and difficulty. The tails
/// are heavier than those of the logistic function.
#[inline]
pub fn sigmoid(Potential(x): Potential) -> f64 {
    (x * FRAC_PI_2).atan() / FRAC_PI_2
}

/// Slope of [`sigmoid`], written as `4 / (4 + (pi x)^2)`.
///
/// This is the same function as `1 / (1 + (pi x / 2)^2)`, the textbook
/// derivative of `atan(x pi / 2) / (pi / 2)`.
#[inline]
pub fn d_sigmoid(Potential(x): Potential) -> f64 {
    let y = PI * x;
    4.0 / (4.0 + y * y)
}
