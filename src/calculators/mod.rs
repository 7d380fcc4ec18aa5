//! Closed-form fitness arithmetic shared by the nutrition and workout routes.

pub mod calories;
pub mod macros;
pub mod one_rep_max;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("Reps must be between 1 and 10 for accurate 1RM calculation")]
    RepsOutOfRange,
    #[error("{0} must be a positive number")]
    NonPositive(&'static str),
}

pub use calories::{ActivityLevel, Goal, Sex};
pub use macros::{MacroGrams, MacroSplit};
