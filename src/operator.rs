//! The shared surface of population pipeline stages.

use rand::rngs::StdRng;

use crate::{error::DegenerateSelectionError, population::Population};

/// A pipeline stage that transforms the population in place.
///
/// The optimizer builds its stage pipeline once at construction and runs
/// every stage in order, once per generation. A stage receives exclusive
/// mutable access to the population for the duration of the call, must
/// leave it internally consistent and may not retain references past its
/// own call.
///
/// Selection stages replace the individual list with the next generation;
/// crossover and mutation stages append unevaluated clones instead, so the
/// population grows transiently until the next selection stage restores the
/// configured size.
pub trait PopulationOperator {
  /// Name of the operator, used in diagnostics.
  fn name(&self) -> &'static str;

  /// Transforms the population in place.
  fn operate(
    &mut self,
    population: &mut Population,
    rng: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError>;
}
