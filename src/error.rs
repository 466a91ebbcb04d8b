//! Error types reported by the engine.

use thiserror::Error;

/// Errors detected while validating bounds or an optimizer configuration.
/// These fail fast at construction, before any generation runs.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
  /// The bounds arrays and the value kind array disagree on genome length.
  #[error(
    "bounds arrays disagree on dimensionality: min = {min_len}, max = {max_len}, kinds = {kinds_len}"
  )]
  DimensionMismatch {
    /// Length of the lower bounds array.
    min_len: usize,
    /// Length of the upper bounds array.
    max_len: usize,
    /// Length of the value kinds array.
    kinds_len: usize,
  },

  /// The genome must contain at least one gene.
  #[error("genome dimensionality must be at least 1")]
  EmptyGenome,

  /// A lower bound exceeds its upper bound.
  #[error("inverted bounds at gene {index}: min = {min}, max = {max}")]
  InvertedBounds {
    /// Index of the offending gene.
    index: usize,
    /// Lower bound of the gene.
    min: f64,
    /// Upper bound of the gene.
    max: f64,
  },

  /// The population must hold at least one individual.
  #[error("population size must be positive")]
  EmptyPopulation,

  /// A numeric parameter fell outside its valid range.
  #[error("parameter `{name}` is out of range: {value}")]
  ParameterOutOfRange {
    /// Name of the offending parameter.
    name: &'static str,
    /// The rejected value.
    value: f64,
  },
}

/// Raised by a selection operator that received input it cannot sample
/// from, such as an empty population or a fitness wheel without positive
/// mass.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("degenerate selection input in {operator}: {reason}")]
pub struct DegenerateSelectionError {
  /// Name of the selection operator that rejected its input.
  pub operator: &'static str,
  /// What made the input degenerate.
  pub reason: String,
}

impl DegenerateSelectionError {
  pub(crate) fn new(
    operator: &'static str,
    reason: impl Into<String>,
  ) -> Self {
    Self {
      operator,
      reason: reason.into(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_degenerate_selection_message_names_operator() {
    let err = DegenerateSelectionError::new("roulette wheel", "empty wheel");
    assert_eq!(
      err.to_string(),
      "degenerate selection input in roulette wheel: empty wheel"
    );
  }
}
