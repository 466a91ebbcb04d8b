//! Individuals, genomes and per-gene bounds.

use rand::{rngs::StdRng, Rng};

use crate::{
  error::ConfigError,
  score::{PerformanceVector, Score},
};

/// The kind of values a gene may take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
  /// Any real value within the gene's range.
  Real,
  /// Values are rounded to the nearest integer after every mutation.
  Integer,
  /// The gene is restricted to exactly its lower or its upper bound.
  BinaryBounds,
}

/// Per-gene bounds and value kinds describing the search space.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneBounds {
  min: Vec<f64>,
  max: Vec<f64>,
  kinds: Vec<ValueKind>,
}

impl GeneBounds {
  /// Validates and creates bounds. All three arrays must have the same
  /// nonzero length and every gene must satisfy `min <= max`.
  pub fn new(
    min: Vec<f64>,
    max: Vec<f64>,
    kinds: Vec<ValueKind>,
  ) -> Result<Self, ConfigError> {
    if min.len() != max.len() || min.len() != kinds.len() {
      return Err(ConfigError::DimensionMismatch {
        min_len: min.len(),
        max_len: max.len(),
        kinds_len: kinds.len(),
      });
    }
    if min.is_empty() {
      return Err(ConfigError::EmptyGenome);
    }
    for (index, (lo, hi)) in min.iter().zip(&max).enumerate() {
      if lo > hi {
        return Err(ConfigError::InvertedBounds {
          index,
          min: *lo,
          max: *hi,
        });
      }
    }
    Ok(Self { min, max, kinds })
  }

  /// The same real-valued range for every gene.
  pub fn uniform(
    dimension: usize,
    min: f64,
    max: f64,
  ) -> Result<Self, ConfigError> {
    Self::new(
      vec![min; dimension],
      vec![max; dimension],
      vec![ValueKind::Real; dimension],
    )
  }

  /// Number of genes.
  pub fn dimension(&self) -> usize {
    self.min.len()
  }

  /// Lower bound of gene `index`.
  pub fn min(&self, index: usize) -> f64 {
    self.min[index]
  }

  /// Upper bound of gene `index`.
  pub fn max(&self, index: usize) -> f64 {
    self.max[index]
  }

  /// Value kind of gene `index`.
  pub fn kind(&self, index: usize) -> ValueKind {
    self.kinds[index]
  }

  pub(crate) fn set_kind(&mut self, index: usize, kind: ValueKind) {
    self.kinds[index] = kind;
  }

  /// Clamps `value` into gene `index`'s range and snaps it to the gene's
  /// value kind: `Integer` genes are rounded, `BinaryBounds` genes snap to
  /// the nearer bound.
  pub fn clamp(&self, index: usize, value: f64) -> f64 {
    let clamped = value.clamp(self.min[index], self.max[index]);
    match self.kinds[index] {
      ValueKind::Real => clamped,
      ValueKind::Integer => clamped.round(),
      ValueKind::BinaryBounds => {
        if clamped - self.min[index] <= self.max[index] - clamped {
          self.min[index]
        } else {
          self.max[index]
        }
      }
    }
  }

  /// Draws a uniformly random value for gene `index`. `BinaryBounds` genes
  /// pick either bound with equal probability.
  pub fn random_gene(&self, index: usize, rng: &mut StdRng) -> f64 {
    match self.kinds[index] {
      ValueKind::Real => rng.gen_range(self.min[index]..=self.max[index]),
      ValueKind::Integer => {
        rng.gen_range(self.min[index]..=self.max[index]).round()
      }
      ValueKind::BinaryBounds => {
        if rng.gen_bool(0.5) {
          self.min[index]
        } else {
          self.max[index]
        }
      }
    }
  }
}

/// One candidate solution: a genome and, once evaluated, its fitness.
#[derive(Clone, Debug, PartialEq)]
pub struct Individual {
  values: Vec<f64>,
  fitness: Option<PerformanceVector>,
  // scratch field, only meaningful during non-dominated sorting selection
  pub(crate) crowding_distance: f64,
}

impl Individual {
  /// Creates an unevaluated individual from a genome.
  pub fn new(values: Vec<f64>) -> Self {
    Self {
      values,
      fitness: None,
      crowding_distance: 0.0,
    }
  }

  /// The genome.
  pub fn values(&self) -> &[f64] {
    &self.values
  }

  pub(crate) fn values_mut(&mut self) -> &mut [f64] {
    &mut self.values
  }

  /// The fitness result, if this individual has been evaluated.
  pub fn fitness(&self) -> Option<&PerformanceVector> {
    self.fitness.as_ref()
  }

  /// Attaches an evaluation result.
  pub fn set_fitness(&mut self, fitness: PerformanceVector) {
    self.fitness = Some(fitness);
  }

  /// Main-criterion fitness, if this individual has been evaluated.
  pub fn main_fitness(&self) -> Option<Score> {
    self.fitness.as_ref().map(PerformanceVector::main_fitness)
  }

  /// Clones the genome into a fresh unevaluated individual. Clones produced
  /// by crossover and mutation must be re-evaluated.
  pub fn clone_reset(&self) -> Self {
    Self::new(self.values.clone())
  }
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;

  use super::*;

  #[test]
  fn test_bounds_validation() {
    assert!(GeneBounds::uniform(3, -1.0, 1.0).is_ok());
    assert_eq!(GeneBounds::uniform(0, -1.0, 1.0), Err(ConfigError::EmptyGenome));
    assert_eq!(
      GeneBounds::new(vec![0.0, 2.0], vec![1.0, 1.0], vec![ValueKind::Real; 2]),
      Err(ConfigError::InvertedBounds {
        index: 1,
        min: 2.0,
        max: 1.0
      })
    );
    assert_eq!(
      GeneBounds::new(vec![0.0], vec![1.0, 2.0], vec![ValueKind::Real]),
      Err(ConfigError::DimensionMismatch {
        min_len: 1,
        max_len: 2,
        kinds_len: 1
      })
    );
  }

  #[test]
  fn test_clamp_respects_value_kinds() {
    let bounds = GeneBounds::new(
      vec![0.0, 0.0, 0.0],
      vec![10.0, 10.0, 10.0],
      vec![ValueKind::Real, ValueKind::Integer, ValueKind::BinaryBounds],
    )
    .unwrap();

    assert_eq!(bounds.clamp(0, 3.7), 3.7);
    assert_eq!(bounds.clamp(0, -5.0), 0.0);
    assert_eq!(bounds.clamp(0, 15.0), 10.0);

    assert_eq!(bounds.clamp(1, 3.7), 4.0);
    assert_eq!(bounds.clamp(1, 11.2), 10.0);

    assert_eq!(bounds.clamp(2, 3.7), 0.0);
    assert_eq!(bounds.clamp(2, 6.1), 10.0);
  }

  #[test]
  fn test_random_genes_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(7);
    let bounds = GeneBounds::new(
      vec![-2.0, 0.0, 1.0],
      vec![2.0, 5.0, 3.0],
      vec![ValueKind::Real, ValueKind::Integer, ValueKind::BinaryBounds],
    )
    .unwrap();

    for _ in 0..1000 {
      let real = bounds.random_gene(0, &mut rng);
      assert!((-2.0..=2.0).contains(&real));

      let int = bounds.random_gene(1, &mut rng);
      assert!((0.0..=5.0).contains(&int));
      assert_eq!(int, int.round());

      let binary = bounds.random_gene(2, &mut rng);
      assert!(binary == 1.0 || binary == 3.0);
    }
  }

  #[test]
  fn test_clone_reset_clears_fitness() {
    let mut individual = Individual::new(vec![1.0, 2.0]);
    individual.set_fitness(PerformanceVector::single("fitness", 0.5));
    let clone = individual.clone_reset();
    assert_eq!(clone.values(), individual.values());
    assert!(clone.fitness().is_none());
  }
}
