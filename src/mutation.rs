//! Mutation operators and utilities.

use rand::{rngs::StdRng, Rng};
use rand_distr::StandardNormal;

use crate::{
  error::DegenerateSelectionError,
  individual::{GeneBounds, Individual, ValueKind},
  operator::PopulationOperator,
  population::Population,
};

/// A mutation stage.
///
/// Mutation operators append mutated clones with their fitness cleared
/// instead of replacing individuals in place; the next selection stage
/// restores the population size. Implementations must respect each gene's
/// bounds and value kind.
pub trait Mutation: PopulationOperator {
  /// Overrides the value kind of gene `index`.
  fn set_value_kind(&mut self, index: usize, kind: ValueKind);

  /// Rescales the operator's step sizes by `factor`, if it has any.
  fn rescale_step_sizes(&mut self, factor: f64) {
    let _ = factor;
  }
}

/// Gaussian mutation: every gene is perturbed by standard normal noise
/// scaled by a per-gene step size, then clamped into its bounds. `Integer`
/// genes are rounded after the perturbation.
///
/// `BinaryBounds` genes are not perturbed; instead each has an independent
/// `1/n` chance of being forced to whichever bound lies farther from its
/// current value. The step sizes can be adapted from the outside through
/// [`Mutation::rescale_step_sizes`], see
/// [`VarianceAdaption`](crate::adaption::VarianceAdaption).
#[derive(Clone, Debug)]
pub struct GaussianMutation {
  bounds: GeneBounds,
  sigma: Vec<f64>,
}

impl GaussianMutation {
  /// Creates the operator with the same initial step size for every gene.
  pub fn new(bounds: GeneBounds, default_sigma: f64) -> Self {
    let sigma = vec![default_sigma; bounds.dimension()];
    Self { bounds, sigma }
  }

  /// The per-gene step sizes.
  pub fn sigma(&self) -> &[f64] {
    &self.sigma
  }
}

impl PopulationOperator for GaussianMutation {
  fn name(&self) -> &'static str {
    "gaussian mutation"
  }

  fn operate(
    &mut self,
    population: &mut Population,
    rng: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError> {
    let dimension = self.bounds.dimension();
    let flip_chance = 1.0 / dimension as f64;

    let mut mutants = Vec::with_capacity(population.len());
    for individual in population.individuals() {
      let mut clone = individual.clone_reset();
      for gene in 0..dimension {
        let current = clone.values()[gene];
        let mutated = match self.bounds.kind(gene) {
          ValueKind::BinaryBounds => {
            if rng.gen_range(0.0..1.0) < flip_chance {
              // jump to the bound farther away from the current value
              if current - self.bounds.min(gene)
                < self.bounds.max(gene) - current
              {
                self.bounds.max(gene)
              } else {
                self.bounds.min(gene)
              }
            } else {
              current
            }
          }
          ValueKind::Real | ValueKind::Integer => {
            let noise: f64 = rng.sample(StandardNormal);
            self.bounds.clamp(gene, current + noise * self.sigma[gene])
          }
        };
        clone.values_mut()[gene] = mutated;
      }
      mutants.push(clone);
    }
    population.individuals_mut().append(&mut mutants);
    Ok(())
  }
}

impl Mutation for GaussianMutation {
  fn set_value_kind(&mut self, index: usize, kind: ValueKind) {
    self.bounds.set_kind(index, kind);
  }

  fn rescale_step_sizes(&mut self, factor: f64) {
    for sigma in &mut self.sigma {
      *sigma *= factor;
    }
  }
}

/// Switching mutation: every gene flips to the opposite bound with
/// probability `1/n` - to `min` when not already there, otherwise to
/// `max`. A clone is appended only when at least one gene changed.
#[derive(Clone, Debug)]
pub struct SwitchingMutation {
  bounds: GeneBounds,
}

impl SwitchingMutation {
  /// Creates the operator for the given bounds.
  pub fn new(bounds: GeneBounds) -> Self {
    Self { bounds }
  }
}

impl PopulationOperator for SwitchingMutation {
  fn name(&self) -> &'static str {
    "switching mutation"
  }

  fn operate(
    &mut self,
    population: &mut Population,
    rng: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError> {
    let dimension = self.bounds.dimension();
    let flip_chance = 1.0 / dimension as f64;

    let mut mutants = Vec::new();
    for individual in population.individuals() {
      let mut clone = individual.clone_reset();
      let mut changed = false;
      for gene in 0..dimension {
        if rng.gen_range(0.0..1.0) >= flip_chance {
          continue;
        }
        let current = clone.values()[gene];
        let flipped = if current != self.bounds.min(gene) {
          self.bounds.min(gene)
        } else {
          self.bounds.max(gene)
        };
        if flipped != current {
          clone.values_mut()[gene] = flipped;
          changed = true;
        }
      }
      if changed {
        mutants.push(clone);
      }
    }
    population.individuals_mut().append(&mut mutants);
    Ok(())
  }
}

impl Mutation for SwitchingMutation {
  fn set_value_kind(&mut self, index: usize, kind: ValueKind) {
    self.bounds.set_kind(index, kind);
  }
}

/// Sparsity mutation: every gene is driven to its lower bound with
/// probability `1/n`, thinning the genome toward its baseline. A clone is
/// appended only when at least one gene changed.
#[derive(Clone, Debug)]
pub struct SparsityMutation {
  bounds: GeneBounds,
}

impl SparsityMutation {
  /// Creates the operator for the given bounds.
  pub fn new(bounds: GeneBounds) -> Self {
    Self { bounds }
  }
}

impl PopulationOperator for SparsityMutation {
  fn name(&self) -> &'static str {
    "sparsity mutation"
  }

  fn operate(
    &mut self,
    population: &mut Population,
    rng: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError> {
    let dimension = self.bounds.dimension();
    let drop_chance = 1.0 / dimension as f64;

    let mut mutants = Vec::new();
    for individual in population.individuals() {
      let mut clone = individual.clone_reset();
      let mut changed = false;
      for gene in 0..dimension {
        if rng.gen_range(0.0..1.0) >= drop_chance {
          continue;
        }
        let floor = self.bounds.clamp(gene, self.bounds.min(gene));
        if clone.values()[gene] != floor {
          clone.values_mut()[gene] = floor;
          changed = true;
        }
      }
      if changed {
        mutants.push(clone);
      }
    }
    population.individuals_mut().append(&mut mutants);
    Ok(())
  }
}

impl Mutation for SparsityMutation {
  fn set_value_kind(&mut self, index: usize, kind: ValueKind) {
    self.bounds.set_kind(index, kind);
  }
}
