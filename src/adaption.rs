//! Adaptive step-size control.

use std::collections::VecDeque;

use log::debug;

use crate::{mutation::Mutation, population::Population};

// classical 1/5 success rule constants
const TARGET_SUCCESS_RATIO: f64 = 0.2;
const RESCALE_FACTOR: f64 = 0.85;

/// The 1/5 success rule over a mutation's step sizes.
///
/// One success flag is recorded per generation - the generation counts as
/// a success while the best-ever individual improved within the last two
/// generations. Once at least `2 * interval` generations have elapsed, and
/// every `interval` generations thereafter, the success ratio over the
/// trailing `2 * interval` flags drives the rescale: below one fifth the
/// step sizes shrink by the factor 0.85 to converge harder, otherwise they
/// grow by the inverse factor to explore more.
#[derive(Clone, Debug)]
pub struct VarianceAdaption {
  interval: usize,
  window: VecDeque<bool>,
  generations_seen: usize,
}

impl VarianceAdaption {
  /// Creates the rule with the given adaption interval, typically the
  /// genome length.
  pub fn new(interval: usize) -> Self {
    Self {
      interval: interval.max(1),
      window: VecDeque::new(),
      generations_seen: 0,
    }
  }

  /// Records the current generation's success flag and, on adaption
  /// boundaries, rescales the mutation's step sizes.
  pub fn operate(
    &mut self,
    population: &Population,
    mutation: &mut dyn Mutation,
  ) {
    let improved = population.generations_without_improvement() < 2;
    self.window.push_back(improved);
    if self.window.len() > 2 * self.interval {
      self.window.pop_front();
    }
    self.generations_seen += 1;

    if self.generations_seen < 2 * self.interval
      || (self.generations_seen - 2 * self.interval) % self.interval != 0
    {
      return;
    }

    let successes = self.window.iter().filter(|&&success| success).count();
    let ratio = successes as f64 / self.window.len() as f64;
    let factor = if ratio < TARGET_SUCCESS_RATIO {
      RESCALE_FACTOR
    } else {
      1.0 / RESCALE_FACTOR
    };
    debug!(
      "success ratio {ratio:.3} over {} generations, rescaling step sizes by {factor:.3}",
      self.window.len()
    );
    mutation.rescale_step_sizes(factor);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    individual::{GeneBounds, Individual},
    mutation::GaussianMutation,
    score::PerformanceVector,
  };

  fn gaussian(sigma: f64) -> GaussianMutation {
    GaussianMutation::new(GeneBounds::uniform(4, -1.0, 1.0).unwrap(), sigma)
  }

  fn stagnant_population(generations: u32) -> Population {
    let mut individual = Individual::new(vec![0.0; 4]);
    individual.set_fitness(PerformanceVector::single("fitness", 1.0));
    let mut population = Population::new(vec![individual]);
    population.update_bests();
    for _ in 0..generations {
      population.advance_generation();
    }
    population
  }

  #[test]
  fn test_no_rescale_before_two_intervals() {
    let mut adaption = VarianceAdaption::new(4);
    let mut mutation = gaussian(1.0);
    let population = stagnant_population(10);
    for _ in 0..7 {
      adaption.operate(&population, &mut mutation);
    }
    assert_eq!(mutation.sigma(), &[1.0; 4]);
  }

  #[test]
  fn test_stagnation_shrinks_step_sizes() {
    let mut adaption = VarianceAdaption::new(4);
    let mut mutation = gaussian(1.0);
    // every generation fails to improve, so the ratio is 0
    let population = stagnant_population(10);
    for _ in 0..8 {
      adaption.operate(&population, &mut mutation);
    }
    assert!(mutation.sigma().iter().all(|s| (s - 0.85).abs() < 1e-12));
  }

  #[test]
  fn test_steady_improvement_grows_step_sizes() {
    let mut adaption = VarianceAdaption::new(4);
    let mut mutation = gaussian(1.0);
    // an improving population counts every generation as a success
    let population = stagnant_population(0);
    for _ in 0..8 {
      adaption.operate(&population, &mut mutation);
    }
    let expected = 1.0 / 0.85;
    assert!(mutation
      .sigma()
      .iter()
      .all(|s| (s - expected).abs() < 1e-12));
  }

  #[test]
  fn test_rescale_repeats_every_interval() {
    let mut adaption = VarianceAdaption::new(2);
    let mut mutation = gaussian(1.0);
    let population = stagnant_population(10);
    // boundaries at generations 4 and 6
    for _ in 0..6 {
      adaption.operate(&population, &mut mutation);
    }
    let expected = 0.85 * 0.85;
    assert!(mutation
      .sigma()
      .iter()
      .all(|s| (s - expected).abs() < 1e-12));
  }
}
