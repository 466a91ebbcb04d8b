//! Crossover operators.

use itertools::Itertools;
use rand::{rngs::StdRng, seq::SliceRandom, Rng};

use crate::{
  error::DegenerateSelectionError,
  individual::Individual,
  operator::PopulationOperator,
  population::Population,
};

/// Uniform crossover with a fixed pair probability.
///
/// Parents are paired up randomly without replacement from a cloned mating
/// pool. Each pair recombines with probability `probability`; a
/// recombining pair swaps every gene independently on a fair coin. The
/// offspring are appended to the population with their fitness cleared and
/// the parents are retained, so the population grows here until the next
/// selection stage restores its size.
#[derive(Clone, Copy, Debug)]
pub struct UniformCrossover {
  /// Probability that a pair of parents recombines at all.
  pub probability: f64,
}

impl PopulationOperator for UniformCrossover {
  fn name(&self) -> &'static str {
    "uniform crossover"
  }

  fn operate(
    &mut self,
    population: &mut Population,
    rng: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError> {
    let mut pool: Vec<Individual> = population
      .individuals()
      .iter()
      .map(Individual::clone_reset)
      .collect();
    pool.shuffle(rng);

    let mut offspring: Vec<Individual> = Vec::new();
    for (mut a, mut b) in pool.into_iter().tuples() {
      if rng.gen_range(0.0..1.0) >= self.probability {
        continue;
      }
      for gene in 0..a.values().len() {
        if rng.gen_bool(0.5) {
          std::mem::swap(&mut a.values_mut()[gene], &mut b.values_mut()[gene]);
        }
      }
      offspring.push(a);
      offspring.push(b);
    }
    population.individuals_mut().append(&mut offspring);
    Ok(())
  }
}
