//! Selection operators and utilities.
//!
//! Every selection operator consumes the current population and replaces
//! its contents with exactly `population_size` individuals, chosen by
//! clone and never by re-evaluating. The single-objective operators rank
//! by main-criterion fitness; the multi-objective
//! [`NonDominatedSortingSelection`](nsga::NonDominatedSortingSelection)
//! lives in its own submodule.
//!
//! All single-objective operators support an optional *elitist* mode: the
//! all-time best individual is unconditionally copied into the next
//! generation before the stochastic fill begins.

pub mod nsga;

use itertools::Itertools;
use rand::{rngs::StdRng, Rng};

use crate::{
  error::DegenerateSelectionError,
  individual::Individual,
  operator::PopulationOperator,
  population::Population,
  score::Score,
};

// selection runs after the evaluation step, so a missing fitness is an
// engine invariant breach, not a user error
fn main_fitness(individual: &Individual) -> Score {
  individual
    .main_fitness()
    .expect("individual must be evaluated before selection")
}

fn ensure_not_empty(
  population: &Population,
  operator: &'static str,
) -> Result<(), DegenerateSelectionError> {
  if population.is_empty() {
    return Err(DegenerateSelectionError::new(operator, "population is empty"));
  }
  Ok(())
}

// seeds the next generation with a copy of the best-ever individual when
// elitism is on
fn elite_seed(population: &Population, elitist: bool) -> Vec<Individual> {
  match (elitist, population.best_ever()) {
    (true, Some(best)) => vec![best.clone()],
    _ => Vec::new(),
  }
}

// builds a cumulative wheel from the given weights. every weight must be a
// finite non-negative value and the wheel must have positive total mass
fn cumulative_wheel(
  weights: &[f64],
  operator: &'static str,
) -> Result<(Vec<f64>, f64), DegenerateSelectionError> {
  let mut cumulative = Vec::with_capacity(weights.len());
  let mut total = 0.0;
  for weight in weights {
    if !weight.is_finite() || *weight < 0.0 {
      return Err(DegenerateSelectionError::new(
        operator,
        format!("fitness weight {weight} is not a finite non-negative value"),
      ));
    }
    total += weight;
    cumulative.push(total);
  }
  if total <= 0.0 {
    return Err(DegenerateSelectionError::new(
      operator,
      "fitness weights sum to zero",
    ));
  }
  Ok((cumulative, total))
}

// index of the wheel slot covering `point`, which must lie in [0, total)
fn spin(cumulative: &[f64], point: f64) -> usize {
  cumulative
    .partition_point(|&c| c <= point)
    .min(cumulative.len() - 1)
}

// fitness-proportional fill shared by the roulette wheel selectors. the
// `filter` hook remaps raw fitness before the wheel is built
fn roulette_fill(
  population: &Population,
  population_size: usize,
  elitist: bool,
  operator: &'static str,
  filter: impl Fn(Score) -> f64,
  rng: &mut StdRng,
) -> Result<Vec<Individual>, DegenerateSelectionError> {
  ensure_not_empty(population, operator)?;
  let weights: Vec<f64> = population
    .individuals()
    .iter()
    .map(|i| filter(main_fitness(i)))
    .collect();
  let (cumulative, total) = cumulative_wheel(&weights, operator)?;
  let mut next = elite_seed(population, elitist);
  while next.len() < population_size {
    let point = rng.gen_range(0.0..total);
    next.push(population.individuals()[spin(&cumulative, point)].clone());
  }
  Ok(next)
}

/// Fills every slot of the next generation with a uniformly random draw
/// from the current population, with replacement.
#[derive(Clone, Copy, Debug)]
pub struct UniformSelection {
  /// Target population size.
  pub population_size: usize,
  /// Copy the best-ever individual into the next generation first.
  pub elitist: bool,
}

impl PopulationOperator for UniformSelection {
  fn name(&self) -> &'static str {
    "uniform selection"
  }

  fn operate(
    &mut self,
    population: &mut Population,
    rng: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError> {
    ensure_not_empty(population, self.name())?;
    let mut next = elite_seed(population, self.elitist);
    while next.len() < self.population_size {
      let index = rng.gen_range(0..population.len());
      next.push(population.individuals()[index].clone());
    }
    population.replace(next);
    Ok(())
  }
}

/// Keeps the `population_size` individuals with the best main-criterion
/// fitness and drops the rest.
#[derive(Clone, Copy, Debug)]
pub struct CutSelection {
  /// Target population size.
  pub population_size: usize,
  /// Copy the best-ever individual into the next generation first.
  pub elitist: bool,
}

impl PopulationOperator for CutSelection {
  fn name(&self) -> &'static str {
    "cut selection"
  }

  fn operate(
    &mut self,
    population: &mut Population,
    _: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError> {
    ensure_not_empty(population, self.name())?;
    let mut next = elite_seed(population, self.elitist);
    let ranked = population
      .individuals()
      .iter()
      .sorted_by(|a, b| main_fitness(b).total_cmp(&main_fitness(a)));
    for individual in ranked {
      if next.len() >= self.population_size {
        break;
      }
      next.push(individual.clone());
    }
    population.replace(next);
    Ok(())
  }
}

/// Cumulative-fitness-proportional sampling. Fitness values must form a
/// wheel with positive total mass; degenerate wheels are rejected with a
/// [`DegenerateSelectionError`] instead of being sampled.
#[derive(Clone, Copy, Debug)]
pub struct RouletteWheelSelection {
  /// Target population size.
  pub population_size: usize,
  /// Copy the best-ever individual into the next generation first.
  pub elitist: bool,
}

impl PopulationOperator for RouletteWheelSelection {
  fn name(&self) -> &'static str {
    "roulette wheel selection"
  }

  fn operate(
    &mut self,
    population: &mut Population,
    rng: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError> {
    let next = roulette_fill(
      population,
      self.population_size,
      self.elitist,
      self.name(),
      |fitness| fitness,
      rng,
    )?;
    population.replace(next);
    Ok(())
  }
}

/// A roulette wheel over `exp(fitness / temperature)`. With dynamic decay
/// enabled the temperature falls linearly toward zero as the run
/// approaches its generation budget, sharpening selection pressure over
/// time.
#[derive(Clone, Copy, Debug)]
pub struct BoltzmannSelection {
  /// Target population size.
  pub population_size: usize,
  /// Copy the best-ever individual into the next generation first.
  pub elitist: bool,
  /// Boltzmann temperature, must be positive.
  pub temperature: f64,
  /// Decay the temperature linearly toward zero over the run.
  pub dynamic: bool,
  /// Generation budget the dynamic decay is stretched over.
  pub max_generations: u32,
}

impl PopulationOperator for BoltzmannSelection {
  fn name(&self) -> &'static str {
    "boltzmann selection"
  }

  fn operate(
    &mut self,
    population: &mut Population,
    rng: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError> {
    let temperature = if self.dynamic {
      let progress = f64::from(population.generation())
        / f64::from(self.max_generations.max(1));
      self.temperature * (1.0 - progress).max(f64::EPSILON)
    } else {
      self.temperature
    };
    let next = roulette_fill(
      population,
      self.population_size,
      self.elitist,
      self.name(),
      |fitness| (fitness / temperature).exp(),
      rng,
    )?;
    population.replace(next);
    Ok(())
  }
}

/// Stochastic universal sampling: a single random offset and
/// `population_size` equally spaced pointers around the cumulative-fitness
/// wheel. A lower-variance alternative to the roulette wheel.
#[derive(Clone, Copy, Debug)]
pub struct StochasticUniversalSampling {
  /// Target population size.
  pub population_size: usize,
  /// Copy the best-ever individual into the next generation first.
  pub elitist: bool,
}

impl PopulationOperator for StochasticUniversalSampling {
  fn name(&self) -> &'static str {
    "stochastic universal sampling"
  }

  fn operate(
    &mut self,
    population: &mut Population,
    rng: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError> {
    ensure_not_empty(population, self.name())?;
    let weights: Vec<f64> = population
      .individuals()
      .iter()
      .map(|i| main_fitness(i))
      .collect();
    let (cumulative, total) = cumulative_wheel(&weights, self.name())?;

    let mut next = elite_seed(population, self.elitist);
    let slots = self.population_size.saturating_sub(next.len());
    if slots > 0 {
      let step = total / slots as f64;
      let offset = rng.gen_range(0.0..step);
      for pointer in 0..slots {
        let point = offset + step * pointer as f64;
        next.push(population.individuals()[spin(&cumulative, point)].clone());
      }
    }
    population.replace(next);
    Ok(())
  }
}

/// A rank-proportional wheel: individuals are sorted ascending by fitness
/// and drawn with probability proportional to their rank. This bounds
/// selection pressure regardless of fitness magnitude and tolerates
/// negative fitness values.
#[derive(Clone, Copy, Debug)]
pub struct RankSelection {
  /// Target population size.
  pub population_size: usize,
  /// Copy the best-ever individual into the next generation first.
  pub elitist: bool,
}

impl PopulationOperator for RankSelection {
  fn name(&self) -> &'static str {
    "rank selection"
  }

  fn operate(
    &mut self,
    population: &mut Population,
    rng: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError> {
    ensure_not_empty(population, self.name())?;
    let ranked: Vec<&Individual> = population
      .individuals()
      .iter()
      .sorted_by(|a, b| main_fitness(a).total_cmp(&main_fitness(b)))
      .collect();

    // wheel over ranks 1..=n, total mass n(n + 1) / 2
    let weights: Vec<f64> = (1..=ranked.len()).map(|rank| rank as f64).collect();
    let (cumulative, total) = cumulative_wheel(&weights, self.name())?;

    let mut next = elite_seed(population, self.elitist);
    while next.len() < self.population_size {
      let point = rng.gen_range(0.0..total);
      next.push(ranked[spin(&cumulative, point)].clone());
    }
    population.replace(next);
    Ok(())
  }
}

/// Repeatedly samples a tournament of individuals uniformly at random with
/// replacement and keeps the best. The tournament size is
/// `round(population_size * fraction)`, at least 1; larger tournaments
/// mean higher selection pressure.
#[derive(Clone, Copy, Debug)]
pub struct TournamentSelection {
  /// Target population size.
  pub population_size: usize,
  /// Copy the best-ever individual into the next generation first.
  pub elitist: bool,
  /// Fraction of the population entering each tournament.
  pub fraction: f64,
}

impl PopulationOperator for TournamentSelection {
  fn name(&self) -> &'static str {
    "tournament selection"
  }

  fn operate(
    &mut self,
    population: &mut Population,
    rng: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError> {
    ensure_not_empty(population, self.name())?;
    let tournament_size =
      ((self.population_size as f64 * self.fraction).round() as usize).max(1);

    let mut next = elite_seed(population, self.elitist);
    while next.len() < self.population_size {
      let winner = (0..tournament_size)
        .map(|_| &population.individuals()[rng.gen_range(0..population.len())])
        .max_by(|a, b| main_fitness(a).total_cmp(&main_fitness(b)))
        .expect("tournament holds at least one individual");
      next.push(winner.clone());
    }
    population.replace(next);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;

  use super::*;
  use crate::score::PerformanceVector;

  fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
  }

  fn population_with_fitness(fitness: &[f64]) -> Population {
    let mut population = Population::new(
      fitness
        .iter()
        .enumerate()
        .map(|(i, f)| {
          let mut individual = Individual::new(vec![i as f64]);
          individual.set_fitness(PerformanceVector::single("fitness", *f));
          individual
        })
        .collect(),
    );
    population.update_bests();
    population
  }

  fn takes_operator(operator: &mut dyn PopulationOperator) {
    let mut population = population_with_fitness(&[1.0, 2.0, 3.0, 4.0]);
    operator
      .operate(&mut population, &mut rng())
      .expect("selection must succeed on a healthy population");
    assert_eq!(population.len(), 3);
    assert!(population.individuals().iter().all(|i| i.fitness().is_some()));
  }

  #[test]
  fn test_every_selector_restores_population_size() {
    takes_operator(&mut UniformSelection {
      population_size: 3,
      elitist: false,
    });
    takes_operator(&mut CutSelection {
      population_size: 3,
      elitist: false,
    });
    takes_operator(&mut RouletteWheelSelection {
      population_size: 3,
      elitist: false,
    });
    takes_operator(&mut BoltzmannSelection {
      population_size: 3,
      elitist: false,
      temperature: 1.0,
      dynamic: false,
      max_generations: 10,
    });
    takes_operator(&mut StochasticUniversalSampling {
      population_size: 3,
      elitist: false,
    });
    takes_operator(&mut RankSelection {
      population_size: 3,
      elitist: false,
    });
    takes_operator(&mut TournamentSelection {
      population_size: 3,
      elitist: false,
      fraction: 0.5,
    });
  }

  #[test]
  fn test_every_selector_rejects_empty_population() {
    let operators: Vec<Box<dyn PopulationOperator>> = vec![
      Box::new(UniformSelection {
        population_size: 3,
        elitist: false,
      }),
      Box::new(CutSelection {
        population_size: 3,
        elitist: false,
      }),
      Box::new(RouletteWheelSelection {
        population_size: 3,
        elitist: false,
      }),
      Box::new(StochasticUniversalSampling {
        population_size: 3,
        elitist: false,
      }),
      Box::new(RankSelection {
        population_size: 3,
        elitist: false,
      }),
      Box::new(TournamentSelection {
        population_size: 3,
        elitist: false,
        fraction: 0.5,
      }),
    ];
    for mut operator in operators {
      let mut population = Population::new(vec![]);
      let err = operator
        .operate(&mut population, &mut rng())
        .expect_err("empty population must be rejected");
      assert_eq!(err.operator, operator.name());
    }
  }

  #[test]
  fn test_cut_keeps_the_best() {
    let mut population = population_with_fitness(&[1.0, 5.0, 3.0, 4.0, 2.0]);
    let mut selection = CutSelection {
      population_size: 2,
      elitist: false,
    };
    selection.operate(&mut population, &mut rng()).unwrap();
    let mut kept: Vec<f64> = population
      .individuals()
      .iter()
      .map(|i| i.main_fitness().unwrap())
      .collect();
    kept.sort_by(f64::total_cmp);
    assert_eq!(kept, vec![4.0, 5.0]);
  }

  #[test]
  fn test_roulette_wheel_rejects_zero_mass() {
    let mut population = population_with_fitness(&[0.0, 0.0, 0.0]);
    let mut selection = RouletteWheelSelection {
      population_size: 3,
      elitist: false,
    };
    let err = selection
      .operate(&mut population, &mut rng())
      .expect_err("all-zero fitness must be rejected");
    assert_eq!(err.operator, "roulette wheel selection");
  }

  #[test]
  fn test_roulette_wheel_rejects_negative_fitness() {
    let mut population = population_with_fitness(&[1.0, -0.5, 2.0]);
    let mut selection = RouletteWheelSelection {
      population_size: 3,
      elitist: false,
    };
    assert!(selection.operate(&mut population, &mut rng()).is_err());
  }

  #[test]
  fn test_rank_selection_tolerates_negative_fitness() {
    let mut population = population_with_fitness(&[-3.0, -1.0, -2.0]);
    let mut selection = RankSelection {
      population_size: 3,
      elitist: false,
    };
    selection.operate(&mut population, &mut rng()).unwrap();
    assert_eq!(population.len(), 3);
  }

  #[test]
  fn test_elitism_preserves_best_genome() {
    let operators: Vec<Box<dyn PopulationOperator>> = vec![
      Box::new(UniformSelection {
        population_size: 4,
        elitist: true,
      }),
      Box::new(CutSelection {
        population_size: 4,
        elitist: true,
      }),
      Box::new(RouletteWheelSelection {
        population_size: 4,
        elitist: true,
      }),
      Box::new(BoltzmannSelection {
        population_size: 4,
        elitist: true,
        temperature: 1.0,
        dynamic: false,
        max_generations: 10,
      }),
      Box::new(StochasticUniversalSampling {
        population_size: 4,
        elitist: true,
      }),
      Box::new(RankSelection {
        population_size: 4,
        elitist: true,
      }),
      Box::new(TournamentSelection {
        population_size: 4,
        elitist: true,
        fraction: 0.25,
      }),
    ];
    for mut operator in operators {
      let mut population = population_with_fitness(&[1.0, 9.0, 2.0, 3.0]);
      let best_genome = population.best_ever().unwrap().values().to_vec();
      operator.operate(&mut population, &mut rng()).unwrap();
      assert!(
        population
          .individuals()
          .iter()
          .any(|i| i.values() == best_genome.as_slice()),
        "{} lost the elite individual",
        operator.name()
      );
    }
  }

  #[test]
  fn test_tournament_size_is_at_least_one() {
    let mut population = population_with_fitness(&[1.0, 2.0]);
    let mut selection = TournamentSelection {
      population_size: 2,
      elitist: false,
      fraction: 0.01,
    };
    selection.operate(&mut population, &mut rng()).unwrap();
    assert_eq!(population.len(), 2);
  }

  #[test]
  fn test_sus_places_equally_spaced_pointers() {
    // with equal fitness every individual is picked exactly once
    let mut population = population_with_fitness(&[1.0, 1.0, 1.0, 1.0]);
    let mut selection = StochasticUniversalSampling {
      population_size: 4,
      elitist: false,
    };
    selection.operate(&mut population, &mut rng()).unwrap();
    let mut genomes: Vec<f64> = population
      .individuals()
      .iter()
      .map(|i| i.values()[0])
      .collect();
    genomes.sort_by(f64::total_cmp);
    assert_eq!(genomes, vec![0.0, 1.0, 2.0, 3.0]);
  }

  #[test]
  fn test_boltzmann_handles_negative_fitness() {
    // exp() maps any finite fitness onto positive wheel mass
    let mut population = population_with_fitness(&[-5.0, -1.0, -3.0]);
    let mut selection = BoltzmannSelection {
      population_size: 3,
      elitist: false,
      temperature: 2.0,
      dynamic: true,
      max_generations: 100,
    };
    selection.operate(&mut population, &mut rng()).unwrap();
    assert_eq!(population.len(), 3);
  }
}
