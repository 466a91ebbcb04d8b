//! Non-dominated sorting selection (NSGA-II).

use std::cmp::Ordering;

use rand::rngs::StdRng;

use crate::{
  error::DegenerateSelectionError,
  individual::Individual,
  operator::PopulationOperator,
  population::Population,
  score::{ParetoDominance, PerformanceVector},
};

// index of an individual in the population's list
type IndividualIndex = usize;
// number of an individual's dominators
type DominanceCounter = u32;
// indices of the individuals dominated by an individual
type DominanceList = Vec<IndividualIndex>;
// indices of the individuals of one pareto front
type Front = Vec<IndividualIndex>;

/// Multi-objective selection after NSGA-II: partitions the population into
/// successive pareto fronts by pairwise dominance and accumulates whole
/// fronts into the next generation while they fit. The first front that
/// would overflow `population_size` is sorted by crowding distance
/// descending and only the least crowded individuals are kept, preserving
/// diversity along the front.
#[derive(Clone, Copy, Debug)]
pub struct NonDominatedSortingSelection {
  /// Target population size.
  pub population_size: usize,
}

impl PopulationOperator for NonDominatedSortingSelection {
  fn name(&self) -> &'static str {
    "non-dominated sorting selection"
  }

  fn operate(
    &mut self,
    population: &mut Population,
    _: &mut StdRng,
  ) -> Result<(), DegenerateSelectionError> {
    if population.is_empty() {
      return Err(DegenerateSelectionError::new(
        self.name(),
        "population is empty",
      ));
    }

    let mut next_indices: Vec<IndividualIndex> =
      Vec::with_capacity(self.population_size);
    for front in pareto_fronts(population) {
      if next_indices.len() + front.len() <= self.population_size {
        next_indices.extend(front);
        continue;
      }
      // this front overflows: keep its least crowded individuals only
      let mut overflow = front;
      assign_crowding_distances(population, &overflow);
      let individuals = population.individuals();
      overflow.sort_by(|&a, &b| {
        individuals[b]
          .crowding_distance
          .total_cmp(&individuals[a].crowding_distance)
      });
      overflow.truncate(self.population_size - next_indices.len());
      next_indices.extend(overflow);
      break;
    }

    debug_assert_eq!(
      next_indices.len(),
      std::collections::HashSet::<usize>::from_iter(
        next_indices.iter().cloned()
      )
      .len(),
      "next generation indices must be unique"
    );

    let mut slots: Vec<Option<Individual>> =
      population.individuals_mut().drain(..).map(Some).collect();
    let next: Vec<Individual> = next_indices
      .into_iter()
      .map(|index| slots[index].take().expect("each index selected once"))
      .collect();

    debug_assert!(
      next.len() <= self.population_size,
      "next generation must not exceed the configured population size"
    );

    population.replace(next);
    Ok(())
  }
}

// fast non-dominated sort: dominance lists and counters are filled for
// each unique pair of individuals, then fronts are peeled off in order
fn pareto_fronts(population: &Population) -> Vec<Front> {
  let individuals = population.individuals();
  let mut dominance_lists: Vec<DominanceList> =
    vec![Vec::new(); individuals.len()];
  let mut dominance_counters: Vec<DominanceCounter> =
    vec![0; individuals.len()];
  let mut first_front: Front = Vec::new();

  for p_index in 0..individuals.len() {
    let p_fitness = fitness_of(&individuals[p_index]);
    for q_index in p_index + 1..individuals.len() {
      let q_fitness = fitness_of(&individuals[q_index]);
      match p_fitness.dominance(q_fitness) {
        // `p` dominates `q`
        Ordering::Less => {
          dominance_lists[p_index].push(q_index);
          dominance_counters[q_index] += 1;
        }
        // `q` dominates `p`
        Ordering::Greater => {
          dominance_lists[q_index].push(p_index);
          dominance_counters[p_index] += 1;
        }
        Ordering::Equal => {}
      }
    }
    if dominance_counters[p_index] == 0 {
      first_front.push(p_index);
    }
  }

  debug_assert!(
    !first_front.is_empty(),
    "first front must have at least 1 individual"
  );

  let mut fronts = vec![first_front];
  let mut front_index = 0;
  while front_index < fronts.len() {
    let mut next_front: Front = Vec::new();
    for &p_index in &fronts[front_index] {
      for &q_index in &dominance_lists[p_index] {
        dominance_counters[q_index] -= 1;
        if dominance_counters[q_index] == 0 {
          next_front.push(q_index);
        }
      }
    }
    if next_front.is_empty() {
      break;
    }
    fronts.push(next_front);
    front_index += 1;
  }
  fronts
}

// writes each front member's crowding distance into its scratch field: the
// sum, per objective, of the fitness gap between its two neighbors when
// the front is sorted by that objective. boundary individuals get infinite
// distance so they always survive truncation
fn assign_crowding_distances(
  population: &mut Population,
  front: &[IndividualIndex],
) {
  let individuals = population.individuals_mut();
  for &index in front {
    individuals[index].crowding_distance = 0.0;
  }
  if front.len() < 3 {
    for &index in front {
      individuals[index].crowding_distance = f64::INFINITY;
    }
    return;
  }

  let criteria_count = fitness_of(&individuals[front[0]]).criteria().len();
  let mut ordered: Vec<IndividualIndex> = front.to_vec();
  for objective in 0..criteria_count {
    ordered.sort_by(|&a, &b| {
      score_of(&individuals[a], objective)
        .total_cmp(&score_of(&individuals[b], objective))
    });

    let first = ordered[0];
    let last = ordered[ordered.len() - 1];
    individuals[first].crowding_distance = f64::INFINITY;
    individuals[last].crowding_distance = f64::INFINITY;

    for position in 1..ordered.len() - 1 {
      let index = ordered[position];
      if individuals[index].crowding_distance.is_finite() {
        let below = score_of(&individuals[ordered[position - 1]], objective);
        let above = score_of(&individuals[ordered[position + 1]], objective);
        individuals[index].crowding_distance += (above - below).abs();
      }
    }
  }
}

fn fitness_of(individual: &Individual) -> &PerformanceVector {
  individual
    .fitness()
    .expect("individual must be evaluated before selection")
}

fn score_of(individual: &Individual, objective: usize) -> f64 {
  fitness_of(individual).criteria()[objective].fitness
}

#[cfg(test)]
mod tests {
  use rand::SeedableRng;

  use super::*;
  use crate::score::PerformanceCriterion;

  fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
  }

  fn evaluated(criteria: &[f64]) -> Individual {
    let mut individual = Individual::new(vec![0.0]);
    individual.set_fitness(PerformanceVector::from_criteria(
      criteria
        .iter()
        .enumerate()
        .map(|(i, v)| PerformanceCriterion {
          name: format!("criterion {i}"),
          fitness: *v,
        })
        .collect(),
      0,
    ));
    individual
  }

  fn population(criteria: &[&[f64]]) -> Population {
    Population::new(criteria.iter().map(|c| evaluated(c)).collect())
  }

  #[test]
  fn test_fronts_are_peeled_in_dominance_order() {
    // (4, 4) dominates everything, (1, 1) is dominated by everything and
    // (3, 1) / (1, 3) are mutually incomparable
    let population =
      population(&[&[1.0, 1.0], &[3.0, 1.0], &[1.0, 3.0], &[4.0, 4.0]]);
    let fronts = pareto_fronts(&population);
    assert_eq!(fronts.len(), 3);
    assert_eq!(fronts[0], vec![3]);
    assert_eq!(fronts[1], vec![1, 2]);
    assert_eq!(fronts[2], vec![0]);
  }

  #[test]
  fn test_whole_fronts_survive_while_they_fit() {
    let mut population =
      population(&[&[1.0, 1.0], &[3.0, 1.0], &[1.0, 3.0], &[4.0, 4.0]]);
    let mut selection = NonDominatedSortingSelection { population_size: 3 };
    selection.operate(&mut population, &mut rng()).unwrap();

    // the first two fronts fit exactly; the dominated (1, 1) is dropped
    assert_eq!(population.len(), 3);
    assert!(population
      .individuals()
      .iter()
      .all(|i| i.fitness().unwrap().main_fitness() > 1.0
        || i.fitness().unwrap().criteria()[1].fitness > 1.0));
  }

  #[test]
  fn test_boundary_individuals_get_infinite_distance() {
    let mut population = population(&[
      &[0.0, 4.0],
      &[1.0, 3.0],
      &[2.0, 2.0],
      &[3.0, 1.0],
      &[4.0, 0.0],
    ]);
    let front: Vec<usize> = (0..5).collect();
    assign_crowding_distances(&mut population, &front);

    let distances: Vec<f64> = population
      .individuals()
      .iter()
      .map(|i| i.crowding_distance)
      .collect();
    assert_eq!(distances[0], f64::INFINITY);
    assert_eq!(distances[4], f64::INFINITY);
    // interior neighbors are 2.0 apart per objective
    assert_eq!(distances[1], 4.0);
    assert_eq!(distances[2], 4.0);
    assert_eq!(distances[3], 4.0);
  }

  #[test]
  fn test_overflowing_front_is_truncated_by_crowding() {
    // one front of five individuals along a line; the crowded duplicate
    // region around (2, 2) loses out
    let mut population = population(&[
      &[0.0, 4.0],
      &[1.9, 2.1],
      &[2.0, 2.0],
      &[2.1, 1.9],
      &[4.0, 0.0],
    ]);
    let mut selection = NonDominatedSortingSelection { population_size: 3 };
    selection.operate(&mut population, &mut rng()).unwrap();

    assert_eq!(population.len(), 3);
    let mut mains: Vec<f64> = population
      .individuals()
      .iter()
      .map(|i| i.fitness().unwrap().main_fitness())
      .collect();
    mains.sort_by(f64::total_cmp);
    // both boundary individuals survive
    assert_eq!(mains[0], 0.0);
    assert_eq!(mains[2], 4.0);
  }

  #[test]
  fn test_rejects_empty_population() {
    let mut selection = NonDominatedSortingSelection { population_size: 3 };
    let mut population = Population::new(vec![]);
    assert!(selection.operate(&mut population, &mut rng()).is_err());
  }
}
