//! Fitness values and multi-criterion performance vectors used throughout
//! the engine.

use std::cmp::Ordering;

/// An alias for a fitness value. Higher is always better - the engine
/// maximizes. If your actual goal is a minimum, negate your fitness
/// function so it **does** grow toward the optimum.
pub type Score = f64;

/// A single named fitness criterion.
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceCriterion {
  /// Name of the criterion.
  pub name: String,
  /// Fitness value of the criterion.
  pub fitness: Score,
}

/// An ordered sequence of named criteria with one designated *main*
/// criterion. Single-objective selection operators rank individuals by the
/// main criterion alone; the multi-objective operator considers every
/// criterion.
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceVector {
  criteria: Vec<PerformanceCriterion>,
  main: usize,
}

impl PerformanceVector {
  /// Creates a single-criterion vector. That criterion is the main one.
  pub fn single(name: impl Into<String>, fitness: Score) -> Self {
    Self {
      criteria: vec![PerformanceCriterion {
        name: name.into(),
        fitness,
      }],
      main: 0,
    }
  }

  /// Creates a multi-criterion vector with the main criterion at
  /// `main_index`.
  ///
  /// # Panics
  /// Panics if `criteria` is empty or `main_index` is out of range.
  pub fn from_criteria(
    criteria: Vec<PerformanceCriterion>,
    main_index: usize,
  ) -> Self {
    assert!(
      main_index < criteria.len(),
      "main criterion index out of range"
    );
    Self {
      criteria,
      main: main_index,
    }
  }

  /// All criteria in order.
  pub fn criteria(&self) -> &[PerformanceCriterion] {
    &self.criteria
  }

  /// The main criterion.
  pub fn main_criterion(&self) -> &PerformanceCriterion {
    &self.criteria[self.main]
  }

  /// The fitness value of the main criterion.
  pub fn main_fitness(&self) -> Score {
    self.criteria[self.main].fitness
  }

  pub(crate) fn fitness_values(&self) -> impl Iterator<Item = Score> + '_ {
    self.criteria.iter().map(|c| c.fitness)
  }
}

/// Describes pareto dominance for performance vectors.
pub(crate) trait ParetoDominance {
  /// Returns `Less` if `self` dominates `other`, `Greater` if `other`
  /// dominates `self`, otherwise `Equal`. `self` dominates `other` if every
  /// criterion of `self` is at least as large as the respective criterion
  /// of `other` and at least one is strictly larger.
  fn dominance(&self, other: &Self) -> Ordering;
}

impl ParetoDominance for PerformanceVector {
  fn dominance(&self, other: &Self) -> Ordering {
    let mut ord = Ordering::Equal;
    for (a, b) in self.fitness_values().zip(other.fitness_values()) {
      match (ord, b.partial_cmp(&a).expect("NaN encountered")) {
        (Ordering::Equal, next_ord) => ord = next_ord,
        (Ordering::Greater, Ordering::Less)
        | (Ordering::Less, Ordering::Greater) => return Ordering::Equal,
        _ => {}
      }
    }
    ord
  }
}

#[cfg(test)]
mod tests {
  use std::cmp::Ordering;

  use super::*;

  fn pv(values: &[Score]) -> PerformanceVector {
    PerformanceVector::from_criteria(
      values
        .iter()
        .enumerate()
        .map(|(i, v)| PerformanceCriterion {
          name: format!("criterion {i}"),
          fitness: *v,
        })
        .collect(),
      0,
    )
  }

  #[test]
  fn test_single_criterion_vector() {
    let v = PerformanceVector::single("accuracy", 0.75);
    assert_eq!(v.main_criterion().name, "accuracy");
    assert_eq!(v.main_fitness(), 0.75);
    assert_eq!(v.criteria().len(), 1);
  }

  #[test]
  fn test_main_criterion_selection() {
    let v = pv(&[1.0, 2.0, 3.0]);
    assert_eq!(v.main_fitness(), 1.0);
    let v = PerformanceVector::from_criteria(v.criteria.clone(), 2);
    assert_eq!(v.main_fitness(), 3.0);
  }

  #[test]
  fn test_pareto_dominance() {
    assert_eq!(
      pv(&[1.0, 2.0, 3.0]).dominance(&pv(&[1.0, 2.0, 3.0])),
      Ordering::Equal
    );

    assert_eq!(
      pv(&[10.0, 2.0, 3.0]).dominance(&pv(&[1.0, 2.0, 3.0])),
      Ordering::Less
    );
    assert_eq!(
      pv(&[1.0, 20.0, 3.0]).dominance(&pv(&[1.0, 2.0, 3.0])),
      Ordering::Less
    );
    assert_eq!(
      pv(&[1.0, 2.0, 30.0]).dominance(&pv(&[1.0, 2.0, 3.0])),
      Ordering::Less
    );

    assert_eq!(
      pv(&[1.0, 2.0, 3.0]).dominance(&pv(&[10.0, 2.0, 3.0])),
      Ordering::Greater
    );
    assert_eq!(
      pv(&[1.0, 2.0, 3.0]).dominance(&pv(&[1.0, 20.0, 3.0])),
      Ordering::Greater
    );

    assert_eq!(
      pv(&[3.0, 1.0]).dominance(&pv(&[1.0, 3.0])),
      Ordering::Equal
    );
    assert_eq!(
      pv(&[-1.0, -2.0]).dominance(&pv(&[-3.0, -2.0])),
      Ordering::Less
    );
  }

  #[test]
  fn test_dominance_both_criteria_better() {
    // b = (4, 6) dominates a = (3, 5), never the other way around
    let a = pv(&[3.0, 5.0]);
    let b = pv(&[4.0, 6.0]);
    assert_eq!(a.dominance(&b), Ordering::Greater);
    assert_eq!(b.dominance(&a), Ordering::Less);

    // a = (3, 5) and b = (5, 3) are incomparable
    let a = pv(&[3.0, 5.0]);
    let b = pv(&[5.0, 3.0]);
    assert_eq!(a.dominance(&b), Ordering::Equal);
    assert_eq!(b.dominance(&a), Ordering::Equal);
  }
}
