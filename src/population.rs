//! The population and its run bookkeeping.

use log::debug;

use crate::individual::Individual;

/// An ordered, mutable collection of individuals plus generation
/// bookkeeping: the generation counter, the best individual of the current
/// generation, the best individual ever seen and the generation of the
/// last improvement.
#[derive(Clone, Debug)]
pub struct Population {
  individuals: Vec<Individual>,
  generation: u32,
  best_ever: Option<Individual>,
  current_best: Option<Individual>,
  last_improvement_generation: u32,
}

impl Population {
  /// Creates a first-generation population from initial individuals.
  pub fn new(individuals: Vec<Individual>) -> Self {
    Self {
      individuals,
      generation: 1,
      best_ever: None,
      current_best: None,
      last_improvement_generation: 1,
    }
  }

  /// Individuals of the current generation.
  pub fn individuals(&self) -> &[Individual] {
    &self.individuals
  }

  /// Mutable access to the individual list for pipeline stages.
  pub fn individuals_mut(&mut self) -> &mut Vec<Individual> {
    &mut self.individuals
  }

  /// Replaces the individual list. Selection operators rebuild the
  /// population through this.
  pub fn replace(&mut self, individuals: Vec<Individual>) {
    self.individuals = individuals;
  }

  /// Number of individuals.
  pub fn len(&self) -> usize {
    self.individuals.len()
  }

  /// Whether the population holds no individuals.
  pub fn is_empty(&self) -> bool {
    self.individuals.is_empty()
  }

  /// The current generation, starting at 1.
  pub fn generation(&self) -> u32 {
    self.generation
  }

  /// The best individual found over the whole run so far. Its fitness is
  /// monotonically non-decreasing across the run.
  pub fn best_ever(&self) -> Option<&Individual> {
    self.best_ever.as_ref()
  }

  /// The best individual of the current generation. Unlike
  /// [`best_ever`](Self::best_ever), this may regress between generations.
  pub fn current_best(&self) -> Option<&Individual> {
    self.current_best.as_ref()
  }

  /// Generations elapsed since the best-ever individual last improved.
  pub fn generations_without_improvement(&self) -> u32 {
    self.generation - self.last_improvement_generation
  }

  /// Recomputes the current best and replaces the best-ever individual if
  /// a strictly better main-criterion fitness appeared.
  pub fn update_bests(&mut self) {
    self.current_best = self
      .individuals
      .iter()
      .filter(|i| i.fitness().is_some())
      .max_by(|a, b| {
        let a = a.main_fitness().expect("fitness filtered above");
        let b = b.main_fitness().expect("fitness filtered above");
        a.total_cmp(&b)
      })
      .cloned();

    let Some(current_best) = &self.current_best else {
      return;
    };
    let improved = match &self.best_ever {
      Some(best_ever) => {
        let current = current_best.main_fitness().expect("current best is evaluated");
        let best = best_ever.main_fitness().expect("best ever is evaluated");
        current > best
      }
      None => true,
    };
    if improved {
      debug!(
        "generation {}: best ever improved to {:?}",
        self.generation,
        current_best.main_fitness()
      );
      self.best_ever = Some(current_best.clone());
      self.last_improvement_generation = self.generation;
    }
  }

  /// Advances the generation counter. Called once per completed iteration
  /// of the generational loop.
  pub fn advance_generation(&mut self) {
    self.generation += 1;
  }
}
