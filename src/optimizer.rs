//! The optimizer driver: configuration, the generational loop, evaluation
//! bookkeeping and run reporting.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use log::debug;
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;
use typed_builder::TypedBuilder;

use crate::{
  adaption::VarianceAdaption,
  crossover::UniformCrossover,
  error::{ConfigError, DegenerateSelectionError},
  individual::{GeneBounds, Individual},
  mutation::{GaussianMutation, Mutation, SparsityMutation, SwitchingMutation},
  operator::PopulationOperator,
  population::Population,
  score::{PerformanceVector, Score},
  selection::{
    nsga::NonDominatedSortingSelection,
    BoltzmannSelection,
    CutSelection,
    RankSelection,
    RouletteWheelSelection,
    StochasticUniversalSampling,
    TournamentSelection,
    UniformSelection,
  },
};

/// Selection strategy the pipeline is built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionKind {
  /// Uniformly random draws with replacement.
  Uniform,
  /// Keep the best individuals, drop the rest.
  Cut,
  /// Cumulative-fitness-proportional sampling.
  RouletteWheel,
  /// Roulette wheel over `exp(fitness / temperature)`.
  Boltzmann,
  /// A single offset with equally spaced wheel pointers.
  StochasticUniversalSampling,
  /// A rank-proportional wheel.
  Rank,
  /// Tournaments of configurable size.
  Tournament,
  /// NSGA-II non-dominated sorting with crowding-distance diversity.
  NonDominatedSorting,
}

/// Mutation strategy the pipeline is built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
  /// Normal noise scaled by adaptive per-gene step sizes.
  Gaussian,
  /// Flip genes between their bounds.
  Switching,
  /// Drive genes to their lower bound.
  Sparsity,
}

/// How the initial population's genes are generated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InitPolicy {
  /// Uniformly random genes within bounds.
  Random,
  /// Every gene at its lower bound.
  Min,
  /// Every gene at its upper bound.
  Max,
  /// Every gene at a fixed value, clamped into its bounds.
  Fixed(f64),
  /// The caller-overridable default, resolving to [`Random`](Self::Random).
  Default,
}

/// Configuration of an optimization run, consumed at construction.
#[derive(Clone, Debug, TypedBuilder)]
pub struct EsConfig {
  /// Per-gene bounds and value kinds.
  pub bounds: GeneBounds,
  /// Number of individuals every generation is restored to.
  pub population_size: usize,
  /// Generation budget.
  pub max_generations: u32,
  /// Stop early after this many generations without improvement.
  #[builder(default)]
  pub early_stopping: Option<u32>,
  /// Selection strategy.
  #[builder(default = SelectionKind::Tournament)]
  pub selection: SelectionKind,
  /// Copy the best-ever individual into every new generation.
  #[builder(default = false)]
  pub elitist: bool,
  /// Mutation strategy.
  #[builder(default = MutationKind::Gaussian)]
  pub mutation: MutationKind,
  /// Initial per-gene step size for Gaussian mutation.
  #[builder(default = 1.0)]
  pub default_sigma: f64,
  /// Probability that a pair of parents recombines.
  #[builder(default = 0.9)]
  pub crossover_probability: f64,
  /// Fraction of the population entering each tournament.
  #[builder(default = 0.25)]
  pub tournament_fraction: f64,
  /// Boltzmann selection temperature.
  #[builder(default = 1.0)]
  pub boltzmann_temperature: f64,
  /// Decay the Boltzmann temperature linearly over the run.
  #[builder(default = false)]
  pub dynamic_temperature: bool,
  /// Initialization policy for the first generation.
  #[builder(default = InitPolicy::Default)]
  pub init: InitPolicy,
  /// RNG seed; a random seed is drawn when absent.
  #[builder(default)]
  pub seed: Option<u64>,
}

impl EsConfig {
  fn validate(&self) -> Result<(), ConfigError> {
    if self.population_size == 0 {
      return Err(ConfigError::EmptyPopulation);
    }
    if self.max_generations == 0 {
      return Err(ConfigError::ParameterOutOfRange {
        name: "max_generations",
        value: 0.0,
      });
    }
    if !(0.0..=1.0).contains(&self.crossover_probability) {
      return Err(ConfigError::ParameterOutOfRange {
        name: "crossover_probability",
        value: self.crossover_probability,
      });
    }
    if self.tournament_fraction <= 0.0 {
      return Err(ConfigError::ParameterOutOfRange {
        name: "tournament_fraction",
        value: self.tournament_fraction,
      });
    }
    if self.boltzmann_temperature <= 0.0 {
      return Err(ConfigError::ParameterOutOfRange {
        name: "boltzmann_temperature",
        value: self.boltzmann_temperature,
      });
    }
    if self.default_sigma <= 0.0 {
      return Err(ConfigError::ParameterOutOfRange {
        name: "default_sigma",
        value: self.default_sigma,
      });
    }
    Ok(())
  }
}

/// One convergence telemetry sample, emitted once per generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationRecord {
  /// Generation the sample was taken at.
  pub generation: u32,
  /// Main-criterion fitness of the best-ever individual.
  pub best_ever_fitness: Option<Score>,
  /// Main-criterion fitness of the current generation's best individual.
  pub current_best_fitness: Option<Score>,
}

/// A per-generation progress callback. Purely observational - it receives
/// the same samples that end up in the report's telemetry.
pub type ProgressCallback = Box<dyn FnMut(&GenerationRecord) + Send>;

/// Why the generational loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
  /// The generation budget was exhausted.
  MaxGenerations,
  /// Early stopping: too many generations without improvement.
  Stagnation,
  /// The run was cancelled from the outside.
  Cancelled,
  /// Every candidate was dropped as infeasible.
  Extinct,
}

/// The outcome of an optimization run.
#[derive(Debug)]
pub struct OptimizationReport {
  /// The best individual found over the whole run, with its fitness
  /// attached; `None` if every evaluation failed.
  pub best: Option<Individual>,
  /// The individuals present when the run stopped: the last generation's
  /// survivors plus any offspring appended by the final pipeline pass.
  pub final_population: Vec<Individual>,
  /// Generation the run stopped at.
  pub generations: u32,
  /// Individuals visited by the evaluation step, summed over generations.
  pub total_evaluations: u64,
  /// Individuals actually sent to the fitness callback. Unchanged
  /// survivors keep their fitness and are free.
  pub actual_evaluations: u64,
  /// Why the run stopped.
  pub stop_reason: StopReason,
  /// Per-generation convergence time series.
  pub telemetry: Vec<GenerationRecord>,
}

impl OptimizationReport {
  /// The non-dominated subset of the final population. For multi-objective
  /// runs this approximates the pareto front.
  pub fn non_dominated(&self) -> Vec<&Individual> {
    use crate::score::ParetoDominance;
    use std::cmp::Ordering;

    self
      .final_population
      .iter()
      .filter(|candidate| {
        let Some(candidate_fitness) = candidate.fitness() else {
          return false;
        };
        !self.final_population.iter().any(|other| {
          other.fitness().is_some_and(|other_fitness| {
            other_fitness.dominance(candidate_fitness) == Ordering::Less
          })
        })
      })
      .collect()
  }
}

/// The optimizer driver.
///
/// Owns the population and the operator pipeline, which is built once at
/// construction from the configuration. Each generation runs the pipeline
/// stages strictly in construction order - selection, crossover, mutation,
/// then step-size adaption when Gaussian mutation is active - and
/// afterwards evaluates every individual whose fitness is unset. An
/// evaluation returning `None` marks an infeasible candidate, which is
/// dropped from the population without raising an error.
pub struct EsOptimizer<F> {
  config: EsConfig,
  selection: Box<dyn PopulationOperator>,
  crossover: UniformCrossover,
  mutation: Box<dyn Mutation>,
  adaption: Option<VarianceAdaption>,
  evaluate: F,
  rng: StdRng,
  cancelled: Arc<AtomicBool>,
  progress: Option<ProgressCallback>,
}

impl<F> EsOptimizer<F>
where
  F: Fn(&Individual) -> Option<PerformanceVector> + Sync,
{
  /// Validates the configuration and builds the operator pipeline.
  pub fn new(config: EsConfig, evaluate: F) -> Result<Self, ConfigError> {
    config.validate()?;

    let population_size = config.population_size;
    let elitist = config.elitist;
    let selection: Box<dyn PopulationOperator> = match config.selection {
      SelectionKind::Uniform => Box::new(UniformSelection {
        population_size,
        elitist,
      }),
      SelectionKind::Cut => Box::new(CutSelection {
        population_size,
        elitist,
      }),
      SelectionKind::RouletteWheel => Box::new(RouletteWheelSelection {
        population_size,
        elitist,
      }),
      SelectionKind::Boltzmann => Box::new(BoltzmannSelection {
        population_size,
        elitist,
        temperature: config.boltzmann_temperature,
        dynamic: config.dynamic_temperature,
        max_generations: config.max_generations,
      }),
      SelectionKind::StochasticUniversalSampling => {
        Box::new(StochasticUniversalSampling {
          population_size,
          elitist,
        })
      }
      SelectionKind::Rank => Box::new(RankSelection {
        population_size,
        elitist,
      }),
      SelectionKind::Tournament => Box::new(TournamentSelection {
        population_size,
        elitist,
        fraction: config.tournament_fraction,
      }),
      SelectionKind::NonDominatedSorting => {
        Box::new(NonDominatedSortingSelection { population_size })
      }
    };

    let mutation: Box<dyn Mutation> = match config.mutation {
      MutationKind::Gaussian => Box::new(GaussianMutation::new(
        config.bounds.clone(),
        config.default_sigma,
      )),
      MutationKind::Switching => {
        Box::new(SwitchingMutation::new(config.bounds.clone()))
      }
      MutationKind::Sparsity => {
        Box::new(SparsityMutation::new(config.bounds.clone()))
      }
    };

    // the 1/5 rule only drives Gaussian step sizes
    let adaption = matches!(config.mutation, MutationKind::Gaussian)
      .then(|| VarianceAdaption::new(config.bounds.dimension()));

    let rng = StdRng::seed_from_u64(config.seed.unwrap_or_else(rand::random));

    Ok(Self {
      selection,
      crossover: UniformCrossover {
        probability: config.crossover_probability,
      },
      mutation,
      adaption,
      evaluate,
      rng,
      cancelled: Arc::new(AtomicBool::new(false)),
      progress: None,
      config,
    })
  }

  /// Installs a per-generation progress callback.
  pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
    self.progress = Some(callback);
    self
  }

  /// A handle for cancelling the run cooperatively. The flag is checked
  /// once per generation, before the pipeline runs; a cancelled run
  /// returns the best individual found so far as a normal early exit.
  pub fn cancel_handle(&self) -> Arc<AtomicBool> {
    Arc::clone(&self.cancelled)
  }

  /// Runs the generational loop to completion and returns the report.
  pub fn optimize(
    mut self,
  ) -> Result<OptimizationReport, DegenerateSelectionError> {
    let mut population = self.seed_population();
    let mut total_evaluations = 0u64;
    let mut actual_evaluations = 0u64;
    let mut telemetry = Vec::new();

    self.evaluate_population(
      &mut population,
      &mut total_evaluations,
      &mut actual_evaluations,
    );
    population.update_bests();
    self.record(&population, &mut telemetry);

    let stop_reason = loop {
      if self.cancelled.load(Ordering::Relaxed) {
        break StopReason::Cancelled;
      }
      if population.generation() >= self.config.max_generations {
        break StopReason::MaxGenerations;
      }
      if let Some(threshold) = self.config.early_stopping {
        if population.generations_without_improvement() > threshold {
          break StopReason::Stagnation;
        }
      }
      if population.is_empty() {
        break StopReason::Extinct;
      }

      self.selection.operate(&mut population, &mut self.rng)?;
      self.crossover.operate(&mut population, &mut self.rng)?;
      self.mutation.operate(&mut population, &mut self.rng)?;
      if let Some(adaption) = &mut self.adaption {
        adaption.operate(&population, self.mutation.as_mut());
      }

      // the pipeline produced the next generation
      population.advance_generation();
      self.evaluate_population(
        &mut population,
        &mut total_evaluations,
        &mut actual_evaluations,
      );
      population.update_bests();
      self.record(&population, &mut telemetry);
    };

    debug!(
      "run stopped at generation {} ({stop_reason:?}), {actual_evaluations} of {total_evaluations} visited individuals evaluated",
      population.generation(),
    );

    Ok(OptimizationReport {
      best: population.best_ever().cloned(),
      generations: population.generation(),
      final_population: std::mem::take(population.individuals_mut()),
      total_evaluations,
      actual_evaluations,
      stop_reason,
      telemetry,
    })
  }

  fn seed_population(&mut self) -> Population {
    let bounds = &self.config.bounds;
    let init = self.config.init;
    let rng = &mut self.rng;
    let individuals = (0..self.config.population_size)
      .map(|_| {
        let values = (0..bounds.dimension())
          .map(|gene| match init {
            InitPolicy::Random | InitPolicy::Default => {
              bounds.random_gene(gene, rng)
            }
            InitPolicy::Min => bounds.min(gene),
            InitPolicy::Max => bounds.max(gene),
            InitPolicy::Fixed(value) => bounds.clamp(gene, value),
          })
          .collect();
        Individual::new(values)
      })
      .collect();
    debug!(
      "seeded {} individuals with {} genes each",
      self.config.population_size,
      bounds.dimension()
    );
    Population::new(individuals)
  }

  // evaluates every individual lacking fitness and drops infeasible
  // candidates, i.e. those the callback returns `None` for. unchanged
  // survivors keep their fitness and are not re-evaluated
  fn evaluate_population(
    &self,
    population: &mut Population,
    total_evaluations: &mut u64,
    actual_evaluations: &mut u64,
  ) {
    *total_evaluations += population.len() as u64;

    let pending: Vec<usize> = population
      .individuals()
      .iter()
      .enumerate()
      .filter_map(|(index, individual)| {
        individual.fitness().is_none().then_some(index)
      })
      .collect();
    *actual_evaluations += pending.len() as u64;

    // individuals are evaluated independently into a side buffer and the
    // results merged back sequentially
    let results: Vec<(usize, Option<PerformanceVector>)> = {
      let evaluate = &self.evaluate;
      let individuals = population.individuals();
      pending
        .par_iter()
        .map(|&index| (index, evaluate(&individuals[index])))
        .collect()
    };

    let mut infeasible = vec![false; population.len()];
    for (index, result) in results {
      match result {
        Some(fitness) => {
          population.individuals_mut()[index].set_fitness(fitness)
        }
        None => infeasible[index] = true,
      }
    }

    let dropped = infeasible.iter().filter(|&&flag| flag).count();
    if dropped > 0 {
      debug!("dropping {dropped} infeasible candidates");
      let mut flags = infeasible.into_iter();
      population
        .individuals_mut()
        .retain(|_| !flags.next().expect("one flag per individual"));
    }
  }

  fn record(
    &mut self,
    population: &Population,
    telemetry: &mut Vec<GenerationRecord>,
  ) {
    let record = GenerationRecord {
      generation: population.generation(),
      best_ever_fitness: population
        .best_ever()
        .and_then(Individual::main_fitness),
      current_best_fitness: population
        .current_best()
        .and_then(Individual::main_fitness),
    };
    if let Some(progress) = &mut self.progress {
      progress(&record);
    }
    telemetry.push(record);
  }
}
