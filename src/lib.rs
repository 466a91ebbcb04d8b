//! **evostrat** is a population-based evolutionary-strategy optimization
//! engine. It maximizes an arbitrary, possibly multi-criterion, real-valued
//! fitness function over bounded vectors and makes every genetic operator
//! pluggable: seven selection strategies (including a full NSGA-II
//! multi-objective variant with crowding-distance diversity preservation),
//! three mutation strategies, uniform crossover, adaptive step-size control
//! via the classical 1/5 rule, elitism and early stopping.
//!
//! This crate defines a few abstractions that help you understand its
//! workflow:
//! - **Individual** - one candidate solution: a genome of `f64` genes plus
//!   a [`PerformanceVector`] once evaluated
//! - **Population** - the current generation's individuals plus run
//!   bookkeeping: generation counter, current best, best ever
//! - **PopulationOperator** - a pipeline stage transforming the population
//!   in place: selection, crossover, mutation, step-size adaption
//! - **EsOptimizer** - the driver that seeds a population, runs the stage
//!   pipeline once per generation and evaluates every individual whose
//!   fitness is unset through your fitness callback
//!
//! The fitness callback is the engine's only boundary: a
//! `Fn(&Individual) -> Option<PerformanceVector>`. Returning `None` marks
//! the candidate as infeasible and drops it from the population - that is
//! a domain signal, not an error. Unchanged survivors keep their fitness
//! across generations and are never re-evaluated, which is the engine's
//! core performance optimization; the remaining evaluations run in
//! parallel.
//!
//! # Example
//!
//! ```
//! use evostrat::{
//!   individual::GeneBounds,
//!   optimizer::{EsConfig, EsOptimizer, SelectionKind},
//!   score::PerformanceVector,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EsConfig::builder()
//!   .bounds(GeneBounds::uniform(2, -5.0, 5.0)?)
//!   .population_size(30)
//!   .max_generations(50)
//!   .selection(SelectionKind::Tournament)
//!   .elitist(true)
//!   .seed(Some(17))
//!   .build();
//!
//! // maximize f(x, y) = -(x^2 + y^2), optimal at the origin
//! let optimizer = EsOptimizer::new(config, |individual| {
//!   let &[x, y] = individual.values() else { return None };
//!   Some(PerformanceVector::single("sphere", -(x * x + y * y)))
//! })?;
//!
//! let report = optimizer.optimize()?;
//! let best = report.best.expect("at least one candidate evaluated");
//! println!("best genome: {:?}", best.values());
//! # Ok(())
//! # }
//! ```
//!
//! Fitness is always maximized. The engine is single-threaded and
//! synchronous apart from the evaluation step; a run can be cancelled
//! cooperatively through
//! [`EsOptimizer::cancel_handle`](optimizer::EsOptimizer::cancel_handle)
//! and observed through a per-generation progress callback or the
//! telemetry series in the returned
//! [`OptimizationReport`](optimizer::OptimizationReport).
//!
//! [`PerformanceVector`]: score::PerformanceVector

#![warn(missing_docs)]

pub mod adaption;
pub mod crossover;
pub mod error;
pub mod individual;
pub mod mutation;
pub mod operator;
pub mod optimizer;
pub mod population;
pub mod score;
pub mod selection;
