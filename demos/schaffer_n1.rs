use evostrat::{
  individual::GeneBounds,
  optimizer::{EsConfig, EsOptimizer, SelectionKind},
  score::{PerformanceCriterion, PerformanceVector},
};

// Schaffer's problem No.1: minimize f1(x) = x^2 and f2(x) = (x - 2)^2.
// The engine maximizes, so both objectives are negated; the pareto set is
// the segment [0, 2].
fn main() {
  env_logger::init();

  let config = EsConfig::builder()
    .bounds(GeneBounds::uniform(1, -10.0, 10.0).expect("static bounds"))
    .population_size(50)
    .max_generations(100)
    .selection(SelectionKind::NonDominatedSorting)
    .seed(Some(7))
    .build();

  let optimizer = EsOptimizer::new(config, |individual| {
    let x = individual.values()[0];
    Some(PerformanceVector::from_criteria(
      vec![
        PerformanceCriterion {
          name: "f1".into(),
          fitness: -(x * x),
        },
        PerformanceCriterion {
          name: "f2".into(),
          fitness: -((x - 2.0) * (x - 2.0)),
        },
      ],
      0,
    ))
  })
  .expect("static configuration");

  let report = optimizer.optimize().expect("healthy selection input");

  let mut front = report.non_dominated();
  front.sort_by(|a, b| a.values()[0].total_cmp(&b.values()[0]));

  println!("    x    |    f1    |    f2    ");
  for individual in front.iter().take(20) {
    let fitness = individual.fitness().expect("front is evaluated");
    println!(
      "{:>8.4} | {:>8.4} | {:>8.4}",
      individual.values()[0],
      -fitness.criteria()[0].fitness,
      -fitness.criteria()[1].fitness,
    );
  }
  println!(
    "{} non-dominated individuals after {} generations",
    front.len(),
    report.generations,
  );
}
