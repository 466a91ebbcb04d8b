use evostrat::{
  individual::GeneBounds,
  optimizer::{EsConfig, EsOptimizer, SelectionKind},
  score::PerformanceVector,
};

fn main() {
  env_logger::init();

  // maximize f(x, y) = -(x^2 + y^2) over [-5, 5]^2, optimal at the origin
  let config = EsConfig::builder()
    .bounds(GeneBounds::uniform(2, -5.0, 5.0).expect("static bounds"))
    .population_size(30)
    .max_generations(200)
    .selection(SelectionKind::Tournament)
    .elitist(true)
    .seed(Some(42))
    .build();

  let optimizer = EsOptimizer::new(config, |individual| {
    let fitness: f64 = individual.values().iter().map(|v| -(v * v)).sum();
    Some(PerformanceVector::single("sphere", fitness))
  })
  .expect("static configuration");

  let report = optimizer.optimize().expect("healthy selection input");

  println!("generation | best ever | current best");
  for record in report.telemetry.iter().step_by(20) {
    println!(
      "{:>10} | {:>9.5} | {:>12.5}",
      record.generation,
      record.best_ever_fitness.unwrap_or(f64::NAN),
      record.current_best_fitness.unwrap_or(f64::NAN),
    );
  }

  let best = report.best.expect("sphere is always feasible");
  println!(
    "\nbest genome {:?} with fitness {:.6} after {} generations",
    best.values(),
    best.main_fitness().expect("best is evaluated"),
    report.generations,
  );
  println!(
    "{} of {} visited individuals were actually evaluated",
    report.actual_evaluations, report.total_evaluations,
  );
}
