use RustedLinSolve::Examples::linear_solver_examples::linear_solver_examples;

fn main() {
    let example = 2;
    if let Err(e) = linear_solver_examples(example) {
        eprintln!("example {} failed: {}", example, e);
    }
}
