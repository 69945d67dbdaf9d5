use log::info;
use std::collections::HashMap;
use tabled::{builder::Builder, settings::Style};
use std::time::{Duration, Instant};

/// Human-readable duration: unit suffix and value in that unit.
pub fn elapsed_time(elapsed: Duration) -> (String, f64) {
    let time = elapsed.as_millis();
    if time < 1000 {
        (" ms".to_string(), elapsed.as_secs_f64() * 1000.0)
    } else if time < 60_000 {
        (" s".to_string(), elapsed.as_secs_f64())
    } else if time < 3_600_000 {
        (" min".to_string(), elapsed.as_secs_f64() / 60.0)
    } else {
        (" h".to_string(), elapsed.as_secs_f64() / 3600.0)
    }
}

/// Wall-clock accounting of the phases of a solve: factorization (or preconditioner setup)
/// and the iteration loop. Each phase accumulates over repeated tic/tac pairs.
#[derive(Debug, Clone)]
pub struct SolverTimer {
    pub start: Instant,
    pub factorization_time: Instant,
    pub factorization: Duration,
    pub iterations_time: Instant,
    pub iterations: Duration,
}

impl Default for SolverTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverTimer {
    pub fn new() -> SolverTimer {
        let now = Instant::now();
        SolverTimer {
            start: now,
            factorization_time: now,
            factorization: Duration::ZERO,
            iterations_time: now,
            iterations: Duration::ZERO,
        }
    }

    pub fn start(&mut self) {
        *self = SolverTimer::new();
    }

    pub fn factorization_tic(&mut self) {
        self.factorization_time = Instant::now();
    }
    pub fn factorization_tac(&mut self) {
        self.factorization += self.factorization_time.elapsed();
    }

    pub fn iterations_tic(&mut self) {
        self.iterations_time = Instant::now();
    }
    pub fn iterations_tac(&mut self) {
        self.iterations += self.iterations_time.elapsed();
    }

    pub fn total(&self) -> Duration {
        self.start.elapsed()
    }

    /// phase name -> "share %, value unit"; phases under 0.5 % of the total are left out
    pub fn get_all(&self) -> HashMap<String, String> {
        let mut timer_data = HashMap::new();
        let total = self.start.elapsed();
        let total_ns = (total.as_nanos() as f64).max(1.0);
        let (unit, value) = elapsed_time(total);
        timer_data.insert(
            format!("time elapsed,{}", unit),
            format!("{:.3}", value),
        );
        for (name, phase) in [
            ("Factorization", self.factorization),
            ("Iterations", self.iterations),
        ] {
            let percent = 100.0 * phase.as_nanos() as f64 / total_ns;
            if percent > 0.5 {
                let (unit, value) = elapsed_time(phase);
                timer_data.insert(
                    format!("{} (%,{})", name, unit),
                    format!("{:.3}, {:.3}", percent, value),
                );
            }
        }
        let mut table = Builder::from(timer_data.clone()).build();
        table.with(Style::modern_rounded());
        info!("\n \n SOLVER TIMING \n \n {}", table.to_string());
        timer_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_time_units() {
        assert_eq!(elapsed_time(Duration::from_millis(250)).0, " ms");
        let (unit, v) = elapsed_time(Duration::from_secs(90));
        assert_eq!(unit, " min");
        assert!((v - 1.5).abs() < 1e-12);
        assert_eq!(elapsed_time(Duration::from_secs(7200)).1, 2.0);
    }

    #[test]
    fn test_phases_accumulate() {
        let mut timer = SolverTimer::new();
        timer.iterations_tic();
        std::thread::sleep(Duration::from_millis(5));
        timer.iterations_tac();
        timer.iterations_tic();
        std::thread::sleep(Duration::from_millis(5));
        timer.iterations_tac();
        assert!(timer.iterations >= Duration::from_millis(10));
        assert_eq!(timer.factorization, Duration::ZERO);
        let report = timer.get_all();
        assert!(report.keys().any(|k| k.starts_with("Iterations")));
        assert!(!report.keys().any(|k| k.starts_with("Factorization")));
    }
}
