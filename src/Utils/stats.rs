//! descriptive statistics over residual or timing histories, with a table report
use crate::containers::Real;
use crate::error::{LinAlgError, Result};
use tabled::builder::Builder;
use tabled::settings::Style;

/// Sorted copy of a non-empty, NaN-free series.
#[derive(Debug, Clone)]
pub struct Stats<T> {
    sorted: Vec<T>,
    sum: T,
}

impl<T: Real> Stats<T> {
    pub fn new(data: &[T]) -> Result<Stats<T>> {
        if data.is_empty() {
            return Err(LinAlgError::InvalidInput(
                "statistics of an empty series".to_string(),
            ));
        }
        if data.iter().any(|v| v.is_nan()) {
            return Err(LinAlgError::InvalidInput(
                "statistics of a series containing NaN".to_string(),
            ));
        }
        let mut sorted = data.to_vec();
        // no NaN left, the comparison is total
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let sum = sorted.iter().copied().sum();
        Ok(Stats { sorted, sum })
    }

    pub fn count(&self) -> usize {
        self.sorted.len()
    }

    pub fn mean(&self) -> T {
        self.sum / T::from_usize_lossy(self.count())
    }

    /// population variance (divides by n)
    pub fn variance(&self) -> T {
        let mean = self.mean();
        let ss: T = self.sorted.iter().map(|&v| (v - mean) * (v - mean)).sum();
        ss / T::from_usize_lossy(self.count())
    }

    pub fn std_dev(&self) -> T {
        self.variance().sqrt()
    }

    pub fn min(&self) -> T {
        self.sorted[0]
    }

    pub fn max(&self) -> T {
        self.sorted[self.count() - 1]
    }

    /// p-th percentile, p in [0, 100], linear interpolation between closest ranks
    pub fn percentile(&self, p: f64) -> Result<T> {
        if !(0.0..=100.0).contains(&p) {
            return Err(LinAlgError::InvalidInput(format!(
                "percentile must be in [0, 100], got {}",
                p
            )));
        }
        let rank = p / 100.0 * (self.count() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        let frac = T::cast(rank - lo as f64);
        Ok(self.sorted[lo] + (self.sorted[hi] - self.sorted[lo]) * frac)
    }

    pub fn median(&self) -> T {
        // 50 is always inside the valid range
        self.percentile(50.0).unwrap_or_else(|_| self.mean())
    }

    pub fn summary(&self) -> StatsSummary<T> {
        let q = |p: f64| self.percentile(p).unwrap_or_else(|_| self.mean());
        StatsSummary {
            count: self.count(),
            mean: self.mean(),
            variance: self.variance(),
            std_dev: self.std_dev(),
            min: self.min(),
            p25: q(25.0),
            median: q(50.0),
            p75: q(75.0),
            p95: q(95.0),
            max: self.max(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary<T> {
    pub count: usize,
    pub mean: T,
    pub variance: T,
    pub std_dev: T,
    pub min: T,
    pub p25: T,
    pub median: T,
    pub p75: T,
    pub p95: T,
    pub max: T,
}

impl<T: Real> StatsSummary<T> {
    /// two-column table: statistic, value
    pub fn to_table(&self, title: &str) -> String {
        let mut builder = Builder::default();
        builder.push_record([title.to_string(), "value".to_string()]);
        builder.push_record(["count".to_string(), self.count.to_string()]);
        for (name, v) in [
            ("mean", self.mean),
            ("variance", self.variance),
            ("std dev", self.std_dev),
            ("min", self.min),
            ("25%", self.p25),
            ("median", self.median),
            ("75%", self.p75),
            ("95%", self.p95),
            ("max", self.max),
        ] {
            builder.push_record([name.to_string(), format!("{:.6e}", v.to_f64().unwrap_or(f64::NAN))]);
        }
        let mut table = builder.build();
        table.with(Style::modern_rounded());
        table.to_string()
    }
}
