/// Mean/standard-deviation based cleaning of plain numeric sequences.
#[derive(Debug, Clone, Copy)]
pub struct StatisticalFilter {
    num_std_devs: f64,
}

impl StatisticalFilter {
    pub fn new(num_std_devs: f64) -> Self {
        Self { num_std_devs }
    }

    pub fn remove_anomalies(&self, values: &[f64]) -> Vec<f64> {
        Self::remove_anomalies_with(values, self.num_std_devs)
    }

    /// Keeps values strictly closer than `num_std_devs` population standard
    /// deviations to the mean. A zero-spread sequence is returned whole.
    pub fn remove_anomalies_with(values: &[f64], num_std_devs: f64) -> Vec<f64> {
        if values.is_empty() {
            return Vec::new();
        }
        let mean = Self::average(values);
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        let std_dev = variance.sqrt();
        if std_dev == 0.0 {
            return values.to_vec();
        }
        values
            .iter()
            .copied()
            .filter(|v| (v - mean).abs() < num_std_devs * std_dev)
            .collect()
    }

    pub fn average(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Median; an even count averages the two middle values. 0.0 when empty.
    pub fn median(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        }
    }

    /// Returns `(median, mad)`.
    pub fn median_absolute_deviation(values: &[f64]) -> (f64, f64) {
        let median = Self::median(values);
        let deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
        (median, Self::median(&deviations))
    }
}

impl Default for StatisticalFilter {
    fn default() -> Self {
        Self::new(3.0)
    }
}
