use log::{debug, info};

use crate::processing::projectile::ModelStage;

pub struct LogManager;

impl LogManager {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
    }

    pub fn record_stage(&self, stage: ModelStage, detail: &str) {
        info!("{:?}: {}", stage, detail);
    }

    /// Point counts after each cleaning step, in pipeline order.
    pub fn record_counts(&self, counts: &[(&str, usize)]) {
        let line = counts
            .iter()
            .map(|(label, count)| format!("{} {}", label, count))
            .collect::<Vec<_>>()
            .join(", ");
        debug!("cleaning: {}", line);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}
