use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};

use parley_core::config::ParleyConfig;
use parley_core::session::{SalesStatus, SimulationResult};
use parley_reasoning::{Assignment, PersonaSet};

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub generated_at: DateTime<Local>,
    pub provider: String,
    pub model: String,
    pub seed: Option<u64>,
    pub num_visits: u32,
    pub num_turns_per_visit: u32,
    pub visit_interval_days: u32,
    pub campaigns: usize,
    pub successes: usize,
    pub failures: usize,
    pub pending: usize,
}

/// Everything a run produced, written as one JSON document.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub metadata: Metadata,
    pub personas: &'a PersonaSet,
    pub assignments: &'a [Assignment],
    pub simulation_results: &'a [SimulationResult],
}

impl<'a> Report<'a> {
    pub fn new(
        config: &ParleyConfig,
        seed: Option<u64>,
        personas: &'a PersonaSet,
        assignments: &'a [Assignment],
        simulation_results: &'a [SimulationResult],
    ) -> Self {
        let count = |status: SalesStatus| {
            simulation_results
                .iter()
                .filter(|r| r.final_status == status)
                .count()
        };
        Self {
            metadata: Metadata {
                generated_at: Local::now(),
                provider: config.llm.provider.clone(),
                model: config.llm.model.clone(),
                seed,
                num_visits: config.simulation.num_visits,
                num_turns_per_visit: config.simulation.num_turns_per_visit,
                visit_interval_days: config.simulation.visit_interval_days,
                campaigns: simulation_results.len(),
                successes: count(SalesStatus::Success),
                failures: count(SalesStatus::Failed),
                pending: count(SalesStatus::Pending),
            },
            personas,
            assignments,
            simulation_results,
        }
    }

    /// Writes `negotiation_records_<timestamp>.json` under `dir`, creating it if needed.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        let path = dir.join(format!(
            "negotiation_records_{}.json",
            self.metadata.generated_at.format("%Y%m%d_%H%M%S")
        ));
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_round_trips_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let personas = PersonaSet::default();
        let report = Report::new(&ParleyConfig::default(), Some(7), &personas, &[], &[]);
        let path = report.write(&dir.path().join("out")).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("negotiation_records_"));
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["metadata"]["seed"], 7);
        assert_eq!(value["metadata"]["campaigns"], 0);
        assert!(value["simulation_results"].as_array().unwrap().is_empty());
        assert!(value["personas"]["sellers"].is_array());
    }
}
