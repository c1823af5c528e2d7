//! Headless driver for the flocking engine: settings layering and JSON-lines
//! tick reports for whatever renders or analyses the flock downstream.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use boid_core::{AgentSnapshot, FlockSettings, Model};
use serde::{Deserialize, Serialize};

/// One line of runner output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub polarization: f64,
    pub agents: Vec<AgentSnapshot>,
}

impl TickReport {
    pub fn capture(model: &Model) -> Self {
        Self {
            tick: model.steps(),
            polarization: model.polarization(),
            agents: model.agents(),
        }
    }
}

/// Final state of a run, logged once the last tick is written
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub seed: u64,
    pub polarization: f64,
    pub reports: usize,
}

/// Command-line values that take precedence over the settings file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub population: Option<usize>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub seed: Option<u64>,
    pub no_torus: bool,
}

impl Overrides {
    pub fn apply(&self, mut settings: FlockSettings) -> FlockSettings {
        if let Some(population) = self.population {
            settings.population = population;
        }
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        if self.no_torus {
            settings.torus = false;
        }
        settings
    }
}

/// Read a JSON settings file, or start from the defaults when none is given.
pub fn load_settings(path: Option<&Path>) -> Result<FlockSettings> {
    let Some(path) = path else {
        return Ok(FlockSettings::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    FlockSettings::from_json(&text)
        .with_context(|| format!("Invalid settings in {}", path.display()))
}

/// Step `model` for `ticks` ticks, writing a report of the initial state,
/// every `every`-th tick and the final tick.
pub fn run<W: Write>(model: &mut Model, ticks: u64, every: u64, out: &mut W) -> Result<RunSummary> {
    let every = every.max(1);
    let mut reports = 0usize;

    write_report(out, &TickReport::capture(model))?;
    reports += 1;

    for _ in 0..ticks {
        model
            .step()
            .with_context(|| format!("Tick {} failed", model.steps() + 1))?;
        let tick = model.steps();
        if tick % every == 0 || tick == ticks {
            write_report(out, &TickReport::capture(model))?;
            reports += 1;
        }
    }
    out.flush().context("Failed to flush reports")?;

    Ok(RunSummary {
        ticks: model.steps(),
        seed: model.seed(),
        polarization: model.polarization(),
        reports,
    })
}

fn write_report<W: Write>(out: &mut W, report: &TickReport) -> Result<()> {
    serde_json::to_writer(&mut *out, report).context("Failed to encode tick report")?;
    out.write_all(b"\n").context("Failed to write tick report")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_take_precedence() {
        let overrides = Overrides {
            population: Some(7),
            seed: Some(99),
            no_torus: true,
            ..Overrides::default()
        };
        let settings = overrides.apply(FlockSettings::default());
        assert_eq!(settings.population, 7);
        assert_eq!(settings.seed, Some(99));
        assert!(!settings.torus);
        assert_eq!(settings.width, 100.0);
    }

    #[test]
    fn test_missing_path_means_defaults() {
        assert_eq!(load_settings(None).unwrap(), FlockSettings::default());
    }
}
