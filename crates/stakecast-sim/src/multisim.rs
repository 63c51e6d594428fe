use rust_decimal::Decimal;
use serde::Serialize;
use stakecast_models::decision::Approach;
use stakecast_models::history::EpochObservation;
use stakecast_models::ConfigError;
use stakecast_strategy::{AccuracyEstimate, ClassificationScores};
use tracing::info;
use uuid::Uuid;

use crate::config::{SimConfig, SweepSettings};
use crate::engine::{SimEngine, SimSummary};
use crate::error::SimError;

/// One combination of swept parameters.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct SweepPoint {
    pub approach: Approach,
    pub confidence_threshold: f64,
    pub stake_budget: Decimal,
    pub others_accuracy: f64,
}

impl SweepPoint {
    /// The base config with this point's values written over it.
    pub fn apply(&self, base: &SimConfig) -> SimConfig {
        let mut config = base.clone();
        config.staking.approach = self.approach;
        config.staking.confidence_threshold = self.confidence_threshold;
        config.staking.stake_budget = self.stake_budget;
        config.sim.others_accuracy = self.others_accuracy;
        config.multisim = None;
        config
    }
}

/// Headline metrics of one run in a sweep.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SweepRow {
    pub run: usize,
    pub run_id: Uuid,
    pub point: SweepPoint,
    pub epochs: usize,
    pub trusted: usize,
    pub conflicts: usize,
    pub accuracy: Option<AccuracyEstimate>,
    pub scores: ClassificationScores,
    pub log_loss: f64,
    pub total_profit: f64,
}

impl SweepRow {
    fn new(run: usize, point: SweepPoint, summary: SimSummary) -> Self {
        Self {
            run,
            run_id: summary.run_id,
            point,
            epochs: summary.epochs,
            trusted: summary.trusted,
            conflicts: summary.conflicts,
            accuracy: summary.merged.accuracy,
            scores: summary.merged.scores,
            log_loss: summary.merged.log_loss,
            total_profit: summary.total_profit,
        }
    }
}

/// Cross product of the sweep lists, approach varying slowest.
pub fn sweep_points(base: &SimConfig, sweep: &SweepSettings) -> Vec<SweepPoint> {
    fn or_base<T: Copy>(values: &[T], base: T) -> Vec<T> {
        if values.is_empty() {
            vec![base]
        } else {
            values.to_vec()
        }
    }

    let approaches = or_base(&sweep.approaches, base.staking.approach);
    let thresholds = or_base(
        &sweep.confidence_thresholds,
        base.staking.confidence_threshold,
    );
    let budgets = or_base(&sweep.stake_budgets, base.staking.stake_budget);
    let accuracies = or_base(&sweep.others_accuracies, base.sim.others_accuracy);

    let mut points =
        Vec::with_capacity(approaches.len() * thresholds.len() * budgets.len() * accuracies.len());
    for &approach in &approaches {
        for &confidence_threshold in &thresholds {
            for &stake_budget in &budgets {
                for &others_accuracy in &accuracies {
                    points.push(SweepPoint {
                        approach,
                        confidence_threshold,
                        stake_budget,
                        others_accuracy,
                    });
                }
            }
        }
    }
    points
}

/// Replays one history once per sweep point, each run under its own id.
pub struct MultiSimEngine {
    points: Vec<SweepPoint>,
    engines: Vec<SimEngine>,
}

impl MultiSimEngine {
    /// Every point is validated up front so a bad candidate fails before
    /// any replay starts.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        let sweep = config.multisim.clone().ok_or(ConfigError::Invalid {
            field: "multisim",
            reason: "no [multisim] table".to_string(),
        })?;
        let points = sweep_points(&config, &sweep);
        let engines = points
            .iter()
            .map(|point| SimEngine::new(point.apply(&config)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { points, engines })
    }

    pub fn points(&self) -> &[SweepPoint] {
        &self.points
    }

    pub fn run(&self, observations: &[EpochObservation]) -> Result<Vec<SweepRow>, SimError> {
        info!(runs = self.engines.len(), "Multisim: start");
        let mut rows = Vec::with_capacity(self.engines.len());
        for (run, (point, engine)) in self.points.iter().zip(&self.engines).enumerate() {
            info!(
                run,
                run_id = %engine.run_id(),
                approach = %point.approach,
                confidence_threshold = point.confidence_threshold,
                stake_budget = %point.stake_budget,
                others_accuracy = point.others_accuracy,
                "Multisim run: start"
            );
            let summary = engine.run(observations)?;
            rows.push(SweepRow::new(run, *point, summary));
        }
        info!(runs = rows.len(), "Multisim: done");
        Ok(rows)
    }
}
