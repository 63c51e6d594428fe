use serde::{Deserialize, Serialize};

use crate::error::{ensure_unit_interval, StrategyError};

/// Log-loss reported when every recorded true value is the same class.
pub const DEGENERATE_LOG_LOSS: f64 = 3.0;

/// Two-sided 95% standard normal quantile.
const Z_95: f64 = 1.959_963_984_540_054;

/// Probabilities are clipped to `[EPS, 1 - EPS]` before taking logs.
const LOG_LOSS_EPS: f64 = f64::EPSILON;

/// Accuracy point estimate with a 95% Wilson score interval.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AccuracyEstimate {
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ClassificationScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Every metric at one point in time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSnapshot {
    pub n_trials: usize,
    pub n_correct: usize,
    pub accuracy: Option<AccuracyEstimate>,
    pub scores: ClassificationScores,
    pub log_loss: f64,
}

/// Append-only history of `(trueval, predprob)` pairs for one model.
///
/// Nothing is aggregated on the way in; every metric is recomputed from the
/// stored sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceTracker {
    truevals: Vec<bool>,
    predprobs: Vec<f64>,
}

impl PerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, trueval: bool, predprob: f64) -> Result<(), StrategyError> {
        ensure_unit_interval("predprob", predprob)?;
        self.truevals.push(trueval);
        self.predprobs.push(predprob);
        Ok(())
    }

    pub fn truevals(&self) -> &[bool] {
        &self.truevals
    }

    pub fn predprobs(&self) -> &[f64] {
        &self.predprobs
    }

    pub fn predvals(&self) -> impl Iterator<Item = bool> + '_ {
        self.predprobs.iter().map(|p| *p > 0.5)
    }

    pub fn n_trials(&self) -> usize {
        self.truevals.len()
    }

    pub fn n_correct(&self) -> usize {
        self.truevals
            .iter()
            .zip(self.predvals())
            .filter(|(t, p)| **t == *p)
            .count()
    }

    /// `None` until at least one outcome has been recorded.
    pub fn accuracy(&self) -> Option<AccuracyEstimate> {
        let n = self.n_trials();
        if n == 0 {
            return None;
        }
        let (lower, upper) = wilson_interval(self.n_correct(), n);
        Some(AccuracyEstimate {
            estimate: self.n_correct() as f64 / n as f64,
            lower,
            upper,
        })
    }

    /// Precision, recall and F1 with `true` as the positive class. A ratio
    /// whose denominator is zero is reported as 0.
    pub fn precision_recall_f1(&self) -> ClassificationScores {
        let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
        for (t, p) in self.truevals.iter().zip(self.predvals()) {
            match (*t, p) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassificationScores {
            precision,
            recall,
            f1,
        }
    }

    /// Mean binary cross-entropy, or [`DEGENERATE_LOG_LOSS`] when the history
    /// holds a single class (including the empty history).
    pub fn log_loss(&self) -> f64 {
        let first = match self.truevals.first() {
            Some(first) => *first,
            None => return DEGENERATE_LOG_LOSS,
        };
        if self.truevals.iter().all(|t| *t == first) {
            return DEGENERATE_LOG_LOSS;
        }

        let total: f64 = self
            .truevals
            .iter()
            .zip(&self.predprobs)
            .map(|(t, p)| {
                let p = p.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
                if *t {
                    -p.ln()
                } else {
                    -(1.0 - p).ln()
                }
            })
            .sum();
        total / self.n_trials() as f64
    }

    pub fn snapshot(&self) -> PerformanceSnapshot {
        PerformanceSnapshot {
            n_trials: self.n_trials(),
            n_correct: self.n_correct(),
            accuracy: self.accuracy(),
            scores: self.precision_recall_f1(),
            log_loss: self.log_loss(),
        }
    }
}

/// Per-epoch profit, in settlement order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitSeries {
    profits: Vec<f64>,
}

impl ProfitSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, profit: f64) {
        self.profits.push(profit);
    }

    pub fn profits(&self) -> &[f64] {
        &self.profits
    }

    pub fn len(&self) -> usize {
        self.profits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profits.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.profits.iter().sum()
    }

    pub fn cumulative(&self) -> Vec<f64> {
        self.profits
            .iter()
            .scan(0.0, |acc, p| {
                *acc += p;
                Some(*acc)
            })
            .collect()
    }

    /// Sum over the trailing `window` epochs at every point in the series.
    pub fn rolling_sum(&self, window: usize) -> Vec<f64> {
        if window == 0 {
            return Vec::new();
        }
        let cumulative = self.cumulative();
        cumulative
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i >= window {
                    c - cumulative[i - window]
                } else {
                    *c
                }
            })
            .collect()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn wilson_interval(successes: usize, trials: usize) -> (f64, f64) {
    let n = trials as f64;
    let p = successes as f64 / n;
    let z2 = Z_95 * Z_95;
    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let half = Z_95 * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;
    ((center - half).max(0.0), (center + half).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn tracker(pairs: &[(bool, f64)]) -> PerformanceTracker {
        let mut t = PerformanceTracker::new();
        for (tv, pp) in pairs {
            t.update(*tv, *pp).unwrap();
        }
        t
    }

    #[test]
    fn accuracy_counts_thresholded_predictions() {
        let t = tracker(&[(true, 0.6), (false, 0.3), (true, 0.4), (false, 0.7)]);
        assert_eq!(t.n_correct(), 2);
        assert_eq!(t.n_trials(), 4);
        let acc = t.accuracy().unwrap();
        assert_eq!(acc.estimate, 0.5);
        assert!(acc.lower < 0.5 && acc.upper > 0.5);
        assert!((acc.lower + acc.upper - 1.0).abs() < EPS, "symmetric at p=0.5");
    }

    #[test]
    fn accuracy_interval_stays_in_unit_range() {
        let all_right = tracker(&[(true, 0.9); 5]);
        let acc = all_right.accuracy().unwrap();
        assert_eq!(acc.estimate, 1.0);
        assert!((acc.upper - 1.0).abs() < EPS);
        assert!(acc.lower > 0.0 && acc.lower < 1.0);

        let all_wrong = tracker(&[(false, 0.9); 5]);
        let acc = all_wrong.accuracy().unwrap();
        assert!(acc.lower.abs() < EPS);
        assert!(acc.upper > 0.0 && acc.upper < 1.0);
    }

    #[test]
    fn wilson_matches_reference_value() {
        // 8 of 10: textbook Wilson interval (0.4902, 0.9433).
        let (l, u) = wilson_interval(8, 10);
        assert!((l - 0.4902).abs() < 1e-3, "l={l}");
        assert!((u - 0.9433).abs() < 1e-3, "u={u}");
    }

    #[test]
    fn empty_tracker() {
        let t = PerformanceTracker::new();
        assert!(t.accuracy().is_none());
        assert_eq!(t.precision_recall_f1(), ClassificationScores::default());
        assert_eq!(t.log_loss(), DEGENERATE_LOG_LOSS);
    }

    #[test]
    fn precision_recall_f1_values() {
        // tp=2 (0.8, 0.7), fp=1 (0.9 on false), fn=1 (0.2 on true), tn=1
        let t = tracker(&[
            (true, 0.8),
            (true, 0.7),
            (false, 0.9),
            (true, 0.2),
            (false, 0.1),
        ]);
        let s = t.precision_recall_f1();
        assert!((s.precision - 2.0 / 3.0).abs() < EPS);
        assert!((s.recall - 2.0 / 3.0).abs() < EPS);
        assert!((s.f1 - 2.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn zero_division_reports_zero() {
        let t = tracker(&[(false, 0.1), (false, 0.2), (true, 0.3)]);
        let s = t.precision_recall_f1();
        assert_eq!(s.precision, 0.0);
        assert_eq!(s.recall, 0.0);
        assert_eq!(s.f1, 0.0);
    }

    #[test]
    fn log_loss_single_class_is_sentinel() {
        let t = tracker(&[(true, 0.6), (true, 0.1), (true, 0.99)]);
        assert_eq!(t.log_loss(), 3.0);
        let t = tracker(&[(false, 0.6), (false, 0.2)]);
        assert_eq!(t.log_loss(), 3.0);
    }

    #[test]
    fn log_loss_mixed_classes() {
        let t = tracker(&[(true, 0.8), (false, 0.4)]);
        let expected = (-(0.8f64).ln() - (0.6f64).ln()) / 2.0;
        assert!((t.log_loss() - expected).abs() < EPS);
    }

    #[test]
    fn log_loss_clips_certain_mistakes() {
        let t = tracker(&[(true, 0.0), (false, 0.0)]);
        let loss = t.log_loss();
        assert!(loss.is_finite());
        assert!(loss > 10.0);
    }

    #[test]
    fn update_rejects_bad_probability() {
        let mut t = PerformanceTracker::new();
        assert!(t.update(true, 1.5).is_err());
        assert!(t.update(true, f64::NAN).is_err());
        assert_eq!(t.n_trials(), 0, "rejected updates leave history untouched");
    }

    #[test]
    fn metrics_recompute_from_history() {
        let mut t = tracker(&[(true, 0.6), (false, 0.3)]);
        assert_eq!(t.accuracy().unwrap().estimate, 1.0);
        t.update(true, 0.2).unwrap();
        assert!((t.accuracy().unwrap().estimate - 2.0 / 3.0).abs() < EPS);
        let snap = t.snapshot();
        assert_eq!(snap.n_trials, 3);
        assert_eq!(snap.n_correct, 2);
        assert_eq!(t.truevals(), &[true, false, true]);
        assert_eq!(t.predprobs(), &[0.6, 0.3, 0.2]);
    }

    #[test]
    fn profit_series_aggregates() {
        let mut s = ProfitSeries::new();
        assert!(s.is_empty());
        for p in [1.0, -2.0, 3.0, 4.0] {
            s.push(p);
        }
        assert_eq!(s.len(), 4);
        assert_eq!(s.total(), 6.0);
        assert_eq!(s.cumulative(), vec![1.0, -1.0, 2.0, 6.0]);
        assert_eq!(s.rolling_sum(2), vec![1.0, -1.0, 1.0, 7.0]);
        assert!(s.rolling_sum(0).is_empty());
    }

    #[test]
    fn snapshot_serializes() {
        let t = tracker(&[(true, 0.6), (false, 0.7)]);
        let json = serde_json::to_value(t.snapshot()).unwrap();
        assert_eq!(json["n_trials"], 2);
        assert_eq!(json["accuracy"]["estimate"], 0.5);
    }
}
