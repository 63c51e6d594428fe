use std::sync::Arc;

use async_trait::async_trait;
use stakecast_models::decision::DirectionalSignal;
use stakecast_models::direction::{Direction, PerDirection};

use crate::error::{AgentError, MarketError};

/// A trained binary model. Only inference is needed here.
pub trait Classifier: Send + Sync {
    /// Probability in [0, 1] that this model's event happens.
    fn predict_probability(&self, features: &[f64]) -> f64;
}

/// Supplies the feature vector for the slot being predicted.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    async fn features(&self, target_slot: u64) -> Result<Vec<f64>, MarketError>;
}

#[derive(Clone)]
enum Scorer {
    /// One model per event. The down model predicts the down event, so its
    /// output is already `prob_down` and needs no inversion.
    Directional(PerDirection<Arc<dyn Classifier>>),
    /// One model whose output is `prob_up`; `prob_down` is its complement.
    Blended(Arc<dyn Classifier>),
}

/// The models that produce a tick's directional signal, plus the features
/// they score.
#[derive(Clone)]
pub struct DirectionalModels {
    scorer: Scorer,
    features: Arc<dyn FeatureSource>,
}

impl DirectionalModels {
    pub fn new(
        up: Arc<dyn Classifier>,
        down: Arc<dyn Classifier>,
        features: Arc<dyn FeatureSource>,
    ) -> Self {
        Self {
            scorer: Scorer::Directional(PerDirection::new(up, down)),
            features,
        }
    }

    /// A single model scored once per tick. Its signal never conflicts, so
    /// the merged probability is the model's own output.
    pub fn blended(model: Arc<dyn Classifier>, features: Arc<dyn FeatureSource>) -> Self {
        Self {
            scorer: Scorer::Blended(model),
            features,
        }
    }

    pub fn is_blended(&self) -> bool {
        matches!(self.scorer, Scorer::Blended(_))
    }

    pub async fn signal(&self, target_slot: u64) -> Result<DirectionalSignal, AgentError> {
        let features = self.features.features(target_slot).await?;
        let signal = match &self.scorer {
            Scorer::Directional(models) => {
                let probs = models.map(|m| m.predict_probability(&features));
                DirectionalSignal {
                    prob_up: *probs.get(Direction::Up),
                    prob_down: *probs.get(Direction::Down),
                }
            }
            Scorer::Blended(model) => {
                let prob_up = model.predict_probability(&features);
                DirectionalSignal {
                    prob_up,
                    prob_down: 1.0 - prob_up,
                }
            }
        };
        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedClassifier, StaticFeatures};
    use stakecast_strategy::merge;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MeanClassifier;

    impl Classifier for MeanClassifier {
        fn predict_probability(&self, features: &[f64]) -> f64 {
            features.iter().sum::<f64>() / features.len() as f64
        }
    }

    #[tokio::test]
    async fn signal_scores_both_models_on_same_features() {
        let models = DirectionalModels::new(
            Arc::new(MeanClassifier),
            Arc::new(FixedClassifier(0.25)),
            Arc::new(StaticFeatures(vec![0.2, 0.4, 0.9])),
        );
        let signal = models.signal(600).await.unwrap();
        assert!((signal.prob_up - 0.5).abs() < 1e-12);
        assert_eq!(signal.prob_down, 0.25);
    }

    struct CountingClassifier {
        prob: f64,
        calls: AtomicUsize,
    }

    impl Classifier for CountingClassifier {
        fn predict_probability(&self, _features: &[f64]) -> f64 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prob
        }
    }

    #[tokio::test]
    async fn blended_model_scored_once_and_complemented() {
        let model = Arc::new(CountingClassifier {
            prob: 0.8,
            calls: AtomicUsize::new(0),
        });
        let models = DirectionalModels::blended(model.clone(), Arc::new(StaticFeatures(vec![1.0])));
        assert!(models.is_blended());

        let signal = models.signal(600).await.unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(signal.prob_up, 0.8);
        assert!((signal.prob_down - 0.2).abs() < 1e-12);
    }

    #[tokio::test]
    async fn blended_signal_merges_to_the_model_output() {
        for p in [0.0, 0.2, 0.49, 0.5, 0.51, 0.8, 1.0] {
            let models = DirectionalModels::blended(
                Arc::new(FixedClassifier(p)),
                Arc::new(StaticFeatures(vec![])),
            );
            let signal = models.signal(600).await.unwrap();
            let decision = merge(signal.prob_up, signal.prob_down, 0.1).unwrap();
            assert!(!decision.conflict, "p={p}");
            assert!((decision.prob_up_merged - p).abs() < 1e-12, "p={p}");
        }
    }

    #[tokio::test]
    async fn feature_failure_surfaces_as_market_error() {
        struct Broken;

        #[async_trait]
        impl FeatureSource for Broken {
            async fn features(&self, _target_slot: u64) -> Result<Vec<f64>, MarketError> {
                Err(MarketError::Features("candles missing".to_string()))
            }
        }

        let models = DirectionalModels::new(
            Arc::new(FixedClassifier(0.5)),
            Arc::new(FixedClassifier(0.5)),
            Arc::new(Broken),
        );
        assert!(matches!(
            models.signal(600).await,
            Err(AgentError::Market(MarketError::Features(_)))
        ));
    }
}
