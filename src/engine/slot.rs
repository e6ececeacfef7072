//! Swappable reference to the active statistical model
//!
//! Readers clone the `Arc` under a short read lock and score without holding
//! it, so a swap never blocks on in-flight scoring and an in-flight call keeps
//! the model it started with.

use crate::classifier::StatisticalScorer;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
struct Versioned {
    generation: u64,
    model: Option<Arc<StatisticalScorer>>,
}

/// Holds at most one trained model; replaced in a single step
#[derive(Debug, Default)]
pub struct ModelSlot {
    inner: RwLock<Versioned>,
}

impl ModelSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_model(model: StatisticalScorer) -> Self {
        let slot = Self::empty();
        slot.swap(model);
        slot
    }

    /// The current model, if any
    pub fn load(&self) -> Option<Arc<StatisticalScorer>> {
        self.load_versioned().1
    }

    /// The current model together with the generation it was installed at
    pub fn load_versioned(&self) -> (u64, Option<Arc<StatisticalScorer>>) {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        (guard.generation, guard.model.clone())
    }

    /// Install a new model and return the one it replaced
    pub fn swap(&self, model: StatisticalScorer) -> Option<Arc<StatisticalScorer>> {
        self.replace(Some(Arc::new(model))).1
    }

    /// Install a new model and return the generation it was installed at
    pub fn install(&self, model: StatisticalScorer) -> u64 {
        self.replace(Some(Arc::new(model))).0
    }

    /// Remove the model; scoring falls back to rules
    pub fn clear(&self) -> Option<Arc<StatisticalScorer>> {
        self.replace(None).1
    }

    fn replace(
        &self,
        model: Option<Arc<StatisticalScorer>>,
    ) -> (u64, Option<Arc<StatisticalScorer>>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.generation += 1;
        let previous = std::mem::replace(&mut guard.model, model);
        (guard.generation, previous)
    }

    /// Bumped on every swap or clear
    pub fn generation(&self) -> u64 {
        self.load_versioned().0
    }

    pub fn is_loaded(&self) -> bool {
        self.load().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TrainConfig;
    use crate::models::TrainingSample;

    fn model(prompts: &[(&str, i64)]) -> StatisticalScorer {
        let samples: Vec<TrainingSample> = prompts
            .iter()
            .map(|(p, s)| TrainingSample {
                prompt: p.to_string(),
                vagueness_score: *s,
                intent_category: "unknown".into(),
                missing_elements: vec![],
                reasoning: "r".into(),
            })
            .collect();
        let config = TrainConfig {
            epochs: 5,
            ..Default::default()
        };
        StatisticalScorer::train(&samples, &config).unwrap().0
    }

    #[test]
    fn test_empty_slot() {
        let slot = ModelSlot::empty();
        assert!(!slot.is_loaded());
        assert_eq!(slot.generation(), 0);
    }

    #[test]
    fn test_swap_returns_previous_and_bumps_generation() {
        let slot = ModelSlot::with_model(model(&[("make it", 90), ("fix a.rs", 10)]));
        assert_eq!(slot.generation(), 1);

        let held = slot.load().unwrap();
        let previous = slot.swap(model(&[("help", 95), ("add GET /users", 5)])).unwrap();
        assert!(Arc::ptr_eq(&held, &previous));
        assert_eq!(slot.generation(), 2);
        // A reader holding the old model keeps a consistent view
        assert_eq!(held.vectorizer().vocabulary(), previous.vectorizer().vocabulary());
        assert!(!Arc::ptr_eq(&held, &slot.load().unwrap()));

        assert!(slot.clear().is_some());
        assert!(!slot.is_loaded());
        assert_eq!(slot.generation(), 3);
    }

    #[test]
    fn test_concurrent_installs_get_distinct_generations() {
        let slot = ModelSlot::empty();
        let trained = model(&[("make it", 90), ("fix a.rs", 10)]);
        let mut generations: Vec<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let (slot, trained) = (&slot, trained.clone());
                    scope.spawn(move || slot.install(trained))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        generations.sort_unstable();
        assert_eq!(generations, (1..=8).collect::<Vec<u64>>());
        assert_eq!(slot.generation(), 8);
    }
}
