//! Scoring Engine - maps each question kind to its scoring rule
//!
//! The engine is immutable once built and shared across concurrent
//! question tasks behind an `Arc`.

use crate::scoring::rules::{ExactChoiceRule, NumericToleranceRule, ScoringRule, DEFAULT_TOLERANCE};
use exam_bench_domain::{AnswerKind, Correctness, ModelResponse, Question, QuestionResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Scoring engine configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringEngineConfig {
    /// Absolute tolerance for free-response answers
    pub free_response_tolerance: f64,
}

impl Default for ScoringEngineConfig {
    fn default() -> Self {
        Self {
            free_response_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Applies the scoring rule registered for each answer kind
pub struct ScoringEngine {
    config: ScoringEngineConfig,
    rules: HashMap<AnswerKind, Arc<dyn ScoringRule>>,
}

impl ScoringEngine {
    /// Create a new scoring engine with the default rules
    pub fn new(config: ScoringEngineConfig) -> Self {
        let mut engine = Self {
            config,
            rules: HashMap::new(),
        };
        engine.register_default_rules();
        engine
    }

    fn register_default_rules(&mut self) {
        self.register_rule(AnswerKind::MultipleChoice, Arc::new(ExactChoiceRule));
        self.register_rule(
            AnswerKind::FreeResponse,
            Arc::new(NumericToleranceRule::new(self.config.free_response_tolerance)),
        );
    }

    /// Replace the rule for an answer kind
    pub fn register_rule(&mut self, kind: AnswerKind, rule: Arc<dyn ScoringRule>) {
        self.rules.insert(kind, rule);
    }

    /// Get the rule for an answer kind
    pub fn rule(&self, kind: AnswerKind) -> Option<Arc<dyn ScoringRule>> {
        self.rules.get(&kind).cloned()
    }

    pub fn config(&self) -> &ScoringEngineConfig {
        &self.config
    }

    /// Correctness of a response; failed responses are never scored
    pub fn correctness(&self, question: &Question, response: &ModelResponse) -> Correctness {
        if !response.success {
            return Correctness::NotApplicable;
        }

        let kind = question.kind();
        match self.rules.get(&kind) {
            Some(rule) => rule.score(response.answer.as_ref(), question.correct_answer.as_ref()),
            None => {
                debug!(?kind, "No scoring rule registered");
                Correctness::NotApplicable
            }
        }
    }

    /// Score a response into a question result
    pub fn score(&self, question: &Question, response: &ModelResponse) -> QuestionResult {
        let correctness = self.correctness(question, response);
        QuestionResult::scored(question, response, correctness)
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringEngineConfig::default())
    }
}

/// Builder for ScoringEngine
pub struct ScoringEngineBuilder {
    config: ScoringEngineConfig,
    custom_rules: HashMap<AnswerKind, Arc<dyn ScoringRule>>,
}

impl ScoringEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: ScoringEngineConfig::default(),
            custom_rules: HashMap::new(),
        }
    }

    pub fn config(mut self, config: ScoringEngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.config.free_response_tolerance = tolerance;
        self
    }

    pub fn rule(mut self, kind: AnswerKind, rule: Arc<dyn ScoringRule>) -> Self {
        self.custom_rules.insert(kind, rule);
        self
    }

    pub fn build(self) -> ScoringEngine {
        let mut engine = ScoringEngine::new(self.config);
        for (kind, rule) in self.custom_rules {
            engine.register_rule(kind, rule);
        }
        engine
    }
}

impl Default for ScoringEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
