//! Scoring properties that must hold for every prompt
//!
//! Bounds, empty-input handling, determinism, case-insensitivity and the
//! ordering of vague versus specific prompts, checked through the public
//! engine API with and without a trained model.

use clarifier::classifier::{
    sigmoid, FeatureVector, LinearClassifier, StatisticalScorer, TfIdfVectorizer, TrainConfig,
};
use clarifier::engine::{AnalysisMode, EngineSettings, HybridDecisionEngine};
use clarifier::heuristics::HeuristicScorer;
use clarifier::models::{IssueSeverity, IssueType, ScoreSource, TrainingSample};
use tokio_util::sync::CancellationToken;

const PROMPTS: &[&str] = &[
    "",
    "   \n\t ",
    "make something",
    "fix it",
    "help",
    "build a website",
    "explain how the app works",
    "fix the TypeError in src/auth/login.ts on line 42",
    "In src/components/LoginForm.tsx, refactor handleSubmit to use async/await, add try/catch, and display validation errors",
    "Add a POST /api/users endpoint in Express that validates email with zod and returns 201",
    "Why does my Rust borrow checker complain about a mutable reference in a loop?",
    "ÜBER-LONG prompt with ünïcödé and emoji 🚀 and symbols {}[]()<>!@#$%^&*",
    "a",
    "c++ c# .net",
];

fn sample(prompt: &str, score: i64) -> TrainingSample {
    TrainingSample {
        prompt: prompt.to_string(),
        vagueness_score: score,
        intent_category: "unknown".to_string(),
        missing_elements: vec![],
        reasoning: "labeled".to_string(),
    }
}

fn trained_model() -> StatisticalScorer {
    let samples = vec![
        sample("make something", 90),
        sample("build an app", 85),
        sample("help me with my project", 92),
        sample("fix it", 95),
        sample("do the thing", 88),
        sample("create a website", 80),
        sample("fix TypeError in src/auth/login.ts line 42", 5),
        sample("refactor handleSubmit in LoginForm.tsx to async await", 8),
        sample("add POST /api/users endpoint with zod validation", 10),
        sample("update postgres index on users email column", 12),
        sample("configure eslint rule no-unused-vars in .eslintrc.json", 15),
        sample("explain how tokio select handles cancellation", 25),
    ];
    let config = TrainConfig {
        learning_rate: 2.0,
        epochs: 300,
        ..Default::default()
    };
    StatisticalScorer::train(&samples, &config).unwrap().0
}

fn engines() -> Vec<HybridDecisionEngine> {
    vec![
        HybridDecisionEngine::default(),
        HybridDecisionEngine::default().with_model(trained_model()),
        HybridDecisionEngine::new(EngineSettings {
            mode: AnalysisMode::Blended,
            ..Default::default()
        })
        .with_model(trained_model()),
    ]
}

#[test]
fn test_score_and_confidence_bounds() {
    let cancel = CancellationToken::new();
    for engine in engines() {
        for prompt in PROMPTS {
            for mode in [
                AnalysisMode::Auto,
                AnalysisMode::Blended,
                AnalysisMode::HeuristicOnly,
                AnalysisMode::MlOnly,
                AnalysisMode::ForceJudge,
            ] {
                let r = engine.analyze_with(prompt, mode, &cancel);
                assert!(r.score <= 100, "{prompt:?} {mode}");
                assert!((0.0..=1.0).contains(&r.confidence), "{prompt:?} {mode}");
                assert_eq!(r.is_vague, r.score >= 30, "{prompt:?} {mode}");
            }
        }
    }
}

#[test]
fn test_empty_prompt_shortcut() {
    for engine in engines() {
        for prompt in ["", "   ", "\n\t"] {
            let r = engine.analyze(prompt);
            assert_eq!(r.score, 100);
            assert!(r.is_vague);
            assert_eq!(r.issues.len(), 1);
            assert_eq!(r.issues[0].issue_type, IssueType::MissingContext);
            assert_eq!(r.issues[0].severity, IssueSeverity::High);
        }
    }
}

#[test]
fn test_deterministic() {
    for engine in engines() {
        for prompt in PROMPTS {
            let a = engine.analyze(prompt);
            let b = engine.analyze(prompt);
            assert_eq!(a.score, b.score);
            assert_eq!(a.issues.len(), b.issues.len());
            assert_eq!(a.source, b.source);
        }
    }
}

#[test]
fn test_case_insensitive() {
    for engine in engines() {
        for prompt in PROMPTS {
            let base = engine.analyze(prompt).score;
            assert_eq!(engine.analyze(&prompt.to_lowercase()).score, base, "{prompt:?}");
            assert_eq!(engine.analyze(&prompt.to_uppercase()).score, base, "{prompt:?}");
        }
    }
}

#[test]
fn test_case_insensitive_with_expanding_uppercase() {
    for engine in engines() {
        for prompt in ["\u{fb01}x it", "\u{fb01}x the stra\u{df}e lookup in src/geo.rs"] {
            let base = engine.analyze(prompt).score;
            assert_eq!(engine.analyze(&prompt.to_uppercase()).score, base, "{prompt:?}");
            assert_eq!(engine.analyze(&prompt.to_lowercase()).score, base, "{prompt:?}");
        }
    }
}

#[test]
fn test_adding_detail_lowers_heuristic_score() {
    let scorer = HeuristicScorer::new();
    let cases = [
        ("fix it", "fix it in src/auth/login.ts"),
        ("fix it", "fix it with a GET /api/users request"),
        ("fix it", "fix it in react"),
        ("make something", "make something in python"),
        ("build a website", "build a website with next.js and postgres"),
    ];
    for (bare, detailed) in cases {
        let bare_score = scorer.score(bare).score;
        let detailed_score = scorer.score(detailed).score;
        assert!(
            detailed_score < bare_score,
            "{detailed:?} ({detailed_score}) should score below {bare:?} ({bare_score})"
        );
    }
}

#[test]
fn test_vague_outranks_specific() {
    for engine in engines() {
        let vague = engine.analyze("fix it").score;
        let specific = engine
            .analyze("fix the TypeError in src/auth/login.ts on line 42")
            .score;
        assert!(vague > specific, "{vague} <= {specific}");
    }
}

#[test]
fn test_example_scenarios() {
    let engine = HybridDecisionEngine::default();

    let r = engine.analyze("make something");
    assert!(r.score >= 65, "{}", r.score);
    assert!(r.has_issue(IssueType::VagueVerb));
    assert!(r.has_issue(IssueType::MissingContext));
    assert_eq!(r.source, ScoreSource::Rules);

    let r = engine.analyze(
        "In src/components/LoginForm.tsx, refactor handleSubmit to use async/await, add try/catch, and display validation errors",
    );
    assert_eq!(r.score, 0);
    assert!(!r.is_vague);

    let v = TfIdfVectorizer::fit(&["fix the bug", "fix the error", "create api"]);
    assert!(v.idf("create").unwrap() > v.idf("fix").unwrap());

    assert_eq!(sigmoid(0.0), 0.5);
}

#[test]
fn test_at_most_one_issue_per_type() {
    let scorer = HeuristicScorer::new();
    for prompt in PROMPTS.iter().chain(&["teach me about the app", "explain the system"]) {
        let r = scorer.score(prompt);
        for t in [IssueType::VagueVerb, IssueType::MissingContext, IssueType::UnclearScope] {
            assert!(r.issues.iter().filter(|i| i.issue_type == t).count() <= 1, "{prompt:?}");
        }
    }
}

#[test]
fn test_model_round_trip_predictions_bit_identical() {
    let model = trained_model();
    let restored = StatisticalScorer::from_json(&model.to_json().unwrap()).unwrap();

    let size = model.vectorizer().vocabulary_size();
    let battery: Vec<FeatureVector> = (0..8)
        .map(|k| FeatureVector::new((0..size).map(|i| ((i * 7 + k * 3) % 5) as f64 * 0.1).collect()))
        .chain(std::iter::once(FeatureVector::zeros(size)))
        .collect();
    for x in &battery {
        assert_eq!(
            model.classifier().predict(x).to_bits(),
            restored.classifier().predict(x).to_bits()
        );
    }
    for prompt in PROMPTS {
        assert_eq!(
            model.vectorizer().transform(prompt),
            restored.vectorizer().transform(prompt)
        );
    }
}

#[test]
fn test_training_converges_on_separable_data() {
    let features: Vec<FeatureVector> = (0..40)
        .map(|i| {
            let positive = i % 2 == 0;
            let a = if positive { 1.0 } else { 0.0 };
            FeatureVector::new(vec![a, 1.0 - a, (i % 5) as f64 * 0.01])
        })
        .collect();
    let labels: Vec<u8> = (0..40).map(|i| u8::from(i % 2 == 0)).collect();
    let (clf, history) = LinearClassifier::train(&features, &labels, &TrainConfig::default()).unwrap();
    assert!(history.final_loss <= history.losses[0]);
    assert!(clf.predict(&features[0]) > clf.predict(&features[1]));
}
