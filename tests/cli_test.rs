//! End-to-end tests for the clarifier binary
//!
//! Every run gets its own HOME and XDG directories so a developer's real
//! config, model or API keys never leak into the results.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn clarifier(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_clarifier"));
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("XDG_DATA_HOME", home.join(".local/share"))
        .env("CLARIFIER_MODEL_PATH", home.join("no-model.json"))
        .env_remove("RUST_LOG")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENROUTER_API_KEY");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    clarifier(home).args(args).output().unwrap()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("bad JSON ({e}): {stdout}"))
}

fn write_corpus(path: &Path) {
    let mut records = Vec::new();
    for (prompt, score) in [
        ("make something", 90),
        ("build an app", 85),
        ("help me", 95),
        ("fix it", 92),
        ("do the thing", 88),
        ("fix TypeError in src/auth/login.ts line 42", 5),
        ("add POST /api/users endpoint with zod validation", 10),
        ("refactor handleSubmit in LoginForm.tsx to async await", 8),
        ("index the users email column in postgres", 12),
        ("configure eslint no-unused-vars in .eslintrc.json", 15),
    ] {
        records.push(serde_json::json!({
            "prompt": prompt,
            "vaguenessScore": score,
            "intentCategory": "build",
            "missingElements": [],
            "reasoning": "labeled",
        }));
    }
    std::fs::write(path, serde_json::to_string_pretty(&records).unwrap()).unwrap();
}

#[test]
fn test_analyze_json() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["analyze", "make something", "--format", "json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json = stdout_json(&output);
    assert_eq!(json["source"], "rules");
    assert_eq!(json["isVague"], true);
    assert!(json["score"].as_u64().unwrap() >= 65);
    let types: Vec<&str> = json["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|i| i["type"].as_str())
        .collect();
    assert!(types.contains(&"VAGUE_VERB"), "{types:?}");
}

#[test]
fn test_analyze_text_output() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["analyze", "fix it"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Vagueness"), "{stdout}");
    assert!(stdout.contains("vague"), "{stdout}");
}

#[test]
fn test_analyze_reads_stdin() {
    let home = tempfile::tempdir().unwrap();
    let mut child = clarifier(home.path())
        .args(["analyze", "-", "-f", "json"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"   \n").unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["score"], 100);
    assert_eq!(json["issues"][0]["type"], "MISSING_CONTEXT");
    assert_eq!(json["issues"][0]["severity"], "HIGH");
}

#[test]
fn test_analyze_batch_and_fail_on_vague() {
    let home = tempfile::tempdir().unwrap();
    let batch = home.path().join("prompts.txt");
    std::fs::write(
        &batch,
        "make something\n\nIn src/components/LoginForm.tsx, refactor handleSubmit to use async/await, add try/catch, and display validation errors\n",
    )
    .unwrap();
    let batch = batch.to_str().unwrap();

    let output = run(home.path(), &["analyze", "--batch", batch, "-f", "json"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["prompt"], "make something");
    assert_eq!(items[1]["result"]["score"], 0);

    let output = run(home.path(), &["analyze", "--batch", batch, "--fail-on-vague"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_analyze_rejects_unknown_mode() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["analyze", "fix it", "--mode", "sometimes"]);
    assert!(!output.status.success());
}

#[test]
fn test_train_then_evaluate_then_analyze() {
    let home = tempfile::tempdir().unwrap();
    let corpus = home.path().join("corpus.json");
    let model = home.path().join("models/model.json");
    write_corpus(&corpus);
    let (corpus, model_arg) = (corpus.to_str().unwrap(), model.to_str().unwrap());

    let output = run(
        home.path(),
        &["train", corpus, "--output", model_arg, "--epochs", "100", "-f", "json"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(model.exists());
    let json = stdout_json(&output);
    assert_eq!(json["trainSamples"], 8);
    assert_eq!(json["valSamples"], 2);
    assert!(json["vocabularySize"].as_u64().unwrap() > 0);

    let output = run(home.path(), &["evaluate", corpus, "--model", model_arg, "-f", "json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json = stdout_json(&output);
    assert_eq!(json["samples"], 10);
    let accuracy = json["accuracy"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&accuracy));

    let output = run(
        home.path(),
        &["analyze", "make something", "--model", model_arg, "--mode", "ml-only", "-f", "json"],
    );
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["source"], "ml");
}

#[test]
fn test_train_rejects_invalid_corpus() {
    let home = tempfile::tempdir().unwrap();
    let corpus = home.path().join("corpus.json");
    std::fs::write(
        &corpus,
        r#"[{"prompt": "", "vaguenessScore": 150, "intentCategory": "dance", "reasoning": ""}]"#,
    )
    .unwrap();
    let model = home.path().join("model.json");

    let output = run(
        home.path(),
        &["train", corpus.to_str().unwrap(), "--output", model.to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(!model.exists());
}

#[test]
fn test_corrupted_model_is_an_error() {
    let home = tempfile::tempdir().unwrap();
    let model = home.path().join("model.json");
    std::fs::write(&model, "{\"version\": 1, \"vectorizer\": null}").unwrap();

    let output = run(
        home.path(),
        &["analyze", "fix it", "--model", model.to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load model"));
}

#[test]
fn test_init_writes_config_once() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["init"]);
    assert!(output.status.success());

    let path = home.path().join("clarifier.toml");
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("[engine]"));

    std::fs::write(&path, "# mine\n").unwrap();
    let output = run(home.path(), &["init"]);
    assert!(output.status.success());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");
}

#[test]
fn test_project_config_is_honored() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(
        home.path().join("clarifier.toml"),
        "[engine]\nvagueness_threshold = 99\n",
    )
    .unwrap();

    let output = run(home.path(), &["analyze", "fix it", "-f", "json"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert!(json["score"].as_u64().unwrap() < 99);
    assert_eq!(json["isVague"], false);
}

#[test]
fn test_compare_without_credentials_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["compare", "fix it", "fix the null check in src/auth.rs"]);
    assert!(!output.status.success());
}
