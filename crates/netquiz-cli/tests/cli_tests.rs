//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn netquiz() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("netquiz").unwrap()
}

fn sample_bank() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../banks/networking.toml")
}

const REFERENCE_SOLUTION: &str = r#"import socket

server = socket.socket(socket.AF_INET, socket.SOCK_STREAM)
server.bind(("0.0.0.0", 8080))
server.listen(1)
conn, addr = server.accept()
data = conn.recv(1024)
conn.send(data)
conn.close()
server.close()
"#;

/// A throwaway quiz directory with its own config and state.
struct Quiz {
    dir: TempDir,
}

impl Quiz {
    fn new() -> Self {
        Self::with_settings("min_session_time_ms = 0", "min_dwell_ms = 0")
    }

    fn with_settings(rate_limit: &str, integrity: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config = format!(
            "question_bank = '{}'\nstate_dir = '{}'\n\n[candidate]\nname = \"Ada\"\n\n[gateway]\ntype = \"log\"\n\n[rate_limit]\n{rate_limit}\n\n[integrity]\n{integrity}\n",
            sample_bank().display(),
            dir.path().join("state").display(),
        );
        std::fs::write(dir.path().join("netquiz.toml"), config).unwrap();
        Self { dir }
    }

    fn cmd(&self) -> Command {
        let mut cmd = netquiz();
        cmd.current_dir(self.dir.path())
            .arg("--config")
            .arg(self.dir.path().join("netquiz.toml"));
        cmd
    }

    fn run(&self, args: &[&str]) {
        self.cmd().args(args).assert().success();
    }
}

// --- Static commands ---

#[test]
fn validate_sample_bank() {
    netquiz()
        .arg("validate")
        .arg("--bank")
        .arg(sample_bank())
        .assert()
        .success()
        .stdout(predicate::str::contains("Networking Fundamentals (5 questions)"))
        .stdout(predicate::str::contains("All question banks valid"));
}

#[test]
fn validate_reports_authoring_mistakes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[bank]
id = "broken"
name = "Broken"

[[questions]]
id = 1
kind = "single"
prompt = "Pick one"
options = ["a", "b"]
correct = [46307, 46306]

[[questions]]
id = 1
kind = "coding"
prompt = "Write code"
"#,
    )
    .unwrap();

    netquiz()
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[1] WARNING"))
        .stdout(predicate::str::contains("duplicate question ID"))
        .stdout(predicate::str::contains("reference_solution"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    netquiz()
        .arg("validate")
        .arg("--bank")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    netquiz()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created netquiz.toml"))
        .stdout(predicate::str::contains("Created banks/example.toml"));

    assert!(dir.path().join("netquiz.toml").exists());

    netquiz()
        .arg("validate")
        .arg("--bank")
        .arg(dir.path().join("banks/example.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("All question banks valid"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    netquiz().current_dir(dir.path()).arg("init").assert().success();

    netquiz()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn obfuscate_indices() {
    netquiz()
        .args(["obfuscate", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("correct = [46306]"));

    netquiz()
        .args(["obfuscate", "0", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("correct = [46307, 46333]"));
}

#[test]
fn score_submission() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("reference.py");
    let submission = dir.path().join("submission.py");
    std::fs::write(&reference, REFERENCE_SOLUTION).unwrap();
    std::fs::write(&submission, REFERENCE_SOLUTION).unwrap();

    netquiz()
        .arg("score")
        .arg("--reference")
        .arg(&reference)
        .arg("--submission")
        .arg(&submission)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 100%"))
        .stdout(predicate::str::contains("Matched keywords"));

    std::fs::write(&submission, "   \n").unwrap();
    netquiz()
        .arg("score")
        .arg("--reference")
        .arg(&reference)
        .arg("--submission")
        .arg(&submission)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 0%"))
        .stdout(predicate::str::contains("No code submitted."));
}

#[test]
fn help_output() {
    netquiz()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Timed technical assessments"));
}

#[test]
fn version_output() {
    netquiz()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netquiz"));
}

// --- Session commands ---

#[test]
fn commands_require_started_session() {
    let quiz = Quiz::new();
    quiz.cmd()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no assessment in progress"));
}

#[test]
fn missing_bank_is_reported() {
    let dir = TempDir::new().unwrap();
    netquiz()
        .current_dir(dir.path())
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no question bank given"));
}

#[test]
fn full_run_all_correct() {
    let quiz = Quiz::new();

    quiz.cmd()
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting Networking Fundamentals for Ada"))
        .stdout(predicate::str::contains("Question 1/5"));

    quiz.run(&["answer", "2"]);
    quiz.run(&["next"]);
    quiz.run(&["answer", "3"]);
    quiz.run(&["next"]);
    quiz.run(&["answer", "1", "3"]);
    quiz.run(&["next"]);
    quiz.run(&["answer", "3"]);
    quiz.cmd()
        .arg("next")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 5/5"))
        .stdout(predicate::str::contains("No answer yet (python)"));

    quiz.run(&["code", "--text", REFERENCE_SOLUTION]);
    quiz.cmd()
        .arg("next")
        .assert()
        .success()
        .stdout(predicate::str::contains("That was the last question"))
        .stdout(predicate::str::contains("Score: 100% (5 correct, 0 incorrect"))
        .stdout(predicate::str::contains("Sent completion report."));

    let output = quiz.cmd().args(["result", "--json"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["percentage"], 100);
    assert_eq!(json["correct_answers"], 5);
    assert_eq!(json["details"].as_array().unwrap().len(), 5);
}

#[test]
fn next_requires_an_answer() {
    let quiz = Quiz::new();
    quiz.run(&["start"]);

    quiz.cmd()
        .arg("next")
        .assert()
        .failure()
        .stderr(predicate::str::contains("answer the current question"));
}

#[test]
fn single_choice_takes_one_option() {
    let quiz = Quiz::new();
    quiz.run(&["start"]);

    quiz.cmd()
        .args(["answer", "1", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exactly one option"));

    quiz.cmd()
        .args(["answer", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));

    quiz.cmd()
        .args(["answer", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] 1. Data Link"));

    quiz.cmd()
        .args(["answer", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[ ] 1. Data Link"))
        .stdout(predicate::str::contains("[x] 2. Network"));
}

#[test]
fn multiple_choice_toggles() {
    let quiz = Quiz::new();
    quiz.run(&["start"]);
    quiz.run(&["answer", "2"]);
    quiz.run(&["next"]);
    quiz.run(&["answer", "3"]);
    quiz.run(&["next"]);

    quiz.cmd()
        .args(["answer", "1", "3", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[ ] 1. UDP"))
        .stdout(predicate::str::contains("[x] 3. ICMP"))
        .stdout(predicate::str::contains("Select all that apply"));
}

#[test]
fn rejected_answer_leaves_selection_untouched() {
    let quiz = Quiz::new();
    quiz.run(&["start"]);
    quiz.run(&["answer", "2"]);
    quiz.run(&["next"]);
    quiz.run(&["answer", "3"]);
    quiz.run(&["next"]);
    let state = quiz.dir.path().join("state/quiz-state.json");
    let before = std::fs::read_to_string(&state).unwrap();

    quiz.cmd()
        .args(["answer", "1", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "option 99 out of range for question 3 (4 options)",
        ));

    quiz.cmd()
        .args(["answer", "2", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("option numbers start at 1"));

    let after = std::fs::read_to_string(&state).unwrap();
    let answers = |raw: &str| {
        let state: serde_json::Value = serde_json::from_str(raw).unwrap();
        state["answers"].clone()
    };
    assert_eq!(answers(&before), answers(&after));
    assert!(answers(&after).get("3").is_none());

    quiz.cmd()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("[ ] 1. UDP"));
}

#[test]
fn session_refuses_bank_with_duplicate_ids() {
    let quiz = Quiz::new();
    let bank = quiz.dir.path().join("dupes.toml");
    std::fs::write(
        &bank,
        r#"
[bank]
id = "dupes"
name = "Dupes"

[[questions]]
id = 1
kind = "single"
prompt = "Pick one"
options = ["a", "b"]
correct = [46306]

[[questions]]
id = 1
kind = "coding"
prompt = "Write code"
reference_solution = "import socket"
"#,
    )
    .unwrap();

    quiz.cmd()
        .arg("--bank")
        .arg(&bank)
        .arg("start")
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate question ID: 1"));

    assert!(!quiz.dir.path().join("state/quiz-state.json").exists());
}

#[test]
fn code_answer_rejected_on_choice_question() {
    let quiz = Quiz::new();
    quiz.run(&["start"]);

    quiz.cmd()
        .args(["code", "--text", "print(1)"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a coding question"));

    quiz.cmd()
        .arg("code")
        .assert()
        .failure();
}

#[test]
fn progress_survives_between_commands() {
    let quiz = Quiz::new();
    quiz.run(&["start"]);
    quiz.run(&["answer", "2"]);
    quiz.run(&["next"]);

    quiz.cmd()
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resuming"))
        .stdout(predicate::str::contains("1/5 answered"))
        .stdout(predicate::str::contains("Question 2/5"));

    quiz.cmd()
        .arg("prev")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 1/5"))
        .stdout(predicate::str::contains("[x] 2. Network"));

    quiz.cmd()
        .arg("prev")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 1/5"));
}

#[test]
fn reset_clears_progress() {
    let quiz = Quiz::new();
    quiz.run(&["start"]);
    quiz.run(&["answer", "2"]);
    quiz.run(&["next"]);

    quiz.cmd()
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress cleared"))
        .stdout(predicate::str::contains("Question 1/5"));

    quiz.cmd()
        .arg("result")
        .assert()
        .success()
        .stdout(predicate::str::contains("still in progress"))
        .stdout(predicate::str::contains("Score: 0% (0 correct, 5 incorrect, 0 answered of 5)"));
}

#[test]
fn finish_early_and_lock() {
    let quiz = Quiz::new();
    quiz.run(&["start"]);
    quiz.run(&["answer", "2"]);

    quiz.cmd()
        .arg("finish")
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 20% (1 correct, 4 incorrect, 1 answered of 5)"));

    quiz.cmd()
        .args(["answer", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already completed"));

    let out = quiz.dir.path().join("out/result.json");
    quiz.cmd()
        .arg("result")
        .arg("--output")
        .arg(&out)
        .assert()
        .success();
    let saved = std::fs::read_to_string(&out).unwrap();
    assert!(saved.contains("\"correct_answers\": 1"));

    quiz.cmd()
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting"));
}

#[test]
fn hourly_cap_suppresses_third_report() {
    let quiz = Quiz::new();

    for _ in 0..2 {
        quiz.run(&["reset"]);
        quiz.cmd()
            .arg("finish")
            .assert()
            .success()
            .stdout(predicate::str::contains("Sent completion report."));
    }

    quiz.run(&["reset"]);
    quiz.cmd()
        .arg("finish")
        .assert()
        .success()
        .stdout(predicate::str::contains("completion report not sent"));
}

#[test]
fn short_session_suppresses_report() {
    let quiz = Quiz::with_settings("min_session_time_ms = 600000", "min_dwell_ms = 0");
    quiz.run(&["start"]);

    quiz.cmd()
        .args(["signal", "hidden"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Assessment terminated"))
        .stdout(predicate::str::contains("termination report not sent"));
}

// --- Integrity signals ---

#[test]
fn hidden_window_terminates() {
    let quiz = Quiz::new();
    quiz.run(&["start"]);
    quiz.run(&["answer", "2"]);

    quiz.cmd()
        .args(["signal", "hidden"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Assessment terminated"))
        .stdout(predicate::str::contains("Answered 1 of 5 question(s) (20%)"))
        .stdout(predicate::str::contains("Sent termination report."));

    quiz.cmd()
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no assessment in progress"));
}

#[test]
fn hidden_window_ignored_during_dwell() {
    let quiz = Quiz::with_settings("min_session_time_ms = 0", "min_dwell_ms = 600000");
    quiz.run(&["start"]);

    quiz.cmd()
        .args(["signal", "hidden"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No integrity issue recorded"));

    quiz.cmd()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 1/5"));
}

#[test]
fn viewport_gap_warns() {
    let quiz = Quiz::new();
    quiz.run(&["start"]);

    quiz.cmd()
        .args(["signal", "viewport", "--outer", "1440x900", "--inner", "1440x600"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning:"));

    quiz.cmd()
        .args(["signal", "viewport", "--outer", "1440x900", "--inner", "1440x850"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No integrity issue recorded"));

    quiz.cmd()
        .args(["signal", "viewport", "--outer", "1440", "--inner", "1440x850"])
        .assert()
        .failure();
}
