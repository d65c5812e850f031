//! Smoke tests for the waypoint CLI
//!
//! Every test runs the real binary against its own temporary state home (`--state-dir`) and
//! project directory, and checks exit codes plus the stdout/stderr contract.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use waypoint::{ExitCode, StateManager, WorkflowHandle};

struct Env {
    _temp: TempDir,
    home: PathBuf,
    project: PathBuf,
}

impl Env {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        let project = temp.path().join("project");
        fs::create_dir_all(&project).unwrap();
        Self {
            _temp: temp,
            home,
            project,
        }
    }

    fn project(&self) -> &str {
        self.project.to_str().unwrap()
    }

    fn waypoint(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_waypoint"));
        cmd.current_dir(&self.project)
            .arg("--state-dir")
            .arg(&self.home)
            .env_remove("WAYPOINT_HOME")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .args(args);
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.waypoint(args).assert().success().get_output().stdout.clone();
        serde_json::from_slice(&output).unwrap()
    }
}

#[test]
fn help_lists_commands() {
    Command::new(env!("CARGO_BIN_EXE_waypoint"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("handoff"))
        .stdout(predicate::str::contains("advance"));
}

#[test]
fn init_then_status_json() {
    let env = Env::new();
    env.waypoint(&["init", env.project(), "--type", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized demo workflow"));

    let status = env.json(&["status", env.project(), "--json"]);
    assert_eq!(status["currentPhase"], "initialization");
    assert_eq!(status["workflowType"], "demo");
    assert_eq!(status["phases"][0]["status"], "in-progress");
    assert_eq!(status["phases"][1]["status"], "not-started");
}

#[test]
fn project_defaults_to_working_directory() {
    let env = Env::new();
    env.waypoint(&["init"]).assert().success();

    let status = env.json(&["status", "--json"]);
    assert_eq!(status["projectPath"], env.project());
    assert_eq!(status["workflowType"], "project-management");
}

#[test]
fn missing_workflow_exits_not_found() {
    let env = Env::new();
    env.waypoint(&["status", env.project()])
        .assert()
        .code(ExitCode::NOT_FOUND.as_i32())
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("waypoint init"));
}

#[test]
fn second_init_exits_already_exists() {
    let env = Env::new();
    env.waypoint(&["init", env.project()]).assert().success();
    env.waypoint(&["init", env.project()])
        .assert()
        .code(ExitCode::ALREADY_EXISTS.as_i32());
    env.waypoint(&["init", env.project(), "--force", "--type", "spec-driven"])
        .assert()
        .success();
}

#[test]
fn blocked_advance_lists_blockers() {
    let env = Env::new();
    let project = env.project();
    env.waypoint(&["init", project]).assert().success();
    for step in ["create-structure", "capture-vision"] {
        env.waypoint(&["step", project, step]).assert().success();
    }
    env.waypoint(&["advance", project])
        .assert()
        .success()
        .stdout(predicate::str::contains("to 'goal-development'"));
    for step in ["brainstorm-goals", "evaluate-goals", "select-goals"] {
        env.waypoint(&["step", project, step]).assert().success();
    }

    env.waypoint(&["advance", project])
        .assert()
        .code(ExitCode::BLOCKED.as_i32())
        .stderr(predicate::str::contains("selected goal"));

    env.waypoint(&["goal", "add", project, "g1", "--name", "Faster checkout"])
        .assert()
        .success();
    env.waypoint(&["goal", "promote", project, "g1"]).assert().success();
    let state = env.json(&["advance", project, "--json"]);
    assert_eq!(state["currentPhase"], "execution");

    let handoff = env.json(&["handoff", project, "spec-driven", "g1", "--json"]);
    assert_eq!(handoff["suggestedCall"]["targetTool"], "sdd_guide");
    assert_eq!(handoff["alreadyHandedOff"], false);
    let again = env.json(&["handoff", project, "spec-driven", "g1", "--json"]);
    assert_eq!(again["alreadyHandedOff"], true);
    assert_eq!(again["suggestedCall"], handoff["suggestedCall"]);
}

#[test]
fn next_reconciles_goal_files() {
    let env = Env::new();
    env.waypoint(&["init", env.project()]).assert().success();
    fs::create_dir_all(env.project.join("goals")).unwrap();
    fs::write(env.project.join("goals/g1.md"), "# Goal one").unwrap();

    let next = env.json(&["next", env.project(), "--json", "--max", "2"]);
    assert_eq!(next["status"], "actionable");
    assert_eq!(next["drift"][0]["changeType"], "added");
    assert!(next["suggestions"].as_array().unwrap().len() <= 2);

    let drift = env.json(&["sync", env.project(), "--json"]);
    assert_eq!(drift["changes"], Value::Array(Vec::new()));
}

#[test]
fn json_output_is_canonical() {
    let env = Env::new();
    env.waypoint(&["init", env.project()]).assert().success();

    let output = env
        .waypoint(&["validate", env.project(), "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(text.trim_end(), waypoint::emit_jcs(&value).unwrap());
    assert_eq!(value["readiness"]["allowed"], false);
}

#[test]
fn corrupt_record_exits_corrupt_state() {
    let env = Env::new();
    env.waypoint(&["init", env.project()]).assert().success();

    let manager = StateManager::new(env.home.to_str().unwrap());
    fs::write(manager.state_path(env.project()), "{\"version\":").unwrap();

    env.waypoint(&["next", env.project()])
        .assert()
        .code(ExitCode::CORRUPT_STATE.as_i32())
        .stderr(predicate::str::contains("could not be trusted"));
}

#[test]
fn unknown_blocker_exits_invalid_target() {
    let env = Env::new();
    env.waypoint(&["init", env.project(), "--type", "demo"])
        .assert()
        .success();
    env.waypoint(&["blocker", "add", env.project(), "waiting on legal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("B-1"));
    env.waypoint(&["blocker", "resolve", env.project(), "B-7"])
        .assert()
        .code(ExitCode::INVALID_TARGET.as_i32());
}

#[test]
fn feature_and_clarifications_round_trip() {
    let env = Env::new();
    let project = env.project();
    env.waypoint(&["init", project, "--type", "spec-driven"])
        .assert()
        .success();

    let named = env.json(&["feature", project, "checkout", "--json"]);
    assert_eq!(named["changed"], true);
    env.waypoint(&["clarify", "add", project, "Guest checkout?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Opened clarification"));

    let status = env.json(&["status", project, "--json"]);
    assert_eq!(status["featureName"], "checkout");
    assert_eq!(status["openClarifications"][0], "Guest checkout?");

    env.waypoint(&["clarify", "resolve", project, "Guest checkout?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolved clarification"));
    let status = env.json(&["status", project, "--json"]);
    assert!(status.get("openClarifications").is_none());
}

#[test]
fn feature_on_project_management_exits_invalid_target() {
    let env = Env::new();
    env.waypoint(&["init", env.project()]).assert().success();
    env.waypoint(&["feature", env.project(), "checkout"])
        .assert()
        .code(ExitCode::INVALID_TARGET.as_i32())
        .stderr(predicate::str::contains("spec-driven"));
}

#[test]
#[serial]
fn handle_uses_waypoint_home_from_environment() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    let project = project.to_str().unwrap();

    // SAFETY: serialized with every other test that touches the process environment
    unsafe { std::env::set_var("WAYPOINT_HOME", temp.path()) };
    let result = WorkflowHandle::new().and_then(|handle| {
        handle.initialize(project, "demo", false)?;
        Ok(handle.manager().state_path(project))
    });
    unsafe { std::env::remove_var("WAYPOINT_HOME") };

    let state_path = result.unwrap();
    assert!(state_path.starts_with(temp.path().to_str().unwrap()));
    assert!(state_path.exists());
}
