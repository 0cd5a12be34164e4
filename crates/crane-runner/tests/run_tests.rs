//! End-to-end tests: source text in, stdout, errors and world state out.

use crane_runner::{run, RunConfig, RunOutcome, Session};
use crane_types::ErrorCode;
use crane_world::{BlockSpec, Direction, LevelWorld, GROUND};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// A 4×4 level with the crane at (0, 0) facing east and one goal in front.
const LEVEL: &str = r#"{
    "size": [4, 4],
    "blocks": [[2, 0, 1, "stone"]],
    "goal": [[1, 0, 1, "sand"]],
    "crane": { "x": 0, "y": 0, "dir": "E", "defaultBlock": "brick" }
}"#;

fn session() -> Session {
    Session::from_level_json(LEVEL, RunConfig::default()).expect("level parses")
}

fn ok(outcome: &RunOutcome) {
    assert!(outcome.is_success(), "unexpected error: {:?}", outcome.error);
}

// ══════════════════════════════════════════════════════════════════════════════
// Run contract
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_run_prints() {
    let outcome = run("x = 1\nfor i in range(3):\n    x = x + i\nprint(x)\n", "");
    ok(&outcome);
    assert_eq!(outcome.stdout, "4\n");
    assert_eq!(outcome.commands_applied, 0);
}

#[test]
fn test_stdin_is_accepted_but_unused() {
    let outcome = run("print(input())", "typed text\n");
    ok(&outcome);
    assert_eq!(outcome.stdout, "\n");
}

#[test]
fn test_syntax_error_reports_all_diagnostics() {
    let outcome = run("print('a')\nx = = 1\ny = (2\n", "");
    assert_eq!(outcome.stdout, "", "nothing runs when parsing fails");
    let error = outcome.error.as_deref().expect("error");
    assert!(error.starts_with("2:"), "got {error}");
    assert!(error.contains("E150"), "got {error}");
    assert_eq!(outcome.diagnostics.len(), 2);
    assert!(outcome.diagnostics.iter().all(|d| d.code == ErrorCode::UNEXPECTED_TOKEN));
}

#[test]
fn test_lex_error() {
    let outcome = run("x = 1 $ 2\n", "");
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, ErrorCode::UNEXPECTED_CHARACTER);
    assert!(outcome.error.is_some());
}

#[test]
fn test_runtime_error_skips_replay() {
    let mut session = session();
    let outcome = session.run("place_block('sand')\nprint('hi')\nprint(nope)\n", "");
    assert_eq!(outcome.stdout, "hi\n");
    assert_eq!(
        outcome.error.as_deref(),
        Some("line 3: name 'nope' is not defined")
    );
    assert_eq!(outcome.commands_applied, 0);
    assert_eq!(session.world().top_block(1, 0), Some((0, GROUND)));
}

#[test]
fn test_outcome_json_shape() {
    let outcome = run("print('hi')", "");
    let json = serde_json::to_string(&outcome).unwrap();
    assert_eq!(json, r#"{"stdout":"hi\n","error":null,"commands_applied":0}"#);
}

// ══════════════════════════════════════════════════════════════════════════════
// Replay
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_boundary_move_aborts_rest() {
    let outcome = run("for i in range(10):\n    move()\nplace_block('sand')\nprint('done')\n", "");
    assert_eq!(outcome.stdout, "done\n", "evaluation finishes before replay");
    assert_eq!(
        outcome.error.as_deref(),
        Some("cannot move at (0, 8): outside the field")
    );
    assert_eq!(outcome.commands_applied, 7);
}

#[test]
fn test_double_lift() {
    let mut session = session();
    let source = "for i in range(4):\n    turn_right()\nmove()\nlift()\nlift()\n";
    let outcome = session.run(source, "");
    assert_eq!(
        outcome.error.as_deref(),
        Some("cannot lift: the crane is already carrying stone")
    );
    assert_eq!(session.crane().carried.as_deref(), Some("stone"));
    assert_eq!(outcome.commands_applied, 6);
}

#[test]
fn test_partial_application_is_kept() {
    let mut session = session();
    let outcome = session.run("place_block('sand')\nturn_left()\nmove()\ndig()\n", "");
    assert!(outcome.error.is_some());
    assert_eq!(outcome.commands_applied, 2);
    assert_eq!(session.world().block(1, 0, 1), Some("sand"));
    assert_eq!(session.crane().dir, Direction::North);
}

#[test]
fn test_look_sees_world_before_replay() {
    let mut session = session();
    let outcome = session.run("place_block('sand')\nprint(look())\nmove()\nprint(look())\n", "");
    ok(&outcome);
    assert_eq!(outcome.stdout, "ground\nstone\n");
}

#[test]
fn test_warnings_surface() {
    let outcome = run("while True:\n    pass\n", "");
    ok(&outcome);
    assert_eq!(outcome.warnings.len(), 1);
}

// ══════════════════════════════════════════════════════════════════════════════
// Sessions and goals
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_runs_build_on_each_other() {
    let mut session = session();
    ok(&session.run("place_block('sand')", ""));
    ok(&session.run("place_block('sand')", ""));
    assert_eq!(session.world().top_block(1, 0), Some((2, "sand")));

    session.reset_level();
    assert_eq!(session.world().top_block(1, 0), Some((0, GROUND)));
    assert_eq!(session.crane().pose().dir, Direction::East);
}

#[test]
fn test_check_goals() {
    let mut session = session();
    let (outcome, report) = session.check("place_block('sand')", "");
    ok(&outcome);
    assert!(report.met);
    assert!(report.missing.is_empty());

    let (_, report) = session.check("place_block('brick')", "");
    assert!(!report.met);
    assert_eq!(report.missing, vec![BlockSpec::new(1, 0, 1, "sand")]);
}

#[test]
fn test_level_carried_block_is_placed() {
    let level = LevelWorld {
        carried: Some("wood".to_string()),
        ..LevelWorld::default()
    };
    let mut session = Session::new(level, RunConfig::default());
    ok(&session.run("turn_left()\nplace()\nplace()\n", ""));
    assert_eq!(session.world().block(1, 0, 1), Some("wood"));
    assert_eq!(session.world().block(1, 0, 2), Some("brick"));
}

#[test]
fn test_config_limits_apply() {
    let config = RunConfig {
        max_iterations: 3,
        step_ms: 0,
        ..RunConfig::default()
    };
    let mut session = Session::new(LevelWorld::default(), config);
    let outcome = session.run("n = 0\nwhile True:\n    n = n + 1\nprint(n)\n", "");
    assert_eq!(outcome.stdout, "3\n");
}

#[test]
fn test_runs_are_deterministic() {
    let source = "\
for i in range(6):
    if look() == 'empty' or look() == 'ground':
        place_block('sand')
    move()
print('placed')
";
    let mut reference = session();
    let expected = reference.run(source, "");
    for _ in 0..100 {
        let mut session = session();
        assert_eq!(session.run(source, ""), expected);
        assert_eq!(session.world(), reference.world());
        assert_eq!(session.crane(), reference.crane());
    }
}
