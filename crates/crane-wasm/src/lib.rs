//! Crane runner as a WASM module for browser environments.
//!
//! This crate exposes the run pipeline via `wasm-bindgen`, suitable for
//! running in a browser Web Worker.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { run, CraneSession } from 'crane-wasm';
//!
//! await init();
//!
//! const outcome = JSON.parse(run("move()\nprint(look())", "", ""));
//! // { stdout: "ground\n", error: null, commands_applied: 1 }
//!
//! const session = new CraneSession(levelJson);
//! session.run("place_block('sand')", "");
//! session.run("place_block('sand')", ""); // builds on the first run
//! ```

use crane_runner::{GoalReport, RunConfig, RunOutcome, Session};
use crane_world::LevelWorld;
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Run a script against a level and return the outcome as JSON.
///
/// An empty `level_json` selects the default empty 8×8 field. A level
/// that does not parse is reported in the outcome's `error`.
#[wasm_bindgen]
pub fn run(source: &str, stdin: &str, level_json: &str) -> String {
    let outcome = match level(level_json) {
        Ok(level) => Session::new(level, RunConfig::default()).run(source, stdin),
        Err(error) => RunOutcome {
            error: Some(error),
            ..RunOutcome::default()
        },
    };
    to_json(&outcome)
}

/// Like [`run`], but returns the outcome as a JS object.
#[wasm_bindgen(js_name = runValue)]
pub fn run_value(source: &str, stdin: &str, level_json: &str) -> Result<JsValue, JsValue> {
    let level = level(level_json).map_err(|e| JsValue::from_str(&e))?;
    let outcome = Session::new(level, RunConfig::default()).run(source, stdin);
    serde_wasm_bindgen::to_value(&outcome).map_err(JsValue::from)
}

/// Return the runner version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// A level kept alive across runs, so each run builds on the last.
#[wasm_bindgen]
pub struct CraneSession {
    inner: Session,
}

#[derive(Serialize)]
struct Checked<'a> {
    outcome: &'a RunOutcome,
    goals: &'a GoalReport,
}

#[wasm_bindgen]
impl CraneSession {
    #[wasm_bindgen(constructor)]
    pub fn new(level_json: &str, config_json: Option<String>) -> Result<CraneSession, JsValue> {
        let level = level(level_json).map_err(|e| JsValue::from_str(&e))?;
        let config = match config_json.as_deref().map(str::trim) {
            None | Some("") => RunConfig::default(),
            Some(json) => RunConfig::from_json(json)
                .map_err(|e| JsValue::from_str(&format!("invalid config: {e}")))?,
        };
        Ok(CraneSession {
            inner: Session::new(level, config),
        })
    }

    /// Run a script against the current world. Returns a `RunOutcome` JSON.
    pub fn run(&mut self, source: &str, stdin: &str) -> String {
        to_json(&self.inner.run(source, stdin))
    }

    /// Reset the level, run the script, and return
    /// `{ "outcome": ..., "goals": { "met": ..., "missing": [...] } }`.
    pub fn check(&mut self, source: &str, stdin: &str) -> String {
        let (outcome, goals) = self.inner.check(source, stdin);
        to_json(&Checked {
            outcome: &outcome,
            goals: &goals,
        })
    }

    #[wasm_bindgen(js_name = resetLevel)]
    pub fn reset_level(&mut self) {
        self.inner.reset_level();
    }

    /// The crane as `{ x, y, dir, carried }`.
    pub fn crane(&self) -> String {
        to_json(self.inner.crane())
    }

    /// Every block as `[x, y, z, "type"]`, in position order.
    pub fn blocks(&self) -> String {
        let blocks: Vec<_> = self.inner.world().blocks().collect();
        to_json(&blocks)
    }

    pub fn goals(&self) -> String {
        to_json(&self.inner.goal_report())
    }
}

fn level(json: &str) -> Result<LevelWorld, String> {
    if json.trim().is_empty() {
        return Ok(LevelWorld::default());
    }
    LevelWorld::from_json(json).map_err(|e| format!("invalid level: {e}"))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        format!(
            r#"{{"stdout":"","error":"serialization error: {}","commands_applied":0}}"#,
            e.to_string().replace('"', "'")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(json: &str) -> RunOutcome {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_run_default_level() {
        let out = outcome(&run("move()\nprint(look())", "", ""));
        assert_eq!(out.stdout, "ground\n");
        assert_eq!(out.error, None);
        assert_eq!(out.commands_applied, 1);
    }

    #[test]
    fn test_run_invalid_level() {
        let out = outcome(&run("print(1)", "", "{\"size\": 3}"));
        assert!(out.error.unwrap().starts_with("invalid level:"));
        assert_eq!(out.stdout, "");
    }

    #[test]
    fn test_session_keeps_world() {
        let level = r#"{"size": [3, 3], "goal": [[0, 1, 2, "sand"]]}"#;
        let mut session = CraneSession::new(level, None).unwrap();
        session.run("place_block('sand')", "");
        assert_eq!(session.goals(), r#"{"met":false,"missing":[[0,1,2,"sand"]]}"#);
        session.run("place_block('sand')", "");
        assert_eq!(session.goals(), r#"{"met":true,"missing":[]}"#);

        session.reset_level();
        assert_eq!(session.blocks().matches("ground").count(), 9);
        assert_eq!(
            session.crane(),
            r#"{"x":0,"y":0,"dir":"S","carried":null}"#
        );
    }

    #[test]
    fn test_check_resets_first() {
        let level = r#"{"goal": [[0, 1, 1, "sand"]]}"#;
        let mut session = CraneSession::new(level, Some(String::new())).unwrap();
        session.run("place_block('brick')", "");
        let checked: serde_json::Value =
            serde_json::from_str(&session.check("place_block('sand')", "")).unwrap();
        assert_eq!(checked["goals"]["met"], true);
        assert_eq!(checked["outcome"]["commands_applied"], 1);
    }
}
