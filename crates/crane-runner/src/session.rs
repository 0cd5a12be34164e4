//! A level loaded into a crane executor, ready to run scripts against.

use crane_eval::evaluate;
use crane_parser::parse_source;
use crane_types::SourceFile;
use crane_world::{CompletionState, CraneState, Executor, LevelWorld, Pose, World};
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::outcome::{GoalReport, RunOutcome};

/// File name scripts are reported under.
pub const SCRIPT_NAME: &str = "main.py";

/// Owns the world and crane for one level across any number of runs.
///
/// World changes persist between runs until [`Session::reset_level`].
#[derive(Debug)]
pub struct Session {
    level: LevelWorld,
    config: RunConfig,
    executor: Executor,
}

impl Session {
    pub fn new(level: LevelWorld, config: RunConfig) -> Self {
        let executor = Executor::new(World::from_level(&level)).with_step(config.step());
        let mut session = Self {
            level,
            config,
            executor,
        };
        session.reset_level();
        session
    }

    pub fn from_level_json(json: &str, config: RunConfig) -> serde_json::Result<Self> {
        Ok(Self::new(LevelWorld::from_json(json)?, config))
    }

    pub fn level(&self) -> &LevelWorld {
        &self.level
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        self.executor.world()
    }

    pub fn crane(&self) -> &CraneState {
        self.executor.crane()
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Direct access for hosts that drive replay frame by frame.
    pub fn executor_mut(&mut self) -> &mut Executor {
        &mut self.executor
    }

    /// Put the world and crane back to the level's starting state.
    pub fn reset_level(&mut self) {
        let setup = &self.level.crane;
        self.executor.load_world(World::from_level(&self.level));
        self.executor.initialize(
            Pose::new(setup.x, setup.y, setup.dir),
            setup.default_block.clone(),
        );
        self.executor.set_carried(self.level.carried.clone());
        debug!(
            width = self.level.size.0,
            height = self.level.size.1,
            goals = self.level.goal.len(),
            "level reset"
        );
    }

    /// Run a script against the current world: lex, parse, evaluate, then
    /// replay the recorded crane commands until they settle.
    ///
    /// A lex, parse or evaluation error ends the run before any crane
    /// command is applied. A crane failure stops replay at the failing
    /// command; commands before it stay applied.
    pub fn run(&mut self, source: &str, stdin: &str) -> RunOutcome {
        debug!(bytes = source.len(), stdin_bytes = stdin.len(), "run started");
        let source_file = SourceFile::new(SCRIPT_NAME, source);
        let parsed = parse_source(&source_file);
        let program = match parsed.program {
            Some(program) if !parsed.errors.has_errors() => program,
            _ => {
                let error = parsed.errors.first().map(ToString::to_string);
                info!(errors = parsed.errors.total_errors, "script rejected");
                return RunOutcome {
                    error,
                    diagnostics: parsed.errors.errors,
                    ..RunOutcome::default()
                };
            }
        };

        let evaluation = evaluate(
            &program,
            self.executor.world(),
            self.executor.crane().pose(),
            self.config.limits(),
        );
        let mut outcome = RunOutcome {
            stdout: evaluation.output.stdout,
            warnings: evaluation.output.warnings,
            ..RunOutcome::default()
        };
        if let Some(error) = evaluation.error {
            info!(%error, "script failed");
            outcome.error = Some(error.to_string());
            return outcome;
        }

        let commands = evaluation.output.commands;
        let total = commands.len();
        let completion = self.executor.replay(commands);
        self.executor.wait_until_settled();
        match self.executor.poll(&completion) {
            CompletionState::Resolved => {}
            CompletionState::Rejected(failure) => {
                info!(%failure, "replay failed");
                outcome.error = Some(failure.to_string());
            }
            CompletionState::Cancelled => outcome.error = Some("replay was cancelled".to_string()),
            CompletionState::Pending => outcome.error = Some("replay did not settle".to_string()),
            CompletionState::Expired => outcome.error = Some("replay outcome was lost".to_string()),
        }
        outcome.commands_applied = self.executor.resolved_count(&completion);
        debug!(
            commands = total,
            applied = outcome.commands_applied,
            "run finished"
        );
        outcome
    }

    /// Reset the level, run the script, and report on the goals.
    pub fn check(&mut self, source: &str, stdin: &str) -> (RunOutcome, GoalReport) {
        self.reset_level();
        let outcome = self.run(source, stdin);
        (outcome, self.goal_report())
    }

    pub fn goal_report(&self) -> GoalReport {
        let missing: Vec<_> = self.world().unmet_goals().into_iter().cloned().collect();
        GoalReport {
            met: self.world().goals_met(),
            missing,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(LevelWorld::default(), RunConfig::default())
    }
}
