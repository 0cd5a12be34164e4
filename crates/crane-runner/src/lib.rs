//! Crane runner: takes a script from source text to a settled world.
//!
//! ```text
//! source → Lexer → Parser → Evaluator → crane commands → Executor replay
//! ```
//!
//! [`run`] is the one-shot entry point on a default level. A [`Session`]
//! keeps a level loaded so several runs can build on each other and goals
//! can be checked afterwards.

mod config;
mod outcome;
mod session;

pub use config::RunConfig;
pub use outcome::{GoalReport, RunOutcome};
pub use session::{Session, SCRIPT_NAME};

use std::sync::Once;

/// Run a script on the default level with the default configuration.
///
/// `stdin` is accepted for the run contract; scripts do not read it
/// (`input()` always returns an empty string).
pub fn run(source: &str, stdin: &str) -> RunOutcome {
    Session::default().run(source, stdin)
}

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set, and only the first call has any
/// effect.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
