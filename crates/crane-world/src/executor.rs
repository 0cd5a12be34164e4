//! The crane command executor.
//!
//! Commands are applied one at a time from a FIFO queue. Each command's
//! effect on the world is committed the moment it is dequeued; the
//! executor then animates for one step before dequeuing the next. Time is
//! driven by the host through [`Executor::tick`], or all at once through
//! [`Executor::wait_until_settled`].
//!
//! Every enqueued command gets a [`CommandId`]. Callers hold a
//! [`Completion`] covering one or more ids and [`poll`](Executor::poll) it
//! to learn whether the commands resolved, failed, or were cancelled.
//! Only the most recent [`STATE_HISTORY`] settled outcomes are kept.

use std::collections::VecDeque;
use std::ops::RangeInclusive;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::crane::{look_at, CraneState, Pose, QueuedCommand, Verb};
use crate::error::CraneFailure;
use crate::level::DEFAULT_SUPPLY;
use crate::world::World;

/// Animation time per command.
pub const DEFAULT_STEP: Duration = Duration::from_millis(350);

/// Settled command outcomes kept for polling.
pub const STATE_HISTORY: usize = 1024;

/// Sequence number of an enqueued command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(usize);

/// Outcome of a command, or of a group of commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionState {
    /// Queued or still animating.
    Pending,
    Resolved,
    /// The command failed, or an earlier command in the queue did.
    Rejected(CraneFailure),
    /// Dropped by [`Executor::reset`] or [`Executor::initialize`].
    Cancelled,
    /// Settled, but too long ago for the outcome to still be on record.
    Expired,
}

/// Handle for a contiguous run of enqueued commands.
///
/// An empty run is resolved from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    range: Option<(CommandId, CommandId)>,
}

impl Completion {
    fn single(id: CommandId) -> Self {
        Self {
            range: Some((id, id)),
        }
    }

    /// Number of commands covered.
    pub fn len(&self) -> usize {
        self.range.map_or(0, |(first, last)| last.0 - first.0 + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
}

/// The command currently animating.
#[derive(Debug, Clone, Copy)]
struct Animation {
    id: CommandId,
    from: (f64, f64),
    to: (f64, f64),
    elapsed: Duration,
}

/// Sole writer of the [`World`] and [`CraneState`] during replay.
#[derive(Debug)]
pub struct Executor {
    world: World,
    crane: CraneState,
    default_supply: String,
    step: Duration,
    queue: VecDeque<(CommandId, QueuedCommand)>,
    active: Option<Animation>,
    /// Outcomes from `base` onwards, indexed by `CommandId - base`.
    states: VecDeque<CompletionState>,
    base: usize,
}

impl Executor {
    /// An idle executor with the crane at `(0, 0)` facing south.
    pub fn new(world: World) -> Self {
        Self {
            world,
            crane: CraneState::default(),
            default_supply: DEFAULT_SUPPLY.to_string(),
            step: DEFAULT_STEP,
            queue: VecDeque::new(),
            active: None,
            states: VecDeque::new(),
            base: 0,
        }
    }

    /// Use a different animation step.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    // ══════════════════════════════════════════════════════════════════════
    // State access
    // ══════════════════════════════════════════════════════════════════════

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn crane(&self) -> &CraneState {
        &self.crane
    }

    pub fn default_supply(&self) -> &str {
        &self.default_supply
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn phase(&self) -> Phase {
        if self.active.is_some() {
            Phase::Running
        } else {
            Phase::Idle
        }
    }

    /// `true` once the queue is empty and no animation is in flight.
    pub fn is_settled(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    /// Number of commands waiting behind the one animating.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Where to draw the crane: interpolated between cells while a move
    /// animates, otherwise the committed position.
    pub fn visual_position(&self) -> (f64, f64) {
        match &self.active {
            Some(anim) => {
                let t = if self.step.is_zero() {
                    1.0
                } else {
                    (anim.elapsed.as_secs_f64() / self.step.as_secs_f64()).min(1.0)
                };
                (
                    anim.from.0 + (anim.to.0 - anim.from.0) * t,
                    anim.from.1 + (anim.to.1 - anim.from.1) * t,
                )
            }
            None => (f64::from(self.crane.x), f64::from(self.crane.y)),
        }
    }

    /// What the crane sees ahead right now, from committed state.
    pub fn look(&self) -> String {
        look_at(&self.world, self.crane.pose())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Setup
    // ══════════════════════════════════════════════════════════════════════

    /// Place the crane, empty-handed, and set its supply block. Anything
    /// still queued is cancelled.
    pub fn initialize(&mut self, pose: Pose, default_supply: impl Into<String>) {
        self.cancel_pending();
        self.crane = CraneState::new(pose);
        self.default_supply = default_supply.into();
    }

    /// Swap in a new world, cancelling anything still queued.
    pub fn load_world(&mut self, world: World) {
        self.cancel_pending();
        self.world = world;
    }

    /// Hand the crane a block without going through a command.
    pub fn set_carried(&mut self, carried: Option<String>) {
        self.crane.carried = carried;
    }

    /// Stop replay: the queue is cleared, the animation halts, pending
    /// completions are cancelled and the crane drops what it carries.
    /// Effects already applied to the world stay.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.crane.carried = None;
    }

    fn cancel_pending(&mut self) {
        let cancelled = self.queue.len() + usize::from(self.active.is_some());
        if let Some(anim) = self.active.take() {
            self.settle(anim.id, CompletionState::Cancelled);
        }
        for (id, _) in std::mem::take(&mut self.queue) {
            self.settle(id, CompletionState::Cancelled);
        }
        if cancelled > 0 {
            debug!(cancelled, "cancelled pending crane commands");
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Commands
    // ══════════════════════════════════════════════════════════════════════

    /// Queue a command. An idle executor starts on it at once.
    pub fn enqueue(&mut self, command: QueuedCommand) -> Completion {
        let id = self.push(command);
        self.start_if_idle();
        Completion::single(id)
    }

    /// Queue a recorded batch in order; the completion covers all of it.
    /// Nothing starts until the whole batch is queued, so a failure aborts
    /// every command behind it.
    pub fn replay(&mut self, commands: impl IntoIterator<Item = QueuedCommand>) -> Completion {
        let mut range: Option<(CommandId, CommandId)> = None;
        for command in commands {
            let id = self.push(command);
            range = Some(range.map_or((id, id), |(first, _)| (first, id)));
        }
        let completion = Completion { range };
        debug!(commands = completion.len(), "replaying crane commands");
        self.start_if_idle();
        completion
    }

    fn push(&mut self, command: QueuedCommand) -> CommandId {
        self.forget_old_states();
        let id = CommandId(self.base + self.states.len());
        self.states.push_back(CompletionState::Pending);
        self.queue.push_back((id, command));
        id
    }

    /// Drop the oldest settled outcomes beyond [`STATE_HISTORY`]. Every id
    /// before the animating or first queued command has settled.
    fn forget_old_states(&mut self) {
        let next = self.base + self.states.len();
        let first_pending = self
            .active
            .map(|anim| anim.id.0)
            .or_else(|| self.queue.front().map(|(id, _)| id.0))
            .unwrap_or(next);
        let settled = first_pending - self.base;
        if settled > STATE_HISTORY {
            let forget = settled - STATE_HISTORY;
            self.states.drain(..forget);
            self.base += forget;
        }
    }

    fn settle(&mut self, id: CommandId, state: CompletionState) {
        if let Some(slot) = id.0.checked_sub(self.base).and_then(|i| self.states.get_mut(i)) {
            *slot = state;
        }
    }

    /// Recorded outcomes for `ids`, or `None` once any of them is forgotten.
    fn states_for(&self, ids: RangeInclusive<usize>) -> Option<impl Iterator<Item = &CompletionState>> {
        let (first, last) = (ids.start().checked_sub(self.base)?, ids.end().checked_sub(self.base)?);
        if last >= self.states.len() {
            return None;
        }
        Some(self.states.range(first..=last))
    }

    fn start_if_idle(&mut self) {
        if self.active.is_none() {
            self.start_next();
        }
    }

    pub fn move_forward(&mut self) -> Completion {
        self.enqueue(QueuedCommand::new(Verb::Move))
    }

    pub fn turn_left(&mut self) -> Completion {
        self.enqueue(QueuedCommand::new(Verb::TurnLeft))
    }

    pub fn turn_right(&mut self) -> Completion {
        self.enqueue(QueuedCommand::new(Verb::TurnRight))
    }

    pub fn lift(&mut self) -> Completion {
        self.enqueue(QueuedCommand::new(Verb::Lift))
    }

    pub fn place(&mut self) -> Completion {
        self.enqueue(QueuedCommand::new(Verb::Place))
    }

    pub fn place_block(&mut self, kind: impl Into<String>) -> Completion {
        self.enqueue(QueuedCommand::place_block(kind))
    }

    pub fn dig(&mut self) -> Completion {
        self.enqueue(QueuedCommand::new(Verb::Dig))
    }

    /// Aggregate state of the commands a completion covers. A rejection
    /// anywhere wins over a cancellation, which wins over pending.
    pub fn poll(&self, completion: &Completion) -> CompletionState {
        let Some((first, last)) = completion.range else {
            return CompletionState::Resolved;
        };
        let Some(states) = self.states_for(first.0..=last.0) else {
            return CompletionState::Expired;
        };
        let mut aggregate = CompletionState::Resolved;
        for state in states {
            match state {
                CompletionState::Rejected(_) => return state.clone(),
                CompletionState::Cancelled => aggregate = CompletionState::Cancelled,
                CompletionState::Pending if aggregate == CompletionState::Resolved => {
                    aggregate = CompletionState::Pending;
                }
                _ => {}
            }
        }
        aggregate
    }

    /// How many of the covered commands have resolved. Zero once the
    /// completion has expired.
    pub fn resolved_count(&self, completion: &Completion) -> usize {
        completion
            .range
            .and_then(|(first, last)| self.states_for(first.0..=last.0))
            .map_or(0, |states| {
                states.filter(|s| **s == CompletionState::Resolved).count()
            })
    }

    // ══════════════════════════════════════════════════════════════════════
    // Clock
    // ══════════════════════════════════════════════════════════════════════

    /// Advance the animation clock. Finished steps resolve their command and
    /// start the next one; leftover time carries into it.
    pub fn tick(&mut self, elapsed: Duration) {
        let mut remaining = elapsed;
        while let Some(anim) = self.active.as_mut() {
            let needed = self.step.saturating_sub(anim.elapsed);
            if remaining < needed {
                anim.elapsed += remaining;
                return;
            }
            remaining -= needed;
            let id = anim.id;
            self.active = None;
            self.settle(id, CompletionState::Resolved);
            self.start_next();
        }
    }

    /// Run the clock until the queue drains. Returns the simulated time.
    pub fn wait_until_settled(&mut self) -> Duration {
        let step = self.step.max(Duration::from_millis(1));
        let mut waited = Duration::ZERO;
        while !self.is_settled() {
            self.tick(step);
            waited += step;
        }
        waited
    }

    /// Dequeue and apply the next command. Success starts its animation;
    /// failure rejects it along with everything still queued.
    fn start_next(&mut self) {
        let Some((id, command)) = self.queue.pop_front() else {
            return;
        };
        let from = self.visual_position();
        match self.apply(&command) {
            Ok(()) => {
                trace!(id = id.0, %command, x = self.crane.x, y = self.crane.y, "applied crane command");
                self.active = Some(Animation {
                    id,
                    from,
                    to: (f64::from(self.crane.x), f64::from(self.crane.y)),
                    elapsed: Duration::ZERO,
                });
            }
            Err(failure) => {
                warn!(id = id.0, %command, %failure, "crane command failed");
                self.settle(id, CompletionState::Rejected(failure.clone()));
                for (rest, _) in std::mem::take(&mut self.queue) {
                    self.settle(rest, CompletionState::Rejected(failure.clone()));
                }
            }
        }
    }

    /// Commit one command's effect. On failure nothing has changed.
    fn apply(&mut self, command: &QueuedCommand) -> Result<(), CraneFailure> {
        let (tx, ty) = self.crane.ahead();
        match command.verb {
            Verb::Move => {
                if !self.world.in_bounds(tx, ty) {
                    return Err(CraneFailure::OutOfBounds {
                        verb: Verb::Move,
                        x: tx,
                        y: ty,
                    });
                }
                self.crane.x = tx;
                self.crane.y = ty;
            }
            Verb::TurnLeft => self.crane.dir = self.crane.dir.turn_left(),
            Verb::TurnRight => self.crane.dir = self.crane.dir.turn_right(),
            Verb::Lift => {
                if let Some(carried) = &self.crane.carried {
                    return Err(CraneFailure::AlreadyCarrying {
                        carried: carried.clone(),
                    });
                }
                let z = self.world.top_z(tx, ty).ok_or(CraneFailure::NoBlock {
                    verb: Verb::Lift,
                    x: tx,
                    y: ty,
                })?;
                self.crane.carried = self.world.remove_block(tx, ty, z);
            }
            Verb::Place | Verb::PlaceBlock => {
                if !self.world.in_bounds(tx, ty) {
                    return Err(CraneFailure::OutOfBounds {
                        verb: command.verb,
                        x: tx,
                        y: ty,
                    });
                }
                let kind = match command.verb {
                    Verb::Place => self
                        .crane
                        .carried
                        .take()
                        .unwrap_or_else(|| self.default_supply.clone()),
                    _ => command
                        .arg
                        .clone()
                        .unwrap_or_else(|| DEFAULT_SUPPLY.to_string()),
                };
                let z = self.world.top_z(tx, ty).map_or(0, |top| top + 1);
                self.world.set_block(tx, ty, z, kind);
            }
            Verb::Dig => {
                let z = self.world.top_z(tx, ty).ok_or(CraneFailure::NoBlock {
                    verb: Verb::Dig,
                    x: tx,
                    y: ty,
                })?;
                self.world.remove_block(tx, ty, z);
            }
        }
        Ok(())
    }
}
