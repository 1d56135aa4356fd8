//! Tick sources and the async loop that drives a [`SessionTimer`].
//!
//! Ticks and queued user commands are interleaved on a single task, so the
//! timer only ever sees one transition at a time.

use std::future::Future;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{Baseline, Modality};
use crate::timer::{SessionTimer, TimerEvent};

/// Source of one-second ticks
pub trait TickSource {
    /// Resolves at the next tick. Must be cancel-safe: dropping the future
    /// before it resolves must not consume a tick.
    fn next_tick(&mut self) -> impl Future<Output = ()> + Send;
}

impl TickSource for tokio::time::Interval {
    fn next_tick(&mut self) -> impl Future<Output = ()> + Send {
        async move {
            self.tick().await;
        }
    }
}

/// Wall-clock ticks once per second, the first one a second from now
pub fn every_second() -> tokio::time::Interval {
    let period = Duration::from_secs(1);
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Yields a fixed number of ticks immediately, then never again
#[derive(Debug, Clone)]
pub struct ManualTicks {
    remaining: u64,
}

impl ManualTicks {
    pub fn new(count: u64) -> Self {
        Self { remaining: count }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl TickSource for ManualTicks {
    fn next_tick(&mut self) -> impl Future<Output = ()> + Send {
        async move {
            if self.remaining == 0 {
                std::future::pending::<()>().await;
            }
            self.remaining -= 1;
        }
    }
}

/// User controls queued for the driver
#[derive(Debug, Clone)]
pub enum TimerCommand {
    Start {
        modality: Option<Modality>,
        baseline: Option<Baseline>,
    },
    Pause,
    Resume,
    SkipToEnd,
    Reset,
    RecordOutput {
        index: usize,
        amount: Decimal,
    },
}

impl TimerCommand {
    fn name(&self) -> &'static str {
        match self {
            TimerCommand::Start { .. } => "start",
            TimerCommand::Pause => "pause",
            TimerCommand::Resume => "resume",
            TimerCommand::SkipToEnd => "skip_to_end",
            TimerCommand::Reset => "reset",
            TimerCommand::RecordOutput { .. } => "record_output",
        }
    }
}

/// Why [`drive`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The session reached Completed
    Completed,
    /// Every command sender was dropped
    CommandsClosed,
}

/// Apply one command to the timer
pub fn apply_command(timer: &mut SessionTimer, command: TimerCommand) -> Result<Option<TimerEvent>> {
    match command {
        TimerCommand::Start { modality, baseline } => timer
            .start(modality.as_ref(), baseline.as_ref())
            .map(Some),
        TimerCommand::Pause => timer.pause().map(Some),
        TimerCommand::Resume => timer.resume().map(Some),
        TimerCommand::SkipToEnd => timer.skip_to_end().map(Some),
        TimerCommand::Reset => Ok(Some(timer.reset())),
        TimerCommand::RecordOutput { index, amount } => {
            timer.record_output(index, amount).map(|_| None)
        }
    }
}

/// Run the timer until it completes or the command channel closes.
///
/// Queued commands take priority over ticks, and ticks are only awaited
/// while the timer is running. Events go to `events`; a dropped receiver
/// does not stop the session.
pub async fn drive<T: TickSource>(
    timer: &mut SessionTimer,
    ticker: &mut T,
    commands: &mut mpsc::Receiver<TimerCommand>,
    events: &mpsc::UnboundedSender<TimerEvent>,
) -> DriveOutcome {
    loop {
        if timer.state().is_completed() {
            debug!("Driver stopping: session completed");
            return DriveOutcome::Completed;
        }
        let running = timer.state().is_running();

        tokio::select! {
            biased;

            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("Driver stopping: command channel closed");
                    return DriveOutcome::CommandsClosed;
                };
                let name = command.name();
                match apply_command(timer, command) {
                    Ok(Some(event)) => publish(events, event),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(command = name, error = %e, "Timer command rejected");
                        publish(events, TimerEvent::CommandRejected {
                            command: name.to_string(),
                            message: e.user_message(),
                        });
                    }
                }
            }

            _ = ticker.next_tick(), if running => {
                if let Some(event) = timer.tick() {
                    publish(events, event);
                }
            }
        }
    }
}

fn publish(events: &mpsc::UnboundedSender<TimerEvent>, event: TimerEvent) {
    let _ = events.send(event);
}
