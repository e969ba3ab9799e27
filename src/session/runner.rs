use std::future::pending;

use lgrid_core::{CoreError, FlushOutcome, Suggestion, SuggestionChoice};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::{spawn_blocking, JoinError, JoinHandle},
    time::{sleep_until, Instant},
};
use tracing::{debug, warn};

use crate::{
    errors::LedgerGridError,
    session::controller::SessionController,
    sync::SyncStatus,
};

/// Messages from the grid widget to a running session.
#[derive(Debug)]
pub enum SessionCommand {
    Edit {
        row: usize,
        col: usize,
        value: String,
    },
    Suggest {
        row: usize,
        col: usize,
        reply: oneshot::Sender<Option<Suggestion>>,
    },
    ApplySuggestion {
        row: usize,
        col: usize,
        choice: SuggestionChoice,
    },
    SaveNow,
    Close,
}

type FlushTask = JoinHandle<Result<FlushOutcome, CoreError>>;

enum Event {
    Command(Option<SessionCommand>),
    Flushed(Result<Result<FlushOutcome, CoreError>, JoinError>),
    Deadline,
}

/// Drives a [`SessionController`] from a command channel.
///
/// Edits are applied as they arrive; store I/O runs on the blocking pool so
/// editing continues while a flush is in flight.
pub struct SessionRunner {
    controller: SessionController,
    in_flight: Option<FlushTask>,
}

impl SessionRunner {
    pub fn new(controller: SessionController) -> Self {
        Self {
            controller,
            in_flight: None,
        }
    }

    /// Runs until [`SessionCommand::Close`] or until every sender is dropped,
    /// then flushes what is left and hands the closed controller back.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        status: watch::Sender<SyncStatus>,
    ) -> Result<SessionController, LedgerGridError> {
        publish(&status, self.controller.status());
        loop {
            let deadline = self.controller.next_flush_deadline();
            let event = tokio::select! {
                command = commands.recv() => Event::Command(command),
                joined = join_flush(&mut self.in_flight) => Event::Flushed(joined),
                _ = wait_until(deadline) => Event::Deadline,
            };
            match event {
                Event::Command(None) | Event::Command(Some(SessionCommand::Close)) => break,
                Event::Command(Some(command)) => self.handle(command),
                Event::Flushed(joined) => {
                    self.in_flight = None;
                    self.finish(joined);
                }
                Event::Deadline => {
                    if let Some(job) = self.controller.poll_flush(Instant::now()) {
                        self.in_flight = Some(spawn_blocking(move || job.run()));
                    }
                }
            }
            publish(&status, self.controller.status());
        }

        if let Some(task) = self.in_flight.take() {
            let joined = task.await;
            self.finish(joined);
        }
        if self.controller.is_dirty() {
            if let Some(job) = self.controller.begin_save(Instant::now()) {
                let joined = spawn_blocking(move || job.run()).await;
                self.finish(joined);
            }
        }
        if let Err(err) = self.controller.close() {
            warn!(error = %err, "final flush failed; unsaved edits are lost");
        }
        publish(&status, self.controller.status());
        Ok(self.controller)
    }

    fn handle(&mut self, command: SessionCommand) {
        let result = match command {
            SessionCommand::Edit { row, col, value } => self
                .controller
                .on_cell_changed(row, col, &value)
                .map(|outcome| debug!(row, col, ?outcome, "edit handled")),
            SessionCommand::Suggest { row, col, reply } => {
                let suggestion = self.controller.suggest(row, col);
                let _ = reply.send(suggestion.as_ref().ok().cloned().flatten());
                suggestion.map(|_| ())
            }
            SessionCommand::ApplySuggestion { row, col, choice } => self
                .controller
                .apply_suggestion(row, col, choice)
                .map(|outcome| debug!(row, col, ?outcome, "suggestion applied")),
            SessionCommand::SaveNow => {
                // Queued behind the in-flight flush when there is one.
                if let Some(job) = self.controller.begin_save(Instant::now()) {
                    self.in_flight = Some(spawn_blocking(move || job.run()));
                }
                Ok(())
            }
            SessionCommand::Close => Ok(()),
        };
        if let Err(err) = result {
            warn!(error = %err, "session command failed");
        }
    }

    fn finish(&mut self, joined: Result<Result<FlushOutcome, CoreError>, JoinError>) {
        let result = joined
            .map_err(|err| CoreError::Store(format!("flush task failed: {}", err)))
            .and_then(|result| result);
        // Failures are already reflected in the status and retried by the scheduler.
        let _ = self.controller.complete_flush(result, Instant::now());
    }
}

async fn join_flush(
    task: &mut Option<FlushTask>,
) -> Result<Result<FlushOutcome, CoreError>, JoinError> {
    match task {
        Some(handle) => handle.await,
        None => pending().await,
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

fn publish(status: &watch::Sender<SyncStatus>, current: &SyncStatus) {
    status.send_if_modified(|shown| {
        if shown == current {
            false
        } else {
            *shown = current.clone();
            true
        }
    });
}
