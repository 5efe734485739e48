//! Background thread that runs a full experiment off the caller's thread.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::config::Config;

use super::runner::{run_full_experiment, ExperimentResults, ProgressUpdate};

/// Messages sent from the experiment thread
#[derive(Debug)]
pub enum ExperimentEvent {
    Progress(ProgressUpdate),
    Complete(Box<ExperimentResults>),
    Cancelled,
    Error(String),
}

/// Lifecycle of a spawned experiment
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExperimentState {
    #[default]
    Running,
    Complete,
    /// Cancelled on request; partial work is discarded
    Cancelled,
    /// Invalid configuration or a panic inside the experiment
    Error(String),
}

impl ExperimentState {
    pub fn is_finished(&self) -> bool {
        *self != ExperimentState::Running
    }
}

/// Terminal result of [`ExperimentHandle::wait`]
#[derive(Debug)]
pub enum ExperimentOutcome {
    Complete(Box<ExperimentResults>),
    Cancelled,
    Error(String),
}

/// Handle for controlling the experiment thread
pub struct ExperimentHandle {
    thread: Option<JoinHandle<()>>,
    cancel: Arc<AtomicBool>,
    event_rx: Receiver<ExperimentEvent>,
    /// Current state, updated as events are received
    pub state: ExperimentState,
}

impl ExperimentHandle {
    /// Spawn a new experiment thread
    pub fn spawn(config: Config) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);

        let thread = thread::spawn(move || {
            run_worker(config, flag, event_tx);
        });

        Self {
            thread: Some(thread),
            cancel,
            event_rx,
            state: ExperimentState::Running,
        }
    }

    /// Ask the experiment to stop at the next unit boundary
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn observe(&mut self, event: &ExperimentEvent) {
        match event {
            ExperimentEvent::Progress(_) => {}
            ExperimentEvent::Complete(_) => self.state = ExperimentState::Complete,
            ExperimentEvent::Cancelled => self.state = ExperimentState::Cancelled,
            ExperimentEvent::Error(msg) => self.state = ExperimentState::Error(msg.clone()),
        }
    }

    /// Drain all pending events without blocking
    pub fn poll(&mut self) -> Vec<ExperimentEvent> {
        let mut events = Vec::new();
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => {
                    self.observe(&event);
                    events.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.state.is_finished() {
                        self.state = ExperimentState::Error("experiment thread exited unexpectedly".to_string());
                    }
                    break;
                }
            }
        }
        events
    }

    /// Block until the experiment finishes, forwarding progress updates
    pub fn wait<F>(mut self, mut on_progress: F) -> ExperimentOutcome
    where
        F: FnMut(&ProgressUpdate),
    {
        loop {
            let event = match self.event_rx.recv() {
                Ok(event) => event,
                Err(_) => return ExperimentOutcome::Error("experiment thread exited unexpectedly".to_string()),
            };
            self.observe(&event);
            match event {
                ExperimentEvent::Progress(update) => on_progress(&update),
                ExperimentEvent::Complete(results) => return ExperimentOutcome::Complete(results),
                ExperimentEvent::Cancelled => return ExperimentOutcome::Cancelled,
                ExperimentEvent::Error(msg) => return ExperimentOutcome::Error(msg),
            }
        }
    }

    /// Cancel and join the experiment thread
    pub fn shutdown(&mut self) {
        self.cancel();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for ExperimentHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "experiment panicked".to_string()
    }
}

/// Experiment loop running in the separate thread
fn run_worker(config: Config, cancel: Arc<AtomicBool>, event_tx: Sender<ExperimentEvent>) {
    if let Err(e) = config.validate() {
        log::error!("Invalid configuration: {}", e);
        let _ = event_tx.send(ExperimentEvent::Error(format!("invalid configuration: {}", e)));
        return;
    }

    let progress_tx = Mutex::new(event_tx.clone());
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_full_experiment(
            &config,
            |update| {
                if let Ok(tx) = progress_tx.lock() {
                    let _ = tx.send(ExperimentEvent::Progress(update));
                }
            },
            || cancel.load(Ordering::SeqCst),
        )
    }));

    let event = match outcome {
        Ok(Some(results)) => ExperimentEvent::Complete(Box::new(results)),
        Ok(None) => ExperimentEvent::Cancelled,
        Err(payload) => {
            let msg = panic_message(payload);
            log::error!("Experiment failed: {}", msg);
            ExperimentEvent::Error(msg)
        }
    };
    let _ = event_tx.send(event);
}
