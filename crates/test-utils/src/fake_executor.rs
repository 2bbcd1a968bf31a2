use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use poolrun::dag::Task;
use poolrun::errors::Result;
use poolrun::exec::{Outcome, RunLog, TaskExecutor};

/// Something the fake executor observed, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Started(String),
    Finished(String),
}

/// A fake executor that:
/// - records every task it was asked to run (after `{input}` resolution)
/// - records start/finish events so tests can check overlap and ordering
/// - returns a scripted `Outcome` per task name, `Success` otherwise
/// - optionally sleeps while "running"
#[derive(Clone, Default)]
pub struct FakeExecutor {
    outcomes: Arc<Mutex<HashMap<String, Outcome>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    default_delay: Duration,
    executed: Arc<Mutex<Vec<Task>>>,
    events: Arc<Mutex<Vec<ExecEvent>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every task sleeps for `delay` before reporting.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    /// Task `name` sleeps for `delay` instead of the default.
    pub fn delay_task(self, name: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(name.to_string(), delay);
        self
    }

    /// Task `name` returns `outcome`.
    pub fn script(self, name: &str, outcome: Outcome) -> Self {
        self.outcomes.lock().unwrap().insert(name.to_string(), outcome);
        self
    }

    /// Task `name` exits with `code`.
    pub fn fail(self, name: &str, code: i32) -> Self {
        self.script(
            name,
            Outcome::Failure {
                exit_code: Some(code),
                elapsed: Duration::ZERO,
            },
        )
    }

    /// Names of executed tasks, in start order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().iter().map(|t| t.name.clone()).collect()
    }

    /// The resolved task passed for `name`, if it ran.
    pub fn task(&self, name: &str) -> Option<Task> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name == name)
            .cloned()
    }

    pub fn events(&self) -> Vec<ExecEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Position of an event in the recorded order.
    pub fn position(&self, event: &ExecEvent) -> Option<usize> {
        self.events.lock().unwrap().iter().position(|e| e == event)
    }
}

impl TaskExecutor for FakeExecutor {
    fn execute<'a>(
        &'a self,
        task: &'a Task,
        log: &'a RunLog,
    ) -> Pin<Box<dyn Future<Output = Result<Outcome>> + Send + 'a>> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(task.clone());
            self.events
                .lock()
                .unwrap()
                .push(ExecEvent::Started(task.name.clone()));

            log.begin_entry(&format!("Running {}: {}", task.name, task.display_command()))
                .await?;

            let delay = self
                .delays
                .lock()
                .unwrap()
                .get(&task.name)
                .copied()
                .unwrap_or(self.default_delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let outcome = self
                .outcomes
                .lock()
                .unwrap()
                .get(&task.name)
                .cloned()
                .unwrap_or(Outcome::Success { elapsed: delay });

            self.events
                .lock()
                .unwrap()
                .push(ExecEvent::Finished(task.name.clone()));
            Ok(outcome)
        })
    }
}
