//! Observer that records every callback in order.

use std::sync::Mutex;

use winjobs_core::{JobError, JobObserver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Succeed(usize, String),
    Fail(usize),
    Executed(usize),
}

#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl JobObserver<String, String> for Recorder {
    fn on_job_succeed(&self, index: usize, result: &String) {
        self.push(Event::Succeed(index, result.clone()));
    }

    fn on_job_fail(&self, index: usize, _error: &JobError<String>) {
        self.push(Event::Fail(index));
    }

    fn on_job_executed(&self, index: usize) {
        self.push(Event::Executed(index));
    }
}
