use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::{Result, VizError};
use crate::step::Step;

/// User-triggered intent to abandon a run, inspected between steps.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

type Observer<'a> = Box<dyn FnMut(&Step) + 'a>;

/// Append-only step log owned by the run being generated.
///
/// Once an attached token is observed as cancelled the log is sealed:
/// later `record` calls are dropped and `checkpoint` fails.
#[derive(Default)]
pub struct StepRecorder<'a> {
    steps: Vec<Step>,
    token: Option<CancelToken>,
    observer: Option<Observer<'a>>,
    sealed: bool,
}

impl<'a> StepRecorder<'a> {
    pub fn new() -> Self {
        StepRecorder {
            steps: Vec::new(),
            token: None,
            observer: None,
            sealed: false,
        }
    }

    pub fn with_token(mut self, token: CancelToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Calls `observer` with every step as it is appended.
    pub fn with_observer(mut self, observer: impl FnMut(&Step) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    fn observe_cancel(&mut self) -> bool {
        if !self.sealed && self.token.as_ref().is_some_and(|t| t.is_cancelled()) {
            log::debug!("cancellation observed after {} steps", self.steps.len());
            self.sealed = true;
        }
        self.sealed
    }

    pub fn record(&mut self, step: Step) {
        if self.observe_cancel() {
            return;
        }
        self.steps.push(step);
        if let (Some(observer), Some(last)) = (self.observer.as_mut(), self.steps.last()) {
            observer(last);
        }
    }

    /// Yield point for engines: fails once cancellation has been requested.
    pub fn checkpoint(&mut self) -> Result<()> {
        if self.observe_cancel() {
            Err(VizError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    /// Moves the log out, leaving the token and observer attached.
    pub fn take_steps(&mut self) -> Vec<Step> {
        std::mem::take(&mut self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::{StepKind, WorkingState};

    fn step(i: i64) -> Step {
        Step::new(StepKind::Visit, WorkingState::Array(vec![i])).key(i)
    }

    #[test]
    fn records_in_order() {
        let mut rec = StepRecorder::new();
        rec.record(step(1));
        rec.record(step(2));
        let keys: Vec<i64> = rec.steps().iter().flat_map(|s| s.index_keys()).collect();
        assert_eq!(keys, vec![1, 2]);
    }

    #[test]
    fn sealed_after_cancel() {
        let token = CancelToken::new();
        let mut rec = StepRecorder::new().with_token(token.clone());
        rec.record(step(1));
        assert!(rec.checkpoint().is_ok());
        token.cancel();
        rec.record(step(2));
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.checkpoint(), Err(VizError::Cancelled));
        assert!(rec.is_sealed());
    }

    #[test]
    fn observer_sees_each_step() {
        let mut seen = 0;
        {
            let mut rec = StepRecorder::new().with_observer(|_| seen += 1);
            rec.record(step(1));
            rec.record(step(2));
        }
        assert_eq!(seen, 2);
    }
}
