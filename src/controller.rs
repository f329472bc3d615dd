use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{Result, VizError};
use crate::recorder::{CancelToken, StepRecorder};
use crate::step::{Run, Step, WorkingState};

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
    Paused,
    Finished,
}

/// How the steps reach the controller.
///
/// `Materialized` runs are generated up front and can be stepped both ways.
/// `Inline` runs were animated while the engine produced them, so only
/// forward navigation is meaningful.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum PlaybackMode {
    Materialized,
    Inline,
}

/// Waits between auto-play ticks. Real-time pacing belongs to the caller.
pub trait Pacer {
    fn wait(&mut self, interval: Duration);

    /// Sees each step as playback reaches it.
    fn on_step(&mut self, _step: &Step) {}
}

pub struct SleepPacer;

impl Pacer for SleepPacer {
    fn wait(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

impl<F: FnMut(Duration)> Pacer for F {
    fn wait(&mut self, interval: Duration) {
        self(interval)
    }
}

pub struct PlaybackController {
    run: Option<Run>,
    index: usize,
    state: PlaybackState,
    mode: PlaybackMode,
    token: CancelToken,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackController {
    pub fn new() -> Self {
        PlaybackController {
            run: None,
            index: 0,
            state: PlaybackState::Idle,
            mode: PlaybackMode::Materialized,
            token: CancelToken::new(),
        }
    }

    /// Token of the live run; engines generating for this controller should carry it.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Requests cancellation of whatever is generating under the current token.
    pub fn cancel(&mut self) {
        self.token.cancel();
    }

    fn replace_token(&mut self) {
        self.token.cancel();
        self.token = CancelToken::new();
    }

    pub fn start(&mut self, run: Run) {
        self.start_in(run, PlaybackMode::Materialized);
    }

    /// Cancels whatever is generating and hands out the token the next run
    /// should be generated under, for callers that generate off this controller.
    pub fn begin(&mut self) -> CancelToken {
        self.replace_token();
        self.token.clone()
    }

    /// Loads a run generated under a token from `begin`. Returns `false`, and
    /// leaves the controller alone, if that token was cancelled since.
    pub fn install(&mut self, run: Run, token: &CancelToken) -> bool {
        if token.is_cancelled() {
            return false;
        }
        self.load(run, PlaybackMode::Materialized);
        true
    }

    pub fn start_in(&mut self, run: Run, mode: PlaybackMode) {
        self.replace_token();
        self.load(run, mode);
    }

    fn load(&mut self, run: Run, mode: PlaybackMode) {
        log::info!("starting {:?} playback of {} ({} steps)", mode, run.algorithm.name(), run.len());
        self.state = if run.len() <= 1 {
            PlaybackState::Finished
        } else {
            PlaybackState::Running
        };
        self.index = 0;
        self.mode = mode;
        self.run = Some(run);
    }

    /// Runs `generate` with a recorder that waits `interval` after every step,
    /// then leaves the finished run on its last step. A cancelled generation
    /// leaves the controller idle with no run.
    pub fn play_inline<F>(&mut self, interval: Duration, pacer: &mut dyn Pacer, generate: F) -> Result<()>
    where
        F: FnOnce(&mut StepRecorder) -> Result<Run>,
    {
        self.replace_token();
        self.run = None;
        self.index = 0;
        self.state = PlaybackState::Running;
        let token = self.token.clone();

        let result = {
            let mut rec = StepRecorder::new()
                .with_token(token)
                .with_observer(|step| {
                    pacer.on_step(step);
                    pacer.wait(interval);
                });
            generate(&mut rec)
        };
        match result {
            Ok(run) => {
                self.index = run.len().saturating_sub(1);
                self.state = PlaybackState::Finished;
                self.mode = PlaybackMode::Inline;
                self.run = Some(run);
                Ok(())
            }
            Err(e) => {
                self.state = PlaybackState::Idle;
                self.mode = PlaybackMode::Materialized;
                Err(e)
            }
        }
    }

    pub fn next(&mut self) -> Option<&Step> {
        let len = self.run.as_ref()?.len();
        if self.state == PlaybackState::Idle {
            return None;
        }
        if self.index + 1 < len {
            self.index += 1;
        }
        if self.index + 1 >= len {
            self.state = PlaybackState::Finished;
        }
        self.current_step()
    }

    pub fn previous(&mut self) -> Result<Option<&Step>> {
        if self.mode == PlaybackMode::Inline {
            return Err(VizError::Unsupported(
                "stepping back through an inline run".to_string(),
            ));
        }
        if self.run.is_none() {
            return Ok(None);
        }
        if self.index > 0 {
            self.index -= 1;
            if self.state == PlaybackState::Finished {
                self.state = PlaybackState::Running;
            }
        }
        Ok(self.current_step())
    }

    /// Back to the first step of the current run.
    pub fn rewind(&mut self) -> Result<()> {
        if self.mode == PlaybackMode::Inline {
            return Err(VizError::Unsupported("rewinding an inline run".to_string()));
        }
        if let Some(run) = &self.run {
            self.index = 0;
            self.state = if run.len() <= 1 {
                PlaybackState::Finished
            } else {
                PlaybackState::Running
            };
        }
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.state == PlaybackState::Running {
            self.state = PlaybackState::Paused;
        }
    }

    /// Calls `next` once per tick until the run finishes or `stop` is set.
    ///
    /// `stop` is checked once per tick, before the wait, so a request made
    /// during a wait lets that tick's step through. Returns the number of
    /// steps advanced.
    pub fn auto_play(&mut self, interval: Duration, pacer: &mut dyn Pacer, stop: &CancelToken) -> usize {
        if self.run.is_none() || self.state == PlaybackState::Idle {
            return 0;
        }
        if self.state == PlaybackState::Paused {
            self.state = PlaybackState::Running;
        }
        let mut advanced = 0;
        while self.state != PlaybackState::Finished {
            if stop.is_cancelled() {
                self.state = PlaybackState::Paused;
                break;
            }
            pacer.wait(interval);
            if let Some(step) = self.next() {
                pacer.on_step(step);
            }
            advanced += 1;
        }
        advanced
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_finished(&self) -> bool {
        self.state == PlaybackState::Finished
    }

    pub fn current_index(&self) -> Option<usize> {
        self.run.as_ref().map(|_| self.index)
    }

    pub fn run(&self) -> Option<&Run> {
        self.run.as_ref()
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.run.as_ref()?.step(self.index)
    }

    pub fn current_state(&self) -> Option<&WorkingState> {
        self.run.as_ref().map(|r| r.state_at(self.index))
    }
}
