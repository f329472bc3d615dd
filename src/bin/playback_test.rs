#![cfg(not(tarpaulin_include))]

use algoviz::catalog::{self, Request};
use algoviz::controller::{PlaybackController, PlaybackMode, PlaybackState};
use algoviz::errors::VizError;
use algoviz::recorder::{CancelToken, StepRecorder};
use algoviz::sorting::{SortKind, sort, sort_with};
use algoviz::step::{Run, WorkingState};
use std::cell::Cell;
use std::time::Duration;

fn bubble_run() -> Run {
    sort(SortKind::Bubble, &[4, 3, 2, 1]).unwrap()
}

fn test_navigation() {
    println!("\n====== Testing step navigation ======");
    let mut ctrl = PlaybackController::new();
    assert_eq!(ctrl.state(), PlaybackState::Idle);
    assert!(ctrl.next().is_none());
    assert_eq!(ctrl.current_index(), None);
    println!("✓ a fresh controller is idle with no run");

    let run = bubble_run();
    let total = run.len();
    ctrl.start(run);
    assert_eq!(ctrl.state(), PlaybackState::Running);
    assert_eq!(ctrl.current_index(), Some(0));

    for expected in 1..total {
        assert!(ctrl.next().is_some());
        assert_eq!(ctrl.current_index(), Some(expected));
    }
    assert!(ctrl.is_finished());
    ctrl.next();
    assert_eq!(ctrl.current_index(), Some(total - 1));
    assert_eq!(ctrl.current_state(), Some(&WorkingState::Array(vec![1, 2, 3, 4])));
    println!("✓ next advances one step and clamps at the end");

    ctrl.previous().unwrap();
    assert_eq!(ctrl.current_index(), Some(total - 2));
    assert_eq!(ctrl.state(), PlaybackState::Running);
    ctrl.rewind().unwrap();
    assert_eq!(ctrl.current_index(), Some(0));
    assert!(ctrl.previous().unwrap().is_some());
    assert_eq!(ctrl.current_index(), Some(0));
    println!("✓ previous and rewind move back in materialized mode");

    ctrl.stop();
    assert_eq!(ctrl.state(), PlaybackState::Paused);
    println!("✓ stop pauses a running playback");
}

fn test_short_runs_finish_immediately() {
    println!("\n====== Testing single-step runs ======");
    let mut ctrl = PlaybackController::new();
    ctrl.start(sort(SortKind::Merge, &[9]).unwrap());
    assert!(ctrl.is_finished());
    assert_eq!(ctrl.current_index(), Some(0));
    println!("✓ a one-step run starts finished");
}

fn test_auto_play_stops_within_one_step() {
    println!("\n====== Testing auto play ======");
    let mut ctrl = PlaybackController::new();
    let run = bubble_run();
    let total = run.len();
    ctrl.start(run);

    let mut waits = Vec::new();
    let mut pacer = |d: Duration| waits.push(d);
    let advanced = ctrl.auto_play(Duration::from_millis(5), &mut pacer, &CancelToken::new());
    assert_eq!(advanced, total - 1);
    assert!(ctrl.is_finished());
    assert_eq!(waits.len(), total - 1);
    assert!(waits.iter().all(|&d| d == Duration::from_millis(5)));
    println!("✓ auto play runs to the end with one wait per tick");

    ctrl.start(bubble_run());
    let stop = CancelToken::new();
    let ticks = Cell::new(0usize);
    let mut pacer = |_: Duration| {
        ticks.set(ticks.get() + 1);
        if ticks.get() == 3 {
            stop.cancel();
        }
    };
    let advanced = ctrl.auto_play(Duration::ZERO, &mut pacer, &stop);
    assert_eq!(advanced, 3);
    assert_eq!(ctrl.current_index(), Some(3));
    assert_eq!(ctrl.state(), PlaybackState::Paused);
    println!("✓ a stop requested during a wait lets at most one step through");

    stop.reset();
    let mut idle = |_: Duration| {};
    let advanced = ctrl.auto_play(Duration::ZERO, &mut idle, &stop);
    assert_eq!(advanced, total - 4);
    assert!(ctrl.is_finished());
    println!("✓ auto play resumes a paused run");
}

fn test_cancellation_discards_the_run() {
    println!("\n====== Testing cancellation ======");
    let token = CancelToken::new();
    let seen = Cell::new(0usize);
    let observer_token = token.clone();
    let result = {
        let mut rec = StepRecorder::new().with_token(token.clone()).with_observer(|_| {
            seen.set(seen.get() + 1);
            if seen.get() == 5 {
                observer_token.cancel();
            }
        });
        let result = sort_with(SortKind::Quick, &[8, 3, 5, 1, 9, 2, 7], &mut rec);
        assert!(rec.is_sealed());
        assert_eq!(rec.len(), 5);
        result
    };
    assert_eq!(result, Err(VizError::Cancelled));
    assert_eq!(seen.get(), 5);
    println!("✓ no step is appended once the cancel flag is observed");

    let mut ctrl = PlaybackController::new();
    let old = ctrl.token();
    ctrl.start(bubble_run());
    assert!(old.is_cancelled());
    assert!(!ctrl.token().is_cancelled());
    println!("✓ starting a run cancels the previous run's token");
}

fn test_inline_mode() {
    println!("\n====== Testing inline playback ======");
    let request = catalog::parse_request("insertion", "3 1 2").unwrap();
    assert!(matches!(request, Request::Sort { .. }));

    let mut ctrl = PlaybackController::new();
    let mut ticks = 0usize;
    let mut pacer = |_: Duration| ticks += 1;
    ctrl.play_inline(Duration::ZERO, &mut pacer, |rec| catalog::generate_with(&request, rec))
        .unwrap();
    let total = ctrl.run().map(|r| r.len()).unwrap();
    assert_eq!(ticks, total);
    assert_eq!(ctrl.mode(), PlaybackMode::Inline);
    assert!(ctrl.is_finished());
    assert_eq!(ctrl.current_index(), Some(total - 1));
    println!("✓ inline playback waits once per generated step");

    assert!(matches!(ctrl.previous(), Err(VizError::Unsupported(_))));
    assert!(matches!(ctrl.rewind(), Err(VizError::Unsupported(_))));
    println!("✓ inline runs reject stepping back");

    let mut quiet = |_: Duration| {};
    let result = ctrl.play_inline(Duration::ZERO, &mut quiet, |_| Err(VizError::invalid("bad input")));
    assert!(result.is_err());
    assert_eq!(ctrl.state(), PlaybackState::Idle);
    assert!(ctrl.run().is_none());
    assert_eq!(ctrl.mode(), PlaybackMode::Materialized);
    assert!(matches!(ctrl.previous(), Ok(None)));
    println!("✓ a failed inline generation leaves the controller idle");
}

pub fn run_tests() {
    println!("Starting playback controller tests");
    test_navigation();
    test_short_runs_finish_immediately();
    test_auto_play_stops_within_one_step();
    test_cancellation_discards_the_run();
    test_inline_mode();
    println!("All tests passed!");
}

fn main() {
    run_tests();
}

#[cfg(test)]
mod tests {
    #[test]
    fn navigation() {
        super::test_navigation();
    }

    #[test]
    fn short_runs() {
        super::test_short_runs_finish_immediately();
    }

    #[test]
    fn auto_play() {
        super::test_auto_play_stops_within_one_step();
    }

    #[test]
    fn cancellation() {
        super::test_cancellation_discards_the_run();
    }

    #[test]
    fn inline_mode() {
        super::test_inline_mode();
    }
}
