/*!
# algoviz

Step generators and a playback controller for educational algorithm visualizers.

## Overview

Every visualized algorithm runs as a pure engine that turns a configuration
into a `Run`: the initial working state, an ordered list of discrete steps,
the final state and the algorithm's answer. Each step carries a snapshot of
the working state right after it took effect, so a renderer can jump to any
index without re-executing anything. Pacing lives in the playback controller,
never in the engines.

## Architecture

### Core
- **step**: Step, WorkingState, Outcome and Run
- **recorder**: append-only step log with a cancellation token and an optional per-step observer
- **controller**: `Idle → Running → {Paused, Finished}` navigation over a Run, with auto play

### Engines
- **sorting**: bubble, selection, insertion, merge, quick (Lomuto) and heap sort
- **searching**: linear and binary search
- **bst**: arena-backed binary search tree with insert, delete, successor and traversals
- **greedy**: activity selection, fractional knapsack, Huffman coding
- **dp**: Fibonacci, LCS, 0/1 knapsack, coin change
- **convolution**: 2-D convolution with stride and zero padding

### Boundary
- **catalog**: algorithm names and dispatch from raw input text to engines
- **config**: regex-based input parsing, random arrays, CLI settings
- **saving**: gzip-compressed bincode trace files, JSON export
- **app**: JSON HTTP API over per-session controllers (feature `web`)

## Usage

```text
$ algoviz 10 300
(ok) > run quick 5 3 8 1
(ok) > play
(ok) > save quick.trace.gz
```

## Errors

Engines validate their configuration before recording anything and return
`VizError`. A cancelled generation returns `VizError::Cancelled` and never a
partial run. Unreachable targets (a missing search key, an amount no coins
make) are outcomes, not errors.
*/

pub mod bst;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod convolution;
pub mod dp;
pub mod errors;
pub mod greedy;
pub mod recorder;
pub mod saving;
pub mod searching;
pub mod sorting;
pub mod step;

#[cfg(feature = "web")]
pub mod app;

pub use catalog::{Algorithm, Request, generate, generate_with, parse_request};
pub use controller::{Pacer, PlaybackController, PlaybackMode, PlaybackState, SleepPacer};
pub use errors::VizError;
pub use recorder::{CancelToken, StepRecorder};
pub use step::{Outcome, Run, RunStats, Step, StepKind, WorkingState};
