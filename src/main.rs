#![cfg(not(tarpaulin_include))]

use algoviz::catalog::{self, Algorithm, Request};
use algoviz::config::{self, Settings};
use algoviz::controller::{Pacer, PlaybackController, PlaybackState};
use algoviz::recorder::CancelToken;
use algoviz::saving;
use algoviz::step::{Step, Value, WorkingState};
use std::env;
use std::io::{self, Write};
use std::time::{Duration, Instant};

fn render_state(state: &WorkingState) -> String {
    match state {
        WorkingState::Array(values) => format!(
            "[{}]",
            values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
        ),
        WorkingState::Table(rows) => rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&v| format!("{:>4}", Value::from(v).to_string()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .collect::<Vec<_>>()
            .join("\n"),
        WorkingState::Matrix(rows) => rows
            .iter()
            .map(|row| row.iter().map(|v| format!("{:>8.2}", v)).collect::<Vec<_>>().join(""))
            .collect::<Vec<_>>()
            .join("\n"),
        WorkingState::Tree(tree) => {
            let mut lines = Vec::new();
            let mut stack: Vec<(usize, usize)> = tree.root.map(|r| (r, 0)).into_iter().collect();
            while let Some((id, depth)) = stack.pop() {
                let node = &tree.nodes[id];
                lines.push(format!("{}{}", "  ".repeat(depth), node.value));
                if let Some(r) = node.right {
                    stack.push((r, depth + 1));
                }
                if let Some(l) = node.left {
                    stack.push((l, depth + 1));
                }
            }
            if lines.is_empty() {
                "(empty tree)".to_string()
            } else {
                lines.join("\n")
            }
        }
        WorkingState::Selection { chosen, total } => format!("chosen {:?}, total {}", chosen, total),
        WorkingState::Queue(nodes) => nodes
            .iter()
            .map(|(label, freq)| format!("{}:{}", label, freq))
            .collect::<Vec<_>>()
            .join("  "),
    }
}

fn render_step(index: usize, total: usize, step: &Step) {
    println!("step {}/{}  {}  {}", index + 1, total, step.kind.name(), step.annotation);
    println!("{}", render_state(&step.state));
}

fn show(ctrl: &PlaybackController) {
    let Some(run) = ctrl.run() else {
        println!("no run loaded");
        return;
    };
    match (ctrl.current_index(), ctrl.current_step()) {
        (Some(i), Some(step)) => render_step(i, run.len(), step),
        _ => println!("{}", render_state(&run.initial)),
    }
    if ctrl.is_finished() {
        println!("outcome: {:?}", run.outcome);
    }
}

/// Prints every step playback reaches and sleeps between ticks.
struct PrintingPacer {
    shown: usize,
}

impl Pacer for PrintingPacer {
    fn wait(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }

    fn on_step(&mut self, step: &Step) {
        self.shown += 1;
        println!("{:>4}  {:<10} {}", self.shown, step.kind.name(), step.annotation);
    }
}

fn request_for(name: &str, input: &str, settings: &Settings) -> algoviz::errors::Result<Request> {
    let sortable = matches!(
        Algorithm::from_name(name),
        Some(
            Algorithm::BubbleSort
                | Algorithm::SelectionSort
                | Algorithm::InsertionSort
                | Algorithm::MergeSort
                | Algorithm::QuickSort
                | Algorithm::HeapSort
        )
    );
    if input.is_empty() && sortable {
        let values = config::random_array(settings.array_size, settings.seed)?;
        let listed = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ");
        return catalog::parse_request(name, &listed);
    }
    catalog::parse_request(name, input)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    let settings = match Settings::from_args(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Usage: {} [array_size] [interval_ms] [seed]", args[0]);
            return Ok(());
        }
    };

    let mut ctrl = PlaybackController::new();
    let mut status = String::from("ok");
    let mut start_time = Instant::now();
    loop {
        let elapsed_time = start_time.elapsed().as_secs_f64();
        print!("[{:.1}] ({}) > ", elapsed_time, status);
        io::stdout().flush()?;

        let mut command = String::new();
        if io::stdin().read_line(&mut command).is_err() || command.is_empty() {
            break;
        }
        let command = command.trim();
        start_time = Instant::now();

        if command.is_empty() {
            status = String::from("invalid command");
            continue;
        }
        let (verb, rest) = match command.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (command, ""),
        };

        match verb {
            "q" => break,
            "help" => {
                println!("Commands:");
                println!("  run <algorithm> <input>: Generate a run and start playback");
                println!("  inline <algorithm> <input>: Animate while generating (forward only)");
                println!("  n: Next step");
                println!("  p: Previous step");
                println!("  r: Rewind to the first step");
                println!("  play [ms]: Auto play until the run finishes");
                println!("  show: Show the current step");
                println!("  stats: Step counts for the run");
                println!("  save <file>: Save the run as a compressed trace");
                println!("  load <file>: Load a saved trace");
                println!("  json <file>: Export the run as JSON");
                println!("  list: List algorithms and their input syntax");
                println!("  q: Quit");
                status = String::from("ok");
            }
            "list" => {
                for entry in catalog::entries() {
                    println!("  {:<12} {:<44} {}", entry.name, entry.description, entry.syntax);
                }
                status = String::from("ok");
            }
            "run" | "inline" => {
                let (name, input) = match rest.split_once(char::is_whitespace) {
                    Some((name, input)) => (name, input.trim()),
                    None => (rest, ""),
                };
                let request = match request_for(name, input, &settings) {
                    Ok(request) => request,
                    Err(e) => {
                        status = e.to_string();
                        continue;
                    }
                };
                if verb == "run" {
                    match catalog::generate(&request) {
                        Ok(run) => {
                            ctrl.start(run);
                            show(&ctrl);
                            status = String::from("ok");
                        }
                        Err(e) => status = e.to_string(),
                    }
                } else {
                    let mut pacer = PrintingPacer { shown: 0 };
                    let interval = Duration::from_millis(settings.interval_ms);
                    status = match ctrl.play_inline(interval, &mut pacer, |rec| catalog::generate_with(&request, rec)) {
                        Ok(()) => String::from("ok"),
                        Err(e) => e.to_string(),
                    };
                }
            }
            "n" => {
                status = match ctrl.next() {
                    Some(_) => String::from("ok"),
                    None => String::from("no run"),
                };
                show(&ctrl);
            }
            "p" => {
                status = match ctrl.previous() {
                    Ok(Some(_)) => String::from("ok"),
                    Ok(None) => String::from("no run"),
                    Err(e) => e.to_string(),
                };
                show(&ctrl);
            }
            "r" => {
                status = match ctrl.rewind() {
                    Ok(()) => String::from("ok"),
                    Err(e) => e.to_string(),
                };
                show(&ctrl);
            }
            "play" => {
                let interval = rest.parse().unwrap_or(settings.interval_ms);
                let mut pacer = PrintingPacer {
                    shown: ctrl.current_index().unwrap_or(0) + 1,
                };
                let advanced = ctrl.auto_play(Duration::from_millis(interval), &mut pacer, &CancelToken::new());
                show(&ctrl);
                status = if ctrl.state() == PlaybackState::Finished {
                    format!("finished after {} steps", advanced)
                } else {
                    String::from("no run")
                };
            }
            "show" => {
                show(&ctrl);
                status = String::from("ok");
            }
            "stats" => match ctrl.run() {
                Some(run) => {
                    let stats = run.stats();
                    println!(
                        "{}: {} steps, {} compares, {} swaps, {} assigns, {} visits",
                        run.algorithm.name(),
                        run.len(),
                        stats.compares,
                        stats.swaps,
                        stats.assigns,
                        stats.visits
                    );
                    status = String::from("ok");
                }
                None => status = String::from("no run"),
            },
            "save" | "json" if rest.is_empty() => status = String::from("missing file name"),
            "save" => match ctrl.run() {
                Some(run) => {
                    status = match saving::save_run(run, rest) {
                        Ok(()) => String::from("ok"),
                        Err(e) => e.to_string(),
                    }
                }
                None => status = String::from("no run"),
            },
            "json" => match ctrl.run() {
                Some(run) => {
                    status = match saving::export_json(run, rest) {
                        Ok(()) => String::from("ok"),
                        Err(e) => e.to_string(),
                    }
                }
                None => status = String::from("no run"),
            },
            "load" if rest.is_empty() => status = String::from("missing file name"),
            "load" => {
                status = match saving::load_run(rest) {
                    Ok(run) => {
                        ctrl.start(run);
                        show(&ctrl);
                        String::from("ok")
                    }
                    Err(e) => e.to_string(),
                };
            }
            _ => status = String::from("invalid command"),
        }
    }
    Ok(())
}
