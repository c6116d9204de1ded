//! cuestream CLI: print the dispatch schedule of a sequence file.
//!
//! Usage:
//!   cue-cli path/to/sequence.txt
//!   cue-cli path/to/sequence.txt --tick 0.02 --lookahead 0.1 --until 8
//!
//! Set `RUST_LOG=cue_engine=trace` to see every cue window.

use cuestream::{
    parse_sequence, CueEngine, CueTimer, Event, ReferenceClock, StreamKey, StreamState,
};
use std::{env, fs};
use tracing_subscriber::EnvFilter;

struct Options {
    path: String,
    tick: f64,
    lookahead: f64,
    until: f64,
}

fn flag(args: &[String], name: &str, default: f64) -> f64 {
    let Some(value) = args.iter().position(|a| a == name).and_then(|i| args.get(i + 1)) else {
        return default;
    };
    value.parse().unwrap_or_else(|_| {
        eprintln!("{} expects a number, got {}", name, value);
        std::process::exit(1);
    })
}

fn options() -> Options {
    let args: Vec<String> = env::args().collect();
    let path = args.get(1).filter(|a| !a.starts_with("--")).cloned().unwrap_or_else(|| {
        eprintln!("Usage: cue-cli <sequence.txt> [--tick secs] [--lookahead secs] [--until secs]");
        std::process::exit(1);
    });
    Options {
        path,
        tick: flag(&args, "--tick", 0.025).max(1e-4),
        lookahead: flag(&args, "--lookahead", 0.1),
        until: flag(&args, "--until", 16.0),
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let opts = options();
    let text = fs::read_to_string(&opts.path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", opts.path, e);
        std::process::exit(1);
    });
    let sequence = parse_sequence(&text).unwrap_or_else(|e| {
        eprintln!("Failed to parse {}: {}", opts.path, e);
        std::process::exit(1);
    });

    println!("Events:    {}", sequence.len());
    println!("Tick:      {} s", opts.tick);
    println!("Lookahead: {} s", opts.lookahead);
    println!();

    let mut engine = CueEngine::new(ReferenceClock::default(), CueTimer::new(opts.lookahead));
    let print = |time: f64, event: &Event, _: StreamKey| println!("{:>10.4}  {}", time, event);
    let key = engine.add_stream(&sequence, print).unwrap_or_else(|e| {
        eprintln!("Failed to add stream: {}", e);
        std::process::exit(1);
    });
    // End the stream by itself at the requested time
    let end_beat = engine.beat_at_time(key, opts.until).unwrap_or(opts.until);
    if let Err(e) = engine
        .set_duration(key, Some(end_beat.max(0.0)))
        .and_then(|_| engine.start(key, 0.0))
    {
        eprintln!("Failed to start: {}", e);
        std::process::exit(1);
    }

    let mut now = 0.0;
    while engine.state(key) == Ok(StreamState::Started) {
        let horizon = engine.tick(now);
        // Nothing left to hand over, so stop without waiting for --until
        if engine.is_drained(key) == Ok(true) && engine.state(key) == Ok(StreamState::Started) {
            if let Err(e) = engine.stop(key, horizon) {
                eprintln!("Failed to stop: {}", e);
                std::process::exit(1);
            }
        }
        now += opts.tick;
    }

    let finished = engine.take_finished(key).ok().flatten().unwrap_or(opts.until);
    let beat = engine.beat_at_time(key, finished).unwrap_or_default();
    let bar = engine.bar_at_beat(key, beat).unwrap_or_default();
    println!();
    println!("Stopped at {:.4} s, beat {:.3} (bar {:.3})", finished, beat, bar);
}
