//! Benchmarks for tempo conversion and the cue loop.
//!
//! Run with: cargo bench -p cue-engine
//!
//! A host typically cues every 10-25 ms, so a full cue cycle should stay
//! far below that.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cue_engine::{CueEngine, CueTimer, ReferenceClock, StreamKey, TempoMap};
use cue_ir::{CurveKind, Event};

/// Number of rate events in the tempo maps under test.
const RATE_COUNTS: &[usize] = &[1, 16, 256];

fn rate_sequence(count: usize) -> Vec<Event> {
    (0..count)
        .map(|i| {
            let curve = match i % 3 {
                0 => CurveKind::Step,
                1 => CurveKind::Linear,
                _ => CurveKind::Exponential,
            };
            Event::rate(i as f64 * 4.0, 1.0 + (i % 5) as f64 * 0.5, curve)
        })
        .collect()
}

fn note_sequence(notes: usize) -> Vec<Event> {
    let mut events = rate_sequence(8);
    for i in 0..notes {
        events.push(Event::note(i as f64 * 0.25, 60 + (i % 24) as u8, 0.8, 0.2));
    }
    for i in 0..notes / 8 {
        events.push(Event::param(i as f64 * 2.0, "cutoff", i as f64, CurveKind::Linear).unwrap());
    }
    events
}

fn bench_tempo_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("tempo_map");

    for &count in RATE_COUNTS {
        let sequence = rate_sequence(count);
        let end = count as f64 * 4.0;

        let mut map = TempoMap::from_sequence(&sequence);
        group.bench_with_input(BenchmarkId::new("time_at_beat", count), &count, |b, _| {
            b.iter(|| map.time_at_beat(black_box(end * 0.75)))
        });

        let mut map = TempoMap::from_sequence(&sequence);
        let time = map.time_at_beat(end * 0.75);
        group.bench_with_input(BenchmarkId::new("beat_at_time", count), &count, |b, _| {
            b.iter(|| map.beat_at_time(black_box(time)))
        });

        group.bench_with_input(BenchmarkId::new("rebuild", count), &count, |b, _| {
            b.iter(|| {
                let mut map = TempoMap::from_sequence(&sequence);
                map.time_at_beat(end);
                black_box(map.time_at_beat(black_box(end)))
            })
        });
    }

    group.finish();
}

fn bench_cue(c: &mut Criterion) {
    let mut group = c.benchmark_group("cue");

    for &notes in &[64usize, 1024] {
        group.bench_with_input(BenchmarkId::new("full_run", notes), &notes, |b, &notes| {
            let sequence = note_sequence(notes);
            b.iter(|| {
                let mut engine = CueEngine::new(ReferenceClock::default(), CueTimer::new(0.05));
                let key = engine
                    .add_stream(&sequence, |t: f64, e: &Event, _: StreamKey| {
                        black_box((t, e));
                    })
                    .unwrap();
                engine.start(key, 0.0).unwrap();
                let mut now = 0.0;
                while now < notes as f64 * 0.25 {
                    engine.tick(now);
                    now += 0.02;
                }
            })
        });
    }

    group.bench_function("idle_tick", |b| {
        let mut engine = CueEngine::new(ReferenceClock::default(), CueTimer::new(0.05));
        let key = engine
            .add_stream(&[], |_: f64, _: &Event, _: StreamKey| {})
            .unwrap();
        engine.start(key, 0.0).unwrap();
        let mut now = 0.0;
        b.iter(|| {
            now += 0.01;
            black_box(engine.tick(now))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_tempo_map, bench_cue);
criterion_main!(benches);
