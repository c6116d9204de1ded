//! Cue loop scenarios driven through the public engine API.

use cuestream::{
    CueEngine, CueObserver, CueTimer, CueWindow, CurveKind, Distribute, Event, EventKind,
    ParamName, ReferenceClock, StreamKey, StreamState,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct Log(Rc<RefCell<Vec<(f64, Event)>>>);

impl Log {
    fn times(&self) -> Vec<f64> {
        self.0.borrow().iter().map(|(t, _)| *t).collect()
    }

    fn kinds(&self) -> Vec<EventKind> {
        self.0.borrow().iter().map(|(_, e)| e.kind()).collect()
    }

    fn len(&self) -> usize {
        self.0.borrow().len()
    }
}

impl Distribute for Log {
    fn distribute(&mut self, time: f64, event: &Event, _stream: StreamKey) {
        self.0.borrow_mut().push((time, event.clone()));
    }
}

#[derive(Clone, Default)]
struct Windows(Rc<RefCell<Vec<(CueWindow, usize)>>>, Rc<RefCell<usize>>);

impl CueObserver for Windows {
    fn cued(&mut self, _stream: StreamKey, window: CueWindow, dispatched: usize) {
        self.0.borrow_mut().push((window, dispatched));
    }

    fn underrun(&mut self, _stream: StreamKey, _time: f64) {
        *self.1.borrow_mut() += 1;
    }
}

fn engine(lookahead: f64) -> CueEngine {
    CueEngine::new(ReferenceClock::default(), CueTimer::new(lookahead))
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
}

#[test]
fn rate_two_note_scenario() {
    let mut engine = engine(0.0);
    let log = Log::default();
    let sequence: Vec<Event> = ["0 rate 2 step", "0 note 60 1 2"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
    let key = engine.add_stream(&sequence, log.clone()).unwrap();

    assert_close(engine.time_at_beat(key, 0.0).unwrap(), 0.0);
    assert_close(engine.time_at_beat(key, 2.0).unwrap(), 1.0);

    engine.start(key, 0.0).unwrap();
    engine.tick(0.5);
    assert_eq!(log.kinds(), [EventKind::NoteOn]);
    engine.tick(1.5);
    assert_eq!(log.kinds(), [EventKind::NoteOn, EventKind::NoteOff]);
    assert_eq!(log.times(), [0.0, 1.0]);
}

#[test]
fn windows_dispatch_each_event_once_in_order() {
    let mut engine = engine(0.0);
    let log = Log::default();
    let windows = Windows::default();
    engine.set_observer(windows.clone());

    // Irregular positions, out of order, with ties
    let mut sequence = vec![
        Event::rate(0.0, 1.5, CurveKind::Step),
        Event::rate(6.0, 3.0, CurveKind::Exponential),
    ];
    let mut seed: u32 = 7;
    for _ in 0..60 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let beat = f64::from(seed % 400) / 25.0;
        sequence.push(Event::note_off(beat, (seed % 128) as u8));
    }
    let key = engine.add_stream(&sequence, log.clone()).unwrap();
    engine.start(key, 0.0).unwrap();

    let mut now = 0.0;
    while now < 20.0 {
        engine.tick(now);
        now += 0.037;
    }

    assert_eq!(log.len(), 60);
    let times = log.times();
    assert!(times.windows(2).all(|w| w[0] <= w[1]));

    // Every event falls inside the window that dispatched it
    let windows = windows.0.borrow();
    let mut offset = 0;
    for (window, dispatched) in windows.iter() {
        for &time in &times[offset..offset + dispatched] {
            assert!(window.start <= time && time < window.end, "{} outside {:?}", time, window);
        }
        offset += dispatched;
    }
    assert_eq!(offset, 60);
    // Windows are contiguous
    assert!(windows.windows(2).all(|w| w[0].0.end == w[1].0.start));
}

#[test]
fn stalled_clock_underruns() {
    let mut engine = engine(0.0);
    let windows = Windows::default();
    engine.set_observer(windows.clone());
    let key = engine.add_stream(&[Event::note_off(0.5, 60)], Log::default()).unwrap();
    engine.start(key, 0.0).unwrap();

    engine.tick(1.0);
    engine.tick(1.0);
    engine.tick(0.5);
    assert_eq!(*windows.1.borrow(), 2);
    assert_eq!(windows.0.borrow().len(), 1);
    // The stream is still armed after an underrun
    engine.tick(2.0);
    assert_eq!(windows.0.borrow().len(), 2);
}

#[derive(Clone, Default)]
struct Ramps(Log, Rc<RefCell<Vec<(f64, ParamName)>>>);

impl Ramps {
    fn param_times(&self) -> Vec<f64> {
        let log = self.0 .0.borrow();
        log.iter().filter(|(_, e)| e.kind() == EventKind::Param).map(|(t, _)| *t).collect()
    }
}

impl Distribute for Ramps {
    fn distribute(&mut self, time: f64, event: &Event, stream: StreamKey) {
        self.0.distribute(time, event, stream);
    }

    fn stop_ramp(&mut self, time: f64, name: &ParamName, _stream: StreamKey) {
        self.1.borrow_mut().push((time, name.clone()));
    }
}

#[test]
fn lookahead_cues_ramps_early() {
    let mut engine = engine(0.0);
    let ramps = Ramps::default();
    let sequence = [
        Event::param(0.0, "gain", 0.0, CurveKind::Step).unwrap(),
        Event::param(4.0, "gain", 1.0, CurveKind::Linear).unwrap(),
        Event::param(8.0, "gain", 0.5, CurveKind::Exponential).unwrap(),
    ];
    let key = engine.add_stream(&sequence, ramps.clone()).unwrap();
    engine.start(key, 0.0).unwrap();

    // A window of 1s only looks 1s past its end
    engine.tick(1.0);
    assert_eq!(ramps.0.times(), [0.0]);
    engine.tick(3.0);
    assert_eq!(ramps.0.times(), [0.0, 4.0]);
    engine.tick(7.0);
    assert_eq!(ramps.0.times(), [0.0, 4.0, 8.0]);

    // The exponential ramp to beat 8 was handed over but has not begun
    engine.stop(key, 7.0).unwrap();
    assert_eq!(ramps.1.borrow().len(), 1);
    assert_eq!(ramps.1.borrow()[0].0, 7.0);
    assert_eq!(ramps.0.kinds().last(), Some(&EventKind::Stop));
}

#[test]
fn restart_cues_cancelled_ramp_again() {
    let mut engine = engine(0.0);
    let ramps = Ramps::default();
    let sequence = [Event::param(4.0, "gain", 1.0, CurveKind::Linear).unwrap()];
    let key = engine.add_stream(&sequence, ramps.clone()).unwrap();

    engine.start(key, 0.0).unwrap();
    engine.tick(3.0);
    assert_eq!(ramps.param_times(), [4.0]);
    engine.stop(key, 3.0).unwrap();
    assert_eq!(ramps.1.borrow().len(), 1);

    // Beat 4 now falls at 7s
    engine.start(key, 3.0).unwrap();
    let mut now = 3.5;
    while now <= 19.0 {
        engine.tick(now);
        now += 0.5;
    }
    assert_eq!(ramps.param_times(), [4.0, 7.0]);
    assert_eq!(engine.is_drained(key), Ok(true));
}

#[test]
fn late_start_offsets_sequence() {
    let mut engine = engine(0.1);
    let log = Log::default();
    let key = engine
        .add_stream(&[Event::note(0.0, 60, 1.0, 1.0)], log.clone())
        .unwrap();
    engine.tick(0.0);
    engine.start(key, 3.0).unwrap();

    let mut now = 0.0;
    while now < 5.0 {
        engine.tick(now);
        now += 0.1;
    }
    assert_eq!(log.times(), [3.0, 4.0]);
    assert_close(engine.beat_at_time(key, 3.5).unwrap(), 0.5);
}

#[test]
fn start_inside_horizon_cues_immediately() {
    let mut engine = engine(1.0);
    let log = Log::default();
    let key = engine.add_stream(&[Event::note_off(0.25, 60)], log.clone()).unwrap();
    engine.tick(0.0);
    engine.start(key, 0.0).unwrap();
    assert_eq!(log.times(), [0.25]);
    assert_eq!(engine.state(key), Ok(StreamState::Started));
}

#[test]
fn stop_then_start_resumes_without_repeats() {
    let mut engine = engine(0.0);
    let log = Log::default();
    let sequence: Vec<Event> = (0..8).map(|i| Event::note(f64::from(i), 60, 1.0, 0.5)).collect();
    let key = engine.add_stream(&sequence, log.clone()).unwrap();

    engine.start(key, 0.0).unwrap();
    engine.tick(2.2);
    engine.stop(key, 2.2).unwrap();
    assert_eq!(engine.take_finished(key), Ok(Some(2.2)));

    engine.start(key, 10.0).unwrap();
    let mut now = 10.0;
    while now < 30.0 {
        engine.tick(now);
        now += 0.5;
    }
    let ons: Vec<Event> = log
        .0
        .borrow()
        .iter()
        .filter(|(_, e)| e.kind() == EventKind::NoteOn)
        .map(|(_, e)| e.clone())
        .collect();
    assert_eq!(ons.len(), 8);
    let positions: Vec<f64> = ons.iter().map(|e| e.position).collect();
    assert_eq!(positions, [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
}

#[test]
fn natural_end_resolves_completion() {
    let mut engine = engine(0.25);
    let log = Log::default();
    let sequence = [Event::rate(0.0, 4.0, CurveKind::Step), Event::note(0.0, 60, 1.0, 4.0)];
    let key = engine.add_stream(&sequence, log.clone()).unwrap();
    engine.set_duration(key, Some(4.0)).unwrap();
    engine.start(key, 0.0).unwrap();

    let mut now = 0.0;
    while engine.state(key) == Ok(StreamState::Started) {
        engine.tick(now);
        now += 0.1;
    }
    assert_eq!(log.kinds(), [EventKind::NoteOn, EventKind::NoteOff, EventKind::Stop]);
    assert_eq!(engine.take_finished(key), Ok(Some(1.0)));
    assert_eq!(engine.take_finished(key), Ok(None));
}
