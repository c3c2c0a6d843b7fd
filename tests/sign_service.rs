use sign_coder::signs::pipeline::{Frame, FrameSource, KeyInjector, SignClassifier, SourceFactory};
use sign_coder::signs::service::{ServiceConfig, SignService};
use sign_coder::signs::sign::{BBox, RawDetection};
use sign_coder::signs::tables::SignTables;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Default)]
struct Counters {
    opens: AtomicUsize,
    releases: AtomicUsize,
}

struct MockSource {
    next: u64,
    failing: HashSet<u64>,
    counters: Arc<Counters>,
}

impl FrameSource for MockSource {
    fn read_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        let index = self.next;
        self.next += 1;
        if self.failing.contains(&index) {
            anyhow::bail!("camera busy");
        }
        Ok(Some(Frame {
            index,
            width: 640,
            height: 480,
            data: Vec::new(),
        }))
    }

    fn release(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct MockFactory {
    failing: HashSet<u64>,
    counters: Arc<Counters>,
}

impl SourceFactory for MockFactory {
    fn open(&self) -> anyhow::Result<Box<dyn FrameSource>> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSource {
            next: 0,
            failing: self.failing.clone(),
            counters: Arc::clone(&self.counters),
        }))
    }
}

/// Always reports the same sign; can fail or panic at a given frame.
#[derive(Default)]
struct MockClassifier {
    class_index: u16,
    error_at: Option<u64>,
    panic_at: Option<u64>,
    seen: Mutex<Vec<u64>>,
}

impl SignClassifier for MockClassifier {
    fn infer(&self, frame: &Frame) -> anyhow::Result<Vec<RawDetection>> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(frame.index);
        }
        if self.error_at == Some(frame.index) {
            anyhow::bail!("model crashed");
        }
        if self.panic_at == Some(frame.index) {
            panic!("model exploded");
        }
        Ok(vec![RawDetection {
            bbox: BBox::new(0.0, 0.0, 20.0, 20.0),
            score: 0.95,
            class_index: self.class_index,
        }])
    }
}

#[derive(Default)]
struct RecordingInjector {
    texts: Mutex<Vec<String>>,
}

impl RecordingInjector {
    fn texts(&self) -> Vec<String> {
        self.texts.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

impl KeyInjector for RecordingInjector {
    fn emit_text(&self, text: &str) -> anyhow::Result<()> {
        if let Ok(mut texts) = self.texts.lock() {
            texts.push(text.to_string());
        }
        Ok(())
    }

    fn press_key(&self, _key: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn press_chord(&self, _keys: &[String]) -> anyhow::Result<()> {
        Ok(())
    }
}

fn fast_config() -> ServiceConfig {
    ServiceConfig {
        target_fps: 200,
        ..ServiceConfig::default()
    }
}

fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    done()
}

struct Harness {
    service: SignService,
    counters: Arc<Counters>,
    classifier: Arc<MockClassifier>,
    injector: Arc<RecordingInjector>,
}

fn harness(factory: MockFactory, classifier: MockClassifier) -> Harness {
    let counters = Arc::clone(&factory.counters);
    let classifier = Arc::new(classifier);
    let injector = Arc::new(RecordingInjector::default());
    let tables = Arc::new(SignTables::builtin().expect("builtin tables"));
    let service = SignService::new(
        fast_config(),
        tables,
        Arc::new(factory),
        classifier.clone(),
        injector.clone(),
    );
    Harness {
        service,
        counters,
        classifier,
        injector,
    }
}

#[test]
fn start_and_stop_are_idempotent() {
    let mut h = harness(MockFactory::default(), MockClassifier::default());

    h.service.start().expect("start");
    h.service.start().expect("start again");
    assert!(h.service.is_running());
    assert_eq!(h.counters.opens.load(Ordering::SeqCst), 1);

    h.service.stop();
    h.service.stop();
    assert!(!h.service.is_running());
    assert_eq!(h.counters.releases.load(Ordering::SeqCst), 1);
}

#[test]
fn latest_frame_is_published() {
    let mut h = harness(MockFactory::default(), MockClassifier::default());
    h.service.start().expect("start");

    let slot = h.service.frame_slot();
    assert!(wait_until(|| slot.version() >= 3));
    let latest = h.service.latest_frame().expect("frame");
    assert_eq!(latest.frame.width, 640);
    assert_eq!(latest.state.history, vec!["子".to_string()]);
    h.service.stop();
}

#[test]
fn held_sign_types_its_word_once() {
    // Class index 5 is sign 6, bound to "hello".
    let classifier = MockClassifier {
        class_index: 5,
        ..MockClassifier::default()
    };
    let mut h = harness(MockFactory::default(), classifier);
    h.service.start().expect("start");

    let slot = h.service.frame_slot();
    assert!(wait_until(|| slot.version() >= 10));
    h.service.stop();
    assert_eq!(h.injector.texts(), vec!["hello".to_string()]);
}

#[test]
fn failed_reads_are_skipped() {
    let factory = MockFactory {
        failing: HashSet::from([0, 2, 4]),
        ..MockFactory::default()
    };
    let mut h = harness(factory, MockClassifier::default());
    h.service.start().expect("start");

    let slot = h.service.frame_slot();
    assert!(wait_until(|| slot.version() >= 4));
    h.service.stop();

    let seen = h.classifier.seen.lock().expect("lock").clone();
    assert!(seen.starts_with(&[1, 3, 5]));
    assert!(h.service.latest_frame().is_some());
}

#[test]
fn classifier_error_stops_the_session() {
    let classifier = MockClassifier {
        error_at: Some(3),
        ..MockClassifier::default()
    };
    let mut h = harness(MockFactory::default(), classifier);
    h.service.start().expect("start");

    assert!(wait_until(|| !h.service.is_running()));
    assert_eq!(h.counters.releases.load(Ordering::SeqCst), 1);

    // A fresh session opens a new source.
    h.service.start().expect("restart");
    assert_eq!(h.counters.opens.load(Ordering::SeqCst), 2);
    h.service.stop();
}

#[test]
fn classifier_panic_stops_the_session() {
    let classifier = MockClassifier {
        panic_at: Some(2),
        ..MockClassifier::default()
    };
    let mut h = harness(MockFactory::default(), classifier);
    h.service.start().expect("start");

    assert!(wait_until(|| !h.service.is_running()));
    assert_eq!(h.counters.releases.load(Ordering::SeqCst), 1);
    h.service.stop();
}

#[test]
fn clear_history_lets_a_held_sign_fire_again() {
    let classifier = MockClassifier {
        class_index: 5,
        ..MockClassifier::default()
    };
    let mut h = harness(MockFactory::default(), classifier);
    h.service.start().expect("start");

    assert!(wait_until(|| h.injector.texts().len() == 1));
    h.service.clear_history();
    assert!(wait_until(|| h.injector.texts().len() == 2));
    h.service.stop();
}

#[test]
fn clear_history_does_not_speed_up_the_cadence() {
    let classifier = Arc::new(MockClassifier::default());
    let tables = Arc::new(SignTables::builtin().expect("builtin tables"));
    let config = ServiceConfig {
        target_fps: 5,
        ..ServiceConfig::default()
    };
    let mut service = SignService::new(
        config,
        tables,
        Arc::new(MockFactory::default()),
        classifier.clone(),
        Arc::new(RecordingInjector::default()),
    );
    service.start().expect("start");

    let slot = service.frame_slot();
    assert!(wait_until(|| slot.version() >= 1));
    let ticks_before = classifier.seen.lock().expect("lock").len();

    // Twenty resets spread over 100 ms, well inside one 200 ms frame slot.
    for _ in 0..20 {
        service.clear_history();
        std::thread::sleep(Duration::from_millis(5));
    }
    let ticks_after = classifier.seen.lock().expect("lock").len();
    service.stop();

    assert!(
        ticks_after - ticks_before <= 2,
        "resets triggered {} extra ticks",
        ticks_after - ticks_before
    );
}

#[test]
fn dropping_the_service_releases_the_source() {
    let h = harness(MockFactory::default(), MockClassifier::default());
    let counters = Arc::clone(&h.counters);
    let mut service = h.service;
    service.start().expect("start");
    drop(service);
    assert_eq!(counters.releases.load(Ordering::SeqCst), 1);
}
