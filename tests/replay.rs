use sign_coder::signs::pipeline::{KeyInjector, SignPipeline};
use sign_coder::signs::replay::{load_recording, ReplayClassifier, ReplaySource};
use sign_coder::signs::service::ServiceConfig;
use sign_coder::signs::tables::SignTables;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tempfile::tempdir;

#[derive(Default)]
struct Typed {
    events: Mutex<Vec<String>>,
}

impl Typed {
    fn push(&self, event: String) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

impl KeyInjector for Typed {
    fn emit_text(&self, text: &str) -> anyhow::Result<()> {
        self.push(text.to_string())
    }

    fn press_key(&self, key: &str) -> anyhow::Result<()> {
        self.push(format!("<{key}>"))
    }

    fn press_chord(&self, keys: &[String]) -> anyhow::Result<()> {
        self.push(format!("<{}>", keys.join("+")))
    }
}

fn frame_line(class_index: u16) -> String {
    format!(
        r#"[{{"box":{{"x1":100,"y1":80,"x2":180,"y2":200}},"score":0.92,"class_index":{class_index}}}]"#
    )
}

/// 巳 未 申 亥 午 寅, each held for three frames, a dropped frame in the
/// middle, then idle frames.
fn katon_recording(idle_frames: usize) -> String {
    let mut out = String::new();
    for (i, class_index) in [5u16, 7, 8, 11, 6, 2].into_iter().enumerate() {
        for _ in 0..3 {
            writeln!(out, "{}", frame_line(class_index)).unwrap();
        }
        if i == 2 {
            writeln!(out, "null").unwrap();
        }
    }
    for _ in 0..idle_frames {
        writeln!(out, "[]").unwrap();
    }
    out
}

struct Run {
    footers: Vec<String>,
    typed: Vec<String>,
    inactivity_resets: usize,
    technique_frames: Vec<u64>,
    history: Vec<String>,
}

fn run(recording: &str) -> Run {
    let dir = tempdir().unwrap();
    let path = dir.path().join("katon.jsonl");
    std::fs::write(&path, recording).unwrap();
    let recording = Arc::new(load_recording(&path).unwrap());

    let config = ServiceConfig::default();
    let typed = Arc::new(Typed::default());
    let tables = Arc::new(SignTables::builtin().unwrap());
    let mut pipeline = SignPipeline::new(
        config.session.clone(),
        config.fps_window,
        tables,
        typed.clone(),
    );
    let mut source = ReplaySource::new(Arc::clone(&recording));
    let classifier = ReplayClassifier::new(recording);

    let start = Instant::now();
    let interval = config.frame_interval();
    let mut footers = Vec::new();
    let mut inactivity_resets = 0;
    let mut technique_frames = Vec::new();
    let mut history = Vec::new();
    let mut tick = 0u32;
    while !source.is_finished() {
        let now = start + interval * tick;
        tick += 1;
        let Some(report) = pipeline.tick(&mut source, &classifier, now).unwrap() else {
            continue;
        };
        if report.outcome.inactivity_reset {
            inactivity_resets += 1;
        }
        if report.outcome.technique.is_some() {
            technique_frames.push(report.frame.index);
        }
        footers.push(report.state.footer);
        history = report.state.history;
    }

    let typed = typed.events.lock().unwrap().clone();
    Run {
        footers,
        typed,
        inactivity_resets,
        technique_frames,
        history,
    }
}

#[test]
fn replaying_katon_types_words_and_shows_the_technique() {
    let run = run(&katon_recording(0));

    assert_eq!(run.typed, vec!["hello", "world", "NARUTO"]);
    assert_eq!(run.technique_frames, vec![16]);
    assert_eq!(run.footers.last().unwrap(), "火遁・豪火球の術");
    assert_eq!(run.footers[3], "巳未");
    assert_eq!(run.history, vec!["巳", "未", "申", "亥", "午", "寅"]);
    // The dropped frame produces no report.
    assert_eq!(run.footers.len(), 18);
}

#[test]
fn idle_frames_clear_history_but_not_the_technique() {
    let run = run(&katon_recording(70));

    assert_eq!(run.inactivity_resets, 1);
    assert!(run.history.is_empty());
    assert_eq!(run.footers.last().unwrap(), "火遁・豪火球の術");
}

#[test]
fn technique_expires_after_its_display_window() {
    // Five seconds at thirty frames per second, plus a margin.
    let run = run(&katon_recording(160));

    assert_eq!(run.footers.last().unwrap(), "");
    assert_eq!(run.typed.len(), 3);
}
