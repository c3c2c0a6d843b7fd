use crate::actions::keys;
use crate::signs::fps::FpsCounter;
use crate::signs::mappings::{ActionMatch, ActionPayload};
use crate::signs::render::{render_state, RenderedState};
use crate::signs::session::{SessionConfig, SignSession, TickOutcome};
use crate::signs::sign::{Detection, RawDetection};
use crate::signs::tables::SignTables;
use std::sync::Arc;
use std::time::Instant;

/// A captured video frame. Pixel data is opaque to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Video input. `Ok(None)` means no frame was available this tick.
pub trait FrameSource: Send {
    fn read_frame(&mut self) -> anyhow::Result<Option<Frame>>;
    fn release(&mut self);
}

/// Opens a fresh [`FrameSource`] for each session.
pub trait SourceFactory: Send + Sync {
    fn open(&self) -> anyhow::Result<Box<dyn FrameSource>>;
}

/// Black-box gesture classifier reporting 0-based class indices.
pub trait SignClassifier: Send + Sync {
    fn infer(&self, frame: &Frame) -> anyhow::Result<Vec<RawDetection>>;
}

/// Output side of the action tables.
pub trait KeyInjector: Send + Sync {
    fn emit_text(&self, text: &str) -> anyhow::Result<()>;
    fn press_key(&self, key: &str) -> anyhow::Result<()>;
    fn press_chord(&self, keys: &[String]) -> anyhow::Result<()>;
}

/// Injects keystrokes into the focused window.
#[derive(Debug, Default)]
pub struct SystemKeyInjector;

impl KeyInjector for SystemKeyInjector {
    fn emit_text(&self, text: &str) -> anyhow::Result<()> {
        keys::send_text(text)
    }

    fn press_key(&self, key: &str) -> anyhow::Result<()> {
        keys::press_key(key)
    }

    fn press_chord(&self, keys: &[String]) -> anyhow::Result<()> {
        keys::press_chord(keys)
    }
}

/// Logs actions instead of injecting them.
#[derive(Debug, Default)]
pub struct DryRunInjector;

impl KeyInjector for DryRunInjector {
    fn emit_text(&self, text: &str) -> anyhow::Result<()> {
        tracing::info!(text, "dry run: emit text");
        Ok(())
    }

    fn press_key(&self, key: &str) -> anyhow::Result<()> {
        tracing::info!(key, "dry run: press key");
        Ok(())
    }

    fn press_chord(&self, keys: &[String]) -> anyhow::Result<()> {
        tracing::info!(keys = %keys.join("+"), "dry run: press chord");
        Ok(())
    }
}

/// Inject a matched action. Failures are logged and swallowed.
pub fn fire_action(injector: &dyn KeyInjector, action: &ActionMatch) {
    let result = match &action.payload {
        ActionPayload::Text(text) => injector.emit_text(text),
        ActionPayload::Key(Some(key)) => injector.press_key(key),
        ActionPayload::Key(None) => Ok(()),
        ActionPayload::Chord(keys) => injector.press_chord(keys),
    };
    if let Err(err) = result {
        tracing::error!(
            ?err,
            kind = action.kind.as_str(),
            combo = ?action.combo,
            "failed to inject action"
        );
    }
}

#[derive(Debug, Clone)]
pub struct TickReport {
    pub frame: Frame,
    pub outcome: TickOutcome,
    pub state: RenderedState,
}

/// One session's processing chain: classify, match, inject, render.
pub struct SignPipeline {
    session: SignSession,
    fps: FpsCounter,
    injector: Arc<dyn KeyInjector>,
}

impl SignPipeline {
    pub fn new(
        config: SessionConfig,
        fps_window: usize,
        tables: Arc<SignTables>,
        injector: Arc<dyn KeyInjector>,
    ) -> Self {
        Self {
            session: SignSession::new(config, tables),
            fps: FpsCounter::new(fps_window),
            injector,
        }
    }

    /// Run one tick. A failed frame read skips the tick without touching any
    /// state; a classifier error is returned to the caller.
    pub fn tick(
        &mut self,
        source: &mut dyn FrameSource,
        classifier: &dyn SignClassifier,
        now: Instant,
    ) -> anyhow::Result<Option<TickReport>> {
        let frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(None),
            Err(err) => {
                tracing::warn!(?err, "failed to read frame");
                return Ok(None);
            }
        };

        let fps = self.fps.tick(now);
        let detections: Vec<Detection> = classifier
            .infer(&frame)?
            .into_iter()
            .map(Detection::from)
            .collect();

        let outcome = self.session.process(&detections, now);
        for action in &outcome.actions {
            fire_action(self.injector.as_ref(), action);
        }

        let state = render_state(&self.session, &detections, fps, now);
        Ok(Some(TickReport {
            frame,
            outcome,
            state,
        }))
    }

    pub fn clear_history(&mut self) {
        self.session.clear_history();
    }

    pub fn session(&self) -> &SignSession {
        &self.session
    }
}
