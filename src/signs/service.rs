use crate::signs::pipeline::{
    Frame, FrameSource, KeyInjector, SignClassifier, SignPipeline, SourceFactory,
};
use crate::signs::render::RenderedState;
use crate::signs::session::SessionConfig;
use crate::signs::tables::SignTables;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub session: SessionConfig,
    pub target_fps: u32,
    pub fps_window: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            target_fps: 30,
            fps_window: crate::signs::fps::DEFAULT_FPS_WINDOW,
        }
    }
}

impl ServiceConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }
}

/// The newest rendered frame handed from the worker to the UI.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub frame: Frame,
    pub state: RenderedState,
}

/// Single-value handoff between the worker and the control surface.
///
/// Publishing overwrites whatever was there; readers only ever see the latest
/// frame.
#[derive(Debug, Default)]
pub struct FrameSlot {
    latest: Mutex<Option<RenderedFrame>>,
    version: AtomicU64,
}

impl FrameSlot {
    pub fn publish(&self, frame: RenderedFrame) {
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(frame);
            self.version.fetch_add(1, Ordering::Release);
        }
    }

    pub fn latest(&self) -> Option<RenderedFrame> {
        self.latest.lock().ok().and_then(|latest| latest.clone())
    }

    pub fn take(&self) -> Option<RenderedFrame> {
        self.latest.lock().ok().and_then(|mut latest| latest.take())
    }

    /// Incremented on every publish, so readers can skip unchanged frames.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn clear(&self) {
        if let Ok(mut latest) = self.latest.lock() {
            *latest = None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerCommand {
    Stop,
    ClearHistory,
}

#[derive(Debug)]
struct WorkerHandle {
    command_tx: Sender<WorkerCommand>,
    running: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

/// Owns the recognition worker thread.
///
/// The worker holds all session state; this handle only starts, stops and
/// resets it.
pub struct SignService {
    config: ServiceConfig,
    tables: Arc<SignTables>,
    sources: Arc<dyn SourceFactory>,
    classifier: Arc<dyn SignClassifier>,
    injector: Arc<dyn KeyInjector>,
    slot: Arc<FrameSlot>,
    worker: Option<WorkerHandle>,
}

impl SignService {
    pub fn new(
        config: ServiceConfig,
        tables: Arc<SignTables>,
        sources: Arc<dyn SourceFactory>,
        classifier: Arc<dyn SignClassifier>,
        injector: Arc<dyn KeyInjector>,
    ) -> Self {
        Self {
            config,
            tables,
            sources,
            classifier,
            injector,
            slot: Arc::new(FrameSlot::default()),
            worker: None,
        }
    }

    /// Open the video source and spawn the worker. Does nothing if a session
    /// is already running.
    pub fn start(&mut self) -> anyhow::Result<()> {
        if self.is_running() {
            return Ok(());
        }
        // A worker that stopped on its own still needs joining.
        self.stop();

        let source = self.sources.open()?;
        let (command_tx, command_rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));
        let pipeline = SignPipeline::new(
            self.config.session.clone(),
            self.config.fps_window,
            Arc::clone(&self.tables),
            Arc::clone(&self.injector),
        );
        let worker = Worker {
            pipeline,
            source,
            classifier: Arc::clone(&self.classifier),
            slot: Arc::clone(&self.slot),
            command_rx,
            frame_interval: self.config.frame_interval(),
            running: Arc::clone(&running),
        };
        self.slot.clear();
        let join = thread::Builder::new()
            .name("sign-pipeline".into())
            .spawn(move || worker.run())?;
        tracing::info!(target_fps = self.config.target_fps, "sign session started");
        self.worker = Some(WorkerHandle {
            command_tx,
            running,
            join,
        });
        Ok(())
    }

    /// Signal the worker and wait for it to release the source.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.command_tx.send(WorkerCommand::Stop);
            if worker.join.join().is_err() {
                tracing::error!("sign pipeline thread panicked");
            }
            tracing::info!("sign session stopped");
        }
    }

    /// Clear the display, history and pending sequences of the running
    /// session.
    pub fn clear_history(&self) {
        if let Some(worker) = &self.worker {
            let _ = worker.command_tx.send(WorkerCommand::ClearHistory);
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| worker.running.load(Ordering::Acquire))
    }

    pub fn latest_frame(&self) -> Option<RenderedFrame> {
        self.slot.latest()
    }

    pub fn frame_slot(&self) -> Arc<FrameSlot> {
        Arc::clone(&self.slot)
    }

    pub fn tables(&self) -> &Arc<SignTables> {
        &self.tables
    }
}

impl Drop for SignService {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    pipeline: SignPipeline,
    source: Box<dyn FrameSource>,
    classifier: Arc<dyn SignClassifier>,
    slot: Arc<FrameSlot>,
    command_rx: Receiver<WorkerCommand>,
    frame_interval: Duration,
    running: Arc<AtomicBool>,
}

impl Worker {
    fn run(mut self) {
        self.run_loop();
        self.source.release();
        self.running.store(false, Ordering::Release);
        tracing::debug!("video source released");
    }

    fn run_loop(&mut self) {
        loop {
            if !self.drain_commands() {
                return;
            }

            let started = Instant::now();
            let pipeline = &mut self.pipeline;
            let source = self.source.as_mut();
            let classifier = self.classifier.as_ref();
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                pipeline.tick(source, classifier, started)
            }));
            match result {
                Ok(Ok(Some(report))) => self.slot.publish(RenderedFrame {
                    frame: report.frame,
                    state: report.state,
                }),
                Ok(Ok(None)) => {}
                Ok(Err(err)) => {
                    tracing::error!(?err, "sign pipeline tick failed; stopping session");
                    return;
                }
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|m| (*m).to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!(panic = %message, "sign pipeline tick panicked; stopping session");
                    return;
                }
            }

            if !self.wait_for_next_tick(started + self.frame_interval) {
                return;
            }
        }
    }

    /// Sleep until `deadline`, applying commands as they arrive. A reset does
    /// not shorten the wait. Returns `false` when the worker should exit.
    fn wait_for_next_tick(&mut self, deadline: Instant) -> bool {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.command_rx.recv_timeout(remaining) {
                Ok(WorkerCommand::Stop) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return false
                }
                Ok(WorkerCommand::ClearHistory) => self.pipeline.clear_history(),
                Err(mpsc::RecvTimeoutError::Timeout) => return true,
            }
        }
    }

    /// Apply queued commands. Returns `false` when the worker should exit.
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(WorkerCommand::Stop) | Err(mpsc::TryRecvError::Disconnected) => return false,
                Ok(WorkerCommand::ClearHistory) => self.pipeline.clear_history(),
                Err(mpsc::TryRecvError::Empty) => return true,
            }
        }
    }
}
