use crate::signs::pipeline::{Frame, FrameSource, SignClassifier, SourceFactory};
use crate::signs::sign::RawDetection;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;

/// Pre-recorded classifier output, one entry per captured frame.
///
/// Stored as JSON lines: each line holds the detections of one frame as an
/// array, or `null` for a frame that could not be read. Blank lines are
/// skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    frames: Vec<Option<Vec<RawDetection>>>,
}

impl Recording {
    pub fn new(frames: Vec<Option<Vec<RawDetection>>>) -> Self {
        Self { frames }
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let mut frames = Vec::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let frame: Option<Vec<RawDetection>> = serde_json::from_str(line)
                .with_context(|| format!("invalid recording entry on line {}", number + 1))?;
            frames.push(frame);
        }
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Detections of the frame at `index`, `None` if the read failed or the
    /// index is out of range.
    pub fn detections(&self, index: usize) -> Option<&[RawDetection]> {
        self.frames.get(index)?.as_deref()
    }

    /// Index of the last frame that can be read back.
    pub fn last_readable(&self) -> Option<usize> {
        self.frames.iter().rposition(Option::is_some)
    }

    fn is_readable(&self, index: usize) -> bool {
        matches!(self.frames.get(index), Some(Some(_)))
    }
}

pub fn load_recording(path: &Path) -> anyhow::Result<Recording> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read recording {}", path.display()))?;
    Recording::parse(&content).with_context(|| format!("in recording {}", path.display()))
}

/// Plays a [`Recording`] back as a video source. Failed entries surface as
/// read errors; once exhausted the source yields no frames.
#[derive(Debug)]
pub struct ReplaySource {
    recording: Arc<Recording>,
    position: usize,
    released: bool,
}

impl ReplaySource {
    pub fn new(recording: Arc<Recording>) -> Self {
        Self {
            recording,
            position: 0,
            released: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.released || self.position >= self.recording.len()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl FrameSource for ReplaySource {
    fn read_frame(&mut self) -> anyhow::Result<Option<Frame>> {
        if self.is_finished() {
            return Ok(None);
        }
        let index = self.position;
        self.position += 1;
        if !self.recording.is_readable(index) {
            anyhow::bail!("recorded frame {index} could not be read");
        }
        Ok(Some(Frame {
            index: index as u64,
            ..Frame::default()
        }))
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[derive(Debug, Clone)]
pub struct ReplaySourceFactory {
    recording: Arc<Recording>,
}

impl ReplaySourceFactory {
    pub fn new(recording: Arc<Recording>) -> Self {
        Self { recording }
    }
}

impl SourceFactory for ReplaySourceFactory {
    fn open(&self) -> anyhow::Result<Box<dyn FrameSource>> {
        Ok(Box::new(ReplaySource::new(Arc::clone(&self.recording))))
    }
}

/// Answers inference with the recorded detections for the frame's index.
#[derive(Debug, Clone)]
pub struct ReplayClassifier {
    recording: Arc<Recording>,
}

impl ReplayClassifier {
    pub fn new(recording: Arc<Recording>) -> Self {
        Self { recording }
    }
}

impl SignClassifier for ReplayClassifier {
    fn infer(&self, frame: &Frame) -> anyhow::Result<Vec<RawDetection>> {
        Ok(usize::try_from(frame.index)
            .ok()
            .and_then(|index| self.recording.detections(index))
            .map(<[RawDetection]>::to_vec)
            .unwrap_or_default())
    }
}
