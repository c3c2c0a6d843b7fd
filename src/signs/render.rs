use crate::signs::fps::format_fps;
use crate::signs::session::SignSession;
use crate::signs::sign::{BBox, Detection};
use std::time::Instant;

/// A box to draw over the frame with the sign's name.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub bbox: BBox,
    pub label: String,
    pub confidence: f32,
}

/// Everything the output layer needs to draw one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedState {
    pub fps_text: String,
    pub overlays: Vec<OverlayBox>,
    pub footer: String,
    pub history: Vec<String>,
}

/// Build the render record from session state. Reads only; never mutates.
pub fn render_state(
    session: &SignSession,
    detections: &[Detection],
    fps: f64,
    now: Instant,
) -> RenderedState {
    let threshold = session.config().confidence_threshold;
    let labels = &session.tables().labels;
    let overlays = detections
        .iter()
        .filter(|d| d.confidence >= threshold)
        .map(|d| OverlayBox {
            bbox: d.bbox.square(),
            label: labels.label(d.sign).to_string(),
            confidence: d.confidence,
        })
        .collect();

    RenderedState {
        fps_text: format_fps(fps),
        overlays,
        footer: session.footer_text(now),
        history: session.display_labels(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signs::session::SessionConfig;
    use crate::signs::sign::{SignId, UNKNOWN_SIGN_LABEL};
    use crate::signs::tables::SignTables;
    use std::sync::Arc;

    #[test]
    fn overlays_skip_low_confidence_and_label_unknown() {
        let tables = SignTables::builtin().expect("builtin");
        let session = SignSession::new(SessionConfig::default(), Arc::new(tables));
        let detections = [
            Detection {
                bbox: BBox::new(0.0, 0.0, 10.0, 20.0),
                confidence: 0.9,
                sign: SignId(1),
            },
            Detection {
                bbox: BBox::new(0.0, 0.0, 10.0, 10.0),
                confidence: 0.2,
                sign: SignId(2),
            },
            Detection {
                bbox: BBox::new(0.0, 0.0, 10.0, 10.0),
                confidence: 0.95,
                sign: SignId(40),
            },
        ];

        let state = render_state(&session, &detections, 30.0, Instant::now());
        assert_eq!(state.fps_text, "FPS:30");
        assert_eq!(state.overlays.len(), 2);
        assert_eq!(state.overlays[0].label, "子");
        assert_eq!(state.overlays[0].bbox, BBox::new(-5.0, 0.0, 15.0, 20.0));
        assert_eq!(state.overlays[1].label, UNKNOWN_SIGN_LABEL);
        assert!(state.footer.is_empty());
        assert!(state.history.is_empty());
    }
}
