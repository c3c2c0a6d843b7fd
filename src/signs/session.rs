use crate::signs::debounce::ChatteringWindow;
use crate::signs::mappings::ActionMatch;
use crate::signs::sequence::SignSequence;
use crate::signs::sign::{Detection, SignId};
use crate::signs::tables::SignTables;
use crate::signs::techniques::Locale;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Parameters fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub confidence_threshold: f32,
    pub chattering_check: usize,
    pub max_display: usize,
    pub max_history: usize,
    pub sign_interval: Duration,
    pub technique_display: Duration,
    pub locale: Locale,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            chattering_check: 1,
            max_display: 18,
            max_history: 44,
            sign_interval: Duration::from_secs(2),
            technique_display: Duration::from_secs(5),
            locale: Locale::Native,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveTechnique {
    pub index: usize,
    pub matched_at: Instant,
}

/// What happened during one call to [`SignSession::process`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub confirmed: Vec<SignId>,
    pub actions: Vec<ActionMatch>,
    pub technique: Option<usize>,
    pub inactivity_reset: bool,
}

/// Sign recognition state for one start..stop session.
///
/// Pure: no I/O happens here. Actions found are returned in the
/// [`TickOutcome`] and injected by the caller.
#[derive(Debug)]
pub struct SignSession {
    config: SessionConfig,
    tables: Arc<SignTables>,
    window: ChatteringWindow,
    display: SignSequence,
    history: SignSequence,
    pending: Vec<SignId>,
    last_sign_at: Option<Instant>,
    active_technique: Option<ActiveTechnique>,
}

impl SignSession {
    pub fn new(config: SessionConfig, tables: Arc<SignTables>) -> Self {
        Self {
            window: ChatteringWindow::new(config.chattering_check),
            display: SignSequence::new(config.max_display),
            history: SignSequence::new(config.max_history),
            pending: Vec::new(),
            last_sign_at: None,
            active_technique: None,
            config,
            tables,
        }
    }

    /// Run one tick worth of detections through the debounce filter, the
    /// action tables and the technique matcher, then apply the inactivity
    /// reset.
    pub fn process(&mut self, detections: &[Detection], now: Instant) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        for detection in detections {
            if let Some(sign) = self.observe(detection) {
                self.confirm(sign, now, &mut outcome);
            }
        }
        outcome.inactivity_reset = self.expire_if_idle(now);
        outcome
    }

    /// Debounce a single detection. Returns a sign only on a new, stable
    /// classification.
    fn observe(&mut self, detection: &Detection) -> Option<SignId> {
        // NaN scores fail this comparison and are dropped too.
        if !(detection.confidence >= self.config.confidence_threshold) {
            return None;
        }
        let sign = self.window.push(detection.sign)?;
        if self.display.last() == Some(sign) {
            return None;
        }
        Some(sign)
    }

    fn confirm(&mut self, sign: SignId, now: Instant, outcome: &mut TickOutcome) {
        self.display.push(sign);
        self.history.push(sign);
        self.pending.push(sign);
        self.last_sign_at = Some(now);
        outcome.confirmed.push(sign);
        tracing::debug!(sign = %sign, label = self.tables.labels.label(sign), "sign confirmed");

        if let Some(action) = self.tables.actions.match_pending(&self.pending) {
            tracing::debug!(
                kind = action.kind.as_str(),
                combo = ?action.combo,
                "action matched"
            );
            self.pending.clear();
            outcome.actions.push(action);
        }

        let joined = self.tables.labels.concat(self.history.iter());
        if let Some(index) = self.tables.techniques.find(&joined) {
            tracing::info!(index, history = %joined, "technique matched");
            self.active_technique = Some(ActiveTechnique {
                index,
                matched_at: now,
            });
            outcome.technique = Some(index);
        }
    }

    /// Clear the sequences once no sign has been confirmed for longer than
    /// the sign interval. Returns `true` if anything was cleared.
    pub fn expire_if_idle(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_sign_at else {
            return false;
        };
        if now.saturating_duration_since(last) <= self.config.sign_interval {
            return false;
        }
        let had_state =
            !self.display.is_empty() || !self.history.is_empty() || !self.pending.is_empty();
        self.clear_history();
        if had_state {
            tracing::debug!("sign history expired");
        }
        had_state
    }

    /// Manual reset from the control surface. The technique timer is kept.
    pub fn clear_history(&mut self) {
        self.display.clear();
        self.history.clear();
        self.pending.clear();
    }

    /// Technique label while the display timer runs, otherwise the display
    /// sequence.
    pub fn footer_text(&self, now: Instant) -> String {
        if let Some(label) = self.technique_label(now) {
            return label;
        }
        self.display
            .iter()
            .map(|sign| self.tables.labels.label(*sign))
            .collect()
    }

    pub fn technique_label(&self, now: Instant) -> Option<String> {
        let active = self.active_technique?;
        if now.saturating_duration_since(active.matched_at) >= self.config.technique_display {
            return None;
        }
        self.tables
            .techniques
            .get(active.index)
            .map(|technique| technique.label(self.config.locale))
    }

    pub fn display_labels(&self) -> Vec<String> {
        self.display
            .iter()
            .map(|sign| self.tables.labels.label(*sign).to_string())
            .collect()
    }

    pub fn display(&self) -> &SignSequence {
        &self.display
    }

    pub fn history(&self) -> &SignSequence {
        &self.history
    }

    pub fn pending(&self) -> &[SignId] {
        &self.pending
    }

    pub fn window(&self) -> &ChatteringWindow {
        &self.window
    }

    pub fn last_sign_at(&self) -> Option<Instant> {
        self.last_sign_at
    }

    pub fn active_technique(&self) -> Option<ActiveTechnique> {
        self.active_technique
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tables(&self) -> &Arc<SignTables> {
        &self.tables
    }
}
