//! Hand sign recognition: debounce, action dispatch, technique matching and
//! the worker that drives them from a video source.

pub mod cheatsheet;
pub mod debounce;
pub mod fps;
pub mod mappings;
pub mod pipeline;
pub mod render;
pub mod replay;
pub mod sequence;
pub mod service;
pub mod session;
pub mod sign;
pub mod tables;
pub mod techniques;

pub use mappings::{ActionKind, ActionMatch, ActionPayload, ActionTables, SignCombo};
pub use pipeline::{
    DryRunInjector, Frame, FrameSource, KeyInjector, SignClassifier, SignPipeline, SourceFactory,
    SystemKeyInjector, TickReport,
};
pub use service::{FrameSlot, RenderedFrame, ServiceConfig, SignService};
pub use session::{SessionConfig, SignSession, TickOutcome};
pub use sign::{BBox, Detection, RawDetection, SignId, SignLabels};
pub use tables::{SignTables, TablePaths};
pub use techniques::{Locale, Technique, TechniqueTable};
