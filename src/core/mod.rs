//! Archive core: date normalization, discovery, aliases, downloads and the
//! phase pipeline.

pub mod alias;
pub mod date;
pub mod discovery;
pub mod download;
pub mod model;
pub mod pipeline;

pub use alias::{assign_aliases, derive_alias, matches_patterns};
pub use date::{normalize, parse_french_date};
pub use discovery::{DiscoveryOutcome, DiscoveryParams, PageStep, PageStepper, StopReason, discover};
pub use download::{DownloadManager, DownloadTally, FileStatus};
pub use model::{
    Discussion, DiscussionDraft, FileDraft, FileRef, Metadata, Session, SessionSummary,
    StoreDocument,
};
pub use pipeline::{DiscoveryReport, ExtractionReport, Phases, Pipeline, RunReport};
