//! # Upstream Services
//!
//! Wrappers around the external calls a report depends on. Transcripts and
//! video details are served through the stampede-safe fetch cache; retention
//! analysis is guarded by bounded retry.

pub mod errors;
pub mod retention;
pub mod transcript;
pub mod video_detail;

pub use errors::UpstreamError;
pub use retention::{
    RetentionAnalysisService, RetentionAnalyzer, RetentionError, RETENTION_PLACEHOLDER,
};
pub use transcript::{
    format_transcript, CaptionSnippet, TranscriptLine, TranscriptService, TranscriptSource,
};
pub use video_detail::{VideoDetailService, VideoDetailSource, VideoDetails};
