//! Client-side interaction controller for the precast optimization dashboard.
//!
//! Renderers observe state published by the controllers here; all network access
//! goes through [`PrecastService`].

pub mod chat_session;
pub mod error;
pub mod numeric_reveal;
pub mod orchestrator;
pub mod report_sink;
pub mod request_lifecycle;
pub mod service;
pub mod settings;

pub use chat_session::{
    ChatSessionController, ChatSnapshot, ChatState, SendOutcome, CHAT_FALLBACK_REPLY,
};
pub use error::{ServiceError, SinkError};
pub use numeric_reveal::{next_value, MetricReveals, NumericRevealAnimator, RevealPlan};
pub use orchestrator::{
    DashboardOrchestrator, DashboardView, SavedReport, OPTIMIZE_FAILURE_MESSAGE,
    OPTIMIZE_MALFORMED_MESSAGE, REPORT_FAILURE_MESSAGE, REPORT_FILE_NAME,
};
pub use report_sink::{DirectoryReportSink, ReportSink};
pub use request_lifecycle::{
    RequestCategory, RequestLifecycleController, RequestState, RunOutcome, RUN_CANCELLED_MESSAGE,
};
pub use service::{HttpPrecastService, PrecastService};
pub use settings::ControllerSettings;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
