//! Session owner: parameter form state plus the optimize, report and chat flows.

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use shared::{
    domain::{MetricKind, OptimizationResult, ParameterField, ProcessParameters},
    protocol::ReportRequest,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    chat_session::{ChatSessionController, ChatSnapshot, SendOutcome},
    error::ServiceError,
    numeric_reveal::MetricReveals,
    report_sink::ReportSink,
    request_lifecycle::{RequestCategory, RequestLifecycleController, RequestState, RunOutcome},
    service::PrecastService,
    settings::ControllerSettings,
};

pub const REPORT_FILE_NAME: &str = "LT_Precast_Optimization_Report.pdf";
pub const OPTIMIZE_FAILURE_MESSAGE: &str = "Failed to optimize. Ensure the backend is running.";
pub const OPTIMIZE_MALFORMED_MESSAGE: &str =
    "The optimizer returned an unreadable result. Please try again.";
pub const REPORT_FAILURE_MESSAGE: &str = "Failed to download report.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub path: PathBuf,
    pub size_bytes: usize,
}

/// Composed view state for a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub parameters: ProcessParameters,
    pub optimize: RequestState<OptimizationResult>,
    pub report: RequestState<SavedReport>,
    pub chat: ChatSnapshot,
    pub displayed_metrics: BTreeMap<MetricKind, f64>,
    pub can_optimize: bool,
    pub can_download_report: bool,
    pub can_send_chat: bool,
}

fn optimize_failure_message(err: &ServiceError) -> &'static str {
    if err.is_unavailable() {
        OPTIMIZE_FAILURE_MESSAGE
    } else {
        OPTIMIZE_MALFORMED_MESSAGE
    }
}

pub struct DashboardOrchestrator {
    settings: ControllerSettings,
    service: Arc<dyn PrecastService>,
    report_sink: Arc<dyn ReportSink>,
    parameters: watch::Sender<ProcessParameters>,
    optimize: RequestLifecycleController<OptimizationResult>,
    report: RequestLifecycleController<SavedReport>,
    chat: ChatSessionController,
    reveals: MetricReveals,
}

impl DashboardOrchestrator {
    pub fn new(
        service: Arc<dyn PrecastService>,
        report_sink: Arc<dyn ReportSink>,
        settings: ControllerSettings,
    ) -> Self {
        let (parameters, _) = watch::channel(ProcessParameters::default());
        Self {
            settings,
            chat: ChatSessionController::new(Arc::clone(&service)),
            service,
            report_sink,
            parameters,
            optimize: RequestLifecycleController::new(RequestCategory::Optimize),
            report: RequestLifecycleController::new(RequestCategory::Report),
            reveals: MetricReveals::new(settings.reveal_tick()),
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn parameters(&self) -> ProcessParameters {
        *self.parameters.borrow()
    }

    pub fn subscribe_parameters(&self) -> watch::Receiver<ProcessParameters> {
        self.parameters.subscribe()
    }

    /// Applies raw form input to one field and returns the value actually stored.
    pub fn edit_parameter(&self, field: ParameterField, raw: &str) -> f64 {
        let mut stored = field.domain().min;
        self.parameters.send_modify(|parameters| {
            stored = parameters.set_from_input(field, raw);
        });
        debug!(%field, raw, stored, "parameter edited");
        stored
    }

    pub fn set_parameter(&self, field: ParameterField, value: f64) -> f64 {
        let mut stored = field.domain().min;
        self.parameters.send_modify(|parameters| {
            stored = parameters.set(field, value);
        });
        debug!(%field, value, stored, "parameter set");
        stored
    }

    pub fn reset_parameters(&self) {
        self.parameters.send_replace(ProcessParameters::default());
    }

    pub fn optimize_controller(&self) -> &RequestLifecycleController<OptimizationResult> {
        &self.optimize
    }

    pub fn report_controller(&self) -> &RequestLifecycleController<SavedReport> {
        &self.report
    }

    pub fn chat(&self) -> &ChatSessionController {
        &self.chat
    }

    pub fn reveals(&self) -> &MetricReveals {
        &self.reveals
    }

    pub fn result(&self) -> Option<OptimizationResult> {
        self.optimize.payload()
    }

    /// Submits a snapshot of the current parameters. On success the metrics start
    /// their reveal animation.
    pub async fn optimize(&self) -> RunOutcome {
        let parameters = self.parameters();
        self.reveals.clear_all().await;

        let service = Arc::clone(&self.service);
        let outcome = self
            .optimize
            .run(
                async move {
                    service.optimize(&parameters).await.map_err(|err| {
                        warn!(error = %err, "optimize request failed");
                        optimize_failure_message(&err)
                    })
                },
                self.settings.optimize_min_duration(),
            )
            .await;

        if outcome == RunOutcome::Succeeded {
            if let Some(result) = self.optimize.payload() {
                self.reveals
                    .animate_all(&result.metrics, self.settings.reveal_duration())
                    .await;
            }
        }
        outcome
    }

    /// Requests the report for the current result and saves it under
    /// [`REPORT_FILE_NAME`]. Returns `None` without doing anything when no result
    /// is held.
    pub async fn download_report(&self) -> Option<RunOutcome> {
        let Some(result) = self.optimize.payload() else {
            debug!("report requested without an optimization result; ignoring");
            return None;
        };

        let request = ReportRequest {
            metrics: result.metrics,
            insight: result.insight,
        };
        let service = Arc::clone(&self.service);
        let sink = Arc::clone(&self.report_sink);
        let outcome = self
            .report
            .run(
                async move {
                    let document = service.report(&request).await.map_err(|err| {
                        warn!(error = %err, "report request failed");
                        REPORT_FAILURE_MESSAGE
                    })?;
                    let path = sink
                        .save(REPORT_FILE_NAME, &document)
                        .await
                        .map_err(|err| {
                            warn!(error = %err, "saving report failed");
                            REPORT_FAILURE_MESSAGE
                        })?;
                    Ok::<_, &str>(SavedReport {
                        path,
                        size_bytes: document.len(),
                    })
                },
                self.settings.report_min_duration(),
            )
            .await;
        info!(?outcome, "report download finished");
        Some(outcome)
    }

    pub async fn send_chat(&self, text: &str) -> SendOutcome {
        self.chat.send(text).await
    }

    pub fn view(&self) -> DashboardView {
        let optimize = self.optimize.state();
        let report = self.report.state();
        let chat = self.chat.snapshot();
        DashboardView {
            parameters: self.parameters(),
            can_optimize: !optimize.is_pending(),
            can_download_report: optimize.payload().is_some() && !report.is_pending(),
            can_send_chat: !chat.is_awaiting_reply(),
            displayed_metrics: self.reveals.displayed(),
            optimize,
            report,
            chat,
        }
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
