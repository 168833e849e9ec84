//! Scripted service and sink doubles shared by the controller tests.

use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::{ChatMessage, OptimizationResult, ProcessMetrics, ProcessParameters, TrackerData},
    protocol::ReportRequest,
};
use tokio::{sync::Mutex, time};

use crate::{
    error::{ServiceError, SinkError},
    report_sink::ReportSink,
    service::PrecastService,
};

pub(crate) struct Step<T> {
    delay: Duration,
    outcome: Result<T, ServiceError>,
}

pub(crate) fn unreachable(endpoint: &'static str) -> ServiceError {
    ServiceError::Transport {
        endpoint,
        reason: "connection refused".into(),
    }
}

pub(crate) fn sample_result(strength_gain_rate: f64) -> OptimizationResult {
    OptimizationResult {
        metrics: ProcessMetrics {
            strength_gain_rate,
            demould_time: 14.5,
            cost_per_element: 4_820.0,
            energy_consumption: 212.0,
            mold_utilization: 91.5,
            under_strength_risk: 3.2,
        },
        insight: "Raise hold temperature to shorten demould time.".into(),
        tracker_data: TrackerData {
            categories: vec!["Strength variability".into(), "Climate dependency".into()],
            before: vec![18.0, 28.0],
            after: vec![4.0, 7.0],
        },
    }
}

#[derive(Default)]
pub(crate) struct ScriptedService {
    optimize_steps: Mutex<VecDeque<Step<OptimizationResult>>>,
    chat_steps: Mutex<VecDeque<Step<String>>>,
    report_steps: Mutex<VecDeque<Step<Vec<u8>>>>,
    pub optimize_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub report_calls: AtomicUsize,
    pub optimize_requests: Mutex<Vec<ProcessParameters>>,
    pub chat_requests: Mutex<Vec<Vec<ChatMessage>>>,
    pub report_requests: Mutex<Vec<ReportRequest>>,
}

impl ScriptedService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn optimize_after(
        mut self,
        delay_ms: u64,
        outcome: Result<OptimizationResult, ServiceError>,
    ) -> Self {
        self.optimize_steps.get_mut().push_back(Step {
            delay: Duration::from_millis(delay_ms),
            outcome,
        });
        self
    }

    pub(crate) fn chat_after(mut self, delay_ms: u64, outcome: Result<String, ServiceError>) -> Self {
        self.chat_steps.get_mut().push_back(Step {
            delay: Duration::from_millis(delay_ms),
            outcome,
        });
        self
    }

    pub(crate) fn report_after(
        mut self,
        delay_ms: u64,
        outcome: Result<Vec<u8>, ServiceError>,
    ) -> Self {
        self.report_steps.get_mut().push_back(Step {
            delay: Duration::from_millis(delay_ms),
            outcome,
        });
        self
    }
}

async fn play<T>(steps: &Mutex<VecDeque<Step<T>>>, endpoint: &'static str) -> Result<T, ServiceError> {
    let step = steps.lock().await.pop_front();
    match step {
        Some(step) => {
            time::sleep(step.delay).await;
            step.outcome
        }
        None => Err(ServiceError::Transport {
            endpoint,
            reason: "no scripted response".into(),
        }),
    }
}

#[async_trait]
impl PrecastService for ScriptedService {
    async fn optimize(
        &self,
        parameters: &ProcessParameters,
    ) -> Result<OptimizationResult, ServiceError> {
        self.optimize_calls.fetch_add(1, Ordering::SeqCst);
        self.optimize_requests.lock().await.push(*parameters);
        play(&self.optimize_steps, "predict").await
    }

    async fn chat(&self, transcript: &[ChatMessage]) -> Result<String, ServiceError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.chat_requests.lock().await.push(transcript.to_vec());
        play(&self.chat_steps, "chat").await
    }

    async fn report(&self, request: &ReportRequest) -> Result<Vec<u8>, ServiceError> {
        self.report_calls.fetch_add(1, Ordering::SeqCst);
        self.report_requests.lock().await.push(request.clone());
        play(&self.report_steps, "report").await
    }
}

#[derive(Default)]
pub(crate) struct MemoryReportSink {
    pub saved: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail: bool,
}

impl MemoryReportSink {
    pub(crate) fn failing() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl ReportSink for MemoryReportSink {
    async fn save(&self, file_name: &str, document: &[u8]) -> Result<PathBuf, SinkError> {
        if self.fail {
            return Err(SinkError::Io {
                path: PathBuf::from(file_name),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.saved
            .lock()
            .await
            .push((file_name.to_string(), document.to_vec()));
        Ok(PathBuf::from("memory").join(file_name))
    }
}
