use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, ProcessMetrics};

/// Endpoint paths relative to the service base URL.
pub const PREDICT_PATH: &str = "predict";
pub const CHAT_PATH: &str = "chat";
pub const REPORT_PATH: &str = "report";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub metrics: ProcessMetrics,
    pub insight: String,
}
