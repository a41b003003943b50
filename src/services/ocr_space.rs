//! ocr.space 转写后端 - 业务能力层
//!
//! 备用转写实现：走 ocr.space 的手写识别引擎（Engine 3），
//! 纯 OCR，不做可读性点评，所以质量拒绝只有默认原因、没有建议。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::TranscriptionOutcome;
use crate::services::transcriber::Transcriber;

/// ocr.space 转写客户端
pub struct OcrSpaceTranscriber {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    timeout: Duration,
}

/// ocr.space 的响应结构（只取用到的字段）
#[derive(Debug, Deserialize)]
struct OcrSpaceResponse {
    #[serde(rename = "IsErroredOnProcessing", default)]
    is_errored_on_processing: bool,
    #[serde(rename = "OCRExitCode", default)]
    ocr_exit_code: i64,
    #[serde(rename = "ParsedResults", default)]
    parsed_results: Vec<OcrSpaceParsedResult>,
}

#[derive(Debug, Deserialize)]
struct OcrSpaceParsedResult {
    #[serde(rename = "ParsedText", default)]
    parsed_text: String,
    #[serde(rename = "ErrorMessage", default)]
    error_message: Option<String>,
}

impl OcrSpaceTranscriber {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.ocr_space_api_url.clone(),
            api_key: config.ocr_space_api_key.clone(),
            timeout: Duration::from_secs(config.upstream_timeout_secs),
        }
    }

    async fn request_ocr(&self, image_base64: &str) -> Result<OcrSpaceResponse, String> {
        if self.api_key.is_empty() {
            return Err("ocr.space API key not configured".to_string());
        }

        let base64_image = if image_base64.starts_with("data:") {
            image_base64.to_string()
        } else {
            format!("data:image/jpeg;base64,{}", image_base64)
        };

        let form = [
            ("apikey", self.api_key.as_str()),
            ("base64Image", base64_image.as_str()),
            // Engine 3 是手写专用引擎
            ("OCREngine", "3"),
            ("scale", "true"),
            ("isTable", "true"),
        ];

        debug!("调用 ocr.space: {}", self.api_url);

        let response = self
            .http
            .post(&self.api_url)
            .form(&form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("OCR request timed out after {}s", self.timeout.as_secs())
                } else {
                    format!("OCR network error: {}", e)
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err("OCR service rate limit exceeded".to_string());
        }
        if !status.is_success() {
            return Err(format!("OCR service error: HTTP {}", status.as_u16()));
        }

        response
            .json::<OcrSpaceResponse>()
            .await
            .map_err(|e| format!("failed to parse OCR response: {}", e))
    }
}

#[async_trait]
impl Transcriber for OcrSpaceTranscriber {
    async fn analyze(&self, image_base64: &str) -> TranscriptionOutcome {
        match self.request_ocr(image_base64).await {
            Ok(data) => classify_response(data),
            Err(message) => {
                warn!("OCR 调用失败: {}", message);
                TranscriptionOutcome::TransportFailure { message }
            }
        }
    }
}

/// 把 ocr.space 响应归类为结果变体
fn classify_response(data: OcrSpaceResponse) -> TranscriptionOutcome {
    if data.is_errored_on_processing {
        let message = data
            .parsed_results
            .first()
            .and_then(|r| r.error_message.clone())
            .unwrap_or_else(|| "OCR processing failed".to_string());
        return TranscriptionOutcome::TransportFailure { message };
    }

    // 1 = 全部成功, 2 = 部分成功；其余视为失败
    if data.ocr_exit_code != 1 && data.ocr_exit_code != 2 {
        return TranscriptionOutcome::TransportFailure {
            message: format!("OCR failed with exit code {}", data.ocr_exit_code),
        };
    }

    let text = data
        .parsed_results
        .first()
        .map(|r| r.parsed_text.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return TranscriptionOutcome::Unreadable {
            issues: vec!["no mathematical content detected".to_string()],
            suggestion: None,
        };
    }

    TranscriptionOutcome::Readable { text }
}
