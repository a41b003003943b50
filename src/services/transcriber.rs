//! 转写服务 - 业务能力层
//!
//! 只负责"图片 → 可读性判定 + 文字提取"这一个能力，不关心流程。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 调用视觉模型
//! - 兼容 OpenAI API 的服务端点
//!
//! 约定：`analyze` 永远不向调用方返回 Err，一切失败都折叠为
//! [`TranscriptionOutcome`] 的变体。

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::TranscriptionOutcome;
use crate::services::parse::extract_json_fragment;

/// 上游没给原因时替补的默认不可读原因
const DEFAULT_ISSUE: &str = "Image quality too low";

/// 可读但无内容时的统一归类原因
const NO_CONTENT_ISSUE: &str = "no mathematical content detected";

/// 转写能力
///
/// 流水线通过这个 trait 注入转写实现，测试用假实现替换
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// 分析一张 base64 编码的图片
    async fn analyze(&self, image_base64: &str) -> TranscriptionOutcome;
}

/// 要求视觉模型返回的判定格式
const TRANSCRIPTION_PROMPT: &str = r#"You are checking a photo of a student's handwritten math work.

First decide whether the photo is usable: the handwriting must be legible and the math work clearly visible. Then, if it is usable, transcribe the student's work line by line as plain text.

Respond ONLY with valid JSON in this exact format (no other text):
{
  "readable": true or false,
  "issues": ["Specific readability problems, empty array if readable"],
  "suggestion": "One actionable tip for retaking the photo, or null",
  "extracted_text": "The transcribed work, or NONE if there is no mathematical content"
}"#;

/// 视觉模型返回的原始判定
#[derive(Debug, Deserialize)]
struct VisionVerdict {
    #[serde(default)]
    readable: bool,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    suggestion: Option<String>,
    #[serde(default)]
    extracted_text: Option<String>,
}

/// 基于视觉 LLM 的转写实现
pub struct VisionTranscriber {
    client: Client<OpenAIConfig>,
    model_name: String,
    timeout: Duration,
}

impl VisionTranscriber {
    /// 创建新的视觉转写服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.vision_model_name.clone(),
            timeout: Duration::from_secs(config.upstream_timeout_secs),
        }
    }

    /// 调用视觉模型，取回原始响应文本
    async fn request_verdict(&self, image_base64: &str) -> Result<String, String> {
        // 补全 data URI 前缀（没有前缀时默认按 JPEG 处理）
        let image_url = if image_base64.starts_with("data:") {
            image_base64.to_string()
        } else {
            format!("data:image/jpeg;base64,{}", image_base64)
        };

        let content_parts = vec![
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: TRANSCRIPTION_PROMPT.to_string(),
                },
            ),
            ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: image_url,
                        detail: Some(ImageDetail::Auto),
                    },
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
            .build()
            .map_err(|e| format!("failed to build transcription request: {}", e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .temperature(0.0)
            .max_tokens(1024u32)
            .build()
            .map_err(|e| format!("failed to build transcription request: {}", e))?;

        debug!("调用视觉模型: {}", self.model_name);

        // 超时一律折叠为传输失败，不允许无界等待
        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                format!(
                    "transcription request timed out after {}s",
                    self.timeout.as_secs()
                )
            })?
            // 鉴权失败 / 限流 / 网络错误的区分保留在错误文本里
            .map_err(|e| format!("transcription request failed: {}", e))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .ok_or_else(|| "transcription service returned an empty response".to_string())
    }
}

#[async_trait]
impl Transcriber for VisionTranscriber {
    async fn analyze(&self, image_base64: &str) -> TranscriptionOutcome {
        let raw = match self.request_verdict(image_base64).await {
            Ok(raw) => raw,
            Err(message) => {
                warn!("转写调用失败: {}", message);
                return TranscriptionOutcome::TransportFailure { message };
            }
        };

        let fragment = extract_json_fragment(&raw).unwrap_or(&raw);
        match serde_json::from_str::<VisionVerdict>(fragment) {
            Ok(verdict) => classify_verdict(verdict),
            Err(e) => {
                warn!("无法解析视觉模型响应: {}", e);
                TranscriptionOutcome::TransportFailure {
                    message: format!("failed to parse transcription response: {}", e),
                }
            }
        }
    }
}

/// 把上游判定归类为结果变体
///
/// 两条规则：
/// - 不可读但没给原因 → 补一条默认原因，issues 保证非空
/// - 可读但文字为空 / 全空白 / 哨兵 "NONE" → 重新归类为不可读，
///   可读性和非空内容缺一不可
fn classify_verdict(verdict: VisionVerdict) -> TranscriptionOutcome {
    if !verdict.readable {
        let issues = if verdict.issues.is_empty() {
            vec![DEFAULT_ISSUE.to_string()]
        } else {
            verdict.issues
        };
        return TranscriptionOutcome::Unreadable {
            issues,
            suggestion: verdict.suggestion,
        };
    }

    let text = verdict.extracted_text.unwrap_or_default();
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "NONE" {
        return TranscriptionOutcome::Unreadable {
            issues: vec![NO_CONTENT_ISSUE.to_string()],
            suggestion: verdict.suggestion,
        };
    }

    TranscriptionOutcome::Readable {
        text: trimmed.to_string(),
    }
}
