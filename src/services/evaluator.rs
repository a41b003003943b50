//! 判题服务 - 业务能力层
//!
//! 只负责"题目 + 标准答案 + 学生文字 → 结构化判定"这一个能力。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务端点
//!
//! 约定：`evaluate` 永远不向调用方返回 Err，一切失败都折叠为
//! [`EvaluationOutcome`] 的变体。`is_correct` 和 `steps_analysis`
//! 原样透传，缺失的可选字段回退为空集合 / None，绝不捏造内容。

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{EvaluationOutcome, Feedback, StepAnalysis};
use crate::services::parse::extract_json_fragment;

/// 判题能力
///
/// 前置条件：`extracted_text` 非空（由流水线保证）。
/// 违反时快速失败，不调用上游。
#[async_trait]
pub trait Judge: Send + Sync {
    async fn evaluate(
        &self,
        question: &str,
        correct_answer: &str,
        extracted_text: &str,
    ) -> EvaluationOutcome;
}

const SYSTEM_MESSAGE: &str = "You are a supportive math tutor evaluating a student's handwritten work.";

/// 判题提示词：要求模型输出固定结构的 JSON 反馈
const EVALUATION_PROMPT: &str = r#"PROBLEM: {question}
CORRECT ANSWER: {correct_answer}

STUDENT'S WORK (extracted from their handwriting):
{extracted_text}

Analyze the student's solution and provide helpful feedback. Focus on:
1. Whether their final answer is correct
2. The reasoning and steps shown in their work
3. Any errors in their process (even if the final answer happens to be correct)
4. What they did well

Important guidelines:
- Be encouraging but honest
- If work is minimal or unclear, note that showing steps helps catch errors
- Point to specific steps, not vague comments
- Frame errors as learning opportunities
- If you can't determine what the student did, say so and provide general guidance

Respond ONLY with valid JSON in this exact format (no other text):
{
  "is_correct": true or false,
  "summary": "Brief 1-2 sentence summary of their work",
  "steps_analysis": [
    {
      "step": "Description of what the student did",
      "evaluation": "correct" or "incorrect" or "unclear",
      "comment": "Specific feedback on this step"
    }
  ],
  "suggestions": ["Improvement suggestions if any, empty array if none"],
  "encouragement": "Brief positive closing note"
}"#;

/// 上游返回的原始判定
#[derive(Debug, Deserialize)]
struct EvaluationVerdict {
    #[serde(default)]
    is_correct: bool,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    steps_analysis: Vec<StepAnalysis>,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    encouragement: Option<String>,
}

/// 基于 LLM 的判题实现
pub struct LlmEvaluator {
    client: Client<OpenAIConfig>,
    model_name: String,
    timeout: Duration,
}

impl LlmEvaluator {
    /// 创建新的判题服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            timeout: Duration::from_secs(config.upstream_timeout_secs),
        }
    }

    /// 构建判题提示词
    fn build_prompt(question: &str, correct_answer: &str, extracted_text: &str) -> String {
        EVALUATION_PROMPT
            .replace("{question}", question)
            .replace("{correct_answer}", correct_answer)
            .replace("{extracted_text}", extracted_text)
    }

    /// 调用判题模型，取回原始响应文本
    async fn request_verdict(&self, prompt: &str) -> Result<String, String> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_MESSAGE)
            .build()
            .map_err(|e| format!("failed to build evaluation request: {}", e))?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| format!("failed to build evaluation request: {}", e))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.3)
            .max_tokens(1024u32)
            .build()
            .map_err(|e| format!("failed to build evaluation request: {}", e))?;

        debug!("调用判题模型: {}", self.model_name);

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| {
                format!(
                    "evaluation request timed out after {}s",
                    self.timeout.as_secs()
                )
            })?
            // 鉴权失败 / 限流的区分保留在错误文本里
            .map_err(|e| format!("evaluation request failed: {}", e))?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .ok_or_else(|| "evaluation service returned an empty response".to_string())
    }
}

#[async_trait]
impl Judge for LlmEvaluator {
    async fn evaluate(
        &self,
        question: &str,
        correct_answer: &str,
        extracted_text: &str,
    ) -> EvaluationOutcome {
        // 前置条件：空文字不该走到这里，快速失败且不调用上游
        if extracted_text.trim().is_empty() {
            warn!("判题前置条件被违反：extracted_text 为空");
            return EvaluationOutcome::TransportFailure {
                message: "no student work to evaluate (empty transcription reached the judge)"
                    .to_string(),
            };
        }

        let prompt = Self::build_prompt(question, correct_answer, extracted_text);

        let raw = match self.request_verdict(&prompt).await {
            Ok(raw) => raw,
            Err(message) => {
                warn!("判题调用失败: {}", message);
                return EvaluationOutcome::TransportFailure { message };
            }
        };

        match parse_verdict(&raw) {
            Some((is_correct, feedback)) => EvaluationOutcome::Judged {
                is_correct,
                feedback,
            },
            None => {
                warn!("无法解析判题响应: {}", crate::utils::truncate_text(&raw, 120));
                EvaluationOutcome::TransportFailure {
                    message: "failed to parse evaluation response".to_string(),
                }
            }
        }
    }
}

/// 解析判题响应
///
/// 先按纯 JSON 解析，失败后尽力提取内嵌片段再试一次
fn parse_verdict(raw: &str) -> Option<(bool, Feedback)> {
    let verdict = serde_json::from_str::<EvaluationVerdict>(raw)
        .ok()
        .or_else(|| {
            let fragment = extract_json_fragment(raw)?;
            serde_json::from_str::<EvaluationVerdict>(fragment).ok()
        })?;

    let feedback = Feedback {
        summary: verdict.summary,
        steps_analysis: verdict.steps_analysis,
        suggestions: verdict.suggestions,
        encouragement: verdict.encouragement,
    };

    Some((verdict.is_correct, feedback))
}
