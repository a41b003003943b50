//! 提交处理流程 - 流程层
//!
//! 核心职责：定义"一次提交"的完整处理流程
//!
//! 流程顺序（线性状态机，不回跳、不重试）：
//! 1. 查题 → 不存在直接终止，不落库
//! 2. 转写 → 质量拒绝终止（不落库）；传输失败落库终止；可读继续
//! 3. 判题 → 传输失败落库终止；成功落库返回
//!
//! 每次调用至多一次落库写入；质量拒绝是唯一跳过落库的终止路径——
//! 不可用的图片没有任何值得保存的评价信号，提前拒绝也省下判题额度。

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::{
    EvaluationOutcome, Feedback, NewSubmission, PipelineResult, TranscriptionOutcome,
};
use crate::services::{Judge, Transcriber};
use crate::store::{ProblemCatalog, SubmissionStore};
use crate::utils::truncate_text;

/// 提交处理流程
///
/// - 编排完整的提交评价流程
/// - 决定何时转写、何时判题、何时落库
/// - 不持有任何连接资源
/// - 只依赖注入进来的能力（catalog / transcriber / judge / store）
pub struct SubmissionFlow {
    catalog: Arc<dyn ProblemCatalog>,
    transcriber: Arc<dyn Transcriber>,
    judge: Arc<dyn Judge>,
    store: Arc<dyn SubmissionStore>,
}

impl SubmissionFlow {
    /// 创建新的提交处理流程
    pub fn new(
        catalog: Arc<dyn ProblemCatalog>,
        transcriber: Arc<dyn Transcriber>,
        judge: Arc<dyn Judge>,
        store: Arc<dyn SubmissionStore>,
    ) -> Self {
        Self {
            catalog,
            transcriber,
            judge,
            store,
        }
    }

    /// 处理一次提交
    ///
    /// 返回四种终态之一；`Err` 只表示存储等内部故障，
    /// 上游调用的失败都已折叠进终态里。
    pub async fn process(&self, problem_id: &str, image_data: &str) -> AppResult<PipelineResult> {
        // ========== 阶段 1: 查题 ==========
        let Some(problem) = self.catalog.get_problem(problem_id).await? else {
            warn!("[提交] 题目不存在: {}", problem_id);
            return Ok(PipelineResult::NotFound {
                problem_id: problem_id.to_string(),
            });
        };

        info!("[提交] 📝 题目: {}", truncate_text(&problem.question, 80));

        // ========== 阶段 2: 转写（质量门 + 文字提取）==========
        info!("[提交] 🔍 正在转写手写内容...");

        let text = match self.transcriber.analyze(image_data).await {
            TranscriptionOutcome::Readable { text } => {
                info!("[提交] ✓ 转写完成: {}", truncate_text(&text, 80));
                text
            }
            TranscriptionOutcome::Unreadable { issues, suggestion } => {
                // 质量拒绝：唯一不落库的终止路径
                warn!("[提交] ⚠️ 质量门拒绝: {}", issues.join(", "));
                return Ok(PipelineResult::QualityRejected {
                    feedback: quality_feedback(&issues, suggestion),
                });
            }
            TranscriptionOutcome::TransportFailure { message } => {
                warn!("[提交] ⚠️ 转写调用失败: {}", message);
                // 基础设施失败落库留痕，和内容失败区分开
                let submission = NewSubmission::new(
                    problem_id,
                    image_data,
                    None,
                    false,
                    transcription_failure_feedback(&message),
                );
                let submission_id = self.store.insert(&submission).await?;
                return Ok(PipelineResult::TransportFailed {
                    submission_id,
                    extracted_text: None,
                    feedback: submission.feedback,
                });
            }
        };

        // ========== 阶段 3: 判题 ==========
        info!("[提交] ⚖️ 正在评价解答...");

        match self
            .judge
            .evaluate(&problem.question, &problem.correct_answer, &text)
            .await
        {
            EvaluationOutcome::Judged {
                is_correct,
                feedback,
            } => {
                let submission = NewSubmission::new(
                    problem_id,
                    image_data,
                    Some(text.clone()),
                    is_correct,
                    feedback,
                );
                let submission_id = self.store.insert(&submission).await?;
                info!(
                    "[提交] ✓ 评价完成: id={} correct={}",
                    submission_id, is_correct
                );
                Ok(PipelineResult::Success {
                    submission_id,
                    is_correct,
                    extracted_text: text,
                    feedback: submission.feedback,
                })
            }
            EvaluationOutcome::TransportFailure { message } => {
                warn!("[提交] ⚠️ 判题调用失败: {}", message);
                // 转写结果已经拿到了，保留下来；鼓励语直接给出答案作为补偿
                let submission = NewSubmission::new(
                    problem_id,
                    image_data,
                    Some(text.clone()),
                    false,
                    evaluation_failure_feedback(&message, &problem.correct_answer),
                );
                let submission_id = self.store.insert(&submission).await?;
                Ok(PipelineResult::TransportFailed {
                    submission_id,
                    extracted_text: Some(text),
                    feedback: submission.feedback,
                })
            }
        }
    }
}

/// 质量拒绝的学生可见反馈
///
/// 上游没给建议时用固定的拍摄指引兜底
fn quality_feedback(issues: &[String], suggestion: Option<String>) -> Feedback {
    let suggestions = match suggestion {
        Some(s) => vec![s],
        None => vec![
            "Try taking the photo in better lighting".to_string(),
            "Make sure your work is clearly visible and in focus".to_string(),
            "Write your steps in a clear, top-to-bottom order".to_string(),
        ],
    };

    Feedback {
        summary: format!("Image quality check failed: {}", issues.join(", ")),
        steps_analysis: vec![],
        suggestions,
        encouragement: Some("No worries! Just retake the photo and try again.".to_string()),
    }
}

/// 转写传输失败的学生可见反馈
fn transcription_failure_feedback(message: &str) -> Feedback {
    Feedback {
        summary: format!("Could not process your image: {}", message),
        steps_analysis: vec![],
        suggestions: vec!["Please try again in a moment".to_string()],
        encouragement: Some("Don't give up! This is a temporary issue.".to_string()),
    }
}

/// 判题传输失败的学生可见反馈
///
/// 评价做不成，系统用直接给出正确答案来补偿
fn evaluation_failure_feedback(message: &str, correct_answer: &str) -> Feedback {
    Feedback {
        summary: format!(
            "We extracted your work but couldn't fully evaluate it: {}",
            message
        ),
        steps_analysis: vec![],
        suggestions: vec!["Please try again in a moment".to_string()],
        encouragement: Some(format!("The correct answer is: {}", correct_answer)),
    }
}
