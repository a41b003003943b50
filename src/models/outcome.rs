//! 流水线各阶段的结果类型
//!
//! 每个阶段的所有失败模式都用带标签的枚举变体表达，
//! 调用方必须穷举处理每个分支，不存在"忘了检查可选字段"的情况。

use serde::Serialize;

use crate::models::feedback::Feedback;

/// Transcriber（转写能力）的调用结果
///
/// `analyze` 永远不向调用方抛错，一切失败都折叠为变体
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptionOutcome {
    /// 图片可读，成功提取出非空文字
    Readable { text: String },
    /// 内容层面的质量拒绝：图片不可用
    Unreadable {
        /// 不可读的原因，保证非空
        issues: Vec<String>,
        /// 可选的一条可操作建议
        suggestion: Option<String>,
    },
    /// 基础设施层面的失败（网络 / 鉴权 / 限流 / 超时 / 解析）
    ///
    /// 具体类别保留在 message 文本里，调用方不需要区分
    TransportFailure { message: String },
}

/// Judge（判题能力）的调用结果
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    /// 成功得到判题结论
    Judged { is_correct: bool, feedback: Feedback },
    /// 基础设施层面的失败
    TransportFailure { message: String },
}

/// 一次提交处理的终态，四选一
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineResult {
    /// 题目不存在。不落库，不调用任何上游
    NotFound { problem_id: String },
    /// 质量门拒绝。不落库，没有存储标识
    QualityRejected { feedback: Feedback },
    /// 某个上游调用基础设施失败。已落库留痕
    TransportFailed {
        submission_id: i64,
        extracted_text: Option<String>,
        feedback: Feedback,
    },
    /// 完整走完流水线。已落库
    Success {
        submission_id: i64,
        is_correct: bool,
        extracted_text: String,
        feedback: Feedback,
    },
}

/// 面向展示层的统一响应
///
/// 四种终态都收敛到这个形状：summary 一定非空，suggestions 一定存在
/// （可能为空列表），展示层不需要任何特判。
///
/// 质量拒绝和题目不存在时 `submission_id` 为 `None`——
/// 显式表达"没有存储"，而不是魔法值 0。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionResponse {
    pub submission_id: Option<i64>,
    pub is_correct: bool,
    pub extracted_work: Option<String>,
    pub feedback: Feedback,
    pub quality_failed: bool,
}

impl PipelineResult {
    /// 把终态整形为统一响应
    pub fn into_response(self) -> SubmissionResponse {
        match self {
            PipelineResult::NotFound { problem_id } => SubmissionResponse {
                submission_id: None,
                is_correct: false,
                extracted_work: None,
                feedback: Feedback {
                    summary: format!("We couldn't find the problem \"{}\".", problem_id),
                    steps_analysis: vec![],
                    suggestions: vec![
                        "Pick a problem from the topics list and try again".to_string()
                    ],
                    encouragement: None,
                },
                quality_failed: false,
            },
            PipelineResult::QualityRejected { feedback } => SubmissionResponse {
                submission_id: None,
                is_correct: false,
                extracted_work: None,
                feedback,
                quality_failed: true,
            },
            PipelineResult::TransportFailed {
                submission_id,
                extracted_text,
                feedback,
            } => SubmissionResponse {
                submission_id: Some(submission_id),
                is_correct: false,
                extracted_work: extracted_text,
                feedback,
                quality_failed: false,
            },
            PipelineResult::Success {
                submission_id,
                is_correct,
                extracted_text,
                feedback,
            } => SubmissionResponse {
                submission_id: Some(submission_id),
                is_correct,
                extracted_work: Some(extracted_text),
                feedback,
                quality_failed: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_response_is_renderable() {
        let resp = PipelineResult::NotFound {
            problem_id: "does-not-exist".to_string(),
        }
        .into_response();

        assert!(resp.submission_id.is_none());
        assert!(!resp.feedback.summary.is_empty());
        assert!(!resp.feedback.suggestions.is_empty());
        assert!(!resp.quality_failed);
    }

    #[test]
    fn test_quality_rejected_has_no_identifier() {
        let resp = PipelineResult::QualityRejected {
            feedback: Feedback {
                summary: "Image quality check failed: blurry".to_string(),
                ..Default::default()
            },
        }
        .into_response();

        assert!(resp.submission_id.is_none());
        assert!(resp.quality_failed);
    }

    #[test]
    fn test_success_echoes_stored_identifier() {
        let resp = PipelineResult::Success {
            submission_id: 42,
            is_correct: true,
            extracted_text: "2x=10, x=5".to_string(),
            feedback: Feedback::default(),
        }
        .into_response();

        assert_eq!(resp.submission_id, Some(42));
        assert!(resp.is_correct);
        assert_eq!(resp.extracted_work.as_deref(), Some("2x=10, x=5"));
    }
}
