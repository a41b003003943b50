//! 提交记录数据模型
//!
//! 一次流水线运行最多产生一条记录；记录只创建、不更新、不删除。

use serde::Serialize;

use crate::models::feedback::Feedback;

/// 图片留痕截断长度（字符数）
///
/// 只保留编码图片的前 100 个字符做审计线索，绝不用于二次处理。
/// 这是刻意的存储成本上限，不是缺陷。
const IMAGE_SNIPPET_LEN: usize = 100;

/// 待写入的提交记录（id 由 store 在插入时分配）
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub problem_id: String,
    /// 已截断的图片留痕
    pub image_snippet: String,
    pub extracted_text: Option<String>,
    pub is_correct: bool,
    pub feedback: Feedback,
}

impl NewSubmission {
    pub fn new(
        problem_id: &str,
        image_data: &str,
        extracted_text: Option<String>,
        is_correct: bool,
        feedback: Feedback,
    ) -> Self {
        Self {
            problem_id: problem_id.to_string(),
            image_snippet: audit_snippet(image_data),
            extracted_text,
            is_correct,
            feedback,
        }
    }
}

/// 截断编码图片，生成审计留痕
fn audit_snippet(image_data: &str) -> String {
    if image_data.chars().count() > IMAGE_SNIPPET_LEN {
        image_data.chars().take(IMAGE_SNIPPET_LEN).collect::<String>() + "..."
    } else {
        image_data.to_string()
    }
}

/// 提交记录完整视图（含所属题目信息）
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub problem_id: String,
    pub question: String,
    pub correct_answer: String,
    pub image_data: Option<String>,
    pub extracted_text: Option<String>,
    pub is_correct: bool,
    pub feedback: Feedback,
    pub created_at: String,
}

/// 历史列表里的摘要条目
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionSummary {
    pub id: i64,
    pub problem_id: String,
    pub question: String,
    pub is_correct: bool,
    pub feedback_summary: String,
    pub created_at: String,
}

/// 一页历史记录
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPage {
    pub submissions: Vec<SubmissionSummary>,
    pub total: i64,
}
