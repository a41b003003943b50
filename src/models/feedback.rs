//! 反馈数据模型
//!
//! Judge 返回的结构化反馈：总结 + 每一步的点评 + 建议 + 鼓励语。
//! `steps_analysis` 的顺序就是学生书写步骤的顺序，是展示顺序，不是集合。

use serde::{Deserialize, Serialize};

/// 单步点评结论
///
/// 上游返回未知取值时回退为 `Unclear`，绝不凭空捏造判断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepEvaluation {
    /// 这一步正确
    Correct,
    /// 这一步有错误
    Incorrect,
    /// 无法判断
    #[default]
    #[serde(other)]
    Unclear,
}

/// 对学生某一个解题步骤的点评
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepAnalysis {
    /// 学生做了什么
    #[serde(default)]
    pub step: String,
    /// 点评结论
    #[serde(default)]
    pub evaluation: StepEvaluation,
    /// 针对这一步的具体反馈
    #[serde(default)]
    pub comment: String,
}

/// 一次提交的完整反馈
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Feedback {
    /// 1-2 句话的总结，任何终态下都非空
    #[serde(default)]
    pub summary: String,
    /// 按书写顺序排列的逐步点评
    #[serde(default)]
    pub steps_analysis: Vec<StepAnalysis>,
    /// 改进建议（可以为空列表）
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// 鼓励语
    #[serde(default)]
    pub encouragement: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_json_round_trip() {
        let feedback = Feedback {
            summary: "Good work overall".to_string(),
            steps_analysis: vec![
                StepAnalysis {
                    step: "Divided both sides by 2".to_string(),
                    evaluation: StepEvaluation::Correct,
                    comment: "Correct inverse operation".to_string(),
                },
                StepAnalysis {
                    step: "Wrote x = 5".to_string(),
                    evaluation: StepEvaluation::Correct,
                    comment: "Final answer matches".to_string(),
                },
            ],
            suggestions: vec!["Label each step".to_string()],
            encouragement: Some("Keep it up!".to_string()),
        };

        let json = serde_json::to_string(&feedback).unwrap();
        let back: Feedback = serde_json::from_str(&json).unwrap();

        // 顺序和内容必须完整保留
        assert_eq!(back, feedback);
    }

    #[test]
    fn test_unknown_evaluation_falls_back_to_unclear() {
        let raw = r#"{"step": "something", "evaluation": "partially-correct", "comment": ""}"#;
        let step: StepAnalysis = serde_json::from_str(raw).unwrap();
        assert_eq!(step.evaluation, StepEvaluation::Unclear);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let feedback: Feedback = serde_json::from_str(r#"{"summary": "ok"}"#).unwrap();
        assert_eq!(feedback.summary, "ok");
        assert!(feedback.steps_analysis.is_empty());
        assert!(feedback.suggestions.is_empty());
        assert!(feedback.encouragement.is_none());
    }
}
