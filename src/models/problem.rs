//! 题目目录数据模型
//!
//! 题目和主题都是只读参照数据，由目录（store::catalog）拥有，
//! 流水线只读不写。

use serde::{Deserialize, Serialize};

/// 主题
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub grade_level: Option<i64>,
}

/// 主题 + 题目数量（目录列表用）
#[derive(Debug, Clone, Serialize)]
pub struct TopicWithCount {
    #[serde(flatten)]
    pub topic: Topic,
    pub problem_count: i64,
}

/// 不带答案的题目（对学生可见的形状）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub topic_id: String,
    pub question: String,
}

/// 带标准答案的题目（只在流水线内部使用，绝不直接下发）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemWithAnswer {
    pub id: String,
    pub topic_id: String,
    pub question: String,
    pub correct_answer: String,
}
