//! # Math Feedback
//!
//! 手写数学解答的提交评价流水线
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 反馈、结果、题目、提交记录等纯数据类型
//! - 每个阶段的失败模式都是带标签的枚举变体，调用方被迫穷举处理
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单次调用
//! - `Transcriber` - 图片转写能力（视觉 LLM 或 ocr.space）
//! - `Judge` - 判题能力（LLM 结构化反馈）
//!
//! ### ③ 持久层（Store）
//! - `store/` - SQLite 题目目录 + 提交记录，单条原子插入
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/SubmissionFlow` - 一次提交的完整流程：
//!   查题 → 转写（质量门）→ 判题 → 落库 → 统一响应
//!
//! ### ⑤ 编排层（App）
//! - `app` - 装配各层、播种数据库、命令分发
//!
//! ## 落库规则
//!
//! 每次流水线运行至多一次写入；质量拒绝和题目不存在不落库。

pub mod app;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    EvaluationOutcome, Feedback, PipelineResult, StepAnalysis, StepEvaluation,
    SubmissionResponse, TranscriptionOutcome,
};
pub use services::{Judge, Transcriber};
pub use store::{Database, ProblemCatalog, SubmissionStore};
pub use workflow::SubmissionFlow;
