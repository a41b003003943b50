//! 应用程序错误类型
//!
//! 注意：上游调用（Transcriber / Judge）的失败不在这里——
//! 它们以 outcome 变体的形式返回，调用方被类型系统强制处理每个分支。
//! 这里只收内部故障：存储、配置、序列化。
//! 文件 IO 只发生在装配阶段，走 anyhow 带上下文上抛。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 提交记录不存在
    #[error("提交记录不存在: {id}")]
    SubmissionNotFound { id: i64 },

    /// 数据库错误
    #[error("数据库错误: {0}")]
    Store(#[from] rusqlite::Error),

    /// JSON 序列化 / 反序列化失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
