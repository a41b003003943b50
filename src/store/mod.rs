//! 持久层
//!
//! 题目目录和提交记录都放在同一个 SQLite 库里。
//! 流水线只通过两个 trait 访问：[`ProblemCatalog`]（只读查题）和
//! [`SubmissionStore`]（写入 / 历史 / 详情），测试可以用假实现替换。

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{NewSubmission, ProblemWithAnswer, SubmissionPage, SubmissionRecord};

pub mod db;

pub use db::Database;

/// 题目查询能力（流水线的 Lookup 阶段使用）
#[async_trait]
pub trait ProblemCatalog: Send + Sync {
    /// 按 id 取带答案的题目，不存在返回 None
    async fn get_problem(&self, problem_id: &str) -> AppResult<Option<ProblemWithAnswer>>;
}

/// 提交记录的持久化能力
///
/// 每条记录一次原子插入，没有多记录事务；并发写入方之间无顺序保证。
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// 插入一条记录，返回 store 分配的单调递增 id
    async fn insert(&self, submission: &NewSubmission) -> AppResult<i64>;

    /// 按创建时间倒序分页取历史，附带总数
    async fn list(&self, limit: u32, offset: u32) -> AppResult<SubmissionPage>;

    /// 取一条完整记录（含题目信息），不存在返回 None
    async fn get(&self, id: i64) -> AppResult<Option<SubmissionRecord>>;
}
