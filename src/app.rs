//! 应用装配与命令入口 - 编排层
//!
//! ## 职责
//!
//! 1. **初始化**：打开数据库、按需播种、装配各个能力并注入流程层
//! 2. **命令分发**：submit / history / show / topics / problem
//!
//! 流程层只认 trait，具体用哪个转写后端在这里决定。

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::models::load_seed_file;
use crate::services::{Judge, LlmEvaluator, OcrSpaceTranscriber, Transcriber, VisionTranscriber};
use crate::store::Database;
use crate::workflow::SubmissionFlow;

/// 应用主结构
pub struct App {
    db: Database,
    flow: SubmissionFlow,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let db = Database::open(&config.database_path)
            .with_context(|| format!("无法打开数据库: {}", config.database_path))?;

        // 目录为空时播种（幂等）
        if db.is_catalog_empty().await? {
            let seed_path = Path::new(&config.seed_data_path);
            if seed_path.exists() {
                info!("📦 目录为空，正在播种: {}", config.seed_data_path);
                let data = load_seed_file(seed_path).await?;
                db.seed(&data).await?;
            } else {
                tracing::warn!("⚠️ 没有找到种子文件: {}", config.seed_data_path);
            }
        }

        let transcriber: Arc<dyn Transcriber> = match config.transcriber_backend.as_str() {
            "vision" => Arc::new(VisionTranscriber::new(&config)),
            "ocrspace" => Arc::new(OcrSpaceTranscriber::new(&config)),
            other => {
                return Err(AppError::Config(format!(
                    "未知的转写后端: {} (可选: vision, ocrspace)",
                    other
                ))
                .into())
            }
        };
        let judge: Arc<dyn Judge> = Arc::new(LlmEvaluator::new(&config));

        let flow = SubmissionFlow::new(
            Arc::new(db.clone()),
            transcriber,
            judge,
            Arc::new(db.clone()),
        );

        Ok(Self { db, flow })
    }

    /// 按命令行参数执行一条命令
    pub async fn run(&self, args: &[String]) -> Result<()> {
        match args.first().map(String::as_str) {
            Some("submit") => {
                let [problem_id, image_path] = &args[1..] else {
                    bail!("用法: submit <problem_id> <image_path>");
                };
                self.submit(problem_id, image_path).await
            }
            Some("history") => {
                let limit = args.get(1).and_then(|v| v.parse().ok()).unwrap_or(10);
                let offset = args.get(2).and_then(|v| v.parse().ok()).unwrap_or(0);
                self.history(limit, offset).await
            }
            Some("show") => {
                let id = args
                    .get(1)
                    .and_then(|v| v.parse().ok())
                    .context("用法: show <id>")?;
                self.show(id).await
            }
            Some("topics") => self.topics().await,
            Some("problem") => {
                let id = args.get(1).context("用法: problem <problem_id>")?;
                self.problem(id).await
            }
            _ => {
                bail!("用法: math_feedback <submit|history|show|topics|problem> ...");
            }
        }
    }

    /// 提交一张图片走完整流水线
    async fn submit(&self, problem_id: &str, image_path: &str) -> Result<()> {
        let bytes = tokio::fs::read(image_path)
            .await
            .with_context(|| format!("无法读取图片: {}", image_path))?;

        let mime = match Path::new(image_path)
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            _ => "image/jpeg",
        };
        let image_data = format!("data:{};base64,{}", mime, BASE64.encode(&bytes));

        let result = self.flow.process(problem_id, &image_data).await?;
        let response = result.into_response();

        println!("{}", serde_json::to_string_pretty(&response)?);
        Ok(())
    }

    /// 分页历史
    async fn history(&self, limit: u32, offset: u32) -> Result<()> {
        use crate::store::SubmissionStore;
        let page = self.db.list(limit, offset).await?;
        println!("{}", serde_json::to_string_pretty(&page)?);
        Ok(())
    }

    /// 单条详情
    async fn show(&self, id: i64) -> Result<()> {
        use crate::store::SubmissionStore;
        match self.db.get(id).await? {
            Some(record) => {
                println!("{}", serde_json::to_string_pretty(&record)?);
                Ok(())
            }
            None => Err(AppError::SubmissionNotFound { id }.into()),
        }
    }

    /// 主题目录
    async fn topics(&self) -> Result<()> {
        let topics = self.db.list_topics().await?;
        println!("{}", serde_json::to_string_pretty(&topics)?);
        Ok(())
    }

    /// 单个题目（不含答案）
    async fn problem(&self, problem_id: &str) -> Result<()> {
        match self.db.get_problem_public(problem_id).await? {
            Some(problem) => {
                println!("{}", serde_json::to_string_pretty(&problem)?);
                Ok(())
            }
            None => bail!("题目不存在: {}", problem_id),
        }
    }
}
