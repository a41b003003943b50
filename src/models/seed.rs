//! 种子数据加载
//!
//! 从 TOML 文件加载初始的主题 / 题目目录，用于首次建库。

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// 种子文件的顶层结构
#[derive(Debug, Clone, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub topics: Vec<SeedTopic>,
}

/// 种子主题，内嵌它的题目列表
#[derive(Debug, Clone, Deserialize)]
pub struct SeedTopic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub grade_level: Option<i64>,
    #[serde(default)]
    pub problems: Vec<SeedProblem>,
}

/// 种子题目
#[derive(Debug, Clone, Deserialize)]
pub struct SeedProblem {
    pub id: String,
    pub question: String,
    pub correct_answer: String,
}

/// 从 TOML 文件加载种子数据
pub async fn load_seed_file(seed_path: &Path) -> Result<SeedData> {
    let content = fs::read_to_string(seed_path)
        .await
        .with_context(|| format!("无法读取种子文件: {}", seed_path.display()))?;

    let data: SeedData = toml::from_str(&content)
        .with_context(|| format!("无法解析种子文件: {}", seed_path.display()))?;

    tracing::info!(
        "种子文件加载完成: {} 个主题, {} 道题目",
        data.topics.len(),
        data.topics.iter().map(|t| t.problems.len()).sum::<usize>()
    );

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seed_toml() {
        let raw = r#"
            [[topics]]
            id = "linear-equations"
            name = "Linear Equations"
            description = "One-variable linear equations"
            grade_level = 7

            [[topics.problems]]
            id = "algebra-1"
            question = "Solve for x: 2x = 10"
            correct_answer = "x=5"
        "#;

        let data: SeedData = toml::from_str(raw).unwrap();
        assert_eq!(data.topics.len(), 1);
        assert_eq!(data.topics[0].problems[0].id, "algebra-1");
        assert_eq!(data.topics[0].problems[0].correct_answer, "x=5");
    }
}
