//! SQLite 实现
//!
//! 连接由 `Arc<tokio::sync::Mutex<Connection>>` 共享，
//! 锁内只做同步的 SQL 调用，不跨 await 持锁。

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::AppResult;
use crate::models::{
    Feedback, NewSubmission, Problem, ProblemWithAnswer, SeedData, SubmissionPage,
    SubmissionRecord, SubmissionSummary, Topic, TopicWithCount,
};
use crate::store::{ProblemCatalog, SubmissionStore};

/// 历史分页的上限（原接口校验 le=100）
const MAX_PAGE_SIZE: u32 = 100;

/// 共享数据库句柄
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// 打开（或创建）数据库文件并建表
    pub fn open(path: &str) -> AppResult<Self> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 内存数据库（测试用）
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 目录是否为空（决定启动时要不要播种）
    pub async fn is_catalog_empty(&self) -> AppResult<bool> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM problems", [], |row| row.get(0))?;
        Ok(count == 0)
    }

    /// 写入种子数据（幂等，重复执行会覆盖同 id 条目）
    pub async fn seed(&self, data: &SeedData) -> AppResult<()> {
        let conn = self.conn.lock().await;

        for topic in &data.topics {
            conn.execute(
                "INSERT OR REPLACE INTO topics (id, name, description, grade_level)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    topic.id,
                    topic.name,
                    topic.description,
                    topic.grade_level
                ],
            )?;

            for problem in &topic.problems {
                conn.execute(
                    "INSERT OR REPLACE INTO problems (id, topic_id, question, correct_answer)
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![problem.id, topic.id, problem.question, problem.correct_answer],
                )?;
            }
        }

        info!("种子数据写入完成: {} 个主题", data.topics.len());
        Ok(())
    }

    /// 所有主题 + 题目数量，按年级、名称排序
    pub async fn list_topics(&self) -> AppResult<Vec<TopicWithCount>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name, t.description, t.grade_level, COUNT(p.id) AS problem_count
             FROM topics t
             LEFT JOIN problems p ON t.id = p.topic_id
             GROUP BY t.id
             ORDER BY t.grade_level, t.name",
        )?;

        let topics = stmt
            .query_map([], |row| {
                Ok(TopicWithCount {
                    topic: Topic {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        grade_level: row.get(3)?,
                    },
                    problem_count: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(topics)
    }

    /// 某个主题及它的题目（不含答案），主题不存在返回 None
    pub async fn topic_problems(&self, topic_id: &str) -> AppResult<Option<(Topic, Vec<Problem>)>> {
        let conn = self.conn.lock().await;

        let topic = conn
            .query_row(
                "SELECT id, name, description, grade_level FROM topics WHERE id = ?1",
                [topic_id],
                |row| {
                    Ok(Topic {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        grade_level: row.get(3)?,
                    })
                },
            )
            .optional()?;

        let Some(topic) = topic else {
            return Ok(None);
        };

        let mut stmt =
            conn.prepare("SELECT id, topic_id, question FROM problems WHERE topic_id = ?1")?;
        let problems = stmt
            .query_map([topic_id], |row| {
                Ok(Problem {
                    id: row.get(0)?,
                    topic_id: row.get(1)?,
                    question: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some((topic, problems)))
    }

    /// 单个题目的对外视图（不含答案），不存在返回 None
    pub async fn get_problem_public(&self, problem_id: &str) -> AppResult<Option<Problem>> {
        let conn = self.conn.lock().await;
        let problem = conn
            .query_row(
                "SELECT id, topic_id, question FROM problems WHERE id = ?1",
                [problem_id],
                |row| {
                    Ok(Problem {
                        id: row.get(0)?,
                        topic_id: row.get(1)?,
                        question: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(problem)
    }
}

/// 建表（幂等）
fn init_schema(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS topics (
             id TEXT PRIMARY KEY,
             name TEXT NOT NULL,
             description TEXT,
             grade_level INTEGER
         );
         CREATE TABLE IF NOT EXISTS problems (
             id TEXT PRIMARY KEY,
             topic_id TEXT NOT NULL,
             question TEXT NOT NULL,
             correct_answer TEXT NOT NULL,
             FOREIGN KEY (topic_id) REFERENCES topics (id)
         );
         CREATE TABLE IF NOT EXISTS submissions (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             problem_id TEXT NOT NULL,
             image_data TEXT,
             extracted_text TEXT,
             is_correct BOOLEAN,
             feedback TEXT,
             created_at TEXT NOT NULL,
             FOREIGN KEY (problem_id) REFERENCES problems (id)
         );",
    )?;
    Ok(())
}

/// 容忍历史数据里的坏 JSON：反馈解析失败时退化为空反馈
fn parse_feedback(raw: Option<String>) -> Feedback {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

#[async_trait]
impl ProblemCatalog for Database {
    async fn get_problem(&self, problem_id: &str) -> AppResult<Option<ProblemWithAnswer>> {
        let conn = self.conn.lock().await;
        let problem = conn
            .query_row(
                "SELECT id, topic_id, question, correct_answer FROM problems WHERE id = ?1",
                [problem_id],
                |row| {
                    Ok(ProblemWithAnswer {
                        id: row.get(0)?,
                        topic_id: row.get(1)?,
                        question: row.get(2)?,
                        correct_answer: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(problem)
    }
}

#[async_trait]
impl SubmissionStore for Database {
    async fn insert(&self, submission: &NewSubmission) -> AppResult<i64> {
        let feedback_json = serde_json::to_string(&submission.feedback)?;
        let created_at = chrono::Utc::now().to_rfc3339();

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO submissions (problem_id, image_data, extracted_text, is_correct, feedback, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                submission.problem_id,
                submission.image_snippet,
                submission.extracted_text,
                submission.is_correct,
                feedback_json,
                created_at
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    async fn list(&self, limit: u32, offset: u32) -> AppResult<SubmissionPage> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let conn = self.conn.lock().await;

        let total: i64 =
            conn.query_row("SELECT COUNT(*) FROM submissions", [], |row| row.get(0))?;

        // created_at 同秒并列时用 id 兜底，保证严格的新到旧顺序
        let mut stmt = conn.prepare(
            "SELECT s.id, s.problem_id, p.question, s.is_correct, s.feedback, s.created_at
             FROM submissions s
             JOIN problems p ON s.problem_id = p.id
             ORDER BY s.created_at DESC, s.id DESC
             LIMIT ?1 OFFSET ?2",
        )?;

        let submissions = stmt
            .query_map(rusqlite::params![limit, offset], |row| {
                let feedback_raw: Option<String> = row.get(4)?;
                Ok(SubmissionSummary {
                    id: row.get(0)?,
                    problem_id: row.get(1)?,
                    question: row.get(2)?,
                    is_correct: row.get(3)?,
                    feedback_summary: parse_feedback(feedback_raw).summary,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SubmissionPage { submissions, total })
    }

    async fn get(&self, id: i64) -> AppResult<Option<SubmissionRecord>> {
        let conn = self.conn.lock().await;
        let record = conn
            .query_row(
                "SELECT s.id, s.problem_id, p.question, p.correct_answer, s.image_data,
                        s.extracted_text, s.is_correct, s.feedback, s.created_at
                 FROM submissions s
                 JOIN problems p ON s.problem_id = p.id
                 WHERE s.id = ?1",
                [id],
                |row| {
                    let feedback_raw: Option<String> = row.get(7)?;
                    Ok(SubmissionRecord {
                        id: row.get(0)?,
                        problem_id: row.get(1)?,
                        question: row.get(2)?,
                        correct_answer: row.get(3)?,
                        image_data: row.get(4)?,
                        extracted_text: row.get(5)?,
                        is_correct: row.get(6)?,
                        feedback: parse_feedback(feedback_raw),
                        created_at: row.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}
