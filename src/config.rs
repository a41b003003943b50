/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite 数据库文件路径
    pub database_path: String,
    /// 种子数据文件路径
    pub seed_data_path: String,
    /// 转写后端："vision"（视觉 LLM）或 "ocrspace"（ocr.space）
    pub transcriber_backend: String,
    /// 上游调用超时（秒），两个上游共用
    pub upstream_timeout_secs: u64,
    // --- LLM 配置（判题 + 视觉转写共用一个端点）---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    /// 判题模型
    pub llm_model_name: String,
    /// 视觉转写模型
    pub vision_model_name: String,
    // --- ocr.space 配置 ---
    pub ocr_space_api_key: String,
    pub ocr_space_api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "math_feedback.db".to_string(),
            seed_data_path: "seed_data.toml".to_string(),
            transcriber_backend: "vision".to_string(),
            upstream_timeout_secs: 60,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            vision_model_name: "gpt-4o".to_string(),
            ocr_space_api_key: String::new(),
            ocr_space_api_url: "https://api.ocr.space/parse/image".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or(default.database_path),
            seed_data_path: std::env::var("SEED_DATA_PATH").unwrap_or(default.seed_data_path),
            transcriber_backend: std::env::var("TRANSCRIBER_BACKEND").unwrap_or(default.transcriber_backend),
            upstream_timeout_secs: std::env::var("UPSTREAM_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.upstream_timeout_secs),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            vision_model_name: std::env::var("VISION_MODEL_NAME").unwrap_or(default.vision_model_name),
            ocr_space_api_key: std::env::var("OCR_SPACE_API_KEY").unwrap_or(default.ocr_space_api_key),
            ocr_space_api_url: std::env::var("OCR_SPACE_API_URL").unwrap_or(default.ocr_space_api_url),
        }
    }
}
