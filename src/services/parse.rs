//! 上游响应解析辅助
//!
//! 上游模型偶尔会把 JSON 包在解释文字里，先直接解析，
//! 失败后再尽力提取内嵌的 `{...}` 片段。

use regex::Regex;

/// 从自由文本中提取第一个内嵌的 JSON 对象片段
///
/// 找不到时返回 `None`，由调用方决定放弃
pub(crate) fn extract_json_fragment(raw: &str) -> Option<&str> {
    let re = Regex::new(r"\{[\s\S]*\}").ok()?;
    re.find(raw).map(|m| m.as_str())
}
