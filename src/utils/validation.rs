use serde_json::{Map, Value};
use std::fmt;

/// 設定欄位預期的 JSON 類型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Number,
    Object,
    Array,
}

impl OptionKind {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            OptionKind::String => value.is_string(),
            OptionKind::Number => value.is_number(),
            OptionKind::Object => value.is_object(),
            OptionKind::Array => value.is_array(),
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionKind::String => "string",
            OptionKind::Number => "number",
            OptionKind::Object => "object",
            OptionKind::Array => "array",
        };
        f.write_str(name)
    }
}

/// 欄位名稱 → 類型 的靜態表
pub type Schema = &'static [(&'static str, OptionKind)];

/// 檢查結果，收集全部問題而不是遇到第一個就停
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchemaReport {
    pub missing: Vec<String>,
    pub mismatched: Vec<String>,
}

impl SchemaReport {
    pub fn merge(&mut self, other: SchemaReport) {
        self.missing.extend(other.missing);
        self.mismatched.extend(other.mismatched);
    }
}

/// `prefix` 會加在報告的欄位名稱前面，例如 `services[0].`
pub fn check_schema(object: &Map<String, Value>, schema: Schema, prefix: &str) -> SchemaReport {
    let mut report = SchemaReport::default();
    for (key, kind) in schema {
        match object.get(*key) {
            None => report.missing.push(format!("{}{}", prefix, key)),
            Some(value) if !kind.matches(value) => report
                .mismatched
                .push(format!("{}{} (expected {})", prefix, key, kind)),
            Some(_) => {}
        }
    }
    report
}

/// 回傳缺少或空白的欄位名稱，保留輸入順序
pub fn missing_fields(fields: &[(&str, Option<&str>)]) -> Vec<String> {
    fields
        .iter()
        .filter(|(_, value)| value.map(|v| v.trim().is_empty()).unwrap_or(true))
        .map(|(name, _)| name.to_string())
        .collect()
}

pub fn describe_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
