use crate::config::EnvSnapshot;
use crate::utils::error::{BrokerError, Result};
use regex::Regex;
use serde_json::Value;
use std::path::Path;

/// 從檔案載入 broker 設定文件。
///
/// `.toml` 以 TOML 解析，其他副檔名以 JSON 解析。解析前會先把 `${VAR}`
/// 換成環境變數的值，找不到的變數保持原樣。
pub fn load_options<P: AsRef<Path>>(path: P, env: &EnvSnapshot) -> Result<Value> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(BrokerError::IoError)?;
    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    tracing::debug!("Loading broker options from {}", path.display());
    if is_toml {
        parse_toml_options(&content, env)
    } else {
        parse_json_options(&content, env)
    }
}

pub fn parse_toml_options(content: &str, env: &EnvSnapshot) -> Result<Value> {
    let processed = substitute_env_vars(content, env)?;
    let table: toml::Table = toml::from_str(&processed)?;
    let value = serde_json::to_value(table)?;
    Ok(value)
}

pub fn parse_json_options(content: &str, env: &EnvSnapshot) -> Result<Value> {
    let processed = substitute_env_vars(content, env)?;
    let value = serde_json::from_str(&processed)?;
    Ok(value)
}

/// 替換環境變數 (例如 ${AUTH_PASSWORD})
pub fn substitute_env_vars(content: &str, env: &EnvSnapshot) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BrokerError::InvalidOptions {
        message: format!("env substitution pattern: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        env.get(var_name)
            .map(str::to_string)
            .unwrap_or_else(|| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}
