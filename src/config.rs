//! 程序配置
//!
//! 所有配置在启动时从环境变量（以及 `.env` 文件）读取一次，之后只读。

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    // --- HTTP 服务 ---
    pub host: String,
    pub port: u16,
    // --- 提交身份 ---
    /// 提交答案时使用的邮箱
    pub email: String,
    /// 与出题方约定的共享密钥
    pub secret: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,
    // --- 浏览器配置 ---
    /// 是否以无头模式启动浏览器
    pub headless: bool,
    /// 页面导航超时（毫秒）
    pub browser_timeout_ms: u64,
    /// 若设置，则连接到已运行的浏览器调试端口而不是启动新浏览器
    pub browser_debug_port: Option<u16>,
    /// 自定义浏览器可执行文件路径
    pub chrome_executable: Option<PathBuf>,
    // --- 答题链配置 ---
    /// 单条答题链的总时长上限（秒）
    pub quiz_timeout_secs: u64,
    /// 同一道题的最大尝试次数
    pub max_retries: u32,
    /// 重试计数是否按 URL 独立计算
    pub per_url_retry: bool,
    /// 发送给 LLM 的数据最大字符数
    pub data_char_budget: usize,
    // --- 文件 ---
    pub downloads_dir: PathBuf,
    pub screenshot_dir: Option<PathBuf>,
    /// 输出日志文件
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            email: String::new(),
            secret: String::new(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_max_tokens: 8000,
            llm_temperature: 0.2,
            headless: true,
            browser_timeout_ms: 30_000,
            browser_debug_port: None,
            chrome_executable: None,
            quiz_timeout_secs: 180,
            max_retries: 2,
            per_url_retry: false,
            data_char_budget: 10_000,
            downloads_dir: PathBuf::from("./downloads"),
            screenshot_dir: None,
            log_file: PathBuf::from("quiz_solver.log"),
        }
    }
}

impl Config {
    /// 读取 `.env` 后从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源加载配置，未设置的项使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        Ok(Self {
            host: lookup("HOST").unwrap_or(default.host),
            port: parse_or(&lookup, "PORT", default.port)?,
            email: lookup("EMAIL").unwrap_or(default.email),
            secret: lookup("SECRET").unwrap_or(default.secret),
            llm_api_key: lookup("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: lookup("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: lookup("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_max_tokens: parse_or(&lookup, "LLM_MAX_TOKENS", default.llm_max_tokens)?,
            llm_temperature: parse_or(&lookup, "LLM_TEMPERATURE", default.llm_temperature)?,
            headless: parse_or(&lookup, "HEADLESS", default.headless)?,
            browser_timeout_ms: parse_or(&lookup, "BROWSER_TIMEOUT_MS", default.browser_timeout_ms)?,
            browser_debug_port: parse_opt(&lookup, "BROWSER_DEBUG_PORT")?,
            chrome_executable: lookup("CHROME_EXECUTABLE").map(PathBuf::from),
            quiz_timeout_secs: parse_or(&lookup, "QUIZ_TIMEOUT_SECS", default.quiz_timeout_secs)?,
            max_retries: parse_or(&lookup, "MAX_RETRIES", default.max_retries)?,
            per_url_retry: parse_or(&lookup, "PER_URL_RETRY", default.per_url_retry)?,
            data_char_budget: parse_or(&lookup, "DATA_CHAR_BUDGET", default.data_char_budget)?,
            downloads_dir: lookup("DOWNLOADS_DIR").map(PathBuf::from).unwrap_or(default.downloads_dir),
            screenshot_dir: lookup("SCREENSHOT_DIR").map(PathBuf::from),
            log_file: lookup("LOG_FILE").map(PathBuf::from).unwrap_or(default.log_file),
        })
    }

    /// 检查必填项
    pub fn validate_required(&self) -> Result<(), ConfigError> {
        let missing: Vec<String> = [
            ("EMAIL", &self.email),
            ("SECRET", &self.secret),
            ("LLM_API_KEY", &self.llm_api_key),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name.to_string())
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingRequired { names: missing })
        }
    }

    pub fn quiz_timeout(&self) -> Duration {
        Duration::from_secs(self.quiz_timeout_secs)
    }

    pub fn browser_timeout(&self) -> Duration {
        Duration::from_millis(self.browser_timeout_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    Ok(parse_opt(lookup, name)?.unwrap_or(default))
}

fn parse_opt<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: raw,
                expected_type: std::any::type_name::<T>().to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.quiz_timeout_secs, 180);
        assert_eq!(config.max_retries, 2);
        assert!(config.headless);
        assert!(!config.per_url_retry);
        assert_eq!(config.browser_debug_port, None);
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9001"),
            ("MAX_RETRIES", "5"),
            ("PER_URL_RETRY", "true"),
            ("HEADLESS", "false"),
            ("BROWSER_DEBUG_PORT", "9222"),
            ("SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.max_retries, 5);
        assert!(config.per_url_retry);
        assert!(!config.headless);
        assert_eq!(config.browser_debug_port, Some(9222));
        assert_eq!(config.secret, "s3cret");
    }

    #[test]
    fn test_bad_number_is_reported() {
        let err = Config::from_lookup(lookup_from(&[("QUIZ_TIMEOUT_SECS", "soon")])).unwrap_err();
        match err {
            ConfigError::EnvVarParseFailed { var_name, value, .. } => {
                assert_eq!(var_name, "QUIZ_TIMEOUT_SECS");
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_required_lists_missing() {
        let config = Config {
            email: "a@b.c".to_string(),
            ..Config::default()
        };
        match config.validate_required() {
            Err(ConfigError::MissingRequired { names }) => {
                assert_eq!(names, vec!["SECRET".to_string(), "LLM_API_KEY".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
