use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::matching::KeywordTable;
use crate::session::SessionOptions;

/// 程序配置
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 目标URL
    pub target_url: Option<String>,
    /// 目标页面标题（接管已有页面时使用）
    pub target_title: Option<String>,
    /// 是否自行启动无头浏览器
    pub headless: bool,
    /// 浏览器可执行文件
    pub chrome_executable: Option<String>,
    /// 档案 JSON 文件
    pub profile_path: String,
    /// 追加关键字规则的 TOML 文件
    pub keyword_file: Option<String>,
    /// 高亮持续时间（毫秒）
    pub highlight_ms: u64,
    /// 提示显示时间（毫秒）
    pub toast_ms: u64,
    /// 技能数量上限
    pub skill_limit: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        let session = SessionOptions::default();
        Self {
            browser_debug_port: 9222,
            target_url: None,
            target_title: None,
            headless: false,
            chrome_executable: None,
            profile_path: "profile.json".to_string(),
            keyword_file: None,
            highlight_ms: session.highlight_ms,
            toast_ms: session.toast_ms,
            skill_limit: 15,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量读取配置，无法解析的值退回默认值
    pub fn from_env() -> Self {
        Self::load(|name| std::env::var(name).ok(), false).unwrap_or_default()
    }

    /// 从环境变量读取配置，无法解析的值报错
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::load(|name| std::env::var(name).ok(), true)
    }

    /// 按给定的查找函数读取配置
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::load(lookup, true)
    }

    fn load(lookup: impl Fn(&str) -> Option<String>, strict: bool) -> Result<Self, ConfigError> {
        let default = Self::default();
        let text = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            browser_debug_port: env_value(&lookup, "BROWSER_DEBUG_PORT", "u16", strict)?
                .unwrap_or(default.browser_debug_port),
            target_url: text("TARGET_URL").or(default.target_url),
            target_title: text("TARGET_TITLE").or(default.target_title),
            headless: env_value(&lookup, "HEADLESS", "bool", strict)?.unwrap_or(default.headless),
            chrome_executable: text("CHROME_EXECUTABLE").or(default.chrome_executable),
            profile_path: text("PROFILE_PATH").unwrap_or(default.profile_path),
            keyword_file: text("KEYWORD_FILE").or(default.keyword_file),
            highlight_ms: env_value(&lookup, "HIGHLIGHT_MS", "u64", strict)?
                .unwrap_or(default.highlight_ms),
            toast_ms: env_value(&lookup, "TOAST_MS", "u64", strict)?.unwrap_or(default.toast_ms),
            skill_limit: env_value(&lookup, "SKILL_LIMIT", "usize", strict)?
                .unwrap_or(default.skill_limit),
            verbose_logging: env_value(&lookup, "VERBOSE_LOGGING", "bool", strict)?
                .unwrap_or(default.verbose_logging),
        })
    }

    /// 会话时长参数
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            highlight_ms: self.highlight_ms,
            toast_ms: self.toast_ms,
            ..SessionOptions::default()
        }
    }

    /// 构建通用表和即时表；配置了关键字文件时，文件中的规则追加到两张表的末尾
    pub fn keyword_tables(&self) -> Result<(KeywordTable, KeywordTable), ConfigError> {
        let mut general = KeywordTable::general();
        let mut instant = KeywordTable::instant();
        if let Some(file) = &self.keyword_file {
            let path = Path::new(file);
            general.extend_from_file(path)?;
            instant.extend_from_file(path)?;
        }
        Ok((general, instant))
    }
}

/// 读取并解析单个环境变量；未设置或为空时返回 `None`
fn env_value<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    expected_type: &str,
    strict: bool,
) -> Result<Option<T>, ConfigError> {
    let Some(raw) = lookup(name).filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    match raw.trim().parse() {
        Ok(value) => Ok(Some(value)),
        Err(_) if !strict => Ok(None),
        Err(_) => Err(ConfigError::EnvVarParseFailed {
            var_name: name.to_string(),
            value: raw,
            expected_type: expected_type.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.session_options(), SessionOptions::default());
    }

    #[test]
    fn test_values_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("BROWSER_DEBUG_PORT", "2001"),
            ("TARGET_URL", "https://jobs.example/apply"),
            ("HEADLESS", "true"),
            ("HIGHLIGHT_MS", "50"),
            ("SKILL_LIMIT", " 5 "),
            ("TARGET_TITLE", ""),
        ]))
        .unwrap();
        assert_eq!(config.browser_debug_port, 2001);
        assert_eq!(config.target_url.as_deref(), Some("https://jobs.example/apply"));
        assert_eq!(config.target_title, None);
        assert!(config.headless);
        assert_eq!(config.skill_limit, 5);
        assert_eq!(config.session_options().highlight_ms, 50);
        assert_eq!(config.session_options().toast_ms, 3000);
    }

    #[test]
    fn test_strict_parse_error_names_variable() {
        let err = Config::from_lookup(lookup(&[("TOAST_MS", "soon")])).unwrap_err();
        match err {
            ConfigError::EnvVarParseFailed { var_name, value, .. } => {
                assert_eq!(var_name, "TOAST_MS");
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {}", other),
        }
        let lenient = Config::load(lookup(&[("TOAST_MS", "soon")]), false).unwrap();
        assert_eq!(lenient.toast_ms, 3000);
    }

    #[test]
    fn test_keyword_file_extends_both_tables() {
        let path = std::env::temp_dir().join(format!("job_autofill_keywords_{}.toml", std::process::id()));
        std::fs::write(&path, "[[rule]]\nkey = \"pronouns\"\nkeywords = [\"pronoun\"]\n").unwrap();
        let config = Config {
            keyword_file: Some(path.display().to_string()),
            ..Config::default()
        };
        let (general, instant) = config.keyword_tables().unwrap();
        assert!(general.keys().any(|k| k == "pronouns"));
        assert!(instant.keys().any(|k| k == "pronouns"));
        let _ = std::fs::remove_file(&path);

        let missing = Config {
            keyword_file: Some("/nonexistent/keywords.toml".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            missing.keyword_tables(),
            Err(ConfigError::KeywordFileReadFailed { .. })
        ));
    }
}
