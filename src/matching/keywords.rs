//! 关键字表
//!
//! 规范键 -> 有序关键字列表。两张表互相独立：
//! - `general` 完整档案填充使用
//! - `instant` 即时填充（缓存档案）使用
//!
//! 表内顺序就是匹配优先级：先按键的声明顺序，再按键内关键字顺序，第一个命中即返回。
//! 新字段只需要追加数据，不需要新的代码路径。

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// 一条匹配规则
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeywordRule {
    pub key: String,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new(key: impl Into<String>, keywords: &[&str]) -> Self {
        Self {
            key: key.into(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

/// 关键字表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordTable {
    name: String,
    rules: Vec<KeywordRule>,
}

/// TOML 扩展文件格式
#[derive(Debug, Deserialize)]
struct KeywordFile {
    #[serde(default, rename = "rule")]
    rules: Vec<KeywordRule>,
}

const GENERAL_RULES: &[(&str, &[&str])] = &[
    ("email", &["email", "e-mail"]),
    ("phone", &["phone", "mobile", "telephone", "cellphone", "cell number", "contact number"]),
    ("firstName", &["first name", "firstname", "first_name", "fname", "given name", "given-name", "forename"]),
    ("lastName", &["last name", "lastname", "last_name", "lname", "surname", "family name", "family-name"]),
    ("linkedin", &["linkedin"]),
    ("github", &["github"]),
    ("website", &["website", "portfolio", "personal site", "homepage", "url"]),
    ("city", &["city", "town"]),
    ("state", &["state", "province", "region"]),
    ("zip", &["zip", "postal", "postcode"]),
    ("country", &["country", "nationality"]),
    ("address", &["street", "address line", "address1", "address_1", "address"]),
    ("currentCompany", &["current company", "current employer", "company", "employer", "organization"]),
    ("currentTitle", &["job title", "current title", "current role", "designation", "position"]),
    ("school", &["school", "university", "college", "institution"]),
    ("degree", &["degree", "qualification"]),
    ("major", &["major", "field of study", "discipline", "specialization"]),
    ("graduationYear", &["graduation year", "grad year", "year of graduation", "graduation"]),
    ("yearsExperience", &["years of experience", "experience years", "total experience", "yoe"]),
    ("skills", &["skills", "skill set", "technologies", "tech stack"]),
    ("summary", &["summary", "about me", "about you", "bio", "profile"]),
    ("fullName", &["full name", "fullname", "full_name", "your name", "legal name", "candidate name", "name"]),
];

const INSTANT_RULES: &[(&str, &[&str])] = &[
    ("email", &["email", "e-mail"]),
    ("phone", &["phone", "mobile", "telephone", "cellphone", "cell number"]),
    ("linkedin", &["linkedin"]),
    ("github", &["github"]),
    ("portfolio", &["portfolio", "website", "personal site"]),
    ("salaryExpectation", &["salary", "compensation", "expected ctc", "ctc", "pay expectation"]),
    ("noticePeriod", &["notice period", "notice", "earliest start", "start date", "availability"]),
    ("yearsExperience", &["years of experience", "experience", "yoe"]),
    ("currentCompany", &["current company", "company", "employer"]),
    ("currentTitle", &["current title", "job title", "current role", "position"]),
    ("location", &["location", "city", "where are you based", "address"]),
    ("coverLetter", &["cover letter", "why do you want", "why are you interested", "additional information"]),
    ("skills", &["skills", "technologies"]),
    ("fullName", &["full name", "fullname", "your name", "name"]),
];

impl KeywordTable {
    fn from_static(name: &str, rules: &[(&str, &[&str])]) -> Self {
        Self {
            name: name.to_string(),
            rules: rules
                .iter()
                .map(|(key, keywords)| KeywordRule::new(*key, keywords))
                .collect(),
        }
    }

    /// 完整档案填充使用的表
    pub fn general() -> Self {
        Self::from_static("general", GENERAL_RULES)
    }

    /// 即时填充使用的表
    pub fn instant() -> Self {
        Self::from_static("instant", INSTANT_RULES)
    }

    /// 空表
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.key.as_str())
    }

    /// 追加规则；键已存在时把关键字追加到该键末尾（不改变键的优先级）
    pub fn push_rule(&mut self, rule: KeywordRule) {
        let keywords: Vec<String> = rule
            .keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if let Some(existing) = self.rules.iter_mut().find(|r| r.key == rule.key) {
            for keyword in keywords {
                if !existing.keywords.contains(&keyword) {
                    existing.keywords.push(keyword);
                }
            }
        } else if !keywords.is_empty() {
            self.rules.push(KeywordRule {
                key: rule.key,
                keywords,
            });
        }
    }

    pub fn extend(&mut self, rules: impl IntoIterator<Item = KeywordRule>) {
        for rule in rules {
            self.push_rule(rule);
        }
    }

    /// 从 TOML 文本解析规则
    ///
    /// ```toml
    /// [[rule]]
    /// key = "pronouns"
    /// keywords = ["pronoun"]
    /// ```
    pub fn rules_from_toml_str(content: &str, path: &str) -> Result<Vec<KeywordRule>, ConfigError> {
        let file: KeywordFile =
            toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.to_string(),
                source,
            })?;
        Ok(file.rules)
    }

    /// 从 TOML 文件追加规则
    pub fn extend_from_file(&mut self, path: &Path) -> Result<usize, ConfigError> {
        let display = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::KeywordFileReadFailed {
                path: display.clone(),
                source,
            })?;
        let rules = Self::rules_from_toml_str(&content, &display)?;
        let count = rules.len();
        self.extend(rules);
        Ok(count)
    }
}
