//! 档案记录
//!
//! 外部传入的 规范键 -> 值 映射。值可能是字符串、字符串数组或嵌套记录（教育/工作经历）。
//! 除了"是否为非空字符串 / 是否为数组"之外不做任何模式校验。

use crate::error::ProfileError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 档案中的一个值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileValue {
    Text(String),
    List(Vec<String>),
    Records(Vec<BTreeMap<String, ProfileValue>>),
    Record(BTreeMap<String, ProfileValue>),
    Other(serde_json::Value),
}

impl ProfileValue {
    /// 转成可填入表单的文本；数组以 ", " 连接，嵌套记录没有文本形式
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            ProfileValue::Text(s) => s.trim().to_string(),
            ProfileValue::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            // 混合数组：只取其中的标量
            ProfileValue::Other(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>()
                .join(", "),
            ProfileValue::Other(value) => scalar_text(value)?,
            _ => return None,
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn field(&self, segment: &str) -> Option<&ProfileValue> {
        match self {
            ProfileValue::Record(map) => map.get(segment),
            _ => None,
        }
    }
}

/// 字符串、数字、布尔值的文本形式
fn scalar_text(value: &serde_json::Value) -> Option<String> {
    let text = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    Some(text).filter(|t| !t.is_empty())
}

/// 派生规则：档案中没有直接存储的键如何从其他键得到
#[derive(Debug, Clone, Copy)]
enum Derivation {
    /// 依次尝试这些路径
    Alias(&'static [&'static str]),
    /// 把非空部分用分隔符连接
    Join(&'static [&'static str], &'static str),
    /// 取某个键按空白切分后的第一段
    FirstWord(&'static str),
    /// 取某个键按空白切分后除第一段外的部分
    RestWords(&'static str),
}

const DERIVATIONS: &[(&str, Derivation)] = &[
    ("fullName", Derivation::Join(&["firstName", "lastName"], " ")),
    ("firstName", Derivation::FirstWord("fullName")),
    ("lastName", Derivation::RestWords("fullName")),
    ("location", Derivation::Join(&["city", "state", "country"], ", ")),
    ("phone", Derivation::Alias(&["phoneNumber", "mobile"])),
    ("website", Derivation::Alias(&["portfolio", "personalWebsite"])),
    ("portfolio", Derivation::Alias(&["website", "personalWebsite"])),
    ("linkedin", Derivation::Alias(&["linkedinUrl", "linkedIn"])),
    ("github", Derivation::Alias(&["githubUrl"])),
    ("summary", Derivation::Alias(&["bio", "about"])),
    ("school", Derivation::Alias(&["education.0.school", "education.0.institution", "education.0.university"])),
    ("degree", Derivation::Alias(&["education.0.degree"])),
    ("major", Derivation::Alias(&["education.0.major", "education.0.fieldOfStudy", "education.0.field"])),
    ("graduationYear", Derivation::Alias(&["education.0.graduationYear", "education.0.endYear", "education.0.endDate"])),
    ("currentCompany", Derivation::Alias(&["experience.0.company", "experience.0.employer"])),
    ("currentTitle", Derivation::Alias(&["experience.0.title", "experience.0.position", "experience.0.role"])),
];

/// 档案记录（单次填充期间只读）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile {
    fields: BTreeMap<String, ProfileValue>,
}

impl Profile {
    pub fn new(fields: BTreeMap<String, ProfileValue>) -> Self {
        Self { fields }
    }

    /// 从 JSON 文本解析；顶层必须是对象
    pub fn from_json_str(content: &str) -> Result<Self, ProfileError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        Self::from_json(value)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, ProfileError> {
        if !value.is_object() {
            return Err(ProfileError::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, key: &str) -> Option<&ProfileValue> {
        self.fields.get(key)
    }

    /// 按点路径取值，如 `education.0.school`
    pub fn lookup(&self, path: &str) -> Option<&ProfileValue> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        // Records 的元素是裸 map，下标之后的下一段在该 map 中查找
        let mut pending: Option<&BTreeMap<String, ProfileValue>> = None;
        for segment in segments {
            if let Some(map) = pending.take() {
                current = map.get(segment)?;
                continue;
            }
            match current {
                ProfileValue::Records(list) => {
                    let index: usize = segment.parse().ok()?;
                    pending = Some(list.get(index)?);
                }
                other => current = other.field(segment)?,
            }
        }
        if pending.is_some() {
            return None;
        }
        Some(current)
    }

    fn text_at(&self, path: &str) -> Option<String> {
        self.lookup(path).and_then(ProfileValue::as_text)
    }

    /// 取某个规范键要填入的文本，必要时按派生规则推导
    pub fn value_for(&self, key: &str) -> Option<String> {
        if let Some(text) = self.text_at(key) {
            return Some(text);
        }
        let (_, derivation) = DERIVATIONS.iter().find(|(k, _)| *k == key)?;
        match *derivation {
            Derivation::Alias(paths) => paths.iter().find_map(|p| self.text_at(p)),
            Derivation::Join(parts, sep) => {
                let joined = parts
                    .iter()
                    .filter_map(|p| self.text_at(p))
                    .collect::<Vec<_>>()
                    .join(sep);
                if joined.is_empty() {
                    None
                } else {
                    Some(joined)
                }
            }
            Derivation::FirstWord(source) => self
                .text_at(source)?
                .split_whitespace()
                .next()
                .map(str::to_string),
            Derivation::RestWords(source) => {
                let full = self.text_at(source)?;
                let rest = full.split_whitespace().skip(1).collect::<Vec<_>>().join(" ");
                if rest.is_empty() {
                    None
                } else {
                    Some(rest)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(value: serde_json::Value) -> Profile {
        Profile::from_json(value).unwrap()
    }

    #[test]
    fn test_text_and_list_values() {
        let p = profile(json!({ "email": " a@b.com ", "skills": ["Go", "SQL"], "age": 30, "blank": "  " }));
        assert_eq!(p.value_for("email").as_deref(), Some("a@b.com"));
        assert_eq!(p.value_for("skills").as_deref(), Some("Go, SQL"));
        assert_eq!(p.value_for("age").as_deref(), Some("30"));
        assert_eq!(p.value_for("blank"), None);
        assert_eq!(p.value_for("missing"), None);
    }

    #[test]
    fn test_mixed_array_is_still_joined() {
        let p = profile(json!({ "skills": ["Go", 5, " ", true, null, {"x": 1}] }));
        assert!(matches!(p.get("skills"), Some(ProfileValue::Other(_))));
        assert_eq!(p.value_for("skills").as_deref(), Some("Go, 5, true"));

        let p = profile(json!({ "skills": [null, {}] }));
        assert_eq!(p.value_for("skills"), None);
    }

    #[test]
    fn test_name_derivations() {
        let p = profile(json!({ "firstName": "Ada", "lastName": "Lovelace" }));
        assert_eq!(p.value_for("fullName").as_deref(), Some("Ada Lovelace"));

        let p = profile(json!({ "fullName": "Grace Brewster Hopper" }));
        assert_eq!(p.value_for("firstName").as_deref(), Some("Grace"));
        assert_eq!(p.value_for("lastName").as_deref(), Some("Brewster Hopper"));
    }

    #[test]
    fn test_nested_records() {
        let p = profile(json!({
            "education": [{ "school": "MIT", "degree": "BSc", "fieldOfStudy": "CS" }],
            "experience": [{ "company": "Acme", "title": "Engineer" }]
        }));
        assert!(matches!(p.get("education"), Some(ProfileValue::Records(_))));
        assert_eq!(p.value_for("school").as_deref(), Some("MIT"));
        assert_eq!(p.value_for("major").as_deref(), Some("CS"));
        assert_eq!(p.value_for("currentTitle").as_deref(), Some("Engineer"));
        assert_eq!(p.value_for("education"), None);
        assert_eq!(p.lookup("education.1.school"), None);
    }

    #[test]
    fn test_location_join_skips_missing_parts() {
        let p = profile(json!({ "city": "Berlin", "country": "Germany" }));
        assert_eq!(p.value_for("location").as_deref(), Some("Berlin, Germany"));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            Profile::from_json_str("[1, 2]"),
            Err(ProfileError::NotAnObject)
        ));
        assert!(Profile::from_json_str("{").is_err());
    }
}
