//! 字段身份解析
//!
//! 把 label / placeholder / name / id 四个文本信号拼接（小写），
//! 按表顺序找到第一个关键字是子串的规范键。

use super::keywords::KeywordTable;

/// 字段的文本信号
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSignals {
    pub label: String,
    pub placeholder: String,
    pub name: String,
    pub id: String,
}

impl FieldSignals {
    /// 拼接全部非空信号并转小写
    pub fn haystack(&self) -> String {
        [&self.label, &self.placeholder, &self.name, &self.id]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    pub fn is_empty(&self) -> bool {
        self.haystack().is_empty()
    }
}

/// 解析字段对应的规范键
///
/// 先到先得：键按声明顺序，关键字按键内顺序，不比较特异性。
pub fn resolve<'t>(table: &'t KeywordTable, signals: &FieldSignals) -> Option<&'t str> {
    let haystack = signals.haystack();
    if haystack.is_empty() {
        return None;
    }
    table
        .rules()
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| haystack.contains(kw.as_str())))
        .map(|rule| rule.key.as_str())
}
