//! 文本清洗
//!
//! 去掉控制字符、零宽字符和尖括号，折叠空白，按字段截断长度。

/// 标题、公司、地点的长度上限（字符）
pub const MAX_FIELD_CHARS: usize = 200;

/// 描述的长度上限（字符）
pub const MAX_DESCRIPTION_CHARS: usize = 20_000;

fn is_disallowed(c: char) -> bool {
    (c.is_control() && !c.is_whitespace())
        || matches!(c, '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}' | '<' | '>')
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.to_string(),
    }
}

/// 单行字段：所有空白折叠为一个空格
pub fn clean_line(text: &str, max: usize) -> String {
    let filtered: String = text.chars().filter(|&c| !is_disallowed(c)).collect();
    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max)
}

/// 多行字段：每行折叠空白，去掉空行，保留换行
pub fn clean_block(text: &str, max: usize) -> String {
    let joined = text
        .lines()
        .map(|line| clean_line(line, usize::MAX))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    truncate_chars(&joined, max)
}

/// 清洗后为空则返回 None
pub fn non_empty_line(text: &str, max: usize) -> Option<String> {
    Some(clean_line(text, max)).filter(|s| !s.is_empty())
}
