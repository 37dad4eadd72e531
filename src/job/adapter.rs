//! 站点适配器
//!
//! 适配器是纯数据：每个字段一组按优先级排列的 CSS 选择器。
//! 新增站点只需要在 `sites` 里追加一张表。

use super::sanitize::{clean_block, non_empty_line, MAX_DESCRIPTION_CHARS, MAX_FIELD_CHARS};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// 文本不计入结果的元素
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg"];

/// 岗位编号的取法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobIdRule {
    /// 查询参数
    Query(&'static str),
    /// 对完整 URL 执行正则，取第一个捕获组
    Pattern(&'static str),
}

/// 站点适配器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteAdapter {
    /// 适配器名（metadata.adapter）
    pub name: &'static str,
    /// 展示名（jobSource）
    pub label: &'static str,
    /// 可注册域名
    pub domains: &'static [&'static str],
    pub title: &'static [&'static str],
    pub company: &'static [&'static str],
    pub location: &'static [&'static str],
    pub description: &'static [&'static str],
    pub job_id: &'static [JobIdRule],
}

/// 适配器抽取到的原始字段（已清洗，未补占位值）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl ExtractedFields {
    /// 用另一个结果补齐缺失字段，返回是否补上了任何字段
    pub fn fill_missing(&mut self, other: ExtractedFields) -> bool {
        let mut filled = false;
        for (slot, value) in [
            (&mut self.title, other.title),
            (&mut self.company, other.company),
            (&mut self.location, other.location),
            (&mut self.description, other.description),
        ] {
            if slot.is_none() && value.is_some() {
                *slot = value;
                filled = true;
            }
        }
        filled
    }

    pub fn has_title_and_company(&self) -> bool {
        self.title.is_some() && self.company.is_some()
    }
}

impl SiteAdapter {
    /// 对已解析的文档执行全部选择器
    pub fn extract(&self, document: &Html) -> ExtractedFields {
        ExtractedFields {
            title: first_text(document, self.title).and_then(|t| non_empty_line(&t, MAX_FIELD_CHARS)),
            company: first_text(document, self.company)
                .and_then(|t| non_empty_line(&t, MAX_FIELD_CHARS)),
            location: first_text(document, self.location)
                .and_then(|t| non_empty_line(&t, MAX_FIELD_CHARS)),
            description: first_text(document, self.description)
                .map(|t| clean_block(&t, MAX_DESCRIPTION_CHARS))
                .filter(|t| !t.is_empty()),
        }
    }

    /// 从 URL 中取岗位编号
    pub fn job_id(&self, url: &Url) -> Option<String> {
        self.job_id.iter().find_map(|rule| match *rule {
            JobIdRule::Query(name) => url
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.trim().to_string())
                .filter(|v| !v.is_empty()),
            JobIdRule::Pattern(pattern) => {
                let re = Regex::new(pattern).ok()?;
                re.captures(url.as_str())?
                    .get(1)
                    .map(|m| m.as_str().to_string())
            }
        })
    }
}

/// 按选择器顺序返回第一个有文本的元素的文本
fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        let selector = match Selector::parse(raw) {
            Ok(selector) => selector,
            Err(e) => {
                debug!("选择器无效 {}: {:?}", raw, e);
                continue;
            }
        };
        let found = document
            .select(&selector)
            .map(element_text)
            .find(|text| !text.trim().is_empty());
        if found.is_some() {
            return found;
        }
    }
    None
}

/// 元素文本：`<meta>` 取 content，`<img>` 取 alt，其余取可见文本节点（按行拼接）
fn element_text(element: ElementRef) -> String {
    match element.value().name() {
        "meta" => return element.value().attr("content").unwrap_or_default().to_string(),
        "img" => return element.value().attr("alt").unwrap_or_default().to_string(),
        _ => {}
    }
    element
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            if SKIPPED_TAGS.contains(&parent.value().name()) {
                return None;
            }
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SITE: SiteAdapter = SiteAdapter {
        name: "test",
        label: "Test",
        domains: &["test.example"],
        title: &["h1.missing", "h1"],
        company: &["meta[property='og:site_name']"],
        location: &[".loc"],
        description: &["#desc"],
        job_id: &[JobIdRule::Query("jk"), JobIdRule::Pattern(r"/jobs/(\d+)")],
    };

    #[test]
    fn test_selector_priority_and_text_sources() {
        let html = Html::parse_document(
            r#"<html><head><meta property="og:site_name" content="Acme Co"></head>
            <body><h1>  Backend
              Engineer </h1><span class="loc"></span>
            <div id="desc"><p>Line one</p><script>var x = 1;</script><p>Line two</p></div></body></html>"#,
        );
        let fields = TEST_SITE.extract(&html);
        assert_eq!(fields.title.as_deref(), Some("Backend Engineer"));
        assert_eq!(fields.company.as_deref(), Some("Acme Co"));
        assert_eq!(fields.location, None);
        assert_eq!(fields.description.as_deref(), Some("Line one\nLine two"));
    }

    #[test]
    fn test_job_id_rules_in_order() {
        let url = Url::parse("https://test.example/jobs/42?jk=abc").unwrap();
        assert_eq!(TEST_SITE.job_id(&url).as_deref(), Some("abc"));
        let url = Url::parse("https://test.example/jobs/42").unwrap();
        assert_eq!(TEST_SITE.job_id(&url).as_deref(), Some("42"));
        let url = Url::parse("https://test.example/about").unwrap();
        assert_eq!(TEST_SITE.job_id(&url), None);
    }

    #[test]
    fn test_fill_missing() {
        let mut fields = ExtractedFields {
            title: Some("Engineer".into()),
            ..Default::default()
        };
        let filled = fields.fill_missing(ExtractedFields {
            title: Some("Other".into()),
            company: Some("Acme".into()),
            ..Default::default()
        });
        assert!(filled);
        assert_eq!(fields.title.as_deref(), Some("Engineer"));
        assert!(fields.has_title_and_company());
    }
}
