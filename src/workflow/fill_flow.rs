//! 填充流程 - 流程层
//!
//! 核心职责：定义"一次填充"的完整过程
//!
//! 流程顺序：
//! 1. 清理上一次残留的会话状态
//! 2. 按文档序采集字段
//! 3. 关键字表解析规范键 → 取档案值 → 注入
//! 4. 显示一条汇总提示
//!
//! 单个字段出错只记 debug 日志并计入失败数，不会中断整个流程。

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::autofill::{collect_fields, Severity, ValueInjector};
use crate::dom::{Document, NodeId};
use crate::matching::{resolve, KeywordTable};
use crate::profile::Profile;
use crate::session::PageSession;

/// 没有填任何字段时的提示
pub const NO_MATCH_MESSAGE: &str = "No matching fields found";

/// 使用哪张关键字表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// 完整档案填充（通用表）
    Full,
    /// 缓存档案即时填充（即时表）
    Instant,
}

/// 已填写的字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilledField {
    pub key: String,
    pub node: NodeId,
    pub value: String,
}

/// 一次填充的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillReport {
    /// 成功写入的字段数
    #[serde(rename = "filledCount")]
    pub filled: usize,
    /// 解析出规范键且档案中有值的字段数
    pub matched: usize,
    /// 因不可写（已有值、不可见、只读）而跳过的字段数
    pub skipped: usize,
    /// 注入失败的字段数（没有匹配的选项、运行时错误）
    pub failed: usize,
    pub fields: Vec<FilledField>,
}

impl FillReport {
    /// 汇总提示文本
    pub fn summary(&self) -> String {
        match self.filled {
            0 => NO_MATCH_MESSAGE.to_string(),
            1 => "1 field filled".to_string(),
            n => format!("{} fields filled", n),
        }
    }

    fn severity(&self) -> Severity {
        if self.filled > 0 {
            Severity::Success
        } else {
            Severity::Info
        }
    }
}

/// 填充流程
///
/// - 持有两张互相独立的关键字表
/// - 不持有页面和会话，由调用方传入
pub struct FillFlow {
    general: KeywordTable,
    instant: KeywordTable,
    injector: ValueInjector,
}

impl Default for FillFlow {
    fn default() -> Self {
        Self::new(KeywordTable::general(), KeywordTable::instant())
    }
}

impl FillFlow {
    /// 创建新的填充流程
    pub fn new(general: KeywordTable, instant: KeywordTable) -> Self {
        Self {
            general,
            instant,
            injector: ValueInjector::new(),
        }
    }

    pub fn table(&self, mode: FillMode) -> &KeywordTable {
        match mode {
            FillMode::Full => &self.general,
            FillMode::Instant => &self.instant,
        }
    }

    /// 执行一次填充
    pub fn run(
        &self,
        doc: &mut Document,
        session: &mut PageSession,
        profile: &Profile,
        mode: FillMode,
    ) -> FillReport {
        if let Err(e) = session.cleanup(doc) {
            warn!("⚠️ 填充前清理失败: {}", e);
        }

        let table = self.table(mode);
        let fields = collect_fields(doc);
        info!(
            "开始填充 ({} 表): 页面共 {} 个字段，档案 {} 项",
            table.name(),
            fields.len(),
            profile.len()
        );

        let mut report = FillReport::default();
        for field in &fields {
            let Some(key) = resolve(table, &field.signals) else {
                debug!("字段 #{} 未匹配任何规范键: {:?}", field.node, field.signals.haystack());
                continue;
            };
            let Some(value) = profile.value_for(key) else {
                debug!("字段 #{} → {}，但档案中没有值", field.node, key);
                continue;
            };
            report.matched += 1;

            if !self.injector.can_fill(doc, field) {
                debug!("字段 #{} → {}，不可写，跳过", field.node, key);
                report.skipped += 1;
                continue;
            }

            match self.injector.inject(doc, session, field, &value) {
                Ok(true) => {
                    debug!("✓ 字段 #{} → {} = {}", field.node, key, value);
                    report.filled += 1;
                    report.fields.push(FilledField {
                        key: key.to_string(),
                        node: field.node,
                        value,
                    });
                }
                Ok(false) => {
                    debug!("字段 #{} → {}，注入失败", field.node, key);
                    report.failed += 1;
                }
                Err(e) => {
                    debug!("字段 #{} → {}，运行时错误: {}", field.node, key, e);
                    report.failed += 1;
                }
            }
        }

        let message = report.summary();
        if let Err(e) = session.show_toast(doc, &message, report.severity()) {
            warn!("⚠️ 无法显示提示: {}", e);
        }
        info!(
            "✓ 填充完成: 填写 {}，匹配 {}，跳过 {}，失败 {}",
            report.filled, report.matched, report.skipped, report.failed
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(json: &str) -> Profile {
        Profile::from_json_str(json).unwrap()
    }

    #[test]
    fn test_summary_messages() {
        let mut report = FillReport::default();
        assert_eq!(report.summary(), "No matching fields found");
        report.filled = 1;
        assert_eq!(report.summary(), "1 field filled");
        report.filled = 4;
        assert_eq!(report.summary(), "4 fields filled");
    }

    #[test]
    fn test_fill_in_document_order_and_single_toast() {
        let mut doc = Document::from_html(
            "https://jobs.example.com/apply",
            r#"<body><form>
                <label for="fn">First name</label><input id="fn">
                <label for="ln">Last name</label><input id="ln">
                <input name="phone" value="555-0000">
                <select name="country"><option value="">--</option><option value="de">Germany</option></select>
            </form></body>"#,
        );
        let mut session = PageSession::default();
        let report = FillFlow::default().run(
            &mut doc,
            &mut session,
            &profile(r#"{"fullName": "Ada Lovelace", "phone": "555-1234", "country": "France"}"#),
            FillMode::Full,
        );

        let keys: Vec<_> = report.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["firstName", "lastName"]);
        assert_eq!(report.filled, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.matched, 4);
        assert_eq!(session.toasts().messages(), vec!["2 fields filled"]);
        assert_eq!(doc.value(doc.element_by_id("fn").unwrap()), "Ada");
    }

    #[test]
    fn test_no_match_shows_info_toast() {
        let mut doc = Document::from_html("https://example.com", r#"<body><input name="captcha"></body>"#);
        let mut session = PageSession::default();
        let report = FillFlow::default().run(&mut doc, &mut session, &profile(r#"{"email": "a@b.com"}"#), FillMode::Instant);
        assert_eq!(report.filled, 0);
        assert_eq!(session.toasts().messages(), vec![NO_MATCH_MESSAGE]);
        assert_eq!(session.toasts().entries()[0].severity, Severity::Info);
    }

    #[test]
    fn test_second_pass_cleans_first() {
        let mut doc = Document::from_html("https://example.com", r#"<body><input name="email"></body>"#);
        let mut session = PageSession::default();
        let flow = FillFlow::default();
        let p = profile(r#"{"email": "a@b.com"}"#);

        flow.run(&mut doc, &mut session, &p, FillMode::Full);
        let second = flow.run(&mut doc, &mut session, &p, FillMode::Full);

        // 第一次的提示和高亮已被清理，第二次不会覆盖已有值
        assert_eq!(second.filled, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(session.toasts().messages(), vec![NO_MATCH_MESSAGE]);
        assert!(!session.highlights().is_highlighted(doc.elements_by_tag(&["input"])[0]));
    }
}
