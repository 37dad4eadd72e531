//! 岗位抽取
//!
//! 流程：
//! 1. 按主机名匹配站点适配器
//! 2. 执行站点选择器
//! 3. 职位名或公司缺失时用通用适配器补齐
//! 4. 对描述统一做薪资、雇佣类型、办公方式、经验级别、技能分类
//! 5. 清洗文本，必填字段仍为空时填入占位值
//!
//! 找不到字段不是错误；只有职位名和公司都找不到时才返回 `None`。
//! `scraper` 的类型不是 `Send`，异步代码中应放到 `spawn_blocking` 里调用。

pub mod adapter;
pub mod enrich;
pub mod model;
pub mod salary;
pub mod sanitize;
pub mod sites;

pub use adapter::{ExtractedFields, JobIdRule, SiteAdapter};
pub use model::{
    EmploymentType, ExperienceLevel, JobMetadata, JobRecord, SalaryPeriod, SalaryRange, WorkMode,
    UNKNOWN_COMPANY, UNKNOWN_POSITION,
};
pub use salary::parse_salary;
pub use sites::{adapter_for_host, GENERIC};

use chrono::{SecondsFormat, Utc};
use scraper::Html;
use tracing::{debug, info};
use url::Url;

/// 岗位抽取器
#[derive(Debug, Clone)]
pub struct JobExtractor {
    skill_limit: usize,
}

impl Default for JobExtractor {
    fn default() -> Self {
        Self::new(enrich::DEFAULT_SKILL_LIMIT)
    }
}

impl JobExtractor {
    pub fn new(skill_limit: usize) -> Self {
        Self { skill_limit }
    }

    /// 从页面 HTML 抽取岗位记录
    pub fn extract(&self, url: &str, html: &str) -> Option<JobRecord> {
        let parsed = Url::parse(url.trim()).ok();
        let host = parsed
            .as_ref()
            .and_then(|u| u.host_str())
            .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
            .unwrap_or_default();

        let document = Html::parse_document(html);
        let site = adapter_for_host(&host);

        let mut fields = match site {
            Some(site) => {
                debug!("使用 {} 适配器: {}", site.name, host);
                site.extract(&document)
            }
            None => ExtractedFields::default(),
        };
        let mut used_fallback = false;
        if !fields.has_title_and_company() {
            debug!("职位名或公司缺失，使用通用适配器补齐");
            fields.fill_missing(GENERIC.extract(&document));
            used_fallback = true;
        }

        if fields.title.is_none() && fields.company.is_none() {
            info!("未能从 {} 抽取到岗位信息", url);
            return None;
        }

        let title = fields.title.unwrap_or_else(|| UNKNOWN_POSITION.to_string());
        let company = fields.company.unwrap_or_else(|| UNKNOWN_COMPANY.to_string());
        let location = fields.location.unwrap_or_default();
        let description = fields.description.unwrap_or_default();

        let context = format!("{}\n{}", location, description);
        let adapter = site.unwrap_or(&GENERIC);
        let record = JobRecord {
            salary_range: parse_salary(&context),
            employment_type: enrich::employment_type(&context),
            work_mode: enrich::work_mode(&context),
            experience_level: enrich::experience_level(&title, &description),
            required_skills: enrich::required_skills(&description, self.skill_limit),
            job_source: match site {
                Some(site) => site.label.to_string(),
                None if !host.is_empty() => host.clone(),
                None => GENERIC.name.to_string(),
            },
            job_id: parsed.as_ref().and_then(|u| adapter.job_id(u)),
            jd_url: url.trim().to_string(),
            metadata: JobMetadata {
                host,
                adapter: adapter.name.to_string(),
                used_fallback,
                extracted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            },
            job_title: title,
            company,
            location,
            job_description: description,
        };

        info!(
            "✓ 抽取岗位: {} @ {} ({})",
            record.job_title, record.company, record.metadata.adapter
        );
        Some(record)
    }
}
