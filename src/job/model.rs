//! 岗位记录
//!
//! 每次抽取新建，交给外部存储，不在这里缓存。字段名在 JSON 中为 camelCase。

use serde::{Deserialize, Serialize};

/// 必填字段缺失时的占位值
pub const UNKNOWN_POSITION: &str = "Unknown Position";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// 标准化后的岗位记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub jd_url: String,
    pub job_description: String,
    pub salary_range: Option<SalaryRange>,
    pub employment_type: Option<EmploymentType>,
    pub work_mode: Option<WorkMode>,
    pub experience_level: Option<ExperienceLevel>,
    pub required_skills: Vec<String>,
    pub job_source: String,
    pub job_id: Option<String>,
    pub metadata: JobMetadata,
}

/// 抽取过程的元信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMetadata {
    pub host: String,
    /// 最终使用的适配器名
    pub adapter: String,
    /// 是否用到了通用适配器兜底
    pub used_fallback: bool,
    /// RFC 3339 时间
    pub extracted_at: String,
}

/// 薪资区间
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: u64,
    pub max: u64,
    pub currency: String,
    pub period: SalaryPeriod,
    /// 命中的原文
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryPeriod {
    Hourly,
    Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Temporary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkMode {
    Remote,
    Hybrid,
    Onsite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Lead,
    Executive,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let record = JobRecord {
            job_title: "Backend Engineer".into(),
            company: "Acme Co".into(),
            location: String::new(),
            jd_url: "https://acme.example/jobs/1".into(),
            job_description: String::new(),
            salary_range: Some(SalaryRange {
                min: 50_000,
                max: 70_000,
                currency: "USD".into(),
                period: SalaryPeriod::Yearly,
                raw: "50k-70k".into(),
            }),
            employment_type: Some(EmploymentType::FullTime),
            work_mode: Some(WorkMode::Onsite),
            experience_level: None,
            required_skills: vec!["Rust".into()],
            job_source: "generic".into(),
            job_id: None,
            metadata: JobMetadata {
                host: "acme.example".into(),
                adapter: "generic".into(),
                used_fallback: true,
                extracted_at: "2024-01-01T00:00:00+00:00".into(),
            },
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["jobTitle"], json!("Backend Engineer"));
        assert_eq!(value["salaryRange"]["period"], json!("yearly"));
        assert_eq!(value["employmentType"], json!("full-time"));
        assert_eq!(value["workMode"], json!("onsite"));
        assert_eq!(value["metadata"]["usedFallback"], json!(true));
        assert_eq!(value["experienceLevel"], json!(null));
    }
}
