//! 岗位描述分类器
//!
//! 与适配器无关，对最终得到的描述文本统一执行。
//! 所有分类都是有序关键字表 + 先到先得。

use super::model::{EmploymentType, ExperienceLevel, WorkMode};
use regex::Regex;
use std::sync::OnceLock;

/// 技能数量上限
pub const DEFAULT_SKILL_LIMIT: usize = 15;

const EMPLOYMENT_RULES: &[(EmploymentType, &[&str])] = &[
    (EmploymentType::Internship, &["internship", "intern ", "co-op"]),
    (EmploymentType::PartTime, &["part-time", "part time"]),
    (EmploymentType::Contract, &["contract", "contractor", "freelance"]),
    (EmploymentType::Temporary, &["temporary", "seasonal"]),
    (EmploymentType::FullTime, &["full-time", "full time", "fulltime", "permanent"]),
];

const WORK_MODE_RULES: &[(WorkMode, &[&str])] = &[
    (WorkMode::Hybrid, &["hybrid"]),
    (WorkMode::Remote, &["remote", "work from home", "wfh", "distributed team"]),
    (WorkMode::Onsite, &["on-site", "onsite", "in-office", "in office", "on site"]),
];

/// 经验级别关键字按词匹配，"intern" 不会命中 "Internal"
const EXPERIENCE_RULES: &[(ExperienceLevel, &[&str])] = &[
    (ExperienceLevel::Executive, &["chief", "vice president", "vp of", "director", "head of"]),
    (ExperienceLevel::Lead, &["principal", "staff", "lead", "tech lead", "architect"]),
    (ExperienceLevel::Senior, &["senior", "sr.", "sr"]),
    (ExperienceLevel::Mid, &["mid-level", "mid level", "intermediate"]),
    (
        ExperienceLevel::Entry,
        &["entry level", "entry-level", "junior", "jr.", "jr", "graduate", "new grad", "intern", "internship"],
    ),
];

/// 技能词典（展示名）
const SKILLS: &[&str] = &[
    "JavaScript", "TypeScript", "Python", "Java", "Go", "Golang", "Rust", "C++", "C#", "Ruby",
    "PHP", "Kotlin", "Swift", "Scala", "Elixir", "SQL", "PostgreSQL", "MySQL", "MongoDB", "Redis",
    "Elasticsearch", "Kafka", "RabbitMQ", "GraphQL", "REST", "gRPC", "React", "Vue", "Angular",
    "Svelte", "Next.js", "Node.js", "Express", "Django", "Flask", "FastAPI", "Spring", "Rails",
    ".NET", "AWS", "GCP", "Azure", "Docker", "Kubernetes", "Terraform", "Ansible", "Linux",
    "Git", "CI/CD", "Jenkins", "HTML", "CSS", "Tailwind", "Figma", "Machine Learning",
    "Deep Learning", "TensorFlow", "PyTorch", "Pandas", "Spark", "Hadoop", "Airflow", "Snowflake",
    "Tableau", "Excel", "Agile", "Scrum", "Microservices",
];

/// 按表顺序找到第一个命中的分类（子串匹配）
fn classify<T: Copy>(rules: &[(T, &[&str])], text: &str) -> Option<T> {
    let text = text.to_lowercase();
    rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(value, _)| *value)
}

/// 同上，但关键字必须是完整的词
fn classify_terms<T: Copy>(rules: &[(T, &[&str])], text: &str) -> Option<T> {
    let text = text.to_lowercase();
    rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| contains_term(&text, k)))
        .map(|(value, _)| *value)
}

pub fn employment_type(text: &str) -> Option<EmploymentType> {
    classify(EMPLOYMENT_RULES, text)
}

pub fn work_mode(text: &str) -> Option<WorkMode> {
    classify(WORK_MODE_RULES, text)
}

fn years_regex() -> Option<&'static Regex> {
    static YEARS: OnceLock<Option<Regex>> = OnceLock::new();
    YEARS
        .get_or_init(|| {
            Regex::new(r"(?i)\b(\d{1,2})\s*(?:\+|\s*(?:-|–|to)\s*\d{1,2})?\s*(?:years?|yrs?)\b").ok()
        })
        .as_ref()
}

/// 从"3-5 years"、"7+ yrs"一类描述中取最低年限
pub fn years_required(text: &str) -> Option<u32> {
    years_regex()?
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .next()
}

fn level_for_years(years: u32) -> ExperienceLevel {
    match years {
        0..=1 => ExperienceLevel::Entry,
        2..=4 => ExperienceLevel::Mid,
        5..=7 => ExperienceLevel::Senior,
        _ => ExperienceLevel::Lead,
    }
}

/// 经验级别：先看职位名关键字，再看描述中的年限，最后看描述关键字
pub fn experience_level(title: &str, description: &str) -> Option<ExperienceLevel> {
    classify_terms(EXPERIENCE_RULES, title)
        .or_else(|| years_required(description).map(level_for_years))
        .or_else(|| classify_terms(EXPERIENCE_RULES, description))
}

/// 技能扫描：不区分大小写的子串匹配，按词典顺序，最多 `limit` 个
///
/// 技能名以字母或数字开头（结尾）时，命中位置前（后）不能紧跟字母或数字，
/// 避免 "Go" 命中 "Google"；".NET"、"C++" 这类以符号起止的一侧不做限制。
pub fn required_skills(text: &str, limit: usize) -> Vec<String> {
    let haystack = text.to_lowercase();
    SKILLS
        .iter()
        .filter(|skill| contains_term(&haystack, &skill.to_lowercase()))
        .take(limit)
        .map(|skill| skill.to_string())
        .collect()
}

fn contains_term(haystack: &str, term: &str) -> bool {
    let check_before = term.chars().next().is_some_and(char::is_alphanumeric);
    let check_after = term.chars().next_back().is_some_and(char::is_alphanumeric);
    haystack.match_indices(term).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !(check_before && before.is_some_and(char::is_alphanumeric))
            && !(check_after && after.is_some_and(char::is_alphanumeric))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employment_type_order() {
        assert_eq!(employment_type("This is a Full-Time role"), Some(EmploymentType::FullTime));
        assert_eq!(employment_type("6 month contract, full time hours"), Some(EmploymentType::Contract));
        assert_eq!(employment_type("Summer internship"), Some(EmploymentType::Internship));
        assert_eq!(employment_type("Great team"), None);
    }

    #[test]
    fn test_work_mode() {
        assert_eq!(work_mode("Hybrid: 3 days in office, remote otherwise"), Some(WorkMode::Hybrid));
        assert_eq!(work_mode("Fully Remote (US)"), Some(WorkMode::Remote));
        assert_eq!(work_mode("This role is on-site in Berlin"), Some(WorkMode::Onsite));
        assert_eq!(work_mode(""), None);
    }

    #[test]
    fn test_experience_level() {
        assert_eq!(experience_level("Senior Backend Engineer", ""), Some(ExperienceLevel::Senior));
        assert_eq!(experience_level("Tech Lead", ""), Some(ExperienceLevel::Lead));
        assert_eq!(experience_level("Backend Engineer", "You have 3-5 years of experience"), Some(ExperienceLevel::Mid));
        assert_eq!(experience_level("Backend Engineer", "7+ yrs building APIs"), Some(ExperienceLevel::Senior));
        assert_eq!(experience_level("Engineer", "Open to junior candidates"), Some(ExperienceLevel::Entry));
        assert_eq!(experience_level("Engineer", "Build things"), None);
    }

    #[test]
    fn test_experience_keywords_are_whole_words() {
        assert_eq!(experience_level("Internal Tools Engineer", ""), None);
        assert_eq!(experience_level("International Account Manager", ""), None);
        assert_eq!(experience_level("Software Engineering Intern", ""), Some(ExperienceLevel::Entry));
        assert_eq!(experience_level("Sr. Data Scientist", ""), Some(ExperienceLevel::Senior));
        assert_eq!(experience_level("Engineer", "A company with over 100 years of history"), None);
    }

    #[test]
    fn test_years_required() {
        assert_eq!(years_required("at least 2 years"), Some(2));
        assert_eq!(years_required("10+ years"), Some(10));
        assert_eq!(years_required("no requirement"), None);
        assert_eq!(years_required("founded 150 years ago"), None);
        assert_eq!(years_required("2022 yrs"), None);
    }

    #[test]
    fn test_skills_scan_boundaries_and_cap() {
        let skills = required_skills("We use Go, SQL and node.js; experience at Google is a plus. C++ helps.", 15);
        assert_eq!(skills, vec!["Go", "C++", "SQL", "Node.js"]);

        assert_eq!(required_skills("ASP.NET Core services, C++17", 15), vec!["C++", ".NET"]);

        let many = SKILLS.join(" ");
        assert_eq!(required_skills(&many, DEFAULT_SKILL_LIMIT).len(), DEFAULT_SKILL_LIMIT);
        assert!(required_skills("nothing relevant", 15).is_empty());
    }
}
