//! 已知招聘站点
//!
//! 域名 → 适配器名用 phf 静态表；查找时从完整主机名开始逐级去掉最左边的标签，
//! 所以 `boards.greenhouse.io`、`acme.wd5.myworkdayjobs.com` 这类子域名也能命中。

use super::adapter::{JobIdRule, SiteAdapter};
use phf::phf_map;

static HOSTS: phf::Map<&'static str, &'static str> = phf_map! {
    "linkedin.com" => "linkedin",
    "indeed.com" => "indeed",
    "indeed.co.uk" => "indeed",
    "indeed.co.in" => "indeed",
    "glassdoor.com" => "glassdoor",
    "glassdoor.co.uk" => "glassdoor",
    "greenhouse.io" => "greenhouse",
    "lever.co" => "lever",
    "myworkdayjobs.com" => "workday",
    "myworkdaysite.com" => "workday",
    "wellfound.com" => "wellfound",
    "angel.co" => "wellfound",
    "ziprecruiter.com" => "ziprecruiter",
    "monster.com" => "monster",
    "naukri.com" => "naukri",
};

pub const LINKEDIN: SiteAdapter = SiteAdapter {
    name: "linkedin",
    label: "LinkedIn",
    domains: &["linkedin.com"],
    title: &[
        ".job-details-jobs-unified-top-card__job-title",
        ".jobs-unified-top-card__job-title",
        ".top-card-layout__title",
        ".topcard__title",
    ],
    company: &[
        ".job-details-jobs-unified-top-card__company-name",
        ".jobs-unified-top-card__company-name",
        ".topcard__org-name-link",
        ".top-card-layout__card .topcard__flavor a",
    ],
    location: &[
        ".job-details-jobs-unified-top-card__bullet",
        ".jobs-unified-top-card__bullet",
        ".topcard__flavor--bullet",
    ],
    description: &[
        "#job-details",
        ".jobs-description__content",
        ".show-more-less-html__markup",
        ".description__text",
    ],
    job_id: &[
        JobIdRule::Query("currentJobId"),
        JobIdRule::Pattern(r"/jobs/view/(?:[^/]*-)?(\d+)"),
    ],
};

pub const INDEED: SiteAdapter = SiteAdapter {
    name: "indeed",
    label: "Indeed",
    domains: &["indeed.com", "indeed.co.uk", "indeed.co.in"],
    title: &[
        "[data-testid='jobsearch-JobInfoHeader-title']",
        "h1.jobsearch-JobInfoHeader-title",
        ".jobsearch-JobInfoHeader-title",
    ],
    company: &[
        "[data-testid='inlineHeader-companyName']",
        "[data-company-name='true']",
        ".jobsearch-InlineCompanyRating a",
    ],
    location: &[
        "[data-testid='inlineHeader-companyLocation']",
        "[data-testid='job-location']",
        ".jobsearch-JobInfoHeader-subtitle > div:last-child",
    ],
    description: &["#jobDescriptionText", ".jobsearch-jobDescriptionText"],
    job_id: &[JobIdRule::Query("jk"), JobIdRule::Query("vjk")],
};

pub const GLASSDOOR: SiteAdapter = SiteAdapter {
    name: "glassdoor",
    label: "Glassdoor",
    domains: &["glassdoor.com", "glassdoor.co.uk"],
    title: &["[data-test='job-title']", "[data-test='jobTitle']"],
    company: &["[data-test='employer-name']", "[data-test='employerName']"],
    location: &["[data-test='location']", "[data-test='emp-location']"],
    description: &[
        "[class*='JobDetails_jobDescription']",
        "#JobDescriptionContainer",
        ".jobDescriptionContent",
    ],
    job_id: &[JobIdRule::Query("jl"), JobIdRule::Query("jobListingId")],
};

pub const GREENHOUSE: SiteAdapter = SiteAdapter {
    name: "greenhouse",
    label: "Greenhouse",
    domains: &["greenhouse.io"],
    title: &["h1.app-title", ".job__title h1", ".job-title"],
    company: &[".company-name", "meta[property='og:site_name']"],
    location: &[".location", ".job__location"],
    description: &["#content", ".job__description", "#app_body"],
    job_id: &[JobIdRule::Query("gh_jid"), JobIdRule::Pattern(r"/jobs/(\d+)")],
};

pub const LEVER: SiteAdapter = SiteAdapter {
    name: "lever",
    label: "Lever",
    domains: &["lever.co"],
    title: &[".posting-headline h2", ".posting-header h2"],
    company: &[".main-header-logo img", "meta[property='og:site_name']"],
    location: &[".posting-categories .location", ".posting-category.location"],
    description: &["[data-qa='job-description']", ".section-wrapper.page-full-width", ".posting-page"],
    job_id: &[JobIdRule::Pattern(r"lever\.co/[^/]+/([0-9a-fA-F-]{36})")],
};

pub const WORKDAY: SiteAdapter = SiteAdapter {
    name: "workday",
    label: "Workday",
    domains: &["myworkdayjobs.com", "myworkdaysite.com"],
    title: &["[data-automation-id='jobPostingHeader']", "h2[data-automation-id='jobPostingHeader']"],
    company: &["meta[property='og:site_name']", "[data-automation-id='company']"],
    location: &["[data-automation-id='locations'] dd", "[data-automation-id='locations']"],
    description: &["[data-automation-id='jobPostingDescription']"],
    job_id: &[JobIdRule::Pattern(r"_([A-Za-z]*-?\d+)(?:-\d+)?(?:$|[/?#])")],
};

pub const WELLFOUND: SiteAdapter = SiteAdapter {
    name: "wellfound",
    label: "Wellfound",
    domains: &["wellfound.com", "angel.co"],
    title: &["[class*='JobTitle']", "h1"],
    company: &["a[href*='/company/'] [class*='name']", "a[href*='/company/']"],
    location: &["[class*='location']"],
    description: &["[class*='description']", "[data-test='JobDescription']"],
    job_id: &[JobIdRule::Pattern(r"/jobs/(\d+)")],
};

pub const ZIPRECRUITER: SiteAdapter = SiteAdapter {
    name: "ziprecruiter",
    label: "ZipRecruiter",
    domains: &["ziprecruiter.com"],
    title: &["h1.job_title", ".job_title"],
    company: &[".hiring_company_text a", ".hiring_company_text", "[class*='hiring_company']"],
    location: &[".location_text", "[class*='job_location']"],
    description: &[".jobDescriptionSection", ".job_description"],
    job_id: &[JobIdRule::Query("jid"), JobIdRule::Query("lk")],
};

pub const MONSTER: SiteAdapter = SiteAdapter {
    name: "monster",
    label: "Monster",
    domains: &["monster.com"],
    title: &["[data-testid='jobTitle']", ".job-header-title"],
    company: &["[data-testid='company']", ".company-name"],
    location: &["[data-testid='jobDetailLocation']", ".location"],
    description: &["[data-testid='svx-description-container-inner']", "#JobDescription"],
    job_id: &[JobIdRule::Query("jobid"), JobIdRule::Pattern(r"/job-openings/[^/?#]*?([0-9a-f]{8}-[0-9a-f-]{27})")],
};

pub const NAUKRI: SiteAdapter = SiteAdapter {
    name: "naukri",
    label: "Naukri",
    domains: &["naukri.com"],
    title: &["h1[class*='jd-header-title']", ".jd-header-title"],
    company: &["[class*='jd-header-comp-name'] a", "[class*='comp-name']"],
    location: &["[class*='location'] a", "[class*='loc'] a"],
    description: &["[class*='job-desc']", "[class*='dang-inner-html']"],
    job_id: &[JobIdRule::Pattern(r"-(\d{6,})(?:$|[/?#])")],
};

/// 通用适配器：宽泛的 class/id 子串匹配
pub const GENERIC: SiteAdapter = SiteAdapter {
    name: "generic",
    label: "Generic",
    domains: &[],
    title: &[
        "h1",
        "[class*='job-title']",
        "[class*='jobTitle']",
        "[id*='job-title']",
        "[id*='jobTitle']",
        "[class*='posting-title']",
        "meta[property='og:title']",
        "title",
    ],
    company: &[
        "[class*='company']",
        "[id*='company']",
        "[class*='employer']",
        "[id*='employer']",
        "[class*='organization']",
        "meta[property='og:site_name']",
    ],
    location: &["[class*='location']", "[id*='location']", "[class*='job-city']"],
    description: &[
        "[class*='job-description']",
        "[id*='job-description']",
        "[class*='jobDescription']",
        "[class*='description']",
        "[id*='description']",
        "article",
        "main",
        "body",
    ],
    job_id: &[],
};

/// 全部站点适配器（不含通用适配器）
pub const SITES: &[SiteAdapter] = &[
    LINKEDIN,
    INDEED,
    GLASSDOOR,
    GREENHOUSE,
    LEVER,
    WORKDAY,
    WELLFOUND,
    ZIPRECRUITER,
    MONSTER,
    NAUKRI,
];

/// 按主机名查找站点适配器
pub fn adapter_for_host(host: &str) -> Option<&'static SiteAdapter> {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    let mut candidate = host.as_str();
    loop {
        if let Some(name) = HOSTS.get(candidate) {
            return SITES.iter().find(|site| site.name == *name);
        }
        match candidate.split_once('.') {
            Some((_, rest)) if rest.contains('.') => candidate = rest,
            _ => return None,
        }
    }
}
