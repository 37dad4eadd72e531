//! 薪资解析
//!
//! 多个正则按固定优先级依次尝试，第一个命中的为准：
//! 1. 带货币符号的区间：`$80,000 - $100,000`
//! 2. 货币代码开头：`USD 120k - 150k`、`EUR 55000`
//! 3. 无货币符号的 k 区间：`50k-70k`、`50-70k`
//! 4. 带货币符号的单值：`$45/hr`
//!
//! `k` 表示乘以 1000；出现 hour、/hr、per hr 视为时薪，出现 year、annum、/yr 视为年薪，
//! 都没有时数值小于 1000 的按时薪处理。

use super::model::{SalaryPeriod, SalaryRange};
use regex::{Captures, Regex};
use std::sync::OnceLock;

const NUM: &str = r"\d[\d,]*(?:\.\d+)?";
const DASH: &str = r"\s*(?:-|–|—|to)\s*";

/// 看命中位置之后多少个字符来判断周期
const PERIOD_LOOKAHEAD: usize = 30;

fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            format!(
                r"(?P<cur>[$£€₹])\s*(?P<min>{NUM})\s*(?P<mink>[kK])?{DASH}[$£€₹]?\s*(?P<max>{NUM})\s*(?P<maxk>[kK])?"
            ),
            format!(
                r"\b(?P<code>USD|EUR|GBP|INR|CAD|AUD)\s*(?P<min>{NUM})\s*(?P<mink>[kK])?(?:{DASH}(?P<max>{NUM})\s*(?P<maxk>[kK])?)?"
            ),
            format!(r"\b(?P<min>{NUM})\s*(?P<mink>[kK])?{DASH}(?P<max>{NUM})\s*(?P<maxk>[kK])\b"),
            format!(r"(?P<cur>[$£€₹])\s*(?P<min>{NUM})\s*(?P<mink>[kK])?"),
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// 从文本中解析薪资
pub fn parse_salary(text: &str) -> Option<SalaryRange> {
    patterns().iter().find_map(|re| {
        let caps = re.captures(text)?;
        let whole = caps.get(0)?;
        let tail: String = text[whole.end()..].chars().take(PERIOD_LOOKAHEAD).collect();
        build_range(&caps, whole.as_str(), &tail)
    })
}

fn build_range(caps: &Captures, raw: &str, tail: &str) -> Option<SalaryRange> {
    let min_k = caps.name("mink").is_some();
    let max_k = caps.name("maxk").is_some();
    let mut min = parse_amount(caps.name("min")?.as_str())?;
    let mut max = match caps.name("max") {
        Some(m) => parse_amount(m.as_str())?,
        None => min,
    };

    if caps.name("max").is_some() {
        if max_k {
            max *= 1000.0;
        }
        // `50-70k`：k 同时作用于下限
        if min_k || (max_k && min < 1000.0) {
            min *= 1000.0;
        }
    } else if min_k {
        min *= 1000.0;
        max = min;
    }

    if min <= 0.0 {
        return None;
    }
    if min > max {
        std::mem::swap(&mut min, &mut max);
    }

    let currency = caps
        .name("cur")
        .map(|c| currency_for_symbol(c.as_str()))
        .or_else(|| caps.name("code").map(|c| c.as_str()))
        .unwrap_or("USD")
        .to_string();

    Some(SalaryRange {
        min: min.round() as u64,
        max: max.round() as u64,
        currency,
        period: detect_period(&format!("{} {}", raw, tail), max),
        raw: raw.trim().to_string(),
    })
}

fn parse_amount(s: &str) -> Option<f64> {
    s.replace(',', "").parse().ok()
}

fn currency_for_symbol(symbol: &str) -> &'static str {
    match symbol {
        "£" => "GBP",
        "€" => "EUR",
        "₹" => "INR",
        _ => "USD",
    }
}

fn period_markers() -> Option<&'static (Regex, Regex)> {
    static MARKERS: OnceLock<Option<(Regex, Regex)>> = OnceLock::new();
    MARKERS
        .get_or_init(|| {
            // hr / yr 只在 "/hr"、"per hr"、"an hr" 这类写法里算数，单独的 "HR" 是人事部门
            let hourly = Regex::new(r"\bhour(?:ly)?\b|(?:/|\bper\s+|\ban?\s+)hrs?\b|\bp/h\b").ok()?;
            let yearly = Regex::new(
                r"\b(?:year|yearly|annum|annual|annually)\b|(?:/|\bper\s+|\ba\s+)yrs?\b|\bp\.a\b",
            )
            .ok()?;
            Some((hourly, yearly))
        })
        .as_ref()
}

fn detect_period(context: &str, max: f64) -> SalaryPeriod {
    let context = context.to_lowercase();
    if let Some((hourly, yearly)) = period_markers() {
        if hourly.is_match(&context) {
            return SalaryPeriod::Hourly;
        }
        if yearly.is_match(&context) {
            return SalaryPeriod::Yearly;
        }
    }
    if max < 1000.0 {
        SalaryPeriod::Hourly
    } else {
        SalaryPeriod::Yearly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollar_range_per_year() {
        let salary = parse_salary("Pay: $80,000 - $100,000 per year, plus equity").unwrap();
        assert_eq!(salary.min, 80_000);
        assert_eq!(salary.max, 100_000);
        assert_eq!(salary.currency, "USD");
        assert_eq!(salary.period, SalaryPeriod::Yearly);
        assert_eq!(salary.raw, "$80,000 - $100,000");
    }

    #[test]
    fn test_k_range_without_currency() {
        let salary = parse_salary("Compensation 50k-70k depending on experience").unwrap();
        assert_eq!((salary.min, salary.max), (50_000, 70_000));
        assert_eq!(salary.period, SalaryPeriod::Yearly);

        let salary = parse_salary("50-70k").unwrap();
        assert_eq!((salary.min, salary.max), (50_000, 70_000));
    }

    #[test]
    fn test_hourly_detection() {
        let salary = parse_salary("Rate: $45 - $60/hr").unwrap();
        assert_eq!((salary.min, salary.max), (45, 60));
        assert_eq!(salary.period, SalaryPeriod::Hourly);

        let salary = parse_salary("Starting at $25 an hour").unwrap();
        assert_eq!((salary.min, salary.max), (25, 25));
        assert_eq!(salary.period, SalaryPeriod::Hourly);
    }

    #[test]
    fn test_period_tokens_are_whole_words() {
        let salary = parse_salary("Base $90,000 - $110,000. HR will reach out").unwrap();
        assert_eq!(salary.period, SalaryPeriod::Yearly);

        let salary = parse_salary("$30 - $40 per hr").unwrap();
        assert_eq!(salary.period, SalaryPeriod::Hourly);

        let salary = parse_salary("$95k/yr, hybrid").unwrap();
        assert_eq!(salary.min, 95_000);
        assert_eq!(salary.period, SalaryPeriod::Yearly);
    }

    #[test]
    fn test_currency_codes_and_symbols() {
        let salary = parse_salary("EUR 55000 - 65000 annually").unwrap();
        assert_eq!(salary.currency, "EUR");
        assert_eq!((salary.min, salary.max), (55_000, 65_000));

        let salary = parse_salary("£40k to £50k").unwrap();
        assert_eq!(salary.currency, "GBP");
        assert_eq!((salary.min, salary.max), (40_000, 50_000));
    }

    #[test]
    fn test_no_salary() {
        assert_eq!(parse_salary("Competitive compensation and great benefits"), None);
        assert_eq!(parse_salary("We have 3-5 engineers"), None);
    }
}
