use job_autofill::autofill::toast::CONTAINER_ID;
use job_autofill::autofill::{is_visible, Severity};
use job_autofill::browser::connect_to_browser_and_page;
use job_autofill::config::Config;
use job_autofill::dom::{Document, EventKind};
use job_autofill::infrastructure::{JsExecutor, PageBridge};
use job_autofill::job::{parse_salary, JobExtractor, SalaryPeriod};
use job_autofill::logger;
use job_autofill::orchestrator::{Command, CommandOutcome, Dispatcher};
use job_autofill::profile::Profile;
use job_autofill::session::PageSession;
use job_autofill::workflow::{FillFlow, FillMode};
use tokio_test::assert_ok;

fn profile(json: &str) -> Profile {
    Profile::from_json_str(json).expect("档案 JSON 无效")
}

fn field(doc: &Document, selector_id: &str) -> usize {
    doc.element_by_id(selector_id).expect("元素不存在")
}

#[test]
fn test_end_to_end_fill_pass() {
    let mut doc = Document::from_html(
        "https://jobs.example.com/apply",
        r#"<body><form>
            <input id="email" name="user_email">
            <textarea id="skillsBox"></textarea>
        </form></body>"#,
    );
    let mut session = PageSession::default();
    let report = FillFlow::default().run(
        &mut doc,
        &mut session,
        &profile(r#"{"email": "a@b.com", "skills": ["Go", "SQL"]}"#),
        FillMode::Full,
    );

    assert_eq!(doc.value(field(&doc, "email")), "a@b.com");
    assert_eq!(doc.value(field(&doc, "skillsBox")), "Go, SQL");
    assert_eq!(report.filled, 2);
    assert_eq!(session.toasts().messages(), vec!["2 fields filled"]);
    assert_eq!(session.toasts().entries()[0].severity, Severity::Success);

    let email = field(&doc, "email");
    assert_eq!(
        doc.dispatched_events(email),
        vec![EventKind::Input, EventKind::Change, EventKind::Blur]
    );
    assert!(session.highlights().is_highlighted(email));

    // 计时器跑完后高亮恢复、提示消失，填入的值保留
    session.settle(&mut doc);
    assert!(session.is_idle());
    assert_eq!(doc.style_value(email, "outline"), None);
    assert!(doc.element_by_id(CONTAINER_ID).is_none());
    assert_eq!(doc.value(email), "a@b.com");
}

#[test]
fn test_fill_never_overwrites_existing_value() {
    let mut doc = Document::from_html(
        "https://example.com",
        r#"<body><input id="email" name="email" value="keep@me.com"></body>"#,
    );
    let mut session = PageSession::default();
    let report = FillFlow::default().run(&mut doc, &mut session, &profile(r#"{"email": "a@b.com"}"#), FillMode::Full);

    assert_eq!(report.filled, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(doc.value(field(&doc, "email")), "keep@me.com");
    assert_eq!(session.toasts().messages(), vec!["No matching fields found"]);
}

#[test]
fn test_hidden_field_is_never_filled() {
    let mut doc = Document::from_html(
        "https://example.com",
        r#"<body>
            <div style="display:none"><input id="hidden" name="email"></div>
            <input id="plain" name="email" style="display: none">
            <input id="shown" name="email">
        </body>"#,
    );
    assert!(!is_visible(&doc, field(&doc, "hidden")));
    assert!(!is_visible(&doc, field(&doc, "plain")));

    let mut session = PageSession::default();
    let report = FillFlow::default().run(&mut doc, &mut session, &profile(r#"{"email": "a@b.com"}"#), FillMode::Instant);
    assert_eq!(report.filled, 1);
    assert_eq!(doc.value(field(&doc, "hidden")), "");
    assert_eq!(doc.value(field(&doc, "plain")), "");
    assert_eq!(doc.value(field(&doc, "shown")), "a@b.com");
}

#[test]
fn test_select_exact_match_before_substring() {
    let mut doc = Document::from_html(
        "https://example.com",
        r#"<body><label for="country">Country</label><select id="country">
            <option value="">Choose...</option>
            <option value="usa-minor">US Minor Outlying Islands</option>
            <option value="us">United States</option>
        </select></body>"#,
    );
    let mut session = PageSession::default();
    let report = FillFlow::default().run(&mut doc, &mut session, &profile(r#"{"country": "US"}"#), FillMode::Full);

    assert_eq!(report.filled, 1);
    assert_eq!(doc.value(field(&doc, "country")), "us");
}

#[test]
fn test_cleanup_is_idempotent() {
    let mut doc = Document::from_html("https://example.com", r#"<body><input name="email"></body>"#);
    let mut session = PageSession::default();
    FillFlow::default().run(&mut doc, &mut session, &profile(r#"{"email": "a@b.com"}"#), FillMode::Full);

    let first = assert_ok!(session.cleanup(&mut doc));
    assert!(!first.is_noop());
    let listeners = doc.listener_count();
    let nodes = doc.elements_by_tag(&["div", "input"]);

    let second = assert_ok!(session.cleanup(&mut doc));
    assert!(second.is_noop());
    assert_eq!(doc.listener_count(), listeners);
    assert_eq!(doc.elements_by_tag(&["div", "input"]), nodes);
    assert!(session.is_idle());
}

#[test]
fn test_salary_examples() {
    let yearly = parse_salary("$80,000 - $100,000 per year").expect("应解析出薪资");
    assert_eq!((yearly.min, yearly.max), (80_000, 100_000));
    assert_eq!(yearly.period, SalaryPeriod::Yearly);

    let k = parse_salary("50k-70k").expect("应解析出薪资");
    assert_eq!((k.min, k.max), (50_000, 70_000));
}

#[test]
fn test_generic_extractor_fallback() {
    let html = r#"<html><body>
        <h1>Backend Engineer</h1>
        <div class="company-header">Acme Co</div>
    </body></html>"#;
    let record = JobExtractor::default()
        .extract("https://careers.acme.example/jobs/backend", html)
        .expect("应抽取到岗位");
    assert_eq!(record.job_title, "Backend Engineer");
    assert_eq!(record.company, "Acme Co");

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["jobTitle"], "Backend Engineer");
    assert_eq!(json["metadata"]["usedFallback"], true);
}

#[tokio::test]
async fn test_dispatcher_json_session() {
    let mut doc = Document::from_html(
        "https://jobs.example.com/apply",
        r#"<body><input name="user_email"><textarea id="skillsBox"></textarea></body>"#,
    );
    let mut dispatcher = Dispatcher::new(&mut doc, PageSession::default(), FillFlow::default(), JobExtractor::default());

    let lines = [
        r#"{"command": "instant", "blob": "{\"email\": \"a@b.com\", \"skills\": [\"Go\", \"SQL\"]}"}"#,
        r#"{"command": "tick", "elapsedMs": 500}"#,
        r#"{"command": "cleanup"}"#,
        r#"{"command": "cleanup"}"#,
        r#"{"command": "pageUnload"}"#,
        r#"{"command": "fill", "profile": {"email": "x@y.com"}}"#,
    ];
    let mut outcomes = Vec::new();
    for line in lines {
        let command = Command::from_json_line(line).expect("命令无效");
        outcomes.push(dispatcher.dispatch(&mut doc, command).await);
    }

    assert!(matches!(&outcomes[0], CommandOutcome::Filled(report) if report.filled == 2));
    assert!(matches!(outcomes[1], CommandOutcome::Ticked { fired: 1 }));
    assert!(matches!(outcomes[2], CommandOutcome::Cleaned(report) if !report.is_noop()));
    assert!(matches!(outcomes[3], CommandOutcome::Cleaned(report) if report.is_noop()));
    assert!(matches!(outcomes[4], CommandOutcome::Unloaded(_)));
    assert_eq!(outcomes[5], CommandOutcome::Ignored);

    assert_eq!(doc.value(doc.elements_by_tag(&["input"])[0]), "a@b.com");
    assert_eq!(doc.listener_count(), 0);

    let wire = serde_json::to_value(&outcomes[0]).unwrap();
    assert_eq!(wire["outcome"], "filled");
    assert_eq!(wire["result"]["filledCount"], 2);
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_live_fill_round_trip() {
    // 初始化日志
    logger::init();

    // 加载配置
    let config = Config::from_env();

    // 连接浏览器
    let (_browser, page) = connect_to_browser_and_page(
        config.browser_debug_port,
        config.target_url.as_deref(),
        config.target_title.as_deref(),
    )
    .await
    .expect("连接浏览器失败");
    let bridge = PageBridge::new(JsExecutor::new(page));

    let mut doc = bridge.snapshot().await.expect("拍摄快照失败");
    let mut dispatcher = Dispatcher::from_config(&mut doc, &config).expect("配置无效");
    let profile = Profile::from_json_str(r#"{"email": "a@b.com"}"#).unwrap();
    let outcome = dispatcher.dispatch(&mut doc, Command::FillProfile { profile }).await;
    assert!(matches!(outcome, CommandOutcome::Filled(_)));

    let applied = bridge.commit(&mut doc).await.expect("回放变更失败");
    assert!(applied > 0, "至少应回放提示和卸载监听器");

    dispatcher.dispatch(&mut doc, Command::PageUnload).await;
    bridge.commit(&mut doc).await.expect("回放清理失败");
    let events = bridge.drain_events().await.expect("读取事件失败");
    assert!(events.is_some());
}
