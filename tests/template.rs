use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use cronguard::errors::CronguardError;
use cronguard::supervise::template::FIELDS;
use cronguard::supervise::{ErrorTemplate, TaskContext};

fn values(pairs: &[(&'static str, &str)]) -> BTreeMap<&'static str, String> {
    pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
}

fn sample_context() -> TaskContext {
    TaskContext {
        name: "backup".to_string(),
        cmd: "tar".to_string(),
        args: vec!["-czf".to_string(), "/tmp/x.tgz".to_string()],
        return_code: Some(2),
        start_time: Some(Utc.with_ymd_and_hms(2024, 3, 1, 4, 0, 0).unwrap()),
        stop_time: Some(Utc.with_ymd_and_hms(2024, 3, 1, 4, 0, 5).unwrap()),
        run_time: Some(Duration::from_millis(5250)),
        timeout: None,
        stdout: "copied\n".to_string(),
        stderr: "tar: disk full\n".to_string(),
        trace: None,
    }
}

#[test]
fn test_both_placeholder_forms_and_escape() {
    let t = ErrorTemplate::parse("$name ran ${cmd}x for $$5").unwrap();
    let out = t.render(&values(&[("name", "job"), ("cmd", "ls")]));
    assert_eq!(out, "job ran lsx for $5");
}

#[test]
fn test_missing_value_renders_empty() {
    let t = ErrorTemplate::parse("[$stdout]").unwrap();
    assert_eq!(t.render(&BTreeMap::new()), "[]");
}

#[test]
fn test_unknown_placeholder_is_rejected_at_parse_time() {
    match ErrorTemplate::parse("hello $nobody") {
        Err(CronguardError::TemplateError(msg)) => assert!(msg.contains("nobody"), "{msg}"),
        other => panic!("expected TemplateError, got {other:?}"),
    }
}

#[test]
fn test_bare_dollar_reports_position() {
    match ErrorTemplate::parse("line one\ncost: $ 5") {
        Err(CronguardError::TemplateError(msg)) => {
            assert!(msg.contains("line 2"), "{msg}");
            assert!(msg.contains("col 7"), "{msg}");
        }
        other => panic!("expected TemplateError, got {other:?}"),
    }
}

#[test]
fn test_default_template_uses_only_known_fields() {
    let t = ErrorTemplate::default();
    let all: BTreeMap<&'static str, String> =
        FIELDS.iter().map(|f| (*f, format!("<{f}>"))).collect();
    let out = t.render(&all);
    for field in FIELDS {
        assert!(out.contains(&format!("<{field}>")), "default template lacks ${field}");
    }
}

#[test]
fn test_template_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.txt");
    std::fs::write(&path, "job ${name} failed\n").unwrap();

    let t = ErrorTemplate::from_path(&path).unwrap();
    assert_eq!(t.render(&values(&[("name", "nightly")])), "job nightly failed\n");

    assert!(matches!(
        ErrorTemplate::from_path(dir.path().join("missing.txt")),
        Err(CronguardError::IoError(_))
    ));
}

#[test]
fn test_context_values_are_human_readable() {
    let ctx = sample_context();
    let v = ctx.template_values();

    assert_eq!(v["args"], "-czf /tmp/x.tgz");
    assert_eq!(v["return_code"], "2");
    assert_eq!(v["start_time"], "2024-03-01 04:00:00 UTC");
    assert_eq!(v["run_time"], "5.250s");
    assert_eq!(v["timeout"], "n/a");
    assert_eq!(v["stdout"], "copied");
    assert_eq!(v["trace"], "n/a");
    assert!(!v.contains_key("timeline"));
}

#[test]
fn test_context_serializes_for_the_wire() {
    let json = serde_json::to_value(sample_context()).unwrap();

    assert_eq!(json["start_time"], "2024-03-01T04:00:00");
    assert_eq!(json["stop_time"], "2024-03-01T04:00:05");
    assert_eq!(json["run_time"], 5.25);
    assert!(json["timeout"].is_null());
    assert!(json["trace"].is_null());
    assert_eq!(json["return_code"], 2);
    assert_eq!(json["args"][1], "/tmp/x.tgz");
}

#[test]
fn test_rendered_default_report() {
    let ctx = sample_context();
    let mut v = ctx.template_values();
    v.insert("timeline", "  * step".to_string());

    let out = ErrorTemplate::default().render(&v);
    assert!(out.contains("job \"backup\""));
    assert!(out.contains("tar -czf /tmp/x.tgz"));
    assert!(out.contains("tar: disk full"));
    assert!(out.contains("  * step"));
}
