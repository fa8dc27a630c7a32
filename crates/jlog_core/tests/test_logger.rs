//! End-to-end logger tests: gate, envelope, routing, and transformed payloads

use chrono::Utc;
use jlog_core::{
    ErrorValue, Logger, LoggerConfig, MapRef, ObjectRef, Severity, Sink, SinkSet,
    TransformConfig, Value,
};
use jlog_test_helpers::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use serial_test::serial;
use std::io;
use std::sync::Arc;

const TEST_STRING: &str = "this is test log message";
const TEST_CORRELATION_ID: &str = "this is correlation id";

fn captured_logger(config: LoggerConfig) -> (Logger, CapturedSinks) {
    let captured = CapturedSinks::new();
    let logger = Logger::new(config).with_sinks(captured.sink_set());
    (logger, captured)
}

fn call_every_level(logger: &Logger) {
    logger.debug(TEST_STRING, None);
    logger.info(TEST_STRING, None);
    logger.warn(TEST_STRING, None);
    logger.error(TEST_STRING, None);
    logger.crit(TEST_STRING, None);
}

/// Checks timestamp and level, then strips the timestamp for exact comparison
fn strip_metadata(mut line: serde_json::Value, level: &str) -> serde_json::Value {
    let timestamp = line["timestamp"].as_str().unwrap_or_default().to_string();
    assert!(iso_timestamp().eval(&timestamp), "bad timestamp: {}", timestamp);
    assert_eq!(line["level"], level);
    if let Some(fields) = line.as_object_mut() {
        fields.remove("timestamp");
    }
    line
}

/// Same nested map as a library user would build for a request context
fn nested_map() -> Value {
    let deep_map = Value::map([
        ("deep_nested_map_key1", Value::from(1)),
        (
            "deep_nested_map_key2",
            Value::set(["deep_nested_set_elem1", "deep_nested_set_elem2"]),
        ),
    ]);
    let nested = Value::map([
        ("c", Value::from(3)),
        ("nestedSet", Value::set([Value::from(1), deep_map])),
    ]);
    Value::map([
        ("a", Value::from(1)),
        ("b", Value::from(Utc::now())),
        ("nestedMap", nested),
    ])
}

#[test]
#[serial]
fn test_loglevel_activates_expected_methods() {
    let table = [
        ("DEBUG", [1, 1, 1, 1, 1]),
        ("INFO", [0, 1, 1, 1, 1]),
        ("WARN", [0, 0, 1, 1, 1]),
        ("ERROR", [0, 0, 0, 1, 1]),
        ("CRIT", [0, 0, 0, 0, 1]),
        // crit is always enabled; unknown names fall back to WARN
        ("ANY_OTHER", [0, 0, 1, 1, 1]),
    ];

    for (setting, expected) in table {
        temp_env::with_var("LOGLEVEL", Some(setting), || {
            let captured = CapturedSinks::new();
            let logger = Logger::from_env(LoggerConfig::default()).with_sinks(captured.sink_set());
            call_every_level(&logger);

            let actual: Vec<usize> = Severity::ALL.iter().map(|l| captured.count(*l)).collect();
            assert_eq!(actual, expected.to_vec(), "LOGLEVEL={}", setting);
        });
    }
}

#[test]
#[serial]
fn test_unset_loglevel_defaults_to_warn() {
    temp_env::with_var_unset("LOGLEVEL", || {
        let captured = CapturedSinks::new();
        let logger = Logger::from_env(LoggerConfig::default()).with_sinks(captured.sink_set());
        call_every_level(&logger);

        assert_eq!(captured.count(Severity::Debug), 0);
        assert_eq!(captured.count(Severity::Info), 0);
        assert_eq!(captured.count(Severity::Warn), 1);
        assert_eq!(captured.count(Severity::Error), 1);
        assert_eq!(captured.count(Severity::Crit), 1);
    });
}

#[test]
#[serial]
fn test_loglevel_is_read_once_at_construction() {
    let captured = CapturedSinks::new();
    let logger = temp_env::with_var("LOGLEVEL", Some("CRIT"), || {
        Logger::from_env(LoggerConfig::default()).with_sinks(captured.sink_set())
    });
    temp_env::with_var("LOGLEVEL", Some("DEBUG"), || logger.warn("x", None));
    assert_eq!(captured.total(), 0);
}

#[test]
fn test_info_below_warn_writes_nothing() {
    let (logger, captured) = captured_logger(LoggerConfig::default());
    logger.info("x", None);
    assert_eq!(captured.total(), 0);

    logger.warn("x", None);
    let line = captured.single(Severity::Warn);
    assert_eq!(line["level"], "WARN");
    assert_eq!(line["message"], "x");
}

#[test]
fn test_prints_correlation_by_default() {
    let (logger, captured) = captured_logger(LoggerConfig {
        correlation_id: Some(TEST_CORRELATION_ID.to_string()),
        ..LoggerConfig::default()
    });
    logger.warn(TEST_STRING, None);

    let line = strip_metadata(captured.single(Severity::Warn), "WARN");
    assert_eq!(
        line,
        json!({"level": "WARN", "message": TEST_STRING, "correlation": TEST_CORRELATION_ID})
    );
}

#[test]
fn test_missing_correlation_prints_undefined() {
    let (logger, captured) = captured_logger(LoggerConfig::default());
    logger.warn(TEST_STRING, None);

    let line = captured.single(Severity::Warn);
    assert_eq!(line["correlation"], "undefined");
}

#[test]
fn test_print_correlation_false_omits_field() {
    let (logger, captured) = captured_logger(LoggerConfig {
        correlation_id: Some("abc".to_string()),
        print_correlation: false,
        ..LoggerConfig::default()
    });
    logger.warn(TEST_STRING, None);

    let line = captured.single(Severity::Warn);
    assert_eq!(keys_in_order(&line), vec!["timestamp", "level", "message"]);
}

#[test]
fn test_field_order_on_the_wire() {
    let (logger, captured) = captured_logger(LoggerConfig::default());
    logger.error("failed", Some(&ErrorValue::new("boom")));

    let raw = &captured.sink(Severity::Error).lines()[0];
    assert!(json_object_line().eval(raw));
    let line: serde_json::Value = serde_json::from_str(raw).unwrap();
    assert_eq!(
        keys_in_order(&line),
        vec!["timestamp", "level", "message", "correlation", "[Error]"]
    );
}

#[test]
fn test_error_argument_is_merged() {
    let (logger, captured) = captured_logger(LoggerConfig::default());
    let err = ErrorValue::new("errorObject.message");
    logger.error(TEST_STRING, Some(&err));

    let line = strip_metadata(captured.single(Severity::Error), "ERROR");
    assert_eq!(line["message"], TEST_STRING);
    assert_eq!(line["[Error]"]["message"], "errorObject.message");
    let stack = line["[Error]"]["stack"].as_str().unwrap();
    assert!(stack.contains("Error:"));
}

#[test]
fn test_error_argument_kept_beside_error_message() {
    let (logger, captured) = captured_logger(LoggerConfig::default());
    let first = ErrorValue::new("first");
    let second = ErrorValue::new("second");
    logger.crit(Value::error(first), Some(&second));

    let line = captured.single(Severity::Crit);
    assert_eq!(line["message"]["[Error]"]["message"], "first");
    assert_eq!(line["[Error]"]["message"], "second");
}

#[test]
fn test_circular_reference_does_not_panic() {
    let a = ObjectRef::new();
    a.insert("a", 1);
    a.insert("b", a.clone());

    let (logger, captured) = captured_logger(LoggerConfig::default());
    logger.warn(a.clone(), None);

    let line = captured.single(Severity::Warn);
    let message = line["message"].as_str().unwrap();
    assert!(circular_fallback().eval(message));
    assert_eq!(message, "<ref *1> { a: 1, b: [Circular *1] }");
}

#[test]
fn test_no_markers_by_default() {
    let (logger, captured) = captured_logger(LoggerConfig::default());
    logger.warn(nested_map(), None);

    let mut line = captured.single(Severity::Warn);
    let date = line["message"]["b"].take();
    assert!(iso_timestamp().eval(date.as_str().unwrap()));
    assert_eq!(
        line["message"],
        json!({
            "a": 1,
            "b": null,
            "nestedMap": {
                "c": 3,
                "nestedSet": [1, {
                    "deep_nested_map_key1": 1,
                    "deep_nested_map_key2": ["deep_nested_set_elem1", "deep_nested_set_elem2"]
                }]
            }
        })
    );
}

#[test]
fn test_markers_when_enabled() {
    let (logger, captured) = captured_logger(LoggerConfig {
        transform: TransformConfig {
            print_collection_type_markers: true,
            ..TransformConfig::default()
        },
        ..LoggerConfig::default()
    });
    logger.warn(nested_map(), None);

    let mut line = captured.single(Severity::Warn);
    let date = line["message"]["[Map]"]["b"].take();
    assert!(iso_timestamp().eval(date.as_str().unwrap()));
    assert_eq!(
        line["message"],
        json!({
            "[Map]": {
                "a": 1,
                "b": null,
                "nestedMap": {
                    "[Map]": {
                        "c": 3,
                        "nestedSet": {
                            "[Set]": [1, {
                                "[Map]": {
                                    "deep_nested_map_key1": 1,
                                    "deep_nested_map_key2": {
                                        "[Set]": ["deep_nested_set_elem1", "deep_nested_set_elem2"]
                                    }
                                }
                            }]
                        }
                    }
                }
            }
        })
    );
}

#[test]
fn test_map_without_marker() {
    let (logger, captured) = captured_logger(LoggerConfig::default());
    logger.warn(Value::map([("a", 1)]), None);
    assert_eq!(captured.single(Severity::Warn)["message"], json!({"a": 1}));
}

#[test]
fn test_set_with_marker() {
    let (logger, captured) = captured_logger(LoggerConfig {
        transform: TransformConfig {
            print_collection_type_markers: true,
            ..TransformConfig::default()
        },
        ..LoggerConfig::default()
    });
    logger.warn(Value::set([1, 2]), None);
    assert_eq!(captured.single(Severity::Warn)["message"], json!({"[Set]": [1, 2]}));
}

#[test]
fn test_object_and_array_never_marked() {
    let (logger, captured) = captured_logger(LoggerConfig {
        transform: TransformConfig {
            print_collection_type_markers: true,
            ..TransformConfig::default()
        },
        ..LoggerConfig::default()
    });
    let value = Value::object([(
        "prop2",
        Value::array([Value::from(1), Value::object([("nested", 2)])]),
    )]);
    logger.warn(value, None);
    assert_eq!(
        captured.single(Severity::Warn)["message"],
        json!({"prop2": [1, {"nested": 2}]})
    );
}

#[test]
fn test_cyclic_map_inside_structured_message() {
    let looped = MapRef::new();
    looped.insert("self", looped.clone());
    let (logger, captured) = captured_logger(LoggerConfig::default());
    logger.warn(Value::object([("ok", Value::from(1)), ("loop", Value::Map(looped))]), None);

    let line = captured.single(Severity::Warn);
    assert_eq!(line["message"]["ok"], 1);
    assert!(circular_fallback().eval(line["message"]["loop"].as_str().unwrap()));
}

#[test]
fn test_routing_defaults_are_consistent() {
    // Standard routing: DEBUG and INFO share one sink, the rest share another
    let sinks = jlog_core::SinkSet::standard();
    assert!(std::sync::Arc::ptr_eq(
        sinks.get(Severity::Debug),
        sinks.get(Severity::Info)
    ));
    assert!(std::sync::Arc::ptr_eq(
        sinks.get(Severity::Warn),
        sinks.get(Severity::Crit)
    ));
    assert!(!std::sync::Arc::ptr_eq(
        sinks.get(Severity::Info),
        sinks.get(Severity::Warn)
    ));
}

/// Destination that refuses every write, like a closed pipe
struct ClosedPipe;

impl Sink for ClosedPipe {
    fn write_line(&self, _line: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }
}

#[test]
fn test_sink_failure_is_reported_not_raised() {
    let captured = CapturedSinks::new();
    let sinks = captured
        .sink_set()
        .route(Severity::Error, Arc::new(ClosedPipe));
    let logger = Logger::new(LoggerConfig::default()).with_sinks(sinks);

    let diagnostics = capture_diagnostics("warn", || {
        logger.error(TEST_STRING, None);
        logger.warn(TEST_STRING, None);
    });

    assert!(
        diagnostics.contains("Failed to write log line"),
        "diagnostics: {}",
        diagnostics
    );
    assert!(diagnostics.contains("pipe closed"), "diagnostics: {}", diagnostics);
    // Later calls still reach their own sinks
    assert_eq!(captured.single(Severity::Warn)["message"], TEST_STRING);
}

#[test]
fn test_gated_call_reports_nothing() {
    let logger = Logger::new(LoggerConfig::default())
        .with_sinks(SinkSet::uniform(Arc::new(ClosedPipe)));
    let diagnostics = capture_diagnostics("warn", || logger.debug(TEST_STRING, None));
    assert!(diagnostics.is_empty(), "diagnostics: {}", diagnostics);
}
