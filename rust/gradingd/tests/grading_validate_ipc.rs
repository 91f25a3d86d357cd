use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_gradingd");
    let mut child = Command::new(exe)
        .env_remove("GRADINGD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn gradingd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn errors_of(result: &serde_json::Value) -> Vec<String> {
    result
        .get("errors")
        .and_then(|v| v.as_array())
        .expect("errors array")
        .iter()
        .map(|v| v.as_str().expect("error string").to_string())
        .collect()
}

#[test]
fn validate_reports_department_scenarios() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let clean = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grading.validate",
        json!({
            "scales": [
                { "grade": "A1", "remark": "Excellent", "from": 80, "to": 100 },
                { "grade": "B2", "remark": "VeryGood", "from": 70, "to": 79 },
                { "grade": "C4", "remark": "Good", "from": 50, "to": 69 }
            ]
        }),
    );
    assert_eq!(clean.get("valid").and_then(|v| v.as_bool()), Some(true));
    assert!(errors_of(&clean).is_empty());

    let overlap = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grading.validate",
        json!({
            "scales": [
                { "grade": "A1", "remark": "Excellent", "from": 75, "to": 100 },
                { "grade": "B2", "remark": "VeryGood", "from": 70, "to": 90 }
            ]
        }),
    );
    assert_eq!(overlap.get("valid").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        errors_of(&overlap),
        vec!["Overlapping ranges: 70-90% and 75-100%".to_string()]
    );

    let nested = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grading.validate",
        json!({
            "scales": [
                { "grade": "A", "remark": "_", "from": 0, "to": 50 },
                { "grade": "B", "remark": "_", "from": 10, "to": 20 },
                { "grade": "C", "remark": "_", "from": 30, "to": 40 }
            ]
        }),
    );
    assert_eq!(
        errors_of(&nested),
        vec!["Overlapping ranges: 0-50% and 10-20%".to_string()]
    );

    let mixed = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "grading.validate",
        json!({
            "scales": [
                { "grade": "A1", "remark": "Excellent", "from": 75, "to": 100 },
                { "remark": "Very Good", "from": "70", "to": 90 },
                { "grade": "F9", "remark": " ", "from": 60, "to": 40 }
            ]
        }),
    );
    assert_eq!(
        errors_of(&mixed),
        vec![
            "Grade is required".to_string(),
            "From percentage must be between 0 and 100".to_string(),
            "Remark is required".to_string(),
            "From percentage cannot be greater than to percentage".to_string(),
        ]
    );
}

#[test]
fn validate_scale_checks_fields_independently() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let invalid = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grading.validateScale",
        json!({ "scale": { "grade": "", "remark": "Good", "from": -5, "to": 110 } }),
    );
    assert_eq!(
        errors_of(&invalid),
        vec![
            "Grade is required".to_string(),
            "From percentage must be between 0 and 100".to_string(),
            "To percentage must be between 0 and 100".to_string(),
        ]
    );

    let inverted = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grading.validateScale",
        json!({ "scale": { "grade": "F9", "remark": "Fail", "from": 60, "to": 40 } }),
    );
    assert_eq!(
        errors_of(&inverted),
        vec!["From percentage cannot be greater than to percentage".to_string()]
    );

    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "grading.validateScale",
        json!({ "scale": {} }),
    );
    assert_eq!(errors_of(&empty).len(), 4);

    let bad = request(
        &mut stdin,
        &mut reader,
        "4",
        "grading.validateScale",
        json!({ "scale": [1, 2] }),
    );
    assert_eq!(bad.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        bad.pointer("/error/code").and_then(|v| v.as_str()),
        Some("bad_params")
    );
}

#[test]
fn defaults_pass_validation() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let defaults = request_ok(&mut stdin, &mut reader, "1", "grading.defaults", json!({}));
    let scales = defaults.get("scales").cloned().expect("scales");
    assert_eq!(scales.as_array().map(|a| a.len()), Some(9));
    assert_eq!(
        scales.pointer("/0/grade").and_then(|v| v.as_str()),
        Some("A1")
    );

    let checked = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grading.validate",
        json!({ "scales": scales }),
    );
    assert_eq!(checked.get("valid").and_then(|v| v.as_bool()), Some(true));
}

#[test]
fn protocol_errors_are_reported_not_fatal() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "{{not json").expect("write garbage");
    stdin.flush().expect("flush garbage");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse bad_json");
    assert_eq!(
        value.pointer("/error/code").and_then(|v| v.as_str()),
        Some("bad_json")
    );

    let unknown = request(&mut stdin, &mut reader, "1", "grading.nope", json!({}));
    assert_eq!(
        unknown.pointer("/error/code").and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    let missing = request(&mut stdin, &mut reader, "2", "grading.validate", json!({}));
    assert_eq!(
        missing.pointer("/error/code").and_then(|v| v.as_str()),
        Some("bad_params")
    );

    let health = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert!(health.get("version").and_then(|v| v.as_str()).is_some());
}

#[test]
fn open_ended_band_still_sorts_and_negative_zero_prints_plain() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let open_ended = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grading.validate",
        json!({
            "scales": [
                { "grade": "A", "remark": "_", "from": 0, "to": 20 },
                { "grade": "B", "remark": "_", "from": 10 },
                { "grade": "C", "remark": "_", "from": 30, "to": 40 }
            ]
        }),
    );
    assert_eq!(
        errors_of(&open_ended),
        vec![
            "To percentage must be between 0 and 100".to_string(),
            "Overlapping ranges: 0-20% and 10-?%".to_string(),
        ]
    );

    let negative_zero = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grading.validate",
        json!({
            "scales": [
                { "grade": "A", "remark": "_", "from": -0.0, "to": 50 },
                { "grade": "B", "remark": "_", "from": 40, "to": 60 }
            ]
        }),
    );
    assert_eq!(
        errors_of(&negative_zero),
        vec!["Overlapping ranges: 0-50% and 40-60%".to_string()]
    );
}
