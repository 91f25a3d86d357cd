use serde_json::{json, Value};

pub fn ok(id: &str, result: Value) -> Value {
    json!({ "id": id, "ok": true, "result": result })
}

pub fn err(id: &str, code: &str, message: impl Into<String>, details: Option<Value>) -> Value {
    let mut error = json!({ "code": code, "message": message.into() });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({ "id": id, "ok": false, "error": error })
}

/// Rejected grading-scale set: every message travels in `details.errors`.
pub fn validation_failed(id: &str, errors: &[String]) -> Value {
    err(
        id,
        "validation_failed",
        format!("{} grading scale problem(s)", errors.len()),
        Some(json!({ "errors": errors })),
    )
}
