use crate::grading::GradingScale;
use crate::ipc::error::err;
use crate::ipc::types::Request;

pub fn department_param(req: &Request) -> Result<String, serde_json::Value> {
    let Some(raw) = req.params.get("department").and_then(|v| v.as_str()) else {
        return Err(err(&req.id, "bad_params", "missing department", None));
    };
    let department = raw.trim();
    if department.is_empty() {
        return Err(err(&req.id, "bad_params", "department must not be empty", None));
    }
    Ok(department.to_string())
}

/// `params.scales` as records; individual entries are never rejected here,
/// only a missing or non-array value is.
pub fn scales_param(req: &Request) -> Result<Vec<GradingScale>, serde_json::Value> {
    let Some(items) = req.params.get("scales").and_then(|v| v.as_array()) else {
        return Err(err(&req.id, "bad_params", "scales must be an array", None));
    };
    Ok(items.iter().map(GradingScale::from_json).collect())
}
