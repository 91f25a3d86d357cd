use crate::db;
use crate::grading::{self, GradingScale};
use crate::ipc::error::{err, ok, validation_failed};
use crate::ipc::helpers::{department_param, scales_param};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn validation_result(errors: Vec<String>) -> serde_json::Value {
    json!({
        "valid": errors.is_empty(),
        "errors": errors,
    })
}

fn handle_validate_scale(req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("scale").filter(|v| v.is_object()) else {
        return err(&req.id, "bad_params", "scale must be an object", None);
    };
    let scale = GradingScale::from_json(raw);
    ok(&req.id, validation_result(grading::validate_scale(&scale)))
}

fn handle_validate(req: &Request) -> serde_json::Value {
    let scales = match scales_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        validation_result(grading::validate_department_grading_scales(&scales)),
    )
}

fn handle_defaults(req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "scales": grading::default_scales() }))
}

fn handle_departments_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match state.require_db(req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    match db::departments_list(conn) {
        Ok(departments) => ok(&req.id, json!({ "departments": departments })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_scales_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match state.require_db(req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let department = match department_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match db::scales_list(conn, &department) {
        Ok(scales) => ok(
            &req.id,
            json!({ "department": department, "scales": scales }),
        ),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

fn handle_scales_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match state.require_db(req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let department = match department_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let scales = match scales_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let errors = grading::validate_department_grading_scales(&scales);
    if !errors.is_empty() {
        tracing::info!(
            department = %department,
            error_count = errors.len(),
            "grading scale save blocked"
        );
        return validation_failed(&req.id, &errors);
    }

    match db::scales_replace(conn, &department, &scales) {
        Ok(saved) => {
            tracing::info!(department = %department, saved, "grading scales saved");
            ok(&req.id, json!({ "department": department, "saved": saved }))
        }
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_scales_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match state.require_db(req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let department = match department_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match db::scales_delete(conn, &department) {
        Ok(deleted) => ok(
            &req.id,
            json!({ "department": department, "deleted": deleted }),
        ),
        Err(e) => err(&req.id, "db_update_failed", e.to_string(), None),
    }
}

fn handle_lookup(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match state.require_db(req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let department = match department_param(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(percentage) = req.params.get("percentage").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "percentage must be a number", None);
    };

    let stored = match db::scales_list(conn, &department) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let scales: Vec<GradingScale> = stored.iter().map(db::StoredScale::to_scale).collect();
    let matched = grading::grade_for_percentage(&scales, percentage).map(|s| {
        json!({
            "grade": s.grade,
            "remark": s.remark,
            "from": s.from,
            "to": s.to,
        })
    });
    ok(&req.id, json!({ "match": matched }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grading.validateScale" => Some(handle_validate_scale(req)),
        "grading.validate" => Some(handle_validate(req)),
        "grading.defaults" => Some(handle_defaults(req)),
        "grading.departments.list" => Some(handle_departments_list(state, req)),
        "grading.scales.list" => Some(handle_scales_list(state, req)),
        "grading.scales.save" => Some(handle_scales_save(state, req)),
        "grading.scales.delete" => Some(handle_scales_delete(state, req)),
        "grading.lookup" => Some(handle_lookup(state, req)),
        _ => None,
    }
}
