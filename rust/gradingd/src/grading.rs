use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

pub const MSG_GRADE_REQUIRED: &str = "Grade is required";
pub const MSG_REMARK_REQUIRED: &str = "Remark is required";
pub const MSG_FROM_RANGE: &str = "From percentage must be between 0 and 100";
pub const MSG_TO_RANGE: &str = "To percentage must be between 0 and 100";
pub const MSG_INVERTED: &str = "From percentage cannot be greater than to percentage";

/// One grade band: a label and remark mapped to an inclusive percentage range.
///
/// Every field is optional because caller input is loosely shaped; absence is
/// reported by [`validate_scale`] rather than rejected at decode time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingScale {
    pub grade: Option<String>,
    pub remark: Option<String>,
    pub from: Option<f64>,
    pub to: Option<f64>,
}

impl GradingScale {
    pub fn new(grade: &str, remark: &str, from: f64, to: f64) -> Self {
        Self {
            grade: Some(grade.to_string()),
            remark: Some(remark.to_string()),
            from: Some(from),
            to: Some(to),
        }
    }

    /// Decode without coercion: text fields must be JSON strings and bounds
    /// must be JSON numbers, anything else is treated as missing.
    pub fn from_json(v: &Value) -> Self {
        let text = |key: &str| v.get(key).and_then(|x| x.as_str()).map(str::to_string);
        let number = |key: &str| v.get(key).and_then(|x| x.as_f64());
        Self {
            grade: text("grade"),
            remark: text("remark"),
            from: number("from"),
            to: number("to"),
        }
    }

    /// Both bounds, when both are present and finite.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (self.from, self.to) {
            (Some(f), Some(t)) if f.is_finite() && t.is_finite() => Some((f, t)),
            _ => None,
        }
    }
}

fn is_blank(s: &Option<String>) -> bool {
    s.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

fn is_percentage(v: Option<f64>) -> bool {
    v.map(|x| (0.0..=100.0).contains(&x)).unwrap_or(false)
}

pub fn validate_scale(scale: &GradingScale) -> Vec<String> {
    let mut errors = Vec::new();
    if is_blank(&scale.grade) {
        errors.push(MSG_GRADE_REQUIRED.to_string());
    }
    if is_blank(&scale.remark) {
        errors.push(MSG_REMARK_REQUIRED.to_string());
    }
    if !is_percentage(scale.from) {
        errors.push(MSG_FROM_RANGE.to_string());
    }
    if !is_percentage(scale.to) {
        errors.push(MSG_TO_RANGE.to_string());
    }
    if let (Some(from), Some(to)) = (scale.from, scale.to) {
        if from > to {
            errors.push(MSG_INVERTED.to_string());
        }
    }
    errors
}

/// Placeholder printed for a bound that is missing or not a number.
pub const MISSING_BOUND: &str = "?";

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn fmt_bound(v: Option<f64>) -> String {
    match finite(v) {
        // JSON `-0` reads as negative zero; print it as plain 0.
        Some(x) if x == 0.0 => "0".to_string(),
        Some(x) => x.to_string(),
        None => MISSING_BOUND.to_string(),
    }
}

/// Overlap check across a set of bands.
///
/// Bands are ordered by `from` with a stable sort and only neighbours are
/// compared, so a band nested inside a non-adjacent wider band is not
/// reported until the adjacent conflict is fixed. Bands without a numeric
/// `from` sort last in input order. A pair is skipped when the earlier
/// band has no numeric `to` or the later one no numeric `from`.
pub fn validate_scale_set(scales: &[GradingScale]) -> Vec<String> {
    let mut ordered: Vec<&GradingScale> = scales.iter().collect();
    ordered.sort_by(|a, b| match (finite(a.from), finite(b.from)) {
        // -0 and 0 tie, so their input order is kept.
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    ordered
        .windows(2)
        .filter(|pair| match (finite(pair[0].to), finite(pair[1].from)) {
            (Some(cur_to), Some(next_from)) => cur_to >= next_from,
            _ => false,
        })
        .map(|pair| {
            let (cur, next) = (pair[0], pair[1]);
            format!(
                "Overlapping ranges: {}-{}% and {}-{}%",
                fmt_bound(cur.from),
                fmt_bound(cur.to),
                fmt_bound(next.from),
                fmt_bound(next.to)
            )
        })
        .collect()
}

/// Per-band errors in input order, followed by overlap errors.
pub fn validate_department_grading_scales(scales: &[GradingScale]) -> Vec<String> {
    let mut errors: Vec<String> = scales.iter().flat_map(validate_scale).collect();
    errors.extend(validate_scale_set(scales));
    errors
}

/// First band in ascending `from` order whose inclusive range holds `percentage`.
pub fn grade_for_percentage(scales: &[GradingScale], percentage: f64) -> Option<&GradingScale> {
    if !percentage.is_finite() {
        return None;
    }
    let mut candidates: Vec<(&GradingScale, (f64, f64))> = scales
        .iter()
        .filter_map(|s| s.bounds().map(|b| (s, b)))
        .collect();
    candidates.sort_by(|a, b| a.1 .0.total_cmp(&b.1 .0));
    candidates
        .into_iter()
        .find(|(_, (from, to))| (*from..=*to).contains(&percentage))
        .map(|(s, _)| s)
}

pub fn default_scales() -> Vec<GradingScale> {
    vec![
        GradingScale::new("A1", "Excellent", 75.0, 100.0),
        GradingScale::new("B2", "Very Good", 70.0, 74.0),
        GradingScale::new("B3", "Good", 65.0, 69.0),
        GradingScale::new("C4", "Credit", 60.0, 64.0),
        GradingScale::new("C5", "Credit", 55.0, 59.0),
        GradingScale::new("C6", "Credit", 50.0, 54.0),
        GradingScale::new("D7", "Pass", 45.0, 49.0),
        GradingScale::new("E8", "Pass", 40.0, 44.0),
        GradingScale::new("F9", "Fail", 0.0, 39.0),
    ]
}
