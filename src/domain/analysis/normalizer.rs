//! Analysis Context - Response Normalizer
//!
//! 把视觉模型返回的松散 JSON 文本转换为规范的 [`AnalysisResult`]
//!
//! 处理顺序:
//! 1. 提取候选 JSON（```json 代码块 → 任意代码块 → 第一个 `{` 到最后一个 `}`）
//! 2. 按优先级回退查找字段名
//! 3. 最终规范化（包围盒、置信度、状态）
//!
//! 本模块永不返回错误：无法解析时返回降级结果

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::result::{
    AnalysisResult, Detection, OverallStatus, Problem, DEFAULT_BOUNDING_BOX,
    DEFAULT_OBJECT_CONFIDENCE, DEFAULT_PROBLEM_CONFIDENCE,
};

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```json\s*([\s\S]*?)\s*```").expect("valid regex"));

static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_-]*\s*([\s\S]*?)\s*```").expect("valid regex"));

static BRACED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"));

const UNKNOWN_OBJECT: &str = "unknown object";
const UNKNOWN_ISSUE: &str = "unknown issue";
const NO_DETAILS: &str = "no details provided";

const OBJECT_TEXT_KEYS: &[&str] = &["name", "description", "type"];
const ISSUE_TEXT_KEYS: &[&str] = &["name", "issue", "description"];
const REASON_TEXT_KEYS: &[&str] = &["description", "reason", "details"];
const CONFIDENCE_KEYS: &[&str] = &["confidence", "confidence_score", "severity_score"];
const PROBLEM_LIST_KEYS: &[&str] = &["problems", "issues", "errors"];

/// 解析模型输出
pub fn parse_analysis_response(response_text: &str) -> AnalysisResult {
    let Some(root) = extract_json_object(response_text) else {
        tracing::warn!(
            response_len = response_text.len(),
            "Vision response contained no parsable JSON object, returning degraded result"
        );
        return AnalysisResult::degraded(response_text);
    };

    let objects: Vec<Detection> = root
        .get("objects")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(map_object).collect())
        .unwrap_or_default();

    let problems = PROBLEM_LIST_KEYS
        .iter()
        .find_map(|key| root.get(*key).and_then(Value::as_array))
        .map(|items| items.iter().filter_map(map_problem).collect::<Vec<_>>())
        .unwrap_or_default();

    let overall_status = resolve_overall_status(&root, problems.len());

    normalize(AnalysisResult {
        objects,
        problems,
        overall_status,
        raw_response: None,
    })
}

/// 最终规范化：保证包围盒与置信度在合法范围内、文本非空
pub fn normalize(result: AnalysisResult) -> AnalysisResult {
    let objects = result
        .objects
        .into_iter()
        .map(|o| Detection {
            description: non_empty_or(o.description, UNKNOWN_OBJECT),
            bounding_box: clamp_box(o.bounding_box),
            confidence: clamp_confidence(o.confidence, DEFAULT_OBJECT_CONFIDENCE),
        })
        .collect();

    let problems = result
        .problems
        .into_iter()
        .map(|p| Problem {
            issue: non_empty_or(p.issue, UNKNOWN_ISSUE),
            reason: non_empty_or(p.reason, NO_DETAILS),
            bounding_box: clamp_box(p.bounding_box),
            confidence: clamp_confidence(p.confidence, DEFAULT_PROBLEM_CONFIDENCE),
        })
        .collect();

    AnalysisResult {
        objects,
        problems,
        overall_status: result.overall_status,
        raw_response: result.raw_response,
    }
}

/// 按顺序尝试候选片段，返回第一个能解析为 JSON 对象的结果
fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let candidates = [
        JSON_FENCE.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str()),
        ANY_FENCE.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str()),
        BRACED.find(text).map(|m| m.as_str()),
    ];

    candidates.into_iter().flatten().find_map(|candidate| {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    })
}

fn map_object(item: &Value) -> Option<Detection> {
    match item {
        Value::Object(fields) => Some(Detection {
            description: first_text(fields, OBJECT_TEXT_KEYS)
                .unwrap_or_else(|| UNKNOWN_OBJECT.to_string()),
            bounding_box: resolve_bounding_box(fields),
            confidence: resolve_confidence(fields, DEFAULT_OBJECT_CONFIDENCE),
        }),
        Value::String(text) => Some(Detection {
            description: text.clone(),
            bounding_box: DEFAULT_BOUNDING_BOX,
            confidence: DEFAULT_OBJECT_CONFIDENCE,
        }),
        _ => None,
    }
}

fn map_problem(item: &Value) -> Option<Problem> {
    match item {
        Value::Object(fields) => Some(Problem {
            issue: first_text(fields, ISSUE_TEXT_KEYS).unwrap_or_else(|| UNKNOWN_ISSUE.to_string()),
            reason: first_text(fields, REASON_TEXT_KEYS).unwrap_or_else(|| NO_DETAILS.to_string()),
            bounding_box: resolve_bounding_box(fields),
            confidence: resolve_confidence(fields, DEFAULT_PROBLEM_CONFIDENCE),
        }),
        Value::String(text) => Some(Problem {
            issue: text.clone(),
            reason: NO_DETAILS.to_string(),
            bounding_box: DEFAULT_BOUNDING_BOX,
            confidence: DEFAULT_PROBLEM_CONFIDENCE,
        }),
        _ => None,
    }
}

fn resolve_overall_status(root: &Map<String, Value>, problem_count: usize) -> OverallStatus {
    if let Some(status) = root
        .get("overall_status")
        .and_then(Value::as_str)
        .and_then(OverallStatus::from_str)
    {
        return status;
    }

    if let Some(text) = root.get("status").and_then(Value::as_str) {
        return OverallStatus::from_free_text(text);
    }

    OverallStatus::from_problem_count(problem_count)
}

fn resolve_bounding_box(fields: &Map<String, Value>) -> [f64; 4] {
    if let Some(bbox) = fields.get("bounding_box").and_then(box_from_array) {
        return bbox;
    }

    if let Some(bbox) = box_from_position(fields) {
        return bbox;
    }

    ["bbox", "location"]
        .iter()
        .find_map(|key| fields.get(*key).and_then(box_from_array))
        .unwrap_or(DEFAULT_BOUNDING_BOX)
}

fn box_from_array(value: &Value) -> Option<[f64; 4]> {
    let items = value.as_array()?;
    if items.len() != 4 {
        return None;
    }

    let mut bbox = [0.0; 4];
    for (slot, item) in bbox.iter_mut().zip(items) {
        *slot = as_number(item)?;
    }
    Some(bbox)
}

/// `position{x,y}` + `dimensions{width,height}` → `[x, y, x+w, y+h]`
fn box_from_position(fields: &Map<String, Value>) -> Option<[f64; 4]> {
    let position = fields.get("position")?;
    let dimensions = fields.get("dimensions")?;

    let x = position.get("x").and_then(as_number)?;
    let y = position.get("y").and_then(as_number)?;
    let width = dimensions.get("width").and_then(as_number)?;
    let height = dimensions.get("height").and_then(as_number)?;

    Some([x, y, x + width, y + height])
}

fn resolve_confidence(fields: &Map<String, Value>, default: f64) -> f64 {
    CONFIDENCE_KEYS
        .iter()
        .find_map(|key| fields.get(*key).and_then(as_number))
        .map(|c| clamp_confidence(c, default))
        .unwrap_or(default)
}

fn first_text(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        fields
            .get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// 数字或可解析为数字的字符串
fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn clamp_confidence(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        default
    }
}

fn clamp_box(bbox: [f64; 4]) -> [f64; 4] {
    if bbox.iter().any(|v| !v.is_finite()) {
        return DEFAULT_BOUNDING_BOX;
    }
    bbox.map(|v| v.clamp(0.0, 1.0))
}

fn non_empty_or(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}
