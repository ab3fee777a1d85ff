//! Analysis Context - Result Types
//!
//! 视觉模型分析结果的规范结构

use serde::{Deserialize, Serialize};

/// 缺失或非法时使用的默认包围盒
pub const DEFAULT_BOUNDING_BOX: [f64; 4] = [0.3, 0.3, 0.7, 0.7];

/// 物体检测的默认置信度
pub const DEFAULT_OBJECT_CONFIDENCE: f64 = 0.8;

/// 问题检测的默认置信度
pub const DEFAULT_PROBLEM_CONFIDENCE: f64 = 0.7;

/// 整体打印状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Good,
    Warning,
    Critical,
    Error,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Good => "good",
            OverallStatus::Warning => "warning",
            OverallStatus::Critical => "critical",
            OverallStatus::Error => "error",
        }
    }

    /// 仅接受四个规范值（忽略大小写与首尾空白）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" => Some(OverallStatus::Good),
            "warning" => Some(OverallStatus::Warning),
            "critical" => Some(OverallStatus::Critical),
            "error" => Some(OverallStatus::Error),
            _ => None,
        }
    }

    /// 将模型返回的自由文本 `status` 映射到规范状态
    ///
    /// 无法识别的文本一律视为 warning
    pub fn from_free_text(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "ok" | "good" => OverallStatus::Good,
            "warning" => OverallStatus::Warning,
            "error" | "critical" => OverallStatus::Critical,
            "failed" => OverallStatus::Error,
            _ => OverallStatus::Warning,
        }
    }

    /// 根据问题数量推导状态
    pub fn from_problem_count(count: usize) -> Self {
        if count > 0 {
            OverallStatus::Warning
        } else {
            OverallStatus::Good
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 检测到的物体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub description: String,
    /// 归一化坐标 `[x1, y1, x2, y2]`，取值 0..1
    pub bounding_box: [f64; 4],
    pub confidence: f64,
}

/// 检测到的打印问题
///
/// `issue` 即问题的描述文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub issue: String,
    pub reason: String,
    pub bounding_box: [f64; 4],
    pub confidence: f64,
}

/// 规范化后的分析结果
///
/// 不变量:
/// - 每个包围盒恰好 4 个分量且落在 0..1
/// - 置信度落在 0..1
/// - 构造后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub objects: Vec<Detection>,
    pub problems: Vec<Problem>,
    pub overall_status: OverallStatus,
    /// 解析失败时附带的原始模型输出
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl AnalysisResult {
    /// 解析失败时的降级结果
    pub fn degraded(raw_text: impl Into<String>) -> Self {
        Self {
            objects: Vec::new(),
            problems: Vec::new(),
            overall_status: OverallStatus::Error,
            raw_response: Some(raw_text.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.raw_response.is_some()
    }

    /// 置信度达到阈值的问题
    pub fn problems_at_or_above(&self, threshold: f64) -> Vec<Problem> {
        self.problems
            .iter()
            .filter(|p| p.confidence >= threshold)
            .cloned()
            .collect()
    }

    /// 一行摘要，用于日志和通知
    pub fn summary(&self) -> String {
        if self.problems.is_empty() {
            return format!(
                "Status {}: {} object(s), no problems detected",
                self.overall_status,
                self.objects.len()
            );
        }

        let issues: Vec<String> = self
            .problems
            .iter()
            .map(|p| format!("{} ({:.0}%)", p.issue, p.confidence * 100.0))
            .collect();
        format!(
            "Status {}: {} problem(s): {}",
            self.overall_status,
            self.problems.len(),
            issues.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem(issue: &str, confidence: f64) -> Problem {
        Problem {
            issue: issue.to_string(),
            reason: "test".to_string(),
            bounding_box: DEFAULT_BOUNDING_BOX,
            confidence,
        }
    }

    #[test]
    fn test_free_text_status_mapping() {
        assert_eq!(OverallStatus::from_free_text("OK"), OverallStatus::Good);
        assert_eq!(OverallStatus::from_free_text("good"), OverallStatus::Good);
        assert_eq!(OverallStatus::from_free_text("warning"), OverallStatus::Warning);
        assert_eq!(OverallStatus::from_free_text("error"), OverallStatus::Critical);
        assert_eq!(OverallStatus::from_free_text("critical"), OverallStatus::Critical);
        assert_eq!(OverallStatus::from_free_text("failed"), OverallStatus::Error);
        assert_eq!(OverallStatus::from_free_text("spaghetti"), OverallStatus::Warning);
    }

    #[test]
    fn test_strict_status_parsing() {
        assert_eq!(OverallStatus::from_str(" Critical "), Some(OverallStatus::Critical));
        assert_eq!(OverallStatus::from_str("ok"), None);
    }

    #[test]
    fn test_threshold_filter_is_inclusive() {
        let result = AnalysisResult {
            objects: vec![],
            problems: vec![problem("warp", 0.8), problem("stringing", 0.79)],
            overall_status: OverallStatus::Warning,
            raw_response: None,
        };

        let selected = result.problems_at_or_above(0.8);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].issue, "warp");
    }

    #[test]
    fn test_degraded_result() {
        let result = AnalysisResult::degraded("not json");
        assert!(result.is_degraded());
        assert_eq!(result.overall_status, OverallStatus::Error);
        assert!(result.objects.is_empty());
        assert!(result.problems.is_empty());
    }
}
