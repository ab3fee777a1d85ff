//! Data Transfer Objects

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::ports::InspectionReport;
use crate::domain::analysis::{Detection, Problem};
use crate::domain::machine::{format_status_summary, MachineStatusSnapshot};
use crate::domain::RunningStatistics;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Monitor DTOs
// ============================================================================

/// 按需分析结果
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub overall_status: String,
    pub summary: String,
    pub objects: Vec<Detection>,
    pub problems: Vec<Problem>,
    /// 达到告警阈值的问题数
    pub alerting_problems: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub image_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_status: Option<PrinterStatusResponse>,
}

impl AnalysisResponse {
    pub fn from_report(report: InspectionReport, threshold: f64) -> Self {
        let alerting_problems = report.analysis.problems_at_or_above(threshold).len();
        let summary = report.analysis.summary();
        let analysis = report.analysis;

        Self {
            overall_status: analysis.overall_status.as_str().to_string(),
            summary,
            objects: analysis.objects,
            problems: analysis.problems,
            alerting_problems,
            raw_response: analysis.raw_response,
            captured_at: report.frame.captured_at,
            image_bytes: report.frame.len(),
            machine_status: report.machine_status.map(PrinterStatusResponse::from),
        }
    }
}

/// 打印机状态
#[derive(Debug, Serialize)]
pub struct PrinterStatusResponse {
    pub summary: String,
    pub printing: bool,
    pub snapshot: MachineStatusSnapshot,
}

impl From<MachineStatusSnapshot> for PrinterStatusResponse {
    fn from(snapshot: MachineStatusSnapshot) -> Self {
        Self {
            summary: format_status_summary(&snapshot),
            printing: snapshot.is_printing(),
            snapshot,
        }
    }
}

/// 运行统计
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub uptime_secs: u64,
    pub summary: String,
    pub queue_pending: usize,
    pub stats: RunningStatistics,
}

impl StatsResponse {
    pub fn new(stats: RunningStatistics, queue_pending: usize) -> Self {
        let now = Utc::now();
        Self {
            uptime_secs: stats.uptime_secs(now),
            summary: stats.summary(now),
            queue_pending,
            stats,
        }
    }
}
