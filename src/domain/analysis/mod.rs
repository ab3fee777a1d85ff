//! Analysis Context - 视觉分析限界上下文
//!
//! 职责:
//! - 分析结果的规范结构
//! - 模型输出的容错解析

mod normalizer;
mod result;

pub use normalizer::{normalize, parse_analysis_response};
pub use result::{
    AnalysisResult, Detection, OverallStatus, Problem, DEFAULT_BOUNDING_BOX,
    DEFAULT_OBJECT_CONFIDENCE, DEFAULT_PROBLEM_CONFIDENCE,
};
