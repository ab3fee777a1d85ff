//! Monitor Request Handler - 队列请求的实际执行者
//!
//! 按请求类型执行采集/分析:
//! - Frame: 仅采集
//! - Status: 采集 + 分析
//! - Analyze: 采集 + 分析 + 设备状态
//! - Inspect: 分析已采集的帧

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    AnalysisError, CaptureError, CaptureSourcePort, FrameCapture, InspectionReport,
    MachineStatusPort, RequestHandler, RequestKind, RequestOutcome, VisionClientPort,
};
use crate::application::prompts::{SYSTEM_PROMPT, USER_PROMPT};
use crate::application::retry::RetryPolicy;
use crate::domain::analysis::{parse_analysis_response, AnalysisResult};

/// 带重试的帧采集
///
/// 重试耗尽时返回 `CaptureError::RetriesExhausted`
pub async fn capture_with_retry(
    capture: &dyn CaptureSourcePort,
    policy: &RetryPolicy,
) -> Result<FrameCapture, CaptureError> {
    policy
        .run("capture_frame", |_| capture.capture_frame())
        .await
        .map_err(|exhausted| CaptureError::RetriesExhausted {
            attempts: exhausted.attempts,
            last_error: exhausted.last_error.to_string(),
        })
}

/// 带重试的视觉分析，返回规范化结果
pub async fn analyze_with_retry(
    vision: &dyn VisionClientPort,
    policy: &RetryPolicy,
    frame: &FrameCapture,
) -> Result<AnalysisResult, AnalysisError> {
    let started = std::time::Instant::now();
    let raw = policy
        .run("vision_analyze", |_| {
            vision.analyze(&frame.data, SYSTEM_PROMPT, USER_PROMPT)
        })
        .await
        .map_err(|exhausted| AnalysisError::RetriesExhausted {
            attempts: exhausted.attempts,
            last_error: exhausted.last_error.to_string(),
        })?;

    let result = parse_analysis_response(&raw);
    tracing::info!(
        model = vision.model(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        overall_status = %result.overall_status,
        objects = result.objects.len(),
        problems = result.problems.len(),
        degraded = result.is_degraded(),
        "Vision analysis completed"
    );
    Ok(result)
}

/// 队列请求处理器
pub struct MonitorRequestHandler {
    capture: Arc<dyn CaptureSourcePort>,
    vision: Arc<dyn VisionClientPort>,
    status_source: Arc<dyn MachineStatusPort>,
    capture_retry: RetryPolicy,
    vision_retry: RetryPolicy,
    vision_enabled: bool,
}

impl MonitorRequestHandler {
    pub fn new(
        capture: Arc<dyn CaptureSourcePort>,
        vision: Arc<dyn VisionClientPort>,
        status_source: Arc<dyn MachineStatusPort>,
        capture_retry: RetryPolicy,
        vision_retry: RetryPolicy,
        vision_enabled: bool,
    ) -> Self {
        Self {
            capture,
            vision,
            status_source,
            capture_retry,
            vision_retry,
            vision_enabled,
        }
    }

    async fn capture(&self) -> Result<FrameCapture, ApplicationError> {
        Ok(capture_with_retry(self.capture.as_ref(), &self.capture_retry).await?)
    }

    async fn inspect(&self, frame: FrameCapture) -> Result<InspectionReport, ApplicationError> {
        if !self.vision_enabled {
            return Err(ApplicationError::invalid_state("Vision analysis is disabled"));
        }

        let analysis = analyze_with_retry(self.vision.as_ref(), &self.vision_retry, &frame).await?;
        Ok(InspectionReport {
            frame,
            analysis,
            machine_status: None,
        })
    }
}

#[async_trait]
impl RequestHandler for MonitorRequestHandler {
    async fn handle(&self, kind: RequestKind) -> Result<RequestOutcome, ApplicationError> {
        match kind {
            RequestKind::Frame => Ok(RequestOutcome::Frame(self.capture().await?)),
            RequestKind::Status => {
                let frame = self.capture().await?;
                Ok(RequestOutcome::Report(self.inspect(frame).await?))
            }
            RequestKind::Analyze => {
                let frame = self.capture().await?;
                let mut report = self.inspect(frame).await?;
                report.machine_status = match self.status_source.get_status().await {
                    Ok(status) => Some(status),
                    Err(e) => {
                        tracing::warn!(error = %e, "Device status unavailable for analyze request");
                        None
                    }
                };
                Ok(RequestOutcome::Report(report))
            }
            RequestKind::Inspect(frame) => Ok(RequestOutcome::Report(self.inspect(frame).await?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::StatusError;
    use crate::domain::analysis::OverallStatus;
    use crate::domain::machine::MachineStatusSnapshot;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct FlakyCapture {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl CaptureSourcePort for FlakyCapture {
        async fn capture_frame(&self) -> Result<FrameCapture, CaptureError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures_before_success {
                Err(CaptureError::Timeout)
            } else {
                Ok(FrameCapture::new(vec![0xFF, 0xD8, 0xFF, 0xD9]))
            }
        }
    }

    struct CannedVision(&'static str);

    #[async_trait]
    impl VisionClientPort for CannedVision {
        async fn analyze(&self, _: &[u8], _: &str, _: &str) -> Result<String, AnalysisError> {
            Ok(self.0.to_string())
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    struct DownStatus;

    #[async_trait]
    impl MachineStatusPort for DownStatus {
        async fn get_status(&self) -> Result<MachineStatusSnapshot, StatusError> {
            Err(StatusError::Timeout)
        }
    }

    fn handler(failures: u32, vision_enabled: bool) -> MonitorRequestHandler {
        MonitorRequestHandler::new(
            Arc::new(FlakyCapture {
                failures_before_success: failures,
                calls: AtomicU32::new(0),
            }),
            Arc::new(CannedVision(r#"{"overall_status": "good"}"#)),
            Arc::new(DownStatus),
            RetryPolicy::new(3, Duration::from_millis(10)),
            RetryPolicy::new(1, Duration::ZERO),
            vision_enabled,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_frame_request_retries_capture() {
        let outcome = handler(2, true).handle(RequestKind::Frame).await.unwrap();
        assert!(matches!(outcome, RequestOutcome::Frame(f) if f.len() == 4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_exhaustion_is_fatal() {
        let err = handler(3, true).handle(RequestKind::Frame).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Capture(CaptureError::RetriesExhausted { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_analyze_tolerates_missing_device_status() {
        let outcome = handler(0, true).handle(RequestKind::Analyze).await.unwrap();
        match outcome {
            RequestOutcome::Report(report) => {
                assert_eq!(report.analysis.overall_status, OverallStatus::Good);
                assert!(report.machine_status.is_none());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_analysis_rejected_when_disabled() {
        let err = handler(0, false).handle(RequestKind::Status).await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidState(_)));
    }
}
