//! MJPEG Capture Client - 从 HTTP MJPEG 流中截取单帧
//!
//! 实现 CaptureSourcePort trait
//!
//! 摄像头 API:
//! GET http://<camera>/stream  (multipart/x-mixed-replace 或单张 JPEG)
//! 从字节流中找到第一个完整的 JPEG（SOI 0xFFD8 .. EOI 0xFFD9）即返回

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;

use crate::application::ports::{CaptureError, CaptureSourcePort, FrameCapture};

const MARKER_PREFIX: u8 = 0xFF;
const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;

/// MJPEG 采集客户端配置
#[derive(Debug, Clone)]
pub struct MjpegCaptureConfig {
    /// 视频流 URL
    pub stream_url: String,
    /// 单帧读取超时（秒）
    pub timeout_secs: u64,
    /// 单帧最大字节数
    pub max_frame_bytes: usize,
}

impl Default for MjpegCaptureConfig {
    fn default() -> Self {
        Self {
            stream_url: "http://localhost:3031/video".to_string(),
            timeout_secs: 10,
            max_frame_bytes: 8 * 1024 * 1024,
        }
    }
}

impl MjpegCaptureConfig {
    pub fn new(stream_url: impl Into<String>) -> Self {
        Self {
            stream_url: stream_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_frame_bytes(mut self, bytes: usize) -> Self {
        self.max_frame_bytes = bytes;
        self
    }
}

/// 增量 JPEG 帧扫描器
///
/// 跨数据块保留扫描位置，每个字节只检查一次。
/// 按 SOI/EOI 嵌套深度配对，内嵌的 EXIF 缩略图不会提前截断外层帧。
#[derive(Debug, Default)]
pub struct JpegFrameScanner {
    start: Option<usize>,
    depth: usize,
    pos: usize,
}

impl JpegFrameScanner {
    /// 继续扫描（只追加过的）缓冲区，返回第一个完整 JPEG 的区间 `[start, end)`
    pub fn scan(&mut self, buffer: &[u8]) -> Option<(usize, usize)> {
        // 最后一个字节留到下一块再看，标记可能跨块
        while self.pos + 1 < buffer.len() {
            let i = self.pos;
            if buffer[i] == MARKER_PREFIX {
                match buffer[i + 1] {
                    SOI => {
                        self.start.get_or_insert(i);
                        self.depth += 1;
                        self.pos = i + 2;
                        continue;
                    }
                    EOI if self.depth > 0 => {
                        self.depth -= 1;
                        self.pos = i + 2;
                        if self.depth == 0 {
                            return self.start.map(|start| (start, i + 2));
                        }
                        continue;
                    }
                    _ => {}
                }
            }
            self.pos += 1;
        }
        None
    }
}

/// 在完整缓冲区中查找第一个 JPEG 的区间 `[start, end)`
pub fn find_jpeg_frame(buffer: &[u8]) -> Option<(usize, usize)> {
    JpegFrameScanner::default().scan(buffer)
}

/// MJPEG 采集客户端
pub struct MjpegCaptureClient {
    client: Client,
    config: MjpegCaptureConfig,
}

impl MjpegCaptureClient {
    pub fn new(config: MjpegCaptureConfig) -> Result<Self, CaptureError> {
        // 流式响应不设整体超时，由单帧读取超时控制
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CaptureError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    async fn read_frame(&self) -> Result<FrameCapture, CaptureError> {
        let response = self
            .client
            .get(&self.config.stream_url)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptureError::NetworkError(format!("HTTP {}", status)));
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::with_capacity(256 * 1024);
        let mut scanner = JpegFrameScanner::default();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_request_error)?;
            buffer.extend_from_slice(&chunk);

            if let Some((start, end)) = scanner.scan(&buffer) {
                let frame = buffer[start..end].to_vec();
                if frame.len() > self.config.max_frame_bytes {
                    return Err(CaptureError::FrameTooLarge(frame.len()));
                }
                return Ok(FrameCapture::new(frame));
            }

            if buffer.len() > self.config.max_frame_bytes {
                return Err(CaptureError::FrameTooLarge(buffer.len()));
            }
        }

        Err(CaptureError::InvalidStream(format!(
            "stream ended after {} bytes without a complete JPEG frame",
            buffer.len()
        )))
    }
}

fn map_request_error(e: reqwest::Error) -> CaptureError {
    if e.is_timeout() {
        CaptureError::Timeout
    } else if e.is_connect() {
        CaptureError::NetworkError(format!("Cannot connect to camera: {}", e))
    } else {
        CaptureError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl CaptureSourcePort for MjpegCaptureClient {
    async fn capture_frame(&self) -> Result<FrameCapture, CaptureError> {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let frame = tokio::time::timeout(timeout, self.read_frame())
            .await
            .map_err(|_| CaptureError::Timeout)??;

        tracing::debug!(
            url = %self.config.stream_url,
            bytes = frame.len(),
            "MJPEG frame captured"
        );
        Ok(frame)
    }

    async fn test_connection(&self) -> bool {
        match self.capture_frame().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(url = %self.config.stream_url, error = %e, "Camera connection test failed");
                false
            }
        }
    }
}
