//! Static Image Capture - 从本地文件读取帧
//!
//! 用于无摄像头环境下的联调，每次采集都重新读取文件

use async_trait::async_trait;
use std::path::PathBuf;

use crate::application::ports::{CaptureError, CaptureSourcePort, FrameCapture};

/// 静态图片采集源
pub struct StaticImageCapture {
    path: PathBuf,
}

impl StaticImageCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        tracing::info!(path = %path.display(), "StaticImageCapture initialized");
        Self { path }
    }
}

#[async_trait]
impl CaptureSourcePort for StaticImageCapture {
    async fn capture_frame(&self) -> Result<FrameCapture, CaptureError> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| CaptureError::Io(format!("{}: {}", self.path.display(), e)))?;

        if data.is_empty() {
            return Err(CaptureError::InvalidStream(format!(
                "{} is empty",
                self.path.display()
            )));
        }

        Ok(FrameCapture::new(data))
    }

    async fn test_connection(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_file_each_capture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xD9]).unwrap();

        let capture = StaticImageCapture::new(file.path());
        assert!(capture.test_connection().await);

        let frame = capture.capture_frame().await.unwrap();
        assert_eq!(frame.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let capture = StaticImageCapture::new(dir.path().join("missing.jpg"));

        assert!(!capture.test_connection().await);
        assert!(matches!(
            capture.capture_frame().await,
            Err(CaptureError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_file_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let capture = StaticImageCapture::new(file.path());

        assert!(matches!(
            capture.capture_frame().await,
            Err(CaptureError::InvalidStream(_))
        ));
    }
}
