//! Capture Adapter - 摄像头帧采集实现

mod mjpeg_capture_client;
mod static_image_capture;

pub use mjpeg_capture_client::{
    find_jpeg_frame, JpegFrameScanner, MjpegCaptureClient, MjpegCaptureConfig,
};
pub use static_image_capture::StaticImageCapture;
