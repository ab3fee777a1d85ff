//! Vision Adapter - 多模态模型客户端实现

mod http_vision_client;

pub use http_vision_client::{jpeg_data_url, HttpVisionClient, HttpVisionClientConfig};
