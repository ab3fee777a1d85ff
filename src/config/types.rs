//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::monitor::MonitorSettings;
use crate::application::retry::RetryPolicy;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 命令 API 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 处理循环配置
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// 摄像头配置
    #[serde(default)]
    pub camera: CameraConfig,

    /// 视觉模型配置
    #[serde(default)]
    pub vision: VisionConfig,

    /// 打印机状态源配置
    #[serde(default)]
    pub printer: PrinterConfig,

    /// 通知渠道配置
    #[serde(default)]
    pub notify: NotifyConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 编排器运行参数
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            interval: Duration::from_millis(self.monitor.interval_ms),
            llm_cooldown: Duration::from_millis(self.monitor.llm_cooldown_ms),
            vision_enabled: self.vision.enabled,
            notification_threshold: self.monitor.notification_threshold,
            status_change_cooldown: Duration::from_millis(self.monitor.status_change_cooldown_ms),
            periodic_update_every: self.monitor.periodic_update_every,
            capture_retry: RetryPolicy::new(
                self.camera.max_retries,
                Duration::from_millis(self.camera.retry_delay_ms),
            ),
            vision_retry: RetryPolicy::new(
                self.vision.max_retries,
                Duration::from_millis(self.vision.retry_delay_ms),
            ),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 处理循环配置
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// 基础采集间隔（毫秒）
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// 触发告警的最低置信度
    #[serde(default = "default_notification_threshold")]
    pub notification_threshold: f64,

    /// 视觉调用后的最小间隔（毫秒）
    #[serde(default = "default_llm_cooldown_ms")]
    pub llm_cooldown_ms: u64,

    /// 状态变化通知的最小间隔（毫秒）
    #[serde(default = "default_status_change_cooldown_ms")]
    pub status_change_cooldown_ms: u64,

    /// 请求队列两次出队之间的间隔（毫秒）
    #[serde(default = "default_queue_pause_ms")]
    pub queue_pause_ms: u64,

    /// 每 N 个周期发送一次周期性报告，0 表示关闭
    #[serde(default = "default_periodic_update_every")]
    pub periodic_update_every: u64,
}

fn default_interval_ms() -> u64 {
    30_000
}

fn default_notification_threshold() -> f64 {
    0.8
}

fn default_llm_cooldown_ms() -> u64 {
    10_000
}

fn default_status_change_cooldown_ms() -> u64 {
    60_000
}

fn default_queue_pause_ms() -> u64 {
    100
}

fn default_periodic_update_every() -> u64 {
    10
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            notification_threshold: default_notification_threshold(),
            llm_cooldown_ms: default_llm_cooldown_ms(),
            status_change_cooldown_ms: default_status_change_cooldown_ms(),
            queue_pause_ms: default_queue_pause_ms(),
            periodic_update_every: default_periodic_update_every(),
        }
    }
}

/// 帧来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSourceKind {
    /// HTTP MJPEG 流
    #[default]
    Mjpeg,
    /// 本地图片文件
    File,
}

/// 摄像头配置
#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub source: CaptureSourceKind,

    /// MJPEG 流 URL
    #[serde(default = "default_stream_url")]
    pub stream_url: String,

    /// `source = "file"` 时读取的图片
    #[serde(default = "default_file_path")]
    pub file_path: PathBuf,

    /// 单帧读取超时（秒）
    #[serde(default = "default_camera_timeout")]
    pub timeout_secs: u64,

    /// 单帧最大字节数
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// 总尝试次数，耗尽后处理循环中止
    #[serde(default = "default_camera_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_camera_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_stream_url() -> String {
    "http://localhost:3031/video".to_string()
}

fn default_file_path() -> PathBuf {
    PathBuf::from("data/frame.jpg")
}

fn default_camera_timeout() -> u64 {
    10
}

fn default_max_frame_bytes() -> usize {
    8 * 1024 * 1024 // 8 MB
}

fn default_camera_max_retries() -> u32 {
    3
}

fn default_camera_retry_delay_ms() -> u64 {
    2000
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: CaptureSourceKind::default(),
            stream_url: default_stream_url(),
            file_path: default_file_path(),
            timeout_secs: default_camera_timeout(),
            max_frame_bytes: default_max_frame_bytes(),
            max_retries: default_camera_max_retries(),
            retry_delay_ms: default_camera_retry_delay_ms(),
        }
    }
}

/// 视觉模型配置
#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    /// 关闭后只做状态检测，不调用模型
    #[serde(default = "default_vision_enabled")]
    pub enabled: bool,

    /// OpenAI 兼容 API 基础 URL
    #[serde(default = "default_vision_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_vision_model")]
    pub model: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_vision_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// 总尝试次数
    #[serde(default = "default_vision_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_vision_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_vision_enabled() -> bool {
    true
}

fn default_vision_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_vision_model() -> String {
    "llava".to_string()
}

fn default_vision_timeout() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.1
}

fn default_vision_max_retries() -> u32 {
    2
}

fn default_vision_retry_delay_ms() -> u64 {
    3000
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            enabled: default_vision_enabled(),
            base_url: default_vision_base_url(),
            api_key: None,
            model: default_vision_model(),
            timeout_secs: default_vision_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: default_vision_max_retries(),
            retry_delay_ms: default_vision_retry_delay_ms(),
        }
    }
}

/// 打印机状态源配置
#[derive(Debug, Clone, Deserialize)]
pub struct PrinterConfig {
    #[serde(default = "default_printer_host")]
    pub host: String,

    #[serde(default = "default_printer_port")]
    pub port: u16,

    /// 主板 ID，未知时留空
    #[serde(default)]
    pub mainboard_id: String,

    /// 状态查询往返超时（秒）
    #[serde(default = "default_printer_timeout")]
    pub timeout_secs: u64,
}

fn default_printer_host() -> String {
    "127.0.0.1".to_string()
}

fn default_printer_port() -> u16 {
    3030
}

fn default_printer_timeout() -> u64 {
    5
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            host: default_printer_host(),
            port: default_printer_port(),
            mainboard_id: String::new(),
            timeout_secs: default_printer_timeout(),
        }
    }
}

/// 通知渠道配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub discord: DiscordConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,
}

/// Discord 配置，未设置 webhook_url 时不启用
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// 是否接收周期性报告
    #[serde(default = "default_periodic_updates")]
    pub periodic_updates: bool,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            periodic_updates: default_periodic_updates(),
        }
    }
}

/// Telegram 配置，bot_token 与 chat_id 同时设置时启用
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,

    #[serde(default)]
    pub chat_id: Option<String>,

    /// 是否接收周期性报告
    #[serde(default = "default_periodic_updates")]
    pub periodic_updates: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            periodic_updates: default_periodic_updates(),
        }
    }
}

fn default_periodic_updates() -> bool {
    true
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
