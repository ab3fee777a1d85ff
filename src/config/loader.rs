//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, CaptureSourceKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `PRINTWATCH_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `PRINTWATCH_CAMERA__STREAM_URL=http://192.168.1.50:3031/video`
/// - `PRINTWATCH_PRINTER__HOST=192.168.1.50`
/// - `PRINTWATCH_VISION__API_KEY=sk-...`
/// - `PRINTWATCH_MONITOR__INTERVAL_MS=15000`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("monitor.interval_ms", 30_000)?
        .set_default("monitor.notification_threshold", 0.8)?
        .set_default("monitor.llm_cooldown_ms", 10_000)?
        .set_default("monitor.status_change_cooldown_ms", 60_000)?
        .set_default("monitor.queue_pause_ms", 100)?
        .set_default("monitor.periodic_update_every", 10)?
        .set_default("camera.source", "mjpeg")?
        .set_default("camera.stream_url", "http://localhost:3031/video")?
        .set_default("camera.timeout_secs", 10)?
        .set_default("camera.max_retries", 3)?
        .set_default("camera.retry_delay_ms", 2000)?
        .set_default("vision.enabled", true)?
        .set_default("vision.base_url", "http://localhost:11434/v1")?
        .set_default("vision.model", "llava")?
        .set_default("vision.timeout_secs", 60)?
        .set_default("vision.max_retries", 2)?
        .set_default("vision.retry_delay_ms", 3000)?
        .set_default("printer.host", "127.0.0.1")?
        .set_default("printer.port", 3030)?
        .set_default("printer.timeout_secs", 5)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: PRINTWATCH_NOTIFY__TELEGRAM__CHAT_ID=-100123
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("PRINTWATCH")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("Server port cannot be 0"));
    }

    if config.monitor.interval_ms == 0 {
        return Err(invalid("Monitor interval cannot be 0"));
    }

    let threshold = config.monitor.notification_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ConfigError::ValidationError(format!(
            "Notification threshold must be within 0..1, got {}",
            threshold
        )));
    }

    match config.camera.source {
        CaptureSourceKind::Mjpeg if config.camera.stream_url.is_empty() => {
            return Err(invalid("Camera stream URL cannot be empty"));
        }
        CaptureSourceKind::File if config.camera.file_path.as_os_str().is_empty() => {
            return Err(invalid("Camera file path cannot be empty"));
        }
        _ => {}
    }

    if config.camera.max_retries == 0 || config.vision.max_retries == 0 {
        return Err(invalid("Retry attempts must be at least 1"));
    }

    if config.vision.enabled
        && (config.vision.base_url.is_empty() || config.vision.model.is_empty())
    {
        return Err(invalid("Vision base URL and model are required when vision is enabled"));
    }

    if config.printer.host.is_empty() {
        return Err(invalid("Printer host cannot be empty"));
    }

    let telegram = &config.notify.telegram;
    if telegram.bot_token.is_some() != telegram.chat_id.is_some() {
        return Err(invalid("Telegram bot_token and chat_id must be set together"));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== PrintWatch Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!(
        "Interval: {}ms (LLM cooldown {}ms)",
        config.monitor.interval_ms,
        config.monitor.llm_cooldown_ms
    );
    tracing::info!("Notification Threshold: {}", config.monitor.notification_threshold);
    tracing::info!(
        "Status Change Cooldown: {}ms",
        config.monitor.status_change_cooldown_ms
    );
    match config.camera.source {
        CaptureSourceKind::Mjpeg => tracing::info!("Camera: MJPEG {}", config.camera.stream_url),
        CaptureSourceKind::File => {
            tracing::info!("Camera: file {:?}", config.camera.file_path)
        }
    }
    tracing::info!(
        "Camera Retries: {} x {}ms",
        config.camera.max_retries,
        config.camera.retry_delay_ms
    );
    tracing::info!("Vision Enabled: {}", config.vision.enabled);
    if config.vision.enabled {
        tracing::info!("Vision: {} @ {}", config.vision.model, config.vision.base_url);
        tracing::info!("Vision API Key: {}", if config.vision.api_key.is_some() { "set" } else { "none" });
    }
    tracing::info!("Printer: {}:{}", config.printer.host, config.printer.port);
    tracing::info!(
        "Discord: {}",
        if config.notify.discord.webhook_url.is_some() { "enabled" } else { "disabled" }
    );
    tracing::info!(
        "Telegram: {}",
        if config.notify.telegram.bot_token.is_some() { "enabled" } else { "disabled" }
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("================================");
}
