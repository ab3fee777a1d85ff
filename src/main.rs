//! PrintWatch - 3D 打印机摄像头监控
//!
//! 启动流程：
//! - 加载配置，初始化日志
//! - 组装采集/视觉/状态/通知适配器
//! - 单飞请求队列 + 帧处理编排器
//! - 后台 MonitorWorker + 命令 API 服务器

use std::sync::Arc;

use printwatch::application::monitor::{FrameProcessor, MonitorRequestHandler};
use printwatch::application::ports::{
    CaptureSourcePort, MachineStatusPort, NotificationSinkPort, RequestQueuePort,
    VisionClientPort,
};
use printwatch::config::{load_config, print_config, AppConfig, CaptureSourceKind};
use printwatch::infrastructure::adapters::{
    DiscordWebhookConfig, DiscordWebhookSink, HttpVisionClient, HttpVisionClientConfig,
    MjpegCaptureClient, MjpegCaptureConfig, SdcpStatusClient, SdcpStatusClientConfig,
    StaticImageCapture, TelegramBotConfig, TelegramBotSink,
};
use printwatch::infrastructure::events::EventPublisher;
use printwatch::infrastructure::http::{AppState, HttpServer};
use printwatch::infrastructure::memory::InMemoryRequestQueue;
use printwatch::infrastructure::worker::MonitorWorker;
use tokio_util::sync::CancellationToken;

fn init_logging(config: &AppConfig) {
    let log_filter = format!(
        "{},printwatch={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_capture(config: &AppConfig) -> anyhow::Result<Arc<dyn CaptureSourcePort>> {
    let camera = &config.camera;
    Ok(match camera.source {
        CaptureSourceKind::Mjpeg => {
            let capture_config = MjpegCaptureConfig::new(&camera.stream_url)
                .with_timeout(camera.timeout_secs)
                .with_max_frame_bytes(camera.max_frame_bytes);
            Arc::new(MjpegCaptureClient::new(capture_config)?)
        }
        CaptureSourceKind::File => Arc::new(StaticImageCapture::new(&camera.file_path)),
    })
}

fn build_vision(config: &AppConfig) -> anyhow::Result<Arc<dyn VisionClientPort>> {
    let vision = &config.vision;
    let mut vision_config = HttpVisionClientConfig::new(&vision.base_url, &vision.model)
        .with_timeout(vision.timeout_secs);
    vision_config.max_tokens = vision.max_tokens;
    vision_config.temperature = vision.temperature;
    if let Some(api_key) = &vision.api_key {
        vision_config = vision_config.with_api_key(api_key);
    }
    Ok(Arc::new(HttpVisionClient::new(vision_config)?))
}

fn build_status_source(config: &AppConfig) -> Arc<dyn MachineStatusPort> {
    let printer = &config.printer;
    let mut status_config =
        SdcpStatusClientConfig::new(&printer.host).with_mainboard_id(&printer.mainboard_id);
    status_config.port = printer.port;
    status_config.timeout_secs = printer.timeout_secs;
    Arc::new(SdcpStatusClient::new(status_config))
}

fn build_sinks(config: &AppConfig) -> anyhow::Result<Vec<Arc<dyn NotificationSinkPort>>> {
    let mut sinks: Vec<Arc<dyn NotificationSinkPort>> = Vec::new();

    let discord = &config.notify.discord;
    if let Some(webhook_url) = &discord.webhook_url {
        let sink_config =
            DiscordWebhookConfig::new(webhook_url).with_periodic_updates(discord.periodic_updates);
        sinks.push(Arc::new(DiscordWebhookSink::new(sink_config)?));
    }

    let telegram = &config.notify.telegram;
    if let (Some(bot_token), Some(chat_id)) = (&telegram.bot_token, &telegram.chat_id) {
        let sink_config = TelegramBotConfig::new(bot_token, chat_id)
            .with_periodic_updates(telegram.periodic_updates);
        sinks.push(Arc::new(TelegramBotSink::new(sink_config)?));
    }

    if sinks.is_empty() {
        tracing::warn!("No notification sinks configured, alerts will only be logged");
    }
    Ok(sinks)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_logging(&config);

    tracing::info!("PrintWatch - 3D 打印机摄像头监控");
    print_config(&config);

    let settings = config.monitor_settings();

    // 创建适配器
    let capture = build_capture(&config)?;
    let vision = build_vision(&config)?;
    let status_source = build_status_source(&config);
    let sinks = build_sinks(&config)?;

    if !capture.test_connection().await {
        tracing::warn!("Camera source is not reachable yet, capture retries will apply");
    }

    // 创建单飞请求队列
    let handler = Arc::new(MonitorRequestHandler::new(
        capture.clone(),
        vision,
        status_source.clone(),
        settings.capture_retry,
        settings.vision_retry,
        settings.vision_enabled,
    ));
    let queue: Arc<dyn RequestQueuePort> = InMemoryRequestQueue::with_pause(
        handler,
        std::time::Duration::from_millis(config.monitor.queue_pause_ms),
    )
    .arc();

    // 创建编排器与事件发布器
    let processor = FrameProcessor::new(
        settings,
        capture,
        status_source.clone(),
        queue.clone(),
        sinks,
    );
    let stats = processor.subscribe_statistics();
    let event_publisher = EventPublisher::new().arc();

    // 启动 Worker，采集重试耗尽时同时关闭服务器
    let shutdown = CancellationToken::new();
    let worker = MonitorWorker::new(processor, event_publisher.clone());
    let worker_token = shutdown.clone();
    let worker_handle = tokio::spawn(async move {
        let result = worker.run(worker_token.clone()).await;
        worker_token.cancel();
        result
    });

    // 创建 HTTP 服务器
    let state = AppState::new(
        queue,
        status_source,
        stats,
        event_publisher,
        config.vision.enabled,
        config.monitor.notification_threshold,
    );
    let server = match HttpServer::bind(&config.server.addr(), state).await {
        Ok(server) => server,
        Err(e) => {
            shutdown.cancel();
            return Err(anyhow::anyhow!("Failed to bind {}: {}", config.server.addr(), e));
        }
    };

    // 启动服务器（带优雅关闭）
    let server_token = shutdown.clone();
    server
        .serve(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "Failed to listen for ctrl-c");
                    }
                    tracing::info!("Received shutdown signal");
                }
                _ = server_token.cancelled() => {}
            }
        })
        .await?;

    shutdown.cancel();
    worker_handle.await??;

    tracing::info!("Shutdown complete");

    Ok(())
}
