//! PrintWatch - 3D 打印机摄像头监控
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Analysis: 视觉结果归一化、分析门控
//! - Machine: 打印机状态快照、状态变化检测
//! - Statistics: 运行统计
//!
//! 应用层 (application/):
//! - Ports: 端口定义（CaptureSource, VisionClient, MachineStatus, NotificationSink, RequestQueue）
//! - Monitor: 帧处理编排器、队列请求处理器
//! - Retry: 固定间隔重试
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: 命令 API + WebSocket
//! - Memory: 单飞请求队列
//! - Worker: MonitorWorker 定时处理循环
//! - Adapters: MJPEG 采集、视觉模型、SDCP 状态、Discord/Telegram 通知
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
