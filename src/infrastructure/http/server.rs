//! HTTP Server
//!
//! 命令 API 服务器：先绑定端口（绑定失败在启动阶段暴露），再带优雅关闭运行

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::CONTENT_TYPE;
use http::Method;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;

/// 命令请求不携带请求体
const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// 组装带中间件的 Router
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    create_routes()
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(middleware::from_fn(error_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// 已绑定端口的 HTTP 服务器
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
}

impl HttpServer {
    /// 绑定监听地址，`port = 0` 时由系统分配
    pub async fn bind(addr: &str, state: AppState) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            router: build_router(Arc::new(state)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// 运行直到 `shutdown_signal` 完成，已接受的请求会处理完
    pub async fn serve<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        tracing::info!(addr = %addr, "Command API listening");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        tracing::info!(addr = %addr, "Command API stopped");
        Ok(())
    }
}
