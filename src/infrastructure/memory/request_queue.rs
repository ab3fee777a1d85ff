//! In-Memory Request Queue Implementation
//!
//! 单飞 FIFO 队列：
//! - 任意时刻最多一个请求在执行
//! - 按入队顺序执行
//! - 消费任务在队列为空时退出，下一次入队时重新启动

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    QueueError, RequestHandler, RequestKind, RequestOutcome, RequestQueuePort,
};

/// 两次出队之间的默认间隔
pub const DEFAULT_QUEUE_PAUSE: Duration = Duration::from_millis(100);

type Responder = oneshot::Sender<Result<RequestOutcome, QueueError>>;

struct QueuedRequest {
    id: u64,
    kind: RequestKind,
    requested_at: Instant,
    responder: Responder,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueuedRequest>,
    /// 消费任务是否存活，与 pending 在同一把锁下修改
    running: bool,
}

struct Inner {
    state: Mutex<QueueState>,
    next_id: AtomicU64,
    handler: Arc<dyn RequestHandler>,
    pause: Duration,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 内存请求队列
#[derive(Clone)]
pub struct InMemoryRequestQueue {
    inner: Arc<Inner>,
}

impl InMemoryRequestQueue {
    pub fn new(handler: Arc<dyn RequestHandler>) -> Self {
        Self::with_pause(handler, DEFAULT_QUEUE_PAUSE)
    }

    pub fn with_pause(handler: Arc<dyn RequestHandler>, pause: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                next_id: AtomicU64::new(0),
                handler,
                pause,
            }),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 消费循环：逐个执行直到队列为空
    async fn consume(inner: Arc<Inner>) {
        tracing::debug!("Request queue consumer started");

        loop {
            let request = {
                let mut state = inner.lock();
                match state.pending.pop_front() {
                    Some(request) => request,
                    None => {
                        state.running = false;
                        break;
                    }
                }
            };

            let QueuedRequest {
                id,
                kind,
                requested_at,
                responder,
            } = request;
            let kind_name = kind.as_str();
            let started = Instant::now();

            // 处理器 panic 不能让消费任务退出
            let handler = inner.handler.clone();
            let result = match tokio::spawn(async move { handler.handle(kind).await }).await {
                Ok(Ok(outcome)) => Ok(outcome),
                Ok(Err(source)) => Err(QueueError::HandlerFailed { id, source }),
                Err(e) => Err(QueueError::HandlerFailed {
                    id,
                    source: ApplicationError::internal(format!("handler aborted: {}", e)),
                }),
            };

            match &result {
                Ok(_) => tracing::debug!(
                    id,
                    kind = kind_name,
                    wait_ms = started.duration_since(requested_at).as_millis() as u64,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Request completed"
                ),
                Err(e) => tracing::warn!(id, kind = kind_name, error = %e, "Request failed"),
            }

            if responder.send(result).is_err() {
                tracing::debug!(id, "Requester went away before completion");
            }

            if !inner.pause.is_zero() {
                tokio::time::sleep(inner.pause).await;
            }
        }

        tracing::debug!("Request queue drained, consumer stopped");
    }
}

#[async_trait]
impl RequestQueuePort for InMemoryRequestQueue {
    async fn enqueue(&self, kind: RequestKind) -> Result<RequestOutcome, QueueError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (responder, receiver) = oneshot::channel();
        let kind_name = kind.as_str();

        let start_consumer = {
            let mut state = self.inner.lock();
            state.pending.push_back(QueuedRequest {
                id,
                kind,
                requested_at: Instant::now(),
                responder,
            });
            tracing::debug!(id, kind = kind_name, pending = state.pending.len(), "Request enqueued");
            !std::mem::replace(&mut state.running, true)
        };

        if start_consumer {
            tokio::spawn(Self::consume(self.inner.clone()));
        }

        receiver.await.unwrap_or(Err(QueueError::Dropped(id)))
    }

    fn pending(&self) -> usize {
        self.inner.lock().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::FrameCapture;
    use std::sync::atomic::AtomicUsize;

    /// 记录执行顺序与并发度的处理器
    #[derive(Default)]
    struct RecordingHandler {
        order: Mutex<Vec<&'static str>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fail_analyze: bool,
    }

    #[async_trait]
    impl RequestHandler for RecordingHandler {
        async fn handle(&self, kind: RequestKind) -> Result<RequestOutcome, ApplicationError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.order.lock().unwrap().push(kind.as_str());

            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_analyze && matches!(kind, RequestKind::Analyze) {
                return Err(ApplicationError::internal("vision offline"));
            }
            Ok(RequestOutcome::Frame(FrameCapture::new(vec![1, 2, 3])))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_run_in_order_one_at_a_time() {
        let handler = Arc::new(RecordingHandler::default());
        let queue = InMemoryRequestQueue::new(handler.clone());

        let (a, b, c) = tokio::join!(
            queue.enqueue(RequestKind::Status),
            queue.enqueue(RequestKind::Analyze),
            queue.enqueue(RequestKind::Frame),
        );

        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(*handler.order.lock().unwrap(), vec!["status", "analyze", "frame"]);
        assert_eq!(handler.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_only_affects_its_own_request() {
        let handler = Arc::new(RecordingHandler {
            fail_analyze: true,
            ..Default::default()
        });
        let queue = InMemoryRequestQueue::new(handler.clone());

        let (a, b, c) = tokio::join!(
            queue.enqueue(RequestKind::Status),
            queue.enqueue(RequestKind::Analyze),
            queue.enqueue(RequestKind::Frame),
        );

        assert!(a.is_ok());
        match b {
            Err(QueueError::HandlerFailed { id, source }) => {
                assert_eq!(id, 2);
                assert!(matches!(source, ApplicationError::InternalError(ref m) if m == "vision offline"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(c.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_consumer_restarts_after_drain() {
        let handler = Arc::new(RecordingHandler::default());
        let queue = InMemoryRequestQueue::new(handler.clone());

        queue.enqueue(RequestKind::Frame).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!queue.inner.lock().running);

        queue.enqueue(RequestKind::Status).await.unwrap();
        assert_eq!(*handler.order.lock().unwrap(), vec!["frame", "status"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ids_strictly_increase() {
        let handler = Arc::new(RecordingHandler {
            fail_analyze: true,
            ..Default::default()
        });
        let queue = InMemoryRequestQueue::with_pause(handler, Duration::ZERO);

        let mut ids = Vec::new();
        for _ in 0..3 {
            match queue.enqueue(RequestKind::Analyze).await {
                Err(QueueError::HandlerFailed { id, .. }) => ids.push(id),
                other => panic!("unexpected result: {other:?}"),
            }
        }
        assert_eq!(ids, vec![1, 2, 3]);
    }

    /// 记录每次开始执行的时刻
    #[derive(Default)]
    struct StampingHandler {
        starts: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl RequestHandler for StampingHandler {
        async fn handle(&self, _kind: RequestKind) -> Result<RequestOutcome, ApplicationError> {
            self.starts.lock().unwrap().push(Instant::now());
            Ok(RequestOutcome::Frame(FrameCapture::new(vec![0xFF, 0xD8, 0xFF, 0xD9])))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_between_dequeues() {
        let handler = Arc::new(StampingHandler::default());
        let queue = InMemoryRequestQueue::new(handler.clone());

        let (a, b, c) = tokio::join!(
            queue.enqueue(RequestKind::Frame),
            queue.enqueue(RequestKind::Frame),
            queue.enqueue(RequestKind::Frame),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());

        let starts = handler.starts.lock().unwrap().clone();
        assert_eq!(starts.len(), 3);
        for pair in starts.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= DEFAULT_QUEUE_PAUSE);
        }
    }
}
