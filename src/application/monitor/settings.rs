//! Monitor Settings - 编排器运行参数

use std::time::Duration;

use crate::application::retry::RetryPolicy;

/// 两个周期之间的最小间隔
pub const MIN_CYCLE_SPACING: Duration = Duration::from_millis(5000);

/// 编排器配置
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// 基础采集间隔
    pub interval: Duration,
    /// 视觉模型调用后的最小间隔
    pub llm_cooldown: Duration,
    /// 是否启用视觉分析
    pub vision_enabled: bool,
    /// 触发告警的最低置信度
    pub notification_threshold: f64,
    /// 状态变化通知的最小间隔
    pub status_change_cooldown: Duration,
    /// 每 N 个周期发送一次周期性报告，0 表示关闭
    pub periodic_update_every: u64,
    pub capture_retry: RetryPolicy,
    pub vision_retry: RetryPolicy,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(30_000),
            llm_cooldown: Duration::from_millis(10_000),
            vision_enabled: true,
            notification_threshold: 0.8,
            status_change_cooldown: Duration::from_millis(60_000),
            periodic_update_every: 10,
            capture_retry: RetryPolicy::new(3, Duration::from_millis(2000)),
            vision_retry: RetryPolicy::new(2, Duration::from_millis(3000)),
        }
    }
}

impl MonitorSettings {
    /// 从上一个周期开始时刻算起，到下一个周期开始的间隔
    pub fn cycle_spacing(&self) -> Duration {
        self.llm_cooldown.max(self.interval).max(MIN_CYCLE_SPACING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_spacing_takes_largest() {
        let mut settings = MonitorSettings::default();
        assert_eq!(settings.cycle_spacing(), Duration::from_secs(30));

        settings.interval = Duration::from_secs(1);
        assert_eq!(settings.cycle_spacing(), Duration::from_secs(10));

        settings.llm_cooldown = Duration::from_secs(2);
        assert_eq!(settings.cycle_spacing(), MIN_CYCLE_SPACING);
    }
}
