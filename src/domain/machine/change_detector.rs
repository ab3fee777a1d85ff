//! Machine Context - Status Change Detector
//!
//! 判断两次状态快照之间的变化是否值得通知，并维护通知冷却

use std::time::Duration;

use tokio::time::Instant;

use super::snapshot::MachineStatusSnapshot;

/// 状态变化检测器
///
/// 不变量:
/// - 首个有效快照只触发一次启动通知，标记在进程生命周期内不会被清除
/// - 结构缺失或状态码类型错误的数据永远不会触发通知
#[derive(Debug, Default)]
pub struct StatusChangeDetector {
    ever_had_valid_status: bool,
}

impl StatusChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ever_had_valid_status(&self) -> bool {
        self.ever_had_valid_status
    }

    pub fn has_status_changed(
        &mut self,
        current: Option<&MachineStatusSnapshot>,
        previous: Option<&MachineStatusSnapshot>,
    ) -> bool {
        let Some(current) = current.filter(|s| s.is_valid()) else {
            return false;
        };

        if !self.ever_had_valid_status {
            self.ever_had_valid_status = true;
            tracing::debug!(machine = current.machine_text(), "First valid machine status observed");
            return true;
        }

        let Some(previous) = previous.filter(|s| s.is_valid()) else {
            return false;
        };

        if std::ptr::eq(current, previous) {
            return false;
        }

        let (Some(current_machine), Some(previous_machine)) = (&current.machine, &previous.machine)
        else {
            return false;
        };

        match (current_machine.code, previous_machine.code) {
            (Some(now), Some(before)) => now != before,
            _ => false,
        }
    }
}

/// 状态变化通知冷却
///
/// 冷却计时只在通知成功发送后开始
#[derive(Debug)]
pub struct NotificationCooldown {
    cooldown: Duration,
    last_sent: Option<Instant>,
}

impl NotificationCooldown {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_sent: None,
        }
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_sent {
            Some(sent) => now.saturating_duration_since(sent) >= self.cooldown,
            None => true,
        }
    }

    pub fn mark_sent(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.last_sent
            .map(|sent| self.cooldown.saturating_sub(now.saturating_duration_since(sent)))
            .unwrap_or_default()
    }
}
