//! Monitor State - 编排器独占的可变状态
//!
//! 只由 FrameProcessor 在顺序执行的周期内修改

use crate::domain::machine::{MachineStatusSnapshot, NotificationCooldown, StatusChangeDetector};
use crate::domain::RunningStatistics;

use super::settings::MonitorSettings;

#[derive(Debug)]
pub struct MonitorState {
    /// 已开始的周期数，即当前帧号
    pub cycle_count: u64,
    /// 最近一次有效的状态快照
    pub last_status: Option<MachineStatusSnapshot>,
    pub detector: StatusChangeDetector,
    pub cooldown: NotificationCooldown,
    pub stats: RunningStatistics,
}

impl MonitorState {
    pub fn new(settings: &MonitorSettings) -> Self {
        Self {
            cycle_count: 0,
            last_status: None,
            detector: StatusChangeDetector::new(),
            cooldown: NotificationCooldown::new(settings.status_change_cooldown),
            stats: RunningStatistics::new(),
        }
    }

    /// 只接受有效快照作为新的比较基准
    pub fn remember_status(&mut self, snapshot: Option<MachineStatusSnapshot>) {
        if let Some(snapshot) = snapshot.filter(|s| s.is_valid()) {
            self.last_status = Some(snapshot);
        }
    }
}
