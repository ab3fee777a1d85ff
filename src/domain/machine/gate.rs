//! Machine Context - Analysis Gate

use super::snapshot::{MachineStatusSnapshot, MACHINE_CODE_PRINTING};

/// 是否值得为当前帧调用视觉模型
///
/// 只有状态有效且机器正在打印时返回 true
pub fn should_analyze(snapshot: Option<&MachineStatusSnapshot>) -> bool {
    match snapshot {
        Some(s) => s.is_valid() && s.machine_code() == Some(MACHINE_CODE_PRINTING),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_valid_printing_passes() {
        assert!(should_analyze(Some(&MachineStatusSnapshot::with_machine_code(1))));

        for code in [0, 2, 3, 4, 99] {
            assert!(!should_analyze(Some(&MachineStatusSnapshot::with_machine_code(code))));
        }
    }

    #[test]
    fn test_unsuccessful_or_missing_status_is_rejected() {
        let mut failed = MachineStatusSnapshot::with_machine_code(1);
        failed.success = false;

        assert!(!should_analyze(Some(&failed)));
        assert!(!should_analyze(Some(&MachineStatusSnapshot::unavailable())));
        assert!(!should_analyze(None));
    }
}
