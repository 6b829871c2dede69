//! Club Accounts Metrics
//!
//! 业务指标记录

use metrics::counter;

// ============================================================================
// 密码重置 Metrics
// ============================================================================

/// 记录令牌签发
pub fn record_token_issued() {
    counter!("club_password_reset_issued_total").increment(1);
}

/// 记录令牌消费结果（consumed / invalid / used / expired）
pub fn record_consume_outcome(outcome: &'static str) {
    counter!("club_password_reset_consume_total", "outcome" => outcome).increment(1);
}

/// 记录因未完成令牌过多而跳过的签发
pub fn record_issue_throttled() {
    counter!("club_password_reset_throttled_total").increment(1);
}

// ============================================================================
// 销售分配 Metrics
// ============================================================================

/// 记录一次分配尝试（assigned / no_candidate / lost_race）
pub fn record_assignment(outcome: &'static str) {
    counter!("club_seller_assignment_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_token_issued();
        record_consume_outcome("consumed");
        record_issue_throttled();
        record_assignment("assigned");
    }
}
