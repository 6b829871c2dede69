//! 销售选择器
//!
//! 纯选择逻辑，不读写持久层；调用方在自己的事务里读取候选并写入结果。
//!
//! 权重曲线固定为 `1 / (1 + load)`：零负载的销售权重最大（1.0）。
//! 加权抽样按输入顺序累加权重，同一种子与同一输入顺序必然得到同一结果。

use std::sync::{Mutex, PoisonError};

use club_common::SellerId;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::domain::assignment::{Candidate, SelectionPolicy};

/// 负载对应的选择权重
pub fn inverse_load_weight(load: u64) -> f64 {
    1.0 / (1.0 + load as f64)
}

/// 销售选择器
///
/// 随机源与令牌生成使用的 `OsRng` 相互独立，可以固定种子以便复现。
pub struct SellerSelector {
    policy: SelectionPolicy,
    rng: Mutex<StdRng>,
}

impl SellerSelector {
    /// 使用系统熵初始化随机源
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// 使用固定种子
    pub fn with_seed(policy: SelectionPolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// 按配置构造：有种子时固定种子
    pub fn from_seed_option(policy: SelectionPolicy, seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(policy, seed),
            None => Self::new(policy),
        }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// 选择一个销售；没有合格候选时返回 `None`
    pub fn select_assignee(&self, candidates: &[Candidate]) -> Option<SellerId> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        select_with(self.policy, candidates, &mut *rng)
    }
}

/// 使用给定随机源执行一次选择
pub fn select_with<R: Rng + ?Sized>(
    policy: SelectionPolicy,
    candidates: &[Candidate],
    rng: &mut R,
) -> Option<SellerId> {
    let eligible: Vec<&Candidate> = candidates.iter().filter(|c| c.eligible).collect();
    if eligible.is_empty() {
        debug!(total = candidates.len(), "No eligible seller");
        return None;
    }

    let selected = match policy {
        SelectionPolicy::LeastLoaded => eligible.iter().min_by_key(|c| c.load).map(|c| c.seller_id),
        SelectionPolicy::WeightedRandom => {
            let weights = eligible.iter().map(|c| inverse_load_weight(c.load));
            // 权重恒为正，构造不会失败
            let index = WeightedIndex::new(weights).ok()?;
            Some(eligible[index.sample(rng)].seller_id)
        }
    };

    if let Some(seller_id) = &selected {
        debug!(seller_id = %seller_id, eligible = eligible.len(), policy = ?policy, "Seller selected");
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_curve() {
        assert_eq!(inverse_load_weight(0), 1.0);
        assert_eq!(inverse_load_weight(1), 0.5);
        assert_eq!(inverse_load_weight(3), 0.25);
        assert!(inverse_load_weight(u64::MAX) > 0.0);
    }

    #[test]
    fn test_empty_returns_none() {
        let selector = SellerSelector::with_seed(SelectionPolicy::WeightedRandom, 7);
        assert_eq!(selector.select_assignee(&[]), None);
    }

    #[test]
    fn test_ineligible_are_skipped() {
        let a = SellerId::new();
        let b = SellerId::new();
        let candidates = [Candidate::ineligible(a, 0), Candidate::new(b, 100)];
        let selector = SellerSelector::with_seed(SelectionPolicy::WeightedRandom, 1);

        for _ in 0..50 {
            assert_eq!(selector.select_assignee(&candidates), Some(b));
        }
        assert_eq!(selector.select_assignee(&[Candidate::ineligible(a, 0)]), None);
    }

    #[test]
    fn test_least_loaded_prefers_first_on_tie() {
        let a = SellerId::new();
        let b = SellerId::new();
        let c = SellerId::new();
        let selector = SellerSelector::new(SelectionPolicy::LeastLoaded);

        let candidates = [Candidate::new(a, 4), Candidate::new(b, 2), Candidate::new(c, 2)];
        assert_eq!(selector.select_assignee(&candidates), Some(b));
    }

    #[test]
    fn test_policy_from_config() {
        use club_config::AssignmentPolicy;

        assert_eq!(
            SelectionPolicy::from(AssignmentPolicy::Weighted),
            SelectionPolicy::WeightedRandom
        );
        assert_eq!(
            SelectionPolicy::from(AssignmentPolicy::LeastLoaded),
            SelectionPolicy::LeastLoaded
        );
    }
}
