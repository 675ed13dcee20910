//! Regret and strategy accumulation keyed by `(information set, action)`.
//!
//! Tables are sparse hash maps because the placement game has no fixed tree:
//! an information set only exists once a training episode or a live query
//! reaches it. Missing entries read as zero, which makes an unseen info set
//! play uniformly.

use std::collections::HashMap;
use std::hash::Hasher;

use crate::cards::CardSet;
use crate::rules::Board;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// FNV-1a 64-bit; stable across runs, so keys survive a save/load cycle.
struct FnvHasher(u64);

impl FnvHasher {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }
}

/// Hash of (own lines, opponent-visible cards, fantasy flag, progressive
/// flag). States with equal keys share one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InfoSetKey(pub u64);

impl InfoSetKey {
    pub fn new(board: &Board, visible: &CardSet, fantasy: bool, progressive: bool) -> Self {
        let mut h = FnvHasher::new();
        for line in crate::hand_evaluator::ALL_LINES {
            h.write_u64(board.line_set(line).bits());
        }
        h.write_u64(visible.bits());
        h.write_u8((fantasy as u8) | ((progressive as u8) << 1));
        InfoSetKey(h.finish())
    }
}

pub type ActionId = u16;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegretTables {
    regret_sum: HashMap<(InfoSetKey, ActionId), f64>,
    strategy_sum: HashMap<(InfoSetKey, ActionId), f64>,
}

impl RegretTables {
    pub fn new() -> Self {
        RegretTables::default()
    }

    pub fn regret(&self, key: InfoSetKey, action: ActionId) -> f64 {
        self.regret_sum.get(&(key, action)).copied().unwrap_or(0.0)
    }

    pub fn strategy_weight(&self, key: InfoSetKey, action: ActionId) -> f64 {
        self.strategy_sum.get(&(key, action)).copied().unwrap_or(0.0)
    }

    /// Regret matching over `actions`: proportional to positive regret,
    /// uniform if none is positive.
    pub fn current_strategy(&self, key: InfoSetKey, actions: &[ActionId]) -> Vec<f64> {
        let positive: Vec<f64> = actions
            .iter()
            .map(|&a| self.regret(key, a).max(0.0))
            .collect();
        normalize_or_uniform(positive)
    }

    /// Normalised cumulative strategy; the quantity that converges under
    /// repeated self-play.
    pub fn average_strategy(&self, key: InfoSetKey, actions: &[ActionId]) -> Vec<f64> {
        let weights: Vec<f64> = actions
            .iter()
            .map(|&a| self.strategy_weight(key, a).max(0.0))
            .collect();
        normalize_or_uniform(weights)
    }

    /// Accumulate one visit of an information set.
    ///
    /// - `strategy`: the regret-matched strategy used at the visit
    /// - `action_values`: utility returned by each action
    /// - `node_value`: strategy-weighted utility of the node
    pub fn update(
        &mut self,
        key: InfoSetKey,
        actions: &[ActionId],
        strategy: &[f64],
        action_values: &[f64],
        node_value: f64,
        reach_prob: f64,
    ) {
        for (i, &a) in actions.iter().enumerate() {
            *self.regret_sum.entry((key, a)).or_insert(0.0) +=
                reach_prob * (action_values[i] - node_value);
            *self.strategy_sum.entry((key, a)).or_insert(0.0) += reach_prob * strategy[i];
        }
    }

    /// Sum another table set into this one.
    pub fn merge(&mut self, other: &RegretTables) {
        for (k, v) in &other.regret_sum {
            *self.regret_sum.entry(*k).or_insert(0.0) += v;
        }
        for (k, v) in &other.strategy_sum {
            *self.strategy_sum.entry(*k).or_insert(0.0) += v;
        }
    }

    pub fn info_set_count(&self) -> usize {
        let mut keys: Vec<InfoSetKey> = self.regret_sum.keys().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        keys.dedup();
        keys.len()
    }

    pub fn len(&self) -> usize {
        self.regret_sum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regret_sum.is_empty() && self.strategy_sum.is_empty()
    }

    pub fn regret_entries(&self) -> impl Iterator<Item = (&(InfoSetKey, ActionId), &f64)> {
        self.regret_sum.iter()
    }

    pub fn strategy_entries(&self) -> impl Iterator<Item = (&(InfoSetKey, ActionId), &f64)> {
        self.strategy_sum.iter()
    }

    pub fn insert_regret(&mut self, key: InfoSetKey, action: ActionId, value: f64) {
        self.regret_sum.insert((key, action), value);
    }

    pub fn insert_strategy(&mut self, key: InfoSetKey, action: ActionId, value: f64) {
        self.strategy_sum.insert((key, action), value);
    }
}

fn normalize_or_uniform(weights: Vec<f64>) -> Vec<f64> {
    let n = weights.len();
    if n == 0 {
        return weights;
    }
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.into_iter().map(|w| w / total).collect()
    } else {
        vec![1.0 / n as f64; n]
    }
}
