//! The solver agent: CFR self-play over placement decisions, live action
//! selection and the persisted table format.
//!
//! Training runs on synthetic episodes. Each episode owns a private deck
//! seeded from `(config.seed, episode_number)`, so the tables after
//! `train(a); train(b)` equal the tables after `train(a + b)`. The live
//! card knowledge used by `get_action` is never touched by training.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cards::{parse_card, Card, CardSet, Deck};
use crate::cfr::{ActionId, InfoSetKey, RegretTables};
use crate::error::{OfcError, OfcResult};
use crate::fantasy::solve_fantasy;
use crate::game_state::{Decision, GameState, Placement};
use crate::hand_evaluator::{
    evaluate_line, fantasy_potential, Line, ALL_LINES, MAX_ROYALTIES,
};
use crate::rules::{check_fantasy, is_fouled, royalties_for, Board, BOARD_CARDS};

/// Version of the `SavedState` JSON layout.
pub const STATE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which strategy live play reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionPolicy {
    #[default]
    Current,
    Average,
}

impl DecisionPolicy {
    pub fn from_str(s: &str) -> Option<DecisionPolicy> {
        match s.to_lowercase().as_str() {
            "current" => Some(DecisionPolicy::Current),
            "average" | "avg" => Some(DecisionPolicy::Average),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Progressive fantasy (hand size depends on the trigger).
    pub progressive: bool,
    pub seed: u64,
    /// Placements left to decide in a training episode (1..=13).
    pub horizon: usize,
    /// Opponent cards revealed per training episode.
    pub visible_cards: usize,
    pub fantasy_weight: f64,
    pub royalty_weight: f64,
    pub winning_weight: f64,
    pub foul_penalty: f64,
    pub fantasy_bonus: f64,
    pub repeat_fantasy_multiplier: f64,
    pub policy: DecisionPolicy,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            progressive: false,
            seed: 42,
            horizon: 5,
            visible_cards: 5,
            fantasy_weight: 2.0,
            royalty_weight: 1.5,
            winning_weight: 1.0,
            foul_penalty: -1000.0,
            fantasy_bonus: 100.0,
            repeat_fantasy_multiplier: 1.5,
            policy: DecisionPolicy::Current,
        }
    }
}

impl AgentConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> OfcResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn episode_horizon(&self) -> usize {
        self.horizon.clamp(1, BOARD_CARDS)
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// Relative weight of each line in the terminal value and the line outlook.
fn line_importance(line: Line) -> f64 {
    match line {
        Line::Top => 0.20,
        Line::Middle => 0.35,
        Line::Bottom => 0.45,
    }
}

/// Value of a finished board. Fouled (or incomplete) boards get the foul
/// penalty; everything else is at least zero.
pub fn terminal_value(board: &Board, config: &AgentConfig) -> f64 {
    if !board.is_complete() || is_fouled(board) {
        return config.foul_penalty;
    }
    let mut scores = [0.0; 3];
    for line in ALL_LINES {
        scores[line.index()] = match evaluate_line(line, &board.cards(line)) {
            Ok(s) => s,
            Err(_) => return config.foul_penalty,
        };
    }
    let fantasy = check_fantasy(&board.cards(Line::Top)).eligible;
    line_value(scores, royalties_for(board).total(), fantasy, config)
}

/// Terminal value of a legal board from its parts: line scores indexed by
/// `Line::index`, the royalty total and top-line fantasy eligibility.
pub fn line_value(scores: [f64; 3], royalties: i32, fantasy: bool, config: &AgentConfig) -> f64 {
    let mut value: f64 = ALL_LINES
        .iter()
        .map(|&line| line_importance(line) * scores[line.index()] / line.max_score())
        .sum();
    value += royalties as f64;
    if fantasy {
        value += config.fantasy_bonus;
    }
    value
}

/// Normalised strength of a line in `[0, 1]`. Partial lines are scored by
/// the made group they already hold.
fn normalized_line_score(line: Line, cards: &[Card]) -> f64 {
    if cards.is_empty() {
        return 0.0;
    }
    if cards.len() == line.capacity() {
        return evaluate_line(line, cards)
            .map(|s| s / line.max_score())
            .unwrap_or(0.0);
    }

    let mut counts = [0u8; 15];
    for c in cards {
        counts[c.value() as usize] += 1;
    }
    let (best, rank) = (2..=14u8)
        .map(|v| (counts[v as usize], v))
        .max()
        .unwrap_or((0, 2));
    let pairs = counts.iter().filter(|&&n| n == 2).count();
    let idx = (rank - 2) as f64;

    let score = match line {
        Line::Top => match best {
            2 => 5.0 + idx * 0.1,
            _ => idx * 0.1,
        },
        Line::Middle | Line::Bottom => match best {
            4 => 7000.0 + idx * 13.0,
            3 => 3000.0 + idx * 1000.0 / 13.0,
            2 if pairs >= 2 => 2000.0 + idx * 1000.0 / 13.0,
            2 => 1000.0 + idx * 1000.0 / 13.0,
            _ => idx * 1000.0 / 13.0,
        },
    };
    score / line.max_score()
}

/// Outlook of the line a card joins: `-1` if the placement completes a
/// fouled board, otherwise the importance-weighted normalised line score.
fn line_outlook(board: &Board, line: Line) -> f64 {
    if is_fouled(board) {
        return -1.0;
    }
    line_importance(line) * normalized_line_score(line, &board.cards(line))
}

// ---------------------------------------------------------------------------
// Saved state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub info_set: u64,
    pub action: ActionId,
    pub value: f64,
}

/// Everything the agent learns, as written to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    pub version: u32,
    pub progressive: bool,
    #[serde(default)]
    pub episodes: u64,
    pub regret_sum: Vec<TableEntry>,
    pub strategy_sum: Vec<TableEntry>,
    pub remaining_cards: Vec<String>,
}

fn sorted_entries<'a>(
    entries: impl Iterator<Item = (&'a (InfoSetKey, ActionId), &'a f64)>,
) -> OfcResult<Vec<TableEntry>> {
    let mut out = Vec::new();
    for (&(key, action), &value) in entries {
        if !value.is_finite() {
            return Err(OfcError::InvalidStateValue(format!(
                "non-finite value at info set {:016x}, action {}",
                key.0, action
            )));
        }
        out.push(TableEntry {
            info_set: key.0,
            action,
            value,
        });
    }
    out.sort_by(|a, b| (a.info_set, a.action).cmp(&(b.info_set, b.action)));
    Ok(out)
}

fn check_finite(entries: &[TableEntry]) -> OfcResult<()> {
    match entries.iter().find(|e| !e.value.is_finite()) {
        Some(e) => Err(OfcError::InvalidStateValue(format!(
            "non-finite value at info set {:016x}, action {}",
            e.info_set, e.action
        ))),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// A training episode: the board with `horizon` slots left and the cards
/// that will fill them, in order.
struct Episode {
    state: GameState,
    draws: Vec<Card>,
}

pub struct SolverAgent {
    config: AgentConfig,
    tables: RwLock<RegretTables>,
    /// Cards still unseen in the live deal.
    knowledge: RwLock<CardSet>,
    episodes: AtomicU64,
}

impl SolverAgent {
    pub fn new(config: AgentConfig) -> Self {
        SolverAgent {
            config,
            tables: RwLock::new(RegretTables::new()),
            knowledge: RwLock::new(CardSet::full()),
            episodes: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn is_progressive(&self) -> bool {
        self.config.progressive
    }

    /// Episodes trained so far, across every `train` call.
    pub fn episodes(&self) -> u64 {
        self.episodes.load(Ordering::SeqCst)
    }

    /// Copy of the current tables.
    pub fn tables(&self) -> RegretTables {
        read(&self.tables).clone()
    }

    pub fn info_set_count(&self) -> usize {
        read(&self.tables).info_set_count()
    }

    // -- card knowledge ----------------------------------------------------

    /// Mark cards as seen for the current deal. Removal only.
    pub fn update_cards_knowledge(&self, cards: &[Card]) {
        let mut known = write(&self.knowledge);
        for &c in cards {
            known.remove(c);
        }
    }

    /// Forget the previous deal's knowledge.
    pub fn new_deal(&self) {
        *write(&self.knowledge) = CardSet::full();
    }

    pub fn remaining_cards(&self) -> CardSet {
        *read(&self.knowledge)
    }

    /// Cards that can still arrive: the live knowledge minus everything
    /// `state` already shows.
    pub fn available_cards(&self, state: &GameState) -> CardSet {
        self.remaining_cards().difference(state.known_cards())
    }

    // -- decisions ---------------------------------------------------------

    fn info_set(&self, state: &GameState) -> InfoSetKey {
        InfoSetKey::new(&state.board, &state.visible, state.fantasy_mode, self.config.progressive)
    }

    /// Legal placements with the probability the configured policy gives
    /// each one.
    pub fn strategy_for(&self, state: &GameState) -> Vec<(Placement, f64)> {
        let placements = state.legal_placements();
        let actions: Vec<ActionId> = placements.iter().map(|p| p.action_id()).collect();
        let key = self.info_set(state);
        let tables = read(&self.tables);
        let probs = match self.config.policy {
            DecisionPolicy::Current => tables.current_strategy(key, &actions),
            DecisionPolicy::Average => tables.average_strategy(key, &actions),
        };
        placements.into_iter().zip(probs).collect()
    }

    /// Heuristic score of one placement given its strategy probability.
    pub fn action_score(&self, state: &GameState, placement: Placement, prob: f64) -> f64 {
        let next = state.board.with(placement.card, placement.line);
        let outlook = line_outlook(&next, placement.line);
        // a fouled board collects neither royalties nor fantasy
        let (fantasy, royalty) = if is_fouled(&next) {
            (0.0, 0.0)
        } else {
            let remaining = self.available_cards(state);
            (
                fantasy_potential(&next.cards(Line::Top), &remaining),
                royalties_for(&next).total() as f64 / MAX_ROYALTIES,
            )
        };

        prob + self.config.fantasy_weight * fantasy
            + self.config.royalty_weight * royalty
            + self.config.winning_weight * outlook
    }

    /// Best decision for `state`: a fantasy arrangement in fantasy mode,
    /// otherwise a single placement. `Ok(None)` when nothing is legal.
    ///
    /// A fantasy hand must match the agent's variant and hold exactly the
    /// number of cards its trigger entitles.
    pub fn get_action(&self, state: &GameState) -> OfcResult<Option<Decision>> {
        validate_state(state)?;

        if state.fantasy_mode {
            if state.progressive != self.config.progressive {
                return Err(OfcError::VariantMismatch {
                    found: state.progressive,
                    expected: self.config.progressive,
                });
            }
            let entitled = state.fantasy_hand_size();
            if state.hand.len() != entitled {
                return Err(OfcError::FantasyHandSize {
                    expected: entitled,
                    got: state.hand.len(),
                });
            }
            return Ok(solve_fantasy(&state.hand, &self.config).map(Decision::Arrange));
        }

        let mut best: Option<(Placement, f64)> = None;
        for (placement, prob) in self.strategy_for(state) {
            let score = self.action_score(state, placement, prob);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((placement, score));
            }
        }
        Ok(best.map(|(p, _)| Decision::Place(p)))
    }

    // -- training ----------------------------------------------------------

    fn synthetic_episode(&self, episode: u64) -> Episode {
        let seed = self.config.seed ^ episode.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut deck = Deck::new(None);
        deck.shuffle_with(&mut rng);
        let mut cards = deck.cards.into_iter();

        let horizon = self.config.episode_horizon();
        let mut slots: Vec<Line> = ALL_LINES
            .iter()
            .flat_map(|&l| std::iter::repeat(l).take(l.capacity()))
            .collect();
        slots.shuffle(&mut rng);

        let mut board = Board::new();
        for &line in slots.iter().take(BOARD_CARDS - horizon) {
            if let Some(card) = cards.next() {
                board = board.with(card, line);
            }
        }
        let draws: Vec<Card> = cards.by_ref().take(horizon).collect();
        let visible: Vec<Card> = cards.take(self.config.visible_cards).collect();

        let mut state = GameState::new(board, Vec::new()).with_visible(&visible);
        state.progressive = self.config.progressive;
        Episode { state, draws }
    }

    /// Recursive CFR: reads the strategy from `tables`, accumulates into
    /// `delta`, returns the node utility.
    fn cfr(
        &self,
        tables: &RegretTables,
        delta: &mut RegretTables,
        state: &GameState,
        draws: &[Card],
        reach: f64,
    ) -> f64 {
        if state.is_terminal() {
            return terminal_value(&state.board, &self.config);
        }
        let Some((&card, rest)) = draws.split_first() else {
            return self.config.foul_penalty;
        };

        let mut node = state.clone();
        node.hand = vec![card];
        let placements = node.legal_placements();
        if placements.is_empty() {
            return self.config.foul_penalty;
        }

        let key = self.info_set(&node);
        let actions: Vec<ActionId> = placements.iter().map(|p| p.action_id()).collect();
        let strategy = tables.current_strategy(key, &actions);

        let mut values = vec![0.0; placements.len()];
        let mut node_value = 0.0;
        for (i, &placement) in placements.iter().enumerate() {
            let child = node.apply(placement);
            values[i] = self.cfr(tables, delta, &child, rest, reach * strategy[i]);
            node_value += strategy[i] * values[i];
        }

        delta.update(key, &actions, &strategy, &values, node_value, reach);
        node_value
    }

    fn run_episode(&self, tables: &RegretTables, delta: &mut RegretTables, episode: u64) -> f64 {
        let Episode { state, draws } = self.synthetic_episode(episode);
        self.cfr(tables, delta, &state, &draws, 1.0)
    }

    /// Run `iterations` episodes one after another. Returns the mean root
    /// utility.
    pub fn train(&self, iterations: usize) -> f64 {
        let mut total = 0.0;
        for _ in 0..iterations {
            let episode = self.episodes.fetch_add(1, Ordering::SeqCst);
            let mut delta = RegretTables::new();
            let utility = {
                let tables = read(&self.tables);
                self.run_episode(&tables, &mut delta, episode)
            };
            write(&self.tables).merge(&delta);
            total += utility;
        }
        log::debug!("{:<32}{:<16}", "trained episodes", iterations);
        if iterations == 0 {
            0.0
        } else {
            total / iterations as f64
        }
    }

    /// Run a batch of episodes on rayon workers against one snapshot of the
    /// tables, then merge every worker's delta under a single write lock.
    pub fn train_parallel(&self, iterations: usize) -> f64 {
        if iterations == 0 {
            return 0.0;
        }
        let base = self.episodes.fetch_add(iterations as u64, Ordering::SeqCst);
        let (delta, total) = {
            let tables = read(&self.tables);
            let snapshot: &RegretTables = &tables;
            (0..iterations as u64)
                .into_par_iter()
                .fold(
                    || (RegretTables::new(), 0.0),
                    |(mut delta, total), i| {
                        let utility = self.run_episode(snapshot, &mut delta, base + i);
                        (delta, total + utility)
                    },
                )
                .reduce(
                    || (RegretTables::new(), 0.0),
                    |(mut a, ta), (b, tb)| {
                        a.merge(&b);
                        (a, ta + tb)
                    },
                )
        };
        write(&self.tables).merge(&delta);
        log::debug!("{:<32}{:<16}", "trained parallel batch", iterations);
        total / iterations as f64
    }

    // -- persistence -------------------------------------------------------

    pub fn snapshot(&self) -> OfcResult<SavedState> {
        let tables = read(&self.tables);
        Ok(SavedState {
            version: STATE_VERSION,
            progressive: self.config.progressive,
            episodes: self.episodes(),
            regret_sum: sorted_entries(tables.regret_entries())?,
            strategy_sum: sorted_entries(tables.strategy_entries())?,
            remaining_cards: self.remaining_cards().cards().iter().map(|c| c.to_string()).collect(),
        })
    }

    pub fn save_state(&self) -> OfcResult<String> {
        Ok(serde_json::to_string(&self.snapshot()?)?)
    }

    /// Replace tables, episode count and card knowledge with `saved`.
    /// Nothing changes if validation fails.
    pub fn restore(&self, saved: SavedState) -> OfcResult<()> {
        if saved.version != STATE_VERSION {
            return Err(OfcError::UnsupportedStateVersion {
                found: saved.version,
                expected: STATE_VERSION,
            });
        }
        if saved.progressive != self.config.progressive {
            return Err(OfcError::VariantMismatch {
                found: saved.progressive,
                expected: self.config.progressive,
            });
        }
        check_finite(&saved.regret_sum)?;
        check_finite(&saved.strategy_sum)?;

        let mut remaining = CardSet::empty();
        for s in &saved.remaining_cards {
            remaining.insert(parse_card(s)?);
        }

        let mut tables = RegretTables::new();
        for e in &saved.regret_sum {
            tables.insert_regret(InfoSetKey(e.info_set), e.action, e.value);
        }
        for e in &saved.strategy_sum {
            tables.insert_strategy(InfoSetKey(e.info_set), e.action, e.value);
        }

        *write(&self.tables) = tables;
        *write(&self.knowledge) = remaining;
        self.episodes.store(saved.episodes, Ordering::SeqCst);
        Ok(())
    }

    pub fn load_state(&self, json: &str) -> OfcResult<()> {
        let saved: SavedState = serde_json::from_str(json)?;
        self.restore(saved)
    }
}

/// Hand cards must be distinct and not already on the board.
fn validate_state(state: &GameState) -> OfcResult<()> {
    let mut seen = state.board.used();
    for &c in &state.hand {
        if seen.contains(c) {
            return Err(OfcError::DuplicateCard(c.to_string()));
        }
        seen.insert(c);
    }
    Ok(())
}
