//! Exhaustive fantasy-mode arrangement.
//!
//! The whole hand is known up front, so the best board is found by brute
//! force: every 5-card bottom, every 5-card middle of the rest that does not
//! outrank it, every 3-card top of what is left that does not outrank the
//! middle. Every 3- and 5-card subset of the hand is evaluated once into a
//! table indexed by its bitmask, so the search itself only does lookups.
//! Bottoms are split across rayon workers.

use itertools::Itertools;
use rayon::prelude::*;

use crate::agent::{line_value, AgentConfig};
use crate::cards::Card;
use crate::hand_evaluator::{
    bonus_for, evaluate_bottom, evaluate_middle, evaluate_top, line_strength, Line,
};
use crate::rules::{check_fantasy, royalties_for, Board, Royalties};

pub const MIN_FANTASY_HAND: usize = 13;
pub const MAX_FANTASY_HAND: usize = 17;

/// A complete fantasy board and what it is worth.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    pub board: Board,
    pub discards: Vec<Card>,
    pub royalties: Royalties,
    /// Top line qualifies for fantasy again.
    pub repeat_fantasy: bool,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct FiveCards {
    key: u32,
    middle_score: f64,
    middle_royalty: i32,
    bottom_score: f64,
    bottom_royalty: i32,
}

#[derive(Debug, Clone, Copy, Default)]
struct ThreeCards {
    key: u32,
    score: f64,
    royalty: i32,
    repeat: bool,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    top: u32,
    middle: u32,
    bottom: u32,
    value: f64,
}

/// Per-hand lookup tables. Masks are over hand positions.
struct SearchTables {
    five: Vec<FiveCards>,
    three: Vec<ThreeCards>,
    bottoms: Vec<u32>,
    /// 5-of-(n-5) patterns over the cards left after the bottom.
    middle_patterns: Vec<u32>,
    /// 3-of-(n-10) patterns over the cards left after the middle.
    top_patterns: Vec<u32>,
}

fn mask_of(indices: &[usize]) -> u32 {
    indices.iter().fold(0, |mask, &i| mask | 1 << i)
}

fn pick(hand: &[Card], mask: u32) -> Vec<Card> {
    (0..hand.len())
        .filter(|&i| mask >> i & 1 == 1)
        .map(|i| hand[i])
        .collect()
}

/// Positions of the set bits of `mask`, lowest first.
fn positions(mask: u32) -> Vec<u32> {
    (0..u32::BITS).filter(|&i| mask >> i & 1 == 1).collect()
}

/// Spread a pattern over `positions`: bit `i` of the pattern selects
/// `positions[i]`.
fn deposit(pattern: u32, positions: &[u32]) -> u32 {
    let mut mask = 0;
    let mut bits = pattern;
    while bits != 0 {
        mask |= 1 << positions[bits.trailing_zeros() as usize];
        bits &= bits - 1;
    }
    mask
}

fn patterns(n: usize, k: usize) -> Vec<u32> {
    (0..n).combinations(k).map(|idx| mask_of(&idx)).collect()
}

impl SearchTables {
    fn build(hand: &[Card]) -> SearchTables {
        let n = hand.len();
        let mut five = vec![FiveCards::default(); 1 << n];
        let mut three = vec![ThreeCards::default(); 1 << n];
        let mut bottoms = Vec::new();

        for idx in (0..n).combinations(Line::Bottom.capacity()) {
            let cards: Vec<Card> = idx.iter().map(|&i| hand[i]).collect();
            let Some(strength) = line_strength(&cards) else {
                continue;
            };
            let middle_score = evaluate_middle(&cards);
            let bottom_score = evaluate_bottom(&cards);
            let mask = mask_of(&idx);
            five[mask as usize] = FiveCards {
                key: strength.key(),
                middle_score,
                middle_royalty: bonus_for(Line::Middle, middle_score),
                bottom_score,
                bottom_royalty: bonus_for(Line::Bottom, bottom_score),
            };
            bottoms.push(mask);
        }

        for idx in (0..n).combinations(Line::Top.capacity()) {
            let cards: Vec<Card> = idx.iter().map(|&i| hand[i]).collect();
            let Some(strength) = line_strength(&cards) else {
                continue;
            };
            let score = evaluate_top(&cards);
            three[mask_of(&idx) as usize] = ThreeCards {
                key: strength.key(),
                score,
                royalty: bonus_for(Line::Top, score),
                repeat: check_fantasy(&cards).eligible,
            };
        }

        SearchTables {
            five,
            three,
            bottoms,
            middle_patterns: patterns(n - Line::Bottom.capacity(), Line::Middle.capacity()),
            top_patterns: patterns(
                n - Line::Bottom.capacity() - Line::Middle.capacity(),
                Line::Top.capacity(),
            ),
        }
    }

    fn best_for_bottom(&self, full: u32, bottom: u32, config: &AgentConfig) -> Option<Candidate> {
        let b = self.five[bottom as usize];
        let rest = positions(full & !bottom);

        let mut best: Option<Candidate> = None;
        for &middle_pattern in &self.middle_patterns {
            let middle = deposit(middle_pattern, &rest);
            let m = self.five[middle as usize];
            if m.key > b.key {
                continue;
            }
            let left = positions(full & !bottom & !middle);

            for &top_pattern in &self.top_patterns {
                let top = deposit(top_pattern, &left);
                let t = self.three[top as usize];
                if t.key > m.key {
                    continue;
                }
                let mut value = line_value(
                    [t.score, m.middle_score, b.bottom_score],
                    t.royalty + m.middle_royalty + b.bottom_royalty,
                    t.repeat,
                    config,
                );
                if t.repeat {
                    value *= config.repeat_fantasy_multiplier;
                }
                if best.map_or(true, |c| value > c.value) {
                    best = Some(Candidate {
                        top,
                        middle,
                        bottom,
                        value,
                    });
                }
            }
        }
        best
    }
}

/// Best legal arrangement of `hand`, or `None` when the hand size is outside
/// 13..=17 or no ordering of it is legal.
pub fn solve_fantasy(hand: &[Card], config: &AgentConfig) -> Option<Arrangement> {
    let n = hand.len();
    if !(MIN_FANTASY_HAND..=MAX_FANTASY_HAND).contains(&n) {
        return None;
    }

    let tables = SearchTables::build(hand);
    let full: u32 = (1 << n) - 1;
    let best = tables
        .bottoms
        .par_iter()
        .filter_map(|&bottom| tables.best_for_bottom(full, bottom, config))
        .max_by(|a, b| a.value.total_cmp(&b.value))?;

    let board = Board::from_lines(
        &pick(hand, best.top),
        &pick(hand, best.middle),
        &pick(hand, best.bottom),
    )
    .ok()?;
    Some(Arrangement {
        board,
        discards: pick(hand, full & !(best.top | best.middle | best.bottom)),
        royalties: royalties_for(&board),
        repeat_fantasy: tables.three[best.top as usize].repeat,
        value: best.value,
    })
}
