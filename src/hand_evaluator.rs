//! Line evaluation for Open-Face Chinese Poker.
//!
//! Two views of the same hand are exposed:
//!
//! * a numeric *score* per line (`evaluate_top`, `evaluate_middle`,
//!   `evaluate_bottom`) with disjoint category bands, used for royalties and
//!   for the solver's terminal value;
//! * a `HandResult` (category + kickers) from `line_strength`, used whenever
//!   two lines are compared, including top against middle.
//!
//! Top scores (3 cards): trips `10 + idx`, pair `5 + idx * 0.1`, high card
//! `idx * 0.1`, where idx is the rank index `2..A -> 0..12`.
//!
//! Five-card bands: straight flush 8000 (royal 9000), quads 7000, full house
//! 6000, flush 5000, straight 4000, trips 3000, two pair 2000, pair 1000,
//! high card 0. Intra-band tiebreaks never reach the next band.

use std::cmp::Ordering;
use std::fmt;

use crate::cards::{Card, CardSet, Rank};
use crate::error::{OfcError, OfcResult};

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Line {
    Top,
    Middle,
    Bottom,
}

pub const ALL_LINES: [Line; 3] = [Line::Top, Line::Middle, Line::Bottom];

impl Line {
    /// Number of cards a complete line holds.
    pub fn capacity(self) -> usize {
        match self {
            Line::Top => 3,
            Line::Middle | Line::Bottom => 5,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Line::Top => 0,
            Line::Middle => 1,
            Line::Bottom => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Line> {
        ALL_LINES.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Line::Top => "top",
            Line::Middle => "middle",
            Line::Bottom => "bottom",
        }
    }

    pub fn from_str(s: &str) -> Option<Line> {
        match s.to_lowercase().as_str() {
            "top" | "t" => Some(Line::Top),
            "middle" | "mid" | "m" => Some(Line::Middle),
            "bottom" | "bot" | "b" => Some(Line::Bottom),
            _ => None,
        }
    }

    /// Largest score the line can reach; used to normalise terminal values.
    pub fn max_score(self) -> f64 {
        match self {
            Line::Top => MAX_TOP_SCORE,
            Line::Middle | Line::Bottom => MAX_FIVE_SCORE,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub const MAX_TOP_SCORE: f64 = 22.0;
pub const MAX_FIVE_SCORE: f64 = 9100.0;

// ---------------------------------------------------------------------------
// Categories and comparable strength
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandCategory {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
    RoyalFlush = 9,
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandCategory::HighCard => write!(f, "High Card"),
            HandCategory::OnePair => write!(f, "One Pair"),
            HandCategory::TwoPair => write!(f, "Two Pair"),
            HandCategory::ThreeOfAKind => write!(f, "Three of a Kind"),
            HandCategory::Straight => write!(f, "Straight"),
            HandCategory::Flush => write!(f, "Flush"),
            HandCategory::FullHouse => write!(f, "Full House"),
            HandCategory::FourOfAKind => write!(f, "Four of a Kind"),
            HandCategory::StraightFlush => write!(f, "Straight Flush"),
            HandCategory::RoyalFlush => write!(f, "Royal Flush"),
        }
    }
}

/// Category plus ordered kicker values (2..=14), most significant first.
///
/// Three-card lines land on the same scale: high card, pair and trips map to
/// `HighCard`, `OnePair` and `ThreeOfAKind`. Kicker vectors compare
/// lexicographically, so a top line whose ranks match the first ranks of a
/// middle line is never the stronger of the two.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct HandResult {
    pub category: HandCategory,
    pub kickers: Vec<u8>,
}

impl HandResult {
    pub fn new(category: HandCategory, kickers: Vec<u8>) -> Self {
        HandResult { category, kickers }
    }

    /// Category and kickers packed into one integer that orders exactly
    /// like `HandResult` itself. Missing kickers pad with 0, below any rank.
    pub fn key(&self) -> u32 {
        let mut key = self.category as u32;
        for i in 0..5 {
            key = key * 15 + self.kickers.get(i).copied().unwrap_or(0) as u32;
        }
        key
    }
}

impl fmt::Display for HandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.category)
    }
}

fn is_flush(cards: &[Card]) -> bool {
    cards.windows(2).all(|w| w[0].suit == w[1].suit)
}

/// High card of a straight, 5 for the wheel.
fn is_straight(values: &[u8]) -> Option<u8> {
    let mut unique: Vec<u8> = values.to_vec();
    unique.sort_unstable_by(|a, b| b.cmp(a));
    unique.dedup();

    if unique.len() != 5 {
        return None;
    }
    if unique[0] - unique[4] == 4 {
        return Some(unique[0]);
    }
    // Wheel: A-2-3-4-5
    if unique == [14, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}

/// (count, value) groups sorted by count desc, then value desc.
fn rank_groups(values: &[u8]) -> Vec<(u8, u8)> {
    let mut counts = [0u8; 15];
    for &v in values {
        counts[v as usize] += 1;
    }
    let mut freq: Vec<(u8, u8)> = (2..=14u8)
        .rev()
        .filter(|&v| counts[v as usize] > 0)
        .map(|v| (counts[v as usize], v))
        .collect();
    freq.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
    freq
}

fn evaluate_five(cards: &[Card]) -> HandResult {
    let mut values: Vec<u8> = cards.iter().map(|c| c.value()).collect();
    values.sort_unstable_by(|a, b| b.cmp(a));

    let flush = is_flush(cards);
    let straight_high = is_straight(&values);

    if let (true, Some(high)) = (flush, straight_high) {
        if high == 14 {
            return HandResult::new(HandCategory::RoyalFlush, vec![14]);
        }
        return HandResult::new(HandCategory::StraightFlush, vec![high]);
    }

    let freq = rank_groups(&values);
    let grouped: Vec<u8> = freq.iter().map(|&(_, v)| v).collect();

    if freq[0].0 == 4 {
        return HandResult::new(HandCategory::FourOfAKind, grouped);
    }
    if freq[0].0 == 3 && freq[1].0 == 2 {
        return HandResult::new(HandCategory::FullHouse, grouped);
    }
    if flush {
        return HandResult::new(HandCategory::Flush, values);
    }
    if let Some(high) = straight_high {
        return HandResult::new(HandCategory::Straight, vec![high]);
    }
    if freq[0].0 == 3 {
        return HandResult::new(HandCategory::ThreeOfAKind, grouped);
    }
    if freq[0].0 == 2 && freq[1].0 == 2 {
        return HandResult::new(HandCategory::TwoPair, grouped);
    }
    if freq[0].0 == 2 {
        return HandResult::new(HandCategory::OnePair, grouped);
    }
    HandResult::new(HandCategory::HighCard, values)
}

fn evaluate_three(cards: &[Card]) -> HandResult {
    let values: Vec<u8> = cards.iter().map(|c| c.value()).collect();
    let freq = rank_groups(&values);
    let grouped: Vec<u8> = freq.iter().map(|&(_, v)| v).collect();
    match freq[0].0 {
        3 => HandResult::new(HandCategory::ThreeOfAKind, grouped),
        2 => HandResult::new(HandCategory::OnePair, grouped),
        _ => HandResult::new(HandCategory::HighCard, grouped),
    }
}

/// Comparable strength of a complete line (3 or 5 cards).
pub fn line_strength(cards: &[Card]) -> Option<HandResult> {
    match cards.len() {
        3 => Some(evaluate_three(cards)),
        5 => Some(evaluate_five(cards)),
        _ => None,
    }
}

/// Order two complete lines of any size. Incomplete lines compare as equal.
pub fn compare_lines(a: &[Card], b: &[Card]) -> Ordering {
    match (line_strength(a), line_strength(b)) {
        (Some(ra), Some(rb)) => ra.cmp(&rb),
        _ => Ordering::Equal,
    }
}

// ---------------------------------------------------------------------------
// Numeric scores
// ---------------------------------------------------------------------------

const ROYAL_BASE: f64 = 9000.0;
const MIDDLE_FLUSH_OFFSET: f64 = 1.5;
const BOTTOM_FLUSH_OFFSET: f64 = 1.0;

#[inline]
fn idx(value: u8) -> f64 {
    (value - 2) as f64
}

/// Base-13 positional encoding of rank indices, most significant first,
/// scaled into `[0, 1000)`.
fn positional(values: &[u8]) -> f64 {
    let mut code = 0.0;
    for &v in values {
        code = code * 13.0 + idx(v);
    }
    code * 1000.0 / 13f64.powi(values.len() as i32)
}

fn five_card_score(result: &HandResult, is_middle: bool) -> f64 {
    let offset = if is_middle { MIDDLE_FLUSH_OFFSET } else { BOTTOM_FLUSH_OFFSET };
    let k = &result.kickers;
    match result.category {
        HandCategory::RoyalFlush => ROYAL_BASE + offset,
        HandCategory::StraightFlush => 8000.0 + idx(k[0]) + offset,
        HandCategory::FourOfAKind => 7000.0 + idx(k[0]) * 13.0 + idx(k[1]),
        HandCategory::FullHouse => 6000.0 + idx(k[0]) * 13.0 + idx(k[1]),
        HandCategory::Flush => 5000.0 + positional(k),
        HandCategory::Straight => 4000.0 + idx(k[0]),
        HandCategory::ThreeOfAKind => 3000.0 + positional(k),
        HandCategory::TwoPair => 2000.0 + positional(k),
        HandCategory::OnePair => 1000.0 + positional(k),
        HandCategory::HighCard => positional(k),
    }
}

/// Top-line score. Anything but 3 cards returns the `0.0` sentinel.
pub fn evaluate_top(cards: &[Card]) -> f64 {
    if cards.len() != 3 {
        return 0.0;
    }
    let result = evaluate_three(cards);
    let primary = idx(result.kickers[0]);
    match result.category {
        HandCategory::ThreeOfAKind => 10.0 + primary,
        HandCategory::OnePair => 5.0 + primary * 0.1,
        _ => primary * 0.1,
    }
}

/// Middle-line score. Anything but 5 cards returns the `0.0` sentinel.
pub fn evaluate_middle(cards: &[Card]) -> f64 {
    if cards.len() != 5 {
        return 0.0;
    }
    five_card_score(&evaluate_five(cards), true)
}

/// Bottom-line score. Anything but 5 cards returns the `0.0` sentinel.
pub fn evaluate_bottom(cards: &[Card]) -> f64 {
    if cards.len() != 5 {
        return 0.0;
    }
    five_card_score(&evaluate_five(cards), false)
}

/// Checked evaluation: a wrong card count is a caller error, not a weak hand.
pub fn evaluate_line(line: Line, cards: &[Card]) -> OfcResult<f64> {
    if cards.len() != line.capacity() {
        return Err(OfcError::MalformedHand {
            line: line.as_str(),
            expected: line.capacity(),
            got: cards.len(),
        });
    }
    Ok(match line {
        Line::Top => evaluate_top(cards),
        Line::Middle => evaluate_middle(cards),
        Line::Bottom => evaluate_bottom(cards),
    })
}

// ---------------------------------------------------------------------------
// Royalties
// ---------------------------------------------------------------------------

/// Royalty points for a line score. Scores below a line's threshold earn 0.
pub fn bonus_for(line: Line, score: f64) -> i32 {
    match line {
        Line::Top => {
            if score >= 10.0 {
                // trips: 222 -> 10 .. AAA -> 22
                score.floor() as i32
            } else if score >= 5.0 {
                // pair: 66 -> 1 .. AA -> 9
                let pair_index = ((score - 5.0) * 10.0).round() as i32;
                (pair_index - 3).max(0)
            } else {
                0
            }
        }
        Line::Middle => match score {
            s if s >= 9000.0 => 50,
            s if s >= 8000.0 => 30,
            s if s >= 7000.0 => 20,
            s if s >= 6000.0 => 12,
            s if s >= 5000.0 => 8,
            s if s >= 4000.0 => 4,
            s if s >= 3000.0 => 2,
            _ => 0,
        },
        Line::Bottom => match score {
            s if s >= 9000.0 => 25,
            s if s >= 8000.0 => 15,
            s if s >= 7000.0 => 10,
            s if s >= 6000.0 => 6,
            s if s >= 5000.0 => 4,
            s if s >= 4000.0 => 2,
            _ => 0,
        },
    }
}

/// Largest royalty total a single board can collect (AAA + middle royal +
/// bottom royal).
pub const MAX_ROYALTIES: f64 = 97.0;

// ---------------------------------------------------------------------------
// Fantasy potential
// ---------------------------------------------------------------------------

/// How close a (possibly partial) top line is to unlocking fantasy, in
/// `[0, 1]`. `remaining` is the set of cards still unseen.
///
/// This is a search heuristic only. Legality lives in `rules::check_fantasy`.
pub fn fantasy_potential(top: &[Card], remaining: &CardSet) -> f64 {
    if top.is_empty() {
        return 0.0;
    }

    let mut counts = [0usize; 15];
    for c in top {
        counts[c.value() as usize] += 1;
    }

    if counts.iter().any(|&n| n >= 3) {
        return 1.0;
    }
    if counts[Rank::Ace.value() as usize] >= 2 {
        return 0.9;
    }
    if counts[Rank::King.value() as usize] >= 2 {
        return 0.8;
    }
    if counts[Rank::Queen.value() as usize] >= 2 {
        return 0.7;
    }
    if top.len() >= 3 {
        return 0.0;
    }

    let mut potential: f64 = 0.0;
    for c in top {
        let left = remaining.count_rank(c.rank) as f64;
        if counts[c.value() as usize] == 2 {
            potential = potential.max(0.8 * left / 4.0);
        } else if c.rank >= Rank::Queen {
            potential = potential.max(0.5 * left / 4.0);
        }
    }
    potential
}
