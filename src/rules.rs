//! Pineapple OFC rules: boards, legality, fantasy eligibility, royalties and
//! head-to-head scoring.

use std::cmp::Ordering;
use std::fmt;

use crate::cards::{format_cards, parse_cards, Card, CardSet, Rank};
use crate::error::{OfcError, OfcResult};
use crate::hand_evaluator::{
    bonus_for, compare_lines, evaluate_line, Line, ALL_LINES,
};

/// Points for winning all three lines, on top of the three line points.
pub const SWEEP_BONUS: i32 = 3;

/// Cards on a complete board.
pub const BOARD_CARDS: usize = 13;

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// One player's three lines. Lines are unordered sets, so each one is a
/// bitset and the whole board is a small `Copy` value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Board {
    lines: [CardSet; 3],
}

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    pub fn from_lines(top: &[Card], middle: &[Card], bottom: &[Card]) -> OfcResult<Self> {
        let mut board = Board::new();
        for (line, cards) in [(Line::Top, top), (Line::Middle, middle), (Line::Bottom, bottom)] {
            for &card in cards {
                board.place(card, line)?;
            }
        }
        Ok(board)
    }

    /// Parse `"top/middle/bottom"`, e.g. `"QsQc7d/2h3h4h5h6h/AsAdAcKsKd"`.
    /// Lines may be partial or empty.
    pub fn parse(notation: &str) -> OfcResult<Self> {
        let parts: Vec<&str> = notation.split('/').collect();
        if parts.len() != 3 {
            return Err(OfcError::InvalidBoardNotation(notation.to_string()));
        }
        Board::from_lines(
            &parse_cards(parts[0])?,
            &parse_cards(parts[1])?,
            &parse_cards(parts[2])?,
        )
    }

    pub fn place(&mut self, card: Card, line: Line) -> OfcResult<()> {
        if self.used().contains(card) {
            return Err(OfcError::DuplicateCard(card.to_string()));
        }
        if !self.can_place(line) {
            return Err(OfcError::LineFull(line.as_str()));
        }
        self.lines[line.index()].insert(card);
        Ok(())
    }

    /// Copy of the board with `card` added to `line`. Callers must check
    /// `can_place` first.
    pub fn with(&self, card: Card, line: Line) -> Board {
        let mut next = *self;
        next.lines[line.index()].insert(card);
        next
    }

    pub fn can_place(&self, line: Line) -> bool {
        self.count(line) < line.capacity()
    }

    pub fn count(&self, line: Line) -> usize {
        self.lines[line.index()].len()
    }

    pub fn line_set(&self, line: Line) -> CardSet {
        self.lines[line.index()]
    }

    pub fn cards(&self, line: Line) -> Vec<Card> {
        self.lines[line.index()].cards()
    }

    pub fn used(&self) -> CardSet {
        self.lines[0].union(self.lines[1]).union(self.lines[2])
    }

    pub fn placed(&self) -> usize {
        self.lines.iter().map(|l| l.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.placed() == 0
    }

    pub fn is_complete(&self) -> bool {
        ALL_LINES.iter().all(|&l| self.count(l) == l.capacity())
    }

    pub fn open_lines(&self) -> Vec<Line> {
        ALL_LINES.iter().copied().filter(|&l| self.can_place(l)).collect()
    }

    /// Remaining slots across all lines.
    pub fn open_slots(&self) -> usize {
        ALL_LINES.iter().map(|&l| l.capacity() - self.count(l).min(l.capacity())).sum()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            format_cards(&self.cards(Line::Top)),
            format_cards(&self.cards(Line::Middle)),
            format_cards(&self.cards(Line::Bottom))
        )
    }
}

// ---------------------------------------------------------------------------
// Legality
// ---------------------------------------------------------------------------

/// An in-progress board is valid while no line is over capacity. A complete
/// board is valid iff top <= middle <= bottom. Lines are compared by
/// category tier and kickers, never by raw score: a 3-card score and a
/// 5-card score do not live on the same scale.
pub fn is_valid_board(board: &Board) -> bool {
    if ALL_LINES.iter().any(|&l| board.count(l) > l.capacity()) {
        return false;
    }
    if !board.is_complete() {
        return true;
    }
    let top = board.cards(Line::Top);
    let middle = board.cards(Line::Middle);
    let bottom = board.cards(Line::Bottom);
    compare_lines(&top, &middle) != Ordering::Greater
        && compare_lines(&middle, &bottom) != Ordering::Greater
}

/// Complete and out of order.
pub fn is_fouled(board: &Board) -> bool {
    board.is_complete() && !is_valid_board(board)
}

// ---------------------------------------------------------------------------
// Fantasy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FantasyCategory {
    Queens,
    Kings,
    Aces,
    Trips(Rank),
}

impl FantasyCategory {
    /// Cards dealt in progressive fantasy for this trigger.
    pub fn extra_cards(self) -> usize {
        match self {
            FantasyCategory::Queens => 14,
            FantasyCategory::Kings => 15,
            FantasyCategory::Aces => 16,
            FantasyCategory::Trips(_) => 17,
        }
    }

    pub fn from_str(s: &str) -> Option<FantasyCategory> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "QQ" => Some(FantasyCategory::Queens),
            "KK" => Some(FantasyCategory::Kings),
            "AA" => Some(FantasyCategory::Aces),
            _ => {
                let chars: Vec<char> = upper.chars().collect();
                if chars.len() == 3 && chars.iter().all(|&c| c == chars[0]) {
                    Rank::from_char(chars[0]).ok().map(FantasyCategory::Trips)
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for FantasyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FantasyCategory::Queens => write!(f, "QQ"),
            FantasyCategory::Kings => write!(f, "KK"),
            FantasyCategory::Aces => write!(f, "AA"),
            FantasyCategory::Trips(r) => {
                let c = r.to_char();
                write!(f, "{}{}{}", c, c, c)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FantasyStatus {
    pub eligible: bool,
    pub category: Option<FantasyCategory>,
    pub extra_cards: usize,
}

impl FantasyStatus {
    fn none() -> Self {
        FantasyStatus {
            eligible: false,
            category: None,
            extra_cards: 0,
        }
    }
}

/// Fantasy eligibility of a complete top line. Trips beat AA beat KK beat QQ.
pub fn check_fantasy(top: &[Card]) -> FantasyStatus {
    if top.len() != 3 {
        return FantasyStatus::none();
    }
    let mut counts = [0usize; 15];
    for c in top {
        counts[c.value() as usize] += 1;
    }

    let category = if let Some(c) = top.iter().find(|c| counts[c.value() as usize] == 3) {
        Some(FantasyCategory::Trips(c.rank))
    } else if counts[Rank::Ace.value() as usize] == 2 {
        Some(FantasyCategory::Aces)
    } else if counts[Rank::King.value() as usize] == 2 {
        Some(FantasyCategory::Kings)
    } else if counts[Rank::Queen.value() as usize] == 2 {
        Some(FantasyCategory::Queens)
    } else {
        None
    };

    match category {
        Some(cat) => FantasyStatus {
            eligible: true,
            category: Some(cat),
            extra_cards: cat.extra_cards(),
        },
        None => FantasyStatus::none(),
    }
}

// ---------------------------------------------------------------------------
// Royalties
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Royalties {
    pub top: i32,
    pub middle: i32,
    pub bottom: i32,
}

impl Royalties {
    pub fn total(&self) -> i32 {
        self.top + self.middle + self.bottom
    }

    pub fn get(&self, line: Line) -> i32 {
        match line {
            Line::Top => self.top,
            Line::Middle => self.middle,
            Line::Bottom => self.bottom,
        }
    }
}

/// Per-line royalties. Lines are independent; an incomplete line earns 0.
pub fn royalties_for(board: &Board) -> Royalties {
    let line_bonus = |line: Line| {
        evaluate_line(line, &board.cards(line))
            .map(|score| bonus_for(line, score))
            .unwrap_or(0)
    };
    Royalties {
        top: line_bonus(Line::Top),
        middle: line_bonus(Line::Middle),
        bottom: line_bonus(Line::Bottom),
    }
}

// ---------------------------------------------------------------------------
// Head-to-head
// ---------------------------------------------------------------------------

/// Points `a` collects from `b`: one per line `a` strictly wins, plus the
/// sweep bonus when it wins all three. Ties award nothing.
pub fn compare(a: &Board, b: &Board) -> i32 {
    let won = ALL_LINES
        .iter()
        .filter(|&&line| compare_lines(&a.cards(line), &b.cards(line)) == Ordering::Greater)
        .count() as i32;
    if won == 3 {
        won + SWEEP_BONUS
    } else {
        won
    }
}

/// Net settlement of `a` against `b` for two complete boards: line points
/// both ways plus the royalty difference. A fouled board is scooped and earns
/// no royalties; two fouled boards settle to zero.
pub fn net_score(a: &Board, b: &Board) -> i32 {
    let scoop = 3 + SWEEP_BONUS;
    match (is_fouled(a), is_fouled(b)) {
        (true, true) => 0,
        (true, false) => -(scoop + royalties_for(b).total()),
        (false, true) => scoop + royalties_for(a).total(),
        (false, false) => {
            compare(a, b) - compare(b, a) + royalties_for(a).total() - royalties_for(b).total()
        }
    }
}
