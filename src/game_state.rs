//! Game state for one acting player, the actions it can take and the
//! Pineapple deal schedule.

use rand::Rng;

use crate::cards::{Card, CardSet, Deck};
use crate::error::OfcResult;
use crate::fantasy::Arrangement;
use crate::hand_evaluator::Line;
use crate::rules::{Board, FantasyCategory};

/// Cards dealt before the first placement.
pub const INITIAL_CARDS: usize = 5;
/// Cards per later draw; two are placed and one discarded.
pub const DRAW_CARDS: usize = 3;
/// Draws after the initial five.
pub const DRAW_ROUNDS: usize = 4;
/// Standard fantasy hand.
pub const FANTASY_CARDS: usize = 14;

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Put one card on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    pub card: Card,
    pub line: Line,
}

impl Placement {
    pub fn new(card: Card, line: Line) -> Self {
        Placement { card, line }
    }

    /// Stable table id: `card_index * 3 + line_index`.
    pub fn action_id(&self) -> u16 {
        self.card.index() as u16 * 3 + self.line.index() as u16
    }

    pub fn from_action_id(id: u16) -> Option<Placement> {
        let card = Card::from_index((id / 3) as u8)?;
        let line = Line::from_index((id % 3) as usize)?;
        Some(Placement::new(card, line))
    }
}

/// What the agent answers for a state.
#[derive(Debug, Clone)]
pub enum Decision {
    Place(Placement),
    Arrange(Arrangement),
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub board: Board,
    /// Cards in hand waiting to be placed (the whole oversized hand in
    /// fantasy mode).
    pub hand: Vec<Card>,
    /// Cards seen elsewhere: opponents' boards, discards.
    pub visible: CardSet,
    pub fantasy_mode: bool,
    pub progressive: bool,
    /// Top-line category that unlocked fantasy; sizes the progressive hand.
    pub fantasy_trigger: Option<FantasyCategory>,
}

impl GameState {
    pub fn new(board: Board, hand: Vec<Card>) -> Self {
        GameState {
            board,
            hand,
            ..GameState::default()
        }
    }

    pub fn fantasy(hand: Vec<Card>, progressive: bool, trigger: Option<FantasyCategory>) -> Self {
        GameState {
            hand,
            fantasy_mode: true,
            progressive,
            fantasy_trigger: trigger,
            ..GameState::default()
        }
    }

    pub fn with_visible(mut self, visible: &[Card]) -> Self {
        for &c in visible {
            self.visible.insert(c);
        }
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.board.is_complete()
    }

    /// Board, hand and visible cards together.
    pub fn known_cards(&self) -> CardSet {
        self.board
            .used()
            .union(self.visible)
            .union(CardSet::from_cards(&self.hand))
    }

    /// Every (card in hand, open line) pair. Empty when the board is full or
    /// the hand is empty.
    pub fn legal_placements(&self) -> Vec<Placement> {
        let lines = self.board.open_lines();
        let mut out = Vec::with_capacity(self.hand.len() * lines.len());
        for &card in &self.hand {
            if self.board.used().contains(card) {
                continue;
            }
            for &line in &lines {
                out.push(Placement::new(card, line));
            }
        }
        out
    }

    /// State after `placement`; the card leaves the hand.
    pub fn apply(&self, placement: Placement) -> GameState {
        let mut next = self.clone();
        next.board = self.board.with(placement.card, placement.line);
        if let Some(pos) = next.hand.iter().position(|&c| c == placement.card) {
            next.hand.remove(pos);
        }
        next
    }

    /// Size of the fantasy hand this state is entitled to.
    pub fn fantasy_hand_size(&self) -> usize {
        if !self.progressive {
            return FANTASY_CARDS;
        }
        self.fantasy_trigger
            .map(|t| t.extra_cards())
            .unwrap_or(FANTASY_CARDS)
    }
}

// ---------------------------------------------------------------------------
// Deal schedule
// ---------------------------------------------------------------------------

/// Pineapple dealing: five cards, then four draws of three. Cards already
/// known to be used never come out of the deck.
pub struct Deal {
    deck: Deck,
    draws: usize,
}

impl Deal {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, used: &CardSet) -> Self {
        let mut deck = Deck::new(Some(used));
        deck.shuffle_with(rng);
        Deal { deck, draws: 0 }
    }

    pub fn initial(&mut self) -> OfcResult<Vec<Card>> {
        self.deck.deal(INITIAL_CARDS)
    }

    /// Next three-card draw, or `None` once all four rounds are dealt.
    pub fn next_draw(&mut self) -> OfcResult<Option<Vec<Card>>> {
        if self.draws >= DRAW_ROUNDS {
            return Ok(None);
        }
        self.draws += 1;
        self.deck.deal(DRAW_CARDS).map(Some)
    }

    pub fn fantasy_hand(&mut self, size: usize) -> OfcResult<Vec<Card>> {
        self.deck.deal(size)
    }

    pub fn remaining(&self) -> usize {
        self.deck.len()
    }
}
