use std::fmt;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

use crate::error::{OfcError, OfcResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    pub fn from_char(c: char) -> OfcResult<Rank> {
        match c {
            '2' => Ok(Rank::Two),
            '3' => Ok(Rank::Three),
            '4' => Ok(Rank::Four),
            '5' => Ok(Rank::Five),
            '6' => Ok(Rank::Six),
            '7' => Ok(Rank::Seven),
            '8' => Ok(Rank::Eight),
            '9' => Ok(Rank::Nine),
            'T' => Ok(Rank::Ten),
            'J' => Ok(Rank::Jack),
            'Q' => Ok(Rank::Queen),
            'K' => Ok(Rank::King),
            'A' => Ok(Rank::Ace),
            _ => Err(OfcError::InvalidRank(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }

    /// Poker value, 2..=14.
    pub fn value(self) -> u8 {
        self as u8
    }

    /// '2' = 0 .. 'A' = 12.
    pub fn index(self) -> u8 {
        self as u8 - 2
    }

    pub fn from_index(index: u8) -> Option<Rank> {
        ALL_RANKS.get(index as usize).copied()
    }
}

pub const ALL_RANKS: [Rank; 13] = [
    Rank::Two,
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
    Rank::Ace,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub fn from_char(c: char) -> OfcResult<Suit> {
        match c.to_ascii_lowercase() {
            's' | '\u{2660}' => Ok(Suit::Spades),
            'h' | '\u{2665}' => Ok(Suit::Hearts),
            'd' | '\u{2666}' => Ok(Suit::Diamonds),
            'c' | '\u{2663}' => Ok(Suit::Clubs),
            _ => Err(OfcError::InvalidSuit(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Suit::Spades => 's',
            Suit::Hearts => 'h',
            Suit::Diamonds => 'd',
            Suit::Clubs => 'c',
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Spades => "\u{2660}",
            Suit::Hearts => "\u{2665}",
            Suit::Diamonds => "\u{2666}",
            Suit::Clubs => "\u{2663}",
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Suit::Spades => 0,
            Suit::Hearts => 1,
            Suit::Diamonds => 2,
            Suit::Clubs => 3,
        }
    }
}

pub const ALL_SUITS: [Suit; 4] = [Suit::Spades, Suit::Hearts, Suit::Diamonds, Suit::Clubs];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    pub fn value(&self) -> u8 {
        self.rank.value()
    }

    /// Dense index in `0..52`, rank-major.
    pub fn index(&self) -> u8 {
        self.rank.index() * 4 + self.suit.index()
    }

    pub fn from_index(index: u8) -> Option<Card> {
        if index >= 52 {
            return None;
        }
        let rank = Rank::from_index(index / 4)?;
        let suit = ALL_SUITS[(index % 4) as usize];
        Some(Card::new(rank, suit))
    }

    pub fn pretty(&self) -> String {
        format!("{}{}", self.rank.to_char(), self.suit.symbol())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.to_char(), self.suit.to_char())
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank.cmp(&other.rank).then(self.suit.cmp(&other.suit))
    }
}

/// All 52 cards in index order.
pub static FULL_DECK: Lazy<Vec<Card>> = Lazy::new(|| {
    ALL_RANKS
        .iter()
        .flat_map(|&r| ALL_SUITS.iter().map(move |&s| Card::new(r, s)))
        .collect()
});

// ---------------------------------------------------------------------------
// CardSet
// ---------------------------------------------------------------------------

const FULL_MASK: u64 = (1u64 << 52) - 1;

/// Bitset over the 52-card universe, one bit per `Card::index`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CardSet(u64);

impl CardSet {
    pub fn empty() -> Self {
        CardSet(0)
    }

    pub fn full() -> Self {
        CardSet(FULL_MASK)
    }

    pub fn from_bits(bits: u64) -> Self {
        CardSet(bits & FULL_MASK)
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn from_cards(cards: &[Card]) -> Self {
        let mut set = CardSet::empty();
        for c in cards {
            set.insert(*c);
        }
        set
    }

    #[inline]
    pub fn insert(&mut self, card: Card) {
        self.0 |= 1u64 << card.index();
    }

    #[inline]
    pub fn remove(&mut self, card: Card) {
        self.0 &= !(1u64 << card.index());
    }

    #[inline]
    pub fn contains(&self, card: Card) -> bool {
        self.0 & (1u64 << card.index()) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn union(&self, other: CardSet) -> CardSet {
        CardSet(self.0 | other.0)
    }

    pub fn difference(&self, other: CardSet) -> CardSet {
        CardSet(self.0 & !other.0)
    }

    pub fn complement(&self) -> CardSet {
        CardSet(!self.0 & FULL_MASK)
    }

    /// Cards in index order.
    pub fn cards(&self) -> Vec<Card> {
        let mut out = Vec::with_capacity(self.len());
        let mut bits = self.0;
        while bits != 0 {
            let idx = bits.trailing_zeros() as u8;
            if let Some(card) = Card::from_index(idx) {
                out.push(card);
            }
            bits &= bits - 1;
        }
        out
    }

    /// How many cards of `rank` are in the set.
    pub fn count_rank(&self, rank: Rank) -> usize {
        let shift = rank.index() as u32 * 4;
        ((self.0 >> shift) & 0xF).count_ones() as usize
    }
}

// ---------------------------------------------------------------------------
// Deck
// ---------------------------------------------------------------------------

pub struct Deck {
    pub cards: Vec<Card>,
}

impl Deck {
    pub fn new(exclude: Option<&CardSet>) -> Deck {
        let excluded = exclude.copied().unwrap_or_default();
        let cards = FULL_DECK
            .iter()
            .copied()
            .filter(|c| !excluded.contains(*c))
            .collect();
        Deck { cards }
    }

    pub fn shuffle(&mut self) -> &mut Self {
        let mut rng = thread_rng();
        self.cards.shuffle(&mut rng);
        self
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &mut Self {
        self.cards.shuffle(rng);
        self
    }

    pub fn deal(&mut self, n: usize) -> OfcResult<Vec<Card>> {
        if n > self.cards.len() {
            return Err(OfcError::NotEnoughDeck {
                requested: n,
                available: self.cards.len(),
            });
        }
        let dealt: Vec<Card> = self.cards.drain(..n).collect();
        Ok(dealt)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse_card(notation: &str) -> OfcResult<Card> {
    let notation = notation.trim();
    let chars: Vec<char> = notation.chars().collect();
    // "10h" is accepted alongside "Th"
    let (rank_char, suit_char) = match chars.as_slice() {
        [r, s] => (r.to_ascii_uppercase(), *s),
        ['1', '0', s] => ('T', *s),
        _ => return Err(OfcError::InvalidCardNotation(notation.to_string())),
    };
    let rank = Rank::from_char(rank_char)?;
    let suit = Suit::from_char(suit_char)?;
    Ok(Card::new(rank, suit))
}

/// Parse a run of cards such as `"QsQc7d"`, `"Qs Qc 7d"` or `"Q♠,Q♣,7♦"`.
/// Duplicates are rejected.
pub fn parse_cards(notation: &str) -> OfcResult<Vec<Card>> {
    let chars: Vec<char> = notation
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    let mut cards = Vec::new();
    let mut seen = CardSet::empty();
    let mut i = 0;
    while i < chars.len() {
        let width = if chars[i] == '1' && chars.get(i + 1) == Some(&'0') { 3 } else { 2 };
        if i + width > chars.len() {
            return Err(OfcError::InvalidBoardNotation(notation.to_string()));
        }
        let s: String = chars[i..i + width].iter().collect();
        let card = parse_card(&s)?;
        if seen.contains(card) {
            return Err(OfcError::DuplicateCard(card.to_string()));
        }
        seen.insert(card);
        cards.push(card);
        i += width;
    }
    Ok(cards)
}

/// Compact notation, `"QsQc7d"`; the inverse of `parse_cards`.
pub fn format_cards(cards: &[Card]) -> String {
    cards.iter().map(|c| c.to_string()).collect()
}
