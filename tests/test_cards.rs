use ofc_solver::cards::*;
use ofc_solver::error::OfcError;

#[test]
fn test_card_creation() {
    let c = Card::new(Rank::Ace, Suit::Spades);
    assert_eq!(c.rank, Rank::Ace);
    assert_eq!(c.suit, Suit::Spades);
    assert_eq!(c.value(), 14);
}

#[test]
fn test_invalid_rank_and_suit() {
    assert!(Rank::from_char('X').is_err());
    assert!(Suit::from_char('x').is_err());
}

#[test]
fn test_card_display_and_pretty() {
    let c = Card::new(Rank::King, Suit::Diamonds);
    assert_eq!(format!("{}", c), "Kd");
    assert_eq!(Card::new(Rank::Ace, Suit::Spades).pretty(), "A\u{2660}");
}

#[test]
fn test_card_ordering() {
    let two = Card::new(Rank::Two, Suit::Spades);
    let ace = Card::new(Rank::Ace, Suit::Spades);
    assert!(two < ace);
}

#[test]
fn test_parse_card_forms() {
    assert_eq!(parse_card("As").unwrap(), Card::new(Rank::Ace, Suit::Spades));
    assert_eq!(parse_card("10h").unwrap(), Card::new(Rank::Ten, Suit::Hearts));
    assert_eq!(parse_card("AH").unwrap(), Card::new(Rank::Ace, Suit::Hearts));
    assert_eq!(parse_card("Q\u{2663}").unwrap(), Card::new(Rank::Queen, Suit::Clubs));
    assert!(parse_card("ABC").is_err());
}

#[test]
fn test_parse_cards_separators() {
    assert_eq!(parse_cards("QsQc7d").unwrap().len(), 3);
    assert_eq!(parse_cards("Qs Qc, 7d").unwrap().len(), 3);
    assert!(parse_cards("").unwrap().is_empty());
}

#[test]
fn test_parse_cards_rejects_duplicates() {
    assert!(matches!(parse_cards("AsKdAs"), Err(OfcError::DuplicateCard(_))));
}

#[test]
fn test_card_set_operations() {
    let cards = parse_cards("AsKdQh").unwrap();
    let set = CardSet::from_cards(&cards);
    assert_eq!(set.len(), 3);
    assert!(set.contains(cards[0]));
    let rest = CardSet::full().difference(set);
    assert_eq!(rest.len(), 49);
    assert_eq!(set.complement(), rest);
    assert_eq!(set.cards().len(), 3);
}

#[test]
fn test_deck_exclude_and_deal() {
    let used = CardSet::from_cards(&parse_cards("AsKh").unwrap());
    let mut d = Deck::new(Some(&used));
    assert_eq!(d.len(), 50);
    assert_eq!(d.deal(5).unwrap().len(), 5);
    assert_eq!(d.len(), 45);
    assert!(matches!(d.deal(46), Err(OfcError::NotEnoughDeck { .. })));
}

#[test]
fn test_deck_shuffle_keeps_cards() {
    let mut d = Deck::new(None);
    let before: std::collections::HashSet<Card> = d.cards.iter().copied().collect();
    d.shuffle();
    let after: std::collections::HashSet<Card> = d.cards.iter().copied().collect();
    assert_eq!(before, after);
}

#[test]
fn test_format_cards_inverse_of_parse() {
    let cards = parse_cards("Qs Qc 7d").unwrap();
    assert_eq!(format_cards(&cards), "QsQc7d");
    assert_eq!(parse_cards(&format_cards(&cards)).unwrap(), cards);
}
