use approx::assert_relative_eq;

use ofc_solver::cards::*;
use ofc_solver::error::OfcError;
use ofc_solver::hand_evaluator::*;

fn cards(notation: &str) -> Vec<Card> {
    parse_cards(notation).unwrap()
}

#[test]
fn test_top_queens_score_and_royalty() {
    let score = evaluate_top(&cards("QsQc7d"));
    assert_relative_eq!(score, 6.0);
    assert_eq!(bonus_for(Line::Top, score), 7);
}

#[test]
fn test_top_ordering() {
    let trips = evaluate_top(&cards("2s2h2d"));
    let aces = evaluate_top(&cards("AsAhKd"));
    let deuces = evaluate_top(&cards("2s2h3d"));
    let ace_high = evaluate_top(&cards("AsKh3d"));
    let king_high = evaluate_top(&cards("KsQh3d"));
    assert!(trips > aces);
    assert!(aces > deuces);
    assert!(deuces > ace_high);
    assert!(ace_high > king_high);
    assert_relative_eq!(trips, 10.0);
    assert_relative_eq!(evaluate_top(&cards("AsAhAd")), 22.0);
}

#[test]
fn test_top_pairs_and_trips_rise_with_rank() {
    let mut last_pair = (f64::MIN, -1);
    let mut last_trips = (f64::MIN, -1);
    for rank in ALL_RANKS {
        let kicker = if rank == Rank::Two { Rank::Three } else { Rank::Two };
        let pair = [
            Card::new(rank, Suit::Spades),
            Card::new(rank, Suit::Hearts),
            Card::new(kicker, Suit::Diamonds),
        ];
        let trips = [
            Card::new(rank, Suit::Spades),
            Card::new(rank, Suit::Hearts),
            Card::new(rank, Suit::Diamonds),
        ];

        let pair_score = evaluate_top(&pair);
        let pair_royalty = bonus_for(Line::Top, pair_score);
        assert!(pair_score > last_pair.0, "pair of {:?}", rank);
        if rank >= Rank::Six {
            assert!(pair_royalty > last_pair.1, "pair royalty of {:?}", rank);
        } else {
            assert_eq!(pair_royalty, 0);
        }
        last_pair = (pair_score, pair_royalty);

        let trips_score = evaluate_top(&trips);
        let trips_royalty = bonus_for(Line::Top, trips_score);
        assert!(trips_score > last_trips.0, "trips of {:?}", rank);
        assert!(trips_royalty > last_trips.1, "trips royalty of {:?}", rank);
        last_trips = (trips_score, trips_royalty);
    }
    assert_eq!(last_pair.1, 9);
    assert_eq!(last_trips.1, 22);
}

#[test]
fn test_royal_flush_bottom() {
    let score = evaluate_bottom(&cards("TsJsQsKsAs"));
    assert!(score >= 9000.0);
    assert_eq!(bonus_for(Line::Bottom, score), 25);
    assert_eq!(bonus_for(Line::Middle, evaluate_middle(&cards("TsJsQsKsAs"))), 50);
}

#[test]
fn test_five_card_band_ordering() {
    let ladder = [
        "9h8h7h6h5h", // straight flush
        "KsKhKdKc2s", // quads
        "QsQhQd3c3s", // full house
        "As9s7s4s2s", // flush
        "Ts9h8d7c6s", // straight
        "JsJhJd8c2s", // trips
        "AsAhKdKc2s", // two pair
        "AsAh9d5c2s", // pair
        "AsKh9d5c2s", // high card
    ];
    let scores: Vec<f64> = ladder.iter().map(|h| evaluate_bottom(&cards(h))).collect();
    for w in scores.windows(2) {
        assert!(w[0] > w[1], "{} should beat {}", w[0], w[1]);
    }
    assert!(scores[0] >= 8000.0);
    for (score, floor) in scores.iter().skip(1).zip([7000.0, 6000.0, 5000.0, 4000.0, 3000.0, 2000.0, 1000.0, 0.0]) {
        assert!(*score >= floor && *score < floor + 1000.0);
    }
}

#[test]
fn test_wheel_is_lowest_straight() {
    let wheel = evaluate_middle(&cards("As2h3d4c5s"));
    let six_high = evaluate_middle(&cards("2h3d4c5s6h"));
    assert_relative_eq!(wheel, 4003.0);
    assert!(wheel < six_high);
}

#[test]
fn test_wrong_card_count() {
    assert_eq!(evaluate_top(&cards("AsAh")), 0.0);
    assert_eq!(evaluate_bottom(&cards("AsAhAdAc")), 0.0);
    assert!(matches!(
        evaluate_line(Line::Middle, &cards("AsAh")),
        Err(OfcError::MalformedHand { expected: 5, got: 2, .. })
    ));
}

#[test]
fn test_middle_and_bottom_royalties() {
    assert_eq!(bonus_for(Line::Middle, evaluate_middle(&cards("JsJhJd8c2s"))), 2);
    assert_eq!(bonus_for(Line::Bottom, evaluate_bottom(&cards("JsJhJd8c2s"))), 0);
    assert_eq!(bonus_for(Line::Bottom, evaluate_bottom(&cards("Ts9h8d7c6s"))), 2);
    assert_eq!(bonus_for(Line::Middle, evaluate_middle(&cards("QsQhQd3c3s"))), 12);
    assert_eq!(bonus_for(Line::Bottom, evaluate_bottom(&cards("KsKhKdKc2s"))), 10);
}

#[test]
fn test_line_strength_cross_size() {
    // top 66x against a middle with only ace-high
    let top = line_strength(&cards("6s6h2d")).unwrap();
    let middle = line_strength(&cards("AsKh9d5c2s")).unwrap();
    assert!(top > middle);
    // equal ranks, shorter line never stronger
    let top = line_strength(&cards("AsKhQd")).unwrap();
    let middle = line_strength(&cards("AdKcQh5c2s")).unwrap();
    assert!(top < middle);
}

#[test]
fn test_fantasy_potential_made_hands() {
    let remaining = CardSet::full();
    assert_relative_eq!(fantasy_potential(&cards("AsAh"), &remaining), 0.9);
    assert_relative_eq!(fantasy_potential(&cards("KsKh2d"), &remaining), 0.8);
    assert_relative_eq!(fantasy_potential(&cards("5s5h5d"), &remaining), 1.0);
    assert_eq!(fantasy_potential(&[], &remaining), 0.0);
    assert_eq!(fantasy_potential(&cards("JsTh2d"), &remaining), 0.0);
}
