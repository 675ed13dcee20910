use ofc_solver::cards::*;
use ofc_solver::error::OfcError;
use ofc_solver::hand_evaluator::Line;
use ofc_solver::rules::*;

fn board(notation: &str) -> Board {
    Board::parse(notation).unwrap()
}

#[test]
fn test_valid_complete_board() {
    let b = board("QsQc7d/2h2c8s8dTh/3s3d3cJhJd");
    assert!(b.is_complete());
    assert!(is_valid_board(&b));
    assert!(!is_fouled(&b));
}

#[test]
fn test_partial_board_is_valid() {
    assert!(is_valid_board(&board("AsAcAd/2h/")));
    assert!(is_valid_board(&Board::new()));
}

#[test]
fn test_top_pair_over_high_card_middle_fouls() {
    // 5.6 < 120 numerically, still fouled by tier
    let b = board("6s6h2d/AsKh9d5c3s/2s2c4h4d7c");
    assert!(is_fouled(&b));
}

#[test]
fn test_middle_over_bottom_fouls() {
    let b = board("2s3h4d/AsAhAdKcKs/QsQhJdJc9s");
    assert!(!is_valid_board(&b));
}

#[test]
fn test_equal_ranks_top_not_stronger() {
    // top AKQ, middle AKQ52 high card: legal
    let b = board("AsKhQd/AdKcQh5c2s/3s3h3d9c9s");
    assert!(is_valid_board(&b));
}

#[test]
fn test_royal_middle_and_bottom_not_fouled() {
    let b = board("2s3h4d/TsJsQsKsAs/ThJhQhKhAh");
    assert!(is_valid_board(&b));
}

#[test]
fn test_check_fantasy_categories() {
    let aces = check_fantasy(&parse_cards("AsAc5d").unwrap());
    assert!(aces.eligible);
    assert_eq!(aces.category, Some(FantasyCategory::Aces));
    assert_eq!(aces.category.unwrap().to_string(), "AA");
    assert_eq!(aces.extra_cards, 16);

    let queens = check_fantasy(&parse_cards("QsQc5d").unwrap());
    assert_eq!(queens.extra_cards, 14);
    let kings = check_fantasy(&parse_cards("KsKc5d").unwrap());
    assert_eq!(kings.extra_cards, 15);
    let trips = check_fantasy(&parse_cards("4s4c4d").unwrap());
    assert_eq!(trips.category, Some(FantasyCategory::Trips(Rank::Four)));
    assert_eq!(trips.extra_cards, 17);

    let jacks = check_fantasy(&parse_cards("JsJc5d").unwrap());
    assert!(!jacks.eligible);
    assert_eq!(jacks.category, None);
    assert!(!check_fantasy(&parse_cards("AsAc").unwrap()).eligible);
}

#[test]
fn test_royalties_per_line() {
    let b = board("QsQc7d/2h2c8s8dTh/3s3d3cJhJd");
    let r = royalties_for(&b);
    assert_eq!(r.top, 7);
    assert_eq!(r.middle, 0);
    assert_eq!(r.bottom, 6);
    assert_eq!(r.total(), 13);
    assert_eq!(r.get(Line::Bottom), 6);
    assert_eq!(royalties_for(&board("QsQc/2h/")).total(), 0);
}

#[test]
fn test_compare_sweep() {
    let strong = board("KsKc2d/8h8c8s4d4h/9s9h9d9c5s");
    let weak = board("2s3c4d/5h5c7s9dJh/6s6h6d2c3h");
    assert_eq!(compare(&strong, &weak), 6);
    assert_eq!(compare(&weak, &strong), 0);
}

#[test]
fn test_compare_split() {
    let a = board("AsAc2d/5h5c7s7d9h/6s6h6d2c3h");
    let b = board("KsKc3d/8h8c8s4d4h/9s9h9d9c5s");
    // a wins top, b wins middle and bottom
    assert_eq!(compare(&a, &b), 1);
    assert_eq!(compare(&b, &a), 2);
    assert!(!is_fouled(&a) && !is_fouled(&b));
    assert_eq!(net_score(&a, &b), 1 - 2 + 9 - (8 + 12 + 10));
}

#[test]
fn test_net_score_fouls() {
    let fouled = board("AsAcAd/2h3h4h5h7c/KsQd9c8c6s");
    let fine = board("2s3c4d/5h5c7s9dJh/6s6h6d2c3h");
    assert_eq!(net_score(&fouled, &fine), -6);
    assert_eq!(net_score(&fine, &fouled), 6);
    assert_eq!(net_score(&fouled, &fouled), 0);
}

#[test]
fn test_place_errors() {
    let mut b = board("AsKsQs//");
    let ace = parse_card("As").unwrap();
    assert!(matches!(b.place(ace, Line::Bottom), Err(OfcError::DuplicateCard(_))));
    let two = parse_card("2d").unwrap();
    assert!(matches!(b.place(two, Line::Top), Err(OfcError::LineFull(_))));
    assert!(Board::parse("AsKs").is_err());
}
