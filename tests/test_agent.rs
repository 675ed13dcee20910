//! Solver agent: decisions, training and card knowledge.

use ofc_solver::agent::*;
use ofc_solver::cards::*;
use ofc_solver::error::OfcError;
use ofc_solver::game_state::{Decision, GameState};
use ofc_solver::hand_evaluator::Line;
use ofc_solver::rules::{is_fouled, Board, FantasyCategory};

fn quick_config() -> AgentConfig {
    AgentConfig {
        horizon: 3,
        ..AgentConfig::default()
    }
}

fn state(board: &str, hand: &str) -> GameState {
    GameState::new(Board::parse(board).unwrap(), parse_cards(hand).unwrap())
}

#[test]
fn test_default_config() {
    let config = AgentConfig::default();
    assert_eq!(config.foul_penalty, -1000.0);
    assert_eq!(config.fantasy_weight, 2.0);
    assert_eq!(config.royalty_weight, 1.5);
    assert_eq!(config.winning_weight, 1.0);
    assert_eq!(config.repeat_fantasy_multiplier, 1.5);
    assert_eq!(config.policy, DecisionPolicy::Current);
}

#[test]
fn test_config_partial_json() {
    let config: AgentConfig = serde_json::from_str(r#"{"horizon": 7, "policy": "average"}"#).unwrap();
    assert_eq!(config.horizon, 7);
    assert_eq!(config.policy, DecisionPolicy::Average);
    assert_eq!(config.seed, AgentConfig::default().seed);
}

#[test]
fn test_get_action_is_legal() {
    let agent = SolverAgent::new(AgentConfig::default());
    let s = state("Qs/2h3h/As", "KdKc4s");
    match agent.get_action(&s).unwrap() {
        Some(Decision::Place(p)) => {
            assert!(s.hand.contains(&p.card));
            assert!(s.board.can_place(p.line));
        }
        other => panic!("expected a placement, got {:?}", other),
    }
}

#[test]
fn test_get_action_completes_trips_on_top() {
    let agent = SolverAgent::new(AgentConfig::default());
    let s = state("QsQc//", "Qd");
    match agent.get_action(&s).unwrap() {
        Some(Decision::Place(p)) => assert_eq!(p.line, Line::Top),
        other => panic!("expected a placement, got {:?}", other),
    }
}

#[test]
fn test_get_action_avoids_foul() {
    let agent = SolverAgent::new(AgentConfig::default());
    // last slot: Ad makes aces over the kings in the middle
    let s = state("AsKd/KsKh9c5h2h/3c4c6c7c8c", "Ad2d");
    match agent.get_action(&s).unwrap() {
        Some(Decision::Place(p)) => {
            assert_eq!(p.card, parse_card("2d").unwrap());
            assert!(!is_fouled(&s.board.with(p.card, p.line)));
        }
        other => panic!("expected a placement, got {:?}", other),
    }
}

#[test]
fn test_no_legal_action() {
    let agent = SolverAgent::new(AgentConfig::default());
    assert!(agent.get_action(&state("Qs//", "")).unwrap().is_none());
    let full = state("QsQc7d/2h2c8s8dTh/3s3d3cJhJd", "Ad");
    assert!(agent.get_action(&full).unwrap().is_none());
}

#[test]
fn test_duplicate_hand_card_is_error() {
    let agent = SolverAgent::new(AgentConfig::default());
    let s = GameState::new(Board::parse("Qs//").unwrap(), vec![parse_card("Qs").unwrap()]);
    assert!(matches!(agent.get_action(&s), Err(OfcError::DuplicateCard(_))));
}

#[test]
fn test_fantasy_mode_arranges() {
    let agent = SolverAgent::new(AgentConfig::default());
    let hand = parse_cards("AsAhAd2c3c4c5c6cKsKhKd9s9h7d").unwrap();
    let s = GameState::fantasy(hand, false, Some(FantasyCategory::Queens));
    match agent.get_action(&s).unwrap() {
        Some(Decision::Arrange(a)) => {
            assert!(a.board.is_complete());
            assert_eq!(a.discards.len(), 1);
        }
        other => panic!("expected an arrangement, got {:?}", other),
    }
}

#[test]
fn test_fantasy_hand_must_match_entitlement() {
    let agent = SolverAgent::new(AgentConfig::default());
    // a standard QQ fantasy deals 14 cards, not 17
    let seventeen = parse_cards("AsKsQsJsTs9h9d9c2h2d7c7h3s4d5c6h8c").unwrap();
    let s = GameState::fantasy(seventeen, false, Some(FantasyCategory::Queens));
    assert_eq!(s.fantasy_hand_size(), 14);
    assert!(matches!(
        agent.get_action(&s),
        Err(OfcError::FantasyHandSize { expected: 14, got: 17 })
    ));

    let short = GameState::fantasy(parse_cards("AsAhAd").unwrap(), false, None);
    assert!(matches!(
        agent.get_action(&short),
        Err(OfcError::FantasyHandSize { expected: 14, got: 3 })
    ));
}

#[test]
fn test_progressive_fantasy_sizes_by_trigger() {
    let agent = SolverAgent::new(AgentConfig {
        progressive: true,
        ..AgentConfig::default()
    });
    let hand = parse_cards("AsAhKdKc2c3c4c5c6c8s8h8dJsJhTd9d").unwrap();
    let aces = GameState::fantasy(hand.clone(), true, Some(FantasyCategory::Aces));
    assert!(matches!(agent.get_action(&aces), Ok(Some(Decision::Arrange(_)))));

    let kings = GameState::fantasy(hand, true, Some(FantasyCategory::Kings));
    assert!(matches!(
        agent.get_action(&kings),
        Err(OfcError::FantasyHandSize { expected: 15, got: 16 })
    ));
}

#[test]
fn test_fantasy_variant_must_match_agent() {
    let hand = parse_cards("AsAhAd2c3c4c5c6cKsKhKd9s9h7d").unwrap();

    let standard = SolverAgent::new(AgentConfig::default());
    let progressive_state = GameState::fantasy(hand.clone(), true, Some(FantasyCategory::Queens));
    assert!(matches!(
        standard.get_action(&progressive_state),
        Err(OfcError::VariantMismatch { found: true, expected: false })
    ));

    let progressive = SolverAgent::new(AgentConfig {
        progressive: true,
        ..AgentConfig::default()
    });
    let standard_state = GameState::fantasy(hand, false, Some(FantasyCategory::Queens));
    assert!(matches!(
        progressive.get_action(&standard_state),
        Err(OfcError::VariantMismatch { found: false, expected: true })
    ));
}

#[test]
fn test_training_is_additive() {
    let split = SolverAgent::new(quick_config());
    split.train(5);
    split.train(5);
    let whole = SolverAgent::new(quick_config());
    whole.train(10);
    assert_eq!(split.episodes(), 10);
    assert_eq!(split.tables(), whole.tables());
}

#[test]
fn test_seed_changes_episodes() {
    let a = SolverAgent::new(quick_config());
    a.train(4);
    let b = SolverAgent::new(AgentConfig {
        seed: 7,
        ..quick_config()
    });
    b.train(4);
    assert_ne!(a.tables(), b.tables());
}

#[test]
fn test_parallel_training() {
    let agent = SolverAgent::new(quick_config());
    agent.train_parallel(8);
    assert_eq!(agent.episodes(), 8);
    assert!(agent.info_set_count() > 0);
    assert_eq!(agent.train_parallel(0), 0.0);
}

#[test]
fn test_strategy_sums_to_one() {
    let agent = SolverAgent::new(quick_config());
    agent.train(5);
    let s = state("Qs/2h3h/As", "KdKc4s");
    let strategy = agent.strategy_for(&s);
    assert_eq!(strategy.len(), 9);
    let total: f64 = strategy.iter().map(|(_, p)| p).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_card_knowledge() {
    let agent = SolverAgent::new(AgentConfig::default());
    assert_eq!(agent.remaining_cards().len(), 52);
    agent.update_cards_knowledge(&parse_cards("2c3c").unwrap());
    agent.update_cards_knowledge(&parse_cards("2c").unwrap());
    assert_eq!(agent.remaining_cards().len(), 50);

    let s = state("Qs//", "Kd").with_visible(&parse_cards("Ah").unwrap());
    let available = agent.available_cards(&s);
    assert_eq!(available.len(), 47);
    assert!(!available.contains(parse_card("Ah").unwrap()));

    agent.new_deal();
    assert_eq!(agent.remaining_cards().len(), 52);
}

#[test]
fn test_training_leaves_knowledge_alone() {
    let agent = SolverAgent::new(quick_config());
    agent.update_cards_knowledge(&parse_cards("As").unwrap());
    agent.train(3);
    assert_eq!(agent.remaining_cards().len(), 51);
}
