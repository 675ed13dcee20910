use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agent::{AgentConfig, DecisionPolicy, SolverAgent};
use crate::cards::{parse_cards, Card, CardSet};
use crate::display::{
    board_status, board_table, cards_display, print_error, print_section, print_success,
    probability_bar, signed, styled_line,
};
use crate::error::{OfcError, OfcResult};
use crate::fantasy::Arrangement;
use crate::game_state::{Deal, Decision, GameState};
use crate::hand_evaluator::Line;
use crate::rules::{
    check_fantasy, compare, is_fouled, net_score, royalties_for, Board, FantasyCategory,
};
use crate::storage::{FileStore, ProgressStore, DEFAULT_HISTORY_LIMIT, DEFAULT_KEEP_LAST};
use crate::training::{self, TrainingOptions};

#[derive(Parser)]
#[command(name = "ofc", version = "1.0.0", about = "Pineapple OFC toolkit: line evaluation, placement advice and CFR training.")]
struct Cli {
    /// JSON agent config; flags below override its fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Progressive fantasy variant
    #[arg(long, global = true)]
    progressive: bool,
    /// Training seed
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Placements decided per training episode (1-13)
    #[arg(long, global = true)]
    horizon: Option<usize>,
    /// Strategy used for live decisions: current or average
    #[arg(long, global = true)]
    policy: Option<String>,
    /// Progress directory (default ~/.ofc-solver/progress)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a board given as top/middle/bottom
    Eval {
        /// e.g. QsQc7d/2h3h4h5h6h/AsAdAcKsKd
        board: String,
    },
    /// Suggest where to place the next card
    Suggest {
        /// Current board, e.g. Qs/2h3h/As
        board: String,
        /// Cards in hand, e.g. KdKc4s
        hand: String,
        /// Cards seen on other boards or discarded
        #[arg(long)]
        visible: Option<String>,
        /// Use the saved agent state
        #[arg(long)]
        trained: bool,
    },
    /// Best arrangement for a fantasy hand (14 cards, 14-17 progressive)
    Fantasy {
        hand: String,
        /// Top line that unlocked fantasy: QQ, KK, AA or trips like 777
        #[arg(long, default_value = "QQ")]
        trigger: String,
    },
    /// Head-to-head result of two complete boards
    Compare {
        board1: String,
        board2: String,
    },
    /// Train the agent and checkpoint to the progress directory
    Train {
        #[arg(short = 'n', long, default_value = "1000")]
        iterations: usize,
        /// Episodes between checkpoints
        #[arg(long, default_value = "250")]
        checkpoint_every: usize,
        /// Split batches across threads
        #[arg(long)]
        parallel: bool,
        /// Train in memory only
        #[arg(long)]
        no_save: bool,
        /// History snapshots to keep
        #[arg(long, default_value_t = DEFAULT_KEEP_LAST)]
        keep_last: usize,
    },
    /// Inspect or manage saved progress
    History {
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: usize,
        /// Back up the current state
        #[arg(long)]
        backup: bool,
        /// Restore a backup by id
        #[arg(long)]
        restore: Option<String>,
        /// Keep only the newest N history snapshots
        #[arg(long)]
        clean: Option<usize>,
    },
    /// Let the agent play one full Pineapple deal
    Play {
        /// Use the saved agent state
        #[arg(long)]
        trained: bool,
        /// Deal seed
        #[arg(long)]
        deal_seed: Option<u64>,
    },
}

pub fn run() {
    let cli = Cli::parse();
    dispatch(cli);
}

pub fn run_with_args(args: Vec<String>) {
    let cli = Cli::parse_from(args);
    dispatch(cli);
}

fn build_config(cli: &Cli) -> OfcResult<AgentConfig> {
    let mut config = match &cli.config {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig::default(),
    };
    if cli.progressive {
        config.progressive = true;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(horizon) = cli.horizon {
        config.horizon = horizon;
    }
    if let Some(policy) = &cli.policy {
        config.policy = DecisionPolicy::from_str(policy)
            .ok_or_else(|| OfcError::InvalidStateValue(format!("unknown policy '{}'", policy)))?;
    }
    Ok(config)
}

fn store_for(cli: &Cli) -> FileStore {
    FileStore::new(cli.dir.clone().unwrap_or_else(FileStore::default_dir))
}

fn dispatch(cli: Cli) {
    let config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            print_error(&e.to_string());
            return;
        }
    };
    let store = store_for(&cli);

    let result = match cli.command {
        Commands::Eval { board } => cmd_eval(&board),
        Commands::Suggest {
            board,
            hand,
            visible,
            trained,
        } => cmd_suggest(&board, &hand, visible.as_deref(), trained, config, &store),
        Commands::Fantasy { hand, trigger } => cmd_fantasy(&hand, &trigger, config),
        Commands::Compare { board1, board2 } => cmd_compare(&board1, &board2),
        Commands::Train {
            iterations,
            checkpoint_every,
            parallel,
            no_save,
            keep_last,
        } => {
            let options = TrainingOptions {
                iterations,
                checkpoint_every,
                parallel,
                keep_last: Some(keep_last),
            };
            cmd_train(config, &store, &options, no_save)
        }
        Commands::History {
            limit,
            backup,
            restore,
            clean,
        } => cmd_history(&store, limit, backup, restore, clean),
        Commands::Play { trained, deal_seed } => cmd_play(config, &store, trained, deal_seed),
    };

    if let Err(e) = result {
        print_error(&e.to_string());
    }
}

fn agent_from(config: AgentConfig, store: &dyn ProgressStore, trained: bool) -> SolverAgent {
    let agent = SolverAgent::new(config);
    if trained {
        training::bootstrap(&agent, store);
    }
    agent
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_eval(notation: &str) -> OfcResult<()> {
    let board = Board::parse(notation)?;
    println!();
    println!("{}", board_table(&board));
    println!("  {}", board_status(&board));
    if board.is_complete() && !is_fouled(&board) {
        println!("  Royalties: {}", royalties_for(&board).total().to_string().bold());
    }
    println!();
    Ok(())
}

fn cmd_suggest(
    board: &str,
    hand: &str,
    visible: Option<&str>,
    trained: bool,
    config: AgentConfig,
    store: &dyn ProgressStore,
) -> OfcResult<()> {
    let board = Board::parse(board)?;
    let hand = parse_cards(hand)?;
    let visible = match visible {
        Some(v) => parse_cards(v)?,
        None => Vec::new(),
    };
    let agent = agent_from(config, store, trained);
    let state = GameState::new(board, hand).with_visible(&visible);

    println!();
    println!("{}", board_table(&board));
    println!("  Hand: {}", cards_display(&state.hand));
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Card"),
        Cell::new("Line"),
        Cell::new("Strategy"),
        Cell::new("Score").set_alignment(CellAlignment::Right),
    ]);
    let mut rows: Vec<_> = agent
        .strategy_for(&state)
        .into_iter()
        .map(|(p, prob)| (p, prob, agent.action_score(&state, p, prob)))
        .collect();
    rows.sort_by(|a, b| b.2.total_cmp(&a.2));
    for (p, prob, score) in &rows {
        table.add_row(vec![
            Cell::new(cards_display(&[p.card])),
            Cell::new(styled_line(p.line)),
            Cell::new(probability_bar(*prob, 20)),
            Cell::new(format!("{:.3}", score)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{}", table);

    match agent.get_action(&state)? {
        Some(Decision::Place(p)) => print_section(
            "Suggestion:",
            &format!("{} -> {}", cards_display(&[p.card]), styled_line(p.line)),
        ),
        Some(Decision::Arrange(a)) => print_arrangement(&a),
        None => print_section("Suggestion:", "no legal placement"),
    }
    println!();
    Ok(())
}

fn print_arrangement(a: &Arrangement) {
    println!();
    println!("{}", board_table(&a.board));
    println!("  {}", board_status(&a.board));
    println!("  Discards:  {}", cards_display(&a.discards));
    println!("  Royalties: {}", a.royalties.total().to_string().bold());
    if a.repeat_fantasy {
        println!("  {}", "Stays in fantasy".green().bold());
    }
    println!("  Value:     {:.3}", a.value);
}

fn cmd_fantasy(hand: &str, trigger: &str, config: AgentConfig) -> OfcResult<()> {
    let hand = parse_cards(hand)?;
    let trigger = FantasyCategory::from_str(trigger).ok_or_else(|| {
        OfcError::InvalidBoardNotation(format!("unknown fantasy trigger '{}'", trigger))
    })?;
    let agent = SolverAgent::new(config);
    let state = GameState::fantasy(hand, agent.is_progressive(), Some(trigger));
    match agent.get_action(&state)? {
        Some(Decision::Arrange(a)) => print_arrangement(&a),
        _ => print_error(&format!(
            "no legal arrangement for this {}-card hand",
            state.hand.len()
        )),
    }
    println!();
    Ok(())
}

fn cmd_compare(first: &str, second: &str) -> OfcResult<()> {
    let a = Board::parse(first)?;
    let b = Board::parse(second)?;
    for (name, board) in [("Board 1", &a), ("Board 2", &b)] {
        if !board.is_complete() {
            return Err(OfcError::InvalidBoardNotation(format!(
                "{} has {} cards, need 13",
                name,
                board.placed()
            )));
        }
    }

    println!();
    println!("  {}", "Board 1".bold());
    println!("{}", board_table(&a));
    println!("  {}", board_status(&a));
    println!();
    println!("  {}", "Board 2".bold());
    println!("{}", board_table(&b));
    println!("  {}", board_status(&b));
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new(""),
        Cell::new("Board 1").set_alignment(CellAlignment::Right),
        Cell::new("Board 2").set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Line points".bold().to_string()),
        Cell::new(compare(&a, &b)).set_alignment(CellAlignment::Right),
        Cell::new(compare(&b, &a)).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Net".bold().to_string()),
        Cell::new(signed(net_score(&a, &b))).set_alignment(CellAlignment::Right),
        Cell::new(signed(net_score(&b, &a))).set_alignment(CellAlignment::Right),
    ]);
    println!("{}", table);
    println!();
    Ok(())
}

fn cmd_train(
    config: AgentConfig,
    store: &FileStore,
    options: &TrainingOptions,
    no_save: bool,
) -> OfcResult<()> {
    let agent = SolverAgent::new(config);

    println!();
    println!(
        "  {} Training {} episodes | horizon {} | {}",
        "OFC".bold(),
        options.iterations,
        agent.config().horizon,
        if agent.is_progressive() { "progressive" } else { "standard" },
    );
    println!();

    let report = if no_save {
        training::run(&agent, None, options)
    } else {
        training::bootstrap(&agent, store);
        training::run(&agent, Some(store), options)
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![Cell::new(""), Cell::new("")]);
    table.add_row(vec![
        Cell::new("Episodes".bold().to_string()),
        Cell::new(format!("{} (total {})", report.episodes, agent.episodes())),
    ]);
    table.add_row(vec![
        Cell::new("Info sets".bold().to_string()),
        Cell::new(report.info_sets),
    ]);
    table.add_row(vec![
        Cell::new("Mean utility".bold().to_string()),
        Cell::new(format!("{:.3}", report.mean_utility)),
    ]);
    table.add_row(vec![
        Cell::new("Checkpoints".bold().to_string()),
        Cell::new(format!("{} saved, {} failed", report.checkpoints, report.failed_checkpoints)),
    ]);
    println!("{}", table);

    if !no_save && report.checkpoints > 0 {
        println!();
        println!(
            "  Progress saved to {}",
            store.root().display().to_string().dimmed()
        );
    }
    println!();
    Ok(())
}

fn cmd_history(
    store: &FileStore,
    limit: usize,
    backup: bool,
    restore: Option<String>,
    clean: Option<usize>,
) -> OfcResult<()> {
    println!();
    if backup {
        match store.backup()? {
            Some(id) => print_success(&format!("  Backup created: {}", id)),
            None => print_error("nothing saved yet"),
        }
    }
    if let Some(id) = restore {
        store.restore(&id)?;
        print_success(&format!("  Restored backup {}", id));
    }
    if let Some(keep) = clean {
        let removed = store.clean_history(keep)?;
        print_success(&format!("  Removed {} old snapshots", removed));
    }

    let entries = store.history(limit)?;
    if entries.is_empty() {
        println!("  No history in {}", store.root().display().to_string().dimmed());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Snapshot"),
        Cell::new("Saved (unix ms)").set_alignment(CellAlignment::Right),
        Cell::new("Size").set_alignment(CellAlignment::Right),
    ]);
    for e in &entries {
        table.add_row(vec![
            Cell::new(&e.id),
            Cell::new(e.saved_at_millis().map(|m| m.to_string()).unwrap_or_default())
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} B", e.bytes)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{}", table);
    println!();
    Ok(())
}

/// Place every card in `hand` one decision at a time, keeping `keep` of them.
/// Returns the cards left over (discards).
fn place_cards(
    agent: &SolverAgent,
    board: &mut Board,
    mut hand: Vec<Card>,
    keep: usize,
    visible: &CardSet,
) -> OfcResult<Vec<Card>> {
    for _ in 0..keep {
        let mut state = GameState::new(*board, hand.clone());
        state.visible = *visible;
        match agent.get_action(&state)? {
            Some(Decision::Place(p)) => {
                board.place(p.card, p.line)?;
                hand.retain(|&c| c != p.card);
                println!(
                    "    {} -> {}",
                    cards_display(&[p.card]),
                    styled_line(p.line)
                );
            }
            _ => break,
        }
    }
    Ok(hand)
}

fn cmd_play(
    config: AgentConfig,
    store: &dyn ProgressStore,
    trained: bool,
    deal_seed: Option<u64>,
) -> OfcResult<()> {
    let agent = agent_from(config, store, trained);
    agent.new_deal();
    let mut rng = match deal_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut deal = Deal::new(&mut rng, &CardSet::empty());
    let mut board = Board::new();
    let mut discards = CardSet::empty();

    println!();
    let initial = deal.initial()?;
    agent.update_cards_knowledge(&initial);
    println!("  {} {}", "Deal:".bold(), cards_display(&initial));
    place_cards(&agent, &mut board, initial, 5, &discards)?;

    let mut round = 1;
    while let Some(draw) = deal.next_draw()? {
        agent.update_cards_knowledge(&draw);
        println!("  {} {}", format!("Draw {}:", round).bold(), cards_display(&draw));
        let left = place_cards(&agent, &mut board, draw, 2, &discards)?;
        for c in left {
            discards.insert(c);
        }
        round += 1;
    }

    println!();
    println!("{}", board_table(&board));
    println!("  {}", board_status(&board));
    println!("  Discarded: {}", cards_display(&discards.cards()));

    let fantasy = check_fantasy(&board.cards(Line::Top));
    if board.is_complete() && !is_fouled(&board) && fantasy.eligible {
        let state = GameState::fantasy(Vec::new(), agent.is_progressive(), fantasy.category);
        let size = state.fantasy_hand_size();
        let mut next = Deal::new(&mut rng, &CardSet::empty());
        let hand = next.fantasy_hand(size)?;
        println!();
        println!("  {} {}", "Fantasy hand:".bold(), cards_display(&hand));
        let state = GameState { hand, ..state };
        if let Some(Decision::Arrange(a)) = agent.get_action(&state)? {
            print_arrangement(&a);
        }
    }
    println!();
    Ok(())
}
