use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::cards::{Card, Suit};
use crate::hand_evaluator::{bonus_for, evaluate_line, line_strength, Line, ALL_LINES};
use crate::rules::{check_fantasy, is_fouled, Board};

pub fn cards_display(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "-".dimmed().to_string();
    }
    cards
        .iter()
        .map(|card| {
            let text = format!("{}{}", card.rank.to_char(), card.suit.symbol());
            match card.suit {
                Suit::Spades => text.white().to_string(),
                Suit::Hearts => text.red().to_string(),
                Suit::Diamonds => text.blue().to_string(),
                Suit::Clubs => text.green().to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn styled_line(line: Line) -> String {
    match line {
        Line::Top => "TOP".yellow().bold().to_string(),
        Line::Middle => "MIDDLE".cyan().bold().to_string(),
        Line::Bottom => "BOTTOM".magenta().bold().to_string(),
    }
}

/// One row per line: cards, hand, score, royalty. Incomplete lines show
/// their cards only.
pub fn board_table(board: &Board) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Line"),
        Cell::new("Cards"),
        Cell::new("Hand"),
        Cell::new("Score").set_alignment(CellAlignment::Right),
        Cell::new("Royalty").set_alignment(CellAlignment::Right),
    ]);

    for line in ALL_LINES {
        let cards = board.cards(line);
        let (hand, score, royalty) = match evaluate_line(line, &cards) {
            Ok(score) => (
                line_strength(&cards)
                    .map(|r| r.category.to_string())
                    .unwrap_or_default(),
                format!("{:.1}", score),
                bonus_for(line, score).to_string(),
            ),
            Err(_) => (
                format!("{}/{}", cards.len(), line.capacity()).dimmed().to_string(),
                "-".to_string(),
                "-".to_string(),
            ),
        };
        table.add_row(vec![
            Cell::new(styled_line(line)),
            Cell::new(cards_display(&cards)),
            Cell::new(hand),
            Cell::new(score).set_alignment(CellAlignment::Right),
            Cell::new(royalty).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

/// Status line under a board: fouled, fantasy, or nothing.
pub fn board_status(board: &Board) -> String {
    if !board.is_complete() {
        return format!("{} cards to place", board.open_slots()).dimmed().to_string();
    }
    if is_fouled(board) {
        return "FOULED".red().bold().to_string();
    }
    let fantasy = check_fantasy(&board.cards(Line::Top));
    match fantasy.category {
        Some(cat) => format!("Fantasy {} ({} cards)", cat, fantasy.extra_cards)
            .green()
            .bold()
            .to_string(),
        None => "Valid".green().to_string(),
    }
}

pub fn probability_bar(p: f64, width: usize) -> String {
    let filled = ((p.clamp(0.0, 1.0)) * width as f64) as usize;
    let bar: String = "\u{2588}".repeat(filled) + &"\u{2591}".repeat(width - filled);
    let pct = format!("{:.1}%", p * 100.0);
    if p >= 0.5 {
        format!("{} {}", bar.green(), pct)
    } else if p >= 0.2 {
        format!("{} {}", bar.yellow(), pct)
    } else {
        format!("{} {}", bar.dimmed(), pct)
    }
}

pub fn signed(v: i32) -> String {
    if v > 0 {
        format!("+{}", v).green().bold().to_string()
    } else if v < 0 {
        v.to_string().red().bold().to_string()
    } else {
        v.to_string().dimmed().to_string()
    }
}

pub fn print_section(title: &str, content: &str) {
    println!("\n{}", title.cyan().bold());
    println!("  {}", content);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

pub fn print_success(msg: &str) {
    println!("{}", msg.green().bold());
}
