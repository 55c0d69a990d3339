use colored::*;

use crate::core::message::{ConversationSummary, Message, MessageStatus, Sender};

pub fn print_banner(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.len()).bright_cyan());
}

pub fn print_notice(text: &str) {
    println!("{}", text.blue());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn prompt_marker() {
    print!("{} ", "you>".yellow().bold());
}

pub fn print_message(message: &Message) {
    match (message.sender, message.status) {
        (Sender::User, _) => println!("{} {}", "you>".yellow().bold(), message.text),
        (Sender::Assistant, MessageStatus::Error) => println!("{}", message.text.red()),
        (Sender::Assistant, MessageStatus::Pending) => println!("{}", message.text.dimmed()),
        (Sender::Assistant, MessageStatus::Final) => println!("{}", message.text.green()),
    }
}

pub fn print_summary(position: usize, summary: &ConversationSummary, active: bool) {
    let marker = if active { "*" } else { " " };
    println!(
        "{} {:>2}. {}  {}",
        marker,
        position,
        summary.title.bold(),
        format!("({})", summary.id).dimmed()
    );
}
