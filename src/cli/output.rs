//! Colored output helpers for the CLI

use owo_colors::OwoColorize;
use std::io::{self, Write};

use crate::types::RetrievedPassage;
use ragkit_vector::CollectionStats;

/// Longest passage preview printed in listings.
const PREVIEW_CHARS: usize = 160;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

/// First `max` chars of `text` on one line, with an ellipsis when cut.
pub fn preview(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message to stderr
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "hint:".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Print one ranked passage
    pub fn passage(&self, rank: usize, passage: &RetrievedPassage) {
        let text = preview(&passage.text, PREVIEW_CHARS);
        if self.colored {
            println!(
                "  {} {} {} {}",
                format!("{:>2}.", rank).bright_cyan().bold(),
                format!("{:.4}", passage.score).green(),
                format!("#{}", passage.id).dimmed(),
                text
            );
        } else {
            println!("  {:>2}. {:.4} #{} {}", rank, passage.score, passage.id, text);
        }
    }

    /// Print a list of ranked passages under a header
    pub fn passages(&self, title: &str, passages: &[RetrievedPassage]) {
        self.header(title);
        for (i, passage) in passages.iter().enumerate() {
            self.passage(i + 1, passage);
        }
    }

    /// Print a generated answer
    pub fn answer(&self, model: &str, answer: &str) {
        self.header(&format!("Answer ({})", model));
        for line in answer.trim().lines() {
            if self.colored {
                println!("    {}", line.bright_white());
            } else {
                println!("    {}", line);
            }
        }
    }

    /// Print collection statistics
    pub fn stats(&self, stats: &CollectionStats) {
        self.header(&format!("Collection '{}'", stats.name));
        self.kv("dimensions", &stats.dimensions.to_string());
        self.kv("metric", stats.metric.name());
        self.kv("documents", &stats.document_count.to_string());
        self.kv("pending", &stats.pending_count.to_string());
        self.kv("max text bytes", &stats.max_text_bytes.to_string());
        self.kv("active loads", &stats.loads.to_string());
        match &stats.index {
            Some(params) => self.kv(
                "index",
                &format!(
                    "hnsw (m={}, ef_construction={}, ef_search={})",
                    params.m, params.ef_construction, params.ef_search
                ),
            ),
            None => self.kv("index", "none"),
        }
    }

    /// Prompt for confirmation (returns true if user confirms)
    pub fn confirm(&self, message: &str) -> bool {
        if self.colored {
            print!(
                "  {} {} [y/N]: ",
                "?".bright_yellow().bold(),
                message.bright_white()
            );
        } else {
            print!("  [?] {} [y/N]: ", message);
        }

        io::stdout().flush().ok();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_ok() {
            let input = input.trim().to_lowercase();
            input == "y" || input == "yes"
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragkit_vector::{DistanceMetric, DocumentId, IndexParams};

    #[test]
    fn test_output_constructors() {
        assert!(Output::new().colored);
        assert!(!Output::no_color().colored);
        assert!(Output::default().colored);
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short  text\nhere", 100), "short text here");
        assert_eq!(preview("abcdef", 4), "abc…");
        assert_eq!(preview("abcdef", 4).chars().count(), 4);
        assert_eq!(preview("", 4), "");
    }

    #[test]
    fn test_output_methods_no_panic() {
        let passage = RetrievedPassage {
            id: DocumentId(3),
            text: "Rust is a systems programming language".into(),
            score: 0.87,
        };
        let stats = CollectionStats {
            name: "documents".into(),
            dimensions: 384,
            metric: DistanceMetric::Cosine,
            document_count: 10,
            pending_count: 0,
            index: Some(IndexParams::default()),
            loads: 0,
            max_text_bytes: 65_535,
        };

        for output in [Output::no_color(), Output::new()] {
            output.success("ok");
            output.info("info");
            output.warning("warn");
            output.error("error");
            output.kv("key", "value");
            output.hint("hint");
            output.passages("Results", std::slice::from_ref(&passage));
            output.answer("llama3", "line one\nline two");
            output.stats(&stats);
        }
    }
}
