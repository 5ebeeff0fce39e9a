// aicommit-core/src/parser.rs

//! Best-effort extraction of commit details from aicommit's stdout.
//!
//! Each field has its own marker and is matched independently. A missing or
//! reworded marker leaves the field unset; nothing here returns an error.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::Write;

lazy_static! {
    static ref MESSAGE_RE: Regex = Regex::new(r"Generated commit message: (.+)").unwrap();
    static ref TOKENS_RE: Regex = Regex::new(r"Tokens: (\d+)↑ (\d+)↓").unwrap();
    static ref COST_RE: Regex = Regex::new(r"API Cost: \$([0-9.]+)").unwrap();
}

pub const NO_MESSAGE: &str = "No commit message generated";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCommitInfo {
    pub message: Option<String>,
    pub tokens: Option<TokenUsage>,
    pub cost: Option<f64>,
}

impl ParsedCommitInfo {
    /// Text returned to the caller of `generate_commit_message`.
    pub fn render(&self) -> String {
        let mut text = self.message.as_deref().unwrap_or(NO_MESSAGE).to_string();
        if let Some(tokens) = self.tokens {
            let _ = write!(text, "\nTokens: {}↑ {}↓", tokens.input, tokens.output);
        }
        if let Some(cost) = self.cost {
            let _ = write!(text, "\nAPI Cost: ${}", cost);
        }
        text
    }
}

pub fn parse_commit_output(stdout: &str) -> ParsedCommitInfo {
    let message = MESSAGE_RE
        .captures(stdout)
        .map(|caps| caps[1].trim_end_matches('\r').to_string());

    let tokens = TOKENS_RE.captures(stdout).and_then(|caps| {
        Some(TokenUsage {
            input: caps[1].parse().ok()?,
            output: caps[2].parse().ok()?,
        })
    });

    let cost = COST_RE
        .captures(stdout)
        .and_then(|caps| caps[1].parse::<f64>().ok());

    ParsedCommitInfo {
        message,
        tokens,
        cost,
    }
}
