//! Swap Extractor
//!
//! Turns a fetched transaction into the input/output legs of a DEX swap.
//! Two strategies exist: `Structured` reads inner transfer instructions and
//! yields exact raw amounts, `Heuristic` scrapes mint addresses out of log
//! lines and yields identifiers only.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::snapshot::{LAMPORTS_PER_SOL, SOL_MINT};
use super::trade_event::TradeEvent;
use super::transaction::TransactionRecord;

/// Substrings (lower-cased) that mark a log line as aggregator activity
const SWAP_HINTS: [&str; 5] = ["jupiter", "jup.ag", "jup", "inputmint", "outputmint"];

fn labelled_mint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:inputMint|outputMint)"?\s*[:=]\s*"?([1-9A-HJ-NP-Za-km-z]{32,44})"#)
            .expect("labelled mint pattern is valid")
    })
}

fn base58_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[1-9A-HJ-NP-Za-km-z]{32,44}")
            .expect("base58 pattern is valid")
    })
}

/// Program ids in runtime lines: `Program <id> invoke|consumed|success|failed`
/// and `Program return: <id> <data>`
fn program_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Program (?:return: )?([1-9A-HJ-NP-Za-km-z]{32,44})\b")
            .expect("program pattern is valid")
    })
}

/// Cheap pre-filter on log lines before paying for a transaction fetch
pub fn looks_like_swap(logs: &[String]) -> bool {
    logs.iter().any(|line| {
        let lower = line.to_lowercase();
        SWAP_HINTS.iter().any(|hint| lower.contains(hint))
    })
}

/// The two legs of a swap
///
/// Amounts are raw integers in the asset's smallest unit. Heuristic
/// extractions cannot see amounts and leave them as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSwap {
    pub input_asset: String,
    pub input_raw_amount: Option<u64>,
    pub output_asset: String,
    pub output_raw_amount: Option<u64>,
    /// Set when produced by log scraping rather than instruction parsing
    pub best_effort: bool,
}

impl ExtractedSwap {
    /// Convert into a parent trade event.
    ///
    /// Native input means the parent bought the output asset, native output
    /// means it sold the input asset. Token-to-token swaps produce nothing.
    /// The `min_base_delta` gate (SOL) applies only when the native leg
    /// carries an amount.
    pub fn to_trade_event(&self, min_base_delta: f64) -> Option<TradeEvent> {
        let input_native = self.input_asset == SOL_MINT;
        let output_native = self.output_asset == SOL_MINT;

        if input_native == output_native {
            return None;
        }

        let event = if input_native {
            let base_delta = self
                .input_raw_amount
                .map(|raw| -(raw as f64) / LAMPORTS_PER_SOL);
            if base_delta.is_some_and(|delta| delta.abs() < min_base_delta) {
                return None;
            }
            let magnitude = self.output_raw_amount.unwrap_or_default() as f64;
            TradeEvent::acquired(&self.output_asset, magnitude, base_delta.unwrap_or_default())
        } else {
            let base_delta = self
                .output_raw_amount
                .map(|raw| raw as f64 / LAMPORTS_PER_SOL);
            if base_delta.is_some_and(|delta| delta.abs() < min_base_delta) {
                return None;
            }
            let magnitude = -(self.input_raw_amount.unwrap_or_default() as f64);
            TradeEvent::disposed(&self.input_asset, magnitude, base_delta.unwrap_or_default())
        };

        Some(event)
    }
}

/// Extraction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapExtractor {
    /// Inner transfer instructions: first transfer is the input, last the output
    #[default]
    Structured,
    /// Best-effort log scraping for mint identifiers
    Heuristic,
}

impl SwapExtractor {
    pub fn extract(&self, record: &TransactionRecord) -> Option<ExtractedSwap> {
        match self {
            SwapExtractor::Structured => extract_structured(record),
            SwapExtractor::Heuristic => extract_heuristic(&record.log_messages),
        }
    }
}

fn extract_structured(record: &TransactionRecord) -> Option<ExtractedSwap> {
    if record.failed || record.transfers.len() < 2 {
        return None;
    }
    let first = record.transfers.first()?;
    let last = record.transfers.last()?;

    Some(ExtractedSwap {
        input_asset: first.mint.clone()?,
        input_raw_amount: Some(first.raw_amount),
        output_asset: last.mint.clone()?,
        output_raw_amount: Some(last.raw_amount),
        best_effort: false,
    })
}

fn extract_heuristic(logs: &[String]) -> Option<ExtractedSwap> {
    let mut labelled: Vec<String> = Vec::new();
    let mut loose: Vec<String> = Vec::new();

    // A program id seen anywhere in the logs is never a mint candidate
    let programs: Vec<&str> = logs
        .iter()
        .flat_map(|line| program_id_re().captures_iter(line))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    for line in logs {
        for caps in labelled_mint_re().captures_iter(line) {
            if let Some(m) = caps.get(1) {
                push_unique(&mut labelled, m.as_str());
            }
        }

        for m in base58_re().find_iter(line) {
            if !programs.contains(&m.as_str()) {
                push_unique(&mut loose, m.as_str());
            }
        }
    }

    let candidates = if labelled.len() >= 2 { labelled } else { loose };
    let token = candidates.iter().find(|id| id.as_str() != SOL_MINT)?.clone();

    let input_position = candidates.iter().position(|id| id == &token);
    let native_position = candidates.iter().position(|id| id == SOL_MINT);

    // Without an explicit native leg, assume the parent paid SOL for the token
    let (input_asset, output_asset) = match (native_position, input_position) {
        (Some(native), Some(tok)) if tok < native => (token, SOL_MINT.to_string()),
        _ => (SOL_MINT.to_string(), token),
    };

    Some(ExtractedSwap {
        input_asset,
        input_raw_amount: None,
        output_asset,
        output_raw_amount: None,
        best_effort: true,
    })
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
