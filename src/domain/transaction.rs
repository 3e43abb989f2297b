//! Parsed transaction records
//!
//! A trimmed view of a `getTransaction` (jsonParsed) response: the inner
//! token transfers in execution order plus the raw log lines.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::snapshot::SOL_MINT;

const SYSTEM_PROGRAM: &str = "system";
const TOKEN_PROGRAMS: [&str; 2] = ["spl-token", "spl-token-2022"];

/// One asset movement observed inside a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTransfer {
    /// Mint of the moved asset, `None` when it cannot be resolved
    pub mint: Option<String>,
    /// Amount in smallest units
    pub raw_amount: u64,
}

impl TokenTransfer {
    pub fn new(mint: impl Into<String>, raw_amount: u64) -> Self {
        Self {
            mint: Some(mint.into()),
            raw_amount,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub signature: String,
    pub transfers: Vec<TokenTransfer>,
    pub log_messages: Vec<String>,
    /// True when the transaction executed with an error
    pub failed: bool,
}

impl TransactionRecord {
    /// Record carrying only log lines, e.g. from a log notification
    pub fn from_logs(signature: impl Into<String>, logs: Vec<String>) -> Self {
        Self {
            signature: signature.into(),
            transfers: Vec::new(),
            log_messages: logs,
            failed: false,
        }
    }

    /// Parse a jsonParsed `getTransaction` result
    pub fn from_rpc_json(signature: impl Into<String>, tx: &Value) -> Self {
        let meta = tx.get("meta").unwrap_or(&Value::Null);
        let account_mints = token_account_mints(tx, meta);

        let mut transfers = Vec::new();
        if let Some(groups) = meta.get("innerInstructions").and_then(Value::as_array) {
            for group in groups {
                let Some(ixs) = group.get("instructions").and_then(Value::as_array) else {
                    continue;
                };
                for ix in ixs {
                    if let Some(transfer) = parse_transfer(ix, &account_mints) {
                        transfers.push(transfer);
                    }
                }
            }
        }

        let log_messages = meta
            .get("logMessages")
            .and_then(Value::as_array)
            .map(|logs| {
                logs.iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let failed = meta.get("err").map(|err| !err.is_null()).unwrap_or(false);

        Self {
            signature: signature.into(),
            transfers,
            log_messages,
            failed,
        }
    }
}

/// Map token account address -> mint using the pre/post token balance tables
fn token_account_mints(tx: &Value, meta: &Value) -> HashMap<String, String> {
    let keys: Vec<String> = tx
        .pointer("/transaction/message/accountKeys")
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(|key| {
                    key.as_str()
                        .or_else(|| key.get("pubkey").and_then(Value::as_str))
                        .map(ToString::to_string)
                })
                .collect()
        })
        .unwrap_or_default();

    let mut mints = HashMap::new();
    for table in ["preTokenBalances", "postTokenBalances"] {
        let Some(balances) = meta.get(table).and_then(Value::as_array) else {
            continue;
        };
        for balance in balances {
            let index = balance.get("accountIndex").and_then(Value::as_u64);
            let mint = balance.get("mint").and_then(Value::as_str);
            if let (Some(index), Some(mint)) = (index, mint) {
                if let Some(account) = keys.get(index as usize) {
                    mints.insert(account.clone(), mint.to_string());
                }
            }
        }
    }
    mints
}

fn parse_transfer(ix: &Value, account_mints: &HashMap<String, String>) -> Option<TokenTransfer> {
    let parsed = ix.get("parsed")?;
    let kind = parsed.get("type").and_then(Value::as_str)?;
    let info = parsed.get("info")?;
    let program = ix.get("program").and_then(Value::as_str).unwrap_or_default();

    if program == SYSTEM_PROGRAM {
        if kind != "transfer" {
            return None;
        }
        let lamports = info.get("lamports").and_then(Value::as_u64)?;
        return Some(TokenTransfer::new(SOL_MINT, lamports));
    }

    if !program.is_empty() && !TOKEN_PROGRAMS.contains(&program) {
        return None;
    }

    let raw_amount = match kind {
        "transfer" => parse_u64(info.get("amount")?)?,
        "transferChecked" => parse_u64(info.pointer("/tokenAmount/amount")?)?,
        _ => return None,
    };

    let mint = info
        .get("mint")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .or_else(|| {
            ["source", "destination"]
                .iter()
                .filter_map(|field| info.get(*field).and_then(Value::as_str))
                .find_map(|account| account_mints.get(account).cloned())
        });

    Some(TokenTransfer { mint, raw_amount })
}

/// Amounts arrive as JSON strings in jsonParsed output, numbers elsewhere
fn parse_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    fn swap_tx() -> Value {
        json!({
            "slot": 1,
            "transaction": {
                "message": {
                    "accountKeys": [
                        {"pubkey": "Parent1111111111111111111111111111111111111", "signer": true},
                        {"pubkey": "ParentWsolAta111111111111111111111111111111", "signer": false},
                        {"pubkey": "PoolWsolVault11111111111111111111111111111", "signer": false},
                        {"pubkey": "PoolBonkVault11111111111111111111111111111", "signer": false},
                        {"pubkey": "ParentBonkAta111111111111111111111111111111", "signer": false}
                    ]
                }
            },
            "meta": {
                "err": null,
                "preTokenBalances": [
                    {"accountIndex": 1, "mint": SOL_MINT},
                    {"accountIndex": 2, "mint": SOL_MINT},
                    {"accountIndex": 3, "mint": BONK}
                ],
                "postTokenBalances": [
                    {"accountIndex": 4, "mint": BONK}
                ],
                "innerInstructions": [{
                    "index": 2,
                    "instructions": [
                        {
                            "program": "spl-token",
                            "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                            "parsed": {
                                "type": "transfer",
                                "info": {
                                    "source": "ParentWsolAta111111111111111111111111111111",
                                    "destination": "PoolWsolVault11111111111111111111111111111",
                                    "authority": "Parent1111111111111111111111111111111111111",
                                    "amount": "500000000"
                                }
                            }
                        },
                        {
                            "program": "spl-token",
                            "programId": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                            "parsed": {
                                "type": "transferChecked",
                                "info": {
                                    "source": "PoolBonkVault11111111111111111111111111111",
                                    "destination": "ParentBonkAta111111111111111111111111111111",
                                    "mint": BONK,
                                    "tokenAmount": {"amount": "123456789", "decimals": 5}
                                }
                            }
                        },
                        {
                            "programId": "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4",
                            "accounts": [],
                            "data": "abc"
                        }
                    ]
                }],
                "logMessages": [
                    "Program JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4 invoke [1]",
                    "Program log: Instruction: Route"
                ]
            }
        })
    }

    #[test]
    fn test_parse_inner_transfers() {
        let record = TransactionRecord::from_rpc_json("sig", &swap_tx());

        assert_eq!(record.transfers.len(), 2);
        assert_eq!(record.transfers[0], TokenTransfer::new(SOL_MINT, 500_000_000));
        assert_eq!(record.transfers[1], TokenTransfer::new(BONK, 123_456_789));
        assert_eq!(record.log_messages.len(), 2);
        assert!(!record.failed);
    }

    #[test]
    fn test_system_transfer_is_native() {
        let tx = json!({
            "meta": {
                "innerInstructions": [{
                    "index": 0,
                    "instructions": [{
                        "program": "system",
                        "parsed": {"type": "transfer", "info": {"lamports": 42}}
                    }]
                }]
            }
        });
        let record = TransactionRecord::from_rpc_json("sig", &tx);
        assert_eq!(record.transfers, vec![TokenTransfer::new(SOL_MINT, 42)]);
    }

    #[test]
    fn test_unresolved_mint_kept_as_none() {
        let tx = json!({
            "meta": {
                "innerInstructions": [{
                    "index": 0,
                    "instructions": [{
                        "program": "spl-token",
                        "parsed": {"type": "transfer", "info": {"source": "a", "destination": "b", "amount": "7"}}
                    }]
                }]
            }
        });
        let record = TransactionRecord::from_rpc_json("sig", &tx);
        assert_eq!(record.transfers.len(), 1);
        assert!(record.transfers[0].mint.is_none());
    }

    #[test]
    fn test_failed_transaction_flagged() {
        let tx = json!({"meta": {"err": {"InstructionError": [0, "Custom"]}}});
        let record = TransactionRecord::from_rpc_json("sig", &tx);
        assert!(record.failed);
        assert!(record.transfers.is_empty());
    }

    #[test]
    fn test_from_logs() {
        let record = TransactionRecord::from_logs("sig", vec!["line".to_string()]);
        assert_eq!(record.signature, "sig");
        assert!(record.transfers.is_empty());
    }
}
