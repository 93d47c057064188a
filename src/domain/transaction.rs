//! Raw transaction as delivered by the upstream ledger.

use serde::{Deserialize, Serialize};

/// A compiled instruction; only the program-id index is needed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledInstruction {
    pub program_id_index: usize,
}

/// A confirmed transaction with the fields the ledger pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub signature: String,
    /// Block time in seconds since Unix epoch, when known.
    pub block_time: Option<i64>,
    /// Network fee in lamports.
    pub fee_lamports: u64,
    pub log_messages: Vec<String>,
    pub instructions: Vec<CompiledInstruction>,
    /// Static account keys of the message, base58-encoded.
    pub account_keys: Vec<String>,
    /// Writable keys loaded through address lookup tables.
    pub loaded_writable: Vec<String>,
    /// Readonly keys loaded through address lookup tables.
    pub loaded_readonly: Vec<String>,
}

impl RawTransaction {
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            block_time: None,
            fee_lamports: 0,
            log_messages: Vec::new(),
            instructions: Vec::new(),
            account_keys: Vec::new(),
            loaded_writable: Vec::new(),
            loaded_readonly: Vec::new(),
        }
    }

    pub fn with_block_time(mut self, secs: i64) -> Self {
        self.block_time = Some(secs);
        self
    }

    pub fn with_fee_lamports(mut self, lamports: u64) -> Self {
        self.fee_lamports = lamports;
        self
    }

    pub fn with_logs(mut self, logs: Vec<String>) -> Self {
        self.log_messages = logs;
        self
    }

    /// Add an instruction invoking the account at `program_id_index`.
    pub fn with_instruction(mut self, program_id_index: usize) -> Self {
        self.instructions.push(CompiledInstruction { program_id_index });
        self
    }

    pub fn with_account_keys(mut self, keys: Vec<String>) -> Self {
        self.account_keys = keys;
        self
    }

    pub fn with_loaded_addresses(mut self, writable: Vec<String>, readonly: Vec<String>) -> Self {
        self.loaded_writable = writable;
        self.loaded_readonly = readonly;
        self
    }

    /// Combined key table: static keys, then loaded writable, then loaded readonly.
    pub fn full_account_keys(&self) -> Vec<&str> {
        self.account_keys
            .iter()
            .chain(self.loaded_writable.iter())
            .chain(self.loaded_readonly.iter())
            .map(String::as_str)
            .collect()
    }
}
