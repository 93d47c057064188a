use crate::domain::RawTransaction;
use solana_pubkey::Pubkey;
use std::collections::HashSet;
use std::str::FromStr;

/// Decides whether a transaction invokes one of the tracked venue programs.
#[derive(Debug, Clone)]
pub struct ProgramFilter {
    program_ids: HashSet<Pubkey>,
}

impl ProgramFilter {
    pub fn new<I: IntoIterator<Item = Pubkey>>(program_ids: I) -> Self {
        Self {
            program_ids: program_ids.into_iter().collect(),
        }
    }

    /// True iff any top-level instruction's program id resolves to a tracked program.
    ///
    /// Malformed input never errors: indices outside the key table and keys that
    /// are not valid public keys simply don't match.
    pub fn is_relevant(&self, tx: &RawTransaction) -> bool {
        if tx.instructions.is_empty() || self.program_ids.is_empty() {
            return false;
        }

        let account_keys = tx.full_account_keys();
        tx.instructions.iter().any(|ix| {
            account_keys
                .get(ix.program_id_index)
                .and_then(|key| Pubkey::from_str(key).ok())
                .is_some_and(|key| self.program_ids.contains(&key))
        })
    }
}
