//! Inner instructions executed by governance
//!
//! An instruction placed in a proposal is stored with its signer flags, and
//! the governance program signs for its own PDAs when it replays it. The
//! outer `ExecuteTransaction` instruction must list the same accounts, but a
//! PDA cannot sign a transaction, so each account's signer flag depends on
//! who provides the signature.

use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

/// Who authorizes an account of a governed instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountAuthority {
    /// The account does not sign
    None,
    /// A wallet signs both the proposal's instruction and its execution
    Wallet,
    /// The governance program signs on execution (governance or treasury PDA)
    Governance,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GovernedAccount {
    pub pubkey: Pubkey,
    pub is_writable: bool,
    pub authority: AccountAuthority,
}

impl GovernedAccount {
    fn new(meta: &AccountMeta, governed: &[Pubkey]) -> Self {
        let authority = if !meta.is_signer {
            AccountAuthority::None
        } else if governed.contains(&meta.pubkey) {
            AccountAuthority::Governance
        } else {
            AccountAuthority::Wallet
        };
        Self {
            pubkey: meta.pubkey,
            is_writable: meta.is_writable,
            authority,
        }
    }

    fn meta(&self, is_signer: bool) -> AccountMeta {
        AccountMeta {
            pubkey: self.pubkey,
            is_signer,
            is_writable: self.is_writable,
        }
    }
}

/// An instruction authorized, at least in part, by a governance
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GovernedInstruction {
    pub program_id: Pubkey,
    pub accounts: Vec<GovernedAccount>,
    pub data: Vec<u8>,
}

impl GovernedInstruction {
    /// Classifies the signers of `instruction`: keys in `governed` are
    /// signed for by the governance program, every other signer is a wallet.
    pub fn from_instruction(instruction: Instruction, governed: &[Pubkey]) -> Self {
        Self {
            program_id: instruction.program_id,
            accounts: instruction
                .accounts
                .iter()
                .map(|meta| GovernedAccount::new(meta, governed))
                .collect(),
            data: instruction.data,
        }
    }

    /// The instruction as stored in the proposal
    pub fn instruction(&self) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: self
                .accounts
                .iter()
                .map(|account| account.meta(account.authority != AccountAuthority::None))
                .collect(),
            data: self.data.clone(),
        }
    }

    /// Accounts passed to `ExecuteTransaction` after the program id
    pub fn execution_accounts(&self) -> Vec<AccountMeta> {
        self.accounts
            .iter()
            .map(|account| account.meta(account.authority == AccountAuthority::Wallet))
            .collect()
    }

    /// Wallets that must sign the execution transaction
    pub fn wallet_signers(&self) -> Vec<Pubkey> {
        let mut signers: Vec<Pubkey> = vec![];
        for account in &self.accounts {
            if account.authority == AccountAuthority::Wallet && !signers.contains(&account.pubkey)
            {
                signers.push(account.pubkey);
            }
        }
        signers
    }
}
