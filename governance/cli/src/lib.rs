//! Multisig wallets built on SPL Governance
//!
//! A multisig is a realm whose council token is a membership token: every
//! member holds exactly one unit, and the realm's single governance owns a
//! native treasury. Once bootstrapped, membership changes and treasury
//! withdrawals only happen through executed proposals.

pub mod airdrop;
pub mod client;
pub mod config;
pub mod error;
pub mod instruction;
pub mod member;
pub mod multisig;
pub mod proposal;
pub mod scenario;
pub mod token;
pub mod transfer;

pub use {
    error::{MultisigError, MultisigResult},
    multisig::Multisig,
};

/// Default SPL Governance program deployment
pub const DEFAULT_GOVERNANCE_PROGRAM_ID: solana_sdk::pubkey::Pubkey =
    solana_sdk::pubkey!("GovER5Lthms3bLBqWub97yVrMmEogzX7xNjdXpPPCVZw");
