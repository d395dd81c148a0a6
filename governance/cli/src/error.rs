use {
    crate::{client::ProgramClientError, proposal::ProposalStage},
    solana_sdk::{
        program_error::ProgramError, pubkey::Pubkey, signature::Signature, signer::SignerError,
        transaction::TransactionError,
    },
    std::time::Duration,
    thiserror::Error,
};

/// Multisig client errors
#[derive(Error, Debug)]
pub enum MultisigError {
    #[error("client error: {0}")]
    Client(ProgramClientError),
    #[error("program error: {0}")]
    Program(#[from] ProgramError),
    #[error(transparent)]
    Signer(#[from] SignerError),
    #[error("transaction {0} failed: {1}")]
    TransactionFailed(Signature, TransactionError),
    #[error("transaction {0} did not reach the requested commitment within {1:?}")]
    ConfirmationTimeout(Signature, Duration),
    #[error("proposal is {actual:?}, expected {expected}")]
    InvalidProposalStage {
        expected: &'static str,
        actual: ProposalStage,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("account {0} not found")]
    AccountNotFound(Pubkey),
    #[error("a multisig needs at least one member")]
    NoMembers,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type MultisigResult<T> = Result<T, MultisigError>;
