use {
    crate::error::{MultisigError, MultisigResult},
    async_trait::async_trait,
    log::{debug, info},
    solana_client::nonblocking::rpc_client::RpcClient,
    solana_sdk::{
        account::{from_account, Account},
        account_info::AccountInfo,
        clock::Clock,
        commitment_config::CommitmentConfig,
        hash::Hash,
        instruction::Instruction,
        pubkey::Pubkey,
        signature::{Signature, Signer},
        sysvar,
        transaction::{self, Transaction},
    },
    std::{fmt, sync::Arc, time::Duration},
    tokio::time::{sleep, Instant},
};

pub type ProgramClientError = Box<dyn std::error::Error + Send + Sync>;
pub type ProgramClientResult<T> = Result<T, ProgramClientError>;

const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Generic client interface for the programs a multisig talks to.
#[async_trait]
pub trait ProgramClient {
    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> ProgramClientResult<u64>;

    async fn get_latest_blockhash(&self) -> ProgramClientResult<Hash>;

    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
    ) -> ProgramClientResult<Signature>;

    async fn request_airdrop(&self, to: &Pubkey, lamports: u64)
        -> ProgramClientResult<Signature>;

    /// Blocks until `signature` reaches `commitment` or `blockhash` expires.
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        blockhash: &Hash,
        commitment: CommitmentConfig,
    ) -> ProgramClientResult<()>;

    async fn get_signature_status(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> ProgramClientResult<Option<transaction::Result<()>>>;

    async fn get_balance(&self, address: &Pubkey) -> ProgramClientResult<u64>;

    async fn get_account(&self, address: &Pubkey) -> ProgramClientResult<Option<Account>>;
}

/// Program client for the nonblocking `RpcClient` from crate `solana-client`.
pub struct ProgramRpcClient {
    client: Arc<RpcClient>,
}

impl fmt::Debug for ProgramRpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramRpcClient")
            .field("url", &self.client.url())
            .finish()
    }
}

impl ProgramRpcClient {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProgramClient for ProgramRpcClient {
    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> ProgramClientResult<u64> {
        self.client
            .get_minimum_balance_for_rent_exemption(data_len)
            .await
            .map_err(Into::into)
    }

    async fn get_latest_blockhash(&self) -> ProgramClientResult<Hash> {
        self.client.get_latest_blockhash().await.map_err(Into::into)
    }

    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
    ) -> ProgramClientResult<Signature> {
        self.client
            .send_and_confirm_transaction(transaction)
            .await
            .map_err(Into::into)
    }

    async fn request_airdrop(
        &self,
        to: &Pubkey,
        lamports: u64,
    ) -> ProgramClientResult<Signature> {
        self.client
            .request_airdrop(to, lamports)
            .await
            .map_err(Into::into)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        blockhash: &Hash,
        commitment: CommitmentConfig,
    ) -> ProgramClientResult<()> {
        loop {
            if self
                .client
                .confirm_transaction_with_commitment(signature, commitment)
                .await?
                .value
            {
                return Ok(());
            }
            if !self.client.is_blockhash_valid(blockhash, commitment).await? {
                return Err(format!(
                    "transaction {} was not confirmed before blockhash {} expired",
                    signature, blockhash
                )
                .into());
            }
            sleep(CONFIRMATION_POLL_INTERVAL).await;
        }
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> ProgramClientResult<Option<transaction::Result<()>>> {
        self.client
            .get_signature_status_with_commitment(signature, commitment)
            .await
            .map_err(Into::into)
    }

    async fn get_balance(&self, address: &Pubkey) -> ProgramClientResult<u64> {
        self.client.get_balance(address).await.map_err(Into::into)
    }

    async fn get_account(&self, address: &Pubkey) -> ProgramClientResult<Option<Account>> {
        self.client
            .get_account_with_commitment(address, self.client.commitment())
            .await
            .map(|response| response.value)
            .map_err(Into::into)
    }
}

/// Signs `instructions` into a single transaction paid by `payer` and
/// submits it. `signers` may repeat the payer.
pub async fn process_instructions(
    client: &dyn ProgramClient,
    payer: &dyn Signer,
    instructions: &[Instruction],
    signers: &[&dyn Signer],
) -> MultisigResult<Signature> {
    let mut all_signers: Vec<&dyn Signer> = vec![payer];
    for signer in signers {
        let pubkey = signer.pubkey();
        if !all_signers.iter().any(|s| s.pubkey() == pubkey) {
            all_signers.push(*signer);
        }
    }

    let mut transaction = Transaction::new_with_payer(instructions, Some(&payer.pubkey()));
    let blockhash = client
        .get_latest_blockhash()
        .await
        .map_err(MultisigError::Client)?;
    transaction.try_sign(&all_signers, blockhash)?;

    client
        .send_and_confirm_transaction(&transaction)
        .await
        .map_err(MultisigError::Client)
}

/// Cluster time as seen by the programs
pub async fn get_clock(client: &dyn ProgramClient) -> MultisigResult<Clock> {
    let clock_id = sysvar::clock::id();
    client
        .get_account(&clock_id)
        .await
        .map_err(MultisigError::Client)?
        .and_then(|account| from_account::<Clock, _>(&account))
        .ok_or(MultisigError::AccountNotFound(clock_id))
}

/// Borrows a fetched account the way program state parsers expect it.
pub(crate) fn account_info<'a>(key: &'a Pubkey, account: &'a mut Account) -> AccountInfo<'a> {
    AccountInfo::new(
        key,
        false,
        false,
        &mut account.lamports,
        &mut account.data,
        &account.owner,
        account.executable,
        account.rent_epoch,
    )
}

/// Polls the status of `signature` until it reaches `commitment`.
pub async fn wait_for_commitment(
    client: &dyn ProgramClient,
    signature: &Signature,
    commitment: CommitmentConfig,
    timeout: Duration,
    poll_interval: Duration,
) -> MultisigResult<()> {
    let start = Instant::now();
    loop {
        match client
            .get_signature_status(signature, commitment)
            .await
            .map_err(MultisigError::Client)?
        {
            Some(Ok(())) => {
                info!(
                    "Transaction {} reached {:?} after {:?}",
                    signature,
                    commitment.commitment,
                    start.elapsed()
                );
                return Ok(());
            }
            Some(Err(err)) => return Err(MultisigError::TransactionFailed(*signature, err)),
            None => {
                if start.elapsed() >= timeout {
                    return Err(MultisigError::ConfirmationTimeout(*signature, timeout));
                }
                debug!("Waiting for {} to reach {:?}", signature, commitment.commitment);
                sleep(poll_interval).await;
            }
        }
    }
}
