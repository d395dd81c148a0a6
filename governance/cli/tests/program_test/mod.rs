#![allow(dead_code)]

use {
    async_trait::async_trait,
    solana_program_test::{
        processor, tokio::sync::Mutex, BanksClientError, ProgramTest, ProgramTestContext,
    },
    solana_sdk::{
        account::Account,
        account_info::AccountInfo,
        clock::Clock,
        commitment_config::{CommitmentConfig, CommitmentLevel},
        hash::Hash,
        native_token::sol_to_lamports,
        program_pack::Pack,
        pubkey::Pubkey,
        signature::{Keypair, Signature, Signer},
        system_instruction, sysvar,
        transaction::{self, Transaction, TransactionError},
    },
    spl_governance::state::{
        realm::{get_realm_data, RealmV2},
        token_owner_record::{get_token_owner_record_data, TokenOwnerRecordV2},
    },
    spl_governance_multisig::{
        client::{ProgramClient, ProgramClientResult},
        config::{ExecutionWait, MultisigConfig},
        multisig::create_multisig,
        Multisig, MultisigError,
    },
    std::{
        sync::Arc,
        time::{Duration, SystemTime, UNIX_EPOCH},
    },
};

/// Program client for `BanksClient` from crate `solana-program-test`.
/// Every blockhash request waits for a new bank so that retried identical
/// transactions get distinct signatures. The bank clock is moved up to wall
/// time before each transaction and each clock read, since an in-process
/// bank does not advance it on its own.
pub struct ProgramBanksClient {
    context: Arc<Mutex<ProgramTestContext>>,
}

impl ProgramBanksClient {
    pub fn new_from_context(context: Arc<Mutex<ProgramTestContext>>) -> Self {
        Self { context }
    }
}

async fn sync_clock(context: &mut ProgramTestContext) -> ProgramClientResult<()> {
    let mut clock: Clock = context.banks_client.get_sysvar().await?;
    let now = i64::try_from(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())?;
    if now > clock.unix_timestamp {
        clock.unix_timestamp = now;
        context.set_sysvar(&clock);
    }
    Ok(())
}

#[async_trait]
impl ProgramClient for ProgramBanksClient {
    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> ProgramClientResult<u64> {
        let mut context = self.context.lock().await;
        let rent = context.banks_client.get_rent().await?;
        Ok(rent.minimum_balance(data_len))
    }

    async fn get_latest_blockhash(&self) -> ProgramClientResult<Hash> {
        let mut context = self.context.lock().await;
        let blockhash = context.get_new_latest_blockhash().await?;
        sync_clock(&mut context).await?;
        Ok(blockhash)
    }

    async fn send_and_confirm_transaction(
        &self,
        transaction: &Transaction,
    ) -> ProgramClientResult<Signature> {
        let mut context = self.context.lock().await;
        context
            .banks_client
            .process_transaction(transaction.clone())
            .await?;
        Ok(transaction.signatures[0])
    }

    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> ProgramClientResult<Signature> {
        let mut context = self.context.lock().await;
        let blockhash = context.get_new_latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            &[system_instruction::transfer(
                &context.payer.pubkey(),
                to,
                lamports,
            )],
            Some(&context.payer.pubkey()),
            &[&context.payer],
            blockhash,
        );
        let signature = transaction.signatures[0];
        context.banks_client.process_transaction(transaction).await?;
        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        _signature: &Signature,
        _blockhash: &Hash,
        _commitment: CommitmentConfig,
    ) -> ProgramClientResult<()> {
        Ok(())
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
        _commitment: CommitmentConfig,
    ) -> ProgramClientResult<Option<transaction::Result<()>>> {
        let mut context = self.context.lock().await;
        let status = context
            .banks_client
            .get_transaction_status(*signature)
            .await?;
        Ok(status.map(|status| status.err.map_or(Ok(()), Err)))
    }

    async fn get_balance(&self, address: &Pubkey) -> ProgramClientResult<u64> {
        let mut context = self.context.lock().await;
        context
            .banks_client
            .get_balance(*address)
            .await
            .map_err(Into::into)
    }

    async fn get_account(&self, address: &Pubkey) -> ProgramClientResult<Option<Account>> {
        let mut context = self.context.lock().await;
        if *address == sysvar::clock::id() {
            sync_clock(&mut context).await?;
        }
        context
            .banks_client
            .get_account(*address)
            .await
            .map_err(Into::into)
    }
}

/// Unwraps the `TransactionError` a failed banks transaction reported
pub fn transaction_error(err: MultisigError) -> TransactionError {
    match err {
        MultisigError::Client(err) => err
            .downcast_ref::<BanksClientError>()
            .map(BanksClientError::unwrap)
            .unwrap_or_else(|| panic!("not a banks client error: {}", err)),
        err => panic!("unexpected error: {}", err),
    }
}

pub fn clone_keypair(keypair: &Keypair) -> Keypair {
    Keypair::from_bytes(&keypair.to_bytes()).unwrap()
}

fn account_info<'a>(key: &'a Pubkey, account: &'a mut Account) -> AccountInfo<'a> {
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

pub struct MultisigProgramTest {
    pub context: Arc<Mutex<ProgramTestContext>>,
    pub client: ProgramBanksClient,
    pub program_id: Pubkey,
    pub payer: Keypair,
}

impl MultisigProgramTest {
    /// Starts a bank with the governance program loaded natively and a
    /// funded payer that is not a member
    pub async fn start_new() -> Self {
        let program_id = Pubkey::new_unique();
        let program_test = ProgramTest::new(
            "spl_governance",
            program_id,
            processor!(spl_governance::processor::process_instruction),
        );
        let context = Arc::new(Mutex::new(program_test.start_with_context().await));
        let client = ProgramBanksClient::new_from_context(Arc::clone(&context));

        let payer = Keypair::new();
        client
            .request_airdrop(&payer.pubkey(), sol_to_lamports(10.0))
            .await
            .unwrap();

        Self {
            context,
            client,
            program_id,
            payer,
        }
    }

    pub fn multisig_config(&self, name: &str, threshold: u8) -> MultisigConfig {
        MultisigConfig::new(self.program_id, name).with_threshold(threshold)
    }

    pub fn execution_wait(&self) -> ExecutionWait {
        ExecutionWait {
            commitment: CommitmentConfig {
                commitment: CommitmentLevel::Processed,
            },
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(10),
        }
    }

    /// Bootstraps a multisig with `member_count` fresh members
    pub async fn with_multisig(
        &self,
        name: &str,
        member_count: usize,
        threshold: u8,
    ) -> (Multisig, Vec<Keypair>) {
        let members: Vec<Keypair> = (0..member_count).map(|_| Keypair::new()).collect();
        let signers: Vec<&dyn Signer> = members
            .iter()
            .map(|member| member as &dyn Signer)
            .collect();

        let multisig = create_multisig(
            &self.client,
            &self.payer,
            &signers,
            &self.multisig_config(name, threshold),
        )
        .await
        .unwrap();

        (multisig, members)
    }

    pub async fn get_account(&self, address: &Pubkey) -> Account {
        self.client
            .get_account(address)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("account {} not found", address))
    }

    pub async fn get_balance(&self, address: &Pubkey) -> u64 {
        self.client.get_balance(address).await.unwrap()
    }

    pub async fn get_realm(&self, multisig: &Multisig) -> RealmV2 {
        let mut account = self.get_account(&multisig.realm).await;
        get_realm_data(
            &self.program_id,
            &account_info(&multisig.realm, &mut account),
        )
        .unwrap()
    }

    pub async fn get_token_owner_record(
        &self,
        multisig: &Multisig,
        member: &Pubkey,
    ) -> TokenOwnerRecordV2 {
        let address = multisig.token_owner_record(member);
        let mut account = self.get_account(&address).await;
        get_token_owner_record_data(&self.program_id, &account_info(&address, &mut account))
            .unwrap()
    }

    pub async fn get_mint(&self, mint: &Pubkey) -> spl_token::state::Mint {
        let account = self.get_account(mint).await;
        spl_token::state::Mint::unpack(&account.data).unwrap()
    }

    pub async fn get_token_account(&self, address: &Pubkey) -> spl_token::state::Account {
        let account = self.get_account(address).await;
        spl_token::state::Account::unpack(&account.data).unwrap()
    }
}
