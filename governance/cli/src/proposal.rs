//! Proposal lifecycle: create, insert, sign off, vote, execute

use {
    crate::{
        client::{
            account_info, get_clock, process_instructions, wait_for_commitment, ProgramClient,
        },
        config::ExecutionWait,
        error::{MultisigError, MultisigResult},
        instruction::GovernedInstruction,
        multisig::Multisig,
    },
    log::{debug, info},
    solana_sdk::{
        clock::UnixTimestamp,
        instruction::Instruction,
        pubkey::Pubkey,
        signature::{Keypair, Signature, Signer},
    },
    spl_governance::{
        instruction::{
            cast_vote, create_proposal, execute_transaction, insert_transaction,
            sign_off_proposal,
        },
        state::{
            proposal::{get_proposal_data, VoteType},
            proposal_transaction::InstructionData,
            vote_record::{Vote, VoteChoice},
        },
    },
    tokio::time::{sleep, Instant},
};

/// The single option every multisig proposal carries
pub const APPROVE_OPTION: &str = "Approve";

/// Client-side view of where a proposal is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalStage {
    Draft,
    Created,
    Populated,
    SignedOff,
    /// Number of distinct members who voted
    Voted(usize),
    Executed,
}

/// A proposal carrying exactly one governed instruction
#[derive(Debug)]
pub struct Proposal {
    multisig: Multisig,
    owner: Pubkey,
    title: String,
    description: String,
    seed: Pubkey,
    address: Pubkey,
    hold_up_time: u32,
    instruction: GovernedInstruction,
    stage: ProposalStage,
    voters: Vec<Pubkey>,
    last_vote: Option<Signature>,
}

impl Proposal {
    /// `seed` must not have been used for another proposal of this
    /// multisig, see [`Proposal::new_seed`].
    pub fn new(
        multisig: &Multisig,
        owner: &Pubkey,
        title: &str,
        description: &str,
        seed: &Pubkey,
        instruction: GovernedInstruction,
    ) -> Self {
        Self {
            multisig: multisig.clone(),
            owner: *owner,
            title: title.to_string(),
            description: description.to_string(),
            seed: *seed,
            address: multisig.proposal_address(seed),
            hold_up_time: 0,
            instruction,
            stage: ProposalStage::Draft,
            voters: vec![],
            last_vote: None,
        }
    }

    pub fn new_seed() -> Pubkey {
        Keypair::new().pubkey()
    }

    /// Seconds the transaction waits after the vote before it can execute;
    /// must be at least the governance's minimum hold-up time.
    pub fn with_hold_up_time(mut self, hold_up_time: u32) -> Self {
        self.hold_up_time = hold_up_time;
        self
    }

    pub fn address(&self) -> &Pubkey {
        &self.address
    }

    pub fn seed(&self) -> &Pubkey {
        &self.seed
    }

    pub fn stage(&self) -> ProposalStage {
        self.stage
    }

    pub fn voters(&self) -> &[Pubkey] {
        &self.voters
    }

    pub fn instruction(&self) -> &GovernedInstruction {
        &self.instruction
    }

    pub fn transaction_address(&self) -> Pubkey {
        self.multisig.proposal_transaction_address(&self.address)
    }

    fn owner_record(&self) -> Pubkey {
        self.multisig.token_owner_record(&self.owner)
    }

    pub fn create_instruction(&self, payer: &Pubkey) -> Instruction {
        create_proposal(
            &self.multisig.program_id,
            &self.multisig.governance,
            &self.owner_record(),
            &self.owner,
            payer,
            None,
            &self.multisig.realm,
            self.title.clone(),
            self.description.clone(),
            &self.multisig.membership_token,
            VoteType::SingleChoice,
            vec![APPROVE_OPTION.to_string()],
            true,
            &self.seed,
        )
    }

    pub fn insert_instruction(&self, payer: &Pubkey) -> Instruction {
        insert_transaction(
            &self.multisig.program_id,
            &self.multisig.governance,
            &self.address,
            &self.owner_record(),
            &self.owner,
            payer,
            0,
            0,
            self.hold_up_time,
            vec![InstructionData::from(self.instruction.instruction())],
        )
    }

    pub fn sign_off_instruction(&self) -> Instruction {
        sign_off_proposal(
            &self.multisig.program_id,
            &self.multisig.realm,
            &self.multisig.governance,
            &self.address,
            &self.owner,
            Some(&self.owner_record()),
        )
    }

    pub fn cast_vote_instruction(&self, voter: &Pubkey, payer: &Pubkey) -> Instruction {
        cast_vote(
            &self.multisig.program_id,
            &self.multisig.realm,
            &self.multisig.governance,
            &self.address,
            &self.owner_record(),
            &self.multisig.token_owner_record(voter),
            voter,
            &self.multisig.membership_token,
            payer,
            None,
            None,
            Vote::Approve(vec![VoteChoice {
                rank: 0,
                weight_percentage: 100,
            }]),
        )
    }

    pub fn execute_instruction(&self) -> Instruction {
        execute_transaction(
            &self.multisig.program_id,
            &self.multisig.governance,
            &self.address,
            &self.transaction_address(),
            &self.instruction.program_id,
            &self.instruction.execution_accounts(),
        )
    }

    fn expect_stage(&self, expected: &'static str, is_expected: bool) -> MultisigResult<()> {
        if is_expected {
            Ok(())
        } else {
            Err(MultisigError::InvalidProposalStage {
                expected,
                actual: self.stage,
            })
        }
    }

    /// Draft -> Created
    pub async fn create(
        &mut self,
        client: &dyn ProgramClient,
        payer: &dyn Signer,
        owner: &dyn Signer,
    ) -> MultisigResult<Signature> {
        self.expect_stage("Draft", self.stage == ProposalStage::Draft)?;
        let signature = process_instructions(
            client,
            payer,
            &[self.create_instruction(&payer.pubkey())],
            &[owner],
        )
        .await?;
        info!("Created proposal \"{}\" at {}", self.title, self.address);
        info!("  Signature: {}", signature);
        self.stage = ProposalStage::Created;
        Ok(signature)
    }

    /// Created -> Populated
    pub async fn insert(
        &mut self,
        client: &dyn ProgramClient,
        payer: &dyn Signer,
        owner: &dyn Signer,
    ) -> MultisigResult<Signature> {
        self.expect_stage("Created", self.stage == ProposalStage::Created)?;
        let signature = process_instructions(
            client,
            payer,
            &[self.insert_instruction(&payer.pubkey())],
            &[owner],
        )
        .await?;
        info!(
            "Inserted transaction {} into proposal \"{}\"",
            self.transaction_address(),
            self.title
        );
        info!("  Signature: {}", signature);
        self.stage = ProposalStage::Populated;
        Ok(signature)
    }

    /// Populated -> SignedOff, opening the vote
    pub async fn sign_off(
        &mut self,
        client: &dyn ProgramClient,
        payer: &dyn Signer,
        owner: &dyn Signer,
    ) -> MultisigResult<Signature> {
        self.expect_stage("Populated", self.stage == ProposalStage::Populated)?;
        let signature =
            process_instructions(client, payer, &[self.sign_off_instruction()], &[owner]).await?;
        info!("Signed off proposal \"{}\"", self.title);
        info!("  Signature: {}", signature);
        self.stage = ProposalStage::SignedOff;
        Ok(signature)
    }

    /// Draft -> SignedOff in a single transaction
    pub async fn propose(
        &mut self,
        client: &dyn ProgramClient,
        payer: &dyn Signer,
        owner: &dyn Signer,
    ) -> MultisigResult<Signature> {
        self.expect_stage("Draft", self.stage == ProposalStage::Draft)?;
        let instructions = [
            self.create_instruction(&payer.pubkey()),
            self.insert_instruction(&payer.pubkey()),
            self.sign_off_instruction(),
        ];
        let signature = process_instructions(client, payer, &instructions, &[owner]).await?;
        info!(
            "Proposal \"{}\" created at {} and open for voting",
            self.title, self.address
        );
        info!("  Signature: {}", signature);
        self.stage = ProposalStage::SignedOff;
        Ok(signature)
    }

    /// Casts a full-weight approval from `voter`'s token owner record.
    /// A repeated vote is still submitted, so the program's rejection is
    /// returned to the caller.
    pub async fn cast_vote(
        &mut self,
        client: &dyn ProgramClient,
        payer: &dyn Signer,
        voter: &dyn Signer,
    ) -> MultisigResult<Signature> {
        self.expect_stage(
            "SignedOff or Voted",
            matches!(
                self.stage,
                ProposalStage::SignedOff | ProposalStage::Voted(_)
            ),
        )?;
        let voter_pubkey = voter.pubkey();
        let signature = process_instructions(
            client,
            payer,
            &[self.cast_vote_instruction(&voter_pubkey, &payer.pubkey())],
            &[voter],
        )
        .await?;
        info!(
            "Vote cast by {} on proposal \"{}\"",
            voter_pubkey, self.title
        );
        info!("  Signature: {}", signature);

        if !self.voters.contains(&voter_pubkey) {
            self.voters.push(voter_pubkey);
        }
        self.stage = ProposalStage::Voted(self.voters.len());
        self.last_vote = Some(signature);
        Ok(signature)
    }

    /// When the vote that decided the proposal landed, `None` while voting is open
    pub async fn voting_completed_at(
        &self,
        client: &dyn ProgramClient,
    ) -> MultisigResult<Option<UnixTimestamp>> {
        let mut account = client
            .get_account(&self.address)
            .await
            .map_err(MultisigError::Client)?
            .ok_or(MultisigError::AccountNotFound(self.address))?;
        let proposal_data = get_proposal_data(
            &self.multisig.program_id,
            &account_info(&self.address, &mut account),
        )?;
        Ok(proposal_data.voting_completed_at)
    }

    /// Polls the proposal and the cluster clock until the hold-up time of a
    /// decided proposal has passed. Returns at once while voting is open.
    async fn wait_for_hold_up(
        &self,
        client: &dyn ProgramClient,
        last_vote: &Signature,
        wait: &ExecutionWait,
    ) -> MultisigResult<()> {
        let start = Instant::now();
        loop {
            let voting_completed_at = self.voting_completed_at(client).await?;
            let now = get_clock(client).await?.unix_timestamp;
            if hold_up_elapsed(voting_completed_at, self.hold_up_time, now) {
                return Ok(());
            }
            if start.elapsed() >= wait.timeout {
                return Err(MultisigError::ConfirmationTimeout(*last_vote, wait.timeout));
            }
            debug!(
                "Proposal \"{}\" decided at {:?}, cluster time {}",
                self.title, voting_completed_at, now
            );
            sleep(wait.poll_interval).await;
        }
    }

    /// Executes the proposal's transaction once the last vote reached the
    /// awaited commitment and the hold-up time after the decision has
    /// passed on the cluster clock. `signers` must cover the instruction's
    /// [`GovernedInstruction::wallet_signers`]; the governance program
    /// decides whether the approval threshold was met.
    pub async fn execute(
        &mut self,
        client: &dyn ProgramClient,
        payer: &dyn Signer,
        signers: &[&dyn Signer],
        wait: &ExecutionWait,
    ) -> MultisigResult<Signature> {
        self.expect_stage("Voted", matches!(self.stage, ProposalStage::Voted(n) if n > 0))?;
        if let Some(last_vote) = self.last_vote {
            wait_for_commitment(
                client,
                &last_vote,
                wait.commitment,
                wait.timeout,
                wait.poll_interval,
            )
            .await?;
            self.wait_for_hold_up(client, &last_vote, wait).await?;
        }

        let signature =
            process_instructions(client, payer, &[self.execute_instruction()], signers).await?;
        info!("Executed proposal \"{}\"", self.title);
        info!("  Signature: {}", signature);
        self.stage = ProposalStage::Executed;
        Ok(signature)
    }
}

/// A transaction can execute strictly after `voting_completed_at + hold_up_time`.
/// An undecided proposal has nothing to wait for.
pub fn hold_up_elapsed(
    voting_completed_at: Option<UnixTimestamp>,
    hold_up_time: u32,
    now: UnixTimestamp,
) -> bool {
    match voting_completed_at {
        Some(completed_at) => now > completed_at.saturating_add(i64::from(hold_up_time)),
        None => true,
    }
}
