//! End-to-end multisig flows driven by a [`ScenarioConfig`]

use {
    crate::{
        airdrop::airdrop,
        client::ProgramClient,
        config::{ExecutionWait, ScenarioConfig},
        error::{MultisigError, MultisigResult},
        instruction::GovernedInstruction,
        member::{add_subsequent_member, remove_member},
        multisig::{create_multisig, Multisig},
        proposal::Proposal,
        transfer::{deposit_sol, transfer_sol_instruction},
    },
    log::info,
    solana_sdk::{
        native_token::lamports_to_sol,
        pubkey::Pubkey,
        signature::{Keypair, Signer},
    },
};

/// Outcome of [`run_treasury_scenario`]
#[derive(Debug)]
pub struct TreasuryReport {
    pub multisig: Multisig,
    pub members: Vec<Keypair>,
    pub proposal: Pubkey,
    pub recipient: Pubkey,
    pub recipient_balance_before: u64,
    pub recipient_balance_after: u64,
    pub treasury_balance: u64,
}

/// Proposes `instruction`, collects one approval per voter and executes it.
/// `owner` must be a member; `signers` must cover the instruction's wallet
/// signers.
#[allow(clippy::too_many_arguments)]
pub async fn run_proposal(
    client: &dyn ProgramClient,
    payer: &dyn Signer,
    owner: &dyn Signer,
    multisig: &Multisig,
    title: &str,
    description: &str,
    instruction: GovernedInstruction,
    voters: &[&dyn Signer],
    signers: &[&dyn Signer],
    wait: &ExecutionWait,
) -> MultisigResult<Proposal> {
    if voters.is_empty() {
        return Err(MultisigError::NoMembers);
    }

    let mut proposal = Proposal::new(
        multisig,
        &owner.pubkey(),
        title,
        description,
        &Proposal::new_seed(),
        instruction,
    );
    proposal.propose(client, payer, owner).await?;
    for voter in voters {
        proposal.cast_vote(client, payer, *voter).await?;
    }
    proposal.execute(client, payer, signers, wait).await?;
    Ok(proposal)
}

/// Bootstraps a multisig whose first member is `payer`, funds its treasury
/// and withdraws part of the deposit to the second member through a
/// proposal approved by `voter_count` members.
pub async fn run_treasury_scenario(
    client: &dyn ProgramClient,
    payer: &dyn Signer,
    config: &ScenarioConfig,
) -> MultisigResult<TreasuryReport> {
    config.validate()?;

    airdrop(client, &payer.pubkey(), config.airdrop_lamports()).await?;

    let members: Vec<Keypair> = (1..config.member_count).map(|_| Keypair::new()).collect();
    let mut member_signers: Vec<&dyn Signer> = vec![payer];
    member_signers.extend(members.iter().map(|member| member as &dyn Signer));

    let multisig = create_multisig(client, payer, &member_signers, &config.multisig).await?;

    deposit_sol(client, payer, &multisig, config.deposit_lamports()).await?;

    let recipient = member_signers
        .get(1)
        .map(|member| member.pubkey())
        .unwrap_or_else(|| payer.pubkey());
    let recipient_balance_before = client
        .get_balance(&recipient)
        .await
        .map_err(MultisigError::Client)?;

    let proposal = run_proposal(
        client,
        payer,
        payer,
        &multisig,
        &format!("Withdraw {} SOL", config.withdraw_sol),
        &format!("Transfer {} SOL from the treasury to {}", config.withdraw_sol, recipient),
        transfer_sol_instruction(&multisig, &recipient, config.withdraw_lamports()),
        &member_signers[..config.voter_count()],
        &[],
        &config.execution_wait(),
    )
    .await?;

    let recipient_balance_after = client
        .get_balance(&recipient)
        .await
        .map_err(MultisigError::Client)?;
    let treasury_balance = client
        .get_balance(&multisig.treasury)
        .await
        .map_err(MultisigError::Client)?;
    info!(
        "Recipient {} balance: {} SOL -> {} SOL, treasury balance: {} SOL",
        recipient,
        lamports_to_sol(recipient_balance_before),
        lamports_to_sol(recipient_balance_after),
        lamports_to_sol(treasury_balance)
    );

    Ok(TreasuryReport {
        proposal: *proposal.address(),
        multisig,
        members,
        recipient,
        recipient_balance_before,
        recipient_balance_after,
        treasury_balance,
    })
}

/// Adds `new_member` and then removes `removed_member`, each through its own
/// proposal owned by the first voter. `payer` funds the new member's token
/// owner record and signs that execution together with `new_member`.
pub async fn run_membership_scenario(
    client: &dyn ProgramClient,
    payer: &dyn Signer,
    multisig: &Multisig,
    voters: &[&dyn Signer],
    new_member: &dyn Signer,
    removed_member: &Pubkey,
    wait: &ExecutionWait,
) -> MultisigResult<(Proposal, Proposal)> {
    let owner = *voters.first().ok_or(MultisigError::NoMembers)?;

    let added = run_proposal(
        client,
        payer,
        owner,
        multisig,
        "Add member",
        &format!("Mint a membership token to {}", new_member.pubkey()),
        add_subsequent_member(multisig, &new_member.pubkey(), &payer.pubkey()),
        voters,
        &[new_member],
        wait,
    )
    .await?;

    let removed = run_proposal(
        client,
        payer,
        owner,
        multisig,
        "Remove member",
        &format!("Revoke the membership token of {}", removed_member),
        remove_member(multisig, removed_member),
        voters,
        &[],
        wait,
    )
    .await?;

    Ok((added, removed))
}
