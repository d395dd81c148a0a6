//! Adding and removing multisig members

use {
    crate::{
        client::{process_instructions, ProgramClient},
        error::MultisigResult,
        instruction::GovernedInstruction,
        multisig::Multisig,
    },
    log::info,
    solana_sdk::{
        pubkey::Pubkey,
        signature::{Signature, Signer},
    },
    spl_governance::instruction::{deposit_governing_tokens, revoke_governing_tokens},
};

/// Voting power of a single member
pub const MEMBERSHIP_UNIT: u64 = 1;

/// Mints one membership unit into `member`'s token owner record while
/// `payer` still holds the mint authority.
pub async fn add_initial_member(
    client: &dyn ProgramClient,
    multisig: &Multisig,
    payer: &dyn Signer,
    member: &dyn Signer,
) -> MultisigResult<Signature> {
    let instruction = deposit_governing_tokens(
        &multisig.program_id,
        &multisig.realm,
        &multisig.membership_token,
        &member.pubkey(),
        &payer.pubkey(),
        &payer.pubkey(),
        MEMBERSHIP_UNIT,
        &multisig.membership_token,
    );

    let signature = process_instructions(client, payer, &[instruction], &[member]).await?;
    info!(
        "Added member {} to multisig \"{}\"",
        member.pubkey(),
        multisig.name
    );
    info!("  Signature: {}", signature);
    Ok(signature)
}

/// Mints one membership unit to `member` with the treasury as mint
/// authority. Only an executed proposal can apply it; `member` and `payer`
/// sign the execution.
pub fn add_subsequent_member(
    multisig: &Multisig,
    member: &Pubkey,
    payer: &Pubkey,
) -> GovernedInstruction {
    multisig.governed(deposit_governing_tokens(
        &multisig.program_id,
        &multisig.realm,
        &multisig.membership_token,
        member,
        &multisig.treasury,
        payer,
        MEMBERSHIP_UNIT,
        &multisig.membership_token,
    ))
}

/// Burns `member`'s membership unit. Only an executed proposal can apply it.
pub fn remove_member(multisig: &Multisig, member: &Pubkey) -> GovernedInstruction {
    multisig.governed(revoke_governing_tokens(
        &multisig.program_id,
        &multisig.realm,
        member,
        &multisig.membership_token,
        &multisig.treasury,
        MEMBERSHIP_UNIT,
    ))
}
