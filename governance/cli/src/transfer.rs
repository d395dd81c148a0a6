//! SOL deposits into and withdrawals out of the treasury

use {
    crate::{
        client::{process_instructions, ProgramClient},
        error::MultisigResult,
        instruction::GovernedInstruction,
        multisig::Multisig,
    },
    log::info,
    solana_sdk::{
        native_token::lamports_to_sol,
        pubkey::Pubkey,
        signature::{Signature, Signer},
        system_instruction,
    },
};

/// Transfers `lamports` from `payer` straight into the treasury. Deposits
/// need no approval.
pub async fn deposit_sol(
    client: &dyn ProgramClient,
    payer: &dyn Signer,
    multisig: &Multisig,
    lamports: u64,
) -> MultisigResult<Signature> {
    let instruction = system_instruction::transfer(&payer.pubkey(), &multisig.treasury, lamports);
    let signature = process_instructions(client, payer, &[instruction], &[]).await?;
    info!(
        "Deposited {} SOL into treasury {}",
        lamports_to_sol(lamports),
        multisig.treasury
    );
    info!("  Signature: {}", signature);
    Ok(signature)
}

/// Transfer out of the treasury; only an executed proposal can apply it.
pub fn transfer_sol_instruction(
    multisig: &Multisig,
    to: &Pubkey,
    lamports: u64,
) -> GovernedInstruction {
    multisig.governed(system_instruction::transfer(
        &multisig.treasury,
        to,
        lamports,
    ))
}
