//! Membership and recovery token mints

use {
    crate::{
        client::{process_instructions, ProgramClient},
        error::{MultisigError, MultisigResult},
    },
    log::info,
    solana_sdk::{
        instruction::Instruction,
        program_pack::Pack,
        pubkey::Pubkey,
        signature::{Keypair, Signer},
        system_instruction,
    },
    spl_token::{instruction::AuthorityType, state::Mint},
};

/// Governing tokens are whole units: one unit is one vote.
pub const MEMBERSHIP_TOKEN_DECIMALS: u8 = 0;

/// Instructions creating a zero-decimal mint controlled by `mint_authority`
pub fn create_mint_instructions(
    payer: &Pubkey,
    mint: &Pubkey,
    mint_authority: &Pubkey,
    rent_lamports: u64,
) -> MultisigResult<Vec<Instruction>> {
    Ok(vec![
        system_instruction::create_account(
            payer,
            mint,
            rent_lamports,
            Mint::LEN as u64,
            &spl_token::id(),
        ),
        spl_token::instruction::initialize_mint(
            &spl_token::id(),
            mint,
            mint_authority,
            None,
            MEMBERSHIP_TOKEN_DECIMALS,
        )?,
    ])
}

/// Creates a new mint with `payer` as mint authority and no freeze authority
pub async fn create_mint(client: &dyn ProgramClient, payer: &dyn Signer) -> MultisigResult<Pubkey> {
    let mint = Keypair::new();
    let rent_lamports = client
        .get_minimum_balance_for_rent_exemption(Mint::LEN)
        .await
        .map_err(MultisigError::Client)?;

    let instructions =
        create_mint_instructions(&payer.pubkey(), &mint.pubkey(), &payer.pubkey(), rent_lamports)?;
    let signature = process_instructions(client, payer, &instructions, &[&mint]).await?;

    info!("Created token {}", mint.pubkey());
    info!("  Signature: {}", signature);
    Ok(mint.pubkey())
}

pub fn set_mint_authority_instruction(
    mint: &Pubkey,
    current_authority: &Pubkey,
    new_authority: &Pubkey,
) -> MultisigResult<Instruction> {
    spl_token::instruction::set_authority(
        &spl_token::id(),
        mint,
        Some(new_authority),
        AuthorityType::MintTokens,
        current_authority,
        &[],
    )
    .map_err(Into::into)
}
