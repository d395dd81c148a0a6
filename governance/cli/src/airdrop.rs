use {
    crate::{
        client::ProgramClient,
        error::{MultisigError, MultisigResult},
    },
    log::info,
    solana_sdk::{
        commitment_config::CommitmentConfig, native_token::lamports_to_sol, pubkey::Pubkey,
        signature::Signature,
    },
};

/// Requests `lamports` for `recipient` and blocks until the airdrop is confirmed
pub async fn airdrop(
    client: &dyn ProgramClient,
    recipient: &Pubkey,
    lamports: u64,
) -> MultisigResult<Signature> {
    let signature = client
        .request_airdrop(recipient, lamports)
        .await
        .map_err(MultisigError::Client)?;
    let blockhash = client
        .get_latest_blockhash()
        .await
        .map_err(MultisigError::Client)?;
    client
        .confirm_transaction(&signature, &blockhash, CommitmentConfig::confirmed())
        .await
        .map_err(MultisigError::Client)?;

    info!(
        "Airdropped {} SOL to {}",
        lamports_to_sol(lamports),
        recipient
    );
    info!("  Signature: {}", signature);
    Ok(signature)
}
