//! Multisig bootstrap: realm, governance and native treasury

use {
    crate::{
        client::{account_info, process_instructions, ProgramClient},
        config::MultisigConfig,
        error::{MultisigError, MultisigResult},
        instruction::GovernedInstruction,
        member::add_initial_member,
        token::{create_mint, set_mint_authority_instruction},
    },
    log::info,
    solana_sdk::{instruction::Instruction, pubkey::Pubkey, signature::Signer},
    spl_governance::{
        instruction::{create_governance, create_native_treasury, create_realm, set_realm_authority},
        state::{
            enums::{MintMaxVoterWeightSource, VoteThreshold, VoteTipping},
            governance::{get_governance_address, GovernanceConfig},
            native_treasury::get_native_treasury_address,
            proposal::get_proposal_address,
            proposal_transaction::get_proposal_transaction_address,
            realm::{
                get_governing_token_holding_address, get_realm_address, get_realm_data,
                GoverningTokenConfigAccountArgs, SetRealmAuthorityAction,
            },
            realm_config::GoverningTokenType,
            token_owner_record::get_token_owner_record_address,
        },
    },
};

/// Voter weight that can never be reached, used to switch off the community track
pub const DISABLED_VOTER_WEIGHT: u64 = u64::MAX;

/// Addresses of a multisig
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Multisig {
    pub program_id: Pubkey,
    pub name: String,
    /// Council mint; one unit per member
    pub membership_token: Pubkey,
    /// Community mint, dormant unless the realm is reconfigured for recovery
    pub recovery_token: Pubkey,
    pub realm: Pubkey,
    pub governance: Pubkey,
    pub treasury: Pubkey,
}

impl Multisig {
    pub fn new(
        program_id: &Pubkey,
        name: &str,
        membership_token: &Pubkey,
        recovery_token: &Pubkey,
    ) -> Self {
        let (realm, governance, treasury) = Self::derive_addresses(program_id, name);

        Self {
            program_id: *program_id,
            name: name.to_string(),
            membership_token: *membership_token,
            recovery_token: *recovery_token,
            realm,
            governance,
            treasury,
        }
    }

    /// Realm, governance and treasury of the multisig called `name`
    pub fn derive_addresses(program_id: &Pubkey, name: &str) -> (Pubkey, Pubkey, Pubkey) {
        let realm = get_realm_address(program_id, name);
        let governance = get_governance_address(program_id, &realm, &Self::governance_seed(&realm));
        let treasury = get_native_treasury_address(program_id, &governance);
        (realm, governance, treasury)
    }

    /// The realm address doubles as the seed of its only governance
    pub fn governance_seed(realm: &Pubkey) -> Pubkey {
        *realm
    }

    pub fn token_owner_record(&self, member: &Pubkey) -> Pubkey {
        get_token_owner_record_address(
            &self.program_id,
            &self.realm,
            &self.membership_token,
            member,
        )
    }

    pub fn proposal_address(&self, proposal_seed: &Pubkey) -> Pubkey {
        get_proposal_address(
            &self.program_id,
            &self.governance,
            &self.membership_token,
            proposal_seed,
        )
    }

    /// Address of the single transaction of `proposal` (option 0, index 0)
    pub fn proposal_transaction_address(&self, proposal: &Pubkey) -> Pubkey {
        get_proposal_transaction_address(
            &self.program_id,
            proposal,
            &0_u8.to_le_bytes(),
            &0_u16.to_le_bytes(),
        )
    }

    /// Token account holding the deposited membership units
    pub fn membership_holding_address(&self) -> Pubkey {
        get_governing_token_holding_address(&self.program_id, &self.realm, &self.membership_token)
    }

    /// Wraps `instruction`, letting governance sign for the treasury and itself
    pub fn governed(&self, instruction: Instruction) -> GovernedInstruction {
        GovernedInstruction::from_instruction(instruction, &[self.treasury, self.governance])
    }
}

/// Reads the mints of an existing multisig from its realm account
pub async fn load_multisig(
    client: &dyn ProgramClient,
    program_id: &Pubkey,
    name: &str,
) -> MultisigResult<Multisig> {
    let realm = get_realm_address(program_id, name);
    let mut account = client
        .get_account(&realm)
        .await
        .map_err(MultisigError::Client)?
        .ok_or(MultisigError::AccountNotFound(realm))?;
    let realm_data = get_realm_data(program_id, &account_info(&realm, &mut account))?;
    let membership_token = realm_data.config.council_mint.ok_or_else(|| {
        MultisigError::InvalidConfig(format!("realm {} has no council mint", realm))
    })?;

    Ok(Multisig::new(
        program_id,
        name,
        &membership_token,
        &realm_data.community_mint,
    ))
}

/// Council-only governance: the community track is disabled and every
/// proposal is decided by membership token holders.
pub fn governance_config(config: &MultisigConfig) -> GovernanceConfig {
    GovernanceConfig {
        community_vote_threshold: VoteThreshold::Disabled,
        min_community_weight_to_create_proposal: DISABLED_VOTER_WEIGHT,
        min_transaction_hold_up_time: config.min_transaction_hold_up_time,
        voting_base_time: config.voting_base_time,
        community_vote_tipping: VoteTipping::Disabled,
        council_vote_threshold: VoteThreshold::YesVotePercentage(
            config.council_vote_threshold_percentage,
        ),
        council_veto_vote_threshold: VoteThreshold::Disabled,
        min_council_weight_to_create_proposal: 1,
        council_vote_tipping: VoteTipping::Strict,
        community_veto_vote_threshold: VoteThreshold::Disabled,
        voting_cool_off_time: config.voting_cool_off_time,
        deposit_exempt_proposal_count: config.deposit_exempt_proposal_count,
    }
}

/// Realm, governance and native treasury creation, authorized by `payer`
pub fn create_multisig_instructions(
    multisig: &Multisig,
    payer: &Pubkey,
    config: &MultisigConfig,
) -> Vec<Instruction> {
    let realm_instruction = create_realm(
        &multisig.program_id,
        payer,
        &multisig.recovery_token,
        payer,
        Some(multisig.membership_token),
        Some(GoverningTokenConfigAccountArgs {
            voter_weight_addin: None,
            max_voter_weight_addin: None,
            token_type: GoverningTokenType::Dormant,
        }),
        Some(GoverningTokenConfigAccountArgs {
            voter_weight_addin: None,
            max_voter_weight_addin: None,
            token_type: GoverningTokenType::Membership,
        }),
        multisig.name.clone(),
        DISABLED_VOTER_WEIGHT,
        MintMaxVoterWeightSource::FULL_SUPPLY_FRACTION,
    );

    // The realm authority creates the governance, so no token owner record is consulted
    let governance_instruction = create_governance(
        &multisig.program_id,
        &multisig.realm,
        Some(&Multisig::governance_seed(&multisig.realm)),
        &multisig.token_owner_record(payer),
        payer,
        payer,
        None,
        governance_config(config),
    );

    let treasury_instruction =
        create_native_treasury(&multisig.program_id, &multisig.governance, payer);

    vec![
        realm_instruction,
        governance_instruction,
        treasury_instruction,
    ]
}

/// Hands mint authority to the treasury and realm authority to the governance
pub fn transfer_authority_instructions(
    multisig: &Multisig,
    authority: &Pubkey,
) -> MultisigResult<Vec<Instruction>> {
    Ok(vec![
        set_mint_authority_instruction(&multisig.membership_token, authority, &multisig.treasury)?,
        set_realm_authority(
            &multisig.program_id,
            &multisig.realm,
            authority,
            Some(&multisig.governance),
            SetRealmAuthorityAction::SetChecked,
        ),
    ])
}

/// Creates a multisig with one membership unit per member. After this
/// returns, membership and treasury changes require an executed proposal.
pub async fn create_multisig(
    client: &dyn ProgramClient,
    payer: &dyn Signer,
    members: &[&dyn Signer],
    config: &MultisigConfig,
) -> MultisigResult<Multisig> {
    config.validate()?;
    if members.is_empty() {
        return Err(MultisigError::NoMembers);
    }

    let membership_token = create_mint(client, payer).await?;
    let recovery_token = create_mint(client, payer).await?;
    let multisig = Multisig::new(
        &config.program_id,
        &config.name,
        &membership_token,
        &recovery_token,
    );

    let signature = process_instructions(
        client,
        payer,
        &create_multisig_instructions(&multisig, &payer.pubkey(), config),
        &[],
    )
    .await?;
    info!(
        "Created multisig \"{}\" at realm {} with governance {}",
        multisig.name, multisig.realm, multisig.governance
    );
    info!("  Signature: {}", signature);

    for member in members {
        add_initial_member(client, &multisig, payer, *member).await?;
    }

    let signature = process_instructions(
        client,
        payer,
        &transfer_authority_instructions(&multisig, &payer.pubkey())?,
        &[],
    )
    .await?;
    info!(
        "Transferred mint authority to treasury {} and realm authority to governance {}",
        multisig.treasury, multisig.governance
    );
    info!("  Signature: {}", signature);

    Ok(multisig)
}
