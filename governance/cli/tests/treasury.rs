mod program_test;

use {
    program_test::*,
    solana_program_test::tokio,
    solana_sdk::{
        commitment_config::CommitmentConfig,
        instruction::InstructionError,
        native_token::sol_to_lamports,
        signature::{Keypair, Signer},
        transaction::TransactionError,
    },
    spl_governance::error::GovernanceError,
    spl_governance_multisig::{
        config::ScenarioConfig,
        proposal::{Proposal, ProposalStage},
        scenario::run_treasury_scenario,
        transfer::{deposit_sol, transfer_sol_instruction},
    },
};

#[tokio::test]
async fn test_deposit_sol() {
    // Arrange
    let test = MultisigProgramTest::start_new().await;
    let (multisig, _) = test.with_multisig("deposit", 1, 60).await;
    let treasury_balance = test.get_balance(&multisig.treasury).await;

    // Act
    deposit_sol(&test.client, &test.payer, &multisig, sol_to_lamports(0.15))
        .await
        .unwrap();

    // Assert
    assert_eq!(
        treasury_balance + sol_to_lamports(0.15),
        test.get_balance(&multisig.treasury).await
    );
}

#[tokio::test]
async fn test_withdraw_sol_requires_every_member_at_49_percent() {
    // Arrange
    let test = MultisigProgramTest::start_new().await;
    let (multisig, members) = test.with_multisig("withdraw", 2, 49).await;
    deposit_sol(&test.client, &test.payer, &multisig, sol_to_lamports(0.15))
        .await
        .unwrap();

    let recipient = members[1].pubkey();
    let recipient_balance = test.get_balance(&recipient).await;
    let treasury_balance = test.get_balance(&multisig.treasury).await;

    let mut proposal = Proposal::new(
        &multisig,
        &members[0].pubkey(),
        "Withdraw 0.1 SOL",
        "Pay the second member",
        &Proposal::new_seed(),
        transfer_sol_instruction(&multisig, &recipient, sol_to_lamports(0.10)),
    );
    proposal
        .propose(&test.client, &test.payer, &members[0])
        .await
        .unwrap();
    proposal
        .cast_vote(&test.client, &test.payer, &members[0])
        .await
        .unwrap();

    // Act
    let err = proposal
        .execute(&test.client, &test.payer, &[], &test.execution_wait())
        .await
        .unwrap_err();

    // Assert
    assert_eq!(
        TransactionError::InstructionError(
            0,
            InstructionError::Custom(GovernanceError::InvalidStateCannotExecuteTransaction as u32)
        ),
        transaction_error(err)
    );
    assert_eq!(ProposalStage::Voted(1), proposal.stage());
    assert_eq!(recipient_balance, test.get_balance(&recipient).await);

    // Act
    proposal
        .cast_vote(&test.client, &test.payer, &members[1])
        .await
        .unwrap();
    proposal
        .execute(&test.client, &test.payer, &[], &test.execution_wait())
        .await
        .unwrap();

    // Assert
    assert_eq!(ProposalStage::Executed, proposal.stage());
    assert_eq!(
        recipient_balance + sol_to_lamports(0.10),
        test.get_balance(&recipient).await
    );
    assert_eq!(
        treasury_balance - sol_to_lamports(0.10),
        test.get_balance(&multisig.treasury).await
    );
}

#[tokio::test]
async fn test_run_treasury_scenario() {
    // Arrange
    let test = MultisigProgramTest::start_new().await;
    let payer = Keypair::new();
    let config = ScenarioConfig {
        multisig: test.multisig_config("scenario", 49),
        execution_commitment: CommitmentConfig::processed(),
        confirmation_timeout_secs: 30,
        poll_interval_ms: 10,
        ..ScenarioConfig::default()
    };

    // Act
    let report = run_treasury_scenario(&test.client, &payer, &config)
        .await
        .unwrap();

    // Assert
    assert_eq!(1, report.members.len());
    assert_eq!(report.members[0].pubkey(), report.recipient);
    assert_eq!(
        report.recipient_balance_before + config.withdraw_lamports(),
        report.recipient_balance_after
    );
    assert!(
        report.treasury_balance >= config.deposit_lamports() - config.withdraw_lamports()
    );
    assert_eq!(
        report.treasury_balance,
        test.get_balance(&report.multisig.treasury).await
    );

    let record = test
        .get_token_owner_record(&report.multisig, &payer.pubkey())
        .await;
    assert_eq!(1, record.governing_token_deposit_amount);
}
