use {
    clap::{
        crate_description, crate_name, crate_version, value_t_or_exit, App, AppSettings, Arg,
        ArgMatches, SubCommand,
    },
    solana_clap_utils::{
        input_parsers::{lamports_of_sol, pubkey_of},
        input_validators::{is_amount, is_keypair, is_url, is_valid_percentage, is_valid_pubkey},
    },
    solana_client::nonblocking::rpc_client::RpcClient,
    solana_sdk::{
        commitment_config::CommitmentConfig,
        native_token::lamports_to_sol,
        pubkey::Pubkey,
        signature::{read_keypair_file, Keypair, Signer},
    },
    spl_governance_multisig::{
        client::{ProgramClient, ProgramRpcClient},
        config::{ExecutionWait, MultisigConfig, ScenarioConfig},
        member::{add_subsequent_member, remove_member},
        multisig::{create_multisig, load_multisig},
        scenario::{run_proposal, run_treasury_scenario},
        transfer::{deposit_sol, transfer_sol_instruction},
        Multisig, MultisigError, DEFAULT_GOVERNANCE_PROGRAM_ID,
    },
    std::{error::Error, sync::Arc},
};

struct Config {
    keypair: Keypair,
    json_rpc_url: String,
    program_id: Pubkey,
    verbose: bool,
}

fn name_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("name")
        .value_name("NAME")
        .index(1)
        .required(true)
        .help("Name of the multisig realm")
}

fn voter_arg<'a, 'b>() -> Arg<'a, 'b> {
    Arg::with_name("voter")
        .long("voter")
        .value_name("KEYPAIR")
        .validator(is_keypair)
        .takes_value(true)
        .multiple(true)
        .number_of_values(1)
        .help("Member approving the proposal, in addition to the client keypair")
}

fn keypairs_of(matches: &ArgMatches<'_>, name: &str) -> Result<Vec<Keypair>, Box<dyn Error>> {
    matches
        .values_of(name)
        .map(|paths| paths.map(read_keypair_file).collect())
        .unwrap_or_else(|| Ok(vec![]))
}

/// The client keypair owns every proposal and casts the first approval.
/// A keypair given more than once is kept once.
fn voters<'a>(payer: &'a Keypair, voters: &'a [Keypair]) -> Vec<&'a dyn Signer> {
    let mut signers: Vec<&dyn Signer> = vec![payer];
    for voter in voters {
        if !signers.iter().any(|signer| signer.pubkey() == voter.pubkey()) {
            signers.push(voter);
        }
    }
    signers
}

fn print_multisig(multisig: &Multisig) {
    println!("Realm: {}", multisig.realm);
    println!("Governance: {}", multisig.governance);
    println!("Treasury: {}", multisig.treasury);
    println!("Membership token: {}", multisig.membership_token);
    println!("Recovery token: {}", multisig.recovery_token);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let default_program_id = DEFAULT_GOVERNANCE_PROGRAM_ID.to_string();
    let app_matches = App::new(crate_name!())
        .about(crate_description!())
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg({
            let arg = Arg::with_name("config_file")
                .short("C")
                .long("config")
                .value_name("PATH")
                .takes_value(true)
                .global(true)
                .help("Configuration file to use");
            if let Some(ref config_file) = *solana_cli_config::CONFIG_FILE {
                arg.default_value(config_file)
            } else {
                arg
            }
        })
        .arg(
            Arg::with_name("keypair")
                .long("keypair")
                .value_name("KEYPAIR")
                .validator(is_keypair)
                .takes_value(true)
                .global(true)
                .help("Filepath or URL to a keypair [default: client keypair]"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .takes_value(false)
                .global(true)
                .help("Show additional information"),
        )
        .arg(
            Arg::with_name("log_level")
                .short("L")
                .long("log-level")
                .takes_value(true)
                .default_value("info")
                .global(true)
                .possible_values(&["debug", "info", "warn", "error"])
                .help("Log verbosity level"),
        )
        .arg(
            Arg::with_name("json_rpc_url")
                .long("url")
                .value_name("URL")
                .takes_value(true)
                .global(true)
                .validator(is_url)
                .help("JSON RPC URL for the cluster [default: value from configuration file]"),
        )
        .arg(
            Arg::with_name("program_id")
                .long("program")
                .value_name("PROGRAM_ID")
                .takes_value(true)
                .global(true)
                .validator(is_valid_pubkey)
                .default_value(&default_program_id)
                .help("SPL Governance Program ID"),
        )
        .subcommand(
            SubCommand::with_name("address")
                .about("Display the realm, governance and treasury addresses of a multisig")
                .arg(name_arg()),
        )
        .subcommand(
            SubCommand::with_name("create-multisig")
                .about("Create a multisig with the client keypair as its first member")
                .arg(name_arg())
                .arg(
                    Arg::with_name("threshold")
                        .long("threshold")
                        .value_name("PERCENTAGE")
                        .takes_value(true)
                        .validator(is_valid_percentage)
                        .default_value("60")
                        .help("Member approval percentage required to pass a proposal"),
                )
                .arg(
                    Arg::with_name("voting_time")
                        .long("voting-time")
                        .value_name("SECONDS")
                        .takes_value(true)
                        .default_value("86400")
                        .help("Seconds a proposal stays open for voting"),
                )
                .arg(
                    Arg::with_name("member")
                        .long("member")
                        .value_name("KEYPAIR")
                        .validator(is_keypair)
                        .takes_value(true)
                        .multiple(true)
                        .number_of_values(1)
                        .help("Additional member; every member signs the bootstrap"),
                ),
        )
        .subcommand(
            SubCommand::with_name("deposit")
                .about("Deposit SOL into the multisig treasury")
                .arg(name_arg())
                .arg(
                    Arg::with_name("amount")
                        .value_name("AMOUNT")
                        .validator(is_amount)
                        .index(2)
                        .required(true)
                        .help("Amount of SOL to deposit"),
                ),
        )
        .subcommand(
            SubCommand::with_name("withdraw")
                .about("Propose, approve and execute a transfer out of the treasury")
                .arg(name_arg())
                .arg(
                    Arg::with_name("amount")
                        .value_name("AMOUNT")
                        .validator(is_amount)
                        .index(2)
                        .required(true)
                        .help("Amount of SOL to withdraw"),
                )
                .arg(
                    Arg::with_name("recipient")
                        .value_name("RECIPIENT_ADDRESS")
                        .validator(is_valid_pubkey)
                        .index(3)
                        .required(true)
                        .help("Account receiving the withdrawal"),
                )
                .arg(voter_arg()),
        )
        .subcommand(
            SubCommand::with_name("add-member")
                .about("Propose, approve and execute adding a member")
                .arg(name_arg())
                .arg(
                    Arg::with_name("member")
                        .value_name("MEMBER_KEYPAIR")
                        .validator(is_keypair)
                        .index(2)
                        .required(true)
                        .help("Keypair of the new member, who signs the execution"),
                )
                .arg(voter_arg()),
        )
        .subcommand(
            SubCommand::with_name("remove-member")
                .about("Propose, approve and execute removing a member")
                .arg(name_arg())
                .arg(
                    Arg::with_name("member")
                        .value_name("MEMBER_ADDRESS")
                        .validator(is_valid_pubkey)
                        .index(2)
                        .required(true)
                        .help("Address of the member to remove"),
                )
                .arg(voter_arg()),
        )
        .subcommand(
            SubCommand::with_name("run-scenario")
                .about("Bootstrap a fresh multisig and withdraw from its treasury end to end")
                .arg(
                    Arg::with_name("scenario_file")
                        .value_name("SCENARIO_FILE")
                        .index(1)
                        .help("YAML scenario parameters [default: built-in defaults]"),
                ),
        )
        .get_matches();

    let (sub_command, sub_matches) = app_matches.subcommand();
    let matches = sub_matches.unwrap();

    let log_level = "solana=".to_string() + matches.value_of("log_level").unwrap();
    solana_logger::setup_with_default(log_level.as_str());

    let config = {
        let cli_config = if let Some(config_file) = matches.value_of("config_file") {
            solana_cli_config::Config::load(config_file).unwrap_or_default()
        } else {
            solana_cli_config::Config::default()
        };

        Config {
            json_rpc_url: matches
                .value_of("json_rpc_url")
                .unwrap_or(&cli_config.json_rpc_url)
                .to_string(),
            keypair: read_keypair_file(
                matches
                    .value_of("keypair")
                    .unwrap_or(&cli_config.keypair_path),
            )?,
            program_id: pubkey_of(matches, "program_id").unwrap(),
            verbose: matches.is_present("verbose"),
        }
    };
    if config.verbose {
        println!("JSON RPC URL: {}", config.json_rpc_url);
        println!("Payer: {}", config.keypair.pubkey());
        println!("Governance program: {}", config.program_id);
    }

    let rpc_client = ProgramRpcClient::new(Arc::new(RpcClient::new_with_commitment(
        config.json_rpc_url.clone(),
        CommitmentConfig::confirmed(),
    )));
    let client: &dyn ProgramClient = &rpc_client;
    let payer = &config.keypair;

    match (sub_command, sub_matches) {
        ("address", Some(arg_matches)) => {
            let name = arg_matches.value_of("name").unwrap();
            let (realm, governance, treasury) =
                Multisig::derive_addresses(&config.program_id, name);
            println!("Realm: {}", realm);
            println!("Governance: {}", governance);
            println!("Treasury: {}", treasury);
        }
        ("create-multisig", Some(arg_matches)) => {
            let name = arg_matches.value_of("name").unwrap();
            let mut multisig_config = MultisigConfig::new(config.program_id, name)
                .with_threshold(value_t_or_exit!(arg_matches, "threshold", u8));
            multisig_config.voting_base_time = value_t_or_exit!(arg_matches, "voting_time", u32);

            let members = keypairs_of(arg_matches, "member")?;
            let multisig =
                create_multisig(client, payer, &voters(payer, &members), &multisig_config).await?;
            print_multisig(&multisig);
        }
        ("deposit", Some(arg_matches)) => {
            let name = arg_matches.value_of("name").unwrap();
            let lamports = lamports_of_sol(arg_matches, "amount").unwrap();

            let multisig = load_multisig(client, &config.program_id, name).await?;
            deposit_sol(client, payer, &multisig, lamports).await?;
            let balance = client
                .get_balance(&multisig.treasury)
                .await
                .map_err(MultisigError::Client)?;
            println!("Treasury balance: {} SOL", lamports_to_sol(balance));
        }
        ("withdraw", Some(arg_matches)) => {
            let name = arg_matches.value_of("name").unwrap();
            let lamports = lamports_of_sol(arg_matches, "amount").unwrap();
            let recipient = pubkey_of(arg_matches, "recipient").unwrap();
            let voter_keypairs = keypairs_of(arg_matches, "voter")?;

            let multisig = load_multisig(client, &config.program_id, name).await?;
            let proposal = run_proposal(
                client,
                payer,
                payer,
                &multisig,
                &format!("Withdraw {} SOL", lamports_to_sol(lamports)),
                &format!(
                    "Transfer {} SOL from the treasury to {}",
                    lamports_to_sol(lamports),
                    recipient
                ),
                transfer_sol_instruction(&multisig, &recipient, lamports),
                &voters(payer, &voter_keypairs),
                &[],
                &ExecutionWait::default(),
            )
            .await?;
            println!("Proposal: {}", proposal.address());
            let balance = client
                .get_balance(&recipient)
                .await
                .map_err(MultisigError::Client)?;
            println!("Recipient balance: {} SOL", lamports_to_sol(balance));
        }
        ("add-member", Some(arg_matches)) => {
            let name = arg_matches.value_of("name").unwrap();
            let member = read_keypair_file(arg_matches.value_of("member").unwrap())?;
            let voter_keypairs = keypairs_of(arg_matches, "voter")?;

            let multisig = load_multisig(client, &config.program_id, name).await?;
            let proposal = run_proposal(
                client,
                payer,
                payer,
                &multisig,
                "Add member",
                &format!("Mint a membership token to {}", member.pubkey()),
                add_subsequent_member(&multisig, &member.pubkey(), &payer.pubkey()),
                &voters(payer, &voter_keypairs),
                &[&member],
                &ExecutionWait::default(),
            )
            .await?;
            println!("Proposal: {}", proposal.address());
            println!("Member: {}", member.pubkey());
        }
        ("remove-member", Some(arg_matches)) => {
            let name = arg_matches.value_of("name").unwrap();
            let member = pubkey_of(arg_matches, "member").unwrap();
            let voter_keypairs = keypairs_of(arg_matches, "voter")?;

            let multisig = load_multisig(client, &config.program_id, name).await?;
            let proposal = run_proposal(
                client,
                payer,
                payer,
                &multisig,
                "Remove member",
                &format!("Revoke the membership token of {}", member),
                remove_member(&multisig, &member),
                &voters(payer, &voter_keypairs),
                &[],
                &ExecutionWait::default(),
            )
            .await?;
            println!("Proposal: {}", proposal.address());
        }
        ("run-scenario", Some(arg_matches)) => {
            let scenario = match arg_matches.value_of("scenario_file") {
                Some(path) => ScenarioConfig::load(path)?,
                None => {
                    let mut scenario = ScenarioConfig::default();
                    scenario.multisig.program_id = config.program_id;
                    scenario
                }
            };

            let report = run_treasury_scenario(client, payer, &scenario).await?;
            print_multisig(&report.multisig);
            println!("Proposal: {}", report.proposal);
            println!(
                "Recipient {}: {} SOL -> {} SOL",
                report.recipient,
                lamports_to_sol(report.recipient_balance_before),
                lamports_to_sol(report.recipient_balance_after)
            );
            println!(
                "Treasury balance: {} SOL",
                lamports_to_sol(report.treasury_balance)
            );
        }
        _ => unreachable!(),
    }

    Ok(())
}
