//! Multisig policy and scenario parameters

use {
    crate::{
        error::{MultisigError, MultisigResult},
        DEFAULT_GOVERNANCE_PROGRAM_ID,
    },
    serde::{Deserialize, Deserializer},
    solana_sdk::{
        commitment_config::{CommitmentConfig, CommitmentLevel},
        native_token::sol_to_lamports,
        pubkey::{Pubkey, MAX_SEED_LEN},
    },
    std::{fs, path::Path, str::FromStr, time::Duration},
};

/// Bootstrap policy of a multisig
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct MultisigConfig {
    #[serde(deserialize_with = "deserialize_pubkey")]
    pub program_id: Pubkey,
    /// Realm name, unique per governance program
    pub name: String,
    /// Council yes vote percentage required to pass a proposal
    pub council_vote_threshold_percentage: u8,
    /// Seconds a proposal stays open for voting
    pub voting_base_time: u32,
    pub min_transaction_hold_up_time: u32,
    pub voting_cool_off_time: u32,
    pub deposit_exempt_proposal_count: u8,
}

impl Default for MultisigConfig {
    fn default() -> Self {
        Self {
            program_id: DEFAULT_GOVERNANCE_PROGRAM_ID,
            name: "multisig".to_string(),
            council_vote_threshold_percentage: 60,
            voting_base_time: 86_400,
            min_transaction_hold_up_time: 0,
            voting_cool_off_time: 0,
            deposit_exempt_proposal_count: 254,
        }
    }
}

impl MultisigConfig {
    pub fn new(program_id: Pubkey, name: &str) -> Self {
        Self {
            program_id,
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, council_vote_threshold_percentage: u8) -> Self {
        self.council_vote_threshold_percentage = council_vote_threshold_percentage;
        self
    }

    pub fn validate(&self) -> MultisigResult<()> {
        if self.name.is_empty() {
            return Err(MultisigError::InvalidConfig(
                "multisig name must not be empty".to_string(),
            ));
        }
        if self.name.len() > MAX_SEED_LEN {
            return Err(MultisigError::InvalidConfig(format!(
                "multisig name \"{}\" exceeds {} bytes",
                self.name, MAX_SEED_LEN
            )));
        }
        if !(1..=100).contains(&self.council_vote_threshold_percentage) {
            return Err(MultisigError::InvalidConfig(format!(
                "council vote threshold {}% is outside 1..=100",
                self.council_vote_threshold_percentage
            )));
        }
        Ok(())
    }
}

/// Parameters of an end-to-end run, loaded from a YAML file
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ScenarioConfig {
    pub multisig: MultisigConfig,
    /// Number of members, the payer included
    pub member_count: usize,
    /// Members approving the withdrawal, all of them when unset. Votes past
    /// the point where the proposal succeeds are rejected by the program.
    pub voter_count: Option<usize>,
    pub airdrop_sol: f64,
    pub deposit_sol: f64,
    pub withdraw_sol: f64,
    /// Commitment the last vote must reach before execution
    #[serde(deserialize_with = "deserialize_commitment")]
    pub execution_commitment: CommitmentConfig,
    pub confirmation_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            multisig: MultisigConfig::default(),
            member_count: 2,
            voter_count: None,
            airdrop_sol: 1.0,
            deposit_sol: 0.15,
            withdraw_sol: 0.10,
            execution_commitment: CommitmentConfig::finalized(),
            confirmation_timeout_secs: 60,
            poll_interval_ms: 500,
        }
    }
}

impl ScenarioConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> MultisigResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> MultisigResult<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MultisigResult<()> {
        self.multisig.validate()?;
        if self.member_count == 0 {
            return Err(MultisigError::NoMembers);
        }
        if let Some(voter_count) = self.voter_count {
            if voter_count == 0 || voter_count > self.member_count {
                return Err(MultisigError::InvalidConfig(format!(
                    "voter count {} is outside 1..={}",
                    voter_count, self.member_count
                )));
            }
        }
        for (field, amount) in [
            ("airdrop_sol", self.airdrop_sol),
            ("deposit_sol", self.deposit_sol),
            ("withdraw_sol", self.withdraw_sol),
        ] {
            if !(amount.is_finite() && amount > 0.0) {
                return Err(MultisigError::InvalidConfig(format!(
                    "{} must be a positive amount of SOL, got {}",
                    field, amount
                )));
            }
        }
        if self.withdraw_sol > self.deposit_sol {
            return Err(MultisigError::InvalidConfig(format!(
                "withdrawal of {} SOL exceeds the {} SOL deposit",
                self.withdraw_sol, self.deposit_sol
            )));
        }
        Ok(())
    }

    pub fn voter_count(&self) -> usize {
        self.voter_count.unwrap_or(self.member_count)
    }

    pub fn airdrop_lamports(&self) -> u64 {
        sol_to_lamports(self.airdrop_sol)
    }

    pub fn deposit_lamports(&self) -> u64 {
        sol_to_lamports(self.deposit_sol)
    }

    pub fn withdraw_lamports(&self) -> u64 {
        sol_to_lamports(self.withdraw_sol)
    }

    pub fn execution_wait(&self) -> ExecutionWait {
        ExecutionWait {
            commitment: self.execution_commitment,
            timeout: Duration::from_secs(self.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}

/// How long to wait on the last vote before executing a proposal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionWait {
    pub commitment: CommitmentConfig,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ExecutionWait {
    fn default() -> Self {
        ScenarioConfig::default().execution_wait()
    }
}

fn deserialize_pubkey<'de, D>(deserializer: D) -> Result<Pubkey, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Pubkey::from_str(&value).map_err(serde::de::Error::custom)
}

fn deserialize_commitment<'de, D>(deserializer: D) -> Result<CommitmentConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    CommitmentLevel::from_str(&value)
        .map(|commitment| CommitmentConfig { commitment })
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScenarioConfig::default();
        config.validate().unwrap();
        assert_eq!(150_000_000, config.deposit_lamports());
        assert_eq!(100_000_000, config.withdraw_lamports());
        assert_eq!(DEFAULT_GOVERNANCE_PROGRAM_ID, config.multisig.program_id);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ScenarioConfig::from_yaml(
            "multisig:\n  name: treasury-ops\n  council_vote_threshold_percentage: 49\n\
             execution_commitment: confirmed\nmember_count: 3\n",
        )
        .unwrap();

        assert_eq!("treasury-ops", config.multisig.name);
        assert_eq!(49, config.multisig.council_vote_threshold_percentage);
        assert_eq!(86_400, config.multisig.voting_base_time);
        assert_eq!(3, config.member_count);
        assert_eq!(3, config.voter_count());
        assert_eq!(CommitmentConfig::confirmed(), config.execution_commitment);
        assert_eq!(0.15, config.deposit_sol);
    }

    #[test]
    fn test_load_bundled_scenario() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenario.yml");
        let config = ScenarioConfig::load(path).unwrap();

        assert_eq!("treasury-ops", config.multisig.name);
        assert_eq!(49, config.multisig.council_vote_threshold_percentage);
        assert_eq!(2, config.voter_count());
        assert_eq!(CommitmentConfig::finalized(), config.execution_commitment);
        assert_eq!(ScenarioConfig::default().execution_wait(), config.execution_wait());
    }

    #[test]
    fn test_program_id_from_yaml() {
        let program_id = Pubkey::new_unique();
        let config =
            ScenarioConfig::from_yaml(&format!("multisig:\n  program_id: {}\n", program_id))
                .unwrap();
        assert_eq!(program_id, config.multisig.program_id);

        assert!(matches!(
            ScenarioConfig::from_yaml("multisig:\n  program_id: not-a-key\n"),
            Err(MultisigError::Yaml(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_policy() {
        let long_name = "m".repeat(MAX_SEED_LEN + 1);
        assert!(matches!(
            MultisigConfig::new(Pubkey::new_unique(), &long_name).validate(),
            Err(MultisigError::InvalidConfig(_))
        ));
        assert!(matches!(
            MultisigConfig::new(Pubkey::new_unique(), "").validate(),
            Err(MultisigError::InvalidConfig(_))
        ));
        assert!(matches!(
            MultisigConfig::new(Pubkey::new_unique(), "ops")
                .with_threshold(0)
                .validate(),
            Err(MultisigError::InvalidConfig(_))
        ));
        assert!(matches!(
            MultisigConfig::new(Pubkey::new_unique(), "ops")
                .with_threshold(101)
                .validate(),
            Err(MultisigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_scenario() {
        assert!(matches!(
            ScenarioConfig::from_yaml("member_count: 0\n"),
            Err(MultisigError::NoMembers)
        ));
        assert!(matches!(
            ScenarioConfig::from_yaml("deposit_sol: 0.1\nwithdraw_sol: 0.2\n"),
            Err(MultisigError::InvalidConfig(_))
        ));
        assert!(matches!(
            ScenarioConfig::from_yaml("member_count: 2\nvoter_count: 3\n"),
            Err(MultisigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_amounts_that_are_not_positive() {
        for yaml in [
            "withdraw_sol: -0.1\n",
            "withdraw_sol: 0\n",
            "deposit_sol: .nan\n",
            "airdrop_sol: -1\n",
            "airdrop_sol: .inf\n",
        ] {
            assert!(
                matches!(
                    ScenarioConfig::from_yaml(yaml),
                    Err(MultisigError::InvalidConfig(_))
                ),
                "{}",
                yaml
            );
        }

        let config = ScenarioConfig {
            deposit_sol: f64::NAN,
            ..ScenarioConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MultisigError::InvalidConfig(_))
        ));
    }
}
