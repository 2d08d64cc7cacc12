use {
    crate::{
        pool_info::{
            parse_addresses, parse_nft_owner, parse_user_state, process_pool_info_command,
            PoolInfoCliCommand,
        },
        staking::{
            parse_claim_reward, parse_initialize_pool, parse_initialize_user_pool, parse_stake_nft,
            parse_unstake_nft, process_staking_command, StakingCliCommand,
        },
    },
    armory_staking_interface::{constants::REWARD_MINT, StakingError, StateError},
    clap::{value_t, ArgMatches},
    log::*,
    solana_clap_utils::{input_parsers::pubkey_of, keypair::DefaultSigner},
    solana_cli_config::{Config, ConfigInput},
    solana_cli_output::{display::println_name_value, OutputFormat},
    solana_commitment_config::CommitmentConfig,
    solana_pubkey::{Pubkey, PubkeyError},
    solana_remote_wallet::remote_wallet::RemoteWalletManager,
    solana_rpc_client::nonblocking::rpc_client::RpcClient,
    solana_rpc_client_api::client_error::Error as ClientError,
    solana_signer::{Signer, SignerError},
    std::{error, rc::Rc, sync::Arc, time::Duration},
    thiserror::Error,
};

pub const DEFAULT_RPC_TIMEOUT_SECONDS: &str = "30";
pub const DEFAULT_CONFIRM_TX_TIMEOUT_SECONDS: &str = "5";

pub type CliSigners = Vec<Box<dyn Signer>>;

#[derive(Debug, PartialEq)]
pub enum CliCommand {
    Staking(StakingCliCommand),
    PoolInfo(PoolInfoCliCommand),
}

#[derive(Debug, PartialEq)]
pub struct CliCommandInfo {
    pub command: CliCommand,
    pub signers: CliSigners,
}

impl CliCommandInfo {
    pub fn without_signers(command: CliCommand) -> Self {
        Self {
            command,
            signers: vec![],
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Bad parameter: {0}")]
    BadParameter(String),
    #[error(transparent)]
    ClientError(#[from] ClientError),
    #[error("Command not recognized: {0}")]
    CommandNotRecognized(String),
    #[error("Account {1} has insufficient funds for fee ({0} SOL)")]
    InsufficientFundsForFee(String, Pubkey),
    #[error("Account {1} has insufficient funds for spend and fee ({0} SOL)")]
    InsufficientFundsForSpendAndFee(String, Pubkey),
    #[error("Invalid account data: {0}")]
    InvalidAccountData(#[from] StateError),
    #[error("Address derivation failed: {0}")]
    AddressDerivation(String),
    #[error("Instruction {index} rejected by the staking program: {error} (code {})", .error.code())]
    ProgramError { index: u8, error: StakingError },
    #[error(transparent)]
    SignerError(#[from] SignerError),
    #[error("Dynamic program error: {0}")]
    DynamicProgramError(String),
}

impl From<Box<dyn error::Error>> for CliError {
    fn from(error: Box<dyn error::Error>) -> Self {
        CliError::DynamicProgramError(error.to_string())
    }
}

impl From<PubkeyError> for CliError {
    fn from(error: PubkeyError) -> Self {
        CliError::AddressDerivation(format!("{error:?}"))
    }
}

pub type ProcessResult = Result<String, Box<dyn error::Error>>;

pub struct CliConfig<'a> {
    pub command: CliCommand,
    pub json_rpc_url: String,
    pub signers: Vec<&'a dyn Signer>,
    pub keypair_path: String,
    pub program_id: Pubkey,
    pub reward_mint: Pubkey,
    pub rpc_timeout: Duration,
    pub confirm_transaction_initial_timeout: Duration,
    pub commitment: CommitmentConfig,
    pub output_format: OutputFormat,
    pub verbose: bool,
}

impl CliConfig<'_> {
    /// Fee payer and owner of every transaction the client sends.
    pub fn fee_payer(&self) -> Result<Pubkey, CliError> {
        self.signers
            .first()
            .map(|signer| signer.pubkey())
            .ok_or_else(|| CliError::BadParameter("No signer configured".to_string()))
    }
}

impl Default for CliConfig<'_> {
    fn default() -> CliConfig<'static> {
        CliConfig {
            command: CliCommand::PoolInfo(PoolInfoCliCommand::GlobalState),
            json_rpc_url: ConfigInput::default().json_rpc_url,
            signers: Vec::new(),
            keypair_path: Config::default().keypair_path,
            program_id: armory_staking_interface::id(),
            reward_mint: REWARD_MINT,
            rpc_timeout: Duration::from_secs(30),
            confirm_transaction_initial_timeout: Duration::from_secs(5),
            commitment: CommitmentConfig::confirmed(),
            output_format: OutputFormat::Display,
            verbose: false,
        }
    }
}

pub fn parse_command(
    matches: &ArgMatches<'_>,
    default_signer: &DefaultSigner,
    wallet_manager: &mut Option<Rc<RemoteWalletManager>>,
) -> Result<CliCommandInfo, Box<dyn error::Error>> {
    let response = match matches.subcommand() {
        ("init-pool", Some(matches)) => {
            parse_initialize_pool(matches, default_signer, wallet_manager)
        }
        ("init-user", Some(matches)) => {
            parse_initialize_user_pool(matches, default_signer, wallet_manager)
        }
        ("stake", Some(matches)) => parse_stake_nft(matches, default_signer, wallet_manager),
        ("unstake", Some(matches)) => parse_unstake_nft(matches, default_signer, wallet_manager),
        ("claim", Some(matches)) => parse_claim_reward(matches, default_signer, wallet_manager),
        ("global-state", Some(_matches)) => Ok(CliCommandInfo::without_signers(
            CliCommand::PoolInfo(PoolInfoCliCommand::GlobalState),
        )),
        ("user-state", Some(matches)) => parse_user_state(matches, default_signer, wallet_manager),
        ("addresses", Some(matches)) => parse_addresses(matches, default_signer, wallet_manager),
        ("nft-owner", Some(matches)) => parse_nft_owner(matches),
        ("", None) => {
            eprintln!("{}", matches.usage());
            Err(CliError::CommandNotRecognized(
                "no subcommand given".to_string(),
            ))
        }
        (command, _) => Err(CliError::CommandNotRecognized(command.to_string())),
    }?;
    Ok(response)
}

/// Resolve global settings and the command's signers from the command line
/// and the config file.
pub fn parse_args<'a>(
    matches: &ArgMatches<'_>,
    wallet_manager: &mut Option<Rc<RemoteWalletManager>>,
) -> Result<(CliConfig<'a>, CliSigners), Box<dyn error::Error>> {
    let config = if let Some(config_file) = matches.value_of("config_file") {
        Config::load(config_file).unwrap_or_default()
    } else {
        Config::default()
    };
    let (_, json_rpc_url) = ConfigInput::compute_json_rpc_url_setting(
        matches.value_of("json_rpc_url").unwrap_or(""),
        &config.json_rpc_url,
    );
    let (_, default_signer_path) = ConfigInput::compute_keypair_path_setting(
        matches.value_of("keypair").unwrap_or(""),
        &config.keypair_path,
    );
    let (_, commitment) = ConfigInput::compute_commitment_config(
        matches.value_of("commitment").unwrap_or(""),
        &config.commitment,
    );

    let default_signer = DefaultSigner::new("keypair", &default_signer_path);
    let CliCommandInfo { command, signers } =
        parse_command(matches, &default_signer, wallet_manager)?;

    let verbose = matches.is_present("verbose");
    let output_format = OutputFormat::from_matches(matches, "output_format", verbose);
    let program_id = pubkey_of(matches, "program_id").unwrap_or_else(armory_staking_interface::id);
    let reward_mint = pubkey_of(matches, "reward_mint").unwrap_or(REWARD_MINT);
    let rpc_timeout = Duration::from_secs(value_t!(matches, "rpc_timeout", u64)?);
    let confirm_transaction_initial_timeout =
        Duration::from_secs(value_t!(matches, "confirm_transaction_initial_timeout", u64)?);

    Ok((
        CliConfig {
            command,
            json_rpc_url,
            signers: vec![],
            keypair_path: default_signer_path,
            program_id,
            reward_mint,
            rpc_timeout,
            confirm_transaction_initial_timeout,
            commitment,
            output_format,
            verbose,
        },
        signers,
    ))
}

pub async fn process_command(config: &CliConfig<'_>) -> ProcessResult {
    if config.verbose && matches!(config.output_format, OutputFormat::DisplayVerbose) {
        println_name_value("RPC URL:", &config.json_rpc_url);
        println_name_value("Default Signer Path:", &config.keypair_path);
        println_name_value("Program Id:", &config.program_id.to_string());
        println_name_value("Reward Mint:", &config.reward_mint.to_string());
        println_name_value("Commitment:", &format!("{:?}", config.commitment.commitment));
    }
    debug!("{:?}", config.command);

    let rpc_client = Arc::new(RpcClient::new_with_timeouts_and_commitment(
        config.json_rpc_url.to_string(),
        config.rpc_timeout,
        config.commitment,
        config.confirm_transaction_initial_timeout,
    ));

    match &config.command {
        CliCommand::Staking(command) => {
            process_staking_command(&rpc_client, config, command).await
        }
        CliCommand::PoolInfo(command) => {
            process_pool_info_command(&rpc_client, config, command).await
        }
    }
}
