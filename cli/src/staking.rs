use {
    crate::{
        checks::account_exists,
        cli::{CliCommand, CliCommandInfo, CliConfig, CliError, ProcessResult},
        pool_info::fetch_program_account,
        token_accounts::{
            get_associated_token_accounts_to_create, resolve_associated_token_accounts,
            AssociatedTokenAccounts,
        },
        transaction_utils::send_instructions,
    },
    armory_staking_interface::{
        constants::USER_POOL_SIZE,
        instruction,
        pda::{
            find_global_authority_address, get_associated_token_address, get_reward_vault_address,
            get_user_pool_address,
        },
        UserPool,
    },
    clap::{App, Arg, ArgMatches, SubCommand},
    log::*,
    serde::{Deserialize, Serialize},
    solana_clap_utils::{
        input_parsers::{pubkey_of, value_of},
        input_validators::{is_parsable, is_valid_pubkey},
        keypair::DefaultSigner,
    },
    solana_cli_output::{display::writeln_name_value, QuietDisplay, VerboseDisplay},
    solana_commitment_config::CommitmentConfig,
    solana_instruction::Instruction,
    solana_program_pack::Pack,
    solana_pubkey::Pubkey,
    solana_remote_wallet::remote_wallet::RemoteWalletManager,
    solana_rpc_client::nonblocking::rpc_client::RpcClient,
    spl_token_interface::state::Account as TokenAccount,
    std::{fmt, rc::Rc, sync::Arc},
};

// ── CLI Command Enum Variants ───────────────────────────────────────
#[derive(Debug, PartialEq, Eq)]
pub enum StakingCliCommand {
    InitializePool,
    InitializeUserPool,
    Stake {
        nft_mint: Pubkey,
        box_mint: Pubkey,
        box_id: u64,
    },
    Unstake {
        nft_mint: Pubkey,
        box_mint: Pubkey,
        box_id: u64,
    },
    ClaimReward,
}

// ── Output Structs ──────────────────────────────────────────────────
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CliLabeledAddress {
    pub label: String,
    pub address: String,
}

impl CliLabeledAddress {
    fn new(label: &str, address: &Pubkey) -> Self {
        Self {
            label: label.to_string(),
            address: address.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliStakingTransaction {
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_pool_initialization: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub created_token_accounts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub accounts: Vec<CliLabeledAddress>,
}

impl QuietDisplay for CliStakingTransaction {
    fn write_str(&self, w: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(w, "{}", self.signature)
    }
}

impl VerboseDisplay for CliStakingTransaction {
    fn write_str(&self, w: &mut dyn fmt::Write) -> fmt::Result {
        write!(w, "{self}")?;
        if !self.accounts.is_empty() {
            writeln!(w, "Accounts:")?;
            for account in &self.accounts {
                writeln!(w, "  {:<24} {}", format!("{}:", account.label), account.address)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for CliStakingTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(initialization) = &self.user_pool_initialization {
            writeln_name_value(f, "User pool initialized:", initialization)?;
        }
        for account in &self.created_token_accounts {
            writeln_name_value(f, "Created token account:", account)?;
        }
        writeln_name_value(f, "Signature:", &self.signature)
    }
}

// ── Subcommand Definition (clap) ────────────────────────────────────
pub trait StakingSubCommands {
    fn staking_subcommands(self) -> Self;
}

fn mint_args<'a, 'b>(subcommand: App<'a, 'b>) -> App<'a, 'b> {
    subcommand
        .arg(
            Arg::with_name("nft_mint")
                .long("mint")
                .value_name("MINT_ADDRESS")
                .takes_value(true)
                .required(true)
                .validator(is_valid_pubkey)
                .help("Mint of the NFT"),
        )
        .arg(
            Arg::with_name("box_mint")
                .long("box-mint")
                .value_name("MINT_ADDRESS")
                .takes_value(true)
                .required(true)
                .validator(is_valid_pubkey)
                .help("Mint of the box staked alongside the NFT"),
        )
        .arg(
            Arg::with_name("box_id")
                .long("box-id")
                .value_name("ID")
                .takes_value(true)
                .default_value("0")
                .validator(is_parsable::<u64>)
                .help("Id of the box; 0 stakes the NFT without a box"),
        )
}

impl StakingSubCommands for App<'_, '_> {
    fn staking_subcommands(self) -> Self {
        self.subcommand(
            SubCommand::with_name("init-pool")
                .about("Create the global pool with the signer as super admin"),
        )
        .subcommand(
            SubCommand::with_name("init-user")
                .about("Create and initialize the signer's user pool"),
        )
        .subcommand(mint_args(
            SubCommand::with_name("stake").about("Stake an NFT, optionally with a box"),
        ))
        .subcommand(mint_args(
            SubCommand::with_name("unstake").about("Unstake an NFT and its box"),
        ))
        .subcommand(
            SubCommand::with_name("claim").about("Claim the reward accrued by the signer's NFTs"),
        )
    }
}

// ── Parse Functions ─────────────────────────────────────────────────
fn signer_only(
    command: StakingCliCommand,
    matches: &ArgMatches<'_>,
    default_signer: &DefaultSigner,
    wallet_manager: &mut Option<Rc<RemoteWalletManager>>,
) -> Result<CliCommandInfo, CliError> {
    Ok(CliCommandInfo {
        command: CliCommand::Staking(command),
        signers: vec![default_signer.signer_from_path(matches, wallet_manager)?],
    })
}

fn parse_mints(matches: &ArgMatches<'_>) -> Result<(Pubkey, Pubkey, u64), CliError> {
    let nft_mint = pubkey_of(matches, "nft_mint")
        .ok_or_else(|| CliError::BadParameter("Invalid NFT mint".to_string()))?;
    let box_mint = pubkey_of(matches, "box_mint")
        .ok_or_else(|| CliError::BadParameter("Invalid box mint".to_string()))?;
    let box_id = value_of(matches, "box_id")
        .ok_or_else(|| CliError::BadParameter("Invalid box id".to_string()))?;
    Ok((nft_mint, box_mint, box_id))
}

pub fn parse_initialize_pool(
    matches: &ArgMatches<'_>,
    default_signer: &DefaultSigner,
    wallet_manager: &mut Option<Rc<RemoteWalletManager>>,
) -> Result<CliCommandInfo, CliError> {
    signer_only(
        StakingCliCommand::InitializePool,
        matches,
        default_signer,
        wallet_manager,
    )
}

pub fn parse_initialize_user_pool(
    matches: &ArgMatches<'_>,
    default_signer: &DefaultSigner,
    wallet_manager: &mut Option<Rc<RemoteWalletManager>>,
) -> Result<CliCommandInfo, CliError> {
    signer_only(
        StakingCliCommand::InitializeUserPool,
        matches,
        default_signer,
        wallet_manager,
    )
}

pub fn parse_stake_nft(
    matches: &ArgMatches<'_>,
    default_signer: &DefaultSigner,
    wallet_manager: &mut Option<Rc<RemoteWalletManager>>,
) -> Result<CliCommandInfo, CliError> {
    let (nft_mint, box_mint, box_id) = parse_mints(matches)?;
    signer_only(
        StakingCliCommand::Stake {
            nft_mint,
            box_mint,
            box_id,
        },
        matches,
        default_signer,
        wallet_manager,
    )
}

pub fn parse_unstake_nft(
    matches: &ArgMatches<'_>,
    default_signer: &DefaultSigner,
    wallet_manager: &mut Option<Rc<RemoteWalletManager>>,
) -> Result<CliCommandInfo, CliError> {
    let (nft_mint, box_mint, box_id) = parse_mints(matches)?;
    signer_only(
        StakingCliCommand::Unstake {
            nft_mint,
            box_mint,
            box_id,
        },
        matches,
        default_signer,
        wallet_manager,
    )
}

pub fn parse_claim_reward(
    matches: &ArgMatches<'_>,
    default_signer: &DefaultSigner,
    wallet_manager: &mut Option<Rc<RemoteWalletManager>>,
) -> Result<CliCommandInfo, CliError> {
    signer_only(
        StakingCliCommand::ClaimReward,
        matches,
        default_signer,
        wallet_manager,
    )
}

// ── Transaction Planning ────────────────────────────────────────────
/// Instructions of one staking transaction, before signing.
#[derive(Debug, Default)]
pub struct StakingTransaction {
    pub instructions: Vec<Instruction>,
    pub created_token_accounts: Vec<Pubkey>,
    pub accounts: Vec<CliLabeledAddress>,
    /// Rent the fee payer funds for the created token accounts.
    pub lamports: u64,
    /// Set when the owner's user pool has to be initialized first.
    pub user_pool_missing: bool,
}

impl StakingTransaction {
    async fn with_token_accounts(
        rpc_client: &RpcClient,
        token_accounts: AssociatedTokenAccounts,
    ) -> Result<Self, CliError> {
        let created_token_accounts = token_accounts.created();
        let lamports = if token_accounts.is_empty() {
            0
        } else {
            let count = u64::try_from(created_token_accounts.len()).unwrap_or(u64::MAX);
            rpc_client
                .get_minimum_balance_for_rent_exemption(TokenAccount::LEN)
                .await?
                .saturating_mul(count)
        };
        Ok(Self {
            created_token_accounts,
            instructions: token_accounts.instructions,
            lamports,
            ..Self::default()
        })
    }
}

/// Allocation and initialization of `owner`'s user pool, and the lamports the
/// allocation costs.
pub async fn prepare_user_pool_initialization(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    owner: &Pubkey,
) -> Result<(Vec<Instruction>, u64), CliError> {
    let lamports = rpc_client
        .get_minimum_balance_for_rent_exemption(USER_POOL_SIZE)
        .await?;
    let instructions = vec![
        instruction::create_user_pool_account(program_id, owner, lamports)?,
        instruction::init_user_pool(program_id, owner)?,
    ];
    Ok((instructions, lamports))
}

#[allow(clippy::too_many_arguments)]
pub async fn prepare_stake(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    reward_mint: &Pubkey,
    owner: &Pubkey,
    nft_mint: &Pubkey,
    box_mint: &Pubkey,
    box_id: u64,
    commitment: CommitmentConfig,
) -> Result<StakingTransaction, CliError> {
    let (global_authority, _bump) = find_global_authority_address(program_id);
    let user_pool = get_user_pool_address(owner, program_id)?;
    let token_accounts = resolve_associated_token_accounts(
        rpc_client,
        owner,
        &[
            (global_authority, *nft_mint),
            (global_authority, *box_mint),
            (*owner, *reward_mint),
        ],
        commitment,
    )
    .await?;

    let mut transaction = StakingTransaction::with_token_accounts(rpc_client, token_accounts).await?;
    transaction.user_pool_missing = !account_exists(rpc_client, &user_pool, commitment).await?;
    transaction.instructions.push(instruction::stake_nft(
        program_id,
        owner,
        nft_mint,
        box_mint,
        reward_mint,
        box_id,
    )?);
    transaction.accounts = vec![
        CliLabeledAddress::new("Global authority", &global_authority),
        CliLabeledAddress::new("User pool", &user_pool),
        CliLabeledAddress::new(
            "NFT account",
            &get_associated_token_address(owner, nft_mint),
        ),
        CliLabeledAddress::new(
            "NFT escrow",
            &get_associated_token_address(&global_authority, nft_mint),
        ),
        CliLabeledAddress::new(
            "Box account",
            &get_associated_token_address(owner, box_mint),
        ),
        CliLabeledAddress::new(
            "Box escrow",
            &get_associated_token_address(&global_authority, box_mint),
        ),
        CliLabeledAddress::new(
            "Reward account",
            &get_associated_token_address(owner, reward_mint),
        ),
    ];
    Ok(transaction)
}

pub fn prepare_unstake(
    program_id: &Pubkey,
    owner: &Pubkey,
    nft_mint: &Pubkey,
    box_mint: &Pubkey,
    box_id: u64,
) -> Result<StakingTransaction, CliError> {
    let (global_authority, _bump) = find_global_authority_address(program_id);
    Ok(StakingTransaction {
        instructions: vec![instruction::unstake_nft(
            program_id, owner, nft_mint, box_mint, box_id,
        )?],
        accounts: vec![
            CliLabeledAddress::new("User pool", &get_user_pool_address(owner, program_id)?),
            CliLabeledAddress::new(
                "NFT account",
                &get_associated_token_address(owner, nft_mint),
            ),
            CliLabeledAddress::new(
                "NFT escrow",
                &get_associated_token_address(&global_authority, nft_mint),
            ),
            CliLabeledAddress::new(
                "Box account",
                &get_associated_token_address(owner, box_mint),
            ),
            CliLabeledAddress::new(
                "Box escrow",
                &get_associated_token_address(&global_authority, box_mint),
            ),
        ],
        ..StakingTransaction::default()
    })
}

/// Whether `owner`'s user pool lists `nft_mint` as staked. An absent or
/// undecodable pool holds nothing.
pub async fn is_nft_staked(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    owner: &Pubkey,
    nft_mint: &Pubkey,
    commitment: CommitmentConfig,
) -> Result<bool, CliError> {
    let user_pool = get_user_pool_address(owner, program_id)?;
    Ok(
        fetch_program_account::<UserPool>(rpc_client, program_id, &user_pool, commitment)
            .await
            .is_some_and(|user_pool| user_pool.is_staked(nft_mint)),
    )
}

pub async fn prepare_claim_reward(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    reward_mint: &Pubkey,
    owner: &Pubkey,
    commitment: CommitmentConfig,
) -> Result<StakingTransaction, CliError> {
    let token_accounts =
        get_associated_token_accounts_to_create(rpc_client, owner, owner, &[*reward_mint], commitment)
            .await?;

    let mut transaction = StakingTransaction::with_token_accounts(rpc_client, token_accounts).await?;
    transaction
        .instructions
        .push(instruction::claim_reward(program_id, owner, reward_mint)?);
    transaction.accounts = vec![
        CliLabeledAddress::new("User pool", &get_user_pool_address(owner, program_id)?),
        CliLabeledAddress::new(
            "Reward vault",
            &get_reward_vault_address(program_id, reward_mint),
        ),
        CliLabeledAddress::new(
            "Reward account",
            &get_associated_token_address(owner, reward_mint),
        ),
    ];
    Ok(transaction)
}

// ── Process Functions ───────────────────────────────────────────────
/// Allocate and initialize the signer's user pool, confirmed at `finalized`
/// so that a following stake observes it.
async fn send_user_pool_initialization(
    rpc_client: &RpcClient,
    config: &CliConfig<'_>,
    owner: &Pubkey,
) -> Result<String, CliError> {
    let (instructions, lamports) =
        prepare_user_pool_initialization(rpc_client, &config.program_id, owner).await?;
    let signature = send_instructions(
        rpc_client,
        config,
        &instructions,
        lamports,
        CommitmentConfig::finalized(),
    )
    .await?;
    info!("user pool of {owner} initialized: {signature}");
    Ok(signature.to_string())
}

async fn process_initialize_user_pool(
    rpc_client: &RpcClient,
    config: &CliConfig<'_>,
) -> ProcessResult {
    let owner = config.fee_payer()?;
    let user_pool = get_user_pool_address(&owner, &config.program_id).map_err(CliError::from)?;
    if account_exists(rpc_client, &user_pool, config.commitment).await? {
        return Err(CliError::BadParameter(format!(
            "User pool {user_pool} of {owner} already exists"
        ))
        .into());
    }
    let signature = send_user_pool_initialization(rpc_client, config, &owner).await?;
    Ok(config
        .output_format
        .formatted_string(&CliStakingTransaction {
            signature,
            accounts: vec![CliLabeledAddress::new("User pool", &user_pool)],
            ..CliStakingTransaction::default()
        }))
}

async fn send_staking_transaction(
    rpc_client: &RpcClient,
    config: &CliConfig<'_>,
    transaction: StakingTransaction,
) -> ProcessResult {
    let owner = config.fee_payer()?;
    let user_pool_initialization = if transaction.user_pool_missing {
        info!("user pool of {owner} is missing, initializing it first");
        Some(send_user_pool_initialization(rpc_client, config, &owner).await?)
    } else {
        None
    };
    let signature = send_instructions(
        rpc_client,
        config,
        &transaction.instructions,
        transaction.lamports,
        config.commitment,
    )
    .await?;
    Ok(config
        .output_format
        .formatted_string(&CliStakingTransaction {
            signature: signature.to_string(),
            user_pool_initialization,
            created_token_accounts: transaction
                .created_token_accounts
                .iter()
                .map(Pubkey::to_string)
                .collect(),
            accounts: transaction.accounts,
        }))
}

pub async fn process_staking_command(
    rpc_client: &Arc<RpcClient>,
    config: &CliConfig<'_>,
    command: &StakingCliCommand,
) -> ProcessResult {
    let owner = config.fee_payer()?;
    let transaction = match command {
        StakingCliCommand::InitializePool => {
            let (global_authority, _bump) = find_global_authority_address(&config.program_id);
            StakingTransaction {
                instructions: vec![instruction::initialize(&config.program_id, &owner)],
                accounts: vec![CliLabeledAddress::new("Global pool", &global_authority)],
                ..StakingTransaction::default()
            }
        }
        StakingCliCommand::InitializeUserPool => {
            return process_initialize_user_pool(rpc_client, config).await;
        }
        StakingCliCommand::Stake {
            nft_mint,
            box_mint,
            box_id,
        } => {
            prepare_stake(
                rpc_client,
                &config.program_id,
                &config.reward_mint,
                &owner,
                nft_mint,
                box_mint,
                *box_id,
                config.commitment,
            )
            .await?
        }
        StakingCliCommand::Unstake {
            nft_mint,
            box_mint,
            box_id,
        } => {
            if !is_nft_staked(
                rpc_client,
                &config.program_id,
                &owner,
                nft_mint,
                config.commitment,
            )
            .await?
            {
                warn!("{nft_mint} is not staked in the user pool of {owner}");
            }
            prepare_unstake(&config.program_id, &owner, nft_mint, box_mint, *box_id)?
        }
        StakingCliCommand::ClaimReward => {
            prepare_claim_reward(
                rpc_client,
                &config.program_id,
                &config.reward_mint,
                &owner,
                config.commitment,
            )
            .await?
        }
    };
    send_staking_transaction(rpc_client, config, transaction).await
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            clap_app::get_clap_app,
            cli::parse_command,
            test_utils::{rpc_response, ui_account_json},
        },
        armory_staking_interface::{
            constants::REWARD_MINT, instruction::instruction_discriminator, ProgramAccount,
            StakedData,
        },
        assert_matches::assert_matches,
        serde_json::json,
        solana_keypair::{write_keypair_file, Keypair},
        solana_rpc_client::mock_sender::MocksMap,
        solana_rpc_client_api::request::RpcRequest,
        solana_signer::Signer,
        std::collections::HashMap,
        tempfile::TempDir,
    };

    fn parse(args: &[&str], keypair_path: &str) -> CliCommandInfo {
        let matches = get_clap_app("test", "desc", "version").get_matches_from(args.iter().copied());
        let default_signer = DefaultSigner::new("keypair", keypair_path);
        parse_command(&matches, &default_signer, &mut None).unwrap()
    }

    fn token_account() -> serde_json::Value {
        ui_account_json(&spl_token_interface::id(), &[0u8; 165])
    }

    fn signer_config(keypair: &Keypair) -> CliConfig<'_> {
        CliConfig {
            signers: vec![keypair],
            ..CliConfig::default()
        }
    }

    fn user_pool_account(program_id: &Pubkey, user_pool: &UserPool) -> serde_json::Value {
        let mut data = vec![0u8; USER_POOL_SIZE];
        user_pool.serialize_into(&mut data).unwrap();
        ui_account_json(program_id, &data)
    }

    #[test]
    fn test_parse_stake_commands() {
        let dir = TempDir::new().unwrap();
        let keypair = Keypair::new();
        let keypair_path = dir.path().join("id.json");
        write_keypair_file(&keypair, &keypair_path).unwrap();
        let keypair_path = keypair_path.to_str().unwrap();
        let nft_mint = Pubkey::new_unique();
        let box_mint = Pubkey::new_unique();
        let nft_mint_string = nft_mint.to_string();
        let box_mint_string = box_mint.to_string();

        let info = parse(
            &[
                "test",
                "stake",
                "--mint",
                &nft_mint_string,
                "--box-mint",
                &box_mint_string,
                "--box-id",
                "9600",
            ],
            keypair_path,
        );
        assert_eq!(
            info.command,
            CliCommand::Staking(StakingCliCommand::Stake {
                nft_mint,
                box_mint,
                box_id: 9600,
            })
        );
        assert_eq!(info.signers.len(), 1);
        assert_eq!(info.signers[0].pubkey(), keypair.pubkey());

        let info = parse(
            &[
                "test",
                "unstake",
                "--mint",
                &nft_mint_string,
                "--box-mint",
                &box_mint_string,
            ],
            keypair_path,
        );
        assert_eq!(
            info.command,
            CliCommand::Staking(StakingCliCommand::Unstake {
                nft_mint,
                box_mint,
                box_id: 0,
            })
        );

        let info = parse(&["test", "init-user"], keypair_path);
        assert_eq!(
            info.command,
            CliCommand::Staking(StakingCliCommand::InitializeUserPool)
        );
        let info = parse(&["test", "init-pool"], keypair_path);
        assert_eq!(
            info.command,
            CliCommand::Staking(StakingCliCommand::InitializePool)
        );
    }

    #[test]
    fn test_stake_requires_box_mint() {
        let nft_mint = Pubkey::new_unique().to_string();
        let result = get_clap_app("test", "desc", "version").get_matches_from_safe(vec![
            "test", "stake", "--mint", &nft_mint,
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_prepare_user_pool_initialization() {
        let mut mocks = HashMap::new();
        mocks.insert(
            RpcRequest::GetMinimumBalanceForRentExemption,
            json!(19_765_440),
        );
        let rpc_client = RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks);
        let program_id = armory_staking_interface::id();
        let owner = Pubkey::new_unique();

        let (instructions, lamports) =
            prepare_user_pool_initialization(&rpc_client, &program_id, &owner)
                .await
                .unwrap();
        assert_eq!(lamports, 19_765_440);
        assert_eq!(
            instructions,
            vec![
                instruction::create_user_pool_account(&program_id, &owner, 19_765_440).unwrap(),
                instruction::init_user_pool(&program_id, &owner).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_prepare_stake_creates_missing_accounts() {
        let mut mocks = HashMap::new();
        // bear escrow present, box escrow and reward account missing
        mocks.insert(
            RpcRequest::GetMultipleAccounts,
            rpc_response(json!([token_account(), null, null])),
        );
        mocks.insert(RpcRequest::GetMinimumBalanceForRentExemption, json!(2_039_280));
        mocks.insert(RpcRequest::GetAccountInfo, rpc_response(json!(null)));
        let rpc_client = RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks);

        let program_id = armory_staking_interface::id();
        let owner = Pubkey::new_unique();
        let nft_mint = Pubkey::new_unique();
        let box_mint = Pubkey::new_unique();
        let transaction = prepare_stake(
            &rpc_client,
            &program_id,
            &REWARD_MINT,
            &owner,
            &nft_mint,
            &box_mint,
            0,
            CommitmentConfig::confirmed(),
        )
        .await
        .unwrap();

        let (global_authority, _) = find_global_authority_address(&program_id);
        assert!(transaction.user_pool_missing);
        assert_eq!(
            transaction.created_token_accounts,
            vec![
                get_associated_token_address(&global_authority, &box_mint),
                get_associated_token_address(&owner, &REWARD_MINT),
            ]
        );
        assert_eq!(transaction.lamports, 4_078_560);
        assert_eq!(transaction.instructions.len(), 3);
        let stake = transaction.instructions.last().unwrap();
        assert_eq!(stake.program_id, program_id);
        assert_eq!(stake.data[..8], instruction_discriminator("stake_nft"));
    }

    #[tokio::test]
    async fn test_prepare_stake_with_existing_accounts() {
        let user_pool_data = vec![0u8; USER_POOL_SIZE];
        let program_id = armory_staking_interface::id();
        let mut mocks = HashMap::new();
        mocks.insert(
            RpcRequest::GetMultipleAccounts,
            rpc_response(json!([token_account(), token_account(), token_account()])),
        );
        mocks.insert(
            RpcRequest::GetAccountInfo,
            rpc_response(ui_account_json(&program_id, &user_pool_data)),
        );
        let rpc_client = RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks);

        let transaction = prepare_stake(
            &rpc_client,
            &program_id,
            &REWARD_MINT,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            12,
            CommitmentConfig::confirmed(),
        )
        .await
        .unwrap();

        assert!(!transaction.user_pool_missing);
        assert!(transaction.created_token_accounts.is_empty());
        assert_eq!(transaction.lamports, 0);
        assert_eq!(transaction.instructions.len(), 1);
    }

    #[test]
    fn test_prepare_unstake_creates_nothing() {
        let program_id = armory_staking_interface::id();
        let owner = Pubkey::new_unique();
        let transaction = prepare_unstake(
            &program_id,
            &owner,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            3,
        )
        .unwrap();
        assert!(!transaction.user_pool_missing);
        assert!(transaction.created_token_accounts.is_empty());
        assert_eq!(transaction.instructions.len(), 1);
        assert_eq!(
            transaction.instructions[0].data[..8],
            instruction_discriminator("unstake_nft")
        );
    }

    #[tokio::test]
    async fn test_prepare_claim_creates_reward_account() {
        let mut mocks = HashMap::new();
        mocks.insert(
            RpcRequest::GetMultipleAccounts,
            rpc_response(json!([null])),
        );
        mocks.insert(RpcRequest::GetMinimumBalanceForRentExemption, json!(2_039_280));
        let rpc_client = RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks);
        let program_id = armory_staking_interface::id();
        let owner = Pubkey::new_unique();

        let transaction = prepare_claim_reward(
            &rpc_client,
            &program_id,
            &REWARD_MINT,
            &owner,
            CommitmentConfig::confirmed(),
        )
        .await
        .unwrap();

        assert_eq!(
            transaction.created_token_accounts,
            vec![get_associated_token_address(&owner, &REWARD_MINT)]
        );
        assert_eq!(transaction.lamports, 2_039_280);
        assert_eq!(transaction.instructions.len(), 2);
        assert_eq!(
            transaction.instructions[0].program_id,
            spl_associated_token_account_interface::program::id()
        );
        assert_eq!(
            transaction.instructions[1].data[..8],
            instruction_discriminator("claim_reward")
        );
    }

    #[tokio::test]
    async fn test_initialize_user_pool_rejects_existing_pool() {
        let keypair = Keypair::new();
        let config = signer_config(&keypair);
        let mut mocks = HashMap::new();
        mocks.insert(
            RpcRequest::GetAccountInfo,
            rpc_response(ui_account_json(&config.program_id, &[0u8; USER_POOL_SIZE])),
        );
        let rpc_client = Arc::new(RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks));

        let error = process_staking_command(
            &rpc_client,
            &config,
            &StakingCliCommand::InitializeUserPool,
        )
        .await
        .unwrap_err();
        assert_matches!(
            error.downcast_ref::<CliError>(),
            Some(CliError::BadParameter(message)) if message.ends_with("already exists")
        );
    }

    #[tokio::test]
    async fn test_stake_initializes_missing_user_pool_first() {
        let keypair = Keypair::new();
        let config = signer_config(&keypair);
        let mut mocks = MocksMap::default();
        mocks.insert(
            RpcRequest::GetMultipleAccounts,
            rpc_response(json!([null, null, null])),
        );
        // token account rent, then user pool rent
        mocks.insert(RpcRequest::GetMinimumBalanceForRentExemption, json!(2_039_280));
        mocks.insert(RpcRequest::GetMinimumBalanceForRentExemption, json!(19_765_440));
        mocks.insert(RpcRequest::GetAccountInfo, rpc_response(json!(null)));
        mocks.insert(RpcRequest::GetBalance, rpc_response(json!(100_000_000)));
        mocks.insert(RpcRequest::GetBalance, rpc_response(json!(100_000_000)));
        let rpc_client = Arc::new(RpcClient::new_mock_with_mocks_map(
            "succeeds".to_string(),
            mocks,
        ));

        let nft_mint = Pubkey::new_unique();
        let box_mint = Pubkey::new_unique();
        let output = process_staking_command(
            &rpc_client,
            &config,
            &StakingCliCommand::Stake {
                nft_mint,
                box_mint,
                box_id: 9_600,
            },
        )
        .await
        .unwrap();

        let (global_authority, _) = find_global_authority_address(&config.program_id);
        let nft_escrow = get_associated_token_address(&global_authority, &nft_mint);
        let reward_account = get_associated_token_address(&keypair.pubkey(), &REWARD_MINT);
        assert!(output.contains("User pool initialized:"));
        assert_eq!(output.matches("Created token account:").count(), 3);
        assert!(output.contains(&nft_escrow.to_string()));
        assert!(output.contains(&reward_account.to_string()));
        assert!(output.contains("Signature:"));
    }

    #[tokio::test]
    async fn test_stake_requires_token_account_rent() {
        let keypair = Keypair::new();
        let config = signer_config(&keypair);
        let mut mocks = HashMap::new();
        mocks.insert(
            RpcRequest::GetMultipleAccounts,
            rpc_response(json!([null, null, token_account()])),
        );
        mocks.insert(RpcRequest::GetMinimumBalanceForRentExemption, json!(2_039_280));
        mocks.insert(
            RpcRequest::GetAccountInfo,
            rpc_response(ui_account_json(&config.program_id, &[0u8; USER_POOL_SIZE])),
        );
        // enough for the fee, not for two token accounts
        mocks.insert(RpcRequest::GetBalance, rpc_response(json!(4_000_000)));
        let rpc_client = Arc::new(RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks));

        let error = process_staking_command(
            &rpc_client,
            &config,
            &StakingCliCommand::Stake {
                nft_mint: Pubkey::new_unique(),
                box_mint: Pubkey::new_unique(),
                box_id: 0,
            },
        )
        .await
        .unwrap_err();
        assert_matches!(
            error.downcast_ref::<CliError>(),
            Some(CliError::InsufficientFundsForSpendAndFee(_, payer)) if *payer == keypair.pubkey()
        );
    }

    #[tokio::test]
    async fn test_is_nft_staked() {
        let program_id = armory_staking_interface::id();
        let owner = Pubkey::new_unique();
        let staked = StakedData {
            bear_mint: Pubkey::new_unique(),
            box_mint: Pubkey::new_unique(),
            box_id: 9_600,
            ..StakedData::default()
        };
        let mut user_pool = UserPool {
            owner,
            staked_count: 1,
            ..UserPool::default()
        };
        user_pool.staked_nfts[0] = staked;

        let mut mocks = MocksMap::default();
        mocks.insert(
            RpcRequest::GetAccountInfo,
            rpc_response(user_pool_account(&program_id, &user_pool)),
        );
        mocks.insert(
            RpcRequest::GetAccountInfo,
            rpc_response(user_pool_account(&program_id, &user_pool)),
        );
        let rpc_client = RpcClient::new_mock_with_mocks_map("succeeds".to_string(), mocks);
        let commitment = CommitmentConfig::confirmed();

        let staked_nft =
            is_nft_staked(&rpc_client, &program_id, &owner, &staked.bear_mint, commitment).await;
        assert!(staked_nft.unwrap());
        // the box is not the staked NFT
        let staked_box =
            is_nft_staked(&rpc_client, &program_id, &owner, &staked.box_mint, commitment).await;
        assert!(!staked_box.unwrap());
        // no user pool at all
        let without_pool =
            is_nft_staked(&rpc_client, &program_id, &owner, &staked.bear_mint, commitment).await;
        assert!(!without_pool.unwrap());
    }

    #[tokio::test]
    async fn test_unstake_of_unlisted_nft_is_still_sent() {
        let keypair = Keypair::new();
        let config = signer_config(&keypair);
        let user_pool = UserPool {
            owner: keypair.pubkey(),
            ..UserPool::default()
        };
        let mut mocks = HashMap::new();
        mocks.insert(
            RpcRequest::GetAccountInfo,
            rpc_response(user_pool_account(&config.program_id, &user_pool)),
        );
        let rpc_client = Arc::new(RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks));

        let output = process_staking_command(
            &rpc_client,
            &config,
            &StakingCliCommand::Unstake {
                nft_mint: Pubkey::new_unique(),
                box_mint: Pubkey::new_unique(),
                box_id: 0,
            },
        )
        .await
        .unwrap();
        assert!(output.contains("Signature:"));
        assert!(!output.contains("Created token account:"));
    }

    #[test]
    fn test_transaction_output() {
        let output = CliStakingTransaction {
            signature: "sig".to_string(),
            user_pool_initialization: Some("init".to_string()),
            created_token_accounts: vec!["ata".to_string()],
            accounts: vec![CliLabeledAddress {
                label: "User pool".to_string(),
                address: "pool".to_string(),
            }],
        };
        let display = output.to_string();
        assert!(display.contains("init"));
        assert!(display.contains("ata"));
        assert!(display.contains("sig"));
        assert!(!display.contains("Accounts:"));

        let mut verbose = String::new();
        VerboseDisplay::write_str(&output, &mut verbose).unwrap();
        assert!(verbose.contains("User pool:"));

        let json: serde_json::Value = serde_json::to_value(&output).unwrap();
        assert_eq!(json["userPoolInitialization"], "init");
        assert_eq!(json["createdTokenAccounts"][0], "ata");
    }
}
