use {
    crate::cli::{CliCommand, CliCommandInfo, CliConfig, CliError, ProcessResult},
    armory_staking_interface::{
        pda::{
            find_global_authority_address, get_associated_token_address, get_reward_vault_address,
            get_user_pool_address,
        },
        GlobalPool, ProgramAccount, StakedData, UserPool,
    },
    clap::{App, Arg, ArgMatches, SubCommand},
    log::*,
    serde::{Deserialize, Serialize},
    solana_account_decoder_client_types::UiAccountEncoding,
    solana_clap_utils::{
        input_parsers::{pubkey_of, pubkey_of_signer},
        input_validators::is_valid_pubkey,
        keypair::DefaultSigner,
    },
    solana_cli_output::{display::writeln_name_value, QuietDisplay, VerboseDisplay},
    solana_commitment_config::CommitmentConfig,
    solana_program_pack::Pack,
    solana_pubkey::Pubkey,
    solana_remote_wallet::remote_wallet::RemoteWalletManager,
    solana_rpc_client::nonblocking::rpc_client::RpcClient,
    solana_rpc_client_api::{
        config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
        filter::{Memcmp, RpcFilterType},
    },
    spl_token_interface::state::Account as TokenAccount,
    std::{
        fmt,
        rc::Rc,
        sync::Arc,
        time::{Duration, UNIX_EPOCH},
    },
};

// ── CLI Command Enum Variants ───────────────────────────────────────
#[derive(Debug, PartialEq, Eq)]
pub enum PoolInfoCliCommand {
    GlobalState,
    UserState { owner: Pubkey },
    Addresses { owner: Pubkey },
    NftOwner { mint: Pubkey },
}

// ── Output Structs ──────────────────────────────────────────────────
fn format_timestamp(timestamp: i64) -> String {
    u64::try_from(timestamp)
        .ok()
        .filter(|seconds| *seconds > 0)
        .and_then(|seconds| UNIX_EPOCH.checked_add(Duration::from_secs(seconds)))
        .map(|time| humantime::format_rfc3339_seconds(time).to_string())
        .unwrap_or_else(|| "never".to_string())
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CliRecordNotFound {
    pub record: String,
    pub address: String,
}

impl QuietDisplay for CliRecordNotFound {}
impl VerboseDisplay for CliRecordNotFound {}

impl fmt::Display for CliRecordNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "No {} found at {}", self.record, self.address)
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CliGlobalPool {
    pub address: String,
    pub super_admin: String,
    pub total_staked_count: u64,
}

impl CliGlobalPool {
    fn new(address: &Pubkey, global_pool: &GlobalPool) -> Self {
        Self {
            address: address.to_string(),
            super_admin: global_pool.super_admin.to_string(),
            total_staked_count: global_pool.total_staked_count,
        }
    }
}

impl QuietDisplay for CliGlobalPool {}
impl VerboseDisplay for CliGlobalPool {}

impl fmt::Display for CliGlobalPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln_name_value(f, "Global pool:", &self.address)?;
        writeln_name_value(f, "  Super admin:", &self.super_admin)?;
        writeln_name_value(
            f,
            "  Total staked:",
            &self.total_staked_count.to_string(),
        )
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CliStakedNft {
    pub bear_mint: String,
    pub bear_id: u64,
    pub box_mint: String,
    pub box_id: u64,
    pub staked_time: i64,
}

impl From<&StakedData> for CliStakedNft {
    fn from(staked: &StakedData) -> Self {
        Self {
            bear_mint: staked.bear_mint.to_string(),
            bear_id: staked.bear_id,
            box_mint: staked.box_mint.to_string(),
            box_id: staked.box_id,
            staked_time: staked.staked_time,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CliUserPool {
    pub address: String,
    pub owner: String,
    pub last_claimed_time: i64,
    pub pending_reward: u64,
    pub staked_count: u64,
    pub mission_completed: bool,
    pub staked_nfts: Vec<CliStakedNft>,
}

impl CliUserPool {
    fn new(address: &Pubkey, user_pool: &UserPool) -> Self {
        Self {
            address: address.to_string(),
            owner: user_pool.owner.to_string(),
            last_claimed_time: user_pool.last_claimed_time,
            pending_reward: user_pool.pending_reward,
            staked_count: user_pool.staked_count,
            mission_completed: user_pool.mission_completed,
            staked_nfts: user_pool.staked_nfts().iter().map(Into::into).collect(),
        }
    }
}

impl QuietDisplay for CliUserPool {}

impl VerboseDisplay for CliUserPool {
    fn write_str(&self, w: &mut dyn fmt::Write) -> fmt::Result {
        write!(w, "{self}")?;
        for staked in &self.staked_nfts {
            writeln!(w, "  Bear #{} ({})", staked.bear_id, staked.bear_mint)?;
            if staked.box_id != 0 {
                writeln!(w, "    Box #{} ({})", staked.box_id, staked.box_mint)?;
            }
            writeln!(w, "    Staked: {}", format_timestamp(staked.staked_time))?;
        }
        Ok(())
    }
}

impl fmt::Display for CliUserPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln_name_value(f, "User pool:", &self.address)?;
        writeln_name_value(f, "  Owner:", &self.owner)?;
        writeln_name_value(
            f,
            "  Last claimed:",
            &format_timestamp(self.last_claimed_time),
        )?;
        writeln_name_value(f, "  Pending reward:", &self.pending_reward.to_string())?;
        writeln_name_value(
            f,
            "  Mission completed:",
            if self.mission_completed { "yes" } else { "no" },
        )?;
        writeln_name_value(f, "  Staked NFTs:", &self.staked_count.to_string())
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CliStakingAddresses {
    pub program_id: String,
    pub global_authority: String,
    pub global_bump: u8,
    pub reward_mint: String,
    pub reward_vault: String,
    pub owner: String,
    pub user_pool: String,
    pub reward_account: String,
}

impl QuietDisplay for CliStakingAddresses {}
impl VerboseDisplay for CliStakingAddresses {}

impl fmt::Display for CliStakingAddresses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln_name_value(f, "Program id:", &self.program_id)?;
        writeln_name_value(
            f,
            "Global authority:",
            &format!("{} (bump {})", self.global_authority, self.global_bump),
        )?;
        writeln_name_value(f, "Reward mint:", &self.reward_mint)?;
        writeln_name_value(f, "Reward vault:", &self.reward_vault)?;
        writeln_name_value(f, "Owner:", &self.owner)?;
        writeln_name_value(f, "User pool:", &self.user_pool)?;
        writeln_name_value(f, "Reward account:", &self.reward_account)
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CliNftHolder {
    pub mint: String,
    pub token_account: String,
    pub holder: String,
}

impl QuietDisplay for CliNftHolder {}
impl VerboseDisplay for CliNftHolder {}

impl fmt::Display for CliNftHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln_name_value(f, "Mint:", &self.mint)?;
        writeln_name_value(f, "Token account:", &self.token_account)?;
        writeln_name_value(f, "Holder:", &self.holder)
    }
}

// ── Subcommand Definition (clap) ────────────────────────────────────
pub trait PoolInfoSubCommands {
    fn pool_info_subcommands(self) -> Self;
}

impl PoolInfoSubCommands for App<'_, '_> {
    fn pool_info_subcommands(self) -> Self {
        self.subcommand(
            SubCommand::with_name("global-state").about("Display the global pool"),
        )
        .subcommand(
            SubCommand::with_name("user-state")
                .about("Display a user pool")
                .arg(pubkey!(
                    Arg::with_name("owner")
                        .index(1)
                        .value_name("OWNER_ADDRESS"),
                    "Owner of the user pool [default: the signer]."
                )),
        )
        .subcommand(
            SubCommand::with_name("addresses")
                .about("Display the addresses derived for the program and an owner")
                .arg(pubkey!(
                    Arg::with_name("owner")
                        .index(1)
                        .value_name("OWNER_ADDRESS"),
                    "Owner to derive addresses for [default: the signer]."
                )),
        )
        .subcommand(
            SubCommand::with_name("nft-owner")
                .about("Display the wallet holding an NFT")
                .arg(
                    Arg::with_name("mint")
                        .index(1)
                        .value_name("MINT_ADDRESS")
                        .takes_value(true)
                        .required(true)
                        .validator(is_valid_pubkey)
                        .help("Mint of the NFT"),
                ),
        )
    }
}

// ── Parse Functions ─────────────────────────────────────────────────
fn owner_or_signer(
    matches: &ArgMatches<'_>,
    default_signer: &DefaultSigner,
    wallet_manager: &mut Option<Rc<RemoteWalletManager>>,
) -> Result<Pubkey, CliError> {
    if let Some(owner) = pubkey_of_signer(matches, "owner", wallet_manager)? {
        return Ok(owner);
    }
    Ok(default_signer
        .signer_from_path(matches, wallet_manager)?
        .pubkey())
}

pub fn parse_user_state(
    matches: &ArgMatches<'_>,
    default_signer: &DefaultSigner,
    wallet_manager: &mut Option<Rc<RemoteWalletManager>>,
) -> Result<CliCommandInfo, CliError> {
    let owner = owner_or_signer(matches, default_signer, wallet_manager)?;
    Ok(CliCommandInfo::without_signers(CliCommand::PoolInfo(
        PoolInfoCliCommand::UserState { owner },
    )))
}

pub fn parse_addresses(
    matches: &ArgMatches<'_>,
    default_signer: &DefaultSigner,
    wallet_manager: &mut Option<Rc<RemoteWalletManager>>,
) -> Result<CliCommandInfo, CliError> {
    let owner = owner_or_signer(matches, default_signer, wallet_manager)?;
    Ok(CliCommandInfo::without_signers(CliCommand::PoolInfo(
        PoolInfoCliCommand::Addresses { owner },
    )))
}

pub fn parse_nft_owner(matches: &ArgMatches<'_>) -> Result<CliCommandInfo, CliError> {
    let mint = pubkey_of(matches, "mint")
        .ok_or_else(|| CliError::BadParameter("Invalid mint address".to_string()))?;
    Ok(CliCommandInfo::without_signers(CliCommand::PoolInfo(
        PoolInfoCliCommand::NftOwner { mint },
    )))
}

// ── Fetch Functions ─────────────────────────────────────────────────
/// Fetch and decode a program account.
///
/// Any failure, including an account owned by another program, is reported
/// as absence.
pub async fn fetch_program_account<T: ProgramAccount>(
    rpc_client: &RpcClient,
    program_id: &Pubkey,
    address: &Pubkey,
    commitment: CommitmentConfig,
) -> Option<T> {
    let account = match rpc_client
        .get_account_with_commitment(address, commitment)
        .await
    {
        Ok(response) => response.value?,
        Err(err) => {
            debug!("fetching {} {address} failed: {err}", T::NAME);
            return None;
        }
    };
    if account.owner != *program_id {
        debug!(
            "{} {address} is owned by {}, not {program_id}",
            T::NAME,
            account.owner
        );
        return None;
    }
    T::try_from_account_data(&account.data)
        .map_err(|err| debug!("decoding {} {address} failed: {err}", T::NAME))
        .ok()
}

/// Token account holding a single unit of `mint`, and its owner.
pub async fn find_nft_holder(
    rpc_client: &RpcClient,
    mint: &Pubkey,
    commitment: CommitmentConfig,
) -> Result<Option<(Pubkey, Pubkey)>, CliError> {
    let config = RpcProgramAccountsConfig {
        filters: Some(vec![
            RpcFilterType::DataSize(TokenAccount::LEN as u64),
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(64, vec![1])),
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(0, mint.to_bytes().to_vec())),
        ]),
        account_config: RpcAccountInfoConfig {
            encoding: Some(UiAccountEncoding::Base64),
            commitment: Some(commitment),
            ..RpcAccountInfoConfig::default()
        },
        ..RpcProgramAccountsConfig::default()
    };
    let accounts = rpc_client
        .get_program_accounts_with_config(&spl_token_interface::id(), config)
        .await?;
    Ok(accounts.into_iter().find_map(|(address, account)| {
        let token_account = TokenAccount::unpack(&account.data).ok()?;
        (token_account.mint == *mint && token_account.amount == 1)
            .then_some((address, token_account.owner))
    }))
}

// ── Process Functions ───────────────────────────────────────────────
pub async fn process_pool_info_command(
    rpc_client: &Arc<RpcClient>,
    config: &CliConfig<'_>,
    command: &PoolInfoCliCommand,
) -> ProcessResult {
    let program_id = &config.program_id;
    match command {
        PoolInfoCliCommand::GlobalState => {
            let (address, _bump) = find_global_authority_address(program_id);
            let global_pool: Option<GlobalPool> =
                fetch_program_account(rpc_client, program_id, &address, config.commitment).await;
            Ok(match global_pool {
                Some(global_pool) => config
                    .output_format
                    .formatted_string(&CliGlobalPool::new(&address, &global_pool)),
                None => config.output_format.formatted_string(&CliRecordNotFound {
                    record: "global pool".to_string(),
                    address: address.to_string(),
                }),
            })
        }
        PoolInfoCliCommand::UserState { owner } => {
            let address = get_user_pool_address(owner, program_id).map_err(CliError::from)?;
            let user_pool: Option<UserPool> =
                fetch_program_account(rpc_client, program_id, &address, config.commitment).await;
            Ok(match user_pool {
                Some(user_pool) => config
                    .output_format
                    .formatted_string(&CliUserPool::new(&address, &user_pool)),
                None => config.output_format.formatted_string(&CliRecordNotFound {
                    record: "user pool".to_string(),
                    address: address.to_string(),
                }),
            })
        }
        PoolInfoCliCommand::Addresses { owner } => {
            let (global_authority, global_bump) = find_global_authority_address(program_id);
            let user_pool = get_user_pool_address(owner, program_id).map_err(CliError::from)?;
            Ok(config
                .output_format
                .formatted_string(&CliStakingAddresses {
                    program_id: program_id.to_string(),
                    global_authority: global_authority.to_string(),
                    global_bump,
                    reward_mint: config.reward_mint.to_string(),
                    reward_vault: get_reward_vault_address(program_id, &config.reward_mint)
                        .to_string(),
                    owner: owner.to_string(),
                    user_pool: user_pool.to_string(),
                    reward_account: get_associated_token_address(owner, &config.reward_mint)
                        .to_string(),
                }))
        }
        PoolInfoCliCommand::NftOwner { mint } => {
            match find_nft_holder(rpc_client, mint, config.commitment).await? {
                Some((token_account, holder)) => Ok(config
                    .output_format
                    .formatted_string(&CliNftHolder {
                        mint: mint.to_string(),
                        token_account: token_account.to_string(),
                        holder: holder.to_string(),
                    })),
                None => Ok(config.output_format.formatted_string(&CliRecordNotFound {
                    record: "holder of the NFT".to_string(),
                    address: mint.to_string(),
                })),
            }
        }
    }
}
