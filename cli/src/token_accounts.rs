//! Associated token accounts that must exist before a staking call.

use {
    crate::cli::CliError,
    armory_staking_interface::pda::get_associated_token_address,
    log::*,
    solana_commitment_config::CommitmentConfig,
    solana_instruction::Instruction,
    solana_pubkey::Pubkey,
    solana_rpc_client::nonblocking::rpc_client::RpcClient,
    spl_associated_token_account_interface::instruction::create_associated_token_account,
};

/// Creation instructions for the absent accounts, plus every resolved
/// destination in request order.
#[derive(Debug, Default, PartialEq)]
pub struct AssociatedTokenAccounts {
    pub instructions: Vec<Instruction>,
    pub destination_accounts: Vec<Pubkey>,
}

impl AssociatedTokenAccounts {
    /// Record `owner`'s account for `mint`, queueing its creation if it does
    /// not exist yet. A mint already queued is not created twice.
    pub fn push(&mut self, payer: &Pubkey, owner: &Pubkey, mint: &Pubkey, exists: bool) -> Pubkey {
        let address = get_associated_token_address(owner, mint);
        if !exists && !self.destination_accounts.contains(&address) {
            self.instructions.push(create_associated_token_account(
                payer,
                owner,
                mint,
                &spl_token_interface::id(),
            ));
        }
        self.destination_accounts.push(address);
        address
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Accounts whose creation is queued.
    pub fn created(&self) -> Vec<Pubkey> {
        self.instructions
            .iter()
            .filter_map(|instruction| instruction.accounts.get(1))
            .map(|meta| meta.pubkey)
            .collect()
    }
}

/// Resolve `owner`'s associated token accounts for `mints` and queue the
/// creation of those that are absent, funded by `payer`.
pub async fn get_associated_token_accounts_to_create(
    rpc_client: &RpcClient,
    payer: &Pubkey,
    owner: &Pubkey,
    mints: &[Pubkey],
    commitment: CommitmentConfig,
) -> Result<AssociatedTokenAccounts, CliError> {
    let wallets: Vec<(Pubkey, Pubkey)> = mints.iter().map(|mint| (*owner, *mint)).collect();
    resolve_associated_token_accounts(rpc_client, payer, &wallets, commitment).await
}

/// Same as [`get_associated_token_accounts_to_create`] for `(owner, mint)`
/// pairs with different owners, checked in a single request.
pub async fn resolve_associated_token_accounts(
    rpc_client: &RpcClient,
    payer: &Pubkey,
    wallets: &[(Pubkey, Pubkey)],
    commitment: CommitmentConfig,
) -> Result<AssociatedTokenAccounts, CliError> {
    let addresses: Vec<Pubkey> = wallets
        .iter()
        .map(|(owner, mint)| get_associated_token_address(owner, mint))
        .collect();
    let accounts = rpc_client
        .get_multiple_accounts_with_commitment(&addresses, commitment)
        .await?
        .value;
    if accounts.len() != addresses.len() {
        return Err(CliError::DynamicProgramError(format!(
            "requested {} accounts, received {}",
            addresses.len(),
            accounts.len()
        )));
    }

    let mut token_accounts = AssociatedTokenAccounts::default();
    for ((owner, mint), account) in wallets.iter().zip(accounts) {
        let address = token_accounts.push(payer, owner, mint, account.is_some());
        if account.is_none() {
            debug!("associated token account {address} of {owner} for mint {mint} is missing");
        }
    }
    Ok(token_accounts)
}
