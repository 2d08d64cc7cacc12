use {
    crate::cli::CliError,
    solana_cli_output::display::build_balance_message,
    solana_commitment_config::CommitmentConfig,
    solana_message::Message,
    solana_pubkey::Pubkey,
    solana_rpc_client::nonblocking::rpc_client::RpcClient,
    solana_rpc_client_api::client_error::Result as ClientResult,
};

/// Fail unless `account_pubkey` can pay `balance` lamports on top of the fee
/// of `message`. With no spend, a shortfall is reported as a missing fee.
pub async fn check_account_for_spend_and_fee(
    rpc_client: &RpcClient,
    account_pubkey: &Pubkey,
    balance: u64,
    message: &Message,
    commitment: CommitmentConfig,
) -> Result<(), CliError> {
    let fee = rpc_client.get_fee_for_message(message).await?;
    let required = balance.saturating_add(fee);
    if !check_account_for_balance(rpc_client, account_pubkey, required, commitment).await? {
        if balance > 0 {
            return Err(CliError::InsufficientFundsForSpendAndFee(
                build_balance_message(required, false, false),
                *account_pubkey,
            ));
        }
        return Err(CliError::InsufficientFundsForFee(
            build_balance_message(fee, false, false),
            *account_pubkey,
        ));
    }
    Ok(())
}

pub async fn check_account_for_balance(
    rpc_client: &RpcClient,
    account_pubkey: &Pubkey,
    balance: u64,
    commitment: CommitmentConfig,
) -> ClientResult<bool> {
    let lamports = rpc_client
        .get_balance_with_commitment(account_pubkey, commitment)
        .await?
        .value;
    Ok(lamports != 0 && lamports >= balance)
}

/// Whether an account is present at `pubkey`.
pub async fn account_exists(
    rpc_client: &RpcClient,
    pubkey: &Pubkey,
    commitment: CommitmentConfig,
) -> ClientResult<bool> {
    Ok(rpc_client
        .get_account_with_commitment(pubkey, commitment)
        .await?
        .value
        .is_some())
}
