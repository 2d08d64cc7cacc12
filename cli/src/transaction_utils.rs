use {
    crate::{
        checks::check_account_for_spend_and_fee,
        cli::{CliConfig, CliError},
    },
    armory_staking_interface::StakingError,
    log::*,
    solana_commitment_config::CommitmentConfig,
    solana_instruction::{error::InstructionError, Instruction},
    solana_message::Message,
    solana_rpc_client::nonblocking::rpc_client::RpcClient,
    solana_rpc_client_api::client_error::Error as ClientError,
    solana_signature::Signature,
    solana_transaction::Transaction,
    solana_transaction_error::TransactionError,
};

/// Sign `instructions` with the configured signers, send them as one
/// transaction and wait until it reaches `commitment`.
///
/// `lamports_spent` is added to the fee in the balance pre-check.
pub async fn send_instructions(
    rpc_client: &RpcClient,
    config: &CliConfig<'_>,
    instructions: &[Instruction],
    lamports_spent: u64,
    commitment: CommitmentConfig,
) -> Result<Signature, CliError> {
    let fee_payer = config.fee_payer()?;
    let blockhash = rpc_client.get_latest_blockhash().await?;
    let message = Message::new_with_blockhash(instructions, Some(&fee_payer), &blockhash);
    check_account_for_spend_and_fee(
        rpc_client,
        &fee_payer,
        lamports_spent,
        &message,
        config.commitment,
    )
    .await?;

    let mut transaction = Transaction::new_unsigned(message);
    transaction.try_sign(&config.signers, blockhash)?;
    info!(
        "sending {} instruction(s) signed by {fee_payer}",
        instructions.len()
    );
    rpc_client
        .send_and_confirm_transaction_with_spinner_and_commitment(&transaction, commitment)
        .await
        .map_err(map_program_error)
}

/// Name the staking program's custom errors; anything else passes through.
pub fn map_program_error(error: ClientError) -> CliError {
    if let Some(TransactionError::InstructionError(index, InstructionError::Custom(code))) =
        error.get_transaction_error()
    {
        if let Some(program_error) = StakingError::from_custom_code(code) {
            return CliError::ProgramError {
                index,
                error: program_error,
            };
        }
    }
    CliError::ClientError(error)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::test_utils::rpc_response,
        assert_matches::assert_matches,
        serde_json::json,
        solana_keypair::Keypair,
        solana_pubkey::Pubkey,
        solana_rpc_client_api::request::RpcRequest,
        solana_signer::Signer,
        std::collections::HashMap,
        test_case::test_case,
    };

    #[test_case(6001, StakingError::InvalidMetadata)]
    #[test_case(6006, StakingError::InvalidClaimRequest)]
    #[test_case(6007, StakingError::InsufficientRewardVault)]
    fn test_known_custom_error_is_named(code: u32, expected: StakingError) {
        let error = ClientError::from(TransactionError::InstructionError(
            3,
            InstructionError::Custom(code),
        ));
        assert_matches!(
            map_program_error(error),
            CliError::ProgramError { index: 3, error } if error == expected
        );
    }

    #[test]
    fn test_other_errors_pass_through() {
        let error = ClientError::from(TransactionError::InstructionError(
            0,
            InstructionError::Custom(1),
        ));
        assert_matches!(map_program_error(error), CliError::ClientError(_));

        let error = ClientError::from(TransactionError::AccountNotFound);
        assert_matches!(map_program_error(error), CliError::ClientError(_));
    }

    #[tokio::test]
    async fn test_send_requires_signer() {
        let rpc_client = RpcClient::new_mock("succeeds".to_string());
        let config = CliConfig::default();
        assert_matches!(
            send_instructions(&rpc_client, &config, &[], 0, CommitmentConfig::confirmed()).await,
            Err(CliError::BadParameter(_))
        );
    }

    #[tokio::test]
    async fn test_send_checks_fee_before_signing() {
        let mut mocks = HashMap::new();
        mocks.insert(RpcRequest::GetBalance, rpc_response(json!(0)));
        mocks.insert(RpcRequest::GetFeeForMessage, rpc_response(json!(5_000)));
        let rpc_client = RpcClient::new_mock_with_mocks("succeeds".to_string(), mocks);

        let keypair = Keypair::new();
        let config = CliConfig {
            signers: vec![&keypair],
            ..CliConfig::default()
        };
        let instruction = armory_staking_interface::instruction::claim_reward(
            &config.program_id,
            &keypair.pubkey(),
            &Pubkey::new_unique(),
        )
        .unwrap();

        assert_matches!(
            send_instructions(
                &rpc_client,
                &config,
                &[instruction],
                0,
                CommitmentConfig::confirmed()
            )
            .await,
            Err(CliError::InsufficientFundsForFee(_, payer)) if payer == keypair.pubkey()
        );
    }
}
