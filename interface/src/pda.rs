//! Deterministic address derivation.

use {
    crate::constants::{
        GLOBAL_AUTHORITY_SEED, METADATA_SEED, TOKEN_METADATA_PROGRAM_ID, USER_POOL_SEED,
    },
    solana_pubkey::{Pubkey, PubkeyError},
};

/// Global pool PDA and its bump seed.
pub fn find_global_authority_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[GLOBAL_AUTHORITY_SEED.as_bytes()], program_id)
}

/// Address of `owner`'s user pool, created with a seed rather than as a PDA.
pub fn get_user_pool_address(owner: &Pubkey, program_id: &Pubkey) -> Result<Pubkey, PubkeyError> {
    Pubkey::create_with_seed(owner, USER_POOL_SEED, program_id)
}

/// Associated SPL Token account of `owner` for `mint`.
pub fn get_associated_token_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account_interface::address::get_associated_token_address(owner, mint)
}

/// Reward vault: the global authority's associated account for the reward mint.
pub fn get_reward_vault_address(program_id: &Pubkey, reward_mint: &Pubkey) -> Pubkey {
    let (global_authority, _bump) = find_global_authority_address(program_id);
    get_associated_token_address(&global_authority, reward_mint)
}

/// Token Metadata account of `mint`.
pub fn find_metadata_address(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            METADATA_SEED.as_bytes(),
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}
