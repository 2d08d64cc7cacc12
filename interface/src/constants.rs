//! Seeds, sizes and well-known addresses used by the staking program.

use solana_pubkey::Pubkey;

/// PDA seed of the global pool, which also acts as escrow authority.
pub const GLOBAL_AUTHORITY_SEED: &str = "global-authority";

/// `create_with_seed` seed of a user's pool account.
pub const USER_POOL_SEED: &str = "user-pool";

/// Seed prefix of Token Metadata accounts.
pub const METADATA_SEED: &str = "metadata";

/// Mint of the reward ("medal") token paid out by the program.
pub const REWARD_MINT: Pubkey = Pubkey::from_str_const("3BAfTyeyPkykQuC5g1FejbebcphhWTBgEwJ75XXBW6CW");

/// Metaplex Token Metadata program.
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Length of the account and instruction discriminators.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Maximum number of NFTs a single user pool can hold.
pub const STAKE_MAX_COUNT: usize = 30;

/// Bytes allocated for the global pool: discriminator (8) + admin (32) + count (8).
pub const GLOBAL_POOL_SIZE: usize = 48;

/// Bytes allocated for a user pool.
///
/// The program allocates 8 + 2704; the packed payload only uses 2697 of the
/// 2704 bytes, the rest is zero padding.
pub const USER_POOL_SIZE: usize = 2712;
