//! Armory Staking program interface
//!
//! Client-side view of the on-chain NFT staking program: its identity, the
//! addresses it derives, the instructions it accepts and the accounts it
//! owns. Nothing in this crate performs I/O; the program itself is external
//! and is only reached through the instructions built here.
//!
//! ## Accounts
//!
//! | Account     | Address                                          | Size  |
//! |-------------|--------------------------------------------------|:-----:|
//! | Global pool | PDA of `["global-authority"]`                    | 48    |
//! | User pool   | `create_with_seed(owner, "user-pool", program)`  | 2712  |
//! | Reward vault| ATA of the global authority for the reward mint  | 165   |

pub mod constants;
pub mod error;
pub mod instruction;
pub mod pda;
pub mod state;

solana_pubkey::declare_id!("GqVfxjhCXWvhQtMg9x2K2BqhRDdC35MXxDjbLVdhaDv2");

pub use {
    error::{StakingError, StateError},
    state::{GlobalPool, ProgramAccount, StakedData, UserPool},
};
