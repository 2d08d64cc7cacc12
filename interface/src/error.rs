//! Errors of the staking program and of account decoding.

use {
    num_derive::{FromPrimitive, ToPrimitive},
    num_traits::FromPrimitive,
    thiserror::Error,
};

/// Custom errors returned by the on-chain program.
///
/// Discriminants are the raw `InstructionError::Custom` codes; the program
/// numbers its errors from 6000.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum StakingError {
    #[error("Invalid NFT address")]
    InvalidNftAddress = 6000,

    #[error("Invalid NFT metadata")]
    InvalidMetadata,

    #[error("Invalid user pool")]
    InvalidUserPool,

    #[error("Unknown or not allowed NFT collection")]
    UnknownOrNotAllowedNftCollection,

    #[error("Not allowed NFT ID for staking")]
    NotAllowedNftId,

    #[error("Failed to parse metadata creators")]
    MetadataCreatorParseError,

    #[error("Reward can't be claimed yet")]
    InvalidClaimRequest,

    #[error("Reward vault holds less than the claimed amount")]
    InsufficientRewardVault,
}

impl StakingError {
    /// Map a custom instruction error code back to a program error.
    pub fn from_custom_code(code: u32) -> Option<Self> {
        Self::from_u32(code)
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Failure to interpret raw account data as one of the program's accounts.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("account data too short: {len} bytes, expected at least {expected}")]
    DataTooShort { len: usize, expected: usize },

    #[error("account discriminator mismatch for {0}")]
    DiscriminatorMismatch(&'static str),

    #[error("account data could not be decoded: {0}")]
    Decode(#[from] std::io::Error),
}
