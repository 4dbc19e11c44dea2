// Upkeep Raffle Program - Errors
use solana_program::{program_error::ProgramError, pubkey::Pubkey};
use thiserror::Error;

use crate::state::RaffleState;

/// Errors that may be returned by the raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Instruction data could not be decoded
    #[error("Invalid instruction")]
    InvalidInstruction,

    /// Construction parameters are out of range
    #[error("Invalid raffle configuration")]
    InvalidConfig,

    #[error("Raffle already initialized")]
    AlreadyInitialized,

    #[error("Raffle not initialized")]
    NotInitialized,

    /// The raffle account is not the PDA derived from its seeds
    #[error("Raffle account does not match its derived address")]
    InvalidRaffleAddress,

    #[error("Entrance fee not met: paid {paid}, required {required}")]
    InsufficientFee { paid: u64, required: u64 },

    #[error("Raffle is not open")]
    RaffleClosed,

    #[error("Raffle is full ({capacity} tickets)")]
    RaffleFull { capacity: u32 },

    #[error("Upkeep not needed: balance={balance}, players={players}, state={state:?}")]
    UpkeepNotNeeded {
        balance: u64,
        players: u64,
        state: RaffleState,
    },

    /// Fulfillment does not match the outstanding randomness request
    #[error("Unknown randomness request {request_id}")]
    UnknownRequest { request_id: u64 },

    #[error("Only the configured coordinator can fulfill randomness requests")]
    OnlyCoordinatorCanFulfill,

    #[error("Fulfillment carried no random words")]
    MissingRandomWords,

    #[error("No players to pick a winner from")]
    NoPlayers,

    /// The pool could not be delivered to the winner
    #[error("Payout of {amount} lamports to {winner} failed")]
    PayoutFailed { winner: Pubkey, amount: u64 },

    #[error("Arithmetic overflow")]
    Overflow,
}

impl RaffleError {
    /// Stable code reported through `ProgramError::Custom`
    pub fn code(&self) -> u32 {
        match self {
            RaffleError::InvalidInstruction => 0,
            RaffleError::InvalidConfig => 1,
            RaffleError::AlreadyInitialized => 2,
            RaffleError::NotInitialized => 3,
            RaffleError::InvalidRaffleAddress => 4,
            RaffleError::InsufficientFee { .. } => 5,
            RaffleError::RaffleClosed => 6,
            RaffleError::RaffleFull { .. } => 7,
            RaffleError::UpkeepNotNeeded { .. } => 8,
            RaffleError::UnknownRequest { .. } => 9,
            RaffleError::OnlyCoordinatorCanFulfill => 10,
            RaffleError::MissingRandomWords => 11,
            RaffleError::NoPlayers => 12,
            RaffleError::PayoutFailed { .. } => 13,
            RaffleError::Overflow => 14,
        }
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e.code())
    }
}
