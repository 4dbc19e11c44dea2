// Upkeep Raffle Program - Instructions
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{error::RaffleError, oracle::RandomWord, state::RaffleConfig, utils};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create a raffle with a fixed configuration
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The authority, pays for the raffle account
    /// 1. `[writable]` The raffle account (PDA of `["raffle", authority, nonce]`)
    /// 2. `[]` The system program
    InitializeRaffle {
        /// Distinguishes raffles of the same authority
        nonce: u64,
        config: RaffleConfig,
    },

    /// Buy one ticket
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The participant, pays `amount`
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle {
        /// Lamports paid, at least the entrance fee
        amount: u64,
    },

    /// Report whether upkeep should be performed (read-only).
    /// The borsh-encoded `UpkeepStatus` is set as return data.
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep { check_data: Vec<u8> },

    /// Close the round and request randomness. Anyone may act as keeper.
    ///
    /// Accounts expected:
    /// 0. `[signer]` The keeper
    /// 1. `[writable]` The raffle account
    PerformUpkeep { perform_data: Vec<u8> },

    /// Deliver randomness for the outstanding request, paying the winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` The configured coordinator
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The winner selected by the first random word
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<RandomWord>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| RaffleError::InvalidInstruction.into())
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(
    program_id: &Pubkey,
    authority: &Pubkey,
    nonce: u64,
    config: RaffleConfig,
) -> Instruction {
    let (raffle, _) = utils::find_raffle_address(program_id, authority, nonce);
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::InitializeRaffle { nonce, config },
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(raffle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    participant: &Pubkey,
    raffle: &Pubkey,
    amount: u64,
) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::EnterRaffle { amount },
        vec![
            AccountMeta::new(*participant, true),
            AccountMeta::new(*raffle, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, raffle: &Pubkey, check_data: Vec<u8>) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::CheckUpkeep { check_data },
        vec![AccountMeta::new_readonly(*raffle, false)],
    )
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    keeper: &Pubkey,
    raffle: &Pubkey,
    perform_data: Vec<u8>,
) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::PerformUpkeep { perform_data },
        vec![
            AccountMeta::new_readonly(*keeper, true),
            AccountMeta::new(*raffle, false),
        ],
    )
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    coordinator: &Pubkey,
    raffle: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_words: Vec<RandomWord>,
) -> Instruction {
    Instruction::new_with_borsh(
        *program_id,
        &RaffleInstruction::FulfillRandomWords {
            request_id,
            random_words,
        },
        vec![
            AccountMeta::new_readonly(*coordinator, true),
            AccountMeta::new(*raffle, false),
            AccountMeta::new(*winner, false),
        ],
    )
}
