// Upkeep Raffle
// A raffle that closes itself on a keeper's upkeep call, draws its winner from
// coordinator-supplied randomness, pays out the whole pool and reopens.

pub mod constants;
pub mod error;
pub mod event;
pub mod instruction;
pub mod oracle;
pub mod payout;
pub mod processor;
pub mod raffle;
pub mod state;
pub mod utils;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub use solana_program;

/// Dispatch an instruction to the processor; also the handler used by
/// `solana-program-test`
pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
