// Upkeep Raffle Program - Utility Functions
use solana_program::pubkey::Pubkey;

use crate::constants::RAFFLE_SEED;

/// Find the program derived address for a raffle
pub fn find_raffle_address(program_id: &Pubkey, authority: &Pubkey, nonce: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[RAFFLE_SEED, authority.as_ref(), &nonce.to_le_bytes()],
        program_id,
    )
}

/// Recreate a raffle address from its stored bump
pub fn create_raffle_address(
    program_id: &Pubkey,
    authority: &Pubkey,
    nonce: u64,
    bump: u8,
) -> Option<Pubkey> {
    Pubkey::create_program_address(
        &[RAFFLE_SEED, authority.as_ref(), &nonce.to_le_bytes(), &[bump]],
        program_id,
    )
    .ok()
}
