// Upkeep Raffle Program - Entrypoint
use solana_program::entrypoint;

use crate::process_instruction;

entrypoint!(process_instruction);
