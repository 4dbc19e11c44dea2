// Upkeep Raffle Program - Prize custody
use solana_program::{
    account_info::AccountInfo, entrypoint::ProgramResult, msg, program_error::ProgramError,
    pubkey::Pubkey, rent::Rent,
};

/// Releases the pooled prize to a round's winner.
///
/// Either the full amount reaches the winner or nothing moves.
pub trait PrizeVault {
    fn release(&mut self, winner: &Pubkey, amount: u64) -> ProgramResult;
}

/// Pays out of the raffle PDA's own lamports.
///
/// The raffle account is owned by this program, so it can be debited directly
/// without a system-program transfer.
pub struct LamportVault<'a, 'info> {
    raffle_info: &'a AccountInfo<'info>,
    winner_info: &'a AccountInfo<'info>,
    rent: Rent,
}

impl<'a, 'info> LamportVault<'a, 'info> {
    pub fn new(
        raffle_info: &'a AccountInfo<'info>,
        winner_info: &'a AccountInfo<'info>,
        rent: Rent,
    ) -> Self {
        Self {
            raffle_info,
            winner_info,
            rent,
        }
    }
}

impl<'a, 'info> PrizeVault for LamportVault<'a, 'info> {
    fn release(&mut self, winner: &Pubkey, amount: u64) -> ProgramResult {
        if self.winner_info.key != winner {
            msg!("Winner account {} does not match drawn winner {}", self.winner_info.key, winner);
            return Err(ProgramError::InvalidArgument);
        }
        if self.winner_info.key == self.raffle_info.key {
            msg!("Raffle account cannot win its own pool");
            return Err(ProgramError::InvalidArgument);
        }
        if !self.winner_info.is_writable {
            msg!("Winner account must be writable");
            return Err(ProgramError::InvalidArgument);
        }
        if self.winner_info.executable {
            msg!("Winner account is executable and cannot receive lamports");
            return Err(ProgramError::InvalidArgument);
        }

        let remaining = self
            .raffle_info
            .lamports()
            .checked_sub(amount)
            .ok_or(ProgramError::InsufficientFunds)?;
        if remaining < self.rent.minimum_balance(self.raffle_info.data_len()) {
            msg!("Payout would leave the raffle account below rent exemption");
            return Err(ProgramError::InsufficientFunds);
        }
        let credited = self
            .winner_info
            .lamports()
            .checked_add(amount)
            .ok_or(ProgramError::InvalidArgument)?;
        if credited < self.rent.minimum_balance(self.winner_info.data_len()) {
            msg!("Payout of {} would leave the winner below rent exemption", amount);
            return Err(ProgramError::InsufficientFunds);
        }

        **self.raffle_info.try_borrow_mut_lamports()? = remaining;
        **self.winner_info.try_borrow_mut_lamports()? = credited;
        Ok(())
    }
}
