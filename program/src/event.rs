// Upkeep Raffle Program - Events
//
// Notifications for off-chain observers (indexers, keepers, the coordinator).
// Each event is logged once as a readable `msg!` line and once as a
// borsh-encoded `sol_log_data` record.
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    entrypoint::ProgramResult, log::sol_log_data, msg, program_error::ProgramError,
    pubkey::Pubkey,
};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// A ticket was accepted
    EnteredRaffle { participant: Pubkey, paid: u64 },
    /// Entry closed and randomness was requested
    RequestedRaffleWinner { request_id: u64 },
    /// The round concluded and the pool was paid out
    WinnerPicked {
        winner: Pubkey,
        prize: u64,
        request_id: u64,
    },
}

impl RaffleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RaffleEvent::EnteredRaffle { .. } => "EnteredRaffle",
            RaffleEvent::RequestedRaffleWinner { .. } => "RequestedRaffleWinner",
            RaffleEvent::WinnerPicked { .. } => "WinnerPicked",
        }
    }

    pub fn emit(&self, raffle: &Pubkey) -> ProgramResult {
        match self {
            RaffleEvent::EnteredRaffle { participant, paid } => {
                msg!("EnteredRaffle: raffle={}, participant={}, paid={}", raffle, participant, paid)
            }
            RaffleEvent::RequestedRaffleWinner { request_id } => {
                msg!("RequestedRaffleWinner: raffle={}, request_id={}", raffle, request_id)
            }
            RaffleEvent::WinnerPicked {
                winner,
                prize,
                request_id,
            } => msg!(
                "WinnerPicked: raffle={}, winner={}, prize={}, request_id={}",
                raffle,
                winner,
                prize,
                request_id
            ),
        }
        let data = self
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        sol_log_data(&[self.name().as_bytes(), raffle.as_ref(), &data]);
        Ok(())
    }
}
