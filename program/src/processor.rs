// Upkeep Raffle Program - Instruction Processor
use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction, system_program,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    constants::RAFFLE_SEED,
    error::RaffleError,
    instruction::RaffleInstruction,
    oracle::{CoordinatorOracle, RandomWord},
    payout::LamportVault,
    state::{Raffle, RaffleConfig},
    utils,
};

/// Program state handler.
pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle { nonce, config } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(accounts, nonce, config, program_id)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep { check_data } => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, &check_data, program_id)
            }
            RaffleInstruction::PerformUpkeep { perform_data } => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, &perform_data, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
        }
    }

    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        nonce: u64,
        config: RaffleConfig,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if !system_program::check_id(system_program_info.key) {
            return Err(ProgramError::IncorrectProgramId);
        }
        config.validate().map_err(reject)?;

        let (expected_raffle_pubkey, bump_seed) =
            utils::find_raffle_address(program_id, authority_info.key, nonce);
        if *raffle_info.key != expected_raffle_pubkey {
            return Err(reject(RaffleError::InvalidRaffleAddress));
        }

        let space = Raffle::space(config.max_players);
        if raffle_info.owner == program_id {
            if !Raffle::is_uninitialized(&raffle_info.data.borrow()) {
                return Err(reject(RaffleError::AlreadyInitialized));
            }
            if raffle_info.data_len() < space {
                msg!("Raffle account needs {} bytes", space);
                return Err(ProgramError::AccountDataTooSmall);
            }
        } else {
            msg!("Creating raffle account with {} bytes", space);
            let nonce_bytes = nonce.to_le_bytes();
            let bump = [bump_seed];
            let signer_seeds: &[&[u8]] =
                &[RAFFLE_SEED, authority_info.key.as_ref(), &nonce_bytes, &bump];
            create_raffle_account(
                authority_info,
                raffle_info,
                system_program_info,
                program_id,
                space,
                signer_seeds,
            )?;
        }

        let now = Clock::get()?.unix_timestamp;
        let raffle = Raffle::new(*authority_info.key, nonce, bump_seed, config, now).map_err(reject)?;
        raffle.save(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: address={}, entrance_fee={}, interval={}s, capacity={}, coordinator={}",
            raffle_info.key,
            config.entrance_fee,
            config.interval,
            config.max_players,
            config.randomness.coordinator
        );
        Ok(())
    }

    fn process_enter_raffle(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let participant_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !participant_info.is_signer {
            msg!("Participant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if !system_program::check_id(system_program_info.key) {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = load_raffle(program_id, raffle_info)?;
        let event = raffle.enter(*participant_info.key, amount).map_err(reject)?;

        // Fee moves only once the ticket has been accepted
        invoke(
            &system_instruction::transfer(participant_info.key, raffle_info.key, amount),
            &[
                participant_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        raffle.save(&mut raffle_info.data.borrow_mut())?;
        event.emit(raffle_info.key)?;
        msg!(
            "Tickets in round: {}, pool: {} lamports",
            raffle.number_of_players(),
            raffle.pool_balance()
        );
        Ok(())
    }

    fn process_check_upkeep(
        accounts: &[AccountInfo],
        check_data: &[u8],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = load_raffle(program_id, raffle_info)?;
        let status = raffle.check_upkeep(Clock::get()?.unix_timestamp);

        msg!(
            "Upkeep needed: {} (open={}, time_passed={}, has_players={}, has_balance={}, check_data={} bytes)",
            status.upkeep_needed,
            status.is_open,
            status.time_passed,
            status.has_players,
            status.has_balance,
            check_data.len()
        );
        let data = status
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        set_return_data(&data);
        Ok(())
    }

    fn process_perform_upkeep(
        accounts: &[AccountInfo],
        perform_data: &[u8],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let keeper_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        if !keeper_info.is_signer {
            msg!("Keeper must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = load_raffle(program_id, raffle_info)?;
        let now = Clock::get()?.unix_timestamp;
        msg!("Keeper {} performing upkeep ({} bytes of perform data)", keeper_info.key, perform_data.len());

        let mut oracle = CoordinatorOracle::new(*raffle_info.key);
        let event = raffle.perform_upkeep(now, &mut oracle).map_err(reject)?;

        raffle.save(&mut raffle_info.data.borrow_mut())?;
        event.emit(raffle_info.key)?;
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[RandomWord],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let coordinator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let mut raffle = load_raffle(program_id, raffle_info)?;
        if !coordinator_info.is_signer || *coordinator_info.key != raffle.config.randomness.coordinator {
            return Err(reject(RaffleError::OnlyCoordinatorCanFulfill));
        }

        let now = Clock::get()?.unix_timestamp;
        let mut vault = LamportVault::new(raffle_info, winner_info, Rent::get()?);
        let event = raffle
            .fulfill_random_words(request_id, random_words, now, &mut vault)
            .map_err(reject)?;

        raffle.save(&mut raffle_info.data.borrow_mut())?;
        event.emit(raffle_info.key)?;
        Ok(())
    }
}

/// Create the raffle PDA, tolerating lamports sent to the address beforehand
fn create_raffle_account<'a>(
    payer_info: &AccountInfo<'a>,
    raffle_info: &AccountInfo<'a>,
    system_program_info: &AccountInfo<'a>,
    program_id: &Pubkey,
    space: usize,
    signer_seeds: &[&[u8]],
) -> ProgramResult {
    let required_lamports = Rent::get()?.minimum_balance(space);

    if raffle_info.lamports() == 0 {
        return invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                raffle_info.key,
                required_lamports,
                space as u64,
                program_id,
            ),
            &[
                payer_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
            &[signer_seeds],
        );
    }

    // create_account refuses funded addresses, so top up, allocate and assign
    let shortfall = required_lamports.saturating_sub(raffle_info.lamports());
    if shortfall > 0 {
        invoke(
            &system_instruction::transfer(payer_info.key, raffle_info.key, shortfall),
            &[
                payer_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;
    }
    invoke_signed(
        &system_instruction::allocate(raffle_info.key, space as u64),
        &[raffle_info.clone(), system_program_info.clone()],
        &[signer_seeds],
    )?;
    invoke_signed(
        &system_instruction::assign(raffle_info.key, program_id),
        &[raffle_info.clone(), system_program_info.clone()],
        &[signer_seeds],
    )
}

/// Load a raffle owned by this program and stored at its derived address
fn load_raffle(program_id: &Pubkey, raffle_info: &AccountInfo) -> Result<Raffle, ProgramError> {
    if raffle_info.owner != program_id {
        msg!("Raffle account must be owned by the program");
        return Err(ProgramError::IncorrectProgramId);
    }
    let raffle = Raffle::load(&raffle_info.data.borrow())?;
    if utils::create_raffle_address(program_id, &raffle.authority, raffle.nonce, raffle.bump)
        != Some(*raffle_info.key)
    {
        return Err(reject(RaffleError::InvalidRaffleAddress));
    }
    Ok(raffle)
}

fn reject(error: RaffleError) -> ProgramError {
    msg!("Error: {}", error);
    error.into()
}
