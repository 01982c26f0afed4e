use anchor_lang::prelude::*;

mod errors;
mod events;
mod instructions;
mod state;

use instructions::*;

declare_id!("8M9LfcnALo4WNqGmoUkwtKvZVutkkUeje5kMWJnT6wQQ");

#[program]
pub mod escrow {
    use super::*;

    /// Create a new escrow: seller deposits the asset and sets exchange terms
    #[instruction(discriminator = 0)]
    pub fn initiate(
        ctx: Context<Initiate>,
        canceller: Pubkey,
        asset_amount: u64,
        payment_amount: u64,
        fee_basis: u8,
    ) -> Result<()> {
        instructions::initiate::handler(ctx, canceller, asset_amount, payment_amount, fee_basis)
    }

    /// Cancel the escrow: a permitted party returns the asset to the seller
    #[instruction(discriminator = 1)]
    pub fn cancel(ctx: Context<Cancel>) -> Result<()> {
        instructions::cancel::handler(ctx)
    }

    /// Complete the escrow: buyer pays seller and management, receives the asset
    #[instruction(discriminator = 2)]
    pub fn exchange(ctx: Context<Exchange>) -> Result<()> {
        instructions::exchange::handler(ctx)
    }
}
