use anchor_lang::prelude::*;
use anchor_spl::token::{transfer_checked, Mint, Token, TokenAccount, TransferChecked};

use crate::errors::EscrowError;
use crate::events::EscrowInitiated;
use crate::state::{Escrow, EscrowStatus};

#[derive(Accounts)]
pub struct Initiate<'info> {
    /// The seller who sets the exchange terms and deposits the asset
    #[account(mut)]
    pub seller: Signer<'info>,

    /// The fee-collecting authority; co-signs the escrow terms
    pub management: Signer<'info>,

    /// Escrow account that stores the terms and lifecycle status
    #[account(
        init,
        payer = seller,
        space = 8 + Escrow::INIT_SPACE,
        seeds = [Escrow::ESCROW_SEED, seller.key().as_ref(), asset_mint.key().as_ref()],
        bump,
    )]
    pub escrow: Account<'info, Escrow>,

    /// Mint of the token the seller deposits
    pub asset_mint: Account<'info, Mint>,

    /// Mint of the counter-token the buyer must pay
    pub payment_mint: Account<'info, Mint>,

    /// Seller's token account for the asset (source of the deposit)
    #[account(
        mut,
        associated_token::mint = asset_mint,
        associated_token::authority = seller,
    )]
    pub seller_asset_ata: Account<'info, TokenAccount>,

    /// Vault holding the deposited asset, owned by the vault authority
    #[account(
        init,
        payer = seller,
        seeds = [Escrow::VAULT_SEED, seller.key().as_ref(), asset_mint.key().as_ref()],
        bump,
        token::mint = asset_mint,
        token::authority = vault_authority,
    )]
    pub vault: Account<'info, TokenAccount>,

    /// CHECK: program-wide keyless PDA; sole signing authority over every vault
    #[account(seeds = [Escrow::VAULT_AUTHORITY_SEED], bump)]
    pub vault_authority: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

impl<'info> Initiate<'info> {
    /// Initialize the escrow account with the exchange terms
    pub fn init_escrow(
        &mut self,
        canceller: Pubkey,
        asset_amount: u64,
        payment_amount: u64,
        fee_basis: u8,
        bumps: &InitiateBumps,
    ) -> Result<()> {
        self.escrow.set_inner(Escrow {
            seller: self.seller.key(),
            management: self.management.key(),
            canceller,
            asset_mint: self.asset_mint.key(),
            payment_mint: self.payment_mint.key(),
            asset_amount,
            payment_amount,
            fee_basis,
            status: EscrowStatus::Active,
            bump: bumps.escrow,
            vault_authority_bump: bumps.vault_authority,
        });
        Ok(())
    }

    /// Transfer the asset from the seller into the vault
    pub fn deposit(&mut self, amount: u64) -> Result<()> {
        let cpi_accounts = TransferChecked {
            from: self.seller_asset_ata.to_account_info(),
            mint: self.asset_mint.to_account_info(),
            to: self.vault.to_account_info(),
            authority: self.seller.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new(cpi_program, cpi_accounts);

        transfer_checked(cpi_ctx, amount, self.asset_mint.decimals)
    }
}

/// Handler for the initiate instruction
pub fn handler(
    ctx: Context<Initiate>,
    canceller: Pubkey,
    asset_amount: u64,
    payment_amount: u64,
    fee_basis: u8,
) -> Result<()> {
    // Both sides of the exchange must be non-zero
    require_gt!(asset_amount, 0, EscrowError::InvalidAmount);
    require_gt!(payment_amount, 0, EscrowError::InvalidAmount);

    // Fee is an integer percent of the payment
    require_gte!(Escrow::MAX_FEE_BASIS, fee_basis, EscrowError::InvalidFeeRate);

    // Management is a distinct third party
    require_keys_neq!(
        ctx.accounts.management.key(),
        ctx.accounts.seller.key(),
        EscrowError::Unauthorized
    );

    // The deposit must be fully funded before any state is created
    require_gte!(
        ctx.accounts.seller_asset_ata.amount,
        asset_amount,
        EscrowError::InsufficientFunds
    );

    // Record the terms, then fund the vault
    ctx.accounts
        .init_escrow(canceller, asset_amount, payment_amount, fee_basis, &ctx.bumps)?;
    ctx.accounts.deposit(asset_amount)?;

    emit!(EscrowInitiated {
        escrow: ctx.accounts.escrow.key(),
        seller: ctx.accounts.seller.key(),
        management: ctx.accounts.management.key(),
        asset_mint: ctx.accounts.asset_mint.key(),
        payment_mint: ctx.accounts.payment_mint.key(),
        asset_amount,
        payment_amount,
        fee_basis,
    });

    Ok(())
}
