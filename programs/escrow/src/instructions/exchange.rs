use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{close_account, transfer_checked, CloseAccount, Mint, Token, TokenAccount, TransferChecked},
};

use crate::errors::EscrowError;
use crate::events::EscrowExchanged;
use crate::state::{Escrow, EscrowStatus};

#[derive(Accounts)]
pub struct Exchange<'info> {
    /// The buyer who accepts the exchange terms
    #[account(mut)]
    pub buyer: Signer<'info>,

    /// The seller who created the escrow
    #[account(mut)]
    pub seller: SystemAccount<'info>,

    /// The fee-collecting management authority
    pub management: SystemAccount<'info>,

    /// Escrow account storing the terms (will be closed)
    #[account(
        mut,
        close = seller,
        has_one = seller,
        has_one = management,
        has_one = asset_mint,
        has_one = payment_mint,
        seeds = [Escrow::ESCROW_SEED, seller.key().as_ref(), asset_mint.key().as_ref()],
        bump = escrow.bump,
    )]
    pub escrow: Box<Account<'info, Escrow>>,

    /// Mint of the escrowed asset
    pub asset_mint: Box<Account<'info, Mint>>,

    /// Mint of the counter-token
    pub payment_mint: Box<Account<'info, Mint>>,

    /// Vault holding the asset (owned by the vault authority)
    #[account(
        mut,
        seeds = [Escrow::VAULT_SEED, seller.key().as_ref(), asset_mint.key().as_ref()],
        bump,
    )]
    pub vault: Box<Account<'info, TokenAccount>>,

    /// CHECK: compared in the handler against the re-derived vault authority
    pub vault_authority: UncheckedAccount<'info>,

    /// Buyer's token account for the counter-token (source of the payment)
    #[account(
        mut,
        associated_token::mint = payment_mint,
        associated_token::authority = buyer,
    )]
    pub buyer_payment_ata: Box<Account<'info, TokenAccount>>,

    /// Buyer's token account for the asset (receives the escrowed asset)
    #[account(
        init_if_needed,
        payer = buyer,
        associated_token::mint = asset_mint,
        associated_token::authority = buyer,
    )]
    pub buyer_asset_ata: Box<Account<'info, TokenAccount>>,

    /// Seller's token account for the counter-token (receives payment less fee)
    #[account(
        init_if_needed,
        payer = buyer,
        associated_token::mint = payment_mint,
        associated_token::authority = seller,
    )]
    pub seller_payment_ata: Box<Account<'info, TokenAccount>>,

    /// Management's token account for the counter-token (receives the fee)
    #[account(
        init_if_needed,
        payer = buyer,
        associated_token::mint = payment_mint,
        associated_token::authority = management,
    )]
    pub management_payment_ata: Box<Account<'info, TokenAccount>>,

    pub associated_token_program: Program<'info, AssociatedToken>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

impl<'info> Exchange<'info> {
    /// The re-derived vault authority must match both the passed account
    /// and the vault's recorded owner
    pub fn verify_vault_authority(&self) -> Result<()> {
        let derived = self.escrow.vault_authority_address()?;
        require_keys_eq!(
            derived,
            self.vault_authority.key(),
            EscrowError::AuthorityMismatch
        );
        require_keys_eq!(derived, self.vault.owner, EscrowError::AuthorityMismatch);
        Ok(())
    }

    /// Transfer the payment less the fee from buyer to seller
    pub fn pay_seller(&mut self, fee: u64) -> Result<()> {
        let cpi_accounts = TransferChecked {
            from: self.buyer_payment_ata.to_account_info(),
            mint: self.payment_mint.to_account_info(),
            to: self.seller_payment_ata.to_account_info(),
            authority: self.buyer.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new(cpi_program, cpi_accounts);

        transfer_checked(
            cpi_ctx,
            self.escrow.payment_amount - fee,
            self.payment_mint.decimals,
        )
    }

    /// Transfer the fee from buyer to management
    pub fn pay_management(&mut self, fee: u64) -> Result<()> {
        let cpi_accounts = TransferChecked {
            from: self.buyer_payment_ata.to_account_info(),
            mint: self.payment_mint.to_account_info(),
            to: self.management_payment_ata.to_account_info(),
            authority: self.buyer.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new(cpi_program, cpi_accounts);

        transfer_checked(cpi_ctx, fee, self.payment_mint.decimals)
    }

    /// Release the full vault balance to the buyer and close the vault
    pub fn release_and_close_vault(&mut self) -> Result<()> {
        let signer_seeds: &[&[&[u8]]] = &[&[
            Escrow::VAULT_AUTHORITY_SEED,
            &[self.escrow.vault_authority_bump],
        ]];

        // Transfer the whole vault balance to the buyer
        let cpi_accounts = TransferChecked {
            from: self.vault.to_account_info(),
            mint: self.asset_mint.to_account_info(),
            to: self.buyer_asset_ata.to_account_info(),
            authority: self.vault_authority.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new_with_signer(cpi_program, cpi_accounts, signer_seeds);

        transfer_checked(cpi_ctx, self.vault.amount, self.asset_mint.decimals)?;

        // Close the vault and return its rent to the seller
        let cpi_accounts = CloseAccount {
            account: self.vault.to_account_info(),
            destination: self.seller.to_account_info(),
            authority: self.vault_authority.to_account_info(),
        };
        let cpi_program = self.token_program.to_account_info();
        let cpi_ctx = CpiContext::new_with_signer(cpi_program, cpi_accounts, signer_seeds);

        close_account(cpi_ctx)
    }
}

/// Handler for the exchange instruction
pub fn handler(ctx: Context<Exchange>) -> Result<()> {
    // Only an active escrow can be exchanged
    require!(
        ctx.accounts.escrow.status == EscrowStatus::Active,
        EscrowError::NotActive
    );

    // The buyer must cover the full payment before anything moves
    require_gte!(
        ctx.accounts.buyer_payment_ata.amount,
        ctx.accounts.escrow.payment_amount,
        EscrowError::InsufficientFunds
    );

    ctx.accounts.verify_vault_authority()?;

    // Settle: payment less fee to seller, fee to management, asset to buyer
    let fee = ctx.accounts.escrow.fee();
    ctx.accounts.pay_seller(fee)?;
    ctx.accounts.pay_management(fee)?;
    ctx.accounts.release_and_close_vault()?;

    // Terminal status; the account closes when the instruction completes
    ctx.accounts.escrow.status = EscrowStatus::Exchanged;

    emit!(EscrowExchanged {
        escrow: ctx.accounts.escrow.key(),
        buyer: ctx.accounts.buyer.key(),
        fee,
    });

    Ok(())
}
