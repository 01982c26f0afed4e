use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{close_account, transfer_checked, CloseAccount, Mint, Token, TokenAccount, TransferChecked},
};

use crate::errors::EscrowError;
use crate::events::EscrowCancelled;
use crate::state::{Escrow, EscrowStatus};

#[derive(Accounts)]
pub struct Cancel<'info> {
    /// Any one of seller, canceller or management may cancel
    #[account(mut)]
    pub caller: Signer<'info>,

    /// The seller; receives the asset back along with the reclaimed rent
    #[account(mut)]
    pub seller: SystemAccount<'info>,

    /// Escrow account storing the terms (will be closed)
    #[account(
        mut,
        close = seller,
        has_one = seller,
        has_one = asset_mint,
        seeds = [Escrow::ESCROW_SEED, seller.key().as_ref(), asset_mint.key().as_ref()],
        bump = escrow.bump,
    )]
    pub escrow: Account<'info, Escrow>,

    /// Mint of the escrowed asset
    pub asset_mint: Account<'info, Mint>,

    /// Vault holding the asset (owned by the vault authority)
    #[account(
        mut,
        seeds = [Escrow::VAULT_SEED, seller.key().as_ref(), asset_mint.key().as_ref()],
        bump,
    )]
    pub vault: Account<'info, TokenAccount>,

    /// CHECK: compared in the handler against the re-derived vault authority
    pub vault_authority: UncheckedAccount<'info>,

    /// Seller's token account for the asset (receives the refund)
    #[account(
        init_if_needed,
        payer = caller,
        associated_token::mint = asset_mint,
        associated_token::authority = seller,
    )]
    pub seller_asset_ata: Account<'info, TokenAccount>,

    pub associated_token_program: Program<'info, AssociatedToken>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

impl<'info> Cancel<'info> {
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

    /// Return the full vault balance to the seller and close the vault
    pub fn refund_and_close_vault(&mut self) -> Result<()> {
        let signer_seeds: &[&[&[u8]]] = &[&[
            Escrow::VAULT_AUTHORITY_SEED,
            &[self.escrow.vault_authority_bump],
        ]];

        // Transfer the whole balance back to the seller
        let cpi_accounts = TransferChecked {
            from: self.vault.to_account_info(),
            mint: self.asset_mint.to_account_info(),
            to: self.seller_asset_ata.to_account_info(),
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

/// Handler for the cancel instruction
pub fn handler(ctx: Context<Cancel>) -> Result<()> {
    // Only an active escrow can be cancelled
    require!(
        ctx.accounts.escrow.status == EscrowStatus::Active,
        EscrowError::NotActive
    );

    // Flat set-membership authorization
    require!(
        ctx.accounts.escrow.may_cancel(&ctx.accounts.caller.key()),
        EscrowError::Unauthorized
    );

    ctx.accounts.verify_vault_authority()?;
    ctx.accounts.refund_and_close_vault()?;

    // Terminal status; the account closes when the instruction completes
    ctx.accounts.escrow.status = EscrowStatus::Cancelled;

    emit!(EscrowCancelled {
        escrow: ctx.accounts.escrow.key(),
        caller: ctx.accounts.caller.key(),
    });

    Ok(())
}
