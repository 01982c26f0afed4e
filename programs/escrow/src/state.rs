use anchor_lang::prelude::*;

use crate::errors::EscrowError;

/// Escrow account that stores the exchange terms and lifecycle status
#[account(discriminator = 1)]
#[derive(InitSpace)]
pub struct Escrow {
    /// The seller's wallet address (depositor of the asset)
    pub seller: Pubkey,
    /// The fee-collecting management authority
    pub management: Pubkey,
    /// Counterparty granted unilateral cancellation rights
    pub canceller: Pubkey,
    /// Mint of the escrowed asset
    pub asset_mint: Pubkey,
    /// Mint of the counter-token the buyer pays with
    pub payment_mint: Pubkey,
    /// Quantity of the asset held in the vault
    pub asset_amount: u64,
    /// Quantity of the counter-token required to complete the exchange
    pub payment_amount: u64,
    /// Fee rate in integer percent (0..=100) applied to the payment
    pub fee_basis: u8,
    /// Lifecycle status; a terminal status is written just before closure
    pub status: EscrowStatus,
    /// Bump seed for the escrow PDA (cached for efficiency)
    pub bump: u8,
    /// Bump seed proving the vault authority derivation
    pub vault_authority_bump: u8,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug, InitSpace)]
pub enum EscrowStatus {
    Active,
    Cancelled,
    Exchanged,
}

impl Escrow {
    pub const ESCROW_SEED: &'static [u8] = b"escrow";
    pub const VAULT_SEED: &'static [u8] = b"token_vault";
    pub const VAULT_AUTHORITY_SEED: &'static [u8] = b"vault_owner";

    pub const MAX_FEE_BASIS: u8 = 100;

    /// Management's cut of the payment, truncating toward zero.
    /// Widened to u128 so the intermediate product cannot overflow.
    pub fn fee(&self) -> u64 {
        ((self.payment_amount as u128) * (self.fee_basis as u128) / 100) as u64
    }

    /// Flat authorization: seller, canceller and management may each
    /// unilaterally cancel an active escrow
    pub fn may_cancel(&self, caller: &Pubkey) -> bool {
        *caller == self.seller || *caller == self.canceller || *caller == self.management
    }

    /// Re-derive the vault authority address from the stored bump
    pub fn vault_authority_address(&self) -> Result<Pubkey> {
        Pubkey::create_program_address(
            &[Self::VAULT_AUTHORITY_SEED, &[self.vault_authority_bump]],
            &crate::ID,
        )
        .map_err(|_| error!(EscrowError::AuthorityMismatch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escrow(payment_amount: u64, fee_basis: u8) -> Escrow {
        Escrow {
            seller: Pubkey::new_unique(),
            management: Pubkey::new_unique(),
            canceller: Pubkey::new_unique(),
            asset_mint: Pubkey::new_unique(),
            payment_mint: Pubkey::new_unique(),
            asset_amount: 1,
            payment_amount,
            fee_basis,
            status: EscrowStatus::Active,
            bump: 255,
            vault_authority_bump: 255,
        }
    }

    #[test]
    fn fee_truncates_toward_zero() {
        assert_eq!(escrow(1000, 10).fee(), 100);
        assert_eq!(escrow(999, 10).fee(), 99);
        assert_eq!(escrow(1, 10).fee(), 0);
    }

    #[test]
    fn fee_bounds() {
        assert_eq!(escrow(1000, 0).fee(), 0);
        assert_eq!(escrow(1000, 100).fee(), 1000);
        // intermediate product exceeds u64::MAX, quotient does not
        assert_eq!(escrow(u64::MAX, 100).fee(), u64::MAX);
    }

    #[test]
    fn cancellation_is_restricted_to_the_three_parties() {
        let e = escrow(1000, 10);
        assert!(e.may_cancel(&e.seller));
        assert!(e.may_cancel(&e.canceller));
        assert!(e.may_cancel(&e.management));
        assert!(!e.may_cancel(&Pubkey::new_unique()));
    }

    #[test]
    fn vault_authority_derivation_is_deterministic() {
        let (addr, bump) =
            Pubkey::find_program_address(&[Escrow::VAULT_AUTHORITY_SEED], &crate::ID);
        let (again, bump_again) =
            Pubkey::find_program_address(&[Escrow::VAULT_AUTHORITY_SEED], &crate::ID);
        assert_eq!(addr, again);
        assert_eq!(bump, bump_again);
        // the authority is keyless: it must not lie on the ed25519 curve
        assert!(!addr.is_on_curve());

        let mut e = escrow(1000, 10);
        e.vault_authority_bump = bump;
        assert_eq!(e.vault_authority_address().unwrap(), addr);
    }

    #[test]
    fn wrong_bump_never_reproduces_the_authority() {
        let (addr, bump) =
            Pubkey::find_program_address(&[Escrow::VAULT_AUTHORITY_SEED], &crate::ID);
        let mut e = escrow(1000, 10);
        e.vault_authority_bump = bump.wrapping_sub(1);
        // a non-canonical bump either fails derivation or yields another address
        if let Ok(derived) = e.vault_authority_address() {
            assert_ne!(derived, addr);
        }
    }
}
