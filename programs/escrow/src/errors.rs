use anchor_lang::prelude::*;

#[error_code]
pub enum EscrowError {
    #[msg("Invalid amount: amount must be greater than zero")]
    InvalidAmount,
    #[msg("Invalid fee rate: fee basis must not exceed 100 percent")]
    InvalidFeeRate,
    #[msg("Insufficient funds for the required transfer")]
    InsufficientFunds,
    #[msg("Signer is not one of the permitted parties")]
    Unauthorized,
    #[msg("Escrow is not active")]
    NotActive,
    #[msg("Re-derived vault authority does not match the vault owner")]
    AuthorityMismatch,
}
