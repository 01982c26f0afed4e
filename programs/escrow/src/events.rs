use anchor_lang::prelude::*;

#[event]
pub struct EscrowInitiated {
    pub escrow: Pubkey,
    pub seller: Pubkey,
    pub management: Pubkey,
    pub asset_mint: Pubkey,
    pub payment_mint: Pubkey,
    pub asset_amount: u64,
    pub payment_amount: u64,
    pub fee_basis: u8,
}

#[event]
pub struct EscrowCancelled {
    pub escrow: Pubkey,
    pub caller: Pubkey,
}

#[event]
pub struct EscrowExchanged {
    pub escrow: Pubkey,
    pub buyer: Pubkey,
    pub fee: u64,
}
