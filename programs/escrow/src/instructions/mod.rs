pub mod cancel;
pub mod exchange;
pub mod initiate;

pub use cancel::*;
pub use exchange::*;
pub use initiate::*;
