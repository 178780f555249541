pub mod deposit;
pub mod init_vault;
pub mod toggle_lock;
pub mod withdraw;

pub use deposit::*;
pub use init_vault::*;
pub use toggle_lock::*;
pub use withdraw::*;
