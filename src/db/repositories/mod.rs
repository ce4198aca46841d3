pub mod account;
pub mod ledger;
pub mod payment;
pub mod session;
