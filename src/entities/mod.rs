pub mod prelude;

pub mod accounts;
pub mod credit_transactions;
pub mod payment_requests;
pub mod session;
