pub use super::accounts::Entity as Accounts;
pub use super::credit_transactions::Entity as CreditTransactions;
pub use super::payment_requests::Entity as PaymentRequests;
pub use super::session::Entity as Session;
