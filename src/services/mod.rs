pub mod account_service;
pub mod account_service_impl;
pub use account_service::{AccountError, AccountService};
pub use account_service_impl::SeaOrmAccountService;

pub mod ledger_service;
pub mod ledger_service_impl;
pub use ledger_service::{LedgerError, LedgerService};
pub use ledger_service_impl::SeaOrmLedgerService;

pub mod payment_service;
pub mod payment_service_impl;
pub use payment_service::{PaymentError, PaymentService};
pub use payment_service_impl::SeaOrmPaymentService;

pub mod session_service;
pub mod session_service_impl;
pub use session_service::{SessionError, SessionOutcome, SessionService};
pub use session_service_impl::SeaOrmSessionService;

pub mod generation_service;
pub mod generation_service_impl;
pub use generation_service::{
    EditOutcome, GenerationError, GenerationOutcome, GenerationService,
};
pub use generation_service_impl::DefaultGenerationService;
