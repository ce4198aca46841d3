pub mod account;
pub mod ledger;
pub mod payment;
pub mod style;

pub use account::{Account, normalize_email};
pub use ledger::{CreditTransaction, TransactionKind};
pub use payment::{NewPaymentRequest, PaymentRequest, PaymentStatus};
pub use style::{STYLE_PRESETS, StylePreset};
