mod account;
mod admin;
mod credits;
mod generate;

pub use account::{cmd_login, cmd_logout, cmd_signup, cmd_whoami};
pub use admin::{
    cmd_admin_approve, cmd_admin_grant, cmd_admin_reject, cmd_admin_requests,
    cmd_admin_set_credits, cmd_admin_users,
};
pub use credits::{cmd_buy, cmd_history, cmd_my_requests, cmd_plans};
pub use generate::{cmd_edit, cmd_generate, cmd_styles};

use crate::models::PaymentRequest;

fn print_request(request: &PaymentRequest) {
    println!(
        "#{} [{}] {} - {} credits for Rs. {}",
        request.id, request.status, request.plan, request.credits, request.amount
    );
    println!(
        "  {} | UTR: {} | {}",
        request.user_email, request.transaction_ref, request.created_at
    );
}
