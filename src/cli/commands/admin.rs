//! Administrator command handlers

use super::print_request;
use crate::domain::{AccountId, RequestId};
use crate::models::TransactionKind;
use crate::state::SharedState;

pub async fn cmd_admin_requests(state: &SharedState, pending_only: bool) -> anyhow::Result<()> {
    state.sessions.require_admin().await?;

    let requests = if pending_only {
        state.payments.list_pending().await?
    } else {
        state.payments.list_all().await?
    };

    if requests.is_empty() {
        if pending_only {
            println!("No pending payment requests.");
        } else {
            println!("No payment requests.");
        }
        return Ok(());
    }

    println!("Payment Requests ({} total)", requests.len());
    println!("{:-<70}", "");
    for request in &requests {
        print_request(request);
    }
    Ok(())
}

pub async fn cmd_admin_approve(state: &SharedState, id: RequestId) -> anyhow::Result<()> {
    state.sessions.require_admin().await?;
    let request = state.payments.approve(id).await?;

    println!(
        "✓ Approved #{}: {} credits added to {}",
        request.id, request.credits, request.user_email
    );
    Ok(())
}

pub async fn cmd_admin_reject(state: &SharedState, id: RequestId) -> anyhow::Result<()> {
    state.sessions.require_admin().await?;
    let request = state.payments.reject(id).await?;

    println!("✓ Rejected #{} from {}", request.id, request.user_email);
    Ok(())
}

pub async fn cmd_admin_users(state: &SharedState) -> anyhow::Result<()> {
    state.sessions.require_admin().await?;
    let accounts = state.accounts.list_all().await?;

    println!("Accounts ({} total)", accounts.len());
    println!("{:-<70}", "");
    for account in accounts {
        let role = if account.is_admin { " [ADMIN]" } else { "" };
        println!("{:>4}  {} <{}>{}", account.id.value(), account.name, account.email, role);
        println!("      Credits: {} | Joined: {}", account.credits, account.created_at);
    }
    Ok(())
}

pub async fn cmd_admin_set_credits(
    state: &SharedState,
    id: AccountId,
    credits: i64,
) -> anyhow::Result<()> {
    state.sessions.require_admin().await?;
    state.ledger.set_balance(id, credits).await?;

    println!("✓ Balance of account {id} set to {credits}");
    Ok(())
}

pub async fn cmd_admin_grant(
    state: &SharedState,
    id: AccountId,
    credits: i64,
) -> anyhow::Result<()> {
    let admin = state.sessions.require_admin().await?;
    let balance = state
        .ledger
        .credit(
            id,
            credits,
            TransactionKind::AdminGrant,
            Some(format!("Granted by {}", admin.email)),
        )
        .await?;

    println!("✓ Granted {credits} credits to account {id} (balance {balance})");
    Ok(())
}
