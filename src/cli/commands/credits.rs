use super::print_request;
use crate::state::SharedState;

pub fn cmd_plans(state: &SharedState) -> anyhow::Result<()> {
    println!("Credit Plans:");
    println!("{:-<70}", "");

    for plan in &state.config.plans {
        println!("• {} - {} credits for Rs. {}", plan.name, plan.credits, plan.price);
        if !plan.description.is_empty() {
            println!("  {}", plan.description);
        }
    }

    println!();
    println!("Pay by bank transfer, then run: division buy \"<plan>\" <UTR>");
    Ok(())
}

pub async fn cmd_buy(state: &SharedState, plan: &str, utr: &str) -> anyhow::Result<()> {
    let account = state.sessions.require_account().await?;
    let request = state.payments.submit(&account, plan, utr).await?;

    println!("✓ Payment request #{} submitted for verification.", request.id);
    println!(
        "  {} credits will be added once an administrator approves it.",
        request.credits
    );
    Ok(())
}

pub async fn cmd_my_requests(state: &SharedState) -> anyhow::Result<()> {
    let account = state.sessions.require_account().await?;
    let requests = state.payments.list_for_account(account.id).await?;

    if requests.is_empty() {
        println!("No payment requests.");
        return Ok(());
    }

    println!("Payment Requests ({} total)", requests.len());
    println!("{:-<70}", "");
    for request in &requests {
        print_request(request);
    }
    Ok(())
}

pub async fn cmd_history(state: &SharedState, limit: u64) -> anyhow::Result<()> {
    let account = state.sessions.require_account().await?;
    let entries = state.ledger.history(account.id, limit).await?;

    if entries.is_empty() {
        println!("No credit history.");
        return Ok(());
    }

    println!("Credit History (last {}):", entries.len());
    println!("{:-<70}", "");
    for entry in entries {
        println!(
            "{:>+6}  balance {:>5}  {:<12} {}",
            entry.amount,
            entry.balance_after,
            entry.kind,
            entry.description.as_deref().unwrap_or("")
        );
        println!("        {}", entry.created_at);
    }
    Ok(())
}
