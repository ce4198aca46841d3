//! Session command handlers

use crate::domain::Navigation;
use crate::state::SharedState;

fn print_destination(navigation: Navigation) {
    match navigation {
        Navigation::Admin => println!("Use 'division admin pending' to review payments."),
        Navigation::Generator => println!("Use 'division generate \"prompt\"' to create images."),
        Navigation::Landing => {}
    }
}

pub async fn cmd_signup(
    state: &SharedState,
    name: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> anyhow::Result<()> {
    let outcome = state
        .sessions
        .signup(name, email, password, confirm)
        .await?;

    println!(
        "✓ Welcome, {}! {} credits have been added to your account.",
        outcome.account.name, outcome.account.credits
    );
    print_destination(outcome.navigation);
    Ok(())
}

pub async fn cmd_login(state: &SharedState, email: &str, password: &str) -> anyhow::Result<()> {
    let outcome = state.sessions.login(email, password).await?;

    println!("✓ Logged in as {}", outcome.account.name);
    print_destination(outcome.navigation);
    Ok(())
}

pub async fn cmd_logout(state: &SharedState) -> anyhow::Result<()> {
    state.sessions.logout().await?;
    println!("✓ Logged out");
    Ok(())
}

pub async fn cmd_whoami(state: &SharedState) -> anyhow::Result<()> {
    let Some(account) = state.sessions.current().await? else {
        println!("Not logged in.");
        println!();
        println!("Log in with: division login <email> --password <password>");
        return Ok(());
    };

    println!("{} <{}>", account.name, account.email);
    if account.is_admin {
        println!("Role: administrator (unlimited credits)");
        return Ok(());
    }

    println!("Credits: {}", account.credits);
    if account.credits < state.config.credits.low_balance_threshold {
        println!();
        println!("Running low. See 'division plans' to buy more credits.");
    }
    Ok(())
}
