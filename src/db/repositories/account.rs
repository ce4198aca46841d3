use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionTrait,
};
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::now_timestamp;
use crate::db::repositories::ledger::append_journal;
use crate::entities::{accounts, prelude::*};
use crate::models::{Account, TransactionKind, normalize_email};

/// Fields for a new account. The password is hashed by the repository.
pub struct NewAccount<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub credits: i64,
    pub is_admin: bool,
}

/// Result of a profile update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileUpdate {
    Applied,
    NotFound,
    EmailTaken,
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Creates an account. Returns `None` when the email is already taken.
    ///
    /// The starting balance and its journal entry are written in the same
    /// transaction as the account row. Email uniqueness is left to the
    /// unique index, so concurrent signups for one address resolve to a
    /// single winner.
    pub async fn create(
        &self,
        new: NewAccount<'_>,
        security: &SecurityConfig,
    ) -> Result<Option<Account>> {
        let email = normalize_email(new.email);

        let password = new.password.to_string();
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

        let txn = self.conn.begin().await?;

        let now = now_timestamp();
        let inserted = accounts::ActiveModel {
            name: Set(new.name.trim().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            credits: Set(new.credits),
            is_admin: Set(new.is_admin),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await;

        let model = match inserted {
            Ok(model) => model,
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await?;
                return Ok(None);
            }
            Err(err) => return Err(anyhow::Error::new(err).context("Failed to insert account")),
        };

        if new.credits > 0 {
            append_journal(
                &txn,
                model.id,
                TransactionKind::SignupBonus,
                new.credits,
                new.credits,
                Some("Welcome bonus".to_string()),
            )
            .await?;
        }

        txn.commit().await?;

        info!("Created account {} ({})", model.id, model.email);
        Ok(Some(Account::from(model)))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<Account>> {
        let account = Accounts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(account.map(Account::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = Accounts::find()
            .filter(accounts::Column::Email.eq(normalize_email(email)))
            .one(&self.conn)
            .await
            .context("Failed to query account by email")?;

        Ok(account.map(Account::from))
    }

    /// All accounts in insertion order.
    pub async fn list_all(&self) -> Result<Vec<Account>> {
        let rows = Accounts::find()
            .order_by_asc(accounts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list accounts")?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    /// Verifies credentials and returns the matching account.
    ///
    /// Argon2 verification runs in `spawn_blocking` to keep it off the async
    /// worker threads.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<Account>> {
        let account = Accounts::find()
            .filter(accounts::Column::Email.eq(normalize_email(email)))
            .one(&self.conn)
            .await
            .context("Failed to query account for password verification")?;

        let Some(account) = account else {
            return Ok(None);
        };

        let password_hash = account.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| Account::from(account)))
    }

    /// Replaces the profile fields (name, email) of an existing account.
    ///
    /// Balance is not touched here; it only changes through the ledger.
    pub async fn update(&self, account: &Account) -> Result<ProfileUpdate> {
        let result = Accounts::update_many()
            .col_expr(
                accounts::Column::Name,
                Expr::value(account.name.trim().to_string()),
            )
            .col_expr(
                accounts::Column::Email,
                Expr::value(normalize_email(&account.email)),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now_timestamp()))
            .filter(accounts::Column::Id.eq(account.id.value()))
            .exec(&self.conn)
            .await;

        match result {
            Ok(r) if r.rows_affected == 0 => Ok(ProfileUpdate::NotFound),
            Ok(_) => Ok(ProfileUpdate::Applied),
            Err(err) if is_unique_violation(&err) => Ok(ProfileUpdate::EmailTaken),
            Err(err) => Err(anyhow::Error::new(err).context("Failed to update account")),
        }
    }

    /// Makes sure an administrator account exists for `email`.
    ///
    /// An existing account with that email is promoted. Otherwise a new
    /// administrator is created with `password`. Returns true if a new row
    /// was inserted.
    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<bool> {
        let email = normalize_email(email);

        if let Some(existing) = Accounts::find()
            .filter(accounts::Column::Email.eq(&email))
            .one(&self.conn)
            .await?
        {
            if !existing.is_admin {
                let mut active: accounts::ActiveModel = existing.into();
                active.is_admin = Set(true);
                active.updated_at = Set(now_timestamp());
                active.update(&self.conn).await?;
                info!("Promoted {} to administrator", email);
            }
            return Ok(false);
        }

        let created = self
            .create(
                NewAccount {
                    name,
                    email: &email,
                    password,
                    credits: 0,
                    is_admin: true,
                },
                security,
            )
            .await?;

        Ok(created.is_some())
    }

    pub async fn has_admin(&self) -> Result<bool> {
        let admin = Accounts::find()
            .filter(accounts::Column::IsAdmin.eq(true))
            .one(&self.conn)
            .await?;
        Ok(admin.is_some())
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the argon2 crate defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random password (24 alphanumeric characters)
#[must_use]
pub fn generate_password() -> String {
    use rand::Rng;
    use rand::distr::Alphanumeric;

    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifiable() {
        let a = hash_password("correct horse", None).unwrap();
        let b = hash_password("correct horse", None).unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));

        let parsed = PasswordHash::new(&a).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
    }

    #[test]
    fn configured_params_are_encoded_in_hash() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            ..SecurityConfig::default()
        };
        let hash = hash_password("secret-password", Some(&config)).unwrap();
        assert!(hash.contains("m=1024,t=1,p=1"));
    }

    #[test]
    fn generated_passwords_differ() {
        let a = generate_password();
        assert_eq!(a.len(), 24);
        assert_ne!(a, generate_password());
    }
}
