//! Authentication service - registration, login and token rotation.
//!
//! Access tokens are HS256 JWTs; refresh tokens are opaque random strings
//! stored one row per account and tied to the `jti` of the access token
//! they were issued with.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{JwtSettings, REFRESH_TOKEN_BYTES, ROLE_CUSTOMER, TOKEN_TYPE_BEARER};
use crate::domain::{AccountResponse, LoginResponse, Password, Role, TokenPair};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::repositories::entities::{account, account_token};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    /// Token id; the stored refresh token is bound to it
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn role(&self) -> Role {
        Role::from(self.role.as_str())
    }
}

/// Authentication service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a customer account
    async fn register(
        &self,
        user_name: String,
        email: String,
        password: String,
    ) -> AppResult<AccountResponse>;

    /// Check credentials and issue a token pair
    async fn login(&self, email: String, password: String) -> AppResult<LoginResponse>;

    /// Swap an (expired) access token plus its refresh token for a new pair
    async fn regenerate_tokens(
        &self,
        access_token: String,
        refresh_token: String,
    ) -> AppResult<TokenPair>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;

    async fn get_account(&self, id: Uuid) -> AppResult<AccountResponse>;
}

/// Concrete implementation of AuthService. Opens a fresh Unit of Work per
/// call.
pub struct Authenticator {
    db: DatabaseConnection,
    jwt: JwtSettings,
}

impl Authenticator {
    pub fn new(db: DatabaseConnection, jwt: JwtSettings) -> Self {
        Self { db, jwt }
    }

    fn uow(&self) -> UnitOfWork {
        UnitOfWork::new(self.db.clone())
    }

    fn sign(&self, account: &account::Model) -> AppResult<(String, String)> {
        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();
        let claims = Claims {
            sub: account.id,
            email: account.email.clone(),
            role: account.role.clone(),
            jti: jti.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.jwt.access_token_minutes)).timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt.secret_bytes()),
        )?;
        Ok((token, jti))
    }

    fn decode(&self, token: &str, validate_exp: bool) -> AppResult<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = validate_exp;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt.secret_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }

    fn token_pair(&self, access_token: String, refresh_token: String) -> TokenPair {
        TokenPair {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.jwt.access_token_minutes * 60,
        }
    }

    /// Sign a pair and build the refresh token row that goes with it.
    fn issue(&self, account: &account::Model) -> AppResult<(TokenPair, account_token::Model)> {
        let (access_token, jti) = self.sign(account)?;
        let now = Utc::now();
        let row = account_token::Model {
            id: Uuid::new_v4(),
            account_id: account.id,
            jwt_id: jti,
            refresh_token: new_refresh_token(),
            expires_at: now + Duration::days(self.jwt.refresh_token_days),
            created_at: now,
        };
        Ok((self.token_pair(access_token, row.refresh_token.clone()), row))
    }

    async fn active_account(uow: &UnitOfWork, id: Uuid) -> AppResult<Option<account::Model>> {
        Ok(uow
            .accounts()
            .get_by_id(id, &[])
            .await?
            .filter(|account| !account.is_deleted))
    }
}

fn new_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register(
        &self,
        user_name: String,
        email: String,
        password: String,
    ) -> AppResult<AccountResponse> {
        let uow = self.uow();
        let email = email.trim().to_string();

        // Soft-deleted accounts still own their email
        let taken = uow
            .accounts()
            .find_single(Some(Condition::all().add(account::Column::Email.eq(email.as_str()))), &[])
            .await?;
        if taken.is_some() {
            return Err(AppError::conflict("Account"));
        }

        let password_hash = Password::new(&password)?.into_string();
        let now = Utc::now();
        let account = uow
            .accounts()
            .add(account::Model {
                id: Uuid::new_v4(),
                email,
                user_name: user_name.trim().to_string(),
                password_hash,
                role: ROLE_CUSTOMER.to_string(),
                wallet_balance: 0,
                is_deleted: false,
                created_at: now,
                updated_at: now,
            })
            .await;
        // Lost a race against a registration of the same email
        uow.save_changes().await.map_err(|e| {
            if e.is_unique_violation() {
                AppError::conflict("Account")
            } else {
                e
            }
        })?;

        tracing::info!(account_id = %account.id, "Account registered");
        Ok(AccountResponse::from(account))
    }

    async fn login(&self, email: String, password: String) -> AppResult<LoginResponse> {
        let uow = self.uow();
        let account = uow
            .accounts()
            .find_single(
                Some(
                    Condition::all()
                        .add(account::Column::Email.eq(email.trim()))
                        .add(account::Column::IsDeleted.eq(false)),
                ),
                &[],
            )
            .await?;

        // Verify against a dummy hash when the email is unknown so both
        // paths cost the same.
        let stored = account
            .as_ref()
            .map(|a| Password::from_hash(a.password_hash.as_str()))
            .unwrap_or_else(Password::unknown_account);
        let password_valid = stored.verify(&password);

        let account = match account {
            Some(account) if password_valid => account,
            _ => return Err(AppError::InvalidCredentials),
        };

        // One row per account: a second login overwrites the first one's
        // refresh token, even when both commit at the same time.
        let (tokens, row) = self.issue(&account)?;
        uow.account_tokens()
            .add_or_update(
                row,
                OnConflict::column(account_token::Column::AccountId)
                    .update_columns([
                        account_token::Column::JwtId,
                        account_token::Column::RefreshToken,
                        account_token::Column::ExpiresAt,
                        account_token::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .await;
        uow.save_changes().await?;

        tracing::info!(account_id = %account.id, "Account logged in");
        Ok(LoginResponse {
            account_id: account.id,
            email: account.email,
            role: Role::from(account.role.as_str()),
            tokens,
        })
    }

    async fn regenerate_tokens(
        &self,
        access_token: String,
        refresh_token: String,
    ) -> AppResult<TokenPair> {
        let claims = self
            .decode(&access_token, false)
            .map_err(|_| AppError::Unauthorized)?;

        let uow = self.uow();
        let stored = uow
            .account_tokens()
            .find_single(
                Some(
                    Condition::all()
                        .add(account_token::Column::AccountId.eq(claims.sub))
                        .add(account_token::Column::RefreshToken.eq(refresh_token.as_str())),
                ),
                &[],
            )
            .await?
            .ok_or(AppError::Unauthorized)?;

        if stored.jwt_id != claims.jti {
            tracing::warn!(account_id = %claims.sub, "Refresh token does not match access token");
            return Err(AppError::Unauthorized);
        }
        if stored.expires_at <= Utc::now() {
            return Err(AppError::Unauthorized);
        }

        let account = Self::active_account(&uow, claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)?;

        // Rotate only if the row still holds the token just checked, so a
        // refresh token is spent at most once.
        let (tokens, row) = self.issue(&account)?;
        uow.account_tokens()
            .stage_guarded_update(
                account_token::Entity::update_many()
                    .col_expr(account_token::Column::JwtId, Expr::value(row.jwt_id))
                    .col_expr(account_token::Column::RefreshToken, Expr::value(row.refresh_token))
                    .col_expr(account_token::Column::ExpiresAt, Expr::value(row.expires_at))
                    .col_expr(account_token::Column::CreatedAt, Expr::value(row.created_at))
                    .filter(account_token::Column::Id.eq(stored.id))
                    .filter(account_token::Column::RefreshToken.eq(refresh_token.as_str()))
                    .filter(account_token::Column::JwtId.eq(claims.jti.as_str())),
            )
            .await;
        uow.save_changes().await.map_err(|e| {
            if e.is_stale_write() {
                tracing::warn!(account_id = %claims.sub, "Refresh token already spent");
                AppError::Unauthorized
            } else {
                e
            }
        })?;
        Ok(tokens)
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        self.decode(token, true)
    }

    async fn get_account(&self, id: Uuid) -> AppResult<AccountResponse> {
        let uow = self.uow();
        Self::active_account(&uow, id)
            .await?
            .map(AccountResponse::from)
            .ok_or_not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> Authenticator {
        let db = sea_orm::DatabaseConnection::Disconnected;
        Authenticator::new(db, JwtSettings::new("unit-test-secret-unit-test-secret", 30, 7))
    }

    fn account() -> account::Model {
        let now = Utc::now();
        account::Model {
            id: Uuid::new_v4(),
            email: "abc@gmail.com".to_string(),
            user_name: "abc".to_string(),
            password_hash: String::new(),
            role: "staff".to_string(),
            wallet_balance: 0,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn signed_token_verifies() {
        let auth = authenticator();
        let account = account();
        let (token, jti) = auth.sign(&account).unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.jti, jti);
        assert_eq!(claims.role(), Role::Staff);
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn expired_token_only_decodes_without_exp_check() {
        let auth = Authenticator::new(
            sea_orm::DatabaseConnection::Disconnected,
            JwtSettings::new("unit-test-secret-unit-test-secret", -5, 7),
        );
        let (token, _) = auth.sign(&account()).unwrap();

        assert!(auth.verify_token(&token).is_err());
        assert!(auth.decode(&token, false).is_ok());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = Authenticator::new(
            sea_orm::DatabaseConnection::Disconnected,
            JwtSettings::new("another-secret-another-secret-xx", 30, 7),
        );
        let (token, _) = other.sign(&account()).unwrap();
        assert!(authenticator().verify_token(&token).is_err());
    }

    #[test]
    fn issued_row_matches_the_pair() {
        let auth = authenticator();
        let account = account();
        let (pair, row) = auth.issue(&account).unwrap();

        assert_eq!(row.account_id, account.id);
        assert_eq!(row.refresh_token, pair.refresh_token);
        assert_eq!(auth.verify_token(&pair.access_token).unwrap().jti, row.jwt_id);
        assert_eq!((row.expires_at - row.created_at).num_days(), 7);
    }

    #[test]
    fn refresh_tokens_are_random_hex() {
        let first = new_refresh_token();
        assert_eq!(first.len(), REFRESH_TOKEN_BYTES * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, new_refresh_token());
    }
}
