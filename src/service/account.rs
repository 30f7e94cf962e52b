//! Account service
//!
//! Registration, login, the verification flow and the follow toggle.

use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use rand::Rng;
use rand::rngs::OsRng;

use crate::auth::{TokenPair, issue_token_pair};
use crate::config::{AuthConfig, VerificationConfig};
use crate::data::{
    CodeChannel, Database, EntityId, Follow, FollowWithUsers, User, VerificationCode,
};
use crate::dispatch::{CodeMessage, spawn_code_delivery};
use crate::error::AppError;
use crate::metrics::{TOGGLES_TOTAL, VERIFICATION_ATTEMPTS_TOTAL, VERIFICATION_CODES_ISSUED_TOTAL};

/// How a login/verification identifier should be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Email(String),
    Phone(String),
    Username(String),
}

impl Identifier {
    /// Classify a raw identifier string.
    ///
    /// Anything containing `@` is treated as an email, a `+` prefix
    /// followed by digits as a phone number, everything else as a
    /// username. Matches the channel selection of the verify endpoint.
    pub fn classify(raw: &str) -> Identifier {
        let value = raw.trim().to_lowercase();

        if value.contains('@') {
            Identifier::Email(value)
        } else if value.starts_with('+') && value[1..].chars().all(|c| c.is_ascii_digit()) {
            Identifier::Phone(value)
        } else {
            Identifier::Username(value)
        }
    }
}

/// New-registration input, already deserialized
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub confirm_password: String,
}

/// Partial profile update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_private: Option<bool>,
}

/// Outcome of a toggle operation
#[derive(Debug)]
pub enum FollowToggle {
    /// Edge created; carries the joined representation
    Added(FollowWithUsers),
    /// Edge removed
    Removed,
}

fn valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn valid_phone(phone: &str) -> bool {
    let Some(digits) = phone.strip_prefix('+') else {
        return false;
    };
    (7..=14).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::PasswordHash;

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn random_code(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    auth: AuthConfig,
    verification: VerificationConfig,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>, auth: AuthConfig, verification: VerificationConfig) -> Self {
        Self {
            db,
            auth,
            verification,
        }
    }

    // =========================================================================
    // Registration & login
    // =========================================================================

    /// Register a new, inactive account.
    ///
    /// Validation is an ordered sequence; only the first failing check
    /// is reported. On success a verification code pair is issued and
    /// dispatched in the background.
    pub async fn register(&self, input: RegisterInput) -> Result<User, AppError> {
        let username = input.username.trim().to_lowercase();
        let email = input.email.trim().to_lowercase();
        let phone_number = input.phone_number.trim().to_lowercase();
        let password = input.password.trim();
        let confirm_password = input.confirm_password.trim();

        if username.is_empty() {
            return Err(AppError::Validation("Username is required".to_string()));
        }
        if !valid_email(&email) {
            return Err(AppError::Validation("Invalid email address".to_string()));
        }
        if !valid_phone(&phone_number) {
            return Err(AppError::Validation(
                "Phone number must start with + and contain only digits".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }
        if password != confirm_password {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }
        if self.db.username_exists(&username).await? {
            return Err(AppError::Validation("Username already exists".to_string()));
        }
        if self.db.email_exists(&email).await? {
            return Err(AppError::Validation("Email already exists".to_string()));
        }
        if self.db.phone_exists(&phone_number).await? {
            return Err(AppError::Validation(
                "Phone number already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: EntityId::new().0,
            username,
            email,
            phone_number,
            password_hash: hash_password(password)?,
            first_name: None,
            last_name: None,
            is_active: false,
            is_private: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_user(&user).await?;
        self.issue_codes(&user).await?;

        tracing::info!(username = %user.username, "Account registered, awaiting verification");

        Ok(user)
    }

    /// Authenticate by username, email or phone number.
    ///
    /// Each identifier kind reports one generic message so credential
    /// probing cannot distinguish "unknown user" from "wrong password".
    pub async fn login(&self, identifier: &str, password: &str) -> Result<(User, TokenPair), AppError> {
        let (user, message) = match Identifier::classify(identifier) {
            Identifier::Email(email) => (
                self.db.get_user_by_email(&email).await?,
                "Email or Password invalid!",
            ),
            Identifier::Phone(phone) => (
                self.db.get_user_by_phone(&phone).await?,
                "Phone number or Password invalid!",
            ),
            Identifier::Username(username) => (
                self.db.get_user_by_username(&username).await?,
                "Username or Password invalid!",
            ),
        };

        let user = user.ok_or_else(|| AppError::Validation(message.to_string()))?;

        if !verify_password(password, &user.password_hash) {
            return Err(AppError::Validation(message.to_string()));
        }
        if !user.is_active {
            return Err(AppError::Validation("User is not active".to_string()));
        }

        let pair = self.issue_tokens(&user)?;
        Ok((user, pair))
    }

    /// Issue a fresh access/refresh pair for an already-resolved user.
    pub fn issue_tokens(&self, user: &User) -> Result<TokenPair, AppError> {
        issue_token_pair(
            user,
            &self.auth.token_secret,
            self.auth.access_token_ttl,
            self.auth.refresh_token_ttl,
        )
    }

    /// Exchange a refresh token for a new pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(User, TokenPair), AppError> {
        use crate::auth::{TokenKind, verify_token};

        let claims = verify_token(refresh_token, &self.auth.token_secret)?;
        if claims.kind != TokenKind::Refresh {
            return Err(AppError::Unauthorized);
        }

        let user = self
            .db
            .get_user(&claims.user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if !user.is_active {
            return Err(AppError::Unauthorized);
        }

        let pair = self.issue_tokens(&user)?;
        Ok((user, pair))
    }

    // =========================================================================
    // Verification flow
    // =========================================================================

    /// Issue a verification code pair for a user.
    ///
    /// Any prior pair is replaced (delete-then-create), so exactly one
    /// active pair exists per account. Delivery is dispatched on a
    /// detached task per channel.
    pub async fn issue_codes(&self, user: &User) -> Result<(), AppError> {
        let code_email = random_code(self.verification.code_length);
        let code_sms = random_code(self.verification.code_length);

        let code = VerificationCode {
            id: EntityId::new().0,
            user_id: user.id.clone(),
            code_email: code_email.clone(),
            code_sms: code_sms.clone(),
            created_at: Utc::now(),
        };
        self.db.replace_verification_code(&code).await?;
        VERIFICATION_CODES_ISSUED_TOTAL.inc();

        spawn_code_delivery(CodeMessage {
            channel: CodeChannel::Email,
            recipient: user.email.clone(),
            code: code_email,
            ttl_seconds: self.verification.email_code_ttl,
        });
        spawn_code_delivery(CodeMessage {
            channel: CodeChannel::Sms,
            recipient: user.phone_number.clone(),
            code: code_sms,
            ttl_seconds: self.verification.sms_code_ttl,
        });

        Ok(())
    }

    /// Reissue codes for a still-inactive account.
    pub async fn resend_codes(&self, identifier: &str) -> Result<User, AppError> {
        let user = match Identifier::classify(identifier) {
            Identifier::Email(email) => self.db.get_user_by_email(&email).await?,
            Identifier::Phone(phone) => self.db.get_user_by_phone(&phone).await?,
            Identifier::Username(_) => None,
        };

        let user = user
            .ok_or_else(|| AppError::Validation("Email/Phone number is not valid!".to_string()))?;

        if user.is_active {
            return Err(AppError::Validation("User is already active!".to_string()));
        }

        self.issue_codes(&user).await?;
        Ok(user)
    }

    /// Consume a verification code and activate the account.
    ///
    /// The identifier selects the channel; the code is checked against
    /// that channel's stored value and its expiry window. The row is
    /// deleted only on a successful match (single-use).
    pub async fn verify(&self, identifier: &str, code: &str) -> Result<(User, TokenPair), AppError> {
        let (user, channel) = match Identifier::classify(identifier) {
            Identifier::Email(email) => {
                (self.db.get_user_by_email(&email).await?, CodeChannel::Email)
            }
            Identifier::Phone(phone) => {
                (self.db.get_user_by_phone(&phone).await?, CodeChannel::Sms)
            }
            Identifier::Username(_) => {
                return Err(AppError::Validation(
                    "Identifier must be an email or phone number".to_string(),
                ));
            }
        };

        let fail = |outcome: &str, message: &str| {
            VERIFICATION_ATTEMPTS_TOTAL.with_label_values(&[outcome]).inc();
            AppError::Validation(message.to_string())
        };

        let user = match user {
            Some(user) => user,
            None => return Err(fail("unknown_user", "Invalid confirmation code")),
        };

        let stored = match self.db.get_verification_code(&user.id).await? {
            Some(stored) => stored,
            None => return Err(fail("no_code", "Invalid confirmation code")),
        };

        let (expected, ttl) = match channel {
            CodeChannel::Email => (&stored.code_email, self.verification.email_code_ttl),
            CodeChannel::Sms => (&stored.code_sms, self.verification.sms_code_ttl),
        };

        if expected != code {
            return Err(fail("mismatch", "Invalid confirmation code"));
        }

        if stored.created_at + Duration::seconds(ttl) < Utc::now() {
            return Err(fail(
                "expired",
                "Confirmation code has expired\nPlease resend your confirmation code",
            ));
        }

        // Single-use: consume the pair and activate.
        self.db.delete_verification_code(&stored.id).await?;
        self.db.activate_user(&user.id).await?;
        VERIFICATION_ATTEMPTS_TOTAL.with_label_values(&["success"]).inc();

        let user = self
            .db
            .get_user(&user.id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        let pair = self.issue_tokens(&user)?;

        tracing::info!(username = %user.username, channel = channel.as_str(), "Account verified");

        Ok((user, pair))
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Update profile fields; only the owner may edit their profile.
    ///
    /// Absent fields are left untouched (PATCH semantics; PUT sends the
    /// full set). Changed identifiers are re-validated and re-checked
    /// for uniqueness against all rows, soft-deleted included.
    pub async fn update_profile(
        &self,
        actor: &User,
        target_id: &str,
        update: ProfileUpdate,
    ) -> Result<User, AppError> {
        let target = self
            .db
            .get_user(target_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if target.id != actor.id {
            return Err(AppError::Forbidden(
                "You can't edit someone else's profile".to_string(),
            ));
        }

        let username = update.username.map(|u| u.trim().to_lowercase());
        let email = update.email.map(|e| e.trim().to_lowercase());
        let phone_number = update.phone_number.map(|p| p.trim().to_lowercase());

        if let Some(username) = &username {
            if username.is_empty() {
                return Err(AppError::Validation("Username is required".to_string()));
            }
            if *username != target.username && self.db.username_exists(username).await? {
                return Err(AppError::Validation("Username already exists".to_string()));
            }
        }
        if let Some(email) = &email {
            if !valid_email(email) {
                return Err(AppError::Validation("Invalid email address".to_string()));
            }
            if *email != target.email && self.db.email_exists(email).await? {
                return Err(AppError::Validation("Email already exists".to_string()));
            }
        }
        if let Some(phone_number) = &phone_number {
            if !valid_phone(phone_number) {
                return Err(AppError::Validation(
                    "Phone number must start with + and contain only digits".to_string(),
                ));
            }
            if *phone_number != target.phone_number && self.db.phone_exists(phone_number).await? {
                return Err(AppError::Validation(
                    "Phone number already exists".to_string(),
                ));
            }
        }

        let updated = self
            .db
            .update_user_profile(
                &target.id,
                username.as_deref(),
                email.as_deref(),
                phone_number.as_deref(),
                update.first_name.as_deref(),
                update.last_name.as_deref(),
                update.is_private,
                Utc::now(),
            )
            .await?;
        if !updated {
            return Err(AppError::not_found("User"));
        }

        self.db
            .get_user(&target.id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Soft-delete the account; only the owner may do this.
    pub async fn delete_profile(&self, actor: &User, target_id: &str) -> Result<(), AppError> {
        let target = self
            .db
            .get_user(target_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if target.id != actor.id {
            return Err(AppError::Forbidden(
                "You can't delete someone else's profile".to_string(),
            ));
        }

        if !self.db.soft_delete_user(&target.id).await? {
            return Err(AppError::not_found("User"));
        }

        tracing::info!(username = %target.username, "Account soft-deleted");
        Ok(())
    }

    // =========================================================================
    // Follow toggle
    // =========================================================================

    /// Toggle the follow edge from `actor` towards `target_user_id`.
    ///
    /// Self-follow is rejected before the relation lookup. A missing or
    /// soft-deleted target is a not-found condition.
    pub async fn toggle_follow(
        &self,
        actor: &User,
        target_user_id: &str,
    ) -> Result<FollowToggle, AppError> {
        let target = self
            .db
            .get_user(target_user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if target.id == actor.id {
            return Err(AppError::Forbidden("You can't follow yourself".to_string()));
        }

        if let Some(existing) = self.db.get_follow(&actor.id, &target.id).await? {
            self.db.delete_follow(&existing.id).await?;
            TOGGLES_TOTAL.with_label_values(&["follow", "removed"]).inc();
            return Ok(FollowToggle::Removed);
        }

        let follow = Follow {
            id: EntityId::new().0,
            follower_id: actor.id.clone(),
            followed_id: target.id.clone(),
            created_at: Utc::now(),
        };
        self.db.insert_follow(&follow).await?;
        TOGGLES_TOTAL.with_label_values(&["follow", "added"]).inc();

        let joined = self
            .db
            .get_follow_with_users(&follow.id)
            .await?
            .ok_or_else(|| AppError::not_found("Follow"))?;

        Ok(FollowToggle::Added(joined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_email() {
        assert_eq!(
            Identifier::classify("Alice@Example.com "),
            Identifier::Email("alice@example.com".to_string())
        );
    }

    #[test]
    fn classify_phone() {
        assert_eq!(
            Identifier::classify("+998901234567"),
            Identifier::Phone("+998901234567".to_string())
        );
    }

    #[test]
    fn classify_username_fallback() {
        // A plus followed by non-digits is not a phone number.
        assert_eq!(
            Identifier::classify("+nope"),
            Identifier::Username("+nope".to_string())
        );
        assert_eq!(
            Identifier::classify("alice"),
            Identifier::Username("alice".to_string())
        );
    }

    #[test]
    fn email_validation() {
        assert!(valid_email("alice@example.com"));
        assert!(!valid_email("alice"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email("alice@com"));
        assert!(!valid_email("alice@.com"));
    }

    #[test]
    fn phone_validation() {
        assert!(valid_phone("+998901234567"));
        assert!(!valid_phone("998901234567"));
        assert!(!valid_phone("+99x901234567"));
        assert!(!valid_phone("+12"));
    }

    #[test]
    fn random_code_shape() {
        let code = random_code(4);
        assert_eq!(code.len(), 4);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("hunter2!").unwrap();
        assert!(verify_password("hunter2!", &hash));
        assert!(!verify_password("hunter3!", &hash));
        assert!(!verify_password("hunter2!", "not-a-phc-hash"));
    }
}
