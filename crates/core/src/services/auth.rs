//! Authentication service.
//!
//! Owns the whole token lifecycle: credential verification, mint and
//! persistence of access/refresh pairs, rotation, revocation, and bearer
//! verification against the ledger.
//!
//! Token-persistence policy: **one session per (principal, kind)**. Login
//! clears any previous ledger rows for the pair before inserting the new
//! ones, and refresh replaces the access row. A presented token that is
//! missing from the ledger is revoked, no matter how valid its signature.

use chrono::{Duration, Utc};
use cohort_common::{AppError, AppResult, AuthConfig, IdGenerator, SeedAdminConfig};
use cohort_db::entities::access_token::PrincipalKind;
use cohort_db::entities::{access_token, admin, member, refresh_token, user};
use cohort_db::repositories::{AdminRepository, MemberRepository, TokenRepository, UserRepository};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// Claims embedded in an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Principal id.
    pub sub: String,
    /// Principal namespace the token was minted in.
    pub kind: PrincipalKind,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// Claims embedded in a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Principal id.
    pub sub: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// A freshly issued token pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub principal_id: String,
}

/// Result of a refresh call.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// The access token to use from now on.
    pub access_token: String,
    /// False when the presented access token was still valid and no
    /// rotation happened.
    pub rotated: bool,
}

/// An authenticated principal, resolved by bearer verification.
#[derive(Debug, Clone)]
pub enum Principal {
    Admin(admin::Model),
    Member(member::Model),
    User(user::Model),
}

impl Principal {
    /// The principal's id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Admin(a) => &a.id,
            Self::Member(m) => &m.id,
            Self::User(u) => &u.id,
        }
    }

    /// The namespace this principal belongs to.
    #[must_use]
    pub const fn kind(&self) -> PrincipalKind {
        match self {
            Self::Admin(_) => PrincipalKind::Admin,
            Self::Member(_) => PrincipalKind::Member,
            Self::User(_) => PrincipalKind::User,
        }
    }
}

/// Which principal kinds a protected route accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScope {
    Admin,
    Member,
    User,
    /// Any of the three kinds; the token's own kind claim decides.
    Any,
}

impl AuthScope {
    /// Whether a token minted for `kind` satisfies this scope.
    #[must_use]
    pub fn allows(self, kind: PrincipalKind) -> bool {
        match self {
            Self::Admin => kind == PrincipalKind::Admin,
            Self::Member => kind == PrincipalKind::Member,
            Self::User => kind == PrincipalKind::User,
            Self::Any => true,
        }
    }
}

/// Service for authentication and token lifecycle management.
#[derive(Clone)]
pub struct AuthService {
    admin_repo: AdminRepository,
    member_repo: MemberRepository,
    user_repo: UserRepository,
    token_repo: TokenRepository,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    id_gen: IdGenerator,
}

impl AuthService {
    /// Create a new auth service.
    ///
    /// The signing secret comes in through `config`; it is never read from
    /// process-global state after this point.
    #[must_use]
    pub fn new(
        config: &AuthConfig,
        admin_repo: AdminRepository,
        member_repo: MemberRepository,
        user_repo: UserRepository,
        token_repo: TokenRepository,
    ) -> Self {
        Self {
            admin_repo,
            member_repo,
            user_repo,
            token_repo,
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_ttl: Duration::seconds(config.access_ttl_secs),
            refresh_ttl: Duration::seconds(config.refresh_ttl_secs),
            id_gen: IdGenerator::new(),
        }
    }

    // ==================== Login / Logout / Refresh ====================

    /// Authenticate by email and password within one principal namespace.
    ///
    /// Unknown email and wrong password are deliberately indistinguishable
    /// to the caller.
    pub async fn login(
        &self,
        kind: PrincipalKind,
        email: &str,
        password: &str,
    ) -> AppResult<TokenPair> {
        let Some((principal_id, password_hash)) = self.find_credentials(kind, email).await? else {
            return Err(AppError::InvalidCredentials);
        };

        if !super::password::verify_password(password, &password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        // Single-session policy: drop whatever was issued before.
        self.token_repo
            .clear_access_for_principal(&principal_id, kind)
            .await?;
        self.token_repo
            .clear_refresh_for_principal(&principal_id, kind)
            .await?;

        let access_token = self.persist_access(&principal_id, kind).await?;
        let refresh_token = self.persist_refresh(&principal_id, kind).await?;

        tracing::info!(principal_id = %principal_id, kind = %kind, "Login successful");

        Ok(TokenPair {
            access_token,
            refresh_token,
            principal_id,
        })
    }

    /// Delete the ledger rows for a token pair.
    ///
    /// Idempotent: rows that are already gone are not an error. The access
    /// token's signature is still checked (expiry is not, so a stale
    /// session can be logged out), and identifies the owning principal.
    pub async fn logout(
        &self,
        kind: PrincipalKind,
        access_token: &str,
        refresh_token: &str,
    ) -> AppResult<()> {
        let claims = self.decode_access_allow_expired(access_token)?;

        self.token_repo
            .delete_access(&claims.sub, kind, access_token)
            .await?;
        self.token_repo
            .delete_refresh(&claims.sub, kind, refresh_token)
            .await?;

        tracing::info!(principal_id = %claims.sub, kind = %kind, "Logged out");

        Ok(())
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// If the presented access token still verifies, nothing is rotated and
    /// it is handed back; this is an optimization, not a security boundary.
    /// Otherwise the refresh token must exist in the ledger for `kind`,
    /// carry a valid signature, and belong to the same principal the ledger
    /// row names.
    pub async fn refresh(
        &self,
        kind: PrincipalKind,
        current_access: &str,
        refresh_token: &str,
    ) -> AppResult<RefreshOutcome> {
        if self.decode_access(current_access).is_ok() {
            return Ok(RefreshOutcome {
                access_token: current_access.to_string(),
                rotated: false,
            });
        }

        let Some(row) = self.token_repo.find_live_refresh(refresh_token, kind).await? else {
            return Err(AppError::InvalidRefreshToken);
        };

        let claims = self.decode_refresh(refresh_token)?;

        if row.principal_id != claims.sub {
            return Err(AppError::TokenOwnershipMismatch);
        }

        // Replace rather than accumulate access rows.
        self.token_repo
            .clear_access_for_principal(&claims.sub, kind)
            .await?;
        let access_token = self.persist_access(&claims.sub, kind).await?;

        tracing::info!(principal_id = %claims.sub, kind = %kind, "Access token rotated");

        Ok(RefreshOutcome {
            access_token,
            rotated: true,
        })
    }

    // ==================== Bearer Verification ====================

    /// Resolve a presented access token to a live principal.
    ///
    /// Fails closed with [`AppError::Unauthorized`] on any of: bad
    /// signature, expiry, kind outside `scope`, missing ledger row, or a
    /// principal that no longer exists.
    pub async fn verify_bearer(&self, scope: AuthScope, token: &str) -> AppResult<Principal> {
        let claims = self.decode_access(token)?;

        if !scope.allows(claims.kind) {
            return Err(AppError::Unauthorized);
        }

        // The ledger is what makes logout and rotation revoke access.
        if self
            .token_repo
            .find_live_access(token, claims.kind)
            .await?
            .is_none()
        {
            return Err(AppError::Unauthorized);
        }

        self.load_principal(claims.kind, &claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    // ==================== Admin Seeding ====================

    /// Insert configured admin accounts whose emails are absent.
    ///
    /// Existing rows are never overwritten. Returns how many were created.
    pub async fn seed_admins(&self, seeds: &[SeedAdminConfig]) -> AppResult<usize> {
        let mut created = 0;

        for seed in seeds {
            if self.admin_repo.find_by_email(&seed.email).await?.is_some() {
                tracing::debug!(email = %seed.email, "Seed admin already exists");
                continue;
            }

            let model = admin::ActiveModel {
                id: Set(self.id_gen.generate()),
                username: Set(seed.username.clone()),
                email: Set(seed.email.clone()),
                password_hash: Set(super::password::hash_password(&seed.password)?),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
            };
            self.admin_repo.create(model).await?;

            tracing::info!(email = %seed.email, "Seeded admin account");
            created += 1;
        }

        Ok(created)
    }

    // ==================== Token Helpers ====================

    /// Mint and persist an access token for a principal.
    async fn persist_access(&self, principal_id: &str, kind: PrincipalKind) -> AppResult<String> {
        let now = Utc::now();
        let expires_at = now + self.access_ttl;

        let claims = AccessClaims {
            sub: principal_id.to_string(),
            kind,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign access token: {e}")))?;

        let model = access_token::ActiveModel {
            id: Set(self.id_gen.generate()),
            principal_id: Set(principal_id.to_string()),
            principal_kind: Set(kind),
            token: Set(token.clone()),
            issued_at: Set(now.into()),
            expires_at: Set(expires_at.into()),
        };
        self.token_repo.insert_access(model).await?;

        Ok(token)
    }

    /// Mint and persist a refresh token for a principal.
    async fn persist_refresh(&self, principal_id: &str, kind: PrincipalKind) -> AppResult<String> {
        let now = Utc::now();
        let expires_at = now + self.refresh_ttl;

        let claims = RefreshClaims {
            sub: principal_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign refresh token: {e}")))?;

        let model = refresh_token::ActiveModel {
            id: Set(self.id_gen.generate()),
            principal_id: Set(principal_id.to_string()),
            principal_kind: Set(kind),
            token: Set(token.clone()),
            issued_at: Set(now.into()),
            expires_at: Set(expires_at.into()),
        };
        self.token_repo.insert_refresh(model).await?;

        Ok(token)
    }

    /// Decode and fully validate an access token.
    fn decode_access(&self, token: &str) -> AppResult<AccessClaims> {
        decode::<AccessClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    /// Decode an access token, checking the signature but not expiry.
    fn decode_access_allow_expired(&self, token: &str) -> AppResult<AccessClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }

    /// Decode and fully validate a refresh token.
    fn decode_refresh(&self, token: &str) -> AppResult<RefreshClaims> {
        decode::<RefreshClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidRefreshToken)
    }

    // ==================== Principal Lookups ====================

    /// Find a principal's id and password hash within one namespace.
    async fn find_credentials(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> AppResult<Option<(String, String)>> {
        Ok(match kind {
            PrincipalKind::Admin => self
                .admin_repo
                .find_by_email(email)
                .await?
                .map(|a| (a.id, a.password_hash)),
            PrincipalKind::Member => self
                .member_repo
                .find_by_email(email)
                .await?
                .map(|m| (m.id, m.password_hash)),
            PrincipalKind::User => self
                .user_repo
                .find_by_email(email)
                .await?
                .map(|u| (u.id, u.password_hash)),
        })
    }

    /// Load the principal record for an embedded id.
    async fn load_principal(
        &self,
        kind: PrincipalKind,
        id: &str,
    ) -> AppResult<Option<Principal>> {
        Ok(match kind {
            PrincipalKind::Admin => self.admin_repo.find_by_id(id).await?.map(Principal::Admin),
            PrincipalKind::Member => self.member_repo.find_by_id(id).await?.map(Principal::Member),
            PrincipalKind::User => self.user_repo.find_by_id(id).await?.map(Principal::User),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_config() -> AuthConfig {
        AuthConfig {
            secret: "unit-test-secret".to_string(),
            access_ttl_secs: 24 * 60 * 60,
            refresh_ttl_secs: 30 * 24 * 60 * 60,
        }
    }

    fn service_over(db: Arc<DatabaseConnection>) -> AuthService {
        service_with_config(db, &test_config())
    }

    fn service_with_config(db: Arc<DatabaseConnection>, config: &AuthConfig) -> AuthService {
        AuthService::new(
            config,
            AdminRepository::new(Arc::clone(&db)),
            MemberRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            TokenRepository::new(db),
        )
    }

    fn empty_service() -> AuthService {
        service_over(Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        ))
    }

    fn test_admin(id: &str, email: &str, password: &str) -> admin::Model {
        admin::Model {
            id: id.to_string(),
            username: "root".to_string(),
            email: email.to_string(),
            password_hash: super::super::password::hash_password(password).unwrap(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn access_row(token: &str, principal_id: &str, kind: PrincipalKind) -> access_token::Model {
        access_token::Model {
            id: "row1".to_string(),
            principal_id: principal_id.to_string(),
            principal_kind: kind,
            token: token.to_string(),
            issued_at: Utc::now().into(),
            expires_at: (Utc::now() + Duration::days(1)).into(),
        }
    }

    fn refresh_row(token: &str, principal_id: &str, kind: PrincipalKind) -> refresh_token::Model {
        refresh_token::Model {
            id: "row2".to_string(),
            principal_id: principal_id.to_string(),
            principal_kind: kind,
            token: token.to_string(),
            issued_at: Utc::now().into(),
            expires_at: (Utc::now() + Duration::days(30)).into(),
        }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    #[test]
    fn test_access_claims_round_trip() {
        let service = empty_service();

        let now = Utc::now();
        let claims = AccessClaims {
            sub: "adm1".to_string(),
            kind: PrincipalKind::Admin,
            iat: now.timestamp(),
            exp: (now + Duration::days(1)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        let decoded = service.decode_access(&token).unwrap();
        assert_eq!(decoded.sub, "adm1");
        assert_eq!(decoded.kind, PrincipalKind::Admin);
    }

    #[test]
    fn test_expired_access_token_is_rejected() {
        let service = empty_service();

        let now = Utc::now();
        let claims = AccessClaims {
            sub: "usr1".to_string(),
            kind: PrincipalKind::User,
            iat: (now - Duration::hours(2)).timestamp(),
            // Past the default 60s decoding leeway
            exp: (now - Duration::hours(1)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        assert!(matches!(
            service.decode_access(&token),
            Err(AppError::Unauthorized)
        ));
        // The expiry-tolerant decode used by logout still accepts it.
        assert!(service.decode_access_allow_expired(&token).is_ok());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let service = empty_service();
        let other = service_with_config(
            Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection()),
            &AuthConfig {
                secret: "a-different-secret".to_string(),
                access_ttl_secs: 3600,
                refresh_ttl_secs: 3600,
            },
        );

        let now = Utc::now();
        let claims = AccessClaims {
            sub: "usr1".to_string(),
            kind: PrincipalKind::User,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let forged = encode(&Header::default(), &claims, &other.encoding_key).unwrap();

        assert!(matches!(
            service.decode_access(&forged),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_scope_allows() {
        assert!(AuthScope::Admin.allows(PrincipalKind::Admin));
        assert!(!AuthScope::Admin.allows(PrincipalKind::User));
        assert!(!AuthScope::User.allows(PrincipalKind::Member));
        assert!(AuthScope::Any.allows(PrincipalKind::Admin));
        assert!(AuthScope::Any.allows(PrincipalKind::Member));
        assert!(AuthScope::Any.allows(PrincipalKind::User));
    }

    #[tokio::test]
    async fn test_login_mints_and_persists_pair() {
        let admin = test_admin("adm1", "root@example.com", "hunter2hunter2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // find_by_email
                .append_query_results([[admin]])
                // insert access + insert refresh (RETURNING rows)
                .append_query_results([[access_row("a", "adm1", PrincipalKind::Admin)]])
                .append_query_results([[refresh_row("r", "adm1", PrincipalKind::Admin)]])
                // clear access + clear refresh
                .append_exec_results([exec_ok(), exec_ok()])
                .into_connection(),
        );

        let service = service_over(db);
        let pair = service
            .login(PrincipalKind::Admin, "root@example.com", "hunter2hunter2")
            .await
            .unwrap();

        assert_eq!(pair.principal_id, "adm1");

        // The minted access token verifies and names the right principal.
        let claims = service.decode_access(&pair.access_token).unwrap();
        assert_eq!(claims.sub, "adm1");
        assert_eq!(claims.kind, PrincipalKind::Admin);

        let refresh = service.decode_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.sub, "adm1");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let admin = test_admin("adm1", "root@example.com", "correct-password");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[admin]])
                .into_connection(),
        );

        let service = service_over(db);
        let err = service
            .login(PrincipalKind::Admin, "root@example.com", "wrong-password")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_unknown_email_same_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<admin::Model>::new()])
                .into_connection(),
        );

        let service = service_over(db);
        let err = service
            .login(PrincipalKind::Admin, "nobody@example.com", "whatever")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_refresh_with_unledgered_token_fails() {
        // Structurally valid refresh token, but no ledger row: revoked.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<refresh_token::Model>::new()])
                .into_connection(),
        );

        let service = service_over(db);

        let now = Utc::now();
        let claims = RefreshClaims {
            sub: "usr1".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(30)).timestamp(),
        };
        let refresh = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        let err = service
            .refresh(PrincipalKind::User, "not-a-valid-access-token", &refresh)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidRefreshToken));
    }

    #[tokio::test]
    async fn test_refresh_ownership_mismatch() {
        let service = empty_service();

        let now = Utc::now();
        let claims = RefreshClaims {
            sub: "usr1".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(30)).timestamp(),
        };
        let refresh = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        // Ledger row names a different principal than the embedded id.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[refresh_row(&refresh, "usr2", PrincipalKind::User)]])
                .into_connection(),
        );
        let service = service_over(db);

        let err = service
            .refresh(PrincipalKind::User, "garbage", &refresh)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TokenOwnershipMismatch));
    }

    #[tokio::test]
    async fn test_refresh_short_circuits_on_valid_access() {
        let service = empty_service();

        let now = Utc::now();
        let claims = AccessClaims {
            sub: "usr1".to_string(),
            kind: PrincipalKind::User,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let access = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        let outcome = service
            .refresh(PrincipalKind::User, &access, "ignored")
            .await
            .unwrap();

        assert!(!outcome.rotated);
        assert_eq!(outcome.access_token, access);
    }

    #[tokio::test]
    async fn test_verify_bearer_accepts_ledgered_token() {
        let admin = test_admin("adm1", "root@example.com", "hunter2hunter2");

        let service = empty_service();
        let now = Utc::now();
        let claims = AccessClaims {
            sub: "adm1".to_string(),
            kind: PrincipalKind::Admin,
            iat: now.timestamp(),
            exp: (now + Duration::days(1)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[access_row(&token, "adm1", PrincipalKind::Admin)]])
                .append_query_results([[admin]])
                .into_connection(),
        );
        let service = service_over(db);

        let principal = service
            .verify_bearer(AuthScope::Admin, &token)
            .await
            .unwrap();

        assert_eq!(principal.id(), "adm1");
        assert_eq!(principal.kind(), PrincipalKind::Admin);
    }

    #[tokio::test]
    async fn test_verify_bearer_rejects_revoked_token() {
        let service = empty_service();
        let now = Utc::now();
        let claims = AccessClaims {
            sub: "usr1".to_string(),
            kind: PrincipalKind::User,
            iat: now.timestamp(),
            exp: (now + Duration::days(1)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        // Signature is fine; the ledger row is gone (logout happened).
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<access_token::Model>::new()])
                .into_connection(),
        );
        let service = service_over(db);

        let err = service
            .verify_bearer(AuthScope::User, &token)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_verify_bearer_rejects_wrong_scope() {
        let service = empty_service();
        let now = Utc::now();
        let claims = AccessClaims {
            sub: "usr1".to_string(),
            kind: PrincipalKind::User,
            iat: now.timestamp(),
            exp: (now + Duration::days(1)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        // A user token presented at an admin route never reaches the ledger.
        let err = service
            .verify_bearer(AuthScope::Admin, &token)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let service = empty_service();
        let now = Utc::now();
        let claims = AccessClaims {
            sub: "adm1".to_string(),
            kind: PrincipalKind::Admin,
            iat: now.timestamp(),
            exp: (now + Duration::days(1)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        // Both deletes touch nothing; logout still succeeds.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );
        let service = service_over(db);

        service
            .logout(PrincipalKind::Admin, &token, "some-refresh-token")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_seed_admins_skips_existing() {
        let existing = test_admin("adm1", "root@example.com", "seeded");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );
        let service = service_over(db);

        let created = service
            .seed_admins(&[SeedAdminConfig {
                username: "root".to_string(),
                email: "root@example.com".to_string(),
                password: "seeded".to_string(),
            }])
            .await
            .unwrap();

        assert_eq!(created, 0);
    }
}
