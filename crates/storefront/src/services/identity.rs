//! Identity/session provider.
//!
//! Owns every sign-in transition: the OTP flow, the email/password flow, the
//! demo-account bypass, and sign-out. All transitions land in the
//! [`IdentityStore`]; the admin flag is re-fetched from the profile row on
//! every identity change and degrades to "not admin" when the fetch fails.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use vastra_core::{Email, Phone, UserId};

use crate::backend::{AuthApi, AuthError, AuthSession, DataService};
use crate::identity::{Identity, IdentityStore, SessionCache, demo};
use crate::models::NewProfile;

/// Minimum password length for the email/password flow.
const MIN_PASSWORD_LENGTH: usize = 8;

/// The identity/session provider.
#[derive(Clone)]
pub struct IdentityService {
    auth: Arc<dyn AuthApi>,
    data: Arc<dyn DataService>,
    store: IdentityStore,
    cache: Arc<dyn SessionCache>,
}

impl IdentityService {
    /// Create a new identity service.
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthApi>,
        data: Arc<dyn DataService>,
        store: IdentityStore,
        cache: Arc<dyn SessionCache>,
    ) -> Self {
        Self {
            auth,
            data,
            store,
            cache,
        }
    }

    /// The current identity, if any.
    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.store.current()
    }

    /// Subscribe to identity changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.store.subscribe()
    }

    /// Restore an identity at startup.
    ///
    /// A session held by the auth subsystem wins over the persisted demo
    /// record; the demo record is only consulted when no session exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the session lookup itself fails. A missing
    /// identity is `Ok(None)`, not an error.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<Option<Identity>, AuthError> {
        if let Some(session) = self.auth.get_session().await? {
            return Ok(Some(self.apply_session(session).await));
        }

        let cached = self.cache.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read persisted session record");
            None
        });
        match cached {
            Some(identity) => {
                let is_admin = self.admin_flag(&identity.user_id).await;
                let identity = Identity {
                    is_admin,
                    ..identity
                };
                self.store.set(identity.clone());
                Ok(Some(identity))
            }
            None => Ok(None),
        }
    }

    /// Request a one-time code for a phone number.
    ///
    /// Demo numbers short-circuit: no SMS is sent and the fixed code is
    /// expected at verification.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the auth subsystem rejects the request.
    #[instrument(skip(self), fields(phone = %phone))]
    pub async fn request_code(&self, phone: &Phone) -> Result<(), AuthError> {
        if demo::is_demo_phone(phone) {
            return Ok(());
        }
        self.auth.sign_in_with_otp(phone).await
    }

    /// Verify a one-time code and sign in.
    ///
    /// A demo phone with the demo code bypasses the auth subsystem; any
    /// other pair is forwarded unmodified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCode` if the code does not verify.
    #[instrument(skip(self, code), fields(phone = %phone))]
    pub async fn verify_code(
        &self,
        phone: &Phone,
        code: &str,
        display_name: Option<&str>,
    ) -> Result<Identity, AuthError> {
        if let Some(account) = demo::resolve_otp(phone, code) {
            return Ok(self.demo_sign_in(account, display_name).await);
        }

        let session = self.auth.verify_otp(phone, code).await?;
        if display_name.is_some() {
            self.upsert_profile_quietly(&NewProfile {
                id: session.user.id.clone(),
                full_name: display_name.map(str::to_owned),
                phone: Some(phone.clone()),
                is_admin: None,
            })
            .await;
        }
        Ok(self.apply_session(session).await)
    }

    /// Create an account with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` before any remote call if the
    /// password is too short, and `AuthError::UserAlreadyExists` if the
    /// email is taken.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        email: &Email,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity, AuthError> {
        validate_password(password)?;

        if let Some(account) = demo::resolve_password(email, password) {
            return Ok(self.demo_sign_in(account, display_name).await);
        }

        let session = self.auth.sign_up(email, password).await?;
        if display_name.is_some() {
            self.upsert_profile_quietly(&NewProfile {
                id: session.user.id.clone(),
                full_name: display_name.map(str::to_owned),
                phone: None,
                is_admin: None,
            })
            .await;
        }
        Ok(self.apply_session(session).await)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on a wrong pair.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<Identity, AuthError> {
        if let Some(account) = demo::resolve_password(email, password) {
            return Ok(self.demo_sign_in(account, None).await);
        }

        let session = self.auth.sign_in_with_password(email, password).await?;
        Ok(self.apply_session(session).await)
    }

    /// Sign out.
    ///
    /// Local state (persisted record, identity slot) is cleared first; a
    /// failure of the remote sign-out is logged, not surfaced, since the
    /// user-visible transition has already happened.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature leaves room for stricter
    /// policies.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if let Err(e) = self.cache.clear() {
            tracing::warn!(error = %e, "Failed to clear persisted session record");
        }
        self.store.clear();
        if let Err(e) = self.auth.sign_out().await {
            tracing::warn!(error = %e, "Remote sign-out failed");
        }
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Sign in as a demo account without touching the auth subsystem.
    async fn demo_sign_in(&self, account: demo::DemoAccount, display_name: Option<&str>) -> Identity {
        let identity = account.identity(display_name);

        self.upsert_profile_quietly(&NewProfile {
            id: identity.user_id.clone(),
            full_name: identity.display_name.clone(),
            phone: identity.phone.clone(),
            is_admin: Some(account.is_admin()),
        })
        .await;

        if let Err(e) = self.cache.save(&identity) {
            tracing::warn!(error = %e, "Failed to persist demo session record");
        }

        self.store.set(identity.clone());
        identity
    }

    /// Turn an auth session into the current identity.
    ///
    /// The profile fetch supplies display name and admin flag; its failure
    /// degrades to an anonymous-profile identity rather than failing the
    /// transition.
    async fn apply_session(&self, session: AuthSession) -> Identity {
        let (is_admin, display_name) = match self.data.fetch_profile(&session.user.id).await {
            Ok(Some(profile)) => (profile.is_admin, profile.full_name),
            Ok(None) => (false, None),
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch failed; treating user as non-admin");
                (false, None)
            }
        };

        let identity = Identity {
            user_id: session.user.id,
            phone: session.user.phone,
            email: session.user.email,
            display_name,
            is_admin,
            realm: crate::identity::IdentityRealm::Remote,
        };
        self.store.set(identity.clone());
        identity
    }

    /// Re-fetch only the admin flag, degrading to `false`.
    async fn admin_flag(&self, user: &UserId) -> bool {
        match self.data.fetch_profile(user).await {
            Ok(profile) => profile.is_some_and(|p| p.is_admin),
            Err(e) => {
                tracing::warn!(error = %e, "Profile fetch failed; treating user as non-admin");
                false
            }
        }
    }

    /// Profile upserts on the sign-in paths never fail the transition.
    async fn upsert_profile_quietly(&self, profile: &NewProfile) {
        if let Err(e) = self.data.upsert_profile(profile).await {
            tracing::warn!(error = %e, "Failed to upsert user profile");
        }
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}
