//! Address book.
//!
//! Maintains the at-most-one-default invariant with an explicit
//! clear-then-set sequence. The two steps are not isolated: concurrent
//! default edits by the same user can leave zero or two rows flagged.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use vastra_core::{AddressId, UserId};

use crate::backend::{BackendError, DataService};
use crate::identity::IdentityStore;
use crate::models::{Address, AddressDraft, NewAddress};

/// Errors surfaced by address operations.
#[derive(Debug, Error)]
pub enum AddressError {
    /// No identity present; nothing was sent to the backend.
    #[error("sign in to manage addresses")]
    NotAuthenticated,

    /// A backend call failed.
    #[error("address operation failed: {0}")]
    Backend(#[from] BackendError),
}

/// The authenticated user's saved delivery addresses.
#[derive(Clone)]
pub struct AddressBook {
    data: Arc<dyn DataService>,
    identity: IdentityStore,
}

impl AddressBook {
    /// Create a new address book.
    #[must_use]
    pub fn new(data: Arc<dyn DataService>, identity: IdentityStore) -> Self {
        Self { data, identity }
    }

    fn require_user(&self) -> Result<UserId, AddressError> {
        self.identity
            .current()
            .map(|identity| identity.user_id)
            .ok_or(AddressError::NotAuthenticated)
    }

    /// All saved addresses, defaults first.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotAuthenticated` with no identity present,
    /// or `AddressError::Backend` if the read fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Address>, AddressError> {
        let user = self.require_user()?;
        Ok(self.data.list_addresses(&user).await?)
    }

    /// The flagged default address, if any.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotAuthenticated` with no identity present,
    /// or `AddressError::Backend` if the read fails.
    pub async fn default_address(&self) -> Result<Option<Address>, AddressError> {
        let user = self.require_user()?;
        Ok(self.data.default_address(&user).await?)
    }

    /// Save a new address.
    ///
    /// When the draft is flagged default, every other default is cleared
    /// first so at most one remains.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotAuthenticated` with no identity present,
    /// or `AddressError::Backend` if a remote call fails.
    #[instrument(skip(self, draft))]
    pub async fn add(&self, draft: AddressDraft) -> Result<Address, AddressError> {
        let user = self.require_user()?;
        if draft.is_default {
            self.data.clear_default_flags(&user).await?;
        }
        let address = self
            .data
            .insert_address(&NewAddress {
                user_id: user,
                draft,
            })
            .await?;
        Ok(address)
    }

    /// Replace the user-supplied fields of a saved address.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotAuthenticated` with no identity present,
    /// or `AddressError::Backend` if a remote call fails.
    #[instrument(skip(self, draft), fields(id = %id))]
    pub async fn update(&self, id: &AddressId, draft: AddressDraft) -> Result<(), AddressError> {
        let user = self.require_user()?;
        if draft.is_default {
            self.data.clear_default_flags(&user).await?;
        }
        self.data.update_address(id, &draft).await?;
        Ok(())
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotAuthenticated` with no identity present,
    /// or `AddressError::Backend` if the delete fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn remove(&self, id: &AddressId) -> Result<(), AddressError> {
        self.require_user()?;
        self.data.delete_address(id).await?;
        Ok(())
    }

    /// Make one address the default (clear-then-set).
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotAuthenticated` with no identity present,
    /// or `AddressError::Backend` if a remote call fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn set_default(&self, id: &AddressId) -> Result<(), AddressError> {
        let user = self.require_user()?;
        self.data.clear_default_flags(&user).await?;
        self.data.mark_default(id).await?;
        Ok(())
    }
}
