//! Shared storefront state.

use std::sync::Arc;

use crate::backend::{
    AuthApi, DataService, MemoryAuthApi, MemoryDataService, RestAuthApi, RestDataService,
};
use crate::config::StorefrontConfig;
use crate::identity::{FileSessionCache, IdentityStore, MemorySessionCache, SessionCache};
use crate::services::{
    AddressBook, CartService, Catalog, CheckoutService, Dashboard, IdentityService,
};

/// Root handle over the backend clients and the identity slot.
///
/// Cheaply cloneable via `Arc`; service accessors hand out thin handles over
/// the same shared state.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    data: Arc<dyn DataService>,
    auth: Arc<dyn AuthApi>,
    cache: Arc<dyn SessionCache>,
    identity: IdentityStore,
}

impl Storefront {
    /// Connect to the hosted backend described by the configuration.
    #[must_use]
    pub fn connect(config: &StorefrontConfig) -> Self {
        Self::with_backend(
            Arc::new(RestDataService::new(&config.backend)),
            Arc::new(RestAuthApi::new(&config.backend)),
            Arc::new(FileSessionCache::new(config.session_file.clone())),
        )
    }

    /// Build over injected backend implementations.
    #[must_use]
    pub fn with_backend(
        data: Arc<dyn DataService>,
        auth: Arc<dyn AuthApi>,
        cache: Arc<dyn SessionCache>,
    ) -> Self {
        Self {
            inner: Arc::new(StorefrontInner {
                data,
                auth,
                cache,
                identity: IdentityStore::new(),
            }),
        }
    }

    /// Fully in-memory storefront for tests and local development.
    #[must_use]
    pub fn in_memory(data: MemoryDataService, auth: MemoryAuthApi) -> Self {
        Self::with_backend(
            Arc::new(data),
            Arc::new(auth),
            Arc::new(MemorySessionCache::new()),
        )
    }

    /// The identity slot (current identity, subscriptions).
    #[must_use]
    pub fn identity_store(&self) -> &IdentityStore {
        &self.inner.identity
    }

    /// The identity/session provider.
    #[must_use]
    pub fn identity(&self) -> IdentityService {
        IdentityService::new(
            Arc::clone(&self.inner.auth),
            Arc::clone(&self.inner.data),
            self.inner.identity.clone(),
            Arc::clone(&self.inner.cache),
        )
    }

    /// The cart aggregate.
    #[must_use]
    pub fn cart(&self) -> CartService {
        CartService::new(Arc::clone(&self.inner.data), self.inner.identity.clone())
    }

    /// The order placement engine.
    #[must_use]
    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(Arc::clone(&self.inner.data), self.inner.identity.clone())
    }

    /// The address book.
    #[must_use]
    pub fn addresses(&self) -> AddressBook {
        AddressBook::new(Arc::clone(&self.inner.data), self.inner.identity.clone())
    }

    /// Catalog reads.
    #[must_use]
    pub fn catalog(&self) -> Catalog {
        Catalog::new(Arc::clone(&self.inner.data))
    }

    /// Admin dashboard reads.
    #[must_use]
    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(Arc::clone(&self.inner.data), self.inner.identity.clone())
    }
}
