//! Application state: the logged-in user and every locally kept slice.
//!
//! State is loaded from the local cache when a command starts, mutated in
//! memory, and written back with [`AppState::save`]. Compound operations
//! (login, checkout, review) save on their own.

use std::sync::Arc;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use foodcourt_core::loyalty::AchievementDef;
use foodcourt_core::recommend::{self, RecommendationContext};
use foodcourt_core::{
    AddressId, Cart, ContactForm, Customization, Favorites, LineKey, LoyaltyAccount, Order, Product,
    ProductId, Recommendation, RecentlyViewed, ReviewForm, ShoppingLists, SignupForm,
};

use crate::api::ApiClient;
use crate::api::types::{ContactRequest, ReviewRequest, Session, SignupRequest, User};
use crate::checkout;
use crate::config::ClientConfig;
use crate::error::{self, ClientError, Result};
use crate::storage::{self, FileStore, LocalCache, LocalCacheExt, NoRemoteSync, RemoteSync};

/// Outcome of a successful checkout.
#[derive(Debug)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub points_earned: u64,
    pub unlocked: Vec<&'static AchievementDef>,
}

/// Client state with one typed slice per stored key.
pub struct AppState {
    api: ApiClient,
    store: Arc<dyn LocalCache>,
    sync: Box<dyn RemoteSync>,
    user: Option<User>,
    cookie_consent: Option<bool>,
    cart: Cart,
    favorites: Favorites,
    recently_viewed: RecentlyViewed,
    shopping_lists: ShoppingLists,
    loyalty: Option<LoyaltyAccount>,
}

impl AppState {
    /// Load state from the file store in the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the store
    /// cannot be read.
    pub async fn open(config: &ClientConfig) -> Result<Self> {
        let store = Arc::new(FileStore::new(&config.data_dir));
        Self::load(ApiClient::new(config)?, store).await
    }

    /// Load state from `store`.
    ///
    /// Values that no longer decode are logged and replaced by defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn load(api: ApiClient, store: Arc<dyn LocalCache>) -> Result<Self> {
        let access: Option<String> = load_slice(store.as_ref(), storage::TOKEN)?;
        let refresh: Option<String> = load_slice(store.as_ref(), storage::REFRESH_TOKEN)?;
        if let (Some(access), Some(refresh)) = (access, refresh) {
            api.set_session(Some(Session {
                access_token: SecretString::from(access),
                refresh_token: SecretString::from(refresh),
            }))
            .await;
        }

        let user: Option<User> = load_slice(store.as_ref(), storage::USER)?;
        let loyalty = match &user {
            Some(user) => Some(
                load_slice::<LoyaltyAccount>(store.as_ref(), &storage::loyalty_key(user.id))?
                    .unwrap_or_default()
                    .reconcile(),
            ),
            None => None,
        };
        if let Some(user) = &user {
            error::set_sentry_user(&user.id, &user.username);
        }

        Ok(Self {
            api,
            cookie_consent: load_slice(store.as_ref(), storage::COOKIE_CONSENT)?,
            cart: load_slice(store.as_ref(), storage::CART)?.unwrap_or_default(),
            favorites: load_slice(store.as_ref(), storage::FAVORITES)?.unwrap_or_default(),
            recently_viewed: load_slice(store.as_ref(), storage::RECENTLY_VIEWED)?
                .unwrap_or_default(),
            shopping_lists: load_slice(store.as_ref(), storage::SHOPPING_LISTS)?
                .unwrap_or_default(),
            store,
            sync: Box::new(NoRemoteSync),
            user,
            loyalty,
        })
    }

    /// Replace the remote sync hook.
    #[must_use]
    pub fn with_remote_sync(mut self, sync: Box<dyn RemoteSync>) -> Self {
        self.sync = sync;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when logged out.
    pub fn require_user(&self) -> Result<&User> {
        self.user.as_ref().ok_or(ClientError::NotAuthenticated)
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    #[must_use]
    pub const fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    #[must_use]
    pub const fn recently_viewed(&self) -> &RecentlyViewed {
        &self.recently_viewed
    }

    #[must_use]
    pub const fn shopping_lists(&self) -> &ShoppingLists {
        &self.shopping_lists
    }

    pub const fn shopping_lists_mut(&mut self) -> &mut ShoppingLists {
        &mut self.shopping_lists
    }

    /// Add the open items of a shopping list to the cart. Returns the number
    /// of units added.
    ///
    /// # Errors
    ///
    /// Returns an error if the list does not exist or a product is
    /// unavailable.
    pub fn move_list_to_cart(&mut self, list_id: Uuid) -> Result<u32> {
        Ok(self.shopping_lists.move_to_cart(list_id, &mut self.cart)?)
    }

    /// The loyalty account of the logged-in user.
    #[must_use]
    pub const fn loyalty(&self) -> Option<&LoyaltyAccount> {
        self.loyalty.as_ref()
    }

    #[must_use]
    pub const fn cookie_consent(&self) -> Option<bool> {
        self.cookie_consent
    }

    pub const fn set_cookie_consent(&mut self, accepted: bool) {
        self.cookie_consent = Some(accepted);
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in, then fetch the user profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or a request fails.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, username: &str, password: &str) -> Result<&User> {
        self.api.login(username, password).await?;
        let user = self.api.me().await?;
        self.start_session(user);
        self.save().await?;
        self.require_user()
    }

    /// Register a new account and log in as it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidForm`] before any request if the form
    /// fails validation.
    #[instrument(skip_all, fields(username = %form.username))]
    pub async fn signup(&mut self, form: &SignupForm) -> Result<&User> {
        let email = form.validate()?;
        let auth = self
            .api
            .signup(&SignupRequest {
                username: form.username.trim(),
                email: email.as_str(),
                password: &form.password,
            })
            .await?;
        let user = match auth.user() {
            Some(user) => user,
            None => self.api.me().await?,
        };
        self.start_session(user);
        self.save().await?;
        self.require_user()
    }

    fn start_session(&mut self, user: User) {
        let account = match load_slice::<LoyaltyAccount>(self.store.as_ref(), &storage::loyalty_key(user.id)) {
            Ok(account) => account.unwrap_or_default().reconcile(),
            Err(e) => {
                warn!(error = %e, "Could not read loyalty account, starting fresh");
                LoyaltyAccount::default()
            }
        };
        error::set_sentry_user(&user.id, &user.username);
        info!(user_id = %user.id, "Session started");
        self.loyalty = Some(account);
        self.user = Some(user);
    }

    /// Log out and forget the user. Local slices other than the session stay.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> Result<()> {
        // Persist the account before dropping it from memory.
        self.save().await?;
        self.api.logout().await;
        self.user = None;
        self.loyalty = None;
        error::clear_sentry_user();
        self.save().await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Fetch a product and record the view.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be fetched.
    pub async fn view_product(&mut self, id: ProductId) -> Result<Product> {
        let product = self.api.product(id).await?;
        self.recently_viewed.add(&product);
        Ok(product)
    }

    /// Toggle a favorite. Returns `true` if the product is now a favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be fetched.
    pub async fn toggle_favorite(&mut self, id: ProductId) -> Result<bool> {
        let product = self.api.product(id).await?;
        let now_favorite = self.favorites.toggle(&product);
        let count = u64::try_from(self.favorites.len()).unwrap_or(u64::MAX);
        if let Some(loyalty) = self.loyalty.as_mut() {
            loyalty.record_favorites(count);
            loyalty.check_achievements();
        }
        Ok(now_favorite)
    }

    /// Add one unit of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be fetched, is unavailable, or
    /// the customization does not apply to it.
    pub async fn add_to_cart(
        &mut self,
        id: ProductId,
        customization: Option<Customization>,
    ) -> Result<LineKey> {
        let product = self.api.product(id).await?;
        let key = self.cart.add(&product, customization)?;
        let line = key.to_string();
        error::add_breadcrumb("cart", "Added to cart", Some(&[("line", line.as_str())]));
        Ok(key)
    }

    /// Post a review and count it towards achievements.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] for a rating outside 1..=5 before
    /// sending anything.
    #[instrument(skip(self, form), fields(rating = form.rating))]
    pub async fn review(&mut self, product_id: ProductId, form: &ReviewForm) -> Result<()> {
        self.require_user()?;
        form.validate()?;
        self.api
            .submit_review(
                product_id,
                &ReviewRequest {
                    rating: form.rating,
                    comment: form.comment.trim(),
                },
            )
            .await?;
        if let Some(loyalty) = self.loyalty.as_mut() {
            loyalty.record_review();
            loyalty.check_achievements();
        }
        self.save().await
    }

    /// Send a contact message.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] before sending anything if the
    /// form is incomplete.
    pub async fn contact(&self, form: &ContactForm, phone: Option<&str>) -> Result<()> {
        let email = form.validate()?;
        self.api
            .submit_contact(&ContactRequest {
                name: form.name.trim(),
                email: email.as_str(),
                subject: form.subject.trim(),
                message: form.message.trim(),
                phone_number: phone,
            })
            .await?;
        Ok(())
    }

    // =========================================================================
    // Orders & Loyalty
    // =========================================================================

    /// Orders of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when logged out.
    pub async fn orders(&self) -> Result<Vec<Order>> {
        let user_id = self.require_user()?.id;
        Ok(self.api.user_orders(user_id).await?)
    }

    /// Submit the cart, award loyalty points, and empty the cart.
    ///
    /// `address` picks a saved address; without it the default address is
    /// used.
    ///
    /// # Errors
    ///
    /// Returns [`foodcourt_core::ValidationError::MissingDeliveryAddress`]
    /// if no address can be selected; the cart is kept on any error.
    #[instrument(skip(self, notes))]
    pub async fn checkout(&mut self, address: Option<AddressId>, notes: &str) -> Result<CheckoutReceipt> {
        self.require_user()?;
        let addresses = self.api.addresses().await?;
        let selected = checkout::select_address(&addresses, address);

        let total = self.cart.subtotal();
        let order = checkout::submit_order(&self.api, &mut self.cart, selected, notes).await?;

        let points_earned = LoyaltyAccount::points_for_order(total);
        let unlocked = match self.loyalty.as_mut() {
            Some(loyalty) => {
                loyalty.record_order(total, Utc::now().date_naive());
                loyalty.add_points(points_earned, "order");
                loyalty.check_achievements()
            }
            None => Vec::new(),
        };

        self.cart.clear();
        self.save().await?;
        Ok(CheckoutReceipt {
            order,
            points_earned,
            unlocked,
        })
    }

    /// Redeem a reward. Returns `false` if it is unknown, used, or too
    /// expensive.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when logged out.
    pub fn claim_reward(&mut self, reward_id: &str) -> Result<bool> {
        let loyalty = self.loyalty.as_mut().ok_or(ClientError::NotAuthenticated)?;
        Ok(loyalty.claim_reward(reward_id))
    }

    /// Personal recommendations from the catalog and order history.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotAuthenticated`] when logged out.
    pub async fn recommendations(&self, limit: usize) -> Result<Vec<Recommendation>> {
        let user_id = self.require_user()?.id;
        let products = self.api.products().await?;
        let orders = self.api.user_orders(user_id).await?;
        let ctx = RecommendationContext {
            orders: &orders,
            recently_viewed: &self.recently_viewed,
            favorites: &self.favorites,
            cart: &self.cart,
            now: Utc::now(),
            limit,
        };
        Ok(recommend::recommend(&products, &ctx))
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write every slice to the local cache.
    ///
    /// If the API client lost its session (a failed token refresh), the
    /// stored credentials and user are cleared as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn save(&mut self) -> Result<()> {
        // The loyalty account outlives the session it was earned in.
        if let (Some(user), Some(loyalty)) = (&self.user, &self.loyalty) {
            self.put(&storage::loyalty_key(user.id), loyalty)?;
        }

        match self.api.session().await {
            Some(session) => {
                self.put(storage::TOKEN, session.access_token.expose_secret())?;
                self.put(storage::REFRESH_TOKEN, session.refresh_token.expose_secret())?;
            }
            None => {
                if self.user.take().is_some() {
                    info!("Session ended, clearing stored credentials");
                    error::clear_sentry_user();
                }
                self.loyalty = None;
                self.store.remove(storage::TOKEN)?;
                self.store.remove(storage::REFRESH_TOKEN)?;
            }
        }

        match &self.user {
            Some(user) => self.put(storage::USER, user)?,
            None => self.store.remove(storage::USER)?,
        }
        if let Some(consent) = self.cookie_consent {
            self.put(storage::COOKIE_CONSENT, &consent)?;
        }
        self.put(storage::CART, &self.cart)?;
        self.put(storage::FAVORITES, &self.favorites)?;
        self.put(storage::RECENTLY_VIEWED, &self.recently_viewed)?;
        self.put(storage::SHOPPING_LISTS, &self.shopping_lists)?;
        Ok(())
    }

    fn put<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = self.store.save(key, value)?;
        self.sync.push(key, &raw)?;
        Ok(())
    }
}

/// Load one slice; undecodable values fall back to `None`.
fn load_slice<T: DeserializeOwned>(store: &dyn LocalCache, key: &str) -> Result<Option<T>> {
    match store.load(key) {
        Ok(value) => Ok(value),
        Err(crate::error::StorageError::Corrupt { key, source }) => {
            warn!(key = %key, error = %source, "Discarding unreadable stored value");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::storage::MemoryStore;

    async fn state(store: Arc<MemoryStore>) -> AppState {
        let config = ClientConfig::for_api_url("http://127.0.0.1:9".parse().unwrap());
        AppState::load(ApiClient::new(&config).unwrap(), store).await.unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_loads_defaults() {
        let state = state(Arc::new(MemoryStore::new())).await;
        assert!(state.user().is_none());
        assert!(state.loyalty().is_none());
        assert!(state.cart().is_empty());
        assert!(!state.api().is_authenticated().await);
        assert!(matches!(state.require_user(), Err(ClientError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_corrupt_slice_falls_back_to_default() {
        let store = Arc::new(MemoryStore::new());
        store.set_raw(storage::FAVORITES, "[{broken").unwrap();
        let state = state(Arc::clone(&store)).await;
        assert!(state.favorites().is_empty());
    }

    #[tokio::test]
    async fn test_save_without_session_drops_user() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(storage::USER, &serde_json::json!({"id": 3, "username": "mario"}))
            .unwrap();
        store.save(storage::TOKEN, "stale").unwrap();

        // Only an access token: no usable session.
        let mut state = state(Arc::clone(&store)).await;
        assert!(state.user().is_some());
        assert!(state.loyalty().is_some());

        state.save().await.unwrap();
        assert!(state.user().is_none());
        assert!(state.loyalty().is_none());
        assert!(!store.keys().contains(&storage::USER.to_string()));
        assert!(!store.keys().contains(&storage::TOKEN.to_string()));
    }

    #[tokio::test]
    async fn test_claim_reward_requires_login() {
        let mut state = state(Arc::new(MemoryStore::new())).await;
        assert!(matches!(
            state.claim_reward("free_delivery"),
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_cookie_consent_persists() {
        let store = Arc::new(MemoryStore::new());
        let mut state = state(Arc::clone(&store)).await;
        state.set_cookie_consent(true);
        state.save().await.unwrap();

        let reloaded = AppState::load(
            ApiClient::new(&ClientConfig::for_api_url("http://127.0.0.1:9".parse().unwrap())).unwrap(),
            store,
        )
        .await
        .unwrap();
        assert_eq!(reloaded.cookie_consent(), Some(true));
    }

    #[tokio::test]
    async fn test_expired_session_keeps_loyalty_account() {
        let store = Arc::new(MemoryStore::new());
        store
            .save(storage::USER, &serde_json::json!({"id": 3, "username": "mario"}))
            .unwrap();
        let mut state = state(Arc::clone(&store)).await;
        state.loyalty.as_mut().unwrap().add_points(120, "order");

        state.save().await.unwrap();
        let saved: LoyaltyAccount = store
            .load(&storage::loyalty_key(foodcourt_core::UserId::new(3)))
            .unwrap()
            .unwrap();
        assert_eq!(saved.total_points(), 120);
    }
}
