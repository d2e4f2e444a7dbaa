#![cfg(feature = "reqwest")]

// self
use auth_gateway::{
	_preludet::*,
	auth::{TokenKey, TokenSecret},
	store::{MemoryStore, TokenStore},
};

#[tokio::test]
async fn save_and_load_round_trip() {
	let store = MemoryStore::default();

	store
		.save(TokenKey::AccessToken, TokenSecret::new("access-1"))
		.await
		.expect("Saving the access token into the memory store should succeed.");

	let loaded = store
		.load(TokenKey::AccessToken)
		.await
		.expect("Loading the access token should succeed.")
		.expect("Stored access token should remain present.");

	assert_eq!(loaded.expose(), "access-1");
	assert!(
		store
			.load(TokenKey::RefreshToken)
			.await
			.expect("Loading a missing key should succeed.")
			.is_none()
	);
}

#[tokio::test]
async fn save_overwrites_and_remove_returns_previous_value() {
	let store = MemoryStore::default();

	store
		.save(TokenKey::AccessToken, TokenSecret::new("access-old"))
		.await
		.expect("Saving the initial access token should succeed.");
	store
		.save(TokenKey::AccessToken, TokenSecret::new("access-new"))
		.await
		.expect("Overwriting the access token should succeed.");

	assert_eq!(store.len(), 1);

	let removed = store
		.remove(TokenKey::AccessToken)
		.await
		.expect("Removing the access token should succeed.");

	assert_eq!(removed.as_ref().map(TokenSecret::expose), Some("access-new"));
	assert!(store.is_empty());
}

#[tokio::test]
async fn clones_share_the_same_backing_map() {
	let store = MemoryStore::default();
	let shared: Arc<dyn TokenStore> = Arc::new(store.clone());

	shared
		.save(TokenKey::RefreshToken, TokenSecret::new("refresh-shared"))
		.await
		.expect("Saving through the trait object should succeed.");

	assert_eq!(
		store.get(TokenKey::RefreshToken).as_ref().map(TokenSecret::expose),
		Some("refresh-shared"),
	);
}
