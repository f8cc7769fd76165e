#![forbid(unsafe_code)]

//! `window.localStorage` as a [`KeyValueStore`].

use folio_runtime::storage::{KeyValueStore, StorageError};
use wasm_bindgen::JsValue;

use crate::js_error_message;

/// Local storage of the current window.
///
/// The storage object is looked up on every access: private browsing modes
/// throw on access rather than at page load.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStore;

impl LocalStore {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        window
            .local_storage()
            .map_err(|e| StorageError::Denied(js_error_message(&e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage is null".into()))
    }
}

fn classify(err: &JsValue) -> StorageError {
    let message = js_error_message(err);
    if message.contains("Quota") || message.contains("quota") {
        StorageError::QuotaExceeded
    } else {
        StorageError::Denied(message)
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?.get_item(key).map_err(|e| classify(&e))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?.set_item(key, value).map_err(|e| classify(&e))
    }
}
