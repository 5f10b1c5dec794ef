use std::cell::{Cell, RefCell};

use serde_json::{Map, Value};

use crate::{
    models::store::Store,
    storage::{LocalStorage, Storage, StorageError},
};

/// Test double that keeps the last saved store and can be told to fail.
#[derive(Default)]
pub struct MemoryStorage {
    pub saved: RefCell<Option<Store>>,
    pub saves: Cell<usize>,
    pub fail_saves: Cell<bool>,
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Store, StorageError> {
        Ok(self.saved.borrow().clone().unwrap_or_default())
    }

    fn save(&self, store: &Store) -> Result<(), StorageError> {
        if self.fail_saves.get() {
            return Err(StorageError::SaveFailed {
                path: "<memory>".into(),
                source: std::io::Error::other("simulated failure"),
            });
        }
        self.saves.set(self.saves.get() + 1);
        *self.saved.borrow_mut() = Some(store.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLocalStorage {
    items: RefCell<Map<String, Value>>,
}

impl LocalStorage for MemoryLocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.items.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}
