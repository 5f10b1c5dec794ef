use thiserror::Error;

use crate::{
    events::{AppEvent, EventBus},
    models::menu::{MenuConfig, MenuItem},
    storage::{LocalStorage, StorageError},
};

/// Key the menu tree lives under in local storage
pub const MENU_CONFIG_KEY: &str = "menuConfig";

#[derive(Debug, Error)]
pub enum MenuConfigError {
    #[error("Stored menu configuration is not valid: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("Failed to serialize menu configuration: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Menu section '{0}' not found")]
    SectionNotFound(String),

    #[error("Menu item '{0}' not found")]
    ItemNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Falls back to the built-in menu when nothing has been saved yet
pub fn load_menu_config(storage: &impl LocalStorage) -> Result<MenuConfig, MenuConfigError> {
    match storage.get_item(MENU_CONFIG_KEY)? {
        Some(value) => serde_json::from_value(value).map_err(MenuConfigError::Corrupt),
        None => Ok(MenuConfig::default()),
    }
}

/// Persists the tree, then tells every subscriber about it
pub fn save_menu_config(
    storage: &impl LocalStorage,
    bus: &EventBus,
    config: &MenuConfig,
) -> Result<(), MenuConfigError> {
    let value = serde_json::to_value(config).map_err(MenuConfigError::Serialize)?;
    storage.set_item(MENU_CONFIG_KEY, value)?;
    bus.publish(AppEvent::MenuConfigChanged(config.clone()));
    Ok(())
}

pub fn reset_menu_config(
    storage: &impl LocalStorage,
    bus: &EventBus,
) -> Result<MenuConfig, MenuConfigError> {
    storage.remove_item(MENU_CONFIG_KEY)?;
    let config = MenuConfig::default();
    bus.publish(AppEvent::MenuConfigChanged(config.clone()));
    Ok(config)
}

pub fn set_section_visible(
    config: &mut MenuConfig,
    section_id: &str,
    visible: bool,
) -> Result<(), MenuConfigError> {
    let section = config
        .section_mut(section_id)
        .ok_or_else(|| MenuConfigError::SectionNotFound(section_id.to_string()))?;
    section.visible = visible;
    Ok(())
}

fn item_mut<'a>(config: &'a mut MenuConfig, item_id: &str) -> Option<&'a mut MenuItem> {
    config
        .sections
        .iter_mut()
        .flat_map(|s| s.items.iter_mut())
        .find(|i| i.id == item_id)
}

pub fn set_item_visible(
    config: &mut MenuConfig,
    item_id: &str,
    visible: bool,
) -> Result<(), MenuConfigError> {
    let item = item_mut(config, item_id)
        .ok_or_else(|| MenuConfigError::ItemNotFound(item_id.to_string()))?;
    item.visible = visible;
    Ok(())
}

pub fn add_item(
    config: &mut MenuConfig,
    section_id: &str,
    item: MenuItem,
) -> Result<(), MenuConfigError> {
    let section = config
        .section_mut(section_id)
        .ok_or_else(|| MenuConfigError::SectionNotFound(section_id.to_string()))?;
    section.items.push(item);
    Ok(())
}

pub fn remove_item(config: &mut MenuConfig, item_id: &str) -> Result<MenuItem, MenuConfigError> {
    for section in &mut config.sections {
        if let Some(index) = section.items.iter().position(|i| i.id == item_id) {
            return Ok(section.items.remove(index));
        }
    }
    Err(MenuConfigError::ItemNotFound(item_id.to_string()))
}

/// Moves an item within its section; negative offsets move it up.
/// Offsets past either end clamp.
pub fn move_item(config: &mut MenuConfig, item_id: &str, offset: isize) -> Result<(), MenuConfigError> {
    for section in &mut config.sections {
        if let Some(index) = section.items.iter().position(|i| i.id == item_id) {
            let last = section.items.len() as isize - 1;
            let target = (index as isize + offset).clamp(0, last) as usize;
            let item = section.items.remove(index);
            section.items.insert(target, item);
            return Ok(());
        }
    }
    Err(MenuConfigError::ItemNotFound(item_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryLocalStorage;

    #[test]
    fn test_load_defaults_when_missing() {
        let storage = MemoryLocalStorage::default();
        assert_eq!(load_menu_config(&storage).unwrap(), MenuConfig::default());
    }

    #[test]
    fn test_save_round_trip_and_notify() {
        let storage = MemoryLocalStorage::default();
        let bus = EventBus::new();
        let sidebar = bus.subscribe();

        let mut config = MenuConfig::default();
        set_section_visible(&mut config, "insights", false).unwrap();
        set_item_visible(&mut config, "keywords", false).unwrap();
        add_item(
            &mut config,
            "admin",
            MenuItem {
                id: String::from("audit"),
                label: String::from("Audit Log"),
                path: String::from("/admin/audit"),
                icon: None,
                visible: true,
            },
        )
        .unwrap();

        save_menu_config(&storage, &bus, &config).unwrap();

        assert_eq!(load_menu_config(&storage).unwrap(), config);
        assert_eq!(
            sidebar.try_recv().unwrap(),
            AppEvent::MenuConfigChanged(config)
        );
    }

    #[test]
    fn test_corrupt_value_is_reported() {
        let storage = MemoryLocalStorage::default();
        storage
            .set_item(MENU_CONFIG_KEY, serde_json::json!({"sections": "nope"}))
            .unwrap();

        assert!(matches!(
            load_menu_config(&storage),
            Err(MenuConfigError::Corrupt(_))
        ));
    }

    #[test]
    fn test_move_and_remove_item() {
        let mut config = MenuConfig::default();

        move_item(&mut config, "keywords", -5).unwrap();
        let main: Vec<_> = config.section("main").unwrap().items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(main, vec!["keywords", "dashboard", "campaigns"]);

        let removed = remove_item(&mut config, "dashboard").unwrap();
        assert_eq!(removed.path, "/");
        assert!(matches!(
            remove_item(&mut config, "dashboard"),
            Err(MenuConfigError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_reset_clears_saved_config() {
        let storage = MemoryLocalStorage::default();
        let bus = EventBus::new();
        let mut config = MenuConfig::default();
        config.sections.clear();
        save_menu_config(&storage, &bus, &config).unwrap();

        let reset = reset_menu_config(&storage, &bus).unwrap();

        assert_eq!(reset, MenuConfig::default());
        assert_eq!(load_menu_config(&storage).unwrap(), MenuConfig::default());
    }
}
