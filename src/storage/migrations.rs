use serde_json::Value;

use crate::storage::StorageError;

type MigrationFn = fn(Value) -> Result<Value, StorageError>;

fn get_migrations() -> Vec<MigrationFn> {
    vec![migrate_v1_to_v2]
}

/// Returns 1 if version field is missing (assumes v1, our first versioned schema)
pub fn detect_version(value: &Value) -> Result<u32, StorageError> {
    let Some(v) = value.get("version") else {
        return Ok(1);
    };

    let version = v
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| StorageError::InvalidVersion(v.to_string()))?;

    // Versions start at 1
    if version == 0 {
        return Err(StorageError::UnsupportedVersion(0));
    }

    Ok(version)
}

/// Migrations are applied sequentially: v1→v2→v3→...→target
pub fn apply_migrations(
    mut data: Value,
    from_version: u32,
    to_version: u32,
) -> Result<Value, StorageError> {
    if from_version == to_version {
        return Ok(data);
    }

    if from_version > to_version {
        return Err(StorageError::FutureVersion(from_version));
    }

    let migrations = get_migrations();

    if from_version == 0 {
        return Err(StorageError::UnsupportedVersion(0));
    }

    for version in from_version..to_version {
        let migration_idx = (version - 1) as usize; // v1→v2 is at index 0

        if migration_idx >= migrations.len() {
            return Err(StorageError::UnsupportedVersion(version));
        }

        tracing::info!(from = version, to = version + 1, "migrating store");
        data = migrations[migration_idx](data)?;
    }

    Ok(data)
}

/// v1 stores predate negative keywords and saved location lists.
fn migrate_v1_to_v2(mut value: Value) -> Result<Value, StorageError> {
    if let Some(obj) = value.as_object_mut() {
        obj.insert("version".to_string(), Value::from(2));
        for collection in ["negative_keywords", "location_lists"] {
            obj.entry(collection)
                .or_insert_with(|| Value::Array(vec![]));
        }
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_version_with_version_field() {
        let json = serde_json::json!({"version": 2, "campaigns": []});
        assert_eq!(detect_version(&json).unwrap(), 2);
    }

    #[test]
    fn test_detect_version_without_version_field() {
        let json = serde_json::json!({"campaigns": []});
        assert_eq!(detect_version(&json).unwrap(), 1);
    }

    #[test]
    fn test_detect_version_rejects_non_numeric() {
        let json = serde_json::json!({"version": "two"});
        assert!(matches!(
            detect_version(&json),
            Err(StorageError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_detect_version_rejects_zero() {
        let json = serde_json::json!({"version": 0, "campaigns": []});
        assert!(matches!(
            detect_version(&json),
            Err(StorageError::UnsupportedVersion(0))
        ));
    }

    #[test]
    fn test_detect_version_rejects_out_of_range() {
        // 2^32 + 2 would truncate to 2
        let json = serde_json::json!({"version": 4_294_967_298u64});
        assert!(matches!(
            detect_version(&json),
            Err(StorageError::InvalidVersion(_))
        ));
    }

    #[test]
    fn test_apply_migrations_from_zero_is_an_error() {
        let result = apply_migrations(serde_json::json!({}), 0, 2);
        assert!(matches!(result, Err(StorageError::UnsupportedVersion(0))));
    }

    #[test]
    fn test_apply_migrations_same_version() {
        let data = serde_json::json!({"version": 2});
        let result = apply_migrations(data.clone(), 2, 2).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn test_apply_migrations_future_version() {
        let data = serde_json::json!({"version": 5});
        let result = apply_migrations(data, 5, 2);
        assert!(matches!(result, Err(StorageError::FutureVersion(5))));
    }

    #[test]
    fn test_v1_to_v2_adds_missing_collections() {
        let data = serde_json::json!({
            "campaigns": [],
            "keywords": [],
            "categories": [],
            "counties": [],
            "cities": []
        });
        let migrated = apply_migrations(data, 1, 2).unwrap();
        assert_eq!(migrated["version"], 2);
        assert_eq!(migrated["negative_keywords"], serde_json::json!([]));
        assert_eq!(migrated["location_lists"], serde_json::json!([]));
    }

    #[test]
    fn test_v1_to_v2_keeps_existing_collections() {
        let data = serde_json::json!({"location_lists": [{"name": "kept"}]});
        let migrated = apply_migrations(data, 1, 2).unwrap();
        assert_eq!(migrated["location_lists"][0]["name"], "kept");
    }
}
