use slug::slugify;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{category::Category, store::Store},
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum CreateCategoryError {
    #[error("Category name is required")]
    EmptyName,

    #[error("Category with name '{}' already exists", .0)]
    CategoryAlreadyExists(String),

    #[error("Parent category '{0}' not found")]
    ParentNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct CreateCategoryParameters {
    pub name: String,
    pub parent: Option<String>,
}

pub fn find_category<'a>(store: &'a Store, name_or_slug: &str) -> Option<&'a Category> {
    let wanted = slugify(name_or_slug);
    store.categories.iter().find(|c| c.slug == wanted)
}

pub fn create_category(
    store: &mut Store,
    storage: &impl Storage,
    parameters: CreateCategoryParameters,
) -> Result<Category, CreateCategoryError> {
    let name = parameters.name.trim().to_string();
    // A name with nothing sluggable could never be looked up again
    if slugify(&name).is_empty() {
        return Err(CreateCategoryError::EmptyName);
    }
    if find_category(store, &name).is_some() {
        return Err(CreateCategoryError::CategoryAlreadyExists(name));
    }

    let parent_id = match parameters.parent {
        Some(parent) => Some(
            find_category(store, &parent)
                .map(|c| c.id)
                .ok_or(CreateCategoryError::ParentNotFound(parent))?,
        ),
        None => None,
    };

    let category = Category {
        id: Uuid::new_v4(),
        slug: slugify(&name),
        name,
        parent_id,
    };
    store.categories.push(category.clone());
    tracing::info!(slug = %category.slug, "category created");

    storage.save(store)?;

    Ok(category)
}

/// Parents first, children right after their parent, alphabetical within
/// a level.
pub fn list_categories(store: &Store) -> Vec<(usize, &Category)> {
    fn visit<'a>(
        store: &'a Store,
        parent: Option<Uuid>,
        depth: usize,
        out: &mut Vec<(usize, &'a Category)>,
    ) {
        let mut level: Vec<_> = store
            .categories
            .iter()
            .filter(|c| c.parent_id == parent)
            .collect();
        level.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        for category in level {
            out.push((depth, category));
            // Reference data is hand-curated; guard against a self-parent loop
            if depth < 8 {
                visit(store, Some(category.id), depth + 1, out);
            }
        }
    }

    let mut out = vec![];
    visit(store, None, 0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn create(store: &mut Store, storage: &MemoryStorage, name: &str, parent: Option<&str>) -> Category {
        create_category(
            store,
            storage,
            CreateCategoryParameters {
                name: name.to_string(),
                parent: parent.map(String::from),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_create_category_slugs_name() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();

        let category = create(&mut store, &storage, "Home Services", None);

        assert_eq!(category.slug, "home-services");
        assert_eq!(find_category(&store, "home services").map(|c| c.id), Some(category.id));
    }

    #[test]
    fn test_duplicate_and_missing_parent() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        create(&mut store, &storage, "Legal", None);

        let duplicate = create_category(
            &mut store,
            &storage,
            CreateCategoryParameters {
                name: String::from("legal"),
                parent: None,
            },
        );
        assert!(matches!(duplicate, Err(CreateCategoryError::CategoryAlreadyExists(_))));

        let orphan = create_category(
            &mut store,
            &storage,
            CreateCategoryParameters {
                name: String::from("Injury"),
                parent: Some(String::from("Medical")),
            },
        );
        assert!(matches!(orphan, Err(CreateCategoryError::ParentNotFound(_))));
    }

    #[test]
    fn test_punctuation_only_name_is_rejected() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();

        for name in ["!!!", "  ", "--"] {
            let result = create_category(
                &mut store,
                &storage,
                CreateCategoryParameters {
                    name: name.to_string(),
                    parent: None,
                },
            );
            assert!(matches!(result, Err(CreateCategoryError::EmptyName)));
        }
        assert!(store.categories.is_empty());
        assert_eq!(storage.saves.get(), 0);
    }

    #[test]
    fn test_list_is_a_tree() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        create(&mut store, &storage, "Legal", None);
        create(&mut store, &storage, "Home", None);
        create(&mut store, &storage, "Plumbing", Some("Home"));
        create(&mut store, &storage, "Injury", Some("legal"));

        let listed: Vec<_> = list_categories(&store)
            .into_iter()
            .map(|(depth, c)| (depth, c.name.as_str()))
            .collect();
        assert_eq!(
            listed,
            vec![(0, "Home"), (1, "Plumbing"), (0, "Legal"), (1, "Injury")]
        );
    }
}
