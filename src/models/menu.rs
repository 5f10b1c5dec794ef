use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MenuConfig {
    pub sections: Vec<MenuSection>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MenuSection {
    pub id: String,
    pub title: String,
    pub visible: bool,
    pub items: Vec<MenuItem>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    pub path: String,
    /// Icon name understood by the front end
    pub icon: Option<String>,
    pub visible: bool,
}

impl MenuItem {
    fn new(id: &str, label: &str, path: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            path: path.to_string(),
            icon: Some(icon.to_string()),
            visible: true,
        }
    }
}

impl MenuSection {
    fn new(id: &str, title: &str, items: Vec<MenuItem>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            visible: true,
            items,
        }
    }
}

impl MenuConfig {
    pub fn section(&self, id: &str) -> Option<&MenuSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_mut(&mut self, id: &str) -> Option<&mut MenuSection> {
        self.sections.iter_mut().find(|s| s.id == id)
    }

    pub fn visible_sections(&self) -> impl Iterator<Item = &MenuSection> {
        self.sections.iter().filter(|s| s.visible)
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            sections: vec![
                MenuSection::new(
                    "main",
                    "Main",
                    vec![
                        MenuItem::new("dashboard", "Dashboard", "/", "layout-dashboard"),
                        MenuItem::new("campaigns", "Campaigns", "/campaigns", "megaphone"),
                        MenuItem::new("keywords", "Keywords", "/keywords", "key"),
                    ],
                ),
                MenuSection::new(
                    "targeting",
                    "Targeting",
                    vec![
                        MenuItem::new("locations", "Locations", "/locations", "map-pin"),
                        MenuItem::new("location-lists", "Saved Lists", "/locations/lists", "list"),
                        MenuItem::new("scheduler", "Scheduler", "/scheduler", "calendar"),
                    ],
                ),
                MenuSection::new(
                    "insights",
                    "Insights",
                    vec![
                        MenuItem::new("analytics", "Analytics", "/analytics", "bar-chart"),
                        MenuItem::new("exports", "Exports", "/exports", "download"),
                    ],
                ),
                MenuSection::new(
                    "admin",
                    "Admin",
                    vec![
                        MenuItem::new("categories", "Categories", "/admin/categories", "tags"),
                        MenuItem::new("menu", "Menu Settings", "/admin/menu", "settings"),
                    ],
                ),
            ],
        }
    }
}
