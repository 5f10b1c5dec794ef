pub mod analytics;
pub mod bulk;
pub mod campaigns;
pub mod categories;
pub mod editor;
pub mod export;
pub mod filters;
pub mod keywords;
pub mod locations;
pub mod menu;
