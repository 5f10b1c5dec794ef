pub mod campaign;
pub mod category;
pub mod keyword;
pub mod location;
pub mod menu;
pub mod store;
