pub mod categories;
pub mod links;
pub mod view;
