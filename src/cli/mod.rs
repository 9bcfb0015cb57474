pub mod dashboard;
pub mod persona;
pub mod projections;
pub mod setup;
pub mod table;
pub mod ui;
