pub mod calendar;
pub mod datasource;
pub mod favorites;
