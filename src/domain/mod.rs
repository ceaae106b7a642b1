pub mod settings;
pub mod ticket;
