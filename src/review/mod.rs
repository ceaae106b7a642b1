pub mod controller;
pub mod proxy;
pub mod session;
pub mod terminal;
