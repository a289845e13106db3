pub mod contracts;
pub mod health;
pub mod magic;
pub mod users;
