pub mod auth;
pub mod health;
pub mod programs;
pub mod swagger;
pub mod users;
