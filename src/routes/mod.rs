pub mod admin;
pub mod college;
pub mod employer;
pub mod health;
pub mod notifications;
