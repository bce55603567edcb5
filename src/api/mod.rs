pub mod crud;
pub mod health;
