pub mod exercise;
pub mod glucose;
pub mod intent;
pub mod meal;
pub mod user;
