pub mod auth;
pub mod prefab;
pub mod shared;
