pub mod db;
pub mod notify;
pub mod redis;
pub mod wake;
