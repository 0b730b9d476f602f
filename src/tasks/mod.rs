//! Task Module
//! Mission: Task records and their SQLite storage

pub mod models;
pub mod store;

pub use models::{Task, TaskCreate, TaskUpdate};
pub use store::TaskStore;
