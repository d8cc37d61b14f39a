pub mod entities;
pub mod reconcile;
pub mod scheduler;
pub mod store;
