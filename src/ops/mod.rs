pub mod drag;
pub mod edit;
pub mod store;
pub mod task_ops;
pub mod undo;
pub mod view;
