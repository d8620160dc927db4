pub mod bulk_operation;
pub mod event;
pub mod figure;
pub mod user;
