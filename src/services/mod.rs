//! Services Layer
//!
//! Business entry points called by the HTTP handlers and by embedders.

pub mod bulk_operation_service;

pub use bulk_operation_service::BulkOperationService;
