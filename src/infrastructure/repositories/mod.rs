//! Repository implementations using SeaORM

pub mod figure_repository;
pub mod operation_repository;
pub mod user_repository;

pub use figure_repository::SeaOrmFigureRepository;
pub use operation_repository::SeaOrmOperationRepository;
pub use user_repository::SeaOrmUserRepository;
