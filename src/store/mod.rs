// Postgres-backed document collections shared by the repositories
pub mod postgres;

pub use postgres::PgDocuments;
