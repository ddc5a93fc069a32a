mod connection;
mod versioned_schema;

pub use connection::{is_constraint_violation, now_unix, open_versioned_db};
pub use versioned_schema::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};
