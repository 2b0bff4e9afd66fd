//! Convenient imports for typical `torm` usage.
//!
//! ```ignore
//! use torm::prelude::*;
//! ```

pub use crate::{
    FromRow, GenericClient, Handler, Orm, OrmConfig, OrmError, OrmResult, Params, Record,
    Registry, RowExt, Sql, TxOptions, transaction,
};
