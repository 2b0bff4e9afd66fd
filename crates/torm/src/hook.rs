//! Statement audit hooks.
//!
//! Every statement a builder executes is reported to an [`AuditHook`] right
//! before it is sent. Hooks observe only; they cannot change the outcome.

use crate::error::{OrmError, OrmResult};
use serde::Deserialize;
use std::fmt;
use tokio_postgres::types::ToSql;
use tracing::Level;

/// The kind of statement being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Observer for statements about to be executed.
pub trait AuditHook: Send + Sync {
    fn on_statement(&self, kind: StatementKind, sql: &str, args: &[&(dyn ToSql + Sync)]);
}

/// Hook that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl AuditHook for NoopHook {
    fn on_statement(&self, _kind: StatementKind, _sql: &str, _args: &[&(dyn ToSql + Sync)]) {}
}

/// How much statement auditing to emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum Verbosity {
    Off,
    #[default]
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    /// Map a numeric level: 0 off, 1 info, 2 debug, 3 trace.
    pub fn from_level(level: u8) -> OrmResult<Self> {
        match level {
            0 => Ok(Self::Off),
            1 => Ok(Self::Info),
            2 => Ok(Self::Debug),
            3 => Ok(Self::Trace),
            _ => Err(OrmError::validation(
                "verbose level must be in range of 0 to 3",
            )),
        }
    }

    /// The tracing level statements are emitted at, if any.
    pub fn level(self) -> Option<Level> {
        match self {
            Self::Off => None,
            Self::Info => Some(Level::INFO),
            Self::Debug => Some(Level::DEBUG),
            Self::Trace => Some(Level::TRACE),
        }
    }
}

impl TryFrom<u8> for Verbosity {
    type Error = OrmError;

    fn try_from(level: u8) -> OrmResult<Self> {
        Self::from_level(level)
    }
}

/// A `tracing`-based hook that emits the SQL and bound values of every statement.
#[derive(Debug, Clone)]
pub struct TracingHook {
    /// Tracing event level to emit at. `None` disables output.
    pub level: Option<Level>,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingHook {
    fn default() -> Self {
        Self {
            level: Some(Level::INFO),
            max_sql_length: Some(500),
        }
    }
}

impl TracingHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hook emitting at the level `verbosity` maps to.
    pub fn from_verbosity(verbosity: Verbosity) -> Self {
        Self {
            level: verbosity.level(),
            ..Self::default()
        }
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql<'s>(&self, sql: &'s str) -> std::borrow::Cow<'s, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => {
                let mut end = max;
                while end > 0 && !sql.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...", &sql[..end]).into()
            }
            _ => sql.into(),
        }
    }
}

impl AuditHook for TracingHook {
    fn on_statement(&self, kind: StatementKind, sql: &str, args: &[&(dyn ToSql + Sync)]) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let Some(level) = self.level else {
            return;
        };
        let sql = self.truncate_sql(sql);
        emit_at_level!(
            level,
            target: "torm.sql",
            kind = %kind,
            param_count = args.len(),
            sql = %sql,
            args = ?args,
        );
    }
}
