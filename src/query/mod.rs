//! Request model shared by the tiers.
//!
//! # Data Flow
//! ```text
//! JSON body {type, query, strategy?}
//!     → validation.rs (shape, enums, defaults)
//!     → ValidatedRequest
//!
//! SQL text
//!     → QueryKind::classify (leading `select` → Read, anything else → Write)
//! ```

pub mod validation;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use validation::{validate_body, ValidatedRequest};

/// Read/write classification of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Read,
    Write,
}

impl QueryKind {
    /// Classify by leading keyword: a statement is a read iff it starts with
    /// `select` (case-insensitive, leading whitespace ignored).
    pub fn classify(query: &str) -> Self {
        let trimmed = query.trim_start();
        match trimmed.get(..6) {
            Some(prefix) if prefix.eq_ignore_ascii_case("select") => QueryKind::Read,
            _ => QueryKind::Write,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Read => "read",
            QueryKind::Write => "write",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(QueryKind::Read),
            "write" => Ok(QueryKind::Write),
            _ => Err(()),
        }
    }
}

/// Backend selection strategy named by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Everything goes to the manager.
    #[default]
    Direct,
    /// Reads go to a uniformly random worker.
    Random,
    /// Reads go to the most responsive worker.
    Customized,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Direct, Strategy::Random, Strategy::Customized];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Direct => "direct",
            Strategy::Random => "random",
            Strategy::Customized => "customized",
        }
    }

    /// Router endpoint serving this strategy.
    pub fn path(&self) -> &'static str {
        match self {
            Strategy::Direct => "/direct",
            Strategy::Random => "/random",
            Strategy::Customized => "/customized",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Strategy::Direct),
            "random" => Ok(Strategy::Random),
            "customized" => Ok(Strategy::Customized),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_select() {
        assert_eq!(QueryKind::classify("SELECT * FROM actor LIMIT 10;"), QueryKind::Read);
        assert_eq!(QueryKind::classify("  select 1"), QueryKind::Read);
        assert_eq!(QueryKind::classify("\n\tSeLeCt count(*) FROM film"), QueryKind::Read);
    }

    #[test]
    fn test_classify_everything_else_is_write() {
        assert_eq!(
            QueryKind::classify("INSERT INTO actor (first_name) VALUES ('JOHN')"),
            QueryKind::Write
        );
        assert_eq!(QueryKind::classify("UPDATE actor SET first_name = 'A'"), QueryKind::Write);
        assert_eq!(QueryKind::classify("SHOW TABLES"), QueryKind::Write);
        assert_eq!(QueryKind::classify("sel"), QueryKind::Write);
        assert_eq!(QueryKind::classify(""), QueryKind::Write);
    }

    #[test]
    fn test_classify_multibyte_prefix() {
        // Slicing must not panic on a char boundary.
        assert_eq!(QueryKind::classify("séléct 1"), QueryKind::Write);
    }

    #[test]
    fn test_strategy_round_names() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.as_str().parse::<Strategy>(), Ok(strategy));
            assert_eq!(strategy.path(), format!("/{}", strategy));
        }
        assert!("fastest".parse::<Strategy>().is_err());
    }
}
