//! Memoized table list, stopword set, and engine variable lookups.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use tracing::warn;

use crate::cache::{STOPWORD_CACHE_KEY, STOPWORD_CACHE_TTL};
use crate::client::{Connector, Statement};
use crate::error::StewardError;
use crate::manager::ConnectionManager;
use crate::sanitize::{escape_identifier, escape_like_pattern};
use crate::types::SqlValue;

/// Storage engine families the metadata layer distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageEngine {
    InnoDb,
    MyIsam,
    Other(String),
}

impl StorageEngine {
    #[must_use]
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("innodb") {
            StorageEngine::InnoDb
        } else if name.eq_ignore_ascii_case("myisam") {
            StorageEngine::MyIsam
        } else {
            StorageEngine::Other(name.to_string())
        }
    }

    /// Only InnoDB supports transactions.
    #[must_use]
    pub fn is_transactional(&self) -> bool {
        matches!(self, StorageEngine::InnoDb)
    }
}

/// Fulltext variables whose names differ between the MyISAM and InnoDB
/// engines; substitution maps the MyISAM name to its InnoDB equivalent.
const VARIABLE_ALIASES: &[(&str, &str)] = &[
    ("ft_min_word_len", "innodb_ft_min_token_size"),
    ("ft_max_word_len", "innodb_ft_max_token_size"),
    ("ft_stopword_file", "innodb_ft_server_stopword_table"),
];

/// Default English stopword set used for MyISAM fulltext searches.
static BUILTIN_STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "an", "are", "as", "at", "be", "by", "com", "de", "en", "for", "from",
        "how", "i", "in", "is", "it", "la", "of", "on", "or", "that", "the", "this", "to",
        "und", "was", "what", "when", "where", "who", "will", "with", "www",
    ]
    .into_iter()
    .collect()
});

/// Per-manager metadata caches, invalidated only by explicit bypass.
#[derive(Debug, Default)]
pub(crate) struct MetadataCache {
    pub(crate) tables: Option<Vec<String>>,
    pub(crate) variables: HashMap<String, Option<String>>,
    pub(crate) stopwords: Option<HashSet<String>>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Live table names of the current database; memoized unless
    /// `use_cache` is `false`.
    ///
    /// # Errors
    /// Propagates connection and query errors.
    pub async fn list_tables(&mut self, use_cache: bool) -> Result<Vec<String>, StewardError> {
        if use_cache && let Some(tables) = &self.meta.tables {
            return Ok(tables.clone());
        }
        let stmt = Statement::new("SHOW TABLES").with_note("table list");
        let result = self.query(&stmt, &[]).await?;
        let tables: Vec<String> = result
            .rows
            .iter()
            .filter_map(|row| row.get_by_index(0).and_then(SqlValue::as_text))
            .map(str::to_string)
            .collect();
        self.meta.tables = Some(tables.clone());
        Ok(tables)
    }

    /// Whether a table exists. Always a live lookup.
    ///
    /// # Errors
    /// Propagates connection and query errors.
    pub async fn table_exists(&mut self, name: &str) -> Result<bool, StewardError> {
        let sql = format!("SHOW TABLES LIKE '{}'", escape_like_pattern(name));
        let result = self.query(&Statement::new(sql), &[]).await?;
        Ok(!result.rows.is_empty())
    }

    /// Whether a column exists on a table. Any failure (absent table
    /// included) reports `false` rather than propagating; `verbose` logs the
    /// underlying error.
    pub async fn column_exists(&mut self, table: &str, column: &str, verbose: bool) -> bool {
        let sql = format!(
            "SHOW COLUMNS FROM `{}` LIKE '{}'",
            escape_identifier(table),
            escape_like_pattern(column)
        );
        match self.query(&Statement::new(sql).with_note("column probe"), &[]).await {
            Ok(result) => !result.rows.is_empty(),
            Err(err) => {
                if verbose {
                    warn!(table, column, error = %err, "column existence probe failed");
                }
                false
            }
        }
    }

    /// The effective default storage engine.
    ///
    /// # Errors
    /// Propagates connection and query errors.
    pub async fn storage_engine(&mut self) -> Result<StorageEngine, StewardError> {
        let value = self
            .engine_variable("default_storage_engine", true, false)
            .await?;
        Ok(StorageEngine::parse(value.as_deref().unwrap_or_default()))
    }

    /// Whether transactions are supported: by the default storage engine, or
    /// by the named table's engine when `table` is given.
    ///
    /// # Errors
    /// Propagates connection and query errors.
    pub async fn supports_transaction(
        &mut self,
        table: Option<&str>,
    ) -> Result<bool, StewardError> {
        let engine = match table {
            None => self.storage_engine().await?,
            Some(table) => {
                let sql = format!("SHOW TABLE STATUS LIKE '{}'", escape_like_pattern(table));
                let result = self
                    .query(&Statement::new(sql).with_note("engine probe"), &[])
                    .await?;
                match result
                    .rows
                    .first()
                    .and_then(|row| row.get("Engine"))
                    .and_then(SqlValue::as_text)
                {
                    Some(name) => StorageEngine::parse(name),
                    None => return Ok(false),
                }
            }
        };
        Ok(engine.is_transactional())
    }

    /// Whether a word is a fulltext stopword for the effective engine,
    /// case-insensitively.
    ///
    /// MyISAM consults the built-in list; InnoDB lazily loads the
    /// server-reported default stopword set, caching it in-process and in
    /// the durable cache when one is installed.
    ///
    /// # Errors
    /// Propagates connection and query errors from the lazy InnoDB load.
    pub async fn is_stopword(&mut self, word: &str) -> Result<bool, StewardError> {
        let needle = word.to_lowercase();
        if self.storage_engine().await? != StorageEngine::InnoDb {
            return Ok(BUILTIN_STOPWORDS.contains(needle.as_str()));
        }
        if self.meta.stopwords.is_none() {
            let set = self.load_innodb_stopwords().await?;
            self.meta.stopwords = Some(set);
        }
        Ok(self
            .meta
            .stopwords
            .as_ref()
            .is_some_and(|set| set.contains(&needle)))
    }

    async fn load_innodb_stopwords(&mut self) -> Result<HashSet<String>, StewardError> {
        if let Some(cache) = &self.stopword_cache
            && let Some(raw) = cache.get(STOPWORD_CACHE_KEY).await
            && let Ok(words) = serde_json::from_str::<Vec<String>>(&raw)
        {
            return Ok(words.into_iter().map(|w| w.to_lowercase()).collect());
        }

        let stmt = Statement::new(
            "SELECT value FROM INFORMATION_SCHEMA.INNODB_FT_DEFAULT_STOPWORD",
        )
        .with_note("stopword list");
        let result = self.query(&stmt, &[]).await?;
        let words: Vec<String> = result
            .rows
            .iter()
            .filter_map(|row| row.get_by_index(0).and_then(SqlValue::as_text))
            .map(str::to_lowercase)
            .collect();

        if let Some(cache) = &self.stopword_cache
            && let Ok(serialized) = serde_json::to_string(&words)
        {
            cache
                .set(STOPWORD_CACHE_KEY, &serialized, STOPWORD_CACHE_TTL)
                .await;
        }
        Ok(words.into_iter().collect())
    }

    /// Look up a server variable via `SHOW VARIABLES`, memoized by the
    /// (possibly substituted) variable name.
    ///
    /// With `allow_substitution`, MyISAM fulltext variable names are swapped
    /// for their InnoDB equivalents when the effective engine is InnoDB.
    ///
    /// # Errors
    /// Propagates connection and query errors.
    pub async fn engine_variable(
        &mut self,
        name: &str,
        use_cache: bool,
        allow_substitution: bool,
    ) -> Result<Option<String>, StewardError> {
        let lookup = if allow_substitution {
            self.substitute_variable(name).await?
        } else {
            name.to_string()
        };
        if use_cache && let Some(value) = self.meta.variables.get(&lookup) {
            return Ok(value.clone());
        }
        // Variable names are identifier-shaped; LIKE-escaping their
        // underscores would stop the server-side match.
        let sql = format!("SHOW VARIABLES LIKE '{}'", escape_identifier(&lookup));
        let result = self
            .query(&Statement::new(sql).with_note("engine variable"), &[])
            .await?;
        let value = result
            .rows
            .first()
            .and_then(|row| row.get("Value"))
            .and_then(SqlValue::as_text)
            .map(str::to_string);
        self.meta.variables.insert(lookup, value.clone());
        Ok(value)
    }

    async fn substitute_variable(&mut self, name: &str) -> Result<String, StewardError> {
        if let Some((_, alias)) = VARIABLE_ALIASES.iter().find(|(from, _)| *from == name)
            && Box::pin(self.storage_engine()).await? == StorageEngine::InnoDb
        {
            return Ok((*alias).to_string());
        }
        Ok(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_parse_is_case_insensitive() {
        assert_eq!(StorageEngine::parse("InnoDB"), StorageEngine::InnoDb);
        assert_eq!(StorageEngine::parse("INNODB"), StorageEngine::InnoDb);
        assert_eq!(StorageEngine::parse("MyISAM"), StorageEngine::MyIsam);
        assert_eq!(
            StorageEngine::parse("Aria"),
            StorageEngine::Other("Aria".to_string())
        );
    }

    #[test]
    fn only_innodb_is_transactional() {
        assert!(StorageEngine::InnoDb.is_transactional());
        assert!(!StorageEngine::MyIsam.is_transactional());
        assert!(!StorageEngine::Other("Memory".to_string()).is_transactional());
    }

    #[test]
    fn builtin_stopwords_cover_common_words() {
        assert!(BUILTIN_STOPWORDS.contains("the"));
        assert!(BUILTIN_STOPWORDS.contains("with"));
        assert!(!BUILTIN_STOPWORDS.contains("database"));
    }
}
