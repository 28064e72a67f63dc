//! Bounded in-memory log of executed statements, for diagnostics.

/// Query log with overflow accounting.
///
/// Below capacity each recorded statement becomes its own entry; once
/// capacity is reached a single aggregate entry absorbs further records and
/// reports how many were omitted. Disabled logs record nothing.
#[derive(Debug, Clone)]
pub struct QueryLog {
    enabled: bool,
    max: usize,
    entries: Vec<String>,
    omitted: u64,
}

impl QueryLog {
    #[must_use]
    pub fn new(enabled: bool, max: usize) -> Self {
        Self {
            enabled,
            max,
            entries: Vec::new(),
            omitted: 0,
        }
    }

    /// Whether recording is active.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Record a statement, rendered as `sql` or `sql -- note`.
    pub fn record(&mut self, sql: &str, note: Option<&str>) {
        if !self.enabled {
            return;
        }
        if self.entries.len() < self.max {
            let entry = match note {
                Some(note) => format!("{sql} -- {note}"),
                None => sql.to_string(),
            };
            self.entries.push(entry);
            return;
        }
        self.omitted += 1;
        let aggregate = format!("{} additional queries omitted", self.omitted);
        if self.entries.len() == self.max {
            self.entries.push(aggregate);
        } else if let Some(last) = self.entries.last_mut() {
            *last = aggregate;
        }
    }

    /// The recorded entries. No side effects.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// How many statements were absorbed into the aggregate entry.
    #[must_use]
    pub fn omitted(&self) -> u64 {
        self.omitted
    }

    /// Drop all entries and reset the overflow counter.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.omitted = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_with_and_without_note() {
        let mut log = QueryLog::new(true, 10);
        log.record("SELECT 1", None);
        log.record("SELECT 2", Some("warmup"));
        assert_eq!(log.entries(), ["SELECT 1", "SELECT 2 -- warmup"]);
    }

    #[test]
    fn overflow_collapses_into_single_aggregate() {
        let mut log = QueryLog::new(true, 2);
        for i in 0..5 {
            log.record(&format!("SELECT {i}"), None);
        }
        assert_eq!(
            log.entries(),
            ["SELECT 0", "SELECT 1", "3 additional queries omitted"]
        );
        assert_eq!(log.omitted(), 3);

        log.record("SELECT 5", None);
        assert_eq!(
            log.entries(),
            ["SELECT 0", "SELECT 1", "4 additional queries omitted"]
        );
        assert_eq!(log.omitted(), 4);
    }

    #[test]
    fn disabled_log_records_nothing() {
        let mut log = QueryLog::new(false, 2);
        log.record("SELECT 1", None);
        assert!(log.entries().is_empty());
        assert_eq!(log.omitted(), 0);
    }

    #[test]
    fn clear_resets_overflow_accounting() {
        let mut log = QueryLog::new(true, 1);
        log.record("SELECT 1", None);
        log.record("SELECT 2", None);
        assert_eq!(log.omitted(), 1);
        log.clear();
        assert!(log.entries().is_empty());
        log.record("SELECT 3", None);
        assert_eq!(log.entries(), ["SELECT 3"]);
    }
}
