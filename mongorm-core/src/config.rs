//! Per-model configuration registered with a [`Client`](crate::client::Client) at startup.

use tracing::warn;

use crate::{
    error::{MongOrmError, MongOrmResult},
    index::Index,
    model::Model,
};

/// The collection name and declared indexes of one model type.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    collection: String,
    indexes: Vec<Index>,
}

impl ModelConfig {
    /// A configuration for `collection` with no indexes.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            indexes: Vec::new(),
        }
    }

    /// The configuration declared by the model's [`Model`] impl.
    pub fn of<M: Model>() -> Self {
        Self {
            collection: M::collection_name().to_string(),
            indexes: M::indexes(),
        }
    }

    /// Adds an index descriptor.
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Every declared descriptor, including malformed ones.
    pub fn declared_indexes(&self) -> &[Index] {
        &self.indexes
    }

    /// The usable index descriptors.
    ///
    /// Malformed descriptors are skipped with a warning so that one bad declaration
    /// does not block startup.
    pub fn list_indexes(&self) -> Vec<Index> {
        self.indexes
            .iter()
            .enumerate()
            .filter(|(position, index)| {
                let usable = index.is_well_formed();
                if !usable {
                    warn!(
                        collection = %self.collection,
                        position,
                        keys = %index.keys(),
                        "Skipping malformed index declaration"
                    );
                }
                usable
            })
            .map(|(_, index)| index.clone())
            .collect()
    }

    pub(crate) fn validate<M>(&self) -> MongOrmResult<()> {
        if self.collection.trim().is_empty() {
            return Err(MongOrmError::MissingConfiguration {
                model: std::any::type_name::<M>(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexKind;
    use std::{
        io::Write,
        sync::{Arc, Mutex},
    };
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn list_indexes_skips_malformed() {
        let config = ModelConfig::new("widgets")
            .index(Index::new("name").unique(true))
            .index(Index::new(""))
            .index(Index::new("owner").compound_with("owner", IndexKind::Descending))
            .index(Index::new("created").expire_after_seconds(30));

        assert_eq!(config.declared_indexes().len(), 4);

        let usable = config.list_indexes();
        let fields: Vec<_> = usable.iter().map(Index::field).collect();
        assert_eq!(fields, vec!["name", "created"]);
    }

    #[test]
    fn skipping_malformed_index_warns() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();

        let config = ModelConfig::new("widgets")
            .index(Index::new("name"))
            .index(Index::new(""));
        let usable = tracing::subscriber::with_default(subscriber, || config.list_indexes());

        assert_eq!(usable.len(), 1);

        let output = logs.contents();
        assert_eq!(output.matches("Skipping malformed index declaration").count(), 1);
        assert!(output.contains("WARN"));
        assert!(output.contains("collection=widgets"));
        assert!(output.contains("position=1"));
    }

    #[test]
    fn empty_collection_is_missing_configuration() {
        let err = ModelConfig::new("  ").validate::<String>().unwrap_err();
        assert!(matches!(err, MongOrmError::MissingConfiguration { .. }));

        assert!(ModelConfig::new("widgets").validate::<String>().is_ok());
    }
}
