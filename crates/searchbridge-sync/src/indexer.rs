//! Document indexing hooks.

use serde_json::Value;

use searchbridge_core::{
    AccessMode, Document, DocumentFilter, FieldType, Index, Item, normalize,
};

use crate::backend::TypesenseBackend;

/// Notice shown when some items of a batch could not be indexed.
pub const INDEX_ERROR: &str = "Unable to index items.";

/// Build the document for an item: its `id` plus one normalized value per field.
pub fn build_document(item: &Item) -> Document {
    let mut document = Document::new(item.id.clone());
    for field in &item.fields {
        let field_type = FieldType::from_host_type(&field.field_type);
        document.insert(field.name.clone(), normalize(&field.values, field_type));
    }
    document
}

impl TypesenseBackend {
    /// Submit items one document at a time; returns the ids the engine accepted.
    ///
    /// A rejected document is logged and left out of the result. The rest of
    /// the batch is still submitted.
    pub async fn index_items(&self, index: &Index, items: &[Item]) -> Vec<String> {
        let Some(write) = self.credentials(AccessMode::ReadWrite) else {
            log::debug!("Typesense credentials incomplete, not indexing");
            return Vec::new();
        };

        let collection = index.collection_name();
        let mut indexed = Vec::with_capacity(items.len());
        let mut failed = 0usize;

        for item in items {
            let document = build_document(item);
            match self
                .engine()
                .create_document(&write, &collection, &document)
                .await
            {
                Ok(Value::Object(_)) => indexed.push(item.id.clone()),
                Ok(other) => {
                    log::warn!("Item '{}' not indexed, engine returned {other}", item.id);
                    failed += 1;
                }
                Err(e) => {
                    log::error!("Item '{}' not indexed: {e}", item.id);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            log::warn!(
                "Indexed {} of {} item(s) into '{collection}'",
                indexed.len(),
                items.len()
            );
            self.notifier().error(INDEX_ERROR);
        }

        indexed
    }

    /// Delete documents by item id; returns how many the engine removed.
    pub async fn delete_items(&self, index: &Index, item_ids: &[String]) -> u64 {
        if item_ids.is_empty() {
            return 0;
        }
        let Some(write) = self.credentials(AccessMode::ReadWrite) else {
            return 0;
        };

        let filter = DocumentFilter::ids(item_ids.iter().cloned());
        match self
            .engine()
            .delete_documents(&write, &index.collection_name(), &filter)
            .await
        {
            Ok(deleted) => deleted,
            Err(e) => {
                self.fail(
                    &format!("Unable to delete items {}.", item_ids.join(", ")),
                    &e,
                );
                0
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
