use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Column order of the output file. Matches the field order of `ProductRecord`.
pub const CSV_HEADER: [&str; 9] = [
    "index", "title", "url", "price", "image", "shop", "min_order", "delivery", "rating",
];

/// One successfully extracted card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    pub index: usize,
    pub title: String,
    pub url: String,
    pub price: String,
    pub image: String,
    pub shop: String,
    pub min_order: String,
    pub delivery: String,
    pub rating: String,
}

/// Append-only, arrival-ordered record list. Owns the running output index.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<ProductRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next appended record will carry.
    pub fn next_index(&self) -> usize {
        self.records.len()
    }

    pub fn append(&mut self, record: ProductRecord) {
        debug_assert_eq!(record.index, self.next_index());
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    /// Header row plus one row per record, in store order. Written even
    /// when there are no records.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(CSV_HEADER)?;
        for record in self.records() {
            writer.serialize(record)?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
