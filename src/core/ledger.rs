//! In-memory list of processed-image records.
//!
//! Records stay until removed one by one or cleared; nothing is evicted.

use crate::core::{ImageStatus, ProcessedImage, ProcessedImageUpdate};

#[derive(Debug, Default)]
pub struct ResultLedger {
    records: Vec<ProcessedImage>,
}

impl ResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: ProcessedImage) {
        self.records.push(record);
    }

    /// Merges `update` into the record with `id`. Returns false if unknown.
    pub fn update(&mut self, id: &str, update: ProcessedImageUpdate) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.apply(update);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<ProcessedImage> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    pub fn clear_all(&mut self) {
        self.records.clear();
    }

    pub fn get(&self, id: &str) -> Option<&ProcessedImage> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[ProcessedImage] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count(&self, status: ImageStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }
}
