//! Ordered, owned collection of input files.
//!
//! Insertion order is display order and assembly order. Mutation happens only
//! through `add_batch`, `remove_at` and `clear`; callers own the collection and
//! re-render the preview after each mutation.

use tracing::{debug, warn};

use super::file::InputFile;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct FileCollection {
    files: Vec<InputFile>,
}

impl FileCollection {
    pub const fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Append a batch of files after the existing entries.
    ///
    /// If any file in the batch has an unsupported media type the whole batch
    /// is discarded and the collection is left untouched. Returns the number of
    /// files added.
    pub fn add_batch(&mut self, batch: impl IntoIterator<Item = InputFile>) -> Result<usize> {
        let batch: Vec<InputFile> = batch.into_iter().collect();

        let rejected: Vec<String> = batch
            .iter()
            .filter(|f| f.category().is_none())
            .map(|f| format!("{} ({})", f.name(), f.media_type()))
            .collect();

        if !rejected.is_empty() {
            warn!("Discarding batch of {} file(s): {}", batch.len(), rejected.join(", "));
            return Err(Error::UnsupportedBatch { rejected });
        }

        let added = batch.len();
        self.files.extend(batch);
        debug!("Added {} file(s), collection now has {}", added, self.files.len());
        Ok(added)
    }

    /// Remove the file at `index`. Later entries shift down by one.
    pub fn remove_at(&mut self, index: usize) -> Result<InputFile> {
        if index >= self.files.len() {
            return Err(Error::InvalidIndex {
                index,
                len: self.files.len(),
            });
        }
        Ok(self.files.remove(index))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[InputFile] {
        &self.files
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InputFile> {
        self.files.iter()
    }
}

impl<'a> IntoIterator for &'a FileCollection {
    type Item = &'a InputFile;
    type IntoIter = std::slice::Iter<'a, InputFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn text(name: &str) -> InputFile {
        InputFile::new(name, "text/plain", name.as_bytes().to_vec())
    }

    fn names(collection: &FileCollection) -> Vec<&str> {
        collection.iter().map(InputFile::name).collect()
    }

    #[test]
    fn test_batches_append_in_order() {
        let mut collection = FileCollection::new();
        assert_eq!(collection.add_batch([text("a"), text("b")]).unwrap(), 2);
        assert_eq!(collection.add_batch([text("c")]).unwrap(), 1);
        assert_eq!(names(&collection), ["a", "b", "c"]);
    }

    #[test]
    fn test_duplicates_kept() {
        let mut collection = FileCollection::new();
        collection.add_batch([text("same"), text("same")]).unwrap();
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_unsupported_batch_rejected_in_full() {
        let mut collection = FileCollection::new();
        collection.add_batch([text("keep")]).unwrap();

        let result = collection.add_batch([
            InputFile::new("page.html", "text/html", Vec::new()),
            InputFile::new("sheet.xlsx", "application/vnd.ms-excel", Vec::new()),
        ]);

        match result {
            Err(Error::UnsupportedBatch { rejected }) => assert_eq!(rejected.len(), 2),
            other => panic!("expected UnsupportedBatch, got {other:?}"),
        }
        assert_eq!(names(&collection), ["keep"]);
    }

    #[test]
    fn test_mixed_batch_rejected_in_full() {
        let mut collection = FileCollection::new();
        let result = collection.add_batch([
            text("fine"),
            InputFile::new("movie.mp4", "video/mp4", Vec::new()),
        ]);
        assert!(result.is_err());
        assert!(collection.is_empty());
    }

    #[test]
    fn test_remove_shifts_later_entries() {
        let mut collection = FileCollection::new();
        collection
            .add_batch([text("a"), text("b"), text("c"), text("d")])
            .unwrap();

        let removed = collection.remove_at(1).unwrap();
        assert_eq!(removed.name(), "b");
        assert_eq!(names(&collection), ["a", "c", "d"]);

        // Index 1 now refers to what used to be index 2
        collection.remove_at(1).unwrap();
        assert_eq!(names(&collection), ["a", "d"]);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut collection = FileCollection::new();
        collection.add_batch([text("only")]).unwrap();
        assert!(matches!(
            collection.remove_at(1),
            Err(Error::InvalidIndex { index: 1, len: 1 })
        ));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut collection = FileCollection::new();
        collection.add_batch([text("a"), text("b")]).unwrap();
        collection.clear();
        assert!(collection.is_empty());
    }
}
