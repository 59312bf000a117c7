/// One image declared in the project file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Position of the declaration among all image lines, starting at 0.
    pub index: usize,
    /// The path exactly as written between the quotes of the `n` token.
    pub path: String,
}

/// Ordered list of declared images.
///
/// Indices are handed out in declaration order and are the only image
/// identifiers used by the rest of the pipeline. Duplicate paths are kept
/// as separate records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageRegistry {
    records: Vec<ImageRecord>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record for `path` and returns its index.
    pub fn push(&mut self, path: impl Into<String>) -> usize {
        let index = self.records.len();
        self.records.push(ImageRecord {
            index,
            path: path.into(),
        });
        index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }
}

impl<'a> IntoIterator for &'a ImageRegistry {
    type Item = &'a ImageRecord;
    type IntoIter = std::slice::Iter<'a, ImageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
