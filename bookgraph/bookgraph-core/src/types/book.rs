//! Book nodes.

use crate::id::BookId;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Descriptive attributes of a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
}

impl BookDetails {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: None,
        }
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }
}

/// A persisted book. Equality is by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    id: BookId,
    #[serde(flatten)]
    details: BookDetails,
}

impl Book {
    pub fn new(id: BookId, details: BookDetails) -> Self {
        Self { id, details }
    }

    pub fn id(&self) -> &BookId {
        &self.id
    }

    pub fn details(&self) -> &BookDetails {
        &self.details
    }

    pub fn title(&self) -> &str {
        &self.details.title
    }

    pub fn author(&self) -> &str {
        &self.details.author
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Book {}

impl Hash for Book {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
