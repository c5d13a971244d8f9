//! Book persistence.
//!
//! [`BookStore`] is the seam between the route handlers and the document
//! store: handlers are written against the trait so they can be exercised
//! against [`MemoryBookStore`] without a running MongoDB.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Collection, Database};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use folio_http::error::AppError;

use super::models::{Book, BookUpdate, NewBook};

const COLLECTION_NAME: &str = "books";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database failure: {0}")]
    Database(#[from] mongodb::error::Error),
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        AppError::Internal(error.into())
    }
}

/// Primitive document operations the book handlers are built on.
///
/// Identifiers are exact-match string keys; no coercion to a native store
/// id type is performed anywhere.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new book, assigning its identifier. Returns the id.
    async fn insert(&self, new_book: NewBook) -> Result<String, StoreError>;

    /// Look up a single book whose key equals `id`.
    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, StoreError>;

    /// Return up to `limit` books in the store's natural iteration order.
    async fn list(&self, limit: i64) -> Result<Vec<Book>, StoreError>;

    /// Apply the non-null fields of `patch` to the book matching `id`.
    /// Returns the number of documents the store reports as modified.
    async fn update(&self, id: &str, patch: &BookUpdate) -> Result<u64, StoreError>;

    /// Delete the book matching `id`. Returns the number of deleted documents.
    async fn delete(&self, id: &str) -> Result<u64, StoreError>;
}

/// `$set` document holding only the fields the patch actually carries.
fn set_document(patch: &BookUpdate) -> Document {
    let mut set = Document::new();
    if let Some(title) = &patch.title {
        set.insert("title", title.as_str());
    }
    if let Some(author) = &patch.author {
        set.insert("author", author.as_str());
    }
    if let Some(synopsis) = &patch.synopsis {
        set.insert("synopsis", synopsis.as_str());
    }
    set
}

/// MongoDB-backed store over the `books` collection.
pub struct MongoBookStore {
    collection: Collection<Book>,
}

impl MongoBookStore {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(COLLECTION_NAME),
        }
    }
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn insert(&self, new_book: NewBook) -> Result<String, StoreError> {
        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: new_book.title,
            author: new_book.author,
            synopsis: new_book.synopsis,
        };
        let id = book.id.clone();

        self.collection.insert_one(book).await?;
        Ok(id)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let book = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(book)
    }

    async fn list(&self, limit: i64) -> Result<Vec<Book>, StoreError> {
        let cursor = self.collection.find(doc! {}).limit(limit).await?;
        let books = cursor.try_collect().await?;
        Ok(books)
    }

    async fn update(&self, id: &str, patch: &BookUpdate) -> Result<u64, StoreError> {
        let result = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": set_document(patch) })
            .await?;
        Ok(result.modified_count)
    }

    async fn delete(&self, id: &str) -> Result<u64, StoreError> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count)
    }
}

/// In-process store used by the handler tests.
///
/// Mirrors MongoDB's update semantics: a matched document whose fields
/// already equal the patch values counts as zero modified.
#[derive(Default)]
pub struct MemoryBookStore {
    books: Mutex<Vec<Book>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn insert(&self, new_book: NewBook) -> Result<String, StoreError> {
        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: new_book.title,
            author: new_book.author,
            synopsis: new_book.synopsis,
        };
        let id = book.id.clone();

        self.books.lock().await.push(book);
        Ok(id)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Book>, StoreError> {
        let books = self.books.lock().await;
        Ok(books.iter().find(|book| book.id == id).cloned())
    }

    async fn list(&self, limit: i64) -> Result<Vec<Book>, StoreError> {
        let books = self.books.lock().await;
        Ok(books.iter().take(limit as usize).cloned().collect())
    }

    async fn update(&self, id: &str, patch: &BookUpdate) -> Result<u64, StoreError> {
        let mut books = self.books.lock().await;
        let Some(book) = books.iter_mut().find(|book| book.id == id) else {
            return Ok(0);
        };

        let mut modified = 0;
        if let Some(title) = &patch.title {
            if book.title != *title {
                book.title = title.clone();
                modified = 1;
            }
        }
        if let Some(author) = &patch.author {
            if book.author != *author {
                book.author = author.clone();
                modified = 1;
            }
        }
        if let Some(synopsis) = &patch.synopsis {
            if book.synopsis.as_deref() != Some(synopsis) {
                book.synopsis = Some(synopsis.clone());
                modified = 1;
            }
        }

        Ok(modified)
    }

    async fn delete(&self, id: &str) -> Result<u64, StoreError> {
        let mut books = self.books.lock().await;
        let before = books.len();
        books.retain(|book| book.id != id);
        Ok((before - books.len()) as u64)
    }
}
