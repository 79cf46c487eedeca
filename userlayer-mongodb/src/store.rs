use std::env;
use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Bson, Document};
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, FindOptions},
};
use tracing::debug;
use userlayer_core::{
    backend::{DeleteResult, InsertManyResult, StoreBackend, StoreBackendBuilder, UpdateResult},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Filter, Query},
    record::ID_FIELD,
};

use crate::{
    query::{MONGO_ID_FIELD, MongoQueryTranslator},
    sanitizer::KeySanitizer,
};

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

/// Environment variable holding the connection string.
pub const URI_ENV: &str = "MONGO_URI";
/// Environment variable naming the database; falls back to the one in the connection string.
pub const DATABASE_ENV: &str = "MONGO_DATABASE";

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&KeySanitizer::sanitize_string(collection_name))
    }

    /// Moves the primary key from `id` to `_id` and escapes the remaining keys.
    fn prepare_document(&self, record: &Document) -> DocumentStoreResult<(String, Document)> {
        let id = record
            .get_str(ID_FIELD)
            .map_err(|_| DocumentStoreError::Backend(format!("record has no string `{ID_FIELD}` field")))?
            .to_string();

        let prepared = std::iter::once((MONGO_ID_FIELD.to_string(), Bson::String(id.clone())))
            .chain(
                KeySanitizer::sanitize_document(record)
                    .into_iter()
                    .filter(|(k, _)| k != ID_FIELD),
            )
            .collect();

        Ok((id, prepared))
    }

    fn restore_document(&self, document: &Document) -> Document {
        let mut restored = Document::new();

        if let Some(id) = document.get(MONGO_ID_FIELD) {
            restored.insert(ID_FIELD, id.clone());
        }

        for (key, value) in KeySanitizer::restore_document(document) {
            if key != MONGO_ID_FIELD {
                restored.insert(key, value);
            }
        }

        restored
    }

    async fn count(&self, filter: Document, collection: &str, limit: Option<u64>) -> DocumentStoreResult<u64> {
        let coll = self.get_collection(collection);
        let mut count = coll.count_documents(filter);

        if let Some(limit) = limit {
            count = count.limit(limit);
        }

        count.await.map_err(backend_error)
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

fn backend_error(err: MongoError) -> DocumentStoreError {
    DocumentStoreError::Backend(err.to_string())
}

/// Maps a failed write to [`DocumentStoreError::DocumentAlreadyExists`] when the server
/// reports a duplicate key. `ids` are the keys of the attempted batch, in order.
fn write_error(err: MongoError, ids: &[String], collection: &str) -> DocumentStoreError {
    let duplicate = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(failure)) if failure.code == DUPLICATE_KEY => {
            ids.first()
        }
        ErrorKind::InsertMany(failure) => failure
            .write_errors
            .as_ref()
            .and_then(|errors| errors.iter().find(|e| e.code == DUPLICATE_KEY))
            .and_then(|e| ids.get(e.index)),
        _ => None,
    };

    match duplicate {
        Some(id) => DocumentStoreError::DocumentAlreadyExists(id.clone(), collection.to_string()),
        None => backend_error(err),
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_one(&self, record: Document, collection: &str) -> DocumentStoreResult<Document> {
        let (id, prepared) = self.prepare_document(&record)?;

        self.get_collection(collection)
            .insert_one(prepared)
            .await
            .map_err(|e| write_error(e, std::slice::from_ref(&id), collection))?;

        debug!(collection, id = %id, "inserted record");

        Ok(record)
    }

    async fn insert_many(
        &self,
        records: Vec<Document>,
        collection: &str,
    ) -> DocumentStoreResult<InsertManyResult> {
        let (ids, prepared): (Vec<String>, Vec<Document>) = records
            .iter()
            .map(|record| self.prepare_document(record))
            .collect::<DocumentStoreResult<Vec<_>>>()?
            .into_iter()
            .unzip();

        let result = self
            .get_collection(collection)
            .insert_many(prepared)
            .await
            .map_err(|e| write_error(e, &ids, collection))?;

        debug!(collection, count = result.inserted_ids.len(), "inserted records");

        Ok(InsertManyResult {
            count: result.inserted_ids.len() as u64,
            inserted_ids: ids,
        })
    }

    async fn find(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(projection) = &query.projection {
            options.projection = Some(MongoQueryTranslator::projection(projection));
        }

        Ok(
            self.get_collection(collection)
                .find(MongoQueryTranslator::filter(&query.filter))
                .with_options(options)
                .await
                .map_err(backend_error)?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(backend_error)?
                .iter()
                .map(|doc| self.restore_document(doc))
                .collect()
        )
    }

    async fn update_one(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        let filter = MongoQueryTranslator::filter(&filter);

        let Some(update) = MongoQueryTranslator::update(&payload) else {
            return Ok(UpdateResult {
                matched_count: self.count(filter, collection, Some(1)).await?,
                ..UpdateResult::default()
            });
        };

        let result = self
            .get_collection(collection)
            .update_one(filter, update)
            .await
            .map_err(backend_error)?;

        Ok(UpdateResult {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
            upserted_count: 0,
        })
    }

    async fn update_many(
        &self,
        filter: Filter,
        payload: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateResult> {
        let filter = MongoQueryTranslator::filter(&filter);

        let Some(update) = MongoQueryTranslator::update(&payload) else {
            return Ok(UpdateResult {
                matched_count: self.count(filter, collection, None).await?,
                ..UpdateResult::default()
            });
        };

        let result = self
            .get_collection(collection)
            .update_many(filter, update)
            .await
            .map_err(backend_error)?;

        Ok(UpdateResult {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
            upserted_count: 0,
        })
    }

    async fn delete_one(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult> {
        let result = self
            .get_collection(collection)
            .delete_one(MongoQueryTranslator::filter(&filter))
            .await
            .map_err(backend_error)?;

        Ok(DeleteResult {
            deleted_count: result.deleted_count,
        })
    }

    async fn delete_many(&self, filter: Filter, collection: &str) -> DocumentStoreResult<DeleteResult> {
        let result = self
            .get_collection(collection)
            .delete_many(MongoQueryTranslator::filter(&filter))
            .await
            .map_err(backend_error)?;

        Ok(DeleteResult {
            deleted_count: result.deleted_count,
        })
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        if self.list_collections().await?.iter().any(|existing| existing == name) {
            return Ok(());
        }

        self.client
            .database(&self.database)
            .create_collection(&KeySanitizer::sanitize_string(name))
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.get_collection(name)
            .drop()
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.client
                .database(&self.database)
                .list_collection_names()
                .await
                .map_err(backend_error)?
                .iter()
                .map(|name| KeySanitizer::restore_string(name))
                .collect()
        )
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.shutdown().await
    }
}

/// Builds a [`MongoDbStore`] from a connection string.
///
/// When no database is named explicitly, the default database of the connection string
/// is used (`mongodb://host/<database>`).
#[derive(Debug, Clone)]
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: Option<String>,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: Some(database.to_string()),
        }
    }

    /// Reads the connection string from `MONGO_URI` and the optional database name from
    /// `MONGO_DATABASE`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Initialization`] if `MONGO_URI` is not set.
    pub fn from_env() -> DocumentStoreResult<Self> {
        let dsn = env::var(URI_ENV)
            .map_err(|_| DocumentStoreError::Initialization(format!("{URI_ENV} is not set")))?;

        Ok(Self {
            dsn,
            database: env::var(DATABASE_ENV).ok().filter(|name| !name.is_empty()),
        })
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        let options = ClientOptions::parse(&self.dsn)
            .await
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        let database = self
            .database
            .or_else(|| options.default_database.clone())
            .ok_or_else(|| {
                DocumentStoreError::Initialization(
                    "no database named and the connection string has no default".to_string(),
                )
            })?;

        let client = Client::with_options(options)
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?;

        debug!(database = %database, "connected to mongodb");

        Ok(MongoDbStore::new(client, database))
    }
}
