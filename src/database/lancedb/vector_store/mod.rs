#[cfg(test)]
mod tests;

use super::{NearestMatch, StoredEmbedding, UpsertOutcome, quote_literal};
use crate::config::{Config, UpsertMode};
use crate::embeddings::vector::normalize;
use crate::{FileVectorError, Result};
use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType, Table,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

const FILE_PATH_COLUMN: &str = "file_path";
const EMBEDDING_COLUMN: &str = "embedding";
const INDEXED_AT_COLUMN: &str = "indexed_at";

/// File embedding store backed by a single LanceDB table keyed by `file_path`.
///
/// No connection is held between calls: every operation connects, does its
/// work, and drops the connection before returning.
#[derive(Debug, Clone)]
pub struct VectorStore {
    uri: String,
    table_name: String,
    upsert_mode: UpsertMode,
}

impl VectorStore {
    /// Create a new VectorStore for the database described by `config`
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let uri = config.database_uri();

        if !uri.contains("://") {
            std::fs::create_dir_all(Path::new(&uri)).map_err(|e| {
                FileVectorError::Database(format!(
                    "Failed to create vector database directory {uri}: {e}"
                ))
            })?;
        }

        debug!(
            "Vector store at {} (table {}, upsert mode {})",
            uri, config.database.table_name, config.database.upsert_mode
        );

        Ok(Self {
            uri,
            table_name: config.database.table_name.clone(),
            upsert_mode: config.database.upsert_mode,
        })
    }

    #[inline]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[inline]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn connect(&self) -> Result<Connection> {
        lancedb::connect(&self.uri)
            .execute()
            .await
            .map_err(|e| FileVectorError::Database(format!("Failed to connect to LanceDB: {e}")))
    }

    /// Open the embeddings table, or `None` if nothing has been stored yet
    async fn open_table(&self, connection: &Connection) -> Result<Option<Table>> {
        let table_names = connection
            .table_names()
            .execute()
            .await
            .map_err(|e| FileVectorError::Database(format!("Failed to list tables: {e}")))?;

        if !table_names.contains(&self.table_name) {
            return Ok(None);
        }

        connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map(Some)
            .map_err(|e| FileVectorError::Database(format!("Failed to open table: {e}")))
    }

    /// Open the table for writing, creating it with `vector_dim` on first use
    async fn table_for_write(&self, connection: &Connection, vector_dim: usize) -> Result<Table> {
        let table = match self.open_table(connection).await? {
            Some(table) => table,
            None => {
                info!(
                    "Creating table {} with {} dimensions",
                    self.table_name, vector_dim
                );
                match connection
                    .create_empty_table(&self.table_name, create_schema(vector_dim))
                    .execute()
                    .await
                {
                    Ok(table) => table,
                    // Another writer may have created it first
                    Err(e) => self.open_table(connection).await?.ok_or_else(|| {
                        FileVectorError::Database(format!("Failed to create table: {e}"))
                    })?,
                }
            }
        };

        let expected = table_dimension(&table).await?;
        if expected != vector_dim {
            return Err(FileVectorError::DimensionMismatch {
                expected,
                actual: vector_dim,
            });
        }

        Ok(table)
    }

    /// Whether a row for `file_path` is stored.
    ///
    /// Any failure while checking is logged and reported as `false`.
    #[inline]
    pub async fn exists(&self, file_path: &str) -> bool {
        match self.count_path(file_path).await {
            Ok(count) => count > 0,
            Err(e) => {
                warn!("Database error during duplicate check for {}: {}", file_path, e);
                false
            }
        }
    }

    /// Number of rows stored for `file_path`
    #[inline]
    pub async fn count_path(&self, file_path: &str) -> Result<u64> {
        let connection = self.connect().await?;
        let Some(table) = self.open_table(&connection).await? else {
            return Ok(0);
        };

        let count = table
            .count_rows(Some(path_predicate(file_path)))
            .await
            .map_err(|e| FileVectorError::Database(format!("Failed to count rows: {e}")))?;

        Ok(count as u64)
    }

    /// Normalize `raw_vector` and store it as the embedding for `file_path`,
    /// replacing any vector already stored for that path.
    ///
    /// With [`UpsertMode::CheckThenWrite`] the existence check and the write
    /// are separate statements; two concurrent ingesters can both insert.
    #[inline]
    pub async fn upsert(&self, file_path: &str, raw_vector: &[f32]) -> Result<UpsertOutcome> {
        let embedding = normalize(raw_vector)?;

        match self.upsert_mode {
            UpsertMode::CheckThenWrite => {
                if self.exists(file_path).await {
                    self.update(file_path, &embedding).await?;
                    debug!("Updated embedding for {}", file_path);
                    Ok(UpsertOutcome::Updated)
                } else {
                    self.insert(file_path, &embedding).await?;
                    debug!("Inserted embedding for {}", file_path);
                    Ok(UpsertOutcome::Inserted)
                }
            }
            UpsertMode::Merge => {
                self.merge(file_path, &embedding).await?;
                debug!("Merged embedding for {}", file_path);
                Ok(UpsertOutcome::Merged)
            }
        }
    }

    async fn insert(&self, file_path: &str, embedding: &[f32]) -> Result<()> {
        let connection = self.connect().await?;
        let table = self.table_for_write(&connection, embedding.len()).await?;
        let batch = create_record_batch(file_path, embedding)?;

        let schema = batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| FileVectorError::Database(format!("Failed to insert embedding: {e}")))?;

        Ok(())
    }

    async fn update(&self, file_path: &str, embedding: &[f32]) -> Result<()> {
        let connection = self.connect().await?;
        let table = self.table_for_write(&connection, embedding.len()).await?;
        let batch = create_record_batch(file_path, embedding)?;

        let schema = batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);
        let mut builder = table.merge_insert(&[FILE_PATH_COLUMN]);
        builder.when_matched_update_all(None);
        builder
            .execute(Box::new(reader))
            .await
            .map_err(|e| FileVectorError::Database(format!("Failed to update embedding: {e}")))?;

        Ok(())
    }

    async fn merge(&self, file_path: &str, embedding: &[f32]) -> Result<()> {
        let connection = self.connect().await?;
        let table = self.table_for_write(&connection, embedding.len()).await?;
        let batch = create_record_batch(file_path, embedding)?;

        let schema = batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);
        let mut builder = table.merge_insert(&[FILE_PATH_COLUMN]);
        builder
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        builder
            .execute(Box::new(reader))
            .await
            .map_err(|e| FileVectorError::Database(format!("Failed to merge embedding: {e}")))?;

        Ok(())
    }

    /// Return up to `limit` stored rows closest to `query_vector` by cosine
    /// distance, closest first
    #[inline]
    pub async fn nearest(&self, query_vector: &[f32], limit: usize) -> Result<Vec<NearestMatch>> {
        if limit == 0 {
            return Err(FileVectorError::Config(
                "Search limit must be at least 1".to_string(),
            ));
        }

        let query = normalize(query_vector)?;
        debug!("Searching for nearest vectors with limit: {}", limit);

        let connection = self.connect().await?;
        let Some(table) = self.open_table(&connection).await? else {
            debug!("Table {} does not exist yet", self.table_name);
            return Ok(Vec::new());
        };

        let expected = table_dimension(&table).await?;
        if expected != query.len() {
            return Err(FileVectorError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }

        let results = table
            .vector_search(query.as_slice())
            .map_err(|e| FileVectorError::Database(format!("Failed to create vector search: {e}")))?
            .column(EMBEDDING_COLUMN)
            .distance_type(DistanceType::Cosine)
            .limit(limit)
            .execute()
            .await
            .map_err(|e| FileVectorError::Database(format!("Failed to execute search: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| FileVectorError::Database(format!("Failed to read result stream: {e}")))?;

        let mut matches = Vec::new();
        for batch in &batches {
            let paths = string_column(batch, FILE_PATH_COLUMN)?;
            let embeddings = embedding_column(batch)?;
            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| FileVectorError::Database("Missing _distance column".to_string()))?;

            for row in 0..batch.num_rows() {
                matches.push(NearestMatch {
                    file_path: paths.value(row).to_string(),
                    embedding: embedding_at(embeddings, row)?,
                    distance: distances.value(row),
                });
            }
        }

        debug!("Found {} nearest matches", matches.len());
        Ok(matches)
    }

    /// Fetch the stored row for `file_path`
    #[inline]
    pub async fn get(&self, file_path: &str) -> Result<Option<StoredEmbedding>> {
        let connection = self.connect().await?;
        let Some(table) = self.open_table(&connection).await? else {
            return Ok(None);
        };

        let batches: Vec<RecordBatch> = table
            .query()
            .only_if(path_predicate(file_path))
            .limit(1)
            .execute()
            .await
            .map_err(|e| FileVectorError::Database(format!("Failed to query table: {e}")))?
            .try_collect()
            .await
            .map_err(|e| FileVectorError::Database(format!("Failed to read result stream: {e}")))?;

        let Some(batch) = batches.iter().find(|batch| batch.num_rows() > 0) else {
            return Ok(None);
        };

        Ok(Some(StoredEmbedding {
            file_path: string_column(batch, FILE_PATH_COLUMN)?.value(0).to_string(),
            embedding: embedding_at(embedding_column(batch)?, 0)?,
            indexed_at: string_column(batch, INDEXED_AT_COLUMN)?.value(0).to_string(),
        }))
    }

    /// Get the total number of stored embeddings
    #[inline]
    pub async fn count(&self) -> Result<u64> {
        let connection = self.connect().await?;
        let Some(table) = self.open_table(&connection).await? else {
            return Ok(0);
        };

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| FileVectorError::Database(format!("Failed to count rows: {e}")))?;

        Ok(count as u64)
    }

    /// Vector dimension of the table, or `None` before the first write
    #[inline]
    pub async fn dimension(&self) -> Result<Option<usize>> {
        let connection = self.connect().await?;
        match self.open_table(&connection).await? {
            Some(table) => Ok(Some(table_dimension(&table).await?)),
            None => Ok(None),
        }
    }
}

fn path_predicate(file_path: &str) -> String {
    format!("{FILE_PATH_COLUMN} = {}", quote_literal(file_path))
}

/// Create schema with the specified vector dimension
fn create_schema(vector_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(FILE_PATH_COLUMN, DataType::Utf8, false),
        Field::new(
            EMBEDDING_COLUMN,
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                vector_dim as i32,
            ),
            false,
        ),
        Field::new(INDEXED_AT_COLUMN, DataType::Utf8, false),
    ]))
}

/// Read the vector dimension from the table schema
async fn table_dimension(table: &Table) -> Result<usize> {
    let schema = table
        .schema()
        .await
        .map_err(|e| FileVectorError::Database(format!("Failed to get table schema: {e}")))?;

    match schema.field_with_name(EMBEDDING_COLUMN).map(Field::data_type) {
        Ok(DataType::FixedSizeList(_, size)) => Ok(*size as usize),
        _ => Err(FileVectorError::Database(
            "Could not find embedding column or determine dimension".to_string(),
        )),
    }
}

fn create_record_batch(file_path: &str, embedding: &[f32]) -> Result<RecordBatch> {
    let vector_dim = embedding.len();
    let indexed_at = chrono::Utc::now().to_rfc3339();

    let values_array = Float32Array::from(embedding.to_vec());
    let field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array =
        FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
            .map_err(|e| FileVectorError::Database(format!("Failed to create vector array: {e}")))?;

    let arrays: Vec<Arc<dyn Array>> = vec![
        Arc::new(StringArray::from(vec![file_path])),
        Arc::new(vector_array),
        Arc::new(StringArray::from(vec![indexed_at.as_str()])),
    ];

    RecordBatch::try_new(create_schema(vector_dim), arrays)
        .map_err(|e| FileVectorError::Database(format!("Failed to create record batch: {e}")))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| FileVectorError::Database(format!("Missing {name} column")))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| FileVectorError::Database(format!("Invalid {name} column type")))
}

fn embedding_column(batch: &RecordBatch) -> Result<&FixedSizeListArray> {
    batch
        .column_by_name(EMBEDDING_COLUMN)
        .ok_or_else(|| FileVectorError::Database("Missing embedding column".to_string()))?
        .as_any()
        .downcast_ref::<FixedSizeListArray>()
        .ok_or_else(|| FileVectorError::Database("Invalid embedding column type".to_string()))
}

fn embedding_at(column: &FixedSizeListArray, row: usize) -> Result<Vec<f32>> {
    let values = column.value(row);
    values
        .as_any()
        .downcast_ref::<Float32Array>()
        .map(|values| values.values().to_vec())
        .ok_or_else(|| FileVectorError::Database("Invalid embedding value type".to_string()))
}
