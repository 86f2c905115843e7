//! Query result pipeline: cache lookup, resolution, validation and
//! materialization of a fetched result set.

use std::sync::Arc;

use log::debug;

use crate::cache::ResultCache;
use crate::error::Result;
use crate::mapping::{materialize_row, resolve_and_validate, Entity, ObjectMap, PartitionSpec};
use crate::types::{DynamicRow, ResultSchema, Row, Value};

/// A fetched result set, as handed over by the data-access layer.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Column schema shared by every row.
    pub schema: Arc<ResultSchema>,
    /// Rows returned.
    pub rows: Vec<Row>,
}

impl QueryResult {
    /// Build a result from a schema and raw row values.
    pub fn new(schema: ResultSchema, rows: Vec<Vec<Value>>) -> Self {
        let schema = Arc::new(schema);
        let rows = rows
            .into_iter()
            .map(|values| Row::new(values, Arc::clone(&schema)))
            .collect();
        Self { schema, rows }
    }

    /// Get the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.column_names()
    }

    /// Iterate over rows.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }
}

impl IntoIterator for QueryResult {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Per-query mapping options.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Partition start columns, required when mapping more than one type.
    pub partition_on: Option<PartitionSpec>,
    /// Run completeness and type checks after resolution.
    pub validate_schema: bool,
    /// Cache key; when set, results are read from and written to the cache.
    pub cache_key: Option<String>,
}

impl QueryOptions {
    /// Default options: no partitioning, no validation, no caching.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the partition specification, e.g. `"Id|OrderId"`.
    ///
    /// # Example
    ///
    /// ```
    /// use rowmap::QueryOptions;
    ///
    /// let options = QueryOptions::new()
    ///     .with_partition_on("Id|OrderId")
    ///     .unwrap()
    ///     .with_schema_validation(true);
    /// assert_eq!(options.partition_on.unwrap().len(), 2);
    /// ```
    pub fn with_partition_on(mut self, spec: &str) -> Result<Self> {
        self.partition_on = Some(PartitionSpec::parse(spec)?);
        Ok(self)
    }

    /// Enable or disable schema validation.
    pub fn with_schema_validation(mut self, validate: bool) -> Self {
        self.validate_schema = validate;
        self
    }

    /// Cache the materialized result under `key`.
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }
}

/// Materializes result sets into entities, optionally through a cache.
#[derive(Clone, Default)]
pub struct Reader {
    cache: Option<Arc<ResultCache>>,
}

impl Reader {
    /// Reader without a cache. Cache keys in options are ignored.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader backed by `cache`.
    pub fn with_cache(cache: Arc<ResultCache>) -> Self {
        Self { cache: Some(cache) }
    }

    /// The cache, if any.
    pub fn cache(&self) -> Option<&Arc<ResultCache>> {
        self.cache.as_ref()
    }

    fn cached<T, F>(&self, options: &QueryOptions, run: F) -> Result<Arc<Vec<T>>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Result<Vec<T>>,
    {
        let key = match (&self.cache, &options.cache_key) {
            (Some(cache), Some(key)) => {
                if let Some(hit) = cache.try_get::<T>(key) {
                    return Ok(hit);
                }
                Some((cache, key))
            }
            _ => None,
        };

        let items = Arc::new(run()?);
        if let Some((cache, key)) = key {
            cache.add(key.clone(), Arc::clone(&items));
        }
        Ok(items)
    }

    /// Materialize every row into `T`, skipping rows where all of `T`'s
    /// columns are NULL.
    pub fn read<T: Entity>(&self, result: &QueryResult, options: &QueryOptions) -> Result<Arc<Vec<T>>> {
        self.read_with(result, options, ObjectMap::<T>::new())
    }

    /// [`read`](Self::read) with a prepared map, e.g. one carrying aliases.
    pub fn read_with<T: Entity>(
        &self,
        result: &QueryResult,
        options: &QueryOptions,
        mut map: ObjectMap<T>,
    ) -> Result<Arc<Vec<T>>> {
        self.cached(options, || {
            resolve_and_validate(
                &result.schema,
                &mut [&mut map],
                options.partition_on.as_ref(),
                options.validate_schema,
            )?;

            let mut items = Vec::with_capacity(result.len());
            for row in &result.rows {
                if let Some(item) = materialize_row(&mut map, row)? {
                    items.push(item);
                }
            }
            debug!("materialized {} of {} rows", items.len(), result.len());
            Ok(items)
        })
    }

    /// Materialize two types per row. Either side is `None` when all of its
    /// columns are NULL in that row.
    pub fn read_multi<A: Entity, B: Entity>(
        &self,
        result: &QueryResult,
        options: &QueryOptions,
        maps: (ObjectMap<A>, ObjectMap<B>),
    ) -> Result<Arc<Vec<(Option<A>, Option<B>)>>> {
        let (mut a, mut b) = maps;
        self.cached(options, || {
            resolve_and_validate(
                &result.schema,
                &mut [&mut a, &mut b],
                options.partition_on.as_ref(),
                options.validate_schema,
            )?;

            result
                .rows
                .iter()
                .map(|row| -> Result<_> {
                    Ok((materialize_row(&mut a, row)?, materialize_row(&mut b, row)?))
                })
                .collect()
        })
    }

    /// Materialize three types per row.
    #[allow(clippy::type_complexity)]
    pub fn read_multi3<A: Entity, B: Entity, C: Entity>(
        &self,
        result: &QueryResult,
        options: &QueryOptions,
        maps: (ObjectMap<A>, ObjectMap<B>, ObjectMap<C>),
    ) -> Result<Arc<Vec<(Option<A>, Option<B>, Option<C>)>>> {
        let (mut a, mut b, mut c) = maps;
        self.cached(options, || {
            resolve_and_validate(
                &result.schema,
                &mut [&mut a, &mut b, &mut c],
                options.partition_on.as_ref(),
                options.validate_schema,
            )?;

            result
                .rows
                .iter()
                .map(|row| -> Result<_> {
                    Ok((
                        materialize_row(&mut a, row)?,
                        materialize_row(&mut b, row)?,
                        materialize_row(&mut c, row)?,
                    ))
                })
                .collect()
        })
    }

    /// Project every row without a target type.
    pub fn read_dynamic(&self, result: &QueryResult, options: &QueryOptions) -> Result<Arc<Vec<DynamicRow>>> {
        self.cached(options, || {
            Ok(result
                .rows
                .iter()
                .map(|row| DynamicRow::project(&result.schema, row))
                .collect())
        })
    }
}
