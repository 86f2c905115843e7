//! Materialization over streams of rows.
//!
//! Data-access layers that fetch rows incrementally can hand a
//! `Stream<Item = Result<Row>>` to [`MaterializeStreamExt::materialize`]
//! instead of collecting a [`QueryResult`](crate::QueryResult) first.

use futures::future;
use futures::{Stream, StreamExt};

use crate::error::Result;
use crate::mapping::{materialize_row, resolve_and_validate, Entity, ObjectMap};
use crate::types::Row;

/// Extension trait for materializing a stream of rows.
///
/// # Example
///
/// ```
/// use futures::stream::{self, TryStreamExt};
/// use rowmap::{DataType, Entity, EntityBuilder, MaterializeStreamExt, ObjectMap, QueryResult, ResultSchema, Value};
///
/// #[derive(Default)]
/// struct Tag {
///     name: String,
/// }
///
/// impl Entity for Tag {
///     fn describe(b: &mut EntityBuilder<Self>) {
///         b.column("Name", |t: &mut Tag, v| t.name = v);
///     }
/// }
///
/// # futures::executor::block_on(async {
/// let result = QueryResult::new(
///     ResultSchema::from_pairs([("Name", DataType::Text)]),
///     vec![vec![Value::from("rust")]],
/// );
/// let tags: Vec<Tag> = stream::iter(result.rows.into_iter().map(Ok))
///     .materialize(ObjectMap::<Tag>::new(), false)
///     .try_collect()
///     .await
///     .unwrap();
/// assert_eq!(tags[0].name, "rust");
/// # });
/// ```
pub trait MaterializeStreamExt: Stream<Item = Result<Row>> + Sized {
    /// Convert rows into entities of `T`.
    ///
    /// The map is resolved against the schema of the first row. Rows where
    /// every column of `T` is NULL are skipped. Errors are passed through;
    /// a resolution or validation error is yielded once and ends the stream.
    fn materialize<T: Entity>(self, map: ObjectMap<T>, validate: bool) -> impl Stream<Item = Result<T>>;
}

impl<S: Stream<Item = Result<Row>>> MaterializeStreamExt for S {
    fn materialize<T: Entity>(self, mut map: ObjectMap<T>, validate: bool) -> impl Stream<Item = Result<T>> {
        let mut resolved = false;
        self.scan(false, move |failed, item| {
            // A failed resolution leaves the map partially filled; stop there.
            if *failed {
                return future::ready(None);
            }
            let output = item.and_then(|row| {
                if !resolved {
                    if let Err(e) = resolve_and_validate(row.schema(), &mut [&mut map], None, validate) {
                        *failed = true;
                        return Err(e);
                    }
                    resolved = true;
                }
                materialize_row(&mut map, &row)
            });
            future::ready(Some(output.transpose()))
        })
        .filter_map(future::ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mapping::EntityBuilder;
    use crate::reader::QueryResult;
    use crate::types::{DataType, ResultSchema, Value};
    use futures::stream::{self, TryStreamExt};

    #[derive(Debug, Default, PartialEq)]
    struct Score {
        player: String,
        points: i32,
    }

    impl Entity for Score {
        fn describe(b: &mut EntityBuilder<Self>) {
            b.column("Player", |s: &mut Score, v| s.player = v)
                .column("Points", |s: &mut Score, v| s.points = v);
        }
    }

    fn scores() -> QueryResult {
        QueryResult::new(
            ResultSchema::from_pairs([("Player", DataType::Text), ("Points", DataType::Int)]),
            vec![
                vec![Value::from("ann"), Value::Int(3)],
                vec![Value::Null, Value::Null],
                vec![Value::from("bob"), Value::Null],
            ],
        )
    }

    #[tokio::test]
    async fn test_materialize_stream() {
        let rows = stream::iter(scores().rows.into_iter().map(Ok));
        let out: Vec<Score> = rows
            .materialize(ObjectMap::<Score>::new(), true)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(
            out,
            vec![
                Score {
                    player: "ann".to_string(),
                    points: 3
                },
                Score {
                    player: "bob".to_string(),
                    points: 0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_errors_pass_through() {
        let rows = stream::iter(vec![
            Err(Error::type_conversion("fetch failed")),
            Ok(scores().rows.remove(0)),
        ]);
        let out: Vec<Result<Score>> = rows.materialize(ObjectMap::<Score>::new(), false).collect().await;
        assert_eq!(out.len(), 2);
        assert!(out[0].is_err());
        assert_eq!(out[1].as_ref().map(|s| s.points).ok(), Some(3));
    }

    #[test]
    fn test_stream_validation_failure() {
        let result = QueryResult::new(
            ResultSchema::from_pairs([("Player", DataType::Text), ("Extra", DataType::Int)]),
            vec![vec![Value::from("ann"), Value::Int(1)]],
        );
        let out: Vec<Result<Score>> = tokio_test::block_on(
            stream::iter(result.rows.into_iter().map(Ok))
                .materialize(ObjectMap::<Score>::new(), true)
                .collect(),
        );
        assert!(matches!(out[0], Err(Error::SchemaCompletenessFailure { .. })));
    }

    #[tokio::test]
    async fn test_stream_validation_failure_ends_stream() {
        let result = QueryResult::new(
            ResultSchema::from_pairs([("Player", DataType::Text), ("Extra", DataType::Int)]),
            vec![
                vec![Value::from("ann"), Value::Int(1)],
                vec![Value::from("bob"), Value::Int(2)],
                vec![Value::from("cid"), Value::Int(3)],
            ],
        );
        let out: Vec<Result<Score>> = stream::iter(result.rows.into_iter().map(Ok))
            .materialize(ObjectMap::<Score>::new(), true)
            .collect()
            .await;

        assert_eq!(out.len(), 1);
        match &out[0] {
            Err(Error::SchemaCompletenessFailure { columns }) => {
                assert_eq!(columns.len(), 1);
                assert_eq!(columns[0].column, "Extra");
            }
            other => panic!("Expected SchemaCompletenessFailure, got {other:?}"),
        }
    }
}
