//! Lazy, single-pass sequences over native and foreign collections.
//!
//! Both [`ObjectSequence`] and [`DictionarySequence`] read their source one element at a
//! time. Native lists are indexed on every step, so items appended behind the cursor are
//! still visited; any other concurrent mutation follows the backing collection's own
//! contract. A failing foreign call ends the sequence and records a warning.

use std::sync::Arc;

use crate::{
    diagnostics::{DiagnosticCategory, DiagnosticSink},
    interop::enumeration::descriptor::EnumeratorDescriptor,
    value::{ObjectContents, ObjectRef, Value},
};

/// Live foreign enumerator driven through a cached descriptor.
pub(crate) struct ForeignCursor {
    enumerator: Value,
    descriptor: Arc<EnumeratorDescriptor>,
    /// Result of the probing `MoveNext`, consumed by the first step
    primed: Option<bool>,
    finished: bool,
    type_name: String,
    diagnostics: DiagnosticSink,
}

impl ForeignCursor {
    pub(crate) fn new(
        enumerator: Value,
        descriptor: Arc<EnumeratorDescriptor>,
        primed: Option<bool>,
        type_name: String,
        diagnostics: DiagnosticSink,
    ) -> Self {
        ForeignCursor {
            enumerator,
            descriptor,
            primed,
            finished: false,
            type_name,
            diagnostics,
        }
    }

    fn step(&mut self) -> Option<Value> {
        if self.finished {
            return None;
        }

        let moved = match self.primed.take() {
            Some(moved) => Ok(moved),
            None => self.descriptor.move_next(&self.enumerator),
        };
        let result = moved.and_then(|moved| {
            if moved {
                self.descriptor.current(&self.enumerator).map(Some)
            } else {
                Ok(None)
            }
        });

        match result {
            Ok(Some(value)) => Some(value),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(error) => {
                self.finished = true;
                self.diagnostics.type_warning(
                    DiagnosticCategory::Enumeration,
                    &self.type_name,
                    format!("enumeration stopped: {error}"),
                );
                None
            }
        }
    }
}

enum SequenceSource {
    Empty,
    Chars { text: Arc<str>, offset: usize },
    Items { object: ObjectRef, index: usize },
    /// Values of a native map enumerated as a plain sequence
    MapValues { object: ObjectRef, index: usize },
    Foreign(ForeignCursor),
}

/// Lazy sequence of collection elements.
pub struct ObjectSequence {
    source: SequenceSource,
}

impl ObjectSequence {
    /// Sequence yielding nothing
    pub fn empty() -> Self {
        ObjectSequence {
            source: SequenceSource::Empty,
        }
    }

    /// Characters of a string
    pub fn chars(text: Arc<str>) -> Self {
        ObjectSequence {
            source: SequenceSource::Chars { text, offset: 0 },
        }
    }

    /// Items of a native list, or the values of a native map.
    ///
    /// Returns `None` for objects without built-in collection storage.
    pub fn native(object: &ObjectRef) -> Option<Self> {
        let source = match object.contents() {
            ObjectContents::Sequence(_) => SequenceSource::Items {
                object: object.clone(),
                index: 0,
            },
            ObjectContents::Dictionary(_) => SequenceSource::MapValues {
                object: object.clone(),
                index: 0,
            },
            ObjectContents::None => return None,
        };
        Some(ObjectSequence { source })
    }

    pub(crate) fn foreign(cursor: ForeignCursor) -> Self {
        ObjectSequence {
            source: SequenceSource::Foreign(cursor),
        }
    }
}

impl Iterator for ObjectSequence {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match &mut self.source {
            SequenceSource::Empty => None,
            SequenceSource::Chars { text, offset } => {
                let c = text.get(*offset..)?.chars().next()?;
                *offset += c.len_utf8();
                Some(Value::Char(c))
            }
            SequenceSource::Items { object, index } => {
                let item = match object.contents() {
                    ObjectContents::Sequence(items) => read_lock!(items).get(*index).cloned(),
                    _ => None,
                }?;
                *index += 1;
                Some(item)
            }
            SequenceSource::MapValues { object, index } => {
                let value = match object.contents() {
                    ObjectContents::Dictionary(entries) => read_lock!(entries)
                        .get(*index)
                        .map(|(_, value)| value.clone()),
                    _ => None,
                }?;
                *index += 1;
                Some(value)
            }
            SequenceSource::Foreign(cursor) => cursor.step(),
        }
    }
}

/// Bucket array of a foreign hashtable
pub(crate) struct BucketCursor {
    buckets: Value,
    index: usize,
    read_slot: Box<dyn Fn(&Value, &str) -> Option<Value> + Send>,
}

impl BucketCursor {
    pub(crate) fn new(
        buckets: Value,
        read_slot: Box<dyn Fn(&Value, &str) -> Option<Value> + Send>,
    ) -> Self {
        BucketCursor {
            buckets,
            index: 0,
            read_slot,
        }
    }

    fn bucket(&self, index: usize) -> Option<Value> {
        let object = self.buckets.as_object()?;
        match object.contents() {
            ObjectContents::Sequence(items) => read_lock!(items).get(index).cloned(),
            _ => None,
        }
    }

    fn step(&mut self) -> Option<(Value, Value)> {
        loop {
            let bucket = self.bucket(self.index)?;
            self.index += 1;
            if bucket.is_null() {
                continue;
            }

            let Some(key) = (self.read_slot)(&bucket, "key") else {
                continue;
            };
            // Removed entries keep the bucket array itself as their key
            if key.is_null() || key.ptr_eq(&self.buckets) {
                continue;
            }
            let value = (self.read_slot)(&bucket, "val").unwrap_or_default();
            return Some((key, value));
        }
    }
}

/// Keys and values enumerated separately and paired by position
pub(crate) struct ZippedCursor {
    keys: ObjectSequence,
    values: ObjectSequence,
    finished: bool,
    type_name: String,
    diagnostics: DiagnosticSink,
}

impl ZippedCursor {
    pub(crate) fn new(
        keys: ObjectSequence,
        values: ObjectSequence,
        type_name: String,
        diagnostics: DiagnosticSink,
    ) -> Self {
        ZippedCursor {
            keys,
            values,
            finished: false,
            type_name,
            diagnostics,
        }
    }

    fn step(&mut self) -> Option<(Value, Value)> {
        if self.finished {
            return None;
        }
        match (self.keys.next(), self.values.next()) {
            (Some(key), Some(value)) => Some((key, value)),
            (None, None) => {
                self.finished = true;
                None
            }
            _ => {
                self.finished = true;
                self.diagnostics.type_warning(
                    DiagnosticCategory::Enumeration,
                    &self.type_name,
                    "key and value enumerators ended at different positions",
                );
                None
            }
        }
    }
}

enum DictionarySource {
    Empty,
    Entries { object: ObjectRef, index: usize },
    Buckets(BucketCursor),
    Zipped(ZippedCursor),
}

/// Lazy sequence of dictionary entries.
pub struct DictionarySequence {
    source: DictionarySource,
}

impl DictionarySequence {
    /// Sequence yielding nothing
    pub fn empty() -> Self {
        DictionarySequence {
            source: DictionarySource::Empty,
        }
    }

    /// Entries of a native map, `None` for anything else
    pub fn native(object: &ObjectRef) -> Option<Self> {
        match object.contents() {
            ObjectContents::Dictionary(_) => Some(DictionarySequence {
                source: DictionarySource::Entries {
                    object: object.clone(),
                    index: 0,
                },
            }),
            _ => None,
        }
    }

    pub(crate) fn buckets(cursor: BucketCursor) -> Self {
        DictionarySequence {
            source: DictionarySource::Buckets(cursor),
        }
    }

    pub(crate) fn zipped(cursor: ZippedCursor) -> Self {
        DictionarySequence {
            source: DictionarySource::Zipped(cursor),
        }
    }
}

impl Iterator for DictionarySequence {
    type Item = (Value, Value);

    fn next(&mut self) -> Option<(Value, Value)> {
        match &mut self.source {
            DictionarySource::Empty => None,
            DictionarySource::Entries { object, index } => {
                let entry = match object.contents() {
                    ObjectContents::Dictionary(entries) => read_lock!(entries).get(*index).cloned(),
                    _ => None,
                }?;
                *index += 1;
                Some(entry)
            }
            DictionarySource::Buckets(cursor) => cursor.step(),
            DictionarySource::Zipped(cursor) => cursor.step(),
        }
    }
}
