mod record;

use proc_macro::TokenStream;

/// Derive macro for implementing the `Record` trait.
///
/// # Usage
///
/// ```ignore
/// use campus_records::Record;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Serialize, Deserialize, Record)]
/// #[record(collection = "Room")]
/// pub struct Room {
///     #[record(key)]
///     pub id: String,
///     #[record(index)]
///     pub building: String,
///     pub capacity: u32,
/// }
/// ```
///
/// - `#[record(collection = "...")]` sets the collection name.
///   If omitted, defaults to the struct name.
/// - `#[record(key)]` marks the field holding the unique natural key.
///   If omitted, defaults to a field named `id`.
/// - `#[record(index)]` declares a non-unique secondary index on the field,
///   created by the schema migration that introduces the collection.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input)
}
