mod stream_message;

use proc_macro::TokenStream;

/// Derive macro binding a payload type to a stable stream registry key.
///
/// Generates `streamhub::MessagePayload` and `streamhub::StreamMessage`.
///
/// # Usage
///
/// ```ignore
/// #[derive(Serialize, Deserialize, StreamMessage)]
/// #[stream(key = "orders.OrderPlaced")]
/// struct OrderPlaced {
///     #[stream(subject)]
///     order_id: String,
///     total: u64,
/// }
/// ```
///
/// - `#[stream(key = "...")]`: registry key. Defaults to
///   `module_path!()::TypeName`, which changes if the type moves, so set it
///   explicitly for types shared between services.
/// - `#[stream(subject)]` on a field: the field's `to_string()` becomes the
///   envelope `subject`.
#[proc_macro_derive(StreamMessage, attributes(stream))]
pub fn derive_stream_message(input: TokenStream) -> TokenStream {
    stream_message::derive_stream_message(input)
}
