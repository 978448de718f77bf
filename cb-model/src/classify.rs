/// Rust has no runtime exception-ancestor chain to walk, so failure
/// classification is expressed as a flat list of stable type-tags rather
/// than an `is_a` check. An implementor lists itself and every broader
/// category it belongs to, most specific first (`"timeout"`, `"io"`); the
/// `ignore`/`record` configuration lists match against this list as an
/// unordered set.
pub trait ClassifiableError {
    fn failure_tags(&self) -> Vec<&'static str>;
}

/// Any `std::error::Error` gets zero-boilerplate classification tagged
/// with its own type name, so callers that don't need multi-tag
/// classification can opt in just by using a normal error type.
impl<E: std::error::Error> ClassifiableError for E {
    fn failure_tags(&self) -> Vec<&'static str> {
        vec![std::any::type_name::<E>()]
    }
}
