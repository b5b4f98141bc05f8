//! Managed resources.
//!
//! Each resource module pairs a schema with the two conversions between the
//! attribute bag and the typed API model (`build_*` and `set_*_from_*`), and
//! the create/read/update/delete/import handlers built on them.

pub mod override_value;
pub mod smart_class_parameter;

use crate::error::ProviderError;

/// Split an import ID of the form `a/b/...` into exactly `N` segments.
pub(crate) fn split_import_id<'a, const N: usize>(
    id: &'a str,
    format: &str,
) -> Result<[&'a str; N], ProviderError> {
    let parts: Vec<&'a str> = id.trim().split('/').collect();
    <[&'a str; N]>::try_from(parts)
        .ok()
        .filter(|parts| parts.iter().all(|p| !p.is_empty()))
        .ok_or_else(|| {
            ProviderError::Validation(format!(
                "invalid import id \"{}\", expected {}",
                id, format
            ))
        })
}

/// Parse a numeric segment of an import ID.
pub(crate) fn parse_import_segment(segment: &str, id: &str) -> Result<i64, ProviderError> {
    segment.parse().map_err(|_| {
        ProviderError::Validation(format!(
            "invalid import id \"{}\": \"{}\" is not a number",
            id, segment
        ))
    })
}
