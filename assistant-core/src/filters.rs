//! Translate caller filters into the retrieval backend's metadata filter.

use rag_store::RagFilter;

use crate::api_types::QueryFilters;

/// Builds the metadata filter for a query.
///
/// - `appointment_date` → `date`
/// - `service_type`     → `service_type`
///
/// Blank values and unknown keys are dropped. Returns `None` when nothing
/// survives, so retrieval runs unfiltered.
pub fn build_filters(filters: Option<&QueryFilters>) -> Option<RagFilter> {
    let f = filters?;
    let mut out = RagFilter::default();

    if let Some(date) = present(&f.appointment_date) {
        out = out.with("date", date);
    }
    if let Some(service) = present(&f.service_type) {
        out = out.with("service_type", service);
    }

    (!out.is_empty()).then_some(out)
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
