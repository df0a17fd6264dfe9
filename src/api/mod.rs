// =============================================================================
// HTTP API Module
// =============================================================================
//
// Read-only query surface over the store and the indicator engine. Reports
// are recomputed on demand from the stored series — there is no report
// cache to invalidate.

pub mod rest;
