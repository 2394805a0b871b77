//! Shared constants

/// Bytes in one megabyte, as used by every size limit.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Multipart field name expected by the per-photo fallback endpoint.
pub const PHOTO_FORM_FIELD: &str = "photo";

/// Path of the presign negotiation endpoint, relative to the API prefix.
pub const PRESIGN_PATH: &str = "/uploads/presign";

/// Collection path of vehicle records, relative to the API prefix.
pub const CARS_PATH: &str = "/cars";
