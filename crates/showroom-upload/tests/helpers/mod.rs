pub mod fake_showroom;
pub mod fixtures;

use showroom_core::UploadConfig;

pub use fake_showroom::FakeShowroom;

/// Config with production limits but deterministic timing
pub fn test_config() -> UploadConfig {
    UploadConfig {
        retry_jitter_ms: 0,
        ..UploadConfig::default()
    }
}
