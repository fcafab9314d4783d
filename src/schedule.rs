//! Declared run cadence, handed to an external scheduler as a cron manifest.
//! Nothing in the crate acts on it.

use serde::Serialize;

/// Route an external scheduler should hit.
pub const SCRAPE_PATH: &str = "/api/scrape";

/// Cadence this job asks for: `@daily`, midnight UTC, as a five-field cron
/// expression.
pub const SCHEDULE_CRON: &str = "0 0 * * *";

#[derive(Debug, Serialize)]
pub struct CronEntry {
    pub path: String,
    pub schedule: String,
}

#[derive(Debug, Serialize)]
pub struct CronManifest {
    pub crons: Vec<CronEntry>,
}

pub fn manifest() -> CronManifest {
    CronManifest {
        crons: vec![CronEntry {
            path: SCRAPE_PATH.to_string(),
            schedule: SCHEDULE_CRON.to_string(),
        }],
    }
}
