use std::collections::HashMap;
use std::sync::Arc;

use roster_parser::ScheduleEntry;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use crate::vision::RosterImage;

pub struct Config {
    pub enabled: bool,
    pub ttl: Duration,
}

type ImageDigest = [u8; 32];

struct Analysis {
    schedule: Arc<Vec<ScheduleEntry>>,
    expires_at: Instant,
}

/// Schedules already read from a roster photo, keyed by the SHA-256 of the image.
///
/// Entries expire `ttl` after insertion. Expired entries are skipped on lookup
/// and swept on the next insert.
pub struct AnalysisCache {
    enabled: bool,
    ttl: Duration,
    analyses: RwLock<HashMap<ImageDigest, Analysis>>,
}

impl AnalysisCache {
    pub fn new(config: Config) -> Self {
        Self {
            enabled: config.enabled,
            ttl: config.ttl,
            analyses: RwLock::default(),
        }
    }

    pub async fn get(&self, image: &RosterImage) -> Option<Arc<Vec<ScheduleEntry>>> {
        if !self.enabled {
            return None;
        }

        let analyses = self.analyses.read().await;
        let analysis = analyses.get(&digest(image))?;
        (analysis.expires_at > Instant::now()).then(|| Arc::clone(&analysis.schedule))
    }

    pub async fn insert(
        &self,
        image: &RosterImage,
        schedule: Vec<ScheduleEntry>,
    ) -> Arc<Vec<ScheduleEntry>> {
        let schedule = Arc::new(schedule);
        if !self.enabled {
            return schedule;
        }

        let now = Instant::now();
        let mut analyses = self.analyses.write().await;
        analyses.retain(|_, analysis| analysis.expires_at > now);
        analyses.insert(
            digest(image),
            Analysis {
                schedule: Arc::clone(&schedule),
                expires_at: now + self.ttl,
            },
        );

        log::debug!("Cached analysis, {} roster(s) held", analyses.len());
        schedule
    }
}

fn digest(image: &RosterImage) -> ImageDigest {
    Sha256::digest(image.base64().as_bytes()).into()
}
