//! Periodic discovery of promotion candidates
//!
//! The host hands over every actor that could be a mob; each is considered
//! once. Player-owned actors (pets, summons) are never promoted.

use hashbrown::HashSet;
use tracing::info;

use crate::engine::EliteEngine;
use crate::host::{ActorHandle, Capability, EntityStore, Host};

/// The processed set is only cleared on a purge scan once it grows past this
pub const PROCESSED_CLEAR_THRESHOLD: usize = 5000;

#[derive(Debug, Default)]
pub struct SpawnScanner {
    processed: HashSet<ActorHandle>,
    last_scan: Option<f64>,
    scan_count: u32,
}

/// Outcome of a scan that actually ran
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub scanned: usize,
    pub promoted: usize,
    pub stale_dropped: usize,
}

impl SpawnScanner {
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Claim the scan slot for `now` if the interval has passed
    fn due(&mut self, now: f64, interval: f64) -> bool {
        if let Some(last) = self.last_scan
            && now - last < interval
        {
            return false;
        }
        self.last_scan = Some(now);
        true
    }

    /// Count a finished scan. True when registry hygiene should run.
    fn finish(&mut self, purge_every: u32) -> bool {
        self.scan_count += 1;
        if self.scan_count < purge_every.max(1) {
            return false;
        }
        self.scan_count = 0;
        if self.processed.len() > PROCESSED_CLEAR_THRESHOLD {
            self.processed.clear();
        }
        true
    }
}

/// True if `actor` or its owner is owned by a player
fn is_player_owned<H: EntityStore>(host: &H, actor: ActorHandle) -> bool {
    let Some(owner) = host.owner_of(actor) else {
        return false;
    };
    if host.has_capability(owner, Capability::Player) {
        return true;
    }
    host.owner_of(owner)
        .is_some_and(|grand| host.has_capability(grand, Capability::Player))
}

impl<H: Host> EliteEngine<H> {
    /// Consider newly seen candidates for automatic promotion.
    ///
    /// Returns None when the system is disabled or the scan interval has not
    /// elapsed since the previous scan.
    pub fn scan(&mut self, now: f64, candidates: &[ActorHandle]) -> Option<ScanReport> {
        if !self.config.enabled || !self.scanner.due(now, self.config.scan_interval_secs) {
            return None;
        }

        let mut report = ScanReport::default();
        for &actor in candidates {
            if !self.host.exists(actor) || !self.scanner.processed.insert(actor) {
                continue;
            }
            report.scanned += 1;

            if is_player_owned(&self.host, actor) {
                continue;
            }
            if self.try_promote(actor) {
                report.promoted += 1;
            }
        }

        if report.scanned > 0 {
            info!(
                scanned = report.scanned,
                promoted = report.promoted,
                "Scanned new actors"
            );
        }

        if self.scanner.finish(self.config.purge_every_scans) {
            report.stale_dropped = self.cleanup_stale();
        }

        Some(report)
    }

    pub fn scanner(&self) -> &SpawnScanner {
        &self.scanner
    }
}
