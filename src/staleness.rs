/*!
 * Staleness decision between a server and its latest archive
 */

use chrono::{DateTime, Utc};

use crate::timestamp::floor_to_second;

/// Whether a new archive is needed.
///
/// Always true without a previous backup. Otherwise both times are floored
/// to whole seconds and the server must be strictly newer.
pub fn is_backup_required(freshness: DateTime<Utc>, latest_backup: Option<DateTime<Utc>>) -> bool {
    match latest_backup {
        None => true,
        Some(backup) => floor_to_second(freshness) > floor_to_second(backup),
    }
}
