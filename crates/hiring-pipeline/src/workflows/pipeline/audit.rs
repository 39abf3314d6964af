use std::collections::HashMap;

use super::access::AccessGuard;
use super::domain::{Actor, JobId, MovementRecord};
use super::error::PipelineError;
use super::repository::JobRepository;

/// Filter a candidate's movement records down to what `actor` may see, oldest first.
///
/// Records for jobs outside the actor's company are omitted rather than reported, as are
/// records whose job no longer resolves. Super-admins see everything.
pub fn visible_history(
    guard: &AccessGuard,
    actor: &Actor,
    records: Vec<MovementRecord>,
    jobs: &dyn JobRepository,
) -> Result<Vec<MovementRecord>, PipelineError> {
    let mut visibility: HashMap<JobId, bool> = HashMap::new();
    let mut visible = Vec::with_capacity(records.len());

    for record in records {
        let allowed = match visibility.get(&record.job_id) {
            Some(allowed) => *allowed,
            None => {
                let allowed = match jobs.job(&record.job_id)? {
                    Some(job) => guard.can_view(actor, &job),
                    None => actor.is_super_admin(),
                };
                visibility.insert(record.job_id.clone(), allowed);
                allowed
            }
        };

        if allowed {
            visible.push(record);
        }
    }

    // Stable: records sharing a timestamp keep insertion order.
    visible.sort_by_key(|record| record.moved_at);
    Ok(visible)
}
