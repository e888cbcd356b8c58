//! Match ledger and promotion rules.
//!
//! The ledger is the single authoritative worker/job match relation. A worker's
//! `matched_jobs` and a job's `matches` are both read out of it, so the two sides can
//! never disagree.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{JobId, MatchRecord, WorkerId};
use super::store::Documents;

#[derive(Debug, Clone, Default)]
pub struct MatchLedger {
    pairs: BTreeMap<(WorkerId, JobId), MatchRecord>,
}

impl MatchLedger {
    pub fn contains(&self, worker_id: &WorkerId, job_id: &JobId) -> bool {
        self.pairs
            .contains_key(&(worker_id.clone(), job_id.clone()))
    }

    pub(crate) fn insert(&mut self, record: MatchRecord) -> bool {
        let key = (record.worker_id.clone(), record.job_id.clone());
        if self.pairs.contains_key(&key) {
            return false;
        }
        self.pairs.insert(key, record);
        true
    }

    pub fn jobs_for(&self, worker_id: &WorkerId) -> BTreeSet<JobId> {
        self.records_for_worker(worker_id)
            .map(|record| record.job_id.clone())
            .collect()
    }

    pub fn workers_for(&self, job_id: &JobId) -> BTreeSet<WorkerId> {
        self.records_for_job(job_id)
            .map(|record| record.worker_id.clone())
            .collect()
    }

    pub fn records_for_worker<'a>(
        &'a self,
        worker_id: &'a WorkerId,
    ) -> impl Iterator<Item = &'a MatchRecord> + 'a {
        self.pairs
            .values()
            .filter(move |record| &record.worker_id == worker_id)
    }

    pub fn records_for_job<'a>(
        &'a self,
        job_id: &'a JobId,
    ) -> impl Iterator<Item = &'a MatchRecord> + 'a {
        self.pairs
            .values()
            .filter(move |record| &record.job_id == job_id)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Why a pair is or is not ready to be promoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    AlreadyMatched,
    NotApplied,
    Rejected,
    AwaitingAcceptance,
}

/// A pair matches when the worker applied, the business did not reject them, and the
/// business explicitly accepted them.
pub fn evaluate(documents: &Documents, worker_id: &WorkerId, job_id: &JobId) -> Eligibility {
    if documents.ledger().contains(worker_id, job_id) {
        return Eligibility::AlreadyMatched;
    }
    let Some(job) = documents.job(job_id) else {
        return Eligibility::NotApplied;
    };
    if job.rejected.contains_key(worker_id) {
        return Eligibility::Rejected;
    }
    if !job.applicants.contains(worker_id) {
        return Eligibility::NotApplied;
    }
    if !job.accepted.contains_key(worker_id) {
        return Eligibility::AwaitingAcceptance;
    }
    Eligibility::Eligible
}

/// Promote the pair if it is eligible. Runs inside the caller's transaction, so the
/// ledger row and the applicant removal commit together.
pub(crate) fn promote_if_eligible(
    documents: &mut Documents,
    worker_id: &WorkerId,
    job_id: &JobId,
    at: DateTime<Utc>,
) -> Option<MatchRecord> {
    if evaluate(documents, worker_id, job_id) != Eligibility::Eligible {
        return None;
    }

    let job = documents.job_mut(job_id)?;
    job.applicants.remove(worker_id);
    job.updated_at = at;
    let record = MatchRecord {
        worker_id: worker_id.clone(),
        job_id: job_id.clone(),
        business_id: job.business_id.clone(),
        matched_at: at,
    };

    if let Some(worker) = documents.worker_mut(worker_id) {
        worker.last_updated_at = at;
    }
    documents.record_match(record.clone());

    info!(worker = %worker_id, job = %job_id, business = %record.business_id, "match promoted");
    Some(record)
}
