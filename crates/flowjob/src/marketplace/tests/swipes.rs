use super::common::*;
use crate::marketplace::domain::{BusinessDecision, PairState, SwipeDirection, WorkerId};
use crate::marketplace::error::RecordKind;
use crate::marketplace::{JobId, MarketplaceError};
use std::collections::BTreeSet;

#[tokio::test]
async fn repeated_like_is_recorded_once() {
    let (service, worker, _business, job) = marketplace().await;

    let first = service
        .record_worker_swipe(&worker, &job, SwipeDirection::Like)
        .await
        .expect("first like");
    let second = service
        .record_worker_swipe(&worker, &job, SwipeDirection::Like)
        .await
        .expect("second like");

    assert!(first.newly_recorded);
    assert!(!second.newly_recorded);
    assert_eq!(second.state, PairState::Liked);

    let view = service.worker(&worker).await.expect("worker");
    assert_eq!(view.record.liked_jobs, BTreeSet::from([job.clone()]));
    let job_view = service.job(&job).await.expect("job");
    assert_eq!(job_view.record.applicants, BTreeSet::from([worker.clone()]));
}

#[tokio::test]
async fn like_adds_applicant_without_matching() {
    let (service, worker, _business, job) = marketplace().await;

    let outcome = service
        .record_worker_swipe(&worker, &job, SwipeDirection::Like)
        .await
        .expect("like");

    assert!(outcome.promoted.is_none());
    let worker_view = service.worker(&worker).await.expect("worker");
    let job_view = service.job(&job).await.expect("job");
    assert_eq!(worker_view.record.liked_jobs, BTreeSet::from([job.clone()]));
    assert!(worker_view.matched_jobs.is_empty());
    assert_eq!(job_view.record.applicants, BTreeSet::from([worker]));
    assert!(job_view.matches.is_empty());
}

#[tokio::test]
async fn opposite_swipes_conflict_in_both_orders() {
    let (service, worker, business, job) = marketplace().await;
    let other_job = post_job(&service, &business, "Dishwasher").await;

    service
        .record_worker_swipe(&worker, &job, SwipeDirection::Like)
        .await
        .expect("like");
    match service
        .record_worker_swipe(&worker, &job, SwipeDirection::Dislike)
        .await
    {
        Err(MarketplaceError::SwipeConflict { existing, .. }) => {
            assert_eq!(existing, SwipeDirection::Like)
        }
        other => panic!("expected swipe conflict, got {other:?}"),
    }

    service
        .record_worker_swipe(&worker, &other_job, SwipeDirection::Dislike)
        .await
        .expect("dislike");
    match service
        .record_worker_swipe(&worker, &other_job, SwipeDirection::Like)
        .await
    {
        Err(MarketplaceError::SwipeConflict { existing, .. }) => {
            assert_eq!(existing, SwipeDirection::Dislike)
        }
        other => panic!("expected swipe conflict, got {other:?}"),
    }

    let view = service.worker(&worker).await.expect("worker");
    for job_id in [&job, &other_job] {
        assert!(
            !(view.record.liked_jobs.contains(job_id)
                && view.record.disliked_jobs.contains_key(job_id)),
            "job {job_id} is both liked and disliked"
        );
    }
    let other_view = service.job(&other_job).await.expect("job");
    assert!(other_view.record.applicants.is_empty());
}

#[tokio::test]
async fn dislike_is_idempotent_and_stored_as_flag() {
    let (service, worker, _business, job) = marketplace().await;

    for _ in 0..2 {
        service
            .record_worker_swipe(&worker, &job, SwipeDirection::Dislike)
            .await
            .expect("dislike");
    }

    let view = service.worker(&worker).await.expect("worker");
    assert_eq!(view.record.disliked_jobs.get(&job), Some(&true));
    assert_eq!(view.record.disliked_jobs.len(), 1);
    assert_eq!(
        service.pair_state(&worker, &job).await.expect("state"),
        PairState::Disliked
    );
}

#[tokio::test]
async fn rejection_keeps_like_and_blocks_promotion() {
    let (service, worker, business, job) = marketplace().await;

    service
        .record_worker_swipe(&worker, &job, SwipeDirection::Like)
        .await
        .expect("like");
    let rejected = service
        .record_business_decision(&business, &job, &worker, BusinessDecision::Reject)
        .await
        .expect("reject");
    assert_eq!(rejected.state, PairState::Rejected);

    let job_view = service.job(&job).await.expect("job");
    let first_rejection = *job_view
        .record
        .rejected
        .get(&worker)
        .expect("rejection recorded");
    assert!(job_view.record.applicants.is_empty());

    let worker_view = service.worker(&worker).await.expect("worker");
    assert!(worker_view.record.liked_jobs.contains(&job));

    let again = service
        .record_business_decision(&business, &job, &worker, BusinessDecision::Reject)
        .await
        .expect("repeat reject");
    assert!(!again.newly_recorded);
    let job_view = service.job(&job).await.expect("job");
    assert_eq!(job_view.record.rejected.get(&worker), Some(&first_rejection));

    match service
        .record_business_decision(&business, &job, &worker, BusinessDecision::AcceptApplicant)
        .await
    {
        Err(MarketplaceError::DecisionConflict { .. }) => {}
        other => panic!("expected decision conflict, got {other:?}"),
    }
    assert!(service.job(&job).await.expect("job").matches.is_empty());
}

#[tokio::test]
async fn closed_jobs_refuse_new_likes() {
    let (service, worker, business, job) = marketplace().await;
    service.close_job(&business, &job).await.expect("close");

    match service
        .record_worker_swipe(&worker, &job, SwipeDirection::Like)
        .await
    {
        Err(MarketplaceError::JobClosed(id)) => assert_eq!(id, job),
        other => panic!("expected job closed, got {other:?}"),
    }
    service
        .record_worker_swipe(&worker, &job, SwipeDirection::Dislike)
        .await
        .expect("dislike on a closed job is allowed");
}

#[tokio::test]
async fn unknown_records_are_not_found() {
    let (service, worker, business, job) = marketplace().await;

    match service
        .record_worker_swipe(&WorkerId::from("ghost"), &job, SwipeDirection::Like)
        .await
    {
        Err(MarketplaceError::NotFound {
            kind: RecordKind::Worker,
            ..
        }) => {}
        other => panic!("expected worker not found, got {other:?}"),
    }
    match service
        .record_worker_swipe(&worker, &JobId::from("missing"), SwipeDirection::Like)
        .await
    {
        Err(MarketplaceError::NotFound {
            kind: RecordKind::Job,
            ..
        }) => {}
        other => panic!("expected job not found, got {other:?}"),
    }
    match service
        .record_business_decision(
            &business,
            &job,
            &WorkerId::from("ghost"),
            BusinessDecision::Reject,
        )
        .await
    {
        Err(MarketplaceError::NotFound {
            kind: RecordKind::Worker,
            ..
        }) => {}
        other => panic!("expected worker not found, got {other:?}"),
    }
}

#[tokio::test]
async fn only_the_owning_business_decides() {
    let (service, worker, _business, job) = marketplace().await;
    let rival = register_business(&service, "rival").await;

    match service
        .record_business_decision(&rival, &job, &worker, BusinessDecision::Reject)
        .await
    {
        Err(MarketplaceError::Forbidden { business_id, .. }) => assert_eq!(business_id, rival),
        other => panic!("expected forbidden, got {other:?}"),
    }
    assert!(service
        .job(&job)
        .await
        .expect("job")
        .record
        .rejected
        .is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_likes_keep_every_applicant() {
    let (service, _worker, business, job) = marketplace().await;
    let mut workers = Vec::new();
    for index in 0..8 {
        workers.push(register_worker(&service, &format!("worker_{index}")).await);
    }

    let handles = workers
        .iter()
        .cloned()
        .map(|worker| {
            let service = service.clone();
            let job = job.clone();
            tokio::spawn(async move {
                service
                    .record_worker_swipe(&worker, &job, SwipeDirection::Like)
                    .await
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.await.expect("task joins").expect("like recorded");
    }

    let job_view = service.job(&job).await.expect("job");
    assert_eq!(
        job_view.record.applicants,
        workers.into_iter().collect::<BTreeSet<_>>()
    );
    assert_eq!(job_view.record.business_id, business);
}
