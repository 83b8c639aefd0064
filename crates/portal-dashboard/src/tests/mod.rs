//! Dashboard behaviour against an in-memory backend.


use std::{pin::pin, sync::Arc};

use portal_core::{
  ValidationError,
  application::{ApplicationId, ApplicationStatus},
  posting::{NewPosting, PostingId, PostingStatus},
  resume::ResumeUpload,
  score::MatchScore,
  session::{Session, ViewerRole},
};

use self::fake::{FakeBackend, application, posting};
use crate::{
  Dashboard, DashboardConfig, LoadError, PostingError, SubmitError, WorkflowError,
  aggregate::{AggregateMetrics, BatchOutcome},
  projection::ViewState,
  workflow::ChangeState,
};

fn dashboard(backend: &Arc<FakeBackend>, role: ViewerRole) -> Dashboard<FakeBackend> {
  let session = Session::new("rita", role, "token");
  Dashboard::new(Arc::clone(backend), session, DashboardConfig::default())
}

/// Three applications across two postings, all scorable.
fn seeded() -> Arc<FakeBackend> {
  let backend = FakeBackend::with_applications(vec![
    application(1, "10", "Backend Engineer", "ada"),
    application(2, "10", "Backend Engineer", "grace"),
    application(3, "11", "Sales Rep", "linus"),
  ]);
  backend.set_score(1, "8/10");
  backend.set_score(2, "5/10");
  backend.set_score(3, "N/A/10");
  Arc::new(backend)
}

fn pdf() -> ResumeUpload {
  ResumeUpload::new("cv.pdf", Some("application/pdf".into()), &b"%PDF-1.7"[..])
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_keeps_first_position_and_last_content() {
  let mut dup = application(1, "10", "Backend Engineer (updated)", "ada");
  dup.status = ApplicationStatus::Interviewed;
  let backend = Arc::new(FakeBackend::with_applications(vec![
    application(1, "10", "Backend Engineer", "ada"),
    application(2, "11", "Sales Rep", "grace"),
    dup,
  ]));
  let d = dashboard(&backend, ViewerRole::Recruiter);

  let snapshot = d.store().load().await.unwrap();
  let ids: Vec<_> = snapshot.ids().collect();
  assert_eq!(ids, vec![ApplicationId(1), ApplicationId(2)]);
  assert_eq!(snapshot.applications[0].job_title, "Backend Engineer (updated)");
  assert_eq!(snapshot.applications[0].status, ApplicationStatus::Interviewed);
  assert_eq!(backend.calls()[0], "list recruiter");
}

#[tokio::test]
async fn failed_load_clears_the_set_and_its_scores() {
  let backend = seeded();
  let d = dashboard(&backend, ViewerRole::Candidate);
  d.reload().await.unwrap();
  assert_eq!(d.store().len(), 3);
  assert_eq!(d.metrics().total, 3);

  *backend.fail_list.lock().unwrap() = Some("connection refused".into());
  let err = d.reload().await.unwrap_err();
  assert!(matches!(err, LoadError::Backend { role: ViewerRole::Candidate, .. }));
  assert!(d.store().is_empty());
  assert_eq!(d.metrics(), AggregateMetrics::default());
  assert!(d.scores().scores().is_empty());
  assert!(d.page(&ViewState::default()).rows.is_empty());
}

#[tokio::test]
async fn load_alone_does_not_score() {
  let backend = seeded();
  let d = dashboard(&backend, ViewerRole::Recruiter);
  let snapshot = d.load().await.unwrap();
  assert_eq!(snapshot.applications.len(), 3);
  assert_eq!(backend.count("score"), 0);

  d.change_status(ApplicationId(1), ApplicationStatus::Interviewed)
    .await
    .unwrap();
  assert_eq!(backend.count("score"), 0);
  assert_eq!(backend.count("status 1"), 1);
}

#[tokio::test]
async fn every_load_opens_a_new_generation() {
  let backend = seeded();
  let d = dashboard(&backend, ViewerRole::Recruiter);
  let first = d.store().load().await.unwrap().generation;
  let second = d.store().load().await.unwrap().generation;
  assert!(second > first);
  assert_eq!(d.store().generation(), second);
}

// ─── Scores ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_isolates_failures() {
  let backend = seeded();
  backend.scores.lock().unwrap().remove(&ApplicationId(2));
  let d = dashboard(&backend, ViewerRole::Recruiter);

  let outcome = d.reload().await.unwrap();
  let BatchOutcome::Applied(metrics) = outcome else {
    panic!("expected an applied batch");
  };
  assert_eq!(metrics.total, 3);
  assert_eq!(metrics.resolved, 1);
  assert_eq!(metrics.unavailable, 2);
  assert_eq!(metrics.distinct_postings, 2);
  assert_eq!(metrics.average_label(), "8.0");

  assert_eq!(d.scores().score(ApplicationId(1)), MatchScore::Numeric(8.0));
  assert_eq!(d.scores().score(ApplicationId(2)), MatchScore::Unavailable);
  assert!(d.scores().failure(ApplicationId(2)).is_some());
  // A well-formed N/A is not a failure.
  assert!(d.scores().failure(ApplicationId(3)).is_none());
}

#[tokio::test]
async fn metrics_wait_for_the_whole_batch() {
  let backend = seeded();
  let gate = backend.gate_score(2);
  let d = dashboard(&backend, ViewerRole::Recruiter);
  let snapshot = d.store().load().await.unwrap();

  let (outcome, ()) = tokio::join!(d.scores().refresh(&snapshot), async {
    backend.parked.notified().await;
    // Score 1 has been fetched but nothing is merged until 2 settles.
    assert_eq!(d.scores().score(ApplicationId(1)), MatchScore::Pending);
    assert_eq!(d.metrics(), AggregateMetrics::default());
    gate.notify_one();
  });

  assert!(matches!(outcome, BatchOutcome::Applied(ref m) if m.resolved == 2));
  assert_eq!(d.metrics().average, Some(6.5));
}

#[tokio::test]
async fn stale_batches_are_discarded() {
  let backend = seeded();
  backend.set_score(1, "2/10");
  let gate = backend.gate_score(1);
  let d = dashboard(&backend, ViewerRole::Recruiter);
  let old = d.store().load().await.unwrap();

  let (stale, fresh) = tokio::join!(d.scores().refresh(&old), async {
    backend.parked.notified().await;
    backend.ungate_score(1);
    backend.set_score(1, "9/10");
    let new = d.store().load().await.unwrap();
    let fresh = d.scores().refresh(&new).await;
    gate.notify_one();
    fresh
  });

  assert!(matches!(stale, BatchOutcome::Stale { batch, current } if batch < current));
  assert!(matches!(fresh, BatchOutcome::Applied(_)));
  assert_eq!(d.scores().score(ApplicationId(1)), MatchScore::Numeric(9.0));
  assert_eq!(d.metrics().average, Some(7.0));
}

#[tokio::test]
async fn batch_is_stale_once_a_newer_load_is_issued() {
  let backend = seeded();
  let gate = backend.gate_score(1);
  let d = dashboard(&backend, ViewerRole::Recruiter);
  let old = d.store().load().await.unwrap();

  let (stale, newer) = tokio::join!(d.scores().refresh(&old), async {
    backend.parked.notified().await;
    // The newer load fails and nothing refreshes after it.
    *backend.fail_list.lock().unwrap() = Some("connection reset".into());
    let newer = d.store().load().await;
    gate.notify_one();
    newer
  });

  assert!(matches!(newer, Err(LoadError::Backend { .. })));
  assert!(matches!(stale, BatchOutcome::Stale { batch, current } if batch < current));
  assert!(d.store().is_empty());
  assert_eq!(d.metrics(), AggregateMetrics::default());
  assert_eq!(d.scores().score(ApplicationId(1)), MatchScore::Pending);
}

#[tokio::test]
async fn snapshot_from_a_superseded_load_is_not_scored() {
  let backend = seeded();
  let d = dashboard(&backend, ViewerRole::Recruiter);
  let old = d.store().load().await.unwrap();
  d.store().load().await.unwrap();

  let outcome = d.scores().refresh(&old).await;
  assert!(matches!(outcome, BatchOutcome::Stale { .. }));
  assert_eq!(backend.count("score"), 0);
}

#[tokio::test]
async fn resolved_scores_are_cached_and_unavailable_ones_retried() {
  let backend = seeded();
  let d = dashboard(&backend, ViewerRole::Recruiter);
  d.reload().await.unwrap();
  d.reload().await.unwrap();

  assert_eq!(backend.count("score 1"), 1);
  assert_eq!(backend.count("score 2"), 1);
  assert_eq!(backend.count("score 3"), 2);
}

#[tokio::test]
async fn rescore_overwrites_the_cached_value() {
  let backend = seeded();
  let d = dashboard(&backend, ViewerRole::Recruiter);
  d.reload().await.unwrap();

  backend.set_score(3, "4/10");
  assert_eq!(
    d.scores().rescore(ApplicationId(3)).await,
    Some(MatchScore::Numeric(4.0))
  );
  assert_eq!(d.metrics().resolved, 3);
  assert_eq!(d.scores().rescore(ApplicationId(42)).await, None);
}

#[tokio::test]
async fn status_changes_leave_scores_alone() {
  let backend = seeded();
  let d = dashboard(&backend, ViewerRole::Recruiter);
  d.reload().await.unwrap();
  let before = d.metrics();
  let fetches = backend.count("score");

  d.change_status(ApplicationId(1), ApplicationStatus::Selected)
    .await
    .unwrap();

  assert_eq!(backend.count("score"), fetches);
  assert_eq!(d.metrics(), before);
}

// ─── Status workflow ─────────────────────────────────────────────────────────

#[tokio::test]
async fn change_is_optimistic_then_confirmed() {
  let backend = seeded();
  let gate = backend.gate_status();
  let d = dashboard(&backend, ViewerRole::Recruiter);
  d.reload().await.unwrap();
  let id = ApplicationId(1);

  let (result, ()) = tokio::join!(
    d.change_status(id, ApplicationStatus::Interviewed),
    async {
      backend.parked.notified().await;
      assert_eq!(
        d.store().get(id).unwrap().status,
        ApplicationStatus::Interviewed
      );
      assert!(d.workflow().change_state(id).unwrap().is_pending());
      gate.notify_one();
    }
  );

  assert_eq!(result.unwrap().status, ApplicationStatus::Interviewed);
  assert_eq!(
    d.workflow().change_state(id),
    Some(ChangeState::Confirmed {
      status: ApplicationStatus::Interviewed,
    })
  );
}

#[tokio::test]
async fn unconfirmed_change_is_flagged_and_revertible() {
  let backend = seeded();
  *backend.fail_status.lock().unwrap() = Some("Invalid status".into());
  let d = dashboard(&backend, ViewerRole::Recruiter);
  d.reload().await.unwrap();
  let id = ApplicationId(2);

  let err = d
    .change_status(id, ApplicationStatus::Rejected)
    .await
    .unwrap_err();
  let WorkflowError::StatusUpdate(err) = err else {
    panic!("expected a status update error");
  };
  assert_eq!(err.previous, ApplicationStatus::Sent);
  assert_eq!(err.attempted, ApplicationStatus::Rejected);

  assert_eq!(d.store().get(id).unwrap().status, ApplicationStatus::Rejected);
  assert!(d.workflow().change_state(id).unwrap().is_failed());
  assert_eq!(d.workflow().diverged(), vec![id]);

  let reverted = d.revert(id).unwrap();
  assert_eq!(reverted.status, ApplicationStatus::Sent);
  assert_eq!(d.workflow().change_state(id), None);
  assert!(matches!(d.revert(id), Err(WorkflowError::NothingToRevert(_))));
}

#[tokio::test]
async fn chained_failures_keep_the_last_confirmed_status() {
  let backend = seeded();
  *backend.fail_status.lock().unwrap() = Some("Invalid status".into());
  let d = dashboard(&backend, ViewerRole::Recruiter);
  d.reload().await.unwrap();
  let id = ApplicationId(1);

  let _ = d.change_status(id, ApplicationStatus::Rejected).await;
  let err = d
    .change_status(id, ApplicationStatus::Interviewed)
    .await
    .unwrap_err();
  let WorkflowError::StatusUpdate(err) = err else {
    panic!("expected a status update error");
  };
  assert_eq!(err.previous, ApplicationStatus::Sent);
  assert_eq!(
    d.store().get(id).unwrap().status,
    ApplicationStatus::Interviewed
  );
  assert!(matches!(
    d.workflow().change_state(id),
    Some(ChangeState::Failed {
      previous: ApplicationStatus::Sent,
      attempted: ApplicationStatus::Interviewed,
      ..
    })
  ));

  let reverted = d.revert(id).unwrap();
  let server = backend
    .applications
    .lock()
    .unwrap()
    .iter()
    .find(|a| a.id == id)
    .map(|a| a.status);
  assert_eq!(Some(reverted.status), server);
  assert!(d.workflow().diverged().is_empty());
}

#[tokio::test]
async fn candidates_cannot_change_status() {
  let backend = seeded();
  let d = dashboard(&backend, ViewerRole::Candidate);
  d.reload().await.unwrap();

  let err = d
    .change_status(ApplicationId(1), ApplicationStatus::Selected)
    .await
    .unwrap_err();
  assert!(matches!(err, WorkflowError::Forbidden { role: ViewerRole::Candidate }));
  assert_eq!(backend.count("status"), 0);
  assert_eq!(
    d.store().get(ApplicationId(1)).unwrap().status,
    ApplicationStatus::Sent
  );
}

#[tokio::test]
async fn sent_is_never_a_target() {
  let backend = seeded();
  let d = dashboard(&backend, ViewerRole::Recruiter);
  d.reload().await.unwrap();

  let err = d
    .change_status(ApplicationId(1), ApplicationStatus::Sent)
    .await
    .unwrap_err();
  assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

  let err = d
    .change_status(ApplicationId(9), ApplicationStatus::Selected)
    .await
    .unwrap_err();
  assert!(matches!(err, WorkflowError::NotFound(ApplicationId(9))));
  assert_eq!(backend.count("status"), 0);
}

#[tokio::test]
async fn second_change_while_pending_is_rejected() {
  let backend = seeded();
  let gate = backend.gate_status();
  let d = dashboard(&backend, ViewerRole::Recruiter);
  d.reload().await.unwrap();
  let id = ApplicationId(1);

  let (first, second) = tokio::join!(
    d.change_status(id, ApplicationStatus::Interviewed),
    async {
      backend.parked.notified().await;
      let second = d.change_status(id, ApplicationStatus::Rejected).await;
      gate.notify_one();
      second
    }
  );

  assert!(first.is_ok());
  assert!(matches!(second, Err(WorkflowError::Concurrent(_))));
  assert_eq!(backend.count("status"), 1);
  assert_eq!(d.store().get(id).unwrap().status, ApplicationStatus::Interviewed);
}

#[tokio::test]
async fn dropped_change_is_recorded_as_failed() {
  let backend = seeded();
  let _gate = backend.gate_status();
  let d = dashboard(&backend, ViewerRole::Recruiter);
  d.reload().await.unwrap();
  let id = ApplicationId(1);

  {
    let mut change = pin!(d.change_status(id, ApplicationStatus::OnHold));
    assert!(futures::poll!(change.as_mut()).is_pending());
    assert!(d.workflow().change_state(id).unwrap().is_pending());
  }

  assert!(matches!(
    d.workflow().change_state(id),
    Some(ChangeState::Failed {
      previous: ApplicationStatus::Sent,
      attempted: ApplicationStatus::OnHold,
      ..
    })
  ));
  // The slot is free again.
  *backend.status_gate.lock().unwrap() = None;
  d.change_status(id, ApplicationStatus::Selected)
    .await
    .unwrap();
}

#[tokio::test]
async fn reload_forgets_settled_changes() {
  let backend = seeded();
  *backend.fail_status.lock().unwrap() = Some("boom".into());
  let d = dashboard(&backend, ViewerRole::Recruiter);
  d.reload().await.unwrap();
  let _ = d
    .change_status(ApplicationId(1), ApplicationStatus::Selected)
    .await;
  assert_eq!(d.workflow().diverged().len(), 1);

  d.reload().await.unwrap();
  assert!(d.workflow().diverged().is_empty());
  assert_eq!(
    d.store().get(ApplicationId(1)).unwrap().status,
    ApplicationStatus::Sent
  );
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn non_pdf_resumes_never_reach_the_backend() {
  let backend = seeded();
  backend
    .postings
    .lock()
    .unwrap()
    .push(posting("10", PostingStatus::Open));
  let d = dashboard(&backend, ViewerRole::Candidate);

  let resume = ResumeUpload::new("cv.docx", Some("application/msword".into()), &b"PK"[..]);
  let err = d.apply(PostingId::from("10"), resume).await.unwrap_err();
  assert!(matches!(err, SubmitError::Validation(ValidationError::NotPdf { .. })));

  let empty = ResumeUpload::new("cv.pdf", None, Vec::<u8>::new());
  let err = d.apply(PostingId::from("10"), empty).await.unwrap_err();
  assert!(matches!(err, SubmitError::Validation(ValidationError::EmptyResume(_))));
  assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn oversized_resumes_are_rejected() {
  let backend = seeded();
  let config = DashboardConfig {
    max_resume_bytes: 4,
  };
  let d = Dashboard::new(
    Arc::clone(&backend),
    Session::new("ada", ViewerRole::Candidate, "token"),
    config,
  );
  let err = d.apply(PostingId::from("10"), pdf()).await.unwrap_err();
  assert!(matches!(
    err,
    SubmitError::Validation(ValidationError::ResumeTooLarge { limit: 4, .. })
  ));
  assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn closed_and_unknown_postings_are_rejected() {
  let backend = seeded();
  backend
    .postings
    .lock()
    .unwrap()
    .push(posting("11", PostingStatus::Closed));
  let d = dashboard(&backend, ViewerRole::Candidate);

  let err = d.apply(PostingId::from("11"), pdf()).await.unwrap_err();
  assert!(matches!(
    err,
    SubmitError::Validation(ValidationError::PostingClosed(_))
  ));
  let err = d.apply(PostingId::from("12"), pdf()).await.unwrap_err();
  assert!(matches!(err, SubmitError::UnknownPosting(_)));
  assert_eq!(backend.count("submit"), 0);
}

#[tokio::test]
async fn recruiters_cannot_submit() {
  let backend = seeded();
  let d = dashboard(&backend, ViewerRole::Recruiter);
  let err = d.apply(PostingId::from("10"), pdf()).await.unwrap_err();
  assert!(matches!(err, SubmitError::Forbidden { .. }));
  assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn submission_appends_and_scores_the_new_application() {
  let backend = seeded();
  backend
    .postings
    .lock()
    .unwrap()
    .push(posting("10", PostingStatus::Open));
  backend.set_score(101, "7/10");
  let d = dashboard(&backend, ViewerRole::Candidate);
  d.reload().await.unwrap();

  let id = d.apply(PostingId::from("10"), pdf()).await.unwrap();
  assert_eq!(id, ApplicationId(101));
  assert_eq!(d.store().len(), 4);
  assert_eq!(d.scores().score(id), MatchScore::Numeric(7.0));
  assert_eq!(d.metrics().total, 4);
}

// ─── Postings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn posting_writes_are_for_recruiters() {
  let backend = seeded();
  let candidate = dashboard(&backend, ViewerRole::Candidate);
  let draft = NewPosting {
    title:       "Data Engineer".into(),
    description: "Pipelines".into(),
    company:     "Acme".into(),
    location:    "Berlin".into(),
    status:      PostingStatus::Open,
  };

  let err = candidate.postings().create(draft.clone()).await.unwrap_err();
  assert!(matches!(err, PostingError::Forbidden { .. }));
  assert!(matches!(
    candidate.postings().delete(PostingId::from("1")).await,
    Err(PostingError::Forbidden { .. })
  ));
  assert!(backend.calls().is_empty());

  let recruiter = dashboard(&backend, ViewerRole::Recruiter);
  let blank = NewPosting {
    title: " ".into(),
    ..draft.clone()
  };
  assert!(matches!(
    recruiter.postings().create(blank).await,
    Err(PostingError::Validation(ValidationError::MissingField("title")))
  ));
  let created = recruiter.postings().create(draft).await.unwrap();
  assert_eq!(created.title, "Data Engineer");
}

#[tokio::test]
async fn closing_a_posting_updates_its_status() {
  let backend = seeded();
  backend
    .postings
    .lock()
    .unwrap()
    .push(posting("10", PostingStatus::Open));
  let d = dashboard(&backend, ViewerRole::Recruiter);

  let closed = d.postings().close(PostingId::from("10")).await.unwrap();
  assert_eq!(closed.status, PostingStatus::Closed);
  assert!(d.postings().open().await.unwrap().is_empty());

  d.postings().close(PostingId::from("10")).await.unwrap();
  assert_eq!(backend.count("update posting"), 1);

  assert!(matches!(
    d.postings().close(PostingId::from("99")).await,
    Err(PostingError::NotFound(_))
  ));
}

// ─── Projection ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn pages_reflect_search_and_scores() {
  let backend = seeded();
  let d = dashboard(&backend, ViewerRole::Recruiter);
  d.reload().await.unwrap();

  let mut view = ViewState::default();
  view.set_search("grace");
  let page = d.page(&view);
  assert_eq!(page.total_matches, 1);
  assert_eq!(page.rows[0].application.id, ApplicationId(2));
  assert_eq!(page.rows[0].score, MatchScore::Numeric(5.0));
  assert_eq!(page.rows[0].progress, 50);

  view.set_search("");
  assert_eq!(d.page(&view).rows.len(), 3);
}
