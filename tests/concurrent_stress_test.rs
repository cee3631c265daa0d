//! Stress tests for the check-then-act paths
//!
//! Many tasks hammer the same identities at once; every "is this new"
//! answer must still be given exactly once per identity.

use beacon::config::CoreConfig;
use beacon::moderation::ContentFilter;
use beacon::ratings::SubmitRatingRequest;
use beacon::Beacon;
use chrono::{TimeZone, Utc};
use std::sync::Arc;

fn create_beacon() -> Arc<Beacon> {
    Arc::new(Beacon::new(
        &CoreConfig::default(),
        ContentFilter::builtin().unwrap(),
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_pings_count_once() {
    let beacon = create_beacon();
    let now = Utc.with_ymd_and_hms(2026, 11, 2, 15, 0, 0).unwrap();

    let mut handles = vec![];

    // 16 tasks, each pinging the same 50 identities
    for _ in 0..16 {
        let beacon = Arc::clone(&beacon);
        handles.push(tokio::spawn(async move {
            let mut new_sessions = 0;
            let mut new_today = 0;
            for i in 0..50 {
                let report = beacon.ping(&format!("visitor-{i}"), now);
                new_sessions += report.is_new_session as u32;
                new_today += report.is_new_today as u32;
            }
            (new_sessions, new_today)
        }));
    }

    let mut new_sessions = 0;
    let mut new_today = 0;
    for handle in handles {
        let (s, t) = handle.await.unwrap();
        new_sessions += s;
        new_today += t;
    }

    assert_eq!(new_sessions, 50, "each identity opens exactly one session");
    assert_eq!(new_today, 50, "each identity is new today exactly once");

    let stats = beacon.stats(now);
    assert_eq!(stats.today, 50);
    assert_eq!(stats.online, 50);
    assert_eq!(stats.total_visits, 800);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_and_reads() {
    let beacon = create_beacon();
    let now = Utc.with_ymd_and_hms(2026, 11, 2, 15, 0, 0).unwrap();

    let mut handles = vec![];

    for task in 0..8 {
        let beacon = Arc::clone(&beacon);
        handles.push(tokio::spawn(async move {
            for i in 0..25 {
                let request = SubmitRatingRequest {
                    user_id: None,
                    sound: Some(4),
                    design: Some(4),
                    remix: Some(4),
                    song: Some(4),
                    comment: None,
                };
                // Every task resubmits for the same 25 identities
                let submission = request.validate(format!("rater-{i}")).unwrap();
                beacon.submit_rating(submission, now).unwrap();
                if task % 2 == 0 {
                    beacon.ratings(now);
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = beacon.ratings(now);
    assert_eq!(snapshot.count, 25, "resubmissions inside the edit window replace");
    assert_eq!(snapshot.average, 4.0);
}
