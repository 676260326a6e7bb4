// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for context.rs

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::adapters::HttpProxyAdapter;
    use crate::test_support::{httpproxy, settings, RecordingPublisher};

    const WINDOW: Duration = Duration::from_secs(5);

    fn context() -> (Arc<ReconcilerContext>, Scheduler) {
        ReconcilerContext::new(
            Arc::new(RecordingPublisher::default()),
            settings(ConfigFormat::Hosts),
        )
    }

    #[test]
    fn test_first_request_schedules_one_window_out() {
        let mut schedule = PendingReconcile::default();
        let now = Instant::now();

        assert_eq!(schedule.state(), ReconcileState::Idle);
        assert_eq!(schedule.request(now, WINDOW), Some(now + WINDOW));
        assert_eq!(schedule.state(), ReconcileState::Pending);
        assert_eq!(schedule.next_eligible_run(), Some(now + WINDOW));
    }

    #[test]
    fn test_requests_while_pending_are_coalesced() {
        let mut schedule = PendingReconcile::default();
        let now = Instant::now();
        schedule.request(now, WINDOW);

        assert_eq!(schedule.request(now + Duration::from_secs(1), WINDOW), None);
        assert_eq!(schedule.request(now + Duration::from_secs(4), WINDOW), None);
        // Past the deadline but the pass has not taken its snapshot yet
        assert_eq!(schedule.request(now + Duration::from_secs(6), WINDOW), None);
        assert_eq!(schedule.next_eligible_run(), Some(now + WINDOW));
    }

    #[test]
    fn test_request_during_run_schedules_next_pass() {
        let mut schedule = PendingReconcile::default();
        let now = Instant::now();
        schedule.request(now, WINDOW);

        let started = now + WINDOW;
        schedule.begin_run();
        assert_eq!(schedule.state(), ReconcileState::Running);

        let during = started + Duration::from_millis(200);
        assert_eq!(schedule.request(during, WINDOW), Some(during + WINDOW));
        assert_eq!(schedule.state(), ReconcileState::Pending);

        schedule.finish_run();
        assert_eq!(schedule.state(), ReconcileState::Pending);
    }

    #[test]
    fn test_passes_never_start_closer_than_one_window() {
        let mut schedule = PendingReconcile::default();
        let now = Instant::now();
        let first = schedule.request(now, WINDOW).expect("first pass");

        // A pass that began early must not let the next one start early
        schedule.begin_run();
        schedule.finish_run();
        let early = now + Duration::from_secs(1);
        let second = schedule.request(early, WINDOW).expect("second pass");

        assert!(second >= first + WINDOW);
    }

    #[test]
    fn test_finish_run_returns_to_idle() {
        let mut schedule = PendingReconcile::default();
        schedule.request(Instant::now(), WINDOW);
        schedule.begin_run();
        schedule.finish_run();

        assert_eq!(schedule.state(), ReconcileState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_or_update_stores_and_schedules() {
        let (ctx, _scheduler) = context();
        assert_eq!(ctx.reconcile_state().await, ReconcileState::Idle);

        ctx.add_or_update("app.example.com", "10.0.0.5").await;

        assert_eq!(
            ctx.hostnames().await,
            vec![HostnameRecord::new("app.example.com", "10.0.0.5")]
        );
        assert_eq!(ctx.reconcile_state().await, ReconcileState::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_keeps_single_deadline() {
        let (ctx, _scheduler) = context();

        ctx.add_or_update("a.example.com", "10.0.0.1").await;
        let deadline = ctx.next_eligible_run().await;

        tokio::time::advance(Duration::from_secs(2)).await;
        ctx.add_or_update("b.example.com", "10.0.0.2").await;
        ctx.remove("a.example.com").await;

        assert_eq!(ctx.next_eligible_run().await, deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_unknown_hostname_still_requests_reconcile() {
        let (ctx, _scheduler) = context();

        ctx.remove("missing.example.com").await;

        assert!(ctx.hostnames().await.is_empty());
        assert_eq!(ctx.reconcile_state().await, ReconcileState::Pending);
    }

    #[tokio::test]
    async fn test_concurrent_mutations_are_not_lost() {
        let (ctx, _scheduler) = context();

        let mut handles = Vec::new();
        for i in 0..50 {
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                ctx.add_or_update(&format!("host{i}.example.com"), &format!("10.0.0.{i}"))
                    .await;
                if i % 5 == 0 {
                    ctx.remove(&format!("host{i}.example.com")).await;
                }
            }));
        }
        for handle in handles {
            handle.await.expect("task panicked");
        }

        let hostnames = ctx.hostnames().await;
        assert_eq!(hostnames.len(), 40);
        assert!(hostnames.iter().all(|r| !r.hostname.starts_with("host0.")));
    }

    #[tokio::test]
    async fn test_address_cache_operations() {
        let (ctx, _scheduler) = context();

        assert_eq!(ctx.lookup_address("203.0.113.10").await, None);

        ctx.put_address("203.0.113.10", "10.96.0.15").await;
        assert_eq!(
            ctx.lookup_address("203.0.113.10").await,
            Some("10.96.0.15".to_string())
        );

        assert!(!ctx.prune_address("203.0.113.10", "10.96.0.99").await);
        assert!(ctx.prune_address("203.0.113.10", "10.96.0.15").await);
        assert_eq!(ctx.lookup_address("203.0.113.10").await, None);
    }

    #[tokio::test]
    async fn test_cache_only_changes_do_not_schedule() {
        let (ctx, _scheduler) = context();

        ctx.put_address("203.0.113.10", "10.96.0.15").await;

        assert_eq!(ctx.reconcile_state().await, ReconcileState::Idle);
    }

    #[tokio::test]
    async fn test_extract_address_uses_current_cache() {
        let (ctx, _scheduler) = context();
        let obj = httpproxy("web", Some("app.example.com"), Some("203.0.113.10"));

        assert_eq!(ctx.extract_address(&HttpProxyAdapter, &obj).await, None);

        ctx.put_address("203.0.113.10", "10.96.0.15").await;
        assert_eq!(
            ctx.extract_address(&HttpProxyAdapter, &obj).await,
            Some("10.96.0.15".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_published_seeds_and_schedules() {
        let (ctx, _scheduler) = context();

        ctx.observe_published("# Generated by dnshortcut").await;

        assert_eq!(
            ctx.last_published().await,
            Some("# Generated by dnshortcut".to_string())
        );
        assert_eq!(ctx.reconcile_state().await, ReconcileState::Pending);
    }

    #[tokio::test]
    async fn test_settings_are_exposed() {
        let (ctx, _scheduler) = context();

        assert_eq!(ctx.settings().format, ConfigFormat::Hosts);
        assert_eq!(ctx.settings().target.key, "hosts.override");
        assert_eq!(ctx.settings().debounce, WINDOW);
    }
}
