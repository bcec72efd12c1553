#[cfg(test)]
mod tests {
    use billable::db::memory::MemoryRepository;
    use billable::db::repository::TimerRepository;
    use billable::libs::clock::ManualClock;
    use billable::libs::entry::{EntryDraft, EntryFilter, NewTimeEntry, TimerContext};
    use billable::libs::error::TrackerError;
    use billable::libs::event::TimerEvent;
    use billable::libs::timer::{StartOutcome, TimerEngine};
    use chrono::{NaiveDate, NaiveDateTime};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use test_context::{test_context, TestContext};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_hms_opt(hour, minute, 0).unwrap()
    }

    struct TimerTestContext {
        repo: MemoryRepository,
        clock: ManualClock,
        engine: TimerEngine<MemoryRepository, ManualClock>,
        client_id: i64,
    }

    impl TestContext for TimerTestContext {
        fn setup() -> Self {
            let repo = MemoryRepository::new();
            let clock = ManualClock::new(at(9, 0));
            let client_id = repo.add_client(None);
            let engine = TimerEngine::new(repo.clone(), clock.clone());
            TimerTestContext {
                repo,
                clock,
                engine,
                client_id,
            }
        }
    }

    impl TimerTestContext {
        fn context(&self, description: &str) -> TimerContext {
            TimerContext::new(description).client(self.client_id)
        }
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_start_closes_previous_timer(ctx: &mut TimerTestContext) {
        let first = ctx.engine.start(&ctx.context("Design")).unwrap();
        ctx.clock.advance_minutes(25);
        let second = ctx.engine.start(&ctx.context("Review")).unwrap();

        assert_eq!(ctx.repo.active_count(), 1);
        assert!(second.is_active);

        let first = ctx.repo.find_entry_by_id(first.id).unwrap().unwrap();
        assert!(!first.is_active);
        assert_eq!(first.end_time, Some(at(9, 25)));
        assert_eq!(first.duration, 25);
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_stop_rounds_up_to_interval(ctx: &mut TimerTestContext) {
        let entry = ctx.engine.start(&ctx.context("Client call")).unwrap();
        ctx.clock.advance_minutes(47);

        let stopped = ctx.engine.stop(entry.id, 15).unwrap().unwrap();

        assert_eq!(stopped.id, entry.id);
        assert_eq!(stopped.duration, 60);
        assert_eq!(stopped.end_time, Some(at(9, 47)));
        assert!(!stopped.is_active);
        assert_eq!(ctx.repo.active_count(), 0);
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_stop_without_rounding_keeps_raw_minutes(ctx: &mut TimerTestContext) {
        let entry = ctx.engine.start(&ctx.context("Client call")).unwrap();
        ctx.clock.advance_minutes(47);

        let stopped = ctx.engine.stop(entry.id, 0).unwrap().unwrap();
        assert_eq!(stopped.duration, 47);
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_stop_is_idempotent(ctx: &mut TimerTestContext) {
        let entry = ctx.engine.start(&ctx.context("Design")).unwrap();
        ctx.clock.advance_minutes(30);
        let first = ctx.engine.stop(entry.id, 0).unwrap().unwrap();

        ctx.clock.advance_minutes(30);
        let second = ctx.engine.stop(entry.id, 15).unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(second.duration, 30);
        assert_eq!(second.end_time, Some(at(9, 30)));
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_stop_unknown_id_stops_running_timer(ctx: &mut TimerTestContext) {
        let running = ctx.engine.start(&ctx.context("Design")).unwrap();
        ctx.clock.advance_minutes(10);

        let stopped = ctx.engine.stop(9_999, 15).unwrap().unwrap();

        assert_eq!(stopped.id, running.id);
        assert_eq!(stopped.duration, 15);
        assert_eq!(ctx.repo.active_count(), 0);
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_stop_unknown_id_with_nothing_running(ctx: &mut TimerTestContext) {
        assert_eq!(ctx.engine.stop(9_999, 15).unwrap(), None);
        assert!(ctx.repo.entries().is_empty());
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_reconcile_keeps_most_recent(ctx: &mut TimerTestContext) {
        // Three active rows, as left behind by an older version or a crash
        let oldest = ctx.repo.create_entry(&NewTimeEntry::running(ctx.context("T1"), at(8, 0))).unwrap();
        let middle = ctx.repo.create_entry(&NewTimeEntry::running(ctx.context("T2"), at(8, 30))).unwrap();
        let newest = ctx.repo.create_entry(&NewTimeEntry::running(ctx.context("T3"), at(8, 45))).unwrap();
        assert_eq!(ctx.repo.active_count(), 3);

        let survivor = ctx.engine.reconcile_single_active().unwrap().unwrap();

        assert_eq!(survivor.id, newest.id);
        assert_eq!(ctx.repo.active_count(), 1);

        let oldest = ctx.repo.find_entry_by_id(oldest.id).unwrap().unwrap();
        let middle = ctx.repo.find_entry_by_id(middle.id).unwrap().unwrap();
        assert_eq!(oldest.duration, 60);
        assert_eq!(middle.duration, 30);
        assert_eq!(oldest.end_time, Some(at(9, 0)));
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_start_heals_several_active_rows(ctx: &mut TimerTestContext) {
        let seeded = [
            ctx.repo.create_entry(&NewTimeEntry::running(ctx.context("T1"), at(8, 0))).unwrap(),
            ctx.repo.create_entry(&NewTimeEntry::running(ctx.context("T2"), at(8, 30))).unwrap(),
            ctx.repo.create_entry(&NewTimeEntry::running(ctx.context("T3"), at(8, 45))).unwrap(),
        ];

        let started = ctx.engine.start(&ctx.context("Fresh")).unwrap();

        assert_eq!(ctx.repo.active_count(), 1);
        assert!(ctx.repo.find_entry_by_id(started.id).unwrap().unwrap().is_active);
        for entry in &seeded {
            let closed = ctx.repo.find_entry_by_id(entry.id).unwrap().unwrap();
            assert!(!closed.is_active);
            assert!(closed.duration >= 0);
            assert_eq!(closed.end_time, Some(at(9, 0)));
        }
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_stop_unknown_id_closes_every_active_row(ctx: &mut TimerTestContext) {
        let older = ctx.repo.create_entry(&NewTimeEntry::running(ctx.context("T1"), at(8, 0))).unwrap();
        let newest = ctx.repo.create_entry(&NewTimeEntry::running(ctx.context("T2"), at(8, 50))).unwrap();

        let stopped = ctx.engine.stop(9_999, 15).unwrap().unwrap();

        assert_eq!(stopped.id, newest.id);
        assert_eq!(stopped.duration, 15);
        assert_eq!(ctx.repo.active_count(), 0);

        // The extra row keeps its raw minutes
        let older = ctx.repo.find_entry_by_id(older.id).unwrap().unwrap();
        assert!(!older.is_active);
        assert_eq!(older.duration, 60);
        assert!(ctx.repo.entries().iter().all(|entry| entry.duration >= 0));
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_active_timer_right_after_start(ctx: &mut TimerTestContext) {
        let started = ctx.engine.start(&ctx.context("Design")).unwrap();

        let active = ctx.engine.active_timer().unwrap().unwrap();

        assert_eq!(active.id, started.id);
        assert!(active.is_active);
        assert_eq!(active.duration, 0);
        assert_eq!(active.end_time, None);
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_huge_rounding_interval_never_bills_less(ctx: &mut TimerTestContext) {
        let entry = ctx.engine.start(&ctx.context("Design")).unwrap();
        ctx.clock.set(at(9, 47));

        let stopped = ctx.engine.stop(entry.id, i64::MAX - 10).unwrap().unwrap();

        assert_eq!(stopped.duration, i64::MAX - 10);
        assert!(stopped.duration >= 47);
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_active_timer_reconciles(ctx: &mut TimerTestContext) {
        ctx.repo.create_entry(&NewTimeEntry::running(ctx.context("T1"), at(8, 0))).unwrap();
        let newest = ctx.repo.create_entry(&NewTimeEntry::running(ctx.context("T2"), at(8, 30))).unwrap();

        let active = ctx.engine.active_timer().unwrap().unwrap();

        assert_eq!(active.id, newest.id);
        assert_eq!(ctx.repo.active_count(), 1);
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_active_timer_when_idle(ctx: &mut TimerTestContext) {
        assert_eq!(ctx.engine.active_timer().unwrap(), None);
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_quick_resume_within_grace_window(ctx: &mut TimerTestContext) {
        let entry = ctx.engine.start(&ctx.context("Design")).unwrap();
        ctx.clock.advance_minutes(30);
        ctx.engine.stop(entry.id, 0).unwrap();
        ctx.clock.advance_minutes(10);

        let outcome = ctx.engine.start_or_resume(&ctx.context("Design"), 15).unwrap();

        match outcome {
            StartOutcome::Resumed(resumed) => {
                assert_eq!(resumed.id, entry.id);
                assert_eq!(resumed.start_time, at(9, 40));
                assert_eq!(resumed.end_time, None);
                assert!(resumed.is_active);
            }
            other => panic!("expected a resume, got {:?}", other),
        }
        assert_eq!(ctx.repo.entries().len(), 1);
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_quick_resume_outside_grace_window(ctx: &mut TimerTestContext) {
        let entry = ctx.engine.start(&ctx.context("Design")).unwrap();
        ctx.clock.advance_minutes(30);
        ctx.engine.stop(entry.id, 0).unwrap();
        ctx.clock.advance_minutes(16);

        let outcome = ctx.engine.start_or_resume(&ctx.context("Design"), 15).unwrap();

        assert!(matches!(outcome, StartOutcome::Started(_)));
        assert_ne!(outcome.entry().id, entry.id);
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_quick_resume_requires_same_work(ctx: &mut TimerTestContext) {
        let entry = ctx.engine.start(&ctx.context("Design")).unwrap();
        ctx.clock.advance_minutes(30);
        ctx.engine.stop(entry.id, 0).unwrap();
        ctx.clock.advance_minutes(5);

        let other_description = ctx.engine.start_or_resume(&ctx.context("Review"), 15).unwrap();
        assert!(matches!(other_description, StartOutcome::Started(_)));

        ctx.engine.stop(other_description.entry().id, 0).unwrap();
        let other_client = ctx.repo.add_client(None);
        let outcome = ctx
            .engine
            .start_or_resume(&TimerContext::new("Review").client(other_client), 15)
            .unwrap();
        assert!(matches!(outcome, StartOutcome::Started(_)));
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_zero_grace_always_starts_new(ctx: &mut TimerTestContext) {
        let entry = ctx.engine.start(&ctx.context("Design")).unwrap();
        ctx.engine.stop(entry.id, 0).unwrap();

        let outcome = ctx.engine.start_or_resume(&ctx.context("Design"), 0).unwrap();
        assert!(matches!(outcome, StartOutcome::Started(_)));
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_resume_closes_running_timer(ctx: &mut TimerTestContext) {
        let old = ctx.engine.start(&ctx.context("Design")).unwrap();
        ctx.clock.advance_minutes(20);
        ctx.engine.stop(old.id, 0).unwrap();
        let running = ctx.engine.start(&ctx.context("Review")).unwrap();
        ctx.clock.advance_minutes(40);

        let resumed = ctx.engine.resume(old.id).unwrap();

        assert!(resumed.is_active);
        assert_eq!(resumed.start_time, at(10, 0));
        assert_eq!(resumed.duration, 0);
        assert_eq!(resumed.description, "Design");
        assert_eq!(ctx.repo.active_count(), 1);

        let running = ctx.repo.find_entry_by_id(running.id).unwrap().unwrap();
        assert!(!running.is_active);
        assert_eq!(running.duration, 40);
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_resume_missing_entry(ctx: &mut TimerTestContext) {
        let err = ctx.engine.resume(42).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_manual_entry_validation(ctx: &mut TimerTestContext) {
        let missing_start = EntryDraft {
            context: ctx.context("Workshop"),
            start_time: None,
            end_time: Some(at(10, 0)),
        };
        assert!(matches!(ctx.engine.add_manual_entry(&missing_start, 0), Err(TrackerError::Validation(_))));

        let backwards = EntryDraft {
            context: ctx.context("Workshop"),
            start_time: Some(at(11, 0)),
            end_time: Some(at(10, 0)),
        };
        assert!(matches!(ctx.engine.add_manual_entry(&backwards, 0), Err(TrackerError::Validation(_))));
        assert!(ctx.repo.entries().is_empty());
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_manual_entry_leaves_running_timer_alone(ctx: &mut TimerTestContext) {
        let running = ctx.engine.start(&ctx.context("Design")).unwrap();

        let draft = EntryDraft {
            context: ctx.context("Workshop"),
            start_time: Some(at(7, 0)),
            end_time: Some(at(7, 50)),
        };
        let entry = ctx.engine.add_manual_entry(&draft, 15).unwrap();

        assert!(!entry.is_active);
        assert_eq!(entry.duration, 60);
        assert!(ctx.repo.find_entry_by_id(running.id).unwrap().unwrap().is_active);
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_delete_refuses_running_entry(ctx: &mut TimerTestContext) {
        let running = ctx.engine.start(&ctx.context("Design")).unwrap();
        assert!(matches!(ctx.engine.delete_entry(running.id), Err(TrackerError::Validation(_))));

        ctx.engine.stop(running.id, 0).unwrap();
        ctx.engine.delete_entry(running.id).unwrap();
        assert!(ctx.repo.entries().is_empty());
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_list_entries_filters_by_client(ctx: &mut TimerTestContext) {
        let other_client = ctx.repo.add_client(None);
        ctx.engine.start(&ctx.context("Mine")).unwrap();
        ctx.engine.start(&TimerContext::new("Theirs").client(other_client)).unwrap();

        let filter = EntryFilter {
            client_id: Some(other_client),
            ..Default::default()
        };
        let entries = ctx.engine.list_entries(&filter).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "Theirs");
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_single_active_over_operation_sequence(ctx: &mut TimerTestContext) {
        let mut ids = Vec::new();
        for step in 0..40_i64 {
            ctx.clock.advance_minutes(7);
            match step % 5 {
                0 | 3 => ids.push(ctx.engine.start(&ctx.context(&format!("Work {}", step % 3))).unwrap().id),
                1 => {
                    let target = ids.get((step as usize * 7) % ids.len().max(1)).copied().unwrap_or(0);
                    ctx.engine.stop(target, 15).unwrap();
                }
                2 => {
                    if let Some(id) = ids.first().copied() {
                        ctx.engine.resume(id).unwrap();
                    }
                }
                _ => {
                    ctx.engine.start_or_resume(&ctx.context("Work 1"), 15).unwrap();
                }
            }
            assert!(ctx.repo.active_count() <= 1, "step {} left several timers running", step);
        }
    }

    #[test_context(TimerTestContext)]
    #[test]
    fn test_listeners_see_committed_changes(ctx: &mut TimerTestContext) {
        let events: Arc<Mutex<Vec<TimerEvent>>> = Arc::default();
        let sink = events.clone();
        let engine = TimerEngine::new(ctx.repo.clone(), ctx.clock.clone()).with_listener(move |event: &TimerEvent| sink.lock().push(event.clone()));

        let first = engine.start(&ctx.context("Design")).unwrap();
        ctx.clock.advance_minutes(5);
        let second = engine.start(&ctx.context("Review")).unwrap();

        let events = events.lock();
        assert_eq!(events.len(), 5);
        assert!(matches!(&events[0], TimerEvent::Started(entry) if entry.id == first.id));
        assert_eq!(events[1], TimerEvent::ActiveChanged(Some(first.id)));
        assert!(matches!(&events[2], TimerEvent::Stopped(entry) if entry.id == first.id));
        assert!(matches!(&events[3], TimerEvent::Started(entry) if entry.id == second.id));
        assert_eq!(events[4], TimerEvent::ActiveChanged(Some(second.id)));
    }
}
