//! View Integration Tests
//!
//! CollectionView and LeadBoard over in-memory repositories.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::domain::{
        DomainError, DomainResult, Draft, Lead, LeadStatus, Record, Subscriber, SubscriberStatus,
    };
    use crate::repository::{
        BulkOutcome, BulkRepository, InMemoryRepository, Repository, SearchableRepository,
        StatsRepository,
    };
    use crate::view::{
        BulkOperation, CollectionView, LeadBoard, LoadState, MoveOutcome, NoticeLevel,
        PendingAction, ViewConfig,
    };

    /// In-memory store whose reads or writes can be switched off
    struct FlakyRepository<T> {
        inner: InMemoryRepository<T>,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl<T: Record> FlakyRepository<T> {
        fn with_items(items: Vec<T>) -> Self {
            Self {
                inner: InMemoryRepository::with_items(items),
                fail_reads: AtomicBool::new(false),
                fail_writes: AtomicBool::new(false),
            }
        }

        fn reads_ok(&self) -> DomainResult<()> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(DomainError::Network("connection refused".into()));
            }
            Ok(())
        }

        fn writes_ok(&self) -> DomainResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(DomainError::Network("connection refused".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl<T: Record> Repository<T> for FlakyRepository<T> {
        async fn create(&self, entity: &T) -> DomainResult<T> {
            self.writes_ok()?;
            self.inner.create(entity).await
        }

        async fn find_by_id(&self, id: &str) -> DomainResult<Option<T>> {
            self.reads_ok()?;
            self.inner.find_by_id(id).await
        }

        async fn list(&self) -> DomainResult<Vec<T>> {
            self.reads_ok()?;
            self.inner.list().await
        }

        async fn update(&self, entity: &T) -> DomainResult<T> {
            self.writes_ok()?;
            self.inner.update(entity).await
        }

        async fn delete(&self, id: &str) -> DomainResult<()> {
            self.writes_ok()?;
            self.inner.delete(id).await
        }
    }

    #[async_trait]
    impl<T: Record> BulkRepository<T> for FlakyRepository<T> {}

    #[async_trait]
    impl<T: Record> StatsRepository<T> for FlakyRepository<T> {}

    #[async_trait]
    impl<T: Record> SearchableRepository<T> for FlakyRepository<T> {}

    /// 30 subscribers, ids 1..=30; 12 are active (i % 5 < 2)
    fn thirty_subscribers() -> Vec<Subscriber> {
        (1..=30)
            .map(|i| {
                let email = format!("user{}@example.com", i);
                let mut s = Subscriber::new(&i.to_string(), &email, "footer");
                if i % 5 >= 2 {
                    s.status = SubscriberStatus::Unsubscribed;
                }
                s
            })
            .collect()
    }

    type SubscriberView = CollectionView<Subscriber, FlakyRepository<Subscriber>>;

    async fn subscriber_view() -> (Arc<FlakyRepository<Subscriber>>, SubscriberView) {
        let repo = Arc::new(FlakyRepository::with_items(thirty_subscribers()));
        let mut view = CollectionView::new(repo.clone(), ViewConfig::subscriber_table());
        view.refresh().await.expect("refresh");
        (repo, view)
    }

    #[tokio::test]
    async fn test_active_filter_pagination_scenario() {
        let (_repo, mut view) = subscriber_view().await;
        assert_eq!(view.items().len(), 30);

        view.set_filter("status", "active");
        view.set_page(2);
        let page = view.current_page();
        assert_eq!(page.total_items, 12);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.ids(), vec!["26", "30"]);

        view.set_page(5);
        assert_eq!(view.current_page().page, 2);
        assert_eq!(view.query().page, 2);

        view.set_page(-3);
        assert_eq!(view.current_page().page, 1);
    }

    #[tokio::test]
    async fn test_query_changes_return_to_first_page() {
        let (_repo, mut view) = subscriber_view().await;

        view.set_page(3);
        view.set_search("user1");
        assert_eq!(view.query().page, 1);

        view.set_page(2);
        view.set_filter("source", "footer");
        assert_eq!(view.query().page, 1);

        view.set_page(2);
        view.set_page_size(25);
        assert_eq!(view.query().page, 1);
    }

    #[tokio::test]
    async fn test_selection_survives_pagination() {
        let (_repo, mut view) = subscriber_view().await;

        view.toggle_selected("1");
        view.next_page();
        assert_eq!(view.current_page().ids()[0], "11");
        view.toggle_selected("11");

        view.previous_page();
        assert_eq!(view.current_page().page, 1);
        assert!(view.selection().is_selected("1"));
        assert!(view.selection().is_selected("11"));
        assert_eq!(view.selection().len(), 2);
    }

    #[tokio::test]
    async fn test_select_all_covers_visible_page() {
        let (_repo, mut view) = subscriber_view().await;

        view.toggle_select_all();
        assert_eq!(view.selection().len(), 10);
        assert!(view.is_all_selected());

        view.toggle_select_all();
        assert!(view.selection().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_bulk_delete() {
        let (repo, mut view) = subscriber_view().await;

        for id in ["2", "3", "4"] {
            view.toggle_selected(id);
        }
        view.request_bulk(BulkOperation::Delete);
        assert_eq!(view.pending(), Some(&PendingAction::Bulk(BulkOperation::Delete)));

        let outcome = view.resolve_pending(true).await.unwrap();
        assert_eq!(outcome, Some(BulkOutcome { succeeded: 3, failed: 0 }));
        assert_eq!(view.items().len(), 27);
        assert_eq!(repo.inner.len().await, 27);
        assert!(view.selection().is_empty());
        assert_eq!(view.load_state(), &LoadState::Ready);
        assert!(view.pending().is_none());
    }

    #[tokio::test]
    async fn test_emptied_last_page_clamps_back() {
        let (_repo, mut view) = subscriber_view().await;

        view.set_page(3);
        view.toggle_select_all();
        assert_eq!(view.selection().len(), 10);
        view.run_bulk(BulkOperation::Delete).await.unwrap();

        assert_eq!(view.items().len(), 20);
        assert_eq!(view.query().page, 2);
        assert_eq!(view.current_page().ids()[0], "11");
    }

    #[tokio::test]
    async fn test_declined_confirmation_changes_nothing() {
        let (_repo, mut view) = subscriber_view().await;

        view.request_delete("5");
        assert_eq!(view.resolve_pending(false).await.unwrap(), None);
        assert!(view.pending().is_none());
        assert_eq!(view.items().len(), 30);
    }

    #[tokio::test]
    async fn test_single_delete_deselects() {
        let (_repo, mut view) = subscriber_view().await;

        view.toggle_selected("5");
        view.toggle_selected("6");
        view.request_delete("5");
        view.resolve_pending(true).await.unwrap();

        assert_eq!(view.items().len(), 29);
        assert!(!view.selection().is_selected("5"));
        assert!(view.selection().is_selected("6"));
    }

    #[tokio::test]
    async fn test_bulk_status_change() {
        let (_repo, mut view) = subscriber_view().await;

        view.toggle_selected("1");
        view.toggle_selected("5");
        let outcome = view
            .run_bulk(BulkOperation::SetStatus(SubscriberStatus::Bounced))
            .await
            .unwrap();
        assert_eq!(outcome.succeeded, 2);

        view.set_filter("status", "bounced");
        let ids: Vec<String> = view.filtered().iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec!["1", "5"]);
        assert_eq!(view.notice().map(|n| n.level), Some(NoticeLevel::Success));
    }

    #[tokio::test]
    async fn test_bulk_total_failure_keeps_selection() {
        let (repo, mut view) = subscriber_view().await;

        view.toggle_selected("1");
        view.toggle_selected("2");
        repo.fail_writes.store(true, Ordering::SeqCst);

        let result = view.run_bulk(BulkOperation::Delete).await;
        assert!(matches!(result, Err(DomainError::Network(_))));
        assert_eq!(view.selection().len(), 2);
        assert!(view.notice().is_some_and(|n| n.is_error()));
        assert_eq!(view.items().len(), 30);
    }

    #[tokio::test]
    async fn test_fetch_failure_sets_error_state() {
        let (repo, mut view) = subscriber_view().await;

        repo.fail_reads.store(true, Ordering::SeqCst);
        assert!(view.refresh().await.is_err());
        assert!(matches!(
            view.load_state(),
            LoadState::Failed(msg) if msg.contains("connection refused")
        ));

        repo.fail_reads.store(false, Ordering::SeqCst);
        view.refresh().await.unwrap();
        assert_eq!(view.load_state(), &LoadState::Ready);
    }

    #[tokio::test]
    async fn test_stale_fetch_is_discarded() {
        let (_repo, mut view) = subscriber_view().await;

        let first = view.begin_fetch();
        let second = view.begin_fetch();
        assert!(view.complete_fetch(second, Ok(thirty_subscribers()[..3].to_vec())));
        assert!(!view.complete_fetch(first, Ok(Vec::new())));
        assert_eq!(view.items().len(), 3);
    }

    #[tokio::test]
    async fn test_closed_view_ignores_late_response() {
        let (_repo, mut view) = subscriber_view().await;

        let ticket = view.begin_fetch();
        view.close();
        assert!(!view.complete_fetch(ticket, Ok(thirty_subscribers())));
        assert!(view.items().is_empty());
        assert_eq!(view.load_state(), &LoadState::Idle);
    }

    #[tokio::test]
    async fn test_refresh_prunes_selection() {
        let (repo, mut view) = subscriber_view().await;

        view.toggle_selected("7");
        view.toggle_selected("8");
        repo.inner.delete("7").await.unwrap();
        view.refresh().await.unwrap();

        assert!(!view.selection().is_selected("7"));
        assert_eq!(view.selection().len(), 1);
    }

    #[tokio::test]
    async fn test_add_is_optimistic_and_confirmed() {
        let (_repo, mut view) = subscriber_view().await;

        let created = view.add(Subscriber::new("", "new@example.com", "quote")).await.unwrap();
        assert_eq!(created.id, "31");
        assert_eq!(view.items().last().map(|s| s.id.as_str()), Some("31"));
        assert!(created.created_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_add_rolls_back() {
        let (repo, mut view) = subscriber_view().await;

        repo.fail_writes.store(true, Ordering::SeqCst);
        let result = view.add(Subscriber::new("", "new@example.com", "quote")).await;
        assert!(result.is_err());
        assert_eq!(view.items().len(), 30);
        assert!(view.items().iter().all(|s| s.email != "new@example.com"));
    }

    #[tokio::test]
    async fn test_conflicting_add_keeps_existing_item() {
        let (repo, mut view) = subscriber_view().await;

        // Refresh after the failure cannot repair the list
        repo.fail_reads.store(true, Ordering::SeqCst);
        let result = view.add(Subscriber::new("5", "dup@example.com", "quote")).await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
        assert_eq!(view.items().len(), 30);
        let kept: Vec<&Subscriber> = view.items().iter().filter(|s| s.id == "5").collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].email, "user5@example.com");
    }

    #[tokio::test]
    async fn test_invalid_draft_is_rejected_before_insert() {
        let (_repo, mut view) = subscriber_view().await;

        let result = view.add_draft(&Draft::new().with("email", "not an email")).await;
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
        assert_eq!(view.items().len(), 30);
    }

    #[tokio::test]
    async fn test_import_reports_counts() {
        let (_repo, mut view) = subscriber_view().await;

        let csv = "Email,Name,Tags\nann@example.com,Ann,vip\n,No Email,\n\
                   bo@example.com,Bo,\nbroken,Bad,";
        let outcome = view.import_csv(csv).await.unwrap();
        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.rejected, 2);
        assert_eq!(view.items().len(), 32);
        assert_eq!(view.notice().map(|n| n.message.as_str()), Some("2 imported, 2 rejected"));
    }

    #[tokio::test]
    async fn test_import_with_backend_down_fails() {
        let (repo, mut view) = subscriber_view().await;

        repo.fail_writes.store(true, Ordering::SeqCst);
        let result = view.import_csv("email\nann@example.com").await;
        assert!(matches!(result, Err(DomainError::Network(_))));
    }

    #[tokio::test]
    async fn test_export_prefers_selection_then_filter() {
        let (_repo, mut view) = subscriber_view().await;

        view.set_filter("status", "active");
        let filtered = view.export_csv().unwrap();
        assert_eq!(filtered.lines().count(), 13);

        view.toggle_selected("3");
        view.toggle_selected("2");
        let selected = view.export_csv().unwrap();
        let rows: Vec<&str> = selected.lines().skip(1).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("\"user2@example.com\""));
        assert!(rows[1].starts_with("\"user3@example.com\""));
    }

    #[tokio::test]
    async fn test_filter_options_and_stats() {
        let (_repo, mut view) = subscriber_view().await;

        assert_eq!(view.filter_options("status"), vec!["active", "unsubscribed"]);

        let stats = view.stats().await.unwrap();
        assert_eq!(stats.total, 30);
        assert_eq!(stats.count("active"), 12);
        assert_eq!(stats.count("bounced"), 0);
    }

    fn pipeline() -> Vec<Lead> {
        vec![
            Lead::new("1", "Ann Lee", "ann@example.com", "annuity").with_source("quote"),
            Lead::new("2", "Bo Diaz", "bo@example.com", "final-expense")
                .with_status(LeadStatus::Contacted),
            Lead::new("3", "Cy Park", "cy@example.com", "annuity")
                .with_status(LeadStatus::Qualified),
        ]
    }

    async fn board() -> (Arc<InMemoryRepository<Lead>>, LeadBoard<InMemoryRepository<Lead>>) {
        let repo = Arc::new(InMemoryRepository::with_items(pipeline()));
        let mut board = LeadBoard::new(repo.clone());
        board.refresh().await.unwrap();
        (repo, board)
    }

    #[tokio::test]
    async fn test_board_columns_follow_filters() {
        let (_repo, mut board) = board().await;

        let columns = board.columns();
        assert_eq!(columns.len(), 6);
        assert_eq!(columns[0].status, LeadStatus::New);
        assert_eq!(columns[0].leads.len(), 1);

        board.view_mut().set_filter("product", "annuity");
        let counts: Vec<usize> = board.columns().iter().map(|c| c.leads.len()).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_direct_move_skips_confirmation() {
        let (repo, mut board) = board().await;

        let outcome = board
            .move_lead("1", LeadStatus::Proposal, |_, _| {
                panic!("no confirmation for a direct move")
            })
            .await
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Moved);
        assert_eq!(repo.find_by_id("1").await.unwrap().unwrap().status, LeadStatus::Proposal);
        assert_eq!(board.columns()[3].leads.len(), 1);
    }

    #[tokio::test]
    async fn test_terminal_move_needs_confirmation() {
        let (repo, mut board) = board().await;

        let outcome = board.move_lead("3", LeadStatus::Closed, |_, _| false).await.unwrap();
        assert_eq!(outcome, MoveOutcome::Cancelled);
        assert_eq!(repo.find_by_id("3").await.unwrap().unwrap().status, LeadStatus::Qualified);

        let outcome = board
            .move_lead("3", LeadStatus::Closed, |lead, _| lead.name == "Cy Park")
            .await
            .unwrap();
        assert_eq!(outcome, MoveOutcome::Moved);
        assert_eq!(board.columns()[4].leads[0].id, "3");
    }

    #[tokio::test]
    async fn test_move_onto_same_column_and_unknown_lead() {
        let (_repo, mut board) = board().await;

        let outcome = board.move_lead("2", LeadStatus::Contacted, |_, _| true).await.unwrap();
        assert_eq!(outcome, MoveOutcome::Unchanged);

        let missing = board.move_lead("99", LeadStatus::New, |_, _| true).await;
        assert!(matches!(missing, Err(DomainError::NotFound(_))));
    }
}
