//! Collection View
//!
//! Wires a repository to the query pipeline:
//! collection -> filter/search -> pager -> visible page.
//!
//! The view owns its query, selection and last fetched collection. Every
//! mutation goes through the repository and is followed by a refresh.

use std::sync::Arc;

use crate::domain::{DomainError, DomainResult, Draft, Entity};
use crate::query::{self, pager, Page, QueryState, DEFAULT_SUGGESTIONS};
use crate::repository::{BulkOutcome, CollectionRepository, CollectionStats, PageResult};
use crate::transfer::{self, Transferable};

use super::bulk::{self, BulkOperation};
use super::config::ViewConfig;
use super::selection::SelectionSet;
use super::status::{LoadState, Notice};

/// Tags one fetch; only the newest ticket may update the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// A destructive action waiting on the yes/no gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction<S> {
    DeleteOne(String),
    Bulk(BulkOperation<S>),
}

/// The page currently on screen
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<'a, T> {
    pub items: Vec<&'a T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
}

impl<'a, T> PageView<'a, T> {
    fn from_page(page: Page<'_, &'a T>) -> Self {
        Self {
            items: page.items.to_vec(),
            page: page.clamped_page,
            total_pages: page.total_pages,
            total_items: page.total_items,
            page_size: page.page_size,
        }
    }

    pub fn ids(&self) -> Vec<&'a str>
    where
        T: Entity,
    {
        self.items.iter().map(|&i| i.id()).collect()
    }
}

/// Counts reported after an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub imported: usize,
    pub rejected: usize,
}

pub struct CollectionView<T: Transferable, R: ?Sized + CollectionRepository<T>> {
    repo: Arc<R>,
    config: ViewConfig<T>,
    query: QueryState,
    items: Vec<T>,
    selection: SelectionSet,
    load_state: LoadState,
    notice: Option<Notice>,
    pending: Option<PendingAction<T::Status>>,
    stats: Option<CollectionStats>,
    generation: u64,
    next_placeholder: u64,
}

impl<T, R> CollectionView<T, R>
where
    T: Transferable,
    R: ?Sized + CollectionRepository<T>,
{
    pub fn new(repo: Arc<R>, config: ViewConfig<T>) -> Self {
        let query = QueryState::new(config.page_size);
        Self {
            repo,
            config,
            query,
            items: Vec::new(),
            selection: SelectionSet::new(),
            load_state: LoadState::Idle,
            notice: None,
            pending: None,
            stats: None,
            generation: 0,
            next_placeholder: 0,
        }
    }

    // ========================
    // Accessors
    // ========================

    pub fn config(&self) -> &ViewConfig<T> {
        &self.config
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    /// Full collection as last fetched
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn pending(&self) -> Option<&PendingAction<T::Status>> {
        self.pending.as_ref()
    }

    /// Repository handle for fetches run outside the view
    pub fn repository(&self) -> Arc<R> {
        Arc::clone(&self.repo)
    }

    pub(crate) fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Replace one item in place after a confirmed update
    pub(crate) fn replace_item(&mut self, item: T) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id() == item.id()) {
            *slot = item;
        }
        self.stats = None;
    }

    // ========================
    // Fetching
    // ========================

    /// Start a fetch. Any ticket handed out earlier becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.load_state = LoadState::Loading;
        FetchTicket(self.generation)
    }

    /// Apply a fetch result. Returns false when the ticket is stale and the
    /// result was discarded.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: DomainResult<Vec<T>>) -> bool {
        if ticket.0 != self.generation {
            log::info!(
                "Discarding stale {} fetch #{} (current #{})",
                self.config.name,
                ticket.0,
                self.generation
            );
            return false;
        }
        match result {
            Ok(items) => {
                log::info!("Loaded {} {}", items.len(), self.config.name);
                self.selection.prune(&items);
                self.items = items;
                self.load_state = LoadState::Ready;
                // A shrunken collection pulls the cursor back to the last page
                let total = pager::total_pages(self.filtered().len(), self.query.page_size);
                self.query.page = self.query.page.min(total);
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", self.config.name, e);
                self.load_state = LoadState::Failed(e.to_string());
            }
        }
        true
    }

    /// Re-fetch the whole collection
    pub async fn refresh(&mut self) -> DomainResult<()> {
        let ticket = self.begin_fetch();
        let result = self.repo.list().await;
        let error = result.as_ref().err().cloned();
        self.complete_fetch(ticket, result);
        self.stats = None;
        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Back to defaults: fresh query, empty selection, in-flight fetches
    /// become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.query = QueryState::new(self.config.page_size);
        self.selection.clear();
        self.pending = None;
        self.notice = None;
        if self.load_state.is_loading() {
            self.load_state = LoadState::Idle;
        }
    }

    /// Leaving the view; late responses are ignored from here on
    pub fn close(&mut self) {
        self.reset();
        self.items.clear();
        self.stats = None;
        self.load_state = LoadState::Idle;
    }

    // ========================
    // Query
    // ========================

    /// Every item passing the current search and filters, in collection order
    pub fn filtered(&self) -> Vec<&T> {
        query::filter(&self.items, &self.query, self.config.policy)
    }

    /// The visible page. An out-of-range cursor is clamped and stored back.
    pub fn current_page(&mut self) -> PageView<'_, T> {
        let filtered = query::filter(&self.items, &self.query, self.config.policy);
        let requested = i64::try_from(self.query.page).unwrap_or(i64::MAX);
        let page = PageView::from_page(pager::paginate(&filtered, requested, self.query.page_size));
        self.query.page = page.page;
        page
    }

    pub fn set_search(&mut self, term: &str) {
        self.query.set_search(term);
    }

    pub fn set_filter(&mut self, key: &str, value: &str) {
        self.query.set_filter(key, value);
    }

    pub fn clear_filters(&mut self) {
        self.query.clear_filters();
    }

    /// Any integer is accepted; the next `current_page` clamps it
    pub fn set_page(&mut self, page: i64) {
        self.query.set_page(usize::try_from(page).unwrap_or(1));
    }

    pub fn next_page(&mut self) {
        let total = pager::total_pages(self.filtered().len(), self.query.page_size);
        self.query.set_page((self.query.page + 1).min(total));
    }

    pub fn previous_page(&mut self) {
        self.query.set_page(self.query.page.saturating_sub(1));
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.query.set_page_size(page_size);
    }

    /// Distinct values for a filter dropdown, over the whole collection
    pub fn filter_options(&self, key: &str) -> Vec<String> {
        query::filter_options(&self.items, key)
    }

    /// Top matches for a search box dropdown
    pub fn suggestions(&self, term: &str) -> Vec<&T> {
        query::suggest(&self.items, term, DEFAULT_SUGGESTIONS)
    }

    /// Let the collaborator run the current query
    pub async fn search_remote(&self) -> DomainResult<PageResult<T>> {
        self.repo.search(&self.query, self.config.policy).await
    }

    // ========================
    // Selection
    // ========================

    pub fn toggle_selected(&mut self, id: &str) -> bool {
        self.selection.toggle(id)
    }

    /// Header checkbox over the visible page
    pub fn toggle_select_all(&mut self) {
        let visible: Vec<String> =
            self.current_page().ids().into_iter().map(str::to_string).collect();
        self.selection.select_all(visible.iter().map(String::as_str));
    }

    pub fn is_all_selected(&mut self) -> bool {
        let visible: Vec<String> =
            self.current_page().ids().into_iter().map(str::to_string).collect();
        self.selection.is_all_selected(visible.iter().map(String::as_str))
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ========================
    // Destructive actions
    // ========================

    pub fn request_delete(&mut self, id: &str) {
        self.pending = Some(PendingAction::DeleteOne(id.to_string()));
    }

    /// Queue a bulk operation on the selection. Non-destructive operations
    /// still pass through `resolve_pending`.
    pub fn request_bulk(&mut self, operation: BulkOperation<T::Status>) {
        self.pending = Some(PendingAction::Bulk(operation));
    }

    /// Answer the confirmation gate. `Ok(None)` when declined or nothing
    /// was pending.
    pub async fn resolve_pending(&mut self, confirm: bool) -> DomainResult<Option<BulkOutcome>> {
        let Some(action) = self.pending.take() else {
            return Ok(None);
        };
        if !confirm {
            return Ok(None);
        }
        match action {
            PendingAction::DeleteOne(id) => self.delete_one(&id).await.map(Some),
            PendingAction::Bulk(operation) => self.run_bulk(operation).await.map(Some),
        }
    }

    async fn delete_one(&mut self, id: &str) -> DomainResult<BulkOutcome> {
        match self.repo.delete(id).await {
            Ok(()) => {
                self.selection.deselect(id);
                self.set_notice(Notice::success("Deleted"));
                self.refresh_quietly().await;
                Ok(BulkOutcome { succeeded: 1, failed: 0 })
            }
            Err(e) => {
                log::error!("Failed to delete {} {}: {}", T::COLLECTION, id, e);
                self.set_notice(Notice::error(format!("Delete failed: {}", e)));
                Err(e)
            }
        }
    }

    /// Apply an operation to the selection. Callers gate destructive
    /// operations before getting here.
    ///
    /// On success (even partial) the collection is refreshed and the
    /// selection cleared. On total failure the selection is kept.
    pub async fn run_bulk(
        &mut self,
        operation: BulkOperation<T::Status>,
    ) -> DomainResult<BulkOutcome> {
        let ids = self.selection.ordered_ids(&self.items);
        if ids.is_empty() {
            self.set_notice(Notice::info("Nothing selected"));
            return Ok(BulkOutcome::default());
        }

        match bulk::apply::<T, R>(&self.repo, operation, &ids).await {
            Ok(outcome) => {
                log::info!("Bulk {} on {}: {:?}", operation.describe(), self.config.name, outcome);
                self.selection.clear();
                let notice = if outcome.failed == 0 {
                    Notice::success(format!("{} updated", outcome.succeeded))
                } else {
                    Notice::error(format!(
                        "{} updated, {} failed",
                        outcome.succeeded, outcome.failed
                    ))
                };
                self.set_notice(notice);
                self.refresh_quietly().await;
                Ok(outcome)
            }
            Err(e) => {
                log::error!("Bulk {} on {} failed: {}", operation.describe(), self.config.name, e);
                let message = format!("Bulk {} failed: {}", operation.describe(), e);
                self.set_notice(Notice::error(message));
                Err(e)
            }
        }
    }

    /// Refresh after a mutation; a failed fetch shows in `load_state`
    async fn refresh_quietly(&mut self) {
        if let Err(e) = self.refresh().await {
            log::warn!("Refresh after mutation failed: {}", e);
        }
    }

    // ========================
    // Add / import / export
    // ========================

    /// Insert right away, then create through the repository. A failed
    /// create rolls back by re-fetching.
    pub async fn add(&mut self, record: T) -> DomainResult<T> {
        let mut placeholder = record.clone();
        if placeholder.id().is_empty() {
            self.next_placeholder += 1;
            placeholder.assign_id(format!("pending-{}", self.next_placeholder));
        }
        let slot = self.items.len();
        self.items.push(placeholder);

        match self.repo.create(&record).await {
            Ok(created) => {
                if let Some(item) = self.items.get_mut(slot) {
                    *item = created.clone();
                }
                self.stats = None;
                self.set_notice(Notice::success("Added"));
                Ok(created)
            }
            Err(e) => {
                log::error!("Failed to add to {}: {}", self.config.name, e);
                // Only the placeholder goes; an existing item may share its id
                if slot < self.items.len() {
                    self.items.remove(slot);
                }
                self.refresh_quietly().await;
                self.set_notice(Notice::error(format!("Add failed: {}", e)));
                Err(e)
            }
        }
    }

    /// Validate an add-form draft, then `add`
    pub async fn add_draft(&mut self, draft: &Draft) -> DomainResult<T> {
        match T::from_draft(draft) {
            Ok(record) => self.add(record).await,
            Err(e) => {
                self.set_notice(Notice::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Parse, validate and create every row, then refresh.
    /// Creates that fail count as rejected.
    pub async fn import_csv(&mut self, text: &str) -> DomainResult<ImportOutcome> {
        let report = transfer::import_records::<T>(transfer::parse(text, &self.config.mapping));
        let mut outcome = ImportOutcome { imported: 0, rejected: report.rejected };
        let mut unavailable: Option<DomainError> = None;

        for record in &report.records {
            match self.repo.create(record).await {
                Ok(_) => outcome.imported += 1,
                Err(e) => {
                    log::warn!("Import into {} rejected a row: {}", self.config.name, e);
                    outcome.rejected += 1;
                    if e.is_unavailable() {
                        unavailable.get_or_insert(e);
                    }
                }
            }
        }

        if let Some(e) = unavailable.filter(|_| outcome.imported == 0) {
            self.set_notice(Notice::error(format!("Import failed: {}", e)));
            return Err(e);
        }

        let summary = format!("{} imported, {} rejected", outcome.imported, outcome.rejected);
        log::info!("Import into {}: {}", self.config.name, summary);
        self.set_notice(if outcome.rejected == 0 {
            Notice::success(summary)
        } else {
            Notice::info(summary)
        });
        self.refresh_quietly().await;
        Ok(outcome)
    }

    /// Selected items if any, else the filtered items; never the unfiltered
    /// collection
    pub fn export_items(&self) -> Vec<&T> {
        if self.selection.is_empty() {
            self.filtered()
        } else {
            self.items.iter().filter(|i| self.selection.is_selected(i.id())).collect()
        }
    }

    pub fn export_csv(&self) -> DomainResult<String> {
        transfer::to_delimited_text(self.export_items(), &self.config.columns)
    }

    // ========================
    // Stats
    // ========================

    /// Dashboard counts, cached until the next mutation or refresh
    pub async fn stats(&mut self) -> DomainResult<CollectionStats> {
        if let Some(stats) = &self.stats {
            return Ok(stats.clone());
        }
        let stats = self.repo.stats().await?;
        self.stats = Some(stats.clone());
        Ok(stats)
    }
}

impl<T, R> std::fmt::Debug for CollectionView<T, R>
where
    T: Transferable,
    R: ?Sized + CollectionRepository<T>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionView")
            .field("name", &self.config.name)
            .field("query", &self.query)
            .field("items", &self.items.len())
            .field("selected", &self.selection.len())
            .field("load_state", &self.load_state)
            .finish()
    }
}
