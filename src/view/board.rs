//! Lead Board
//!
//! Kanban over the lead pipeline. Columns are statuses; search and the
//! non-status filters still apply. Moves go through the status transition
//! table, and entering a terminal stage asks for confirmation first.

use std::sync::Arc;

use crate::domain::{DomainError, DomainResult, Lead, LeadStatus, Record, StatusKind, Transition};
use crate::query;
use crate::repository::CollectionRepository;

use super::collection_view::CollectionView;
use super::config::ViewConfig;
use super::status::Notice;

/// One Kanban column
#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn<'a> {
    pub status: LeadStatus,
    pub leads: Vec<&'a Lead>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Dropped on its own column
    Unchanged,
    Moved,
    /// The confirmation hook said no
    Cancelled,
}

pub struct LeadBoard<R: ?Sized + CollectionRepository<Lead>> {
    view: CollectionView<Lead, R>,
}

impl<R: ?Sized + CollectionRepository<Lead>> LeadBoard<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self::with_config(repo, ViewConfig::lead_board())
    }

    pub fn with_config(repo: Arc<R>, config: ViewConfig<Lead>) -> Self {
        Self {
            view: CollectionView::new(repo, config),
        }
    }

    pub fn view(&self) -> &CollectionView<Lead, R> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut CollectionView<Lead, R> {
        &mut self.view
    }

    pub async fn refresh(&mut self) -> DomainResult<()> {
        self.view.refresh().await
    }

    /// Every status in pipeline order, each with its matching leads
    pub fn columns(&self) -> Vec<BoardColumn<'_>> {
        let mut board_query = self.view.query().clone();
        board_query.filters.remove("status");
        let visible = query::filter(self.view.items(), &board_query, self.view.config().policy);

        LeadStatus::ALL
            .iter()
            .map(|&status| BoardColumn {
                status,
                leads: visible.iter().copied().filter(|l| l.status == status).collect(),
            })
            .collect()
    }

    /// Move a lead to another column. `confirm` runs only for moves into a
    /// terminal stage. The board changes once the repository accepts the
    /// update.
    pub async fn move_lead<F>(
        &mut self,
        id: &str,
        to: LeadStatus,
        confirm: F,
    ) -> DomainResult<MoveOutcome>
    where
        F: FnOnce(&Lead, LeadStatus) -> bool,
    {
        let lead = self
            .view
            .items()
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("{} {}", Lead::COLLECTION, id)))?;

        let transition = lead.status.transition_to(to);
        if transition == Transition::Unchanged {
            return Ok(MoveOutcome::Unchanged);
        }
        if transition == Transition::NeedsConfirmation && !confirm(&lead, to) {
            log::info!("Move of lead {} to {} cancelled", id, to.as_str());
            return Ok(MoveOutcome::Cancelled);
        }

        let from = lead.status;
        let mut moved = lead;
        moved.set_status(to);
        match self.view.repository().update(&moved).await {
            Ok(updated) => {
                log::info!("Lead {} moved {} -> {}", id, from.as_str(), to.as_str());
                let message = format!("{} moved to {}", updated.name, to.label());
                self.view.set_notice(Notice::success(message));
                self.view.replace_item(updated);
                Ok(MoveOutcome::Moved)
            }
            Err(e) => {
                log::error!("Failed to move lead {}: {}", id, e);
                self.view.set_notice(Notice::error(format!("Move failed: {}", e)));
                Err(e)
            }
        }
    }
}
