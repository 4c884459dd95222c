//! Lead Entity
//!
//! A prospect in the agent CRM. Leads move through a sales pipeline shown
//! as a Kanban board; the pipeline is a closed state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::draft::{Draft, FromDraft};
use super::entity::{DomainResult, Entity, FieldValue, Record, Searchable, StatusKind};
use super::validation::{normalize_email, optional, require};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Proposal,
    /// Won
    Closed,
    Lost,
}

/// What moving a lead between two stages requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Same stage, nothing to do
    Unchanged,
    Direct,
    /// Entering a terminal stage; must be confirmed before commit
    NeedsConfirmation,
}

impl LeadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Closed | LeadStatus::Lost)
    }

    /// Transition table. Every move is allowed; entering a terminal stage
    /// needs confirmation.
    pub fn transition_to(self, to: LeadStatus) -> Transition {
        if self == to {
            Transition::Unchanged
        } else if to.is_terminal() {
            Transition::NeedsConfirmation
        } else {
            Transition::Direct
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Qualified => "Qualified",
            LeadStatus::Proposal => "Proposal",
            LeadStatus::Closed => "Closed",
            LeadStatus::Lost => "Lost",
        }
    }
}

impl StatusKind for LeadStatus {
    const ALL: &'static [Self] = &[
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Proposal,
        LeadStatus::Closed,
        LeadStatus::Lost,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Proposal => "proposal",
            LeadStatus::Closed => "closed",
            LeadStatus::Lost => "lost",
        }
    }

    fn bulk_action(&self) -> &'static str {
        match self {
            LeadStatus::New => "reopen",
            LeadStatus::Contacted => "mark-contacted",
            LeadStatus::Qualified => "qualify",
            LeadStatus::Proposal => "mark-proposal",
            LeadStatus::Closed => "close",
            LeadStatus::Lost => "mark-lost",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Where the lead came from (quote funnel, referral, import, ...)
    pub source: String,
    /// Product of interest (final expense, annuity, ...)
    pub product: String,
    /// US state, two-letter code
    pub state: Option<String>,
    pub notes: Option<String>,
    pub status: LeadStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Lead {
    pub fn new(id: &str, name: &str, email: &str, product: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            source: "website".to_string(),
            product: product.to_string(),
            state: None,
            notes: None,
            status: LeadStatus::New,
            created_at: None,
        }
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    pub fn with_status(mut self, status: LeadStatus) -> Self {
        self.status = status;
        self
    }
}

impl Entity for Lead {
    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Searchable for Lead {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.email.as_str()];
        fields.extend(self.phone.as_deref());
        fields.push(&self.product);
        fields.extend(self.state.as_deref());
        fields.extend(self.notes.as_deref());
        fields
    }

    fn filter_value(&self, key: &str) -> FieldValue<'_> {
        match key {
            "status" => FieldValue::One(self.status.as_str()),
            "source" => FieldValue::from(Some(self.source.as_str())),
            "product" => FieldValue::from(Some(self.product.as_str())),
            "state" => FieldValue::from(self.state.as_deref()),
            _ => FieldValue::Missing,
        }
    }
}

impl Record for Lead {
    type Status = LeadStatus;
    const COLLECTION: &'static str = "leads";

    fn status(&self) -> LeadStatus {
        self.status
    }

    fn set_status(&mut self, status: LeadStatus) {
        self.status = status;
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn touch_created(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
    }
}

impl FromDraft for Lead {
    fn from_draft(draft: &Draft) -> DomainResult<Self> {
        let name = require("name", draft.get("name"))?;
        let email = normalize_email(draft.get("email"))?;
        let product = optional(draft.get("product")).unwrap_or_else(|| "general".to_string());

        let mut lead = Lead::new("", &name, &email, &product);
        lead.phone = optional(draft.get("phone"));
        lead.source = optional(draft.get("source")).unwrap_or_else(|| "import".to_string());
        lead.state = optional(draft.get("state")).map(|s| s.to_uppercase());
        lead.notes = Some(draft.raw("notes").to_string()).filter(|n| !n.trim().is_empty());
        Ok(lead)
    }
}
