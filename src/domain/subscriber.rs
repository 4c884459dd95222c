//! Subscriber Entity
//!
//! A newsletter subscriber managed from the admin dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::draft::{Draft, FromDraft};
use super::entity::{DomainResult, Entity, FieldValue, Record, Searchable, StatusKind};
use super::validation::{normalize_email, optional};

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriberStatus {
    #[default]
    Active,
    Unsubscribed,
    /// Mail to this address bounces
    Bounced,
}

impl StatusKind for SubscriberStatus {
    const ALL: &'static [Self] = &[
        SubscriberStatus::Active,
        SubscriberStatus::Unsubscribed,
        SubscriberStatus::Bounced,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            SubscriberStatus::Active => "active",
            SubscriberStatus::Unsubscribed => "unsubscribed",
            SubscriberStatus::Bounced => "bounced",
        }
    }

    fn bulk_action(&self) -> &'static str {
        match self {
            SubscriberStatus::Active => "activate",
            SubscriberStatus::Unsubscribed => "unsubscribe",
            SubscriberStatus::Bounced => "mark-bounced",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub status: SubscriberStatus,
    /// Signup origin (footer form, quote funnel, webinar, ...)
    pub source: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Subscriber {
    pub fn new(id: &str, email: &str, source: &str) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            name: None,
            status: SubscriberStatus::Active,
            source: source.to_string(),
            tags: Vec::new(),
            created_at: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriberStatus::Active
    }
}

impl Entity for Subscriber {
    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Searchable for Subscriber {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.email.as_str()];
        if let Some(name) = &self.name {
            fields.push(name);
        }
        fields.push(&self.source);
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn filter_value(&self, key: &str) -> FieldValue<'_> {
        match key {
            "status" => FieldValue::One(self.status.as_str()),
            "source" => FieldValue::from(Some(self.source.as_str())),
            "tag" => FieldValue::Many(&self.tags),
            _ => FieldValue::Missing,
        }
    }
}

impl Record for Subscriber {
    type Status = SubscriberStatus;
    const COLLECTION: &'static str = "subscribers";

    fn status(&self) -> SubscriberStatus {
        self.status
    }

    fn set_status(&mut self, status: SubscriberStatus) {
        self.status = status;
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn touch_created(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
    }
}

impl FromDraft for Subscriber {
    fn from_draft(draft: &Draft) -> DomainResult<Self> {
        let email = normalize_email(draft.get("email"))?;
        let source = optional(draft.get("source")).unwrap_or_else(|| "import".to_string());

        let mut subscriber = Subscriber::new("", &email, &source);
        subscriber.name = optional(draft.get("name"));
        if let Some(status) = SubscriberStatus::parse(draft.get("status")) {
            subscriber.status = status;
        }
        subscriber.tags = draft
            .get("tags")
            .split(';')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Ok(subscriber)
    }
}
