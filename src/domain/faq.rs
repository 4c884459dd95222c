//! FAQ Entity

use serde::{Deserialize, Serialize};

use super::draft::{Draft, FromDraft};
use super::entity::{DomainResult, Entity, FieldValue, Record, Searchable, StatusKind};
use super::validation::{optional, require};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FaqStatus {
    #[default]
    Published,
    Draft,
}

impl StatusKind for FaqStatus {
    const ALL: &'static [Self] = &[FaqStatus::Published, FaqStatus::Draft];

    fn as_str(&self) -> &'static str {
        match self {
            FaqStatus::Published => "published",
            FaqStatus::Draft => "draft",
        }
    }

    fn bulk_action(&self) -> &'static str {
        match self {
            FaqStatus::Published => "publish",
            FaqStatus::Draft => "unpublish",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    /// Extra search terms not present in the text
    #[serde(default)]
    pub keywords: Vec<String>,
    pub status: FaqStatus,
}

impl Faq {
    pub fn new(id: &str, category: &str, question: &str, answer: &str) -> Self {
        Self {
            id: id.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            category: category.to_string(),
            keywords: Vec::new(),
            status: FaqStatus::Published,
        }
    }
}

impl Entity for Faq {
    fn id(&self) -> &str {
        &self.id
    }

    fn assign_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Searchable for Faq {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.question.as_str(), self.answer.as_str(), self.category.as_str()];
        fields.extend(self.keywords.iter().map(String::as_str));
        fields
    }

    fn filter_value(&self, key: &str) -> FieldValue<'_> {
        match key {
            "category" => FieldValue::from(Some(self.category.as_str())),
            "status" => FieldValue::One(self.status.as_str()),
            _ => FieldValue::Missing,
        }
    }
}

impl Record for Faq {
    type Status = FaqStatus;
    const COLLECTION: &'static str = "faqs";

    fn status(&self) -> FaqStatus {
        self.status
    }

    fn set_status(&mut self, status: FaqStatus) {
        self.status = status;
    }
}

impl FromDraft for Faq {
    fn from_draft(draft: &Draft) -> DomainResult<Self> {
        let question = require("question", draft.get("question"))?;
        let answer = require("answer", draft.get("answer"))?;
        let category = optional(draft.get("category")).unwrap_or_else(|| "general".to_string());
        let mut faq = Faq::new("", &category, &question, &answer);
        if let Some(status) = FaqStatus::parse(draft.get("status")) {
            faq.status = status;
        }
        Ok(faq)
    }
}
