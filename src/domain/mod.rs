//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO knowledge of storage or transport.

mod draft;
mod entity;
mod faq;
mod lead;
mod subscriber;
mod testimonial;
pub mod validation;

pub use draft::{Draft, FromDraft};
pub use entity::{DomainError, DomainResult, Entity, FieldValue, Record, Searchable, StatusKind};
pub use faq::{Faq, FaqStatus};
pub use lead::{Lead, LeadStatus, Transition};
pub use subscriber::{Subscriber, SubscriberStatus};
pub use testimonial::{Testimonial, TestimonialStatus};
