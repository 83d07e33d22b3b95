//! Outbound gateway traits (ports)

pub mod content_generator;
pub mod event_publisher;
pub mod image_host;
pub mod mailer;
pub mod tax_document_source;
pub mod web_researcher;

pub use content_generator::ContentGenerator;
pub use event_publisher::{DomainEvent, EventPublisher};
pub use image_host::ImageHost;
pub use mailer::Mailer;
pub use tax_document_source::{
    RemoteDocument, RemoteDocumentItem, RemoteDocumentPage, RemoteDocumentSummary, TaxDocumentSource,
};
pub use web_researcher::{ScrapedPage, SearchHit, WebResearcher};

#[cfg(any(test, feature = "mock"))]
pub use content_generator::MockContentGenerator;
#[cfg(any(test, feature = "mock"))]
pub use event_publisher::MockEventPublisher;
#[cfg(any(test, feature = "mock"))]
pub use image_host::MockImageHost;
#[cfg(any(test, feature = "mock"))]
pub use mailer::MockMailer;
#[cfg(any(test, feature = "mock"))]
pub use tax_document_source::MockTaxDocumentSource;
#[cfg(any(test, feature = "mock"))]
pub use web_researcher::MockWebResearcher;
