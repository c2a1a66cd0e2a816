//! Record update handler - applies inbound change notifications to the store.

mod augment;
mod ingest_model;
mod ingest_service;


pub use augment::AugmentationClient;
pub use ingest_model::{InboundMessage, KeyedPayload, Notification, NotificationStatus, UpdateReport};
pub use ingest_service::RecordUpdateService;
