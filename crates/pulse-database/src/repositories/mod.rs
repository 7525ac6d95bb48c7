//! Repository implementations backed by PostgreSQL.

pub mod activity_event;
pub mod community;
pub mod user;
pub mod webhook_subscription;

pub use activity_event::ActivityEventRepository;
pub use community::CommunityRepository;
pub use user::UserRepository;
pub use webhook_subscription::WebhookSubscriptionRepository;

use pulse_core::error::{AppError, ErrorKind};

/// Map a sqlx error into the application taxonomy.
///
/// Decode-level failures mean a stored row cannot be reconstructed into a
/// domain value; everything else is a transport problem.
pub(crate) fn map_db_err(context: &str, e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => {
            AppError::with_source(ErrorKind::CorruptStorage, context.to_string(), e)
        }
        _ => AppError::with_source(ErrorKind::Transient, context.to_string(), e),
    }
}
