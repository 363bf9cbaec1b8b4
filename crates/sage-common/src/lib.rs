pub mod errors;
pub mod events;
pub mod id;
pub mod toasts;
pub mod types;

pub use errors::ApiError;
pub use events::{EventBus, StateEvent};
pub use id::{new_correlation_id, SessionId};
pub use toasts::{Toast, ToastLevel, ToastQueue};
pub use types::{ChatSession, Goal, NotificationKind, NotificationRecord, StoredMessage};
