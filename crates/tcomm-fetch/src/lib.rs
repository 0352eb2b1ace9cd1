//! HTTP lookups behind tcomm push commands.
//!
//! Push commands only carry ids. [`ActivityFetcher`] and
//! [`NotificationFetcher`] resolve them against the account's ajax host and
//! plug into a session as its [`tcomm_session::ActivitySource`] and
//! [`tcomm_session::NotificationSource`].

pub mod activity;
pub mod client;
pub mod error;
pub mod notification;

pub use activity::{activity_id, parse_activity, ActivityFetcher};
pub use client::{AjaxClient, FetchConfig, DEFAULT_AJAX_HOST, USER_AGENT};
pub use error::{FetchError, Result};
pub use notification::{first_device, NotificationDevice, NotificationFetcher};
