//! gcal-calendar: Google Calendar access for gcal-gateway
//!
//! This crate owns everything between the presentation adapters and
//! the Google Calendar v3 REST API.
//!
//! ## Layers
//!
//! - [`CalendarProvider`]: raw provider operations (list / get / insert /
//!   delete / free-busy), implemented by [`GoogleCalendarClient`]
//! - [`EventService`]: the availability-gated event operations shared by
//!   the MCP tools and the HTTP API, implemented by [`CalendarService`]
//! - [`auth`]: OAuth token file handling, refresh and the installed-app
//!   authorization flow
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gcal_calendar::{CalendarService, GoogleCalendarClient, TokenManager};
//!
//! let tokens = TokenManager::load(&config.google)?;
//! let client = GoogleCalendarClient::new(&config.google, tokens)?;
//! let service = CalendarService::new(Arc::new(client), &config.google.timezone);
//!
//! match service.check_availability(&TimeWindow::new(start, end)?).await {
//!     Availability::Available => { /* ... */ }
//!     Availability::Occupied(busy) => { /* ... */ }
//!     Availability::CheckFailed(reason) => { /* ... */ }
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod provider;
pub mod service;
pub mod validate;

pub use auth::{StoredToken, TokenManager};
pub use client::GoogleCalendarClient;
pub use error::{CalendarError, Result};
pub use models::{Event, EventDateTime, EventDraft, EventQuery, TimePeriod, TimeWindow};
pub use provider::CalendarProvider;
pub use service::{Availability, CalendarService, CreateOutcome, EventService};
