//! Portal page abstraction
//!
//! The engine (pool, login workflow, extractor pipeline) only ever talks to a
//! [`PortalPage`]. The CDP-backed implementation lives here next to a
//! scriptable mock portal used by unit and integration tests.

pub mod cdp_page;
pub mod mock;
pub mod page;

pub use cdp_page::{CdpPageFactory, CdpPortalPage};
pub use page::{PageFactory, PortalPage};
