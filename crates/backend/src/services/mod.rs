//! Business logic services.
//!
//! # Services
//!
//! - `roles` - Admin/customer role resolution with retry and fallback
//! - `publication` - Cap on published news items
//! - `news` - News update management
//! - `forms` - Contact, order and newsletter submissions
//! - `menu` - Menu management and seeding
//! - `content` - Site content sections and contact info
//! - `pre_orders` - Customer pre-orders
//! - `preferences` - Customer preferences
//! - `images` - Inline image storage and profile photos
//! - `auth` - Admin and customer authentication
//!
//! Every service borrows its ports for the length of one operation; build
//! them from [`AppState`](crate::AppState) as needed.

pub mod auth;
pub mod content;
pub mod forms;
pub mod images;
pub mod menu;
pub mod news;
pub mod pre_orders;
pub mod preferences;
pub mod publication;
pub mod roles;

pub use auth::{AdminAuth, AuthError, CustomerAuth};
pub use content::ContentService;
pub use forms::FormsService;
pub use images::ImageService;
pub use menu::MenuService;
pub use news::NewsService;
pub use pre_orders::PreOrderService;
pub use preferences::PreferencesService;
pub use publication::{MAX_PUBLISHED_NEWS, PublicationGate, PublishDecision};
pub use roles::{AdminAllowList, RoleResolution, RoleResolver, RoleResolverConfig};
