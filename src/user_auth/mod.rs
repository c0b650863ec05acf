//! User registration, login and bearer-token authentication

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

pub use middleware::{AuthUser, jwt_auth_middleware};
pub use models::{Role, User};
pub use service::{AuthService, RegistrationPolicy};
pub use store::{InMemoryUserStore, PgUserStore, UserStore};
pub use token::{Claims, TokenIssuer};
