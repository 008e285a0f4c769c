mod application;
pub use application::TestApp;

mod permissions;
pub use permissions::Role;
