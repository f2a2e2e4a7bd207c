mod app;
mod listener;
mod state;
mod tls;

pub use app::create_app;
pub use listener::{serve, ListenerError};
pub use state::AppState;
pub use tls::{build_acceptor, load_certs, load_private_key, TlsError};
