pub mod config;
pub mod error;
pub mod fragment;

pub use config::Config;
pub use error::DocvecError;
pub use fragment::{EmbeddedFragment, Fragment, FragmentKind};
