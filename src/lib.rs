pub use tiller_core::*;
