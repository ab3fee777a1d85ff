//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod capture;
pub mod notify;
pub mod printer;
pub mod vision;

pub use capture::*;
pub use notify::*;
pub use printer::*;
pub use vision::*;
