pub mod constants;
pub mod diagnostics;
pub mod logging;
