pub mod bar;
pub mod settings;
pub mod signal;
pub mod trade;

pub use bar::*;
pub use settings::*;
pub use signal::*;
pub use trade::*;
