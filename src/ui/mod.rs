pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{chunk, error, header, info, phase, success, summary_row, timing, warn};
pub use progress::{BatchProgress, Spinner};
pub use table::TableBuilder;
pub use theme::{theme, Theme};
