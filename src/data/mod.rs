pub mod bar;
pub mod columns;
pub mod frame;
pub mod loader;

pub use bar::{BarError, PriceBar};
pub use columns::{resolve, MissingColumnError, ResolvedColumns};
pub use frame::{FrameError, RawFrame, BUY_SIGNAL_PREFIX};
pub use loader::{filter_by_symbol, load_all, load_csv, LoadedData};
