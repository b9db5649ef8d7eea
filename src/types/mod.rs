pub mod analysis;
pub mod exchange;
pub mod query;
pub mod rating;
pub mod scan;
pub mod snapshot;
pub mod timeframe;

pub use analysis::*;
pub use exchange::*;
pub use query::*;
pub use rating::*;
pub use scan::*;
pub use snapshot::*;
pub use timeframe::*;
