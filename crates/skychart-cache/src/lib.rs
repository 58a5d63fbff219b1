pub mod analysis_cache;
pub mod clock;

pub use analysis_cache::{AnalysisCache, CacheStats, DEFAULT_SWEEP_THRESHOLD, DEFAULT_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
