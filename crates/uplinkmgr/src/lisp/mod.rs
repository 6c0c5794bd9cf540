//! LISP service configuration and reported state.
//!
//! These are records exchanged with the LISP daemons; their lifecycle is
//! managed elsewhere.

mod types;

pub use types::{
    EidMap, EidStatistics, LispDataplaneConfig, LispDatabaseMap, LispDecapKey, LispInfoStatus,
    LispMapCacheEntry, LispMetrics, LispPktStat, LispRlocState, LispRlocStatistics, MapServer,
    MapServerType, ServiceLispConfig,
};
