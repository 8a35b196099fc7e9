pub(crate) mod logging;

pub(crate) use logging::{
    LOG_TARGET_FACADE, LOG_TARGET_RESOLVE, LOG_TARGET_SCAN, LOG_TARGET_SOURCE, LogStyle,
    NodeDisplay,
};
