//! Logging [Middleware] which publishes every action passing through a
//! [Store](crate::Store), and the state it was dispatched against, to
//! the [log] facade.

use crate::middleware::{Middleware, Next};
use std::{fmt::Debug, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Warn,
    Info,
}

impl LogLevel {
    pub fn log<S: AsRef<str>>(&self, message: S) {
        match self {
            LogLevel::Trace => log::trace!("{}", message.as_ref()),
            LogLevel::Debug => log::debug!("{}", message.as_ref()),
            LogLevel::Warn => log::warn!("{}", message.as_ref()),
            LogLevel::Info => log::info!("{}", message.as_ref()),
        }
    }

    fn enabled(&self) -> bool {
        let level = match self {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
        };
        log::log_enabled!(level)
    }
}

/// Logs `prev state` and `action` for every action, then passes the
/// action on unchanged.
#[derive(Debug, Default)]
pub struct LoggerMiddleware {
    log_level: LogLevel,
}

impl LoggerMiddleware {
    pub fn new() -> Self {
        LoggerMiddleware {
            log_level: LogLevel::default(),
        }
    }

    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

impl<State, Action> Middleware<State, Action> for LoggerMiddleware
where
    State: Debug,
    Action: Debug,
{
    fn process(&self, action: Action, state: &Arc<State>, next: Next<State, Action>) {
        // skip the formatting when nobody is listening
        if self.log_level.enabled() {
            self.log_level.log(format!("prev state: {:?}", state));
            self.log_level.log(format!("action: {:?}", action));
        }

        next.run(action);
    }
}
