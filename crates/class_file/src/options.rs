use log::{Level, LevelFilter};

/// Emits a log record if the per-call verbosity of `$options` lets `$level` through.
macro_rules! emit {
    ($options:expr, $level:expr, $($arg:tt)+) => {
        if $options.enabled($level) {
            log::log!($level, $($arg)+);
        }
    };
}

/// Settings for a single decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Most verbose level the decoder reports at.
    pub verbosity: LevelFilter,
    /// Accept a stream that ends inside the class-level attribute section,
    /// keeping the attributes decoded before the end.
    pub tolerate_truncation: bool,
    /// Fail on a malformed payload of a known attribute instead of keeping
    /// it as an [`AttributeInfo::Unknown`](crate::AttributeInfo::Unknown).
    pub strict_attributes: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            verbosity: LevelFilter::Warn,
            tolerate_truncation: false,
            strict_attributes: true,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbosity(mut self, verbosity: LevelFilter) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn tolerate_truncation(mut self, tolerate_truncation: bool) -> Self {
        self.tolerate_truncation = tolerate_truncation;
        self
    }

    pub fn strict_attributes(mut self, strict_attributes: bool) -> Self {
        self.strict_attributes = strict_attributes;
        self
    }

    pub(crate) fn enabled(&self, level: Level) -> bool {
        level <= self.verbosity
    }
}

/// Settings for a single encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub verbosity: LevelFilter,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            verbosity: LevelFilter::Warn,
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbosity(mut self, verbosity: LevelFilter) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub(crate) fn enabled(&self, level: Level) -> bool {
        level <= self.verbosity
    }
}
