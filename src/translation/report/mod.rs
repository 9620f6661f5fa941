//! 失败记录与汇总通知

pub mod notifier;
pub mod recorder;

pub use notifier::{count_untranslated, untranslated_headline, FailureNotification, FailureNotifier};
pub use recorder::{
    normalize_message, FailureRecord, FailureRecorder, ALL_ENGINES_FAILED, SEGMENT_TRANSLATION,
    SET_MATCHES,
};
