//! Configuration module for Teksting.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    AsrFeature, GeneralSettings, OutputSettings, Settings, SyncSettings, TranscriptionSettings,
    TranslationProvider, TranslationSettings,
};
