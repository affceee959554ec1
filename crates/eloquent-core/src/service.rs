//! Interfaces to the external checking and language-list services.

use std::cmp::Ordering;
use std::future::Future;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::config::DEFAULT_LANGUAGE;
use crate::error::CheckError;
use crate::types::Span;

/// Checks text and reports issue spans.
///
/// Offsets in the returned spans must be char offsets into `text`.
pub trait CheckService {
    fn check(
        &self,
        text: &str,
        language: &str,
    ) -> impl Future<Output = Result<Vec<Span>, CheckError>> + Send;
}

/// Lists the languages a checker supports.
pub trait LanguageService {
    fn languages(&self) -> impl Future<Output = Result<Vec<Language>, CheckError>> + Send;
}

/// A language the checker supports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Language {
    pub name: SmolStr,
    pub code: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_code: Option<SmolStr>,
}

impl Language {
    /// Value to send as the check language: long code when there is one.
    pub fn selection_value(&self) -> &str {
        match &self.long_code {
            Some(long) if !long.is_empty() => long.as_str(),
            _ => self.code.as_str(),
        }
    }
}

/// Case-insensitive name ordering, with the raw name as a tiebreak so the
/// order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

/// Sort languages by display name.
pub fn sort_languages(languages: &mut [Language]) {
    languages.sort_by(|a, b| compare_names(&a.name, &b.name));
}

/// Options for the language selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LanguageSelector {
    pub options: Vec<Language>,
    /// False until the language list has loaded.
    pub enabled: bool,
}

impl Default for LanguageSelector {
    /// Disabled, with a single US English entry.
    fn default() -> Self {
        Self {
            options: vec![Language {
                name: SmolStr::new_static("English (US)"),
                code: SmolStr::new_static(DEFAULT_LANGUAGE),
                long_code: None,
            }],
            enabled: false,
        }
    }
}

impl LanguageSelector {
    pub fn loaded(mut languages: Vec<Language>) -> Self {
        sort_languages(&mut languages);
        Self {
            options: languages,
            enabled: true,
        }
    }
}
