use crate::highlight;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CaseStyle {
    #[default]
    Snake,
    Kebab,
    Camel,
    Pascal,
    Screaming,
    Lower,
    Upper,
    Title,
}

impl CaseStyle {
    fn default_separator(self) -> Option<&'static str> {
        match self {
            CaseStyle::Snake | CaseStyle::Screaming => Some("_"),
            CaseStyle::Kebab => Some("-"),
            CaseStyle::Title => Some(" "),
            CaseStyle::Camel | CaseStyle::Pascal => Some(""),
            CaseStyle::Lower | CaseStyle::Upper => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SeparatorPolicy {
    #[default]
    StyleDefault,
    Custom(String),
}

impl SeparatorPolicy {
    pub fn from_option(value: Option<String>) -> Self {
        match value {
            Some(value) => SeparatorPolicy::Custom(value),
            None => SeparatorPolicy::StyleDefault,
        }
    }
}

/// Removes every highlighted occurrence of the filters from `name`.
pub fn remove_substrings(name: &str, filters: &[String]) -> String {
    let mask = highlight::match_mask(name, filters);
    name.chars()
        .zip(mask)
        .filter_map(|(ch, marked)| (!marked).then_some(ch))
        .collect()
}

/// Splits at the last dot; a leading dot alone does not start an extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    }
}

pub fn convert_case(name: &str, style: CaseStyle, separator: &SeparatorPolicy) -> String {
    let joiner = match (separator, style.default_separator()) {
        (SeparatorPolicy::Custom(custom), _) => custom.as_str(),
        (SeparatorPolicy::StyleDefault, Some(default)) => default,
        (SeparatorPolicy::StyleDefault, None) => {
            return match style {
                CaseStyle::Upper => name.to_uppercase(),
                _ => name.to_lowercase(),
            };
        }
    };

    let words = split_words(name);
    let converted: Vec<String> = words
        .iter()
        .enumerate()
        .map(|(index, word)| match style {
            CaseStyle::Snake | CaseStyle::Kebab | CaseStyle::Lower => word.to_lowercase(),
            CaseStyle::Screaming | CaseStyle::Upper => word.to_uppercase(),
            CaseStyle::Pascal | CaseStyle::Title => capitalize(word),
            CaseStyle::Camel if index == 0 => word.to_lowercase(),
            CaseStyle::Camel => capitalize(word),
        })
        .collect();
    converted.join(joiner)
}

/// Name shown in the picker and used as the rename target.
pub fn preview_name(
    filename: &str,
    filters: &[String],
    style: CaseStyle,
    separator: &SeparatorPolicy,
) -> String {
    let (base, extension) = split_extension(filename);
    let stripped = remove_substrings(base, filters);
    let mut converted = convert_case(&stripped, style, separator);
    converted.push_str(extension);
    converted
}

fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in separator_pattern().split(name).filter(|chunk| !chunk.is_empty()) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut start = 0;
        for index in 1..chars.len() {
            let prev = chars[index - 1];
            let current = chars[index];
            let next = chars.get(index + 1).copied();
            let hump = current.is_uppercase() && (prev.is_lowercase() || prev.is_numeric());
            let acronym_end = current.is_uppercase()
                && prev.is_uppercase()
                && next.is_some_and(|next| next.is_lowercase());
            if hump || acronym_end {
                words.push(chars[start..index].iter().collect());
                start = index;
            }
        }
        words.push(chars[start..].iter().collect());
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\p{L}\p{N}]+").expect("separator pattern is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn removes_matches_case_insensitively() {
        assert_eq!(remove_substrings("IMG_1234_img", &filters(&["img"])), "_1234_");
        assert_eq!(remove_substrings("holiday", &[]), "holiday");
    }

    #[test]
    fn extension_split_ignores_leading_dot() {
        assert_eq!(split_extension("photo.jpeg"), ("photo", ".jpeg"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
        assert_eq!(split_extension("README"), ("README", ""));
    }

    #[test]
    fn splits_words_on_case_and_separators() {
        assert_eq!(split_words("HTTPServer_log-file"), vec!["HTTP", "Server", "log", "file"]);
        assert_eq!(split_words("myFile2Name"), vec!["my", "File2", "Name"]);
        assert!(split_words("__").is_empty());
    }

    #[test]
    fn converts_each_style() {
        let default = SeparatorPolicy::StyleDefault;
        let name = "My File-Name";
        assert_eq!(convert_case(name, CaseStyle::Snake, &default), "my_file_name");
        assert_eq!(convert_case(name, CaseStyle::Kebab, &default), "my-file-name");
        assert_eq!(convert_case(name, CaseStyle::Camel, &default), "myFileName");
        assert_eq!(convert_case(name, CaseStyle::Pascal, &default), "MyFileName");
        assert_eq!(convert_case(name, CaseStyle::Screaming, &default), "MY_FILE_NAME");
        assert_eq!(convert_case(name, CaseStyle::Title, &default), "My File Name");
        assert_eq!(convert_case(name, CaseStyle::Lower, &default), "my file-name");
        assert_eq!(convert_case(name, CaseStyle::Upper, &default), "MY FILE-NAME");
    }

    #[test]
    fn custom_separator_overrides_style() {
        let dot = SeparatorPolicy::Custom(".".to_string());
        assert_eq!(convert_case("fooBar baz", CaseStyle::Snake, &dot), "foo.bar.baz");
        assert_eq!(convert_case("fooBar baz", CaseStyle::Lower, &dot), "foo.bar.baz");
    }

    #[test]
    fn preview_keeps_extension_verbatim() {
        let default = SeparatorPolicy::StyleDefault;
        assert_eq!(
            preview_name("My File-Name.TXT", &[], CaseStyle::Snake, &default),
            "my_file_name.TXT"
        );
        assert_eq!(
            preview_name("IMG_2024 Trip.jpg", &filters(&["img"]), CaseStyle::Kebab, &default),
            "2024-trip.jpg"
        );
    }
}
