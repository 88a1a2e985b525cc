//! Client library languages and the code samples they contribute.

use serde::{Deserialize, Serialize};

/// Languages with a client library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Node,
    Python,
    Php,
    Ruby,
}

impl Language {
    /// Order in which samples are gathered
    pub const ALL: [Language; 5] = [
        Language::Java,
        Language::Node,
        Language::Python,
        Language::Php,
        Language::Ruby,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Node => "node",
            Self::Python => "python",
            Self::Php => "php",
            Self::Ruby => "ruby",
        }
    }

    /// Install snippet shown next to each sample
    pub fn install(&self) -> &'static str {
        match self {
            Self::Java => concat!(
                "<dependency><groupId>com.asana</groupId>",
                "<artifactId>asana</artifactId><version>1.0.0</version></dependency>"
            ),
            Self::Node => "npm install asana",
            Self::Python => "pip install asana",
            Self::Php => "composer require asana/asana",
            Self::Ruby => "gem install asana",
        }
    }

    /// Whether a generated preview library exists for this language
    pub fn has_preview(&self) -> bool {
        matches!(self, Self::Node | Self::Python)
    }

    /// Normalize a resource key from the current library's samples
    pub fn resource_name(&self, resource: &str) -> String {
        match self {
            // java resources carry a "base" suffix
            Self::Java => resource.replace("base", ""),
            _ => resource.to_string(),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of an operation's `x-readme.code-samples` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSample {
    pub language: Language,
    pub install: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CodeSample {
    /// Sample from a current client library
    pub fn current(language: Language, code: String) -> Self {
        Self {
            language,
            install: language.install().to_string(),
            code,
            name: None,
        }
    }

    /// Sample from a generated preview library
    pub fn preview(language: Language, code: String) -> Self {
        Self {
            name: Some(format!("{}-preview", language)),
            ..Self::current(language, code)
        }
    }
}

/// Convert `snake_case` to `camelCase`.
///
/// The first segment is kept as is; every later segment is title-cased.
pub fn camel_case(s: &str) -> String {
    let mut segments = s.split('_');
    let mut out = segments.next().unwrap_or_default().to_string();
    for segment in segments {
        out.push_str(&title_case(segment));
    }
    out
}

/// Uppercase the first letter of each alphabetic run, lowercase the rest
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut prev_alpha = false;
    for c in word.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Normalize a resource key from a preview library's generated docs
pub fn preview_resource_name(resource: &str) -> String {
    resource.replace("Api", "").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("get_tasks_for_project"), "getTasksForProject");
        assert_eq!(camel_case("getTask"), "getTask");
        assert_eq!(camel_case("add_followers_for_task"), "addFollowersForTask");
        assert_eq!(camel_case("get_task_v2"), "getTaskV2");
    }

    #[test]
    fn test_title_case_lowercases_tail() {
        assert_eq!(camel_case("get_TASKS"), "getTasks");
    }

    #[test]
    fn test_resource_names() {
        assert_eq!(Language::Java.resource_name("tasksbase"), "tasks");
        assert_eq!(Language::Node.resource_name("tasksbase"), "tasksbase");
        assert_eq!(preview_resource_name("TasksApi"), "tasks");
        assert_eq!(preview_resource_name("CustomFieldsApi"), "customfields");
    }

    #[test]
    fn test_preview_sample_name() {
        let sample = CodeSample::preview(Language::Python, "code".into());
        assert_eq!(sample.name.as_deref(), Some("python-preview"));
        assert_eq!(sample.install, "pip install asana");
    }
}
