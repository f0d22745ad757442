use super::tool_result::ToolCallOutput;
use serde::{Deserialize, Serialize};

const NAME_URI_MARKER: &str = "/contents/name";
const FILES_URI_MARKER: &str = "/files/";
const FILE_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceFile {
    pub path: String,
    pub content: String,
}

/// A Space with its knowledge files, fetched fresh on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub name: String,
    pub owner: String,
    pub space_ref: String,
    pub files: Vec<SpaceFile>,
    /// Every file rendered under a `### File:` heading, ready to be embedded
    /// in a system prompt.
    pub context: String,
}

/// Splits `owner/name` at the first slash. Without a slash the owner is empty.
pub fn split_space_ref(space_ref: &str) -> (&str, &str) {
    space_ref.split_once('/').unwrap_or(("", space_ref))
}

/// Builds a [`Space`] from a `get_copilot_space` result.
///
/// Resource URIs look like `space://<owner>/<id>/contents/name` for the
/// display name and `space://<owner>/<id>/files/<path>` for file bodies.
/// Text-only items and other URIs are ignored, as are blank files.
pub fn assemble_space(space_ref: &str, output: &ToolCallOutput) -> Space {
    let (owner, name) = split_space_ref(space_ref);
    let mut display_name = name.to_string();
    let mut files = Vec::new();

    for resource in output.content.iter().filter_map(|item| item.resource()) {
        let text = resource.text.as_deref().unwrap_or("");
        if resource.uri.contains(NAME_URI_MARKER) {
            let trimmed = text.trim();
            display_name = if trimmed.is_empty() {
                name.to_string()
            } else {
                trimmed.to_string()
            };
        } else if let Some((_, path)) = resource.uri.split_once(FILES_URI_MARKER) {
            if !text.trim().is_empty() {
                files.push(SpaceFile {
                    path: path.to_string(),
                    content: text.to_string(),
                });
            }
        }
    }

    let context = build_context(&files);
    Space {
        name: display_name,
        owner: owner.to_string(),
        space_ref: space_ref.to_string(),
        files,
        context,
    }
}

pub fn build_context(files: &[SpaceFile]) -> String {
    files
        .iter()
        .map(|file| format!("### File: {}\n\n{}", file.path, file.content))
        .collect::<Vec<_>>()
        .join(FILE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(uri: &str, text: &str) -> serde_json::Value {
        json!({"type": "resource", "resource": {"uri": uri, "mimeType": "text/plain", "text": text}})
    }

    #[test]
    fn split_handles_owner_and_bare_names() {
        assert_eq!(split_space_ref("acme/docs"), ("acme", "docs"));
        assert_eq!(split_space_ref("acme/docs/extra"), ("acme", "docs/extra"));
        assert_eq!(split_space_ref("solo"), ("", "solo"));
    }

    #[test]
    fn assembles_name_files_and_context() {
        let output = ToolCallOutput::from_result(&json!({
            "content": [
                resource("space://x/1/contents/name", "  Pretty Name "),
                resource("space://x/1/files/a.md", "A"),
                resource("space://x/1/files/b.md", "   "),
                {"type": "text", "text": "ignored"},
                resource("space://x/1/other", "ignored too")
            ]
        }));

        let space = assemble_space("x/raw", &output);
        assert_eq!(space.name, "Pretty Name");
        assert_eq!(space.owner, "x");
        assert_eq!(space.space_ref, "x/raw");
        assert_eq!(
            space.files,
            vec![SpaceFile {
                path: "a.md".to_string(),
                content: "A".to_string()
            }]
        );
        assert_eq!(space.context, "### File: a.md\n\nA");
    }

    #[test]
    fn blank_name_resource_keeps_requested_name() {
        let output = ToolCallOutput::from_result(&json!({
            "content": [resource("space://x/1/contents/name", "  ")]
        }));
        let space = assemble_space("x/raw", &output);
        assert_eq!(space.name, "raw");
        assert!(space.files.is_empty());
        assert_eq!(space.context, "");
    }

    #[test]
    fn file_path_keeps_nested_segments_and_untrimmed_content() {
        let output = ToolCallOutput::from_result(&json!({
            "content": [
                resource("space://x/1/files/docs/files/guide.md", "\n  body\n"),
                resource("space://x/1/files/z.txt", "Z")
            ]
        }));
        let space = assemble_space("x/raw", &output);
        assert_eq!(space.files[0].path, "docs/files/guide.md");
        assert_eq!(space.files[0].content, "\n  body\n");
        assert_eq!(
            space.context,
            "### File: docs/files/guide.md\n\n\n  body\n\n\n---\n\n### File: z.txt\n\nZ"
        );
    }
}
