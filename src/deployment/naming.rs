//! Image and namespace naming shared by collaborator implementations.

use crate::entities::RunId;

/// Longest allowed cluster label (RFC 1123).
pub const MAX_LABEL_LEN: usize = 63;

/// Lowercase `value` and reduce it to an RFC 1123 label: ASCII alphanumerics
/// and single `-` separators, no leading or trailing `-`, at most
/// [`MAX_LABEL_LEN`] characters. Returns `"mlops"` if nothing is left.
#[must_use]
pub fn sanitize_label(value: &str) -> String {
    let mut label = String::with_capacity(value.len().min(MAX_LABEL_LEN));
    let mut pending_dash = false;

    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !label.is_empty() {
                label.push('-');
            }
            pending_dash = false;
            label.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if label.len() >= MAX_LABEL_LEN {
            break;
        }
    }

    label.truncate(MAX_LABEL_LEN);
    while label.ends_with('-') {
        label.pop();
    }
    if label.is_empty() {
        label.push_str("mlops");
    }
    label
}

/// Image reference for a run: `<registry>/<experiment>:<run_id>`.
///
/// The registry part is omitted when `registry` is empty.
#[must_use]
pub fn image_name(registry: &str, experiment_name: &str, run_id: RunId) -> String {
    let repository = sanitize_label(experiment_name);
    let registry = registry.trim_end_matches('/');
    if registry.is_empty() {
        format!("{repository}:{run_id}")
    } else {
        format!("{registry}/{repository}:{run_id}")
    }
}

/// Namespace of an experiment on a target: `<prefix>-<experiment>-<target>`,
/// sanitized as a single label.
#[must_use]
pub fn namespace_name(prefix: &str, experiment_name: &str, target_name: &str) -> String {
    let raw = if prefix.is_empty() {
        format!("{experiment_name}-{target_name}")
    } else {
        format!("{prefix}-{experiment_name}-{target_name}")
    };
    sanitize_label(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("Iris Classifier"), "iris-classifier");
        assert_eq!(sanitize_label("--a__b--"), "a-b");
        assert_eq!(sanitize_label("!!!"), "mlops");
        assert_eq!(sanitize_label(&"x".repeat(100)).len(), MAX_LABEL_LEN);
    }

    #[test]
    fn test_sanitize_label_no_trailing_dash_after_truncate() {
        let value = format!("{}-b", "a".repeat(62));
        let label = sanitize_label(&value);
        assert!(label.len() <= MAX_LABEL_LEN);
        assert!(!label.ends_with('-'));
    }

    #[test]
    fn test_image_name() {
        let run_id = RunId::new();
        assert_eq!(
            image_name("registry.local:5000/", "Iris", run_id),
            format!("registry.local:5000/iris:{run_id}")
        );
        assert_eq!(image_name("", "Iris", run_id), format!("iris:{run_id}"));
    }

    #[test]
    fn test_namespace_name() {
        assert_eq!(namespace_name("", "Iris", "Test"), "iris-test");
        assert_eq!(namespace_name("ml", "Iris", "Prod"), "ml-iris-prod");
    }
}
