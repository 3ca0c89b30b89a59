use stowage_core::{FileTypeConfig, IncomingFile, UploadConfig, ValidationError};

/// Find the rules governing a file: by MIME type first, then by extension.
pub fn resolve_file_type<'a>(
    file: &IncomingFile,
    policy: &'a UploadConfig,
) -> Option<&'a FileTypeConfig> {
    policy
        .file_type(&file.mime_type)
        .or_else(|| file.extension().and_then(|ext| policy.file_type(ext)))
}

/// Check a file against the upload policy.
///
/// Checks run in a fixed order and stop at the first failure: file-type
/// resolution, size, MIME type, extension. Comparisons are case-sensitive.
pub fn validate(file: &IncomingFile, policy: &UploadConfig) -> Result<(), ValidationError> {
    let extension = file.extension();

    let rules = resolve_file_type(file, policy).ok_or_else(|| {
        ValidationError::UnsupportedFileType {
            mime_type: file.mime_type.clone(),
            extension: extension.map(str::to_string),
        }
    })?;

    if file.size > rules.max_size {
        return Err(ValidationError::FileTooLarge {
            size: file.size,
            max: rules.max_size,
        });
    }

    if !rules.allows_mime_type(&file.mime_type) {
        return Err(ValidationError::InvalidMimeType {
            mime_type: file.mime_type.clone(),
            allowed: rules.sorted_mime_types(),
        });
    }

    if !extension.is_some_and(|ext| rules.allows_extension(ext)) {
        return Err(ValidationError::InvalidExtension {
            extension: extension.map(str::to_string),
            allowed: rules.sorted_extensions(),
        });
    }

    tracing::debug!(
        file_name = %file.original_name,
        mime_type = %file.mime_type,
        size_bytes = file.size,
        "File passed validation"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::UploadConfigBuilder;

    const MB: u64 = 1024 * 1024;

    fn png_policy() -> UploadConfig {
        UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .set_file_type(
                "image/png",
                FileTypeConfig::new(MB)
                    .with_mime_types(["image/png"])
                    .with_extensions(["png"]),
            )
            .build()
            .unwrap()
    }

    fn file(name: &str, mime: &str, size: usize) -> IncomingFile {
        IncomingFile::new(name, mime, vec![0u8; size])
    }

    #[test]
    fn test_accepts_matching_file() {
        assert!(validate(&file("a.png", "image/png", 500 * 1024), &png_policy()).is_ok());
    }

    #[test]
    fn test_unknown_type_and_extension() {
        let err = validate(&file("a.exe", "application/x-msdownload", 10), &png_policy())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedFileType {
                mime_type: "application/x-msdownload".to_string(),
                extension: Some("exe".to_string()),
            }
        );
    }

    #[test]
    fn test_oversize_reported_before_type_mismatch() {
        let policy = png_policy();

        let err = validate(&file("a.png", "image/png", 2 * MB as usize), &policy).unwrap_err();
        assert_eq!(
            err,
            ValidationError::FileTooLarge {
                size: 2 * MB,
                max: MB
            }
        );

        // Resolved by MIME, wrong extension and too big: size wins.
        let err = validate(&file("a.gif", "image/png", 2 * MB as usize), &policy).unwrap_err();
        assert!(matches!(err, ValidationError::FileTooLarge { .. }));
    }

    #[test]
    fn test_resolved_by_extension_then_mime_rejected() {
        let policy = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .set_file_type(
                "png",
                FileTypeConfig::new(MB)
                    .with_mime_types(["image/png"])
                    .with_extensions(["png"]),
            )
            .build()
            .unwrap();

        let f = file("a.png", "image/x-png", 10);
        assert!(resolve_file_type(&f, &policy).is_some());

        let err = validate(&f, &policy).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidMimeType {
                mime_type: "image/x-png".to_string(),
                allowed: vec!["image/png".to_string()],
            }
        );
    }

    #[test]
    fn test_extension_is_case_sensitive() {
        let err = validate(&file("a.PNG", "image/png", 10), &png_policy()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidExtension {
                extension: Some("PNG".to_string()),
                allowed: vec!["png".to_string()],
            }
        );
    }

    #[test]
    fn test_missing_extension_rejected() {
        let err = validate(&file("image", "image/png", 10), &png_policy()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidExtension {
                extension: None,
                ..
            }
        ));
    }

    #[test]
    fn test_default_max_size_is_not_a_fallback() {
        let policy = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .set_default_max_size(100 * MB)
            .set_file_type(
                "image/png",
                FileTypeConfig::new(MB)
                    .with_mime_types(["image/png"])
                    .with_extensions(["png"]),
            )
            .build()
            .unwrap();

        let err = validate(&file("a.jpg", "image/jpeg", 10), &policy).unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedFileType { .. }));
    }

    #[test]
    fn test_mime_key_takes_precedence_over_extension_key() {
        let policy = UploadConfigBuilder::new()
            .use_local_storage("/tmp")
            .set_file_type(
                "image/png",
                FileTypeConfig::new(10)
                    .with_mime_types(["image/png"])
                    .with_extensions(["png"]),
            )
            .set_file_type(
                "png",
                FileTypeConfig::new(10 * MB)
                    .with_mime_types(["image/png"])
                    .with_extensions(["png"]),
            )
            .build()
            .unwrap();

        let f = file("a.png", "image/png", 100);
        assert_eq!(resolve_file_type(&f, &policy).unwrap().max_size, 10);
        assert!(matches!(
            validate(&f, &policy).unwrap_err(),
            ValidationError::FileTooLarge { .. }
        ));
    }
}
