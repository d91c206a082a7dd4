#[cfg(test)]
mod tests {
    use crate::error::{AppError, FsError};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use std::io;
    use std::path::PathBuf;

    fn io_error(kind: io::ErrorKind) -> FsError {
        FsError::io("stat", &PathBuf::from("/srv/x"), io::Error::new(kind, "boom"))
    }

    #[test]
    fn test_fs_error_kinds() {
        assert!(io_error(io::ErrorKind::NotFound).is_not_found());
        assert!(io_error(io::ErrorKind::PermissionDenied).is_permission_denied());
        assert!(!FsError::NotDirectory(PathBuf::from("/x")).is_not_found());
        assert_eq!(FsError::DirectoryNotEmpty(PathBuf::from("/x")).io_kind(), None);
    }

    #[test]
    fn test_fs_error_display() {
        let err = io_error(io::ErrorKind::Other);
        assert_eq!(err.to_string(), "stat /srv/x: boom");
        assert_eq!(
            FsError::NotDirectory(PathBuf::from("/srv/x")).to_string(),
            "file is not a directory: /srv/x"
        );
    }

    #[test]
    fn test_fs_error_to_status() {
        let cases = [
            (io_error(io::ErrorKind::NotFound), StatusCode::NOT_FOUND),
            (io_error(io::ErrorKind::PermissionDenied), StatusCode::FORBIDDEN),
            (io_error(io::ErrorKind::Other), StatusCode::INTERNAL_SERVER_ERROR),
            (FsError::NotRegularFile(PathBuf::from("/x")), StatusCode::BAD_REQUEST),
            (FsError::NotDirectory(PathBuf::from("/x")), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::NotFound("file not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "file not found" }));
    }

    #[test]
    fn test_method_not_allowed() {
        let response = AppError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_from_io_error() {
        let app_error: AppError = io::Error::new(io::ErrorKind::Other, "disk gone").into();
        match app_error {
            AppError::IoError(msg) => assert!(msg.contains("disk gone")),
            _ => panic!("Expected IoError variant"),
        }
    }
}
