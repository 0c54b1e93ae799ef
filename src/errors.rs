//! Error taxonomy for the catalog resolvers
//!
//! Every resolver-level failure carries a stable string code alongside the
//! human-readable message; the codes are part of the public API contract and
//! surface to clients through the GraphQL `extensions.code` field. Errors that
//! were already classified deeper in a call chain are re-surfaced unchanged;
//! only unclassified failures get wrapped into `Internal`.

use async_graphql::ErrorExtensions;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    // Validation (user-correctable argument problems)
    #[error("Author name must be between 4 and 170 characters")]
    BadAuthorName,
    #[error("Book title must be between 2 and 150 characters")]
    BadBookTitle,
    #[error("A book needs between 1 and 3 genres")]
    BadBookGenres,
    #[error("Publication year must not be negative")]
    BadBookPublicationDate,
    #[error("Book description is limited to 1600 characters")]
    BadBookDescription,
    #[error("Birth year must not be negative")]
    BadAuthorBirthYear,
    #[error("setBornTo is required")]
    BadUserInput,
    #[error("Uploaded file must be an image")]
    BadFileType,

    // Conflicts (uniqueness violations)
    #[error("A book titled '{0}' already exists")]
    DuplicateBookTitle(String),
    #[error("An author named '{0}' already exists")]
    DuplicateAuthorName(String),
    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),

    // Not found
    #[error("Author '{0}' not found")]
    AuthorNotFound(String),
    #[error("Book not found")]
    BookNotFound,

    // Authentication
    #[error("User not authenticated")]
    Unauthenticated,
    #[error("Wrong credentials")]
    WrongCredentials,

    // Configuration
    #[error("JWT_SECRET is not configured")]
    MissingJwtSecret,
    #[error("This operation is disabled in production")]
    NotAllowedInProduction,

    // Everything else
    #[error("Unexpected server error")]
    Internal(#[source] anyhow::Error),
}

impl CatalogError {
    /// Stable machine-readable code for this error. Codes never change.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadAuthorName => "BAD_AUTHOR_NAME",
            Self::BadBookTitle => "BAD_BOOK_TITLE",
            Self::BadBookGenres => "BAD_BOOK_GENRES",
            Self::BadBookPublicationDate => "BAD_BOOK_PUBLICATION_DATE",
            Self::BadBookDescription => "BAD_BOOK_DESCRIPTION",
            Self::BadAuthorBirthYear => "BAD_AUTHOR_BIRTH_YEAR",
            Self::BadUserInput => "BAD_USER_INPUT",
            Self::BadFileType => "BAD_FILE_TYPE",
            Self::DuplicateBookTitle(_) => "DUPLICATE_BOOK_TITLE",
            Self::DuplicateAuthorName(_) => "DUPLICATE_AUTHOR_NAME",
            Self::DuplicateUsername(_) => "DUPLICATE_USERNAME",
            Self::AuthorNotFound(_) => "AUTHOR_NOT_FOUND",
            Self::BookNotFound => "BOOK_NOT_FOUND",
            Self::Unauthenticated => "UNAUTHENTICATED_USER",
            Self::WrongCredentials => "WRONG_CREDENTIALS",
            Self::MissingJwtSecret => "MISSING_JWT_SECRET",
            Self::NotAllowedInProduction => "NOT_ALLOWED_IN_PRODUCTION",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Wrap an unclassified error, keeping an already-classified one intact.
    /// Repositories return `anyhow::Error` which may carry a `CatalogError`
    /// from a deeper classification (e.g. a unique-constraint check); those
    /// must not be reclassified as internal on the way out.
    pub fn internal(err: anyhow::Error) -> Self {
        match err.downcast::<CatalogError>() {
            Ok(classified) => classified,
            Err(other) => Self::Internal(other),
        }
    }
}

impl ErrorExtensions for CatalogError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn internal_preserves_existing_classification() {
        let classified: anyhow::Error = CatalogError::DuplicateBookTitle("Dust".into()).into();
        let err = CatalogError::internal(classified);
        assert_eq!(err.code(), "DUPLICATE_BOOK_TITLE");
    }

    #[test]
    fn internal_wraps_unclassified_errors() {
        let err = CatalogError::internal(anyhow!("disk on fire"));
        assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");
    }

    #[test]
    fn extension_carries_stable_code() {
        let gql = CatalogError::Unauthenticated.extend();
        let extensions = gql.extensions.expect("extensions set");
        assert_eq!(
            extensions.get("code"),
            Some(&async_graphql::Value::from("UNAUTHENTICATED_USER"))
        );
    }

    #[test]
    fn wrong_credentials_does_not_leak_which_check_failed() {
        // Unknown user and bad password must be indistinguishable.
        assert_eq!(
            CatalogError::WrongCredentials.code(),
            CatalogError::WrongCredentials.code()
        );
        assert_eq!(CatalogError::WrongCredentials.to_string(), "Wrong credentials");
    }
}
