//! Domain validation rules for mutation arguments
//!
//! Pure functions, evaluated before any store access. Rules run in a fixed
//! order and the first violation wins. Lengths count Unicode scalar values,
//! not bytes.

use crate::errors::CatalogError;

/// Count characters, not bytes
fn len(s: &str) -> usize {
    s.chars().count()
}

/// Rules for addBook, in order: author name, title, genres, publication
/// year, description.
pub fn validate_add_book(
    author: &str,
    title: &str,
    genres: &[String],
    published: i64,
    description: Option<&str>,
) -> Result<(), CatalogError> {
    if len(author) < 4 {
        return Err(CatalogError::BadAuthorName);
    }
    if len(title) < 2 || len(title) > 150 {
        return Err(CatalogError::BadBookTitle);
    }
    if genres.is_empty() || genres.len() > 3 {
        return Err(CatalogError::BadBookGenres);
    }
    if published < 0 {
        return Err(CatalogError::BadBookPublicationDate);
    }
    if let Some(description) = description
        && len(description) > 1600
    {
        return Err(CatalogError::BadBookDescription);
    }
    Ok(())
}

/// Rules for addAuthor: name length, then birth year, then description.
/// The description bound has no dedicated code and shares the generic one.
pub fn validate_add_author(
    name: &str,
    born: Option<i64>,
    description: Option<&str>,
) -> Result<(), CatalogError> {
    if len(name) < 4 || len(name) > 170 {
        return Err(CatalogError::BadAuthorName);
    }
    if let Some(born) = born
        && born < 0
    {
        return Err(CatalogError::BadAuthorBirthYear);
    }
    if let Some(description) = description
        && len(description) > 600
    {
        return Err(CatalogError::BadUserInput);
    }
    Ok(())
}

/// Rules for editAuthor: setBornTo must be present, then non-negative
pub fn validate_edit_author(set_born_to: Option<i64>) -> Result<i64, CatalogError> {
    let born = set_born_to.ok_or(CatalogError::BadUserInput)?;
    if born < 0 {
        return Err(CatalogError::BadAuthorBirthYear);
    }
    Ok(born)
}

/// Rules for createUser: username and favorite genre lengths per the data
/// model. Violations share the generic bad-input code.
pub fn validate_create_user(username: &str, favorite_genre: Option<&str>) -> Result<(), CatalogError> {
    if len(username) < 3 || len(username) > 30 {
        return Err(CatalogError::BadUserInput);
    }
    if let Some(genre) = favorite_genre
        && (len(genre) < 2 || len(genre) > 30)
    {
        return Err(CatalogError::BadUserInput);
    }
    Ok(())
}

/// An uploaded file must declare an image MIME type
pub fn validate_image_content_type(content_type: &str) -> Result<(), CatalogError> {
    if content_type.starts_with("image") {
        Ok(())
    } else {
        Err(CatalogError::BadFileType)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn genres(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_book_accepts_valid_arguments() {
        assert!(
            validate_add_book("Jack Swanson", "Dust", &genres(&["Horror"]), 2001, None).is_ok()
        );
    }

    #[test]
    fn add_book_first_violation_wins() {
        // Author name too short and title too short: author rule fires first.
        let err =
            validate_add_book("Jo", "D", &genres(&[]), -1, None).unwrap_err();
        assert_matches!(err, CatalogError::BadAuthorName);

        let err = validate_add_book("Jack Swanson", "D", &genres(&[]), -1, None).unwrap_err();
        assert_matches!(err, CatalogError::BadBookTitle);

        let err = validate_add_book("Jack Swanson", "Dust", &genres(&[]), -1, None).unwrap_err();
        assert_matches!(err, CatalogError::BadBookGenres);

        let err =
            validate_add_book("Jack Swanson", "Dust", &genres(&["Horror"]), -1, None).unwrap_err();
        assert_matches!(err, CatalogError::BadBookPublicationDate);
    }

    #[test]
    fn add_book_rejects_too_many_genres() {
        let err = validate_add_book(
            "Jack Swanson",
            "Dust",
            &genres(&["a", "b", "c", "d"]),
            2001,
            None,
        )
        .unwrap_err();
        assert_matches!(err, CatalogError::BadBookGenres);
    }

    #[test]
    fn add_book_caps_description_length() {
        let long = "x".repeat(1601);
        let err = validate_add_book(
            "Jack Swanson",
            "Dust",
            &genres(&["Horror"]),
            2001,
            Some(&long),
        )
        .unwrap_err();
        assert_matches!(err, CatalogError::BadBookDescription);

        let ok = "x".repeat(1600);
        assert!(
            validate_add_book("Jack Swanson", "Dust", &genres(&["Horror"]), 2001, Some(&ok))
                .is_ok()
        );
    }

    #[test]
    fn title_lengths_count_chars_not_bytes() {
        // Two scalar values, four bytes: valid as a title.
        assert!(validate_add_book("Jack Swanson", "åß", &genres(&["Horror"]), 2001, None).is_ok());
    }

    #[test]
    fn add_author_bounds_name_and_birth_year() {
        assert!(validate_add_author("Jack Swanson", Some(1960), None).is_ok());
        assert_matches!(
            validate_add_author("Jo", None, None).unwrap_err(),
            CatalogError::BadAuthorName
        );
        let long_name = "x".repeat(171);
        assert_matches!(
            validate_add_author(&long_name, None, None).unwrap_err(),
            CatalogError::BadAuthorName
        );
        assert_matches!(
            validate_add_author("Jack Swanson", Some(-1), None).unwrap_err(),
            CatalogError::BadAuthorBirthYear
        );
    }

    #[test]
    fn add_author_caps_description_length() {
        let long = "x".repeat(601);
        assert_matches!(
            validate_add_author("Jack Swanson", None, Some(&long)).unwrap_err(),
            CatalogError::BadUserInput
        );
        let ok = "x".repeat(600);
        assert!(validate_add_author("Jack Swanson", None, Some(&ok)).is_ok());
    }

    #[test]
    fn edit_author_requires_present_non_negative_year() {
        assert_matches!(
            validate_edit_author(None).unwrap_err(),
            CatalogError::BadUserInput
        );
        assert_matches!(
            validate_edit_author(Some(-5)).unwrap_err(),
            CatalogError::BadAuthorBirthYear
        );
        assert_eq!(validate_edit_author(Some(1990)).unwrap(), 1990);
        // Year zero is a valid value, presence is typed rather than truthy.
        assert_eq!(validate_edit_author(Some(0)).unwrap(), 0);
    }

    #[test]
    fn create_user_bounds_username_and_genre() {
        assert!(validate_create_user("u1x", Some("g1")).is_ok());
        assert_matches!(
            validate_create_user("ab", None).unwrap_err(),
            CatalogError::BadUserInput
        );
        assert_matches!(
            validate_create_user("someone", Some("g")).unwrap_err(),
            CatalogError::BadUserInput
        );
    }

    #[test]
    fn image_uploads_must_be_images() {
        assert!(validate_image_content_type("image/png").is_ok());
        assert!(validate_image_content_type("image/jpeg").is_ok());
        assert_matches!(
            validate_image_content_type("application/pdf").unwrap_err(),
            CatalogError::BadFileType
        );
        assert_matches!(
            validate_image_content_type("").unwrap_err(),
            CatalogError::BadFileType
        );
    }
}
