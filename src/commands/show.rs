//! Render a single post

use anyhow::Result;

use crate::Folio;

/// Print the rendered HTML of one post
pub fn run(folio: &Folio, slug: &str) -> Result<()> {
    let post = folio.post_loader().load_by_slug(slug)?;
    tracing::debug!("Rendered {} ({} bytes)", post.slug, post.content.len());
    println!("{}", post.content);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentError;
    use tempfile::TempDir;

    #[test]
    fn test_missing_post_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("content")).unwrap();
        let folio = Folio::new(dir.path()).unwrap();

        let err = run(&folio, "missing").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ContentError>(),
            Some(ContentError::NotFound { .. })
        ));
    }
}
