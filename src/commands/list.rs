//! List posts

use anyhow::Result;
use std::io::Write;

use crate::Folio;

/// Print every listed post, newest first, followed by any skipped documents
pub fn run(folio: &Folio) -> Result<()> {
    let stdout = std::io::stdout();
    write_listing(folio, &mut stdout.lock())
}

fn write_listing<W: Write>(folio: &Folio, out: &mut W) -> Result<()> {
    let snapshot = folio.post_cache().list_all()?;

    writeln!(out, "Posts ({}):", snapshot.posts().len())?;
    for post in snapshot.posts() {
        writeln!(
            out,
            "  {} - {} [{}]",
            post.date.format("%Y-%m-%d"),
            post.title,
            post.slug
        )?;
    }

    if !snapshot.failures().is_empty() {
        writeln!(out, "Skipped ({}):", snapshot.failures().len())?;
        for failure in snapshot.failures() {
            writeln!(out, "  {}: {}", failure.slug, failure.error)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_listing_output() {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        fs::create_dir(&content).unwrap();
        fs::write(content.join("hello-world.md"), "---\ntitle: Hello\ndate: 2024-01-01\n---\nHi").unwrap();
        fs::write(content.join("second-post.md"), "---\ntitle: Second\ndate: 2024-06-01\n---\nYo").unwrap();
        fs::write(content.join("broken.md"), "---\ntitle: Broken\n").unwrap();

        let folio = Folio::new(dir.path()).unwrap();
        let mut out = Vec::new();
        write_listing(&folio, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert_eq!(
            out.lines().take(3).collect::<Vec<_>>(),
            vec![
                "Posts (2):",
                "  2024-06-01 - Second [second-post]",
                "  2024-01-01 - Hello [hello-world]",
            ]
        );
        assert!(out.contains("Skipped (1):"));
        assert!(out.contains("  broken: failed to parse front-matter of broken"));
    }
}
