//! Post model

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A blog post, fully rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    /// Post title
    pub title: String,

    /// Publication date, used for ordering
    pub date: DateTime<Utc>,

    /// Identifier derived from the file name (never from front-matter)
    pub slug: String,

    /// Rendered HTML content
    pub content: String,
}

impl Post {
    /// Create a post from its parts
    pub fn new(title: String, date: DateTime<Utc>, slug: String, content: String) -> Self {
        Self {
            title,
            date,
            slug,
            content,
        }
    }
}

/// Sort posts newest first, breaking date ties by slug
pub fn sort_newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(slug: &str, y: i32, m: u32, d: u32) -> Post {
        let date = Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap();
        Post::new(slug.to_string(), date, slug.to_string(), String::new())
    }

    #[test]
    fn test_sort_newest_first() {
        let mut posts = vec![
            post("hello-world", 2024, 1, 1),
            post("second-post", 2024, 6, 1),
            post("middle", 2024, 3, 15),
        ];
        sort_newest_first(&mut posts);
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["second-post", "middle", "hello-world"]);
    }

    #[test]
    fn test_equal_dates_break_ties_by_slug() {
        let mut posts = vec![
            post("zebra", 2024, 1, 1),
            post("apple", 2024, 1, 1),
            post("mango", 2024, 1, 1),
        ];
        sort_newest_first(&mut posts);
        let slugs: Vec<_> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["apple", "mango", "zebra"]);
    }
}
