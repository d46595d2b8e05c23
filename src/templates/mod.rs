//! Built-in site templates using the Tera template engine
//!
//! The templates are embedded in the binary, so a content directory and an
//! optional assets directory are all a site needs.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::Post;

/// Template renderer with the embedded site layout
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("home.html", include_str!("site/home.html")),
            ("blog.html", include_str!("site/blog.html")),
            ("post.html", include_str!("site/post.html")),
            ("error.html", include_str!("site/error.html")),
        ])?;

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: strip HTML tags, leaving plain text
///
/// Entities are decoded so autoescaping does not encode them a second time.
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    Ok(tera::Value::String(decode_entities(result.trim())))
}

/// Decode the named entities the Markdown renderer emits plus numeric ones.
/// Unknown entities are kept verbatim.
fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|end| {
            let c = match &rest[1..end] {
                "amp" => '&',
                "lt" => '<',
                "gt" => '>',
                "quot" => '"',
                "apos" => '\'',
                "nbsp" => '\u{a0}',
                entity => {
                    let code = match entity.strip_prefix('#')? {
                        hex if hex.starts_with(['x', 'X']) => u32::from_str_radix(&hex[1..], 16),
                        dec => dec.parse(),
                    };
                    char::from_u32(code.ok()?)?
                }
            };
            Some((c, end + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "…".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub author: String,
}

impl From<&SiteConfig> for SiteData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub title: String,
    /// Human readable date, e.g. "June 1, 2024"
    pub date: String,
    /// RFC 3339 date for `<time datetime>`
    pub datetime: String,
    pub slug: String,
    pub content: String,
}

impl From<&Post> for PostData {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            date: post.date.format("%B %-d, %Y").to_string(),
            datetime: post.date.to_rfc3339(),
            slug: post.slug.clone(),
            content: post.content.clone(),
        }
    }
}

/// Request metadata shown in the footer
#[derive(Debug, Clone, Serialize)]
pub struct GarnishData {
    pub execution_time: String,
    pub region: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn base_context() -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::from(&SiteConfig::default()));
        context.insert(
            "garnish",
            &GarnishData {
                execution_time: "12µs".to_string(),
                region: "ams".to_string(),
                version: "0.1.0".to_string(),
            },
        );
        context
    }

    fn sample_post() -> Post {
        Post::new(
            "Fish & <Chips>".to_string(),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            "fish".to_string(),
            "<p>Some <strong>bold</strong> text</p>\n".to_string(),
        )
    }

    #[test]
    fn test_render_post_page() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = base_context();
        context.insert("section", "post");
        context.insert("post", &PostData::from(&sample_post()));

        let html = renderer.render("post.html", &context).unwrap();
        // Titles are escaped, rendered content is not
        assert!(html.contains("Fish &amp; &lt;Chips&gt;"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("June 1, 2024"));
        assert!(html.contains("Served from ams in 12µs"));
    }

    #[test]
    fn test_render_blog_list() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = base_context();
        context.insert("section", "blog");
        context.insert("posts", &vec![PostData::from(&sample_post())]);

        let html = renderer.render("blog.html", &context).unwrap();
        assert!(html.contains(r#"href="/post/fish""#));
        assert!(html.contains("Some bold text"));
        assert!(!html.contains("Nothing here yet."));
    }

    #[test]
    fn test_blog_summary_escapes_entities_once() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = base_context();
        context.insert("section", "blog");
        let mut post = sample_post();
        post.content = "<p>Fish &amp; Chips &lt;3 &quot;fresh&quot;</p>\n".to_string();
        context.insert("posts", &vec![PostData::from(&post)]);

        let html = renderer.render("blog.html", &context).unwrap();
        assert!(html.contains("Fish &amp; Chips &lt;3 &quot;fresh&quot;"));
        assert!(!html.contains("&amp;amp;"));
        assert!(!html.contains("&amp;lt;"));
    }

    #[test]
    fn test_render_empty_blog_list() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = base_context();
        context.insert("section", "blog");
        context.insert("posts", &Vec::<PostData>::new());

        let html = renderer.render("blog.html", &context).unwrap();
        assert!(html.contains("Nothing here yet."));
    }

    #[test]
    fn test_strip_html_filter() {
        let value = tera::Value::String("<p>Hello <em>world</em></p>\n".to_string());
        let result = strip_html_filter(&value, &HashMap::new()).unwrap();
        assert_eq!(result, tera::Value::String("Hello world".to_string()));
    }

    #[test]
    fn test_strip_html_decodes_entities() {
        let value = tera::Value::String(
            "<p>a &amp; b &lt;c&gt; &#39;d&#x27; &amp;lt; &copy; & e</p>".to_string(),
        );
        let result = strip_html_filter(&value, &HashMap::new()).unwrap();
        assert_eq!(
            result,
            tera::Value::String("a & b <c> 'd' &lt; &copy; & e".to_string())
        );
    }

    #[test]
    fn test_truncate_chars_filter() {
        let value = tera::Value::String("abcdefghij".to_string());
        let mut args = HashMap::new();
        args.insert("length".to_string(), tera::Value::from(4));
        let result = truncate_chars_filter(&value, &args).unwrap();
        assert_eq!(result, tera::Value::String("abcd…".to_string()));

        let short = tera::Value::String("abc".to_string());
        let result = truncate_chars_filter(&short, &args).unwrap();
        assert_eq!(result, short);
    }
}
