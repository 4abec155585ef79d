use std::io::IsTerminal;

use chrono::{DateTime, Utc};

use crate::post::Post;

const EXCERPT_CHARS: usize = 120;

/// Why there is nothing to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// The feed itself is empty.
    NoneYet,
    /// The filter matched nothing.
    NoMatch(String),
}

/// Where the visible set goes. Every call replaces whatever was shown
/// before; the pipeline never hands a failure to the sink.
pub trait RenderSink {
    fn render(&self, posts: &[Post]);
    fn placeholder(&self, reason: Placeholder);
}

/// Draws post cards on stdout. On a TTY each render wipes the previous
/// frame, the way the web client swaps out the whole card container.
pub struct TerminalSink {
    replace_frame: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            replace_frame: std::io::stdout().is_terminal(),
        }
    }

    fn begin_frame(&self) {
        if self.replace_frame {
            print!("\x1b[2J\x1b[H");
        }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSink for TerminalSink {
    fn render(&self, posts: &[Post]) {
        self.begin_frame();
        for post in posts {
            println!("{}", card(post));
            println!();
        }
    }

    fn placeholder(&self, reason: Placeholder) {
        self.begin_frame();
        println!("{}", placeholder_message(&reason));
    }
}

pub fn placeholder_message(reason: &Placeholder) -> String {
    match reason {
        Placeholder::NoneYet => "No posts found.".to_string(),
        Placeholder::NoMatch(text) => format!("Search result \"{text}\" not found."),
    }
}

/// One feed card: title, author, publish date, body excerpt, media, tags.
pub fn card(post: &Post) -> String {
    let mut lines = vec![
        format!("[{}] {}", post.id, post.title.to_uppercase()),
        format!("    by {} on {}", post.author.name, format_date(post.created)),
    ];
    if let Some(line) = excerpt(&post.body) {
        lines.push(format!("    {line}"));
    }
    if let Some(media) = &post.media {
        lines.push(format!("    media: {media}"));
    }
    if !post.tags.is_empty() {
        let tags: Vec<String> = post.tags.iter().map(|tag| format!("#{tag}")).collect();
        lines.push(format!("    {}", tags.join(" ")));
    }
    lines.join("\n")
}

/// The single-post view: the full body instead of an excerpt.
pub fn article(post: &Post) -> String {
    let mut lines = vec![
        post.title.to_uppercase(),
        format!("by {} on {}", post.author.name, format_date(post.created)),
        String::new(),
        post.body.clone(),
    ];
    if let Some(media) = &post.media {
        lines.push(String::new());
        lines.push(format!("media: {media}"));
    }
    if !post.tags.is_empty() {
        let tags: Vec<String> = post.tags.iter().map(|tag| format!("#{tag}")).collect();
        lines.push(tags.join(" "));
    }
    lines.join("\n")
}

/// "January 02, 2024", the shape the cards show under each post.
pub fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%B %d, %Y").to_string()
}

fn excerpt(body: &str) -> Option<String> {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.is_empty() {
        return None;
    }
    let mut chars = flat.chars();
    let cut: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        Some(format!("{cut}..."))
    } else {
        Some(cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::Author;

    fn post() -> Post {
        Post {
            id: 42,
            title: "Baking again".to_string(),
            body: "The starter survived the winter.".to_string(),
            media: Some("https://cdn.example.dev/loaf.jpg".parse().unwrap()),
            tags: vec!["bread".to_string()],
            created: "2024-01-02T03:04:05Z".parse().unwrap(),
            updated: None,
            author: Author {
                name: "Kari".to_string(),
                avatar: None,
            },
        }
    }

    #[test]
    fn formats_dates_like_the_cards() {
        let date: DateTime<Utc> = "2024-01-02T03:04:05Z".parse().unwrap();
        assert_eq!(format_date(date), "January 02, 2024");
    }

    #[test]
    fn cards_carry_title_author_date_media_and_tags() {
        let card = card(&post());
        assert!(card.contains("[42] BAKING AGAIN"));
        assert!(card.contains("by Kari on January 02, 2024"));
        assert!(card.contains("The starter survived the winter."));
        assert!(card.contains("media: https://cdn.example.dev/loaf.jpg"));
        assert!(card.contains("#bread"));
    }

    #[test]
    fn long_bodies_are_cut_to_an_excerpt() {
        let long = "word ".repeat(100);
        let line = excerpt(&long).unwrap();
        assert!(line.ends_with("..."));
        assert_eq!(line.chars().count(), EXCERPT_CHARS + 3);

        assert_eq!(excerpt("  \n "), None);
        assert_eq!(excerpt("short body").unwrap(), "short body");
    }

    #[test]
    fn placeholders_name_the_missing_thing() {
        assert_eq!(placeholder_message(&Placeholder::NoneYet), "No posts found.");
        assert_eq!(
            placeholder_message(&Placeholder::NoMatch("crab".to_string())),
            "Search result \"crab\" not found."
        );
    }

    #[test]
    fn articles_show_the_full_body() {
        let article = article(&post());
        assert!(article.starts_with("BAKING AGAIN"));
        assert!(article.contains("The starter survived the winter."));
    }
}
