use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Author, Group};
use crate::form::CleanedPost;

const PREVIEW_LENGTH: usize = 15;

/// Post entity - a user-authored text record.
///
/// `author_id` and `pub_date` are fixed at creation; only `text`, `group_id`
/// and `image` change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub text: String,
    pub image: Option<String>,
    pub pub_date: DateTime<Utc>,
}

impl Post {
    /// Create a new post authored by `author_id`.
    pub fn new(author_id: Uuid, cleaned: CleanedPost) -> Self {
        Self {
            // v7 ids sort by creation time, so they order posts sharing a pub_date
            id: Uuid::now_v7(),
            author_id,
            group_id: cleaned.group_id,
            text: cleaned.text,
            image: cleaned.image,
            pub_date: Utc::now(),
        }
    }

    /// Apply an edit. Author and publication date are left untouched.
    pub fn apply(&mut self, cleaned: CleanedPost) {
        self.text = cleaned.text;
        self.group_id = cleaned.group_id;
        self.image = cleaned.image;
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

/// A post joined with its author and group, ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub post: Post,
    pub author: Author,
    pub group: Option<Group>,
}

impl fmt::Display for PostCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.post.text.chars().take(PREVIEW_LENGTH).collect();
        let group = self.group.as_ref().map_or("-", |g| g.title.as_str());
        write!(
            f,
            "author: {}, date: {}, group: {}, text: {}",
            self.author.username,
            self.post.pub_date.format("%m%d%Y"),
            group,
            preview
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn cleaned(text: &str) -> CleanedPost {
        CleanedPost {
            text: text.to_string(),
            group_id: None,
            image: None,
        }
    }

    #[test]
    fn test_apply_keeps_author_and_date() {
        let author = Uuid::new_v4();
        let mut post = Post::new(author, cleaned("first"));
        let id = post.id;
        let pub_date = post.pub_date;

        let group_id = Uuid::new_v4();
        post.apply(CleanedPost {
            text: "second".to_string(),
            group_id: Some(group_id),
            image: Some("posts/cat.png".to_string()),
        });

        assert_eq!(post.id, id);
        assert_eq!(post.author_id, author);
        assert_eq!(post.pub_date, pub_date);
        assert_eq!(post.text, "second");
        assert_eq!(post.group_id, Some(group_id));
        assert_eq!(post.image.as_deref(), Some("posts/cat.png"));
    }

    #[test]
    fn test_ids_follow_creation_order() {
        let author = Uuid::new_v4();
        let first = Post::new(author, cleaned("a"));
        let second = Post::new(author, cleaned("b"));
        assert!(second.id > first.id);
    }

    #[test]
    fn test_card_display() {
        let author = Author {
            id: Uuid::new_v4(),
            username: "auth".to_string(),
        };
        let mut post = Post::new(author.id, cleaned("A rather long post body"));
        post.pub_date = Utc.with_ymd_and_hms(2022, 12, 26, 10, 0, 0).unwrap();
        let group = Group {
            id: Uuid::new_v4(),
            title: "Test group".to_string(),
            slug: "test".to_string(),
            description: "desc".to_string(),
        };

        let card = PostCard {
            post: post.clone(),
            author: author.clone(),
            group: Some(group),
        };
        assert_eq!(
            card.to_string(),
            "author: auth, date: 12262022, group: Test group, text: A rather long p"
        );

        let ungrouped = PostCard {
            post,
            author,
            group: None,
        };
        assert!(ungrouped.to_string().contains("group: -,"));
    }
}
