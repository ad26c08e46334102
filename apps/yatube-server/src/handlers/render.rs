//! Domain values to response documents.

use std::collections::BTreeMap;

use uuid::Uuid;

use yatube_core::domain::{Author, Group, Page, PostCard};
use yatube_core::{FormErrors, PostForm};
use yatube_shared::dto::{
    FeedResponse, GroupResponse, PageMeta, PostFormResponse, PostFormValues, PostResponse,
    UserResponse,
};

pub fn user(author: &Author) -> UserResponse {
    UserResponse {
        id: author.id.to_string(),
        username: author.username.clone(),
    }
}

pub fn group(group: &Group) -> GroupResponse {
    GroupResponse {
        id: group.id.to_string(),
        title: group.title.clone(),
        slug: group.slug.clone(),
        description: group.description.clone(),
    }
}

pub fn post(card: &PostCard) -> PostResponse {
    PostResponse {
        id: card.post.id.to_string(),
        text: card.post.text.clone(),
        pub_date: card.post.pub_date.to_rfc3339(),
        author: user(&card.author),
        group: card.group.as_ref().map(group),
        image: card.post.image.clone(),
    }
}

pub fn feed(page: &Page<PostCard>) -> FeedResponse {
    FeedResponse {
        posts: page.items.iter().map(post).collect(),
        page: PageMeta {
            number: page.number,
            per_page: page.per_page,
            total_items: page.total_items,
            total_pages: page.total_pages(),
            has_next: page.has_next(),
            has_previous: page.has_previous(),
        },
    }
}

/// The post form document. `post_id` is set when editing.
pub fn post_form(
    post_id: Option<Uuid>,
    values: &PostForm,
    groups: &[Group],
    errors: Option<&FormErrors>,
) -> PostFormResponse {
    let errors: BTreeMap<String, Vec<String>> = errors
        .map(|e| {
            e.iter()
                .map(|(field, messages)| (field.to_string(), messages.to_vec()))
                .collect()
        })
        .unwrap_or_default();

    PostFormResponse {
        is_edit: post_id.is_some(),
        post_id: post_id.map(|id| id.to_string()),
        values: PostFormValues {
            text: values.text.clone(),
            group: values.group.clone(),
            image: values.image.clone(),
        },
        groups: groups.iter().map(group).collect(),
        errors,
    }
}
