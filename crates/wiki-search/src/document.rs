//! Search documents built from content records.
//!
//! Field names match what the search front end filters and sorts on, so
//! they are fixed here with serde renames rather than derived from the
//! record structs.

use serde::{Deserialize, Serialize};

use wiki_types::{Article, Comment, Group, Post};

/// Search collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Wiki articles
    Articles,
    /// Groups, posts and comments
    Community,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Articles, Collection::Community];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Articles => "articles",
            Collection::Community => "community",
        }
    }

    /// Attributes the community front end filters on.
    pub fn filterable_attributes(&self) -> &'static [&'static str] {
        match self {
            Collection::Articles => &[],
            Collection::Community => &["group_type", "group_id", "type", "postId"],
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "articles" => Ok(Collection::Articles),
            "community" => Ok(Collection::Community),
            other => Err(format!("unknown collection: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub category: String,
    pub thumbnail: String,
    #[serde(rename = "authorID")]
    pub author_id: String,
    /// Unix seconds
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub group_id: String,
    pub group_type: String,
    pub name: String,
    pub description: String,
    pub slug: String,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    #[serde(rename = "membersCount")]
    pub members_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub group_id: String,
    pub group_type: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "authorId")]
    pub author_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: String,
    pub group_id: String,
    pub group_type: String,
    pub content: String,
    #[serde(rename = "authorId")]
    pub author_id: String,
    #[serde(rename = "postId")]
    pub post_id: String,
    #[serde(rename = "parentId")]
    pub parent_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

/// Any document the reconciliation loop pushes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndexDocument {
    Article(ArticleDocument),
    Group(GroupDocument),
    Post(PostDocument),
    Comment(CommentDocument),
}

impl IndexDocument {
    pub fn id(&self) -> &str {
        match self {
            IndexDocument::Article(d) => &d.id,
            IndexDocument::Group(d) => &d.id,
            IndexDocument::Post(d) => &d.id,
            IndexDocument::Comment(d) => &d.id,
        }
    }

    /// Collection this document belongs in
    pub fn collection(&self) -> Collection {
        match self {
            IndexDocument::Article(_) => Collection::Articles,
            _ => Collection::Community,
        }
    }

    /// Value of the `type` discriminator ("article" for articles)
    pub fn doc_type(&self) -> &str {
        match self {
            IndexDocument::Article(_) => "article",
            IndexDocument::Group(d) => &d.doc_type,
            IndexDocument::Post(d) => &d.doc_type,
            IndexDocument::Comment(d) => &d.doc_type,
        }
    }

    /// Owning group for community documents
    pub fn group(&self) -> Option<(&str, &str)> {
        match self {
            IndexDocument::Article(_) => None,
            IndexDocument::Group(d) => Some((&d.group_id, &d.group_type)),
            IndexDocument::Post(d) => Some((&d.group_id, &d.group_type)),
            IndexDocument::Comment(d) => Some((&d.group_id, &d.group_type)),
        }
    }

    /// Display title: article/post title, group name, empty for comments
    pub fn title(&self) -> &str {
        match self {
            IndexDocument::Article(d) => &d.title,
            IndexDocument::Group(d) => &d.name,
            IndexDocument::Post(d) => &d.title,
            IndexDocument::Comment(_) => "",
        }
    }

    /// Searchable body text
    pub fn body(&self) -> &str {
        match self {
            IndexDocument::Article(d) => &d.content,
            IndexDocument::Group(d) => &d.description,
            IndexDocument::Post(d) => &d.content,
            IndexDocument::Comment(d) => &d.content,
        }
    }

    pub fn created_at(&self) -> i64 {
        match self {
            IndexDocument::Article(d) => d.created_at,
            IndexDocument::Group(d) => d.created_at,
            IndexDocument::Post(d) => d.created_at,
            IndexDocument::Comment(d) => d.created_at,
        }
    }
}

pub fn article_document(article: &Article) -> IndexDocument {
    IndexDocument::Article(ArticleDocument {
        id: article.id.clone(),
        title: article.title.clone(),
        content: article.content.clone(),
        slug: article.slug.clone(),
        category: article.category.clone(),
        thumbnail: article.thumbnail.clone(),
        author_id: article.author_id.clone(),
        created_at: article.created_at.timestamp(),
    })
}

pub fn group_document(group: &Group) -> IndexDocument {
    IndexDocument::Group(GroupDocument {
        id: group.id.clone(),
        doc_type: "group".to_string(),
        group_id: group.id.clone(),
        group_type: group.group_type.as_str().to_string(),
        name: group.name.clone(),
        description: group.description.clone(),
        slug: group.slug.clone(),
        owner_id: group.owner_id.clone(),
        created_at: group.created_at.timestamp(),
        members_count: group.members_count,
    })
}

/// Post document; `group` must be the post's owning group.
pub fn post_document(post: &Post, group: &Group) -> IndexDocument {
    IndexDocument::Post(PostDocument {
        id: post.id.clone(),
        doc_type: "post".to_string(),
        group_id: post.group_id.clone(),
        group_type: group.group_type.as_str().to_string(),
        title: post.title.clone(),
        content: post.content.clone(),
        author_id: post.author_id.clone(),
        created_at: post.created_at.timestamp(),
    })
}

/// Comment document; `post` and `group` must be its parent post and that
/// post's group.
pub fn comment_document(comment: &Comment, post: &Post, group: &Group) -> IndexDocument {
    IndexDocument::Comment(CommentDocument {
        id: comment.id.clone(),
        doc_type: "comment".to_string(),
        group_id: post.group_id.clone(),
        group_type: group.group_type.as_str().to_string(),
        content: comment.content.clone(),
        author_id: comment.author_id.clone(),
        post_id: comment.post_id.clone(),
        parent_id: comment.parent_id.clone(),
        created_at: comment.created_at.timestamp(),
    })
}
