//! Blog management.

use std::io::Write;

use clap::{Args, Subcommand};
use feedme_core::BlogId;
use feedme_core::blog::BlogDraft;

use super::{CommandError, Context, date_or_dash, out};

const EXCERPT_CHARS: usize = 80;

#[derive(Subcommand)]
pub enum BlogsAction {
    /// List blog posts
    List {
        /// Match title, content, author or category
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Show one post
    Show {
        /// Blog id
        id: String,
    },

    /// Publish a new post
    Create(DraftArgs),

    /// Edit a post; omitted fields keep their current value
    Update {
        /// Blog id
        id: String,

        #[command(flatten)]
        fields: EditArgs,
    },

    /// Delete a post
    Delete {
        /// Blog id
        id: String,
    },
}

#[derive(Args)]
pub struct DraftArgs {
    #[arg(short, long)]
    title: String,

    #[arg(short, long)]
    content: String,

    #[arg(long, default_value = "")]
    category: String,

    #[arg(short, long, default_value = "")]
    author: String,

    /// Cover image URL
    #[arg(long)]
    image: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    #[arg(short, long)]
    title: Option<String>,

    #[arg(short, long)]
    content: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(short, long)]
    author: Option<String>,

    #[arg(long)]
    image: Option<String>,
}

impl EditArgs {
    fn apply(self, draft: &mut BlogDraft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(content) = self.content {
            draft.content = content;
        }
        if let Some(category) = self.category {
            draft.category = category;
        }
        if let Some(author) = self.author {
            draft.author = author;
        }
        if self.image.is_some() {
            draft.image = self.image;
        }
    }
}

/// Run a blogs subcommand.
///
/// # Errors
///
/// Returns `CommandError` if the request fails or a draft is invalid.
pub async fn run(ctx: &Context, action: BlogsAction) -> Result<(), CommandError> {
    match action {
        BlogsAction::List { search } => {
            let blogs = ctx.client.blogs().await?;
            let mut shown = 0;
            for blog in blogs.iter().filter(|b| b.matches_search(&search)) {
                shown += 1;
                writeln!(
                    out(),
                    "{:<26} {}  {}  [{}]",
                    blog.id.as_str(),
                    date_or_dash(blog.created_at),
                    blog.title,
                    blog.category
                )?;
                writeln!(out(), "    {}", blog.excerpt(EXCERPT_CHARS))?;
            }
            if shown == 0 {
                writeln!(out(), "No blog posts found")?;
            }
        }
        BlogsAction::Show { id } => {
            let blog = ctx.client.blog(&BlogId::new(id)).await?;
            writeln!(out(), "{}", blog.title)?;
            writeln!(
                out(),
                "by {} in {} on {}",
                blog.author,
                blog.category,
                date_or_dash(blog.created_at)
            )?;
            writeln!(out())?;
            writeln!(out(), "{}", blog.content)?;
        }
        BlogsAction::Create(args) => {
            let draft = BlogDraft {
                title: args.title,
                content: args.content,
                category: args.category,
                author: args.author,
                image: args.image,
            };
            let blog = ctx.client.create_blog(&draft).await?;
            writeln!(out(), "Created blog {}", blog.id)?;
        }
        BlogsAction::Update { id, fields } => {
            let id = BlogId::new(id);
            let mut draft = BlogDraft::from(&ctx.client.blog(&id).await?);
            fields.apply(&mut draft);
            let blog = ctx.client.update_blog(&id, &draft).await?;
            writeln!(out(), "Updated blog {}", blog.id)?;
        }
        BlogsAction::Delete { id } => {
            let id = BlogId::new(id);
            ctx.client.delete_blog(&id).await?;
            writeln!(out(), "Deleted blog {id}")?;
        }
    }
    Ok(())
}
