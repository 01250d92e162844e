//! List site content

use anyhow::Result;

use crate::content::ContentLoader;
use crate::search::collect_tags;
use crate::Blog;

/// List site content by type
pub fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let loader = ContentLoader::new(blog);

    match content_type {
        "post" | "posts" => {
            let posts = loader.load_summaries()?;
            println!("Posts in {:?} ({}):", loader.content_dir(), posts.len());
            for post in posts {
                println!(
                    "  {} - {} [{}] by {}",
                    post.date.format("%Y-%m-%d"),
                    post.title,
                    post.slug,
                    post.author
                );
            }
        }
        "tag" | "tags" => {
            let posts = loader.load_summaries()?;
            let tags = collect_tags(&posts);
            println!("Tags ({}):", tags.len());
            for tag in tags {
                let count = posts.iter().filter(|p| p.tags.contains(&tag)).count();
                println!("  {} ({})", tag, count);
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, tag", content_type);
        }
    }

    Ok(())
}
